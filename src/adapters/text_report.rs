//! Fixed-width text report adapter implementing ReportPort.

use std::fmt::Write as _;

use crate::domain::backtest::{BacktestOutcome, BacktestResult};
use crate::domain::metrics::PerformanceMetrics;
use crate::domain::strategy::StrategyConfig;
use crate::ports::report_port::ReportPort;

const RULE_WIDTH: usize = 52;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// `1234.56` -> `$1,234.56`, `-500.0` -> `-$500.00`.
pub fn fmt_currency(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}${}", group_thousands(value.abs(), 2))
}

/// Fraction as a percentage: `0.55` -> `55.00%`.
pub fn fmt_pct(value: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, value * 100.0)
}

/// `1234567.891` -> `1,234,567.89`.
pub fn fmt_number(value: f64, decimals: usize) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{}", group_thousands(value.abs(), decimals))
}

fn group_thousands(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return "inf".to_string();
    }
    let formatted = format!("{:.*}", decimals, value);
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(f) => format!("{grouped}.{f}"),
        None => grouped,
    }
}

fn fmt_ratio(value: f64) -> String {
    if value.is_infinite() {
        "inf".to_string()
    } else {
        format!("{value:.2}")
    }
}

pub struct TextReportAdapter;

impl TextReportAdapter {
    pub fn new() -> Self {
        TextReportAdapter
    }

    fn write_metrics(out: &mut String, m: &PerformanceMetrics) {
        let rows = [
            ("Total Trades", m.total_trades.to_string()),
            (
                "Won / Lost / Even",
                format!(
                    "{} / {} / {}",
                    m.winning_trades, m.losing_trades, m.breakeven_trades
                ),
            ),
            ("Win Rate", fmt_pct(m.win_rate, 1)),
            ("Avg R:R", fmt_ratio(m.avg_reward_risk)),
            ("Profit Factor", fmt_ratio(m.profit_factor)),
            ("Net P&L", fmt_currency(m.net_pnl)),
            ("Gross P&L", fmt_currency(m.gross_pnl)),
            ("Total Commission", fmt_currency(m.total_commission)),
            (
                "Max Drawdown",
                format!(
                    "{} ({})",
                    fmt_currency(m.max_drawdown),
                    fmt_pct(m.max_drawdown_pct, 1)
                ),
            ),
            ("Sharpe Ratio", format!("{:.2}", m.sharpe_ratio)),
            ("Final Balance", fmt_currency(m.final_balance)),
            ("Return", fmt_pct(m.return_pct, 2)),
            ("Avg Trade", fmt_currency(m.avg_trade_pnl)),
            ("Best Trade", fmt_currency(m.best_trade)),
            ("Worst Trade", fmt_currency(m.worst_trade)),
            ("Avg Bars Held", format!("{:.1}", m.avg_bars_held)),
        ];
        for (label, value) in rows {
            let _ = writeln!(out, "  {label:<18}{value}");
        }
    }
}

impl Default for TextReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for TextReportAdapter {
    fn render(&self, result: &BacktestResult, config: &StrategyConfig) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let mut out = String::new();

        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "  BACKTEST RESULTS  {} ({})", config.instrument.symbol, config.mode);
        let _ = writeln!(out, "{rule}");

        let period = match (result.start_time, result.end_time) {
            (Some(s), Some(e)) => format!(
                "{} -> {}",
                s.format(TIMESTAMP_FORMAT),
                e.format(TIMESTAMP_FORMAT)
            ),
            _ => "N/A".to_string(),
        };
        let _ = writeln!(out, "  {:<18}{}", "Period", period);
        let _ = writeln!(
            out,
            "  {:<18}{}",
            "Walk-forward",
            if result.walk_forward {
                format!("on (in-sample {})", fmt_pct(result.in_sample_fraction, 0))
            } else {
                "off".to_string()
            }
        );
        let _ = writeln!(
            out,
            "  {:<18}{}",
            "Bars Evaluated",
            fmt_number(result.bars_processed as f64, 0)
        );

        match &result.outcome {
            BacktestOutcome::InsufficientData { bars, required } => {
                let _ = writeln!(
                    out,
                    "  Insufficient data: {bars} bars supplied, {required} required."
                );
            }
            BacktestOutcome::NoTrades { note } => {
                let _ = writeln!(out, "  {note}");
            }
            BacktestOutcome::Completed(m) => Self::write_metrics(&mut out, m),
        }

        let _ = writeln!(out, "  {:<18}{}", "Signals Generated", result.signals_generated);
        let _ = writeln!(out, "  {:<18}{}", "Signals Filtered", result.signals_filtered);
        let _ = writeln!(out, "{rule}");
        out
    }
}
