//! Backtest orchestrator.
//!
//! Replays a bar series through the signal generator and a fresh
//! `RiskManager`, one bar at a time and strictly in order. Indicators are
//! computed once over the full series; trading starts at the evaluation start
//! index and everything before it is warm-up only.
//!
//! Per evaluated bar:
//! 1. on a session boundary, reset the daily risk counters and the opening
//!    range tracker;
//! 2. check the open position's stop and target, closing it on a hit;
//! 3. with no position open and the risk gate allowing it, evaluate the
//!    configured strategy and open a sized position;
//! 4. record the account balance.

use chrono::NaiveDateTime;

use crate::domain::error::RiskError;
use crate::domain::indicator::compute_indicators;
use crate::domain::metrics::PerformanceMetrics;
use crate::domain::ohlcv::Bar;
use crate::domain::position::{ClosedTrade, ExitReason, TradeId};
use crate::domain::risk::{EntryOrder, RiskManager};
use crate::domain::session::{SessionPolicy, policy_for};
use crate::domain::signal::{self, OpeningRangeTracker, TradeProposal};
use crate::domain::strategy::StrategyConfig;

pub const NO_TRADES_NOTE: &str =
    "No trades generated. Try adjusting parameters or using more data.";

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BacktestOutcome {
    /// Fewer bars than the configuration needs; nothing was replayed.
    InsufficientData { bars: usize, required: usize },
    NoTrades { note: String },
    Completed(PerformanceMetrics),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub outcome: BacktestOutcome,
    pub trades: Vec<ClosedTrade>,
    /// Starting balance followed by one sample per evaluated bar. Empty when
    /// the data was insufficient.
    pub equity_curve: Vec<EquityPoint>,
    pub signals_generated: usize,
    pub signals_filtered: usize,
    pub start_index: usize,
    pub bars_processed: usize,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub walk_forward: bool,
    /// 1.0 when walk-forward splitting is off.
    pub in_sample_fraction: f64,
}

impl BacktestResult {
    pub fn metrics(&self) -> Option<&PerformanceMetrics> {
        match &self.outcome {
            BacktestOutcome::Completed(m) => Some(m),
            _ => None,
        }
    }

    pub fn equity_values(&self) -> Vec<f64> {
        self.equity_curve.iter().map(|p| p.equity).collect()
    }
}

/// Entry metadata held until the position closes.
#[derive(Debug, Clone)]
struct OpenTrade {
    id: TradeId,
    proposal: TradeProposal,
    entry_price: f64,
    entry_bar: usize,
    entry_time: NaiveDateTime,
}

/// Run with the session policy named by `config.session_boundary`.
pub fn run_backtest(
    bars: &[Bar],
    config: &StrategyConfig,
    walk_forward: bool,
    in_sample_fraction: f64,
) -> Result<BacktestResult, RiskError> {
    let policy = policy_for(config.session_boundary);
    run_backtest_with_policy(bars, config, walk_forward, in_sample_fraction, policy.as_ref())
}

/// Replay `bars` under an explicit session policy.
///
/// Data problems are reported through `BacktestOutcome`. An `Err` means the
/// risk manager rejected a transition the orchestrator requested.
pub fn run_backtest_with_policy(
    bars: &[Bar],
    config: &StrategyConfig,
    walk_forward: bool,
    in_sample_fraction: f64,
    policy: &dyn SessionPolicy,
) -> Result<BacktestResult, RiskError> {
    let span = tracing::info_span!(
        "backtest",
        bars = bars.len(),
        mode = %config.mode,
        walk_forward
    );
    let _guard = span.enter();

    let in_sample_fraction = if walk_forward {
        in_sample_fraction.clamp(0.0, 1.0)
    } else {
        1.0
    };
    let required = config.minimum_bars();

    if bars.len() < required {
        tracing::warn!(bars = bars.len(), required, "insufficient data for backtest");
        return Ok(BacktestResult {
            outcome: BacktestOutcome::InsufficientData {
                bars: bars.len(),
                required,
            },
            trades: Vec::new(),
            equity_curve: Vec::new(),
            signals_generated: 0,
            signals_filtered: 0,
            start_index: 0,
            bars_processed: 0,
            start_time: None,
            end_time: None,
            walk_forward,
            in_sample_fraction,
        });
    }

    let enriched = compute_indicators(bars, config);
    let start = if walk_forward {
        ((bars.len() as f64 * in_sample_fraction).floor() as usize).min(bars.len())
    } else {
        config.warmup_bars().min(bars.len())
    };
    tracing::info!(start_index = start, "indicators computed");

    let mut risk = RiskManager::new(config.clone());
    let mut tracker = OpeningRangeTracker::new(config.orb_bars());
    let mut account = config.account_size;
    let mut equity = Vec::with_capacity(bars.len() - start + 1);
    equity.push(EquityPoint {
        timestamp: bars[start.saturating_sub(1)].timestamp,
        equity: account,
    });

    let mut trades = Vec::new();
    let mut open: Option<OpenTrade> = None;
    let mut next_id = 0u64;
    let mut signals_generated = 0usize;
    let mut signals_filtered = 0usize;

    for (i, bar) in bars.iter().enumerate().skip(start) {
        if policy.is_session_start(bars, i) {
            tracing::debug!(index = i, timestamp = %bar.timestamp, "session start");
            tracker.reset();
            risk.reset_daily();
        }
        tracker.observe(bar);

        if let Some(entry) = open.take() {
            match risk.check_exit_conditions(entry.id, bar.high, bar.low, bar.close)? {
                Some(exit) => {
                    let trade =
                        close_trade(&mut risk, entry, exit.price, exit.reason, i, bar.timestamp)?;
                    account += trade.net_pnl;
                    trades.push(trade);
                }
                None => open = Some(entry),
            }
        }

        if open.is_none() && risk.can_trade().is_allowed() {
            let range = tracker.range();
            if let Some(proposal) = signal::evaluate(&enriched, config, i, range.as_ref()) {
                signals_generated += 1;
                let quantity = risk.calculate_position_size(proposal.stop_distance());

                if quantity > 0 && proposal.confidence >= config.min_confidence {
                    let slippage = proposal.entry_price * config.slippage_pct;
                    let entry_price = proposal.entry_price + proposal.direction.sign() * slippage;
                    next_id += 1;
                    let id = TradeId(next_id);

                    risk.process_entry(EntryOrder {
                        id,
                        direction: proposal.direction,
                        entry_price,
                        stop_price: proposal.stop_price,
                        target_price: proposal.target_price,
                        quantity,
                        entry_time: bar.timestamp,
                    })?;
                    open = Some(OpenTrade {
                        id,
                        proposal,
                        entry_price,
                        entry_bar: i,
                        entry_time: bar.timestamp,
                    });
                } else {
                    tracing::debug!(
                        index = i,
                        quantity,
                        confidence = proposal.confidence,
                        "signal filtered"
                    );
                    signals_filtered += 1;
                }
            }
        }

        equity.push(EquityPoint {
            timestamp: bar.timestamp,
            equity: account,
        });
    }

    if let Some(entry) = open.take() {
        let last = bars.len() - 1;
        let bar = &bars[last];
        let trade = close_trade(
            &mut risk,
            entry,
            bar.close,
            ExitReason::SessionEnd,
            last,
            bar.timestamp,
        )?;
        account += trade.net_pnl;
        trades.push(trade);
        if let Some(point) = equity.last_mut() {
            point.equity = account;
        }
    }

    let equity_values: Vec<f64> = equity.iter().map(|p| p.equity).collect();
    let outcome = if trades.is_empty() {
        BacktestOutcome::NoTrades {
            note: NO_TRADES_NOTE.to_string(),
        }
    } else {
        BacktestOutcome::Completed(PerformanceMetrics::compute(
            &trades,
            &equity_values,
            config.account_size,
            config.risk_free_rate,
            config.periods_per_year,
        ))
    };

    tracing::info!(
        trades = trades.len(),
        signals_generated,
        signals_filtered,
        final_balance = account,
        "backtest finished"
    );

    Ok(BacktestResult {
        outcome,
        trades,
        equity_curve: equity,
        signals_generated,
        signals_filtered,
        start_index: start,
        bars_processed: bars.len() - start,
        start_time: bars.get(start).map(|b| b.timestamp),
        end_time: bars.last().map(|b| b.timestamp),
        walk_forward,
        in_sample_fraction,
    })
}

fn close_trade(
    risk: &mut RiskManager,
    entry: OpenTrade,
    price: f64,
    reason: ExitReason,
    exit_bar: usize,
    exit_time: NaiveDateTime,
) -> Result<ClosedTrade, RiskError> {
    let record = risk.process_exit(entry.id, price, reason)?;
    Ok(ClosedTrade {
        id: entry.id,
        direction: record.direction,
        strategy: entry.proposal.strategy,
        rationale: entry.proposal.rationale,
        confidence: entry.proposal.confidence,
        quantity: record.quantity,
        entry_price: entry.entry_price,
        initial_stop: entry.proposal.stop_price,
        final_stop: record.final_stop,
        target_price: entry.proposal.target_price,
        entry_time: entry.entry_time,
        entry_bar: entry.entry_bar,
        exit_price: record.exit_price,
        fill_price: record.fill_price,
        exit_time,
        exit_bar,
        exit_reason: reason,
        pnl_points: record.pnl_points,
        gross_pnl: record.gross_pnl,
        commission: record.commission,
        net_pnl: record.net_pnl,
        bars_held: exit_bar - entry.entry_bar,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::FixedBarCadence;
    use chrono::{Duration, NaiveDate};

    fn flat_bars(n: usize) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        (0..n)
            .map(|i| Bar {
                timestamp: start + Duration::minutes(5 * i as i64),
                open: 100.0,
                high: 100.5,
                low: 99.5,
                close: 100.0,
                volume: 1000,
            })
            .collect()
    }

    #[test]
    fn insufficient_data_is_an_outcome() {
        let config = StrategyConfig::default();
        let bars = flat_bars(config.minimum_bars() - 1);
        let result = run_backtest(&bars, &config, true, 0.7).unwrap();
        assert_eq!(
            result.outcome,
            BacktestOutcome::InsufficientData {
                bars: 69,
                required: 70
            }
        );
        assert!(result.trades.is_empty());
        assert!(result.equity_curve.is_empty());
    }

    #[test]
    fn flat_market_produces_no_trades() {
        let config = StrategyConfig::default();
        let bars = flat_bars(300);
        let result = run_backtest(&bars, &config, false, 0.7).unwrap();
        assert_eq!(
            result.outcome,
            BacktestOutcome::NoTrades {
                note: NO_TRADES_NOTE.to_string()
            }
        );
        assert_eq!(result.start_index, config.warmup_bars());
        assert_eq!(result.equity_curve.len(), result.bars_processed + 1);
        assert!(result.equity_values().iter().all(|&e| e == config.account_size));
    }

    #[test]
    fn walk_forward_start_is_fraction_of_length() {
        let config = StrategyConfig::default();
        let bars = flat_bars(200);
        let policy = FixedBarCadence { bars_per_session: 78 };
        let result = run_backtest_with_policy(&bars, &config, true, 0.7, &policy).unwrap();
        assert_eq!(result.start_index, 140);
        assert_eq!(result.bars_processed, 60);
        assert_eq!(result.start_time, Some(bars[140].timestamp));
        assert!(result.walk_forward);
    }

    #[test]
    fn full_in_sample_processes_nothing() {
        let config = StrategyConfig::default();
        let bars = flat_bars(100);
        let result = run_backtest(&bars, &config, true, 1.0).unwrap();
        assert_eq!(result.bars_processed, 0);
        assert_eq!(result.equity_curve.len(), 1);
        assert!(matches!(result.outcome, BacktestOutcome::NoTrades { .. }));
    }

    #[test]
    fn in_sample_fraction_reported_as_one_without_walk_forward() {
        let config = StrategyConfig::default();
        let result = run_backtest(&flat_bars(100), &config, false, 0.3).unwrap();
        assert_eq!(result.in_sample_fraction, 1.0);
    }
}
