//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_ledger_adapter::CsvLedgerAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::synthetic_adapter::SyntheticDataAdapter;
use crate::adapters::text_report::{TextReportAdapter, fmt_currency};
use crate::domain::backtest::{self as backtest_engine, BacktestOutcome};
use crate::domain::config_validation::{
    config_warnings, validate_in_sample, validate_strategy_config,
};
use crate::domain::error::TraderError;
use crate::domain::risk::RiskManager;
use crate::domain::strategy::{InstrumentSpec, SessionBoundary, StrategyConfig, StrategyMode};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::ledger_port::LedgerPort;
use crate::ports::report_port::ReportPort;

const DEFAULT_SYNTHETIC_BARS: usize = 500;

#[derive(Parser, Debug)]
#[command(
    name = "hybridtrader",
    about = "Leveraged futures signal, risk and backtest engine"
)]
pub struct Cli {
    /// Log filter used when HYBRIDTRADER_LOG is unset (e.g. warn, info, hybridtrader=debug)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// CSV bar file, or a directory of <SYMBOL>.csv files
        #[arg(short, long, conflicts_with = "synthetic")]
        data: Option<PathBuf>,
        /// Generate this many seeded synthetic bars instead of reading data
        #[arg(long)]
        synthetic: Option<usize>,
        #[arg(long)]
        no_walk_forward: bool,
        /// Fraction of bars used as untraded warm-up when walk-forward is on
        #[arg(long)]
        in_sample: Option<f64>,
        /// Write the trade ledger as CSV
        #[arg(long)]
        trades: Option<PathBuf>,
        /// Write the text report to a file
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show position size and currency risk for a stop distance
    Size {
        #[arg(short, long)]
        config: PathBuf,
        /// Stop distance in points
        #[arg(long)]
        stop: f64,
    },
}

/// Walk-forward settings read from `[backtest]`, after CLI overrides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BacktestSettings {
    pub walk_forward: bool,
    pub in_sample: f64,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            data,
            synthetic,
            no_walk_forward,
            in_sample,
            trades,
            report,
        } => run_backtest(
            &config,
            data.as_ref(),
            synthetic,
            no_walk_forward,
            in_sample,
            trades.as_ref(),
            report.as_ref(),
        ),
        Command::Validate { config } => run_validate(&config),
        Command::Size { config, stop } => run_size(&config, stop),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn load_strategy(adapter: &dyn ConfigPort) -> Result<StrategyConfig, ExitCode> {
    let config = build_strategy_config(adapter).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })?;
    validate_strategy_config(&config).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })?;
    for warning in config_warnings(&config) {
        eprintln!("warning: {warning}");
    }
    Ok(config)
}

fn get_count(
    adapter: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, TraderError> {
    let value = adapter.get_int(section, key, default as i64);
    usize::try_from(value)
        .map_err(|_| TraderError::invalid(section, key, format!("{value} must be non-negative")))
}

fn get_u32(
    adapter: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: u32,
) -> Result<u32, TraderError> {
    let value = adapter.get_int(section, key, i64::from(default));
    u32::try_from(value)
        .map_err(|_| TraderError::invalid(section, key, format!("{value} is out of range")))
}

pub fn build_strategy_config(adapter: &dyn ConfigPort) -> Result<StrategyConfig, TraderError> {
    let d = StrategyConfig::default();

    let mode = match adapter.get_string("strategy", "mode") {
        Some(raw) => raw
            .parse::<StrategyMode>()
            .map_err(|reason| TraderError::invalid("strategy", "mode", reason))?,
        None => d.mode,
    };

    let session_boundary = match adapter
        .get_string("backtest", "session")
        .map(|s| s.trim().to_lowercase())
        .as_deref()
    {
        None | Some("cadence") => SessionBoundary::Cadence {
            bars_per_session: get_count(adapter, "backtest", "bars_per_session", 78)?,
        },
        Some("calendar") => SessionBoundary::CalendarDay,
        Some(other) => {
            return Err(TraderError::invalid(
                "backtest",
                "session",
                format!("unknown session policy '{other}' (expected cadence or calendar)"),
            ));
        }
    };

    let symbol = match adapter.get_string("instrument", "symbol") {
        Some(s) if s.trim().is_empty() => {
            return Err(TraderError::ConfigMissing {
                section: "instrument".to_string(),
                key: "symbol".to_string(),
            });
        }
        Some(s) => s.trim().to_string(),
        None => d.instrument.symbol.clone(),
    };

    Ok(StrategyConfig {
        account_size: adapter.get_double("account", "size", d.account_size),
        risk_per_trade_pct: adapter.get_double("account", "risk_per_trade", d.risk_per_trade_pct),
        max_daily_loss_pct: adapter.get_double("account", "max_daily_loss", d.max_daily_loss_pct),
        instrument: InstrumentSpec {
            symbol,
            point_value: adapter.get_double(
                "instrument",
                "point_value",
                d.instrument.point_value,
            ),
            tick_size: adapter.get_double("instrument", "tick_size", d.instrument.tick_size),
            margin_per_contract: adapter.get_double(
                "instrument",
                "margin_per_contract",
                d.instrument.margin_per_contract,
            ),
        },
        bar_minutes: get_u32(adapter, "instrument", "bar_minutes", d.bar_minutes)?,
        fast_ema_period: get_count(adapter, "indicators", "fast_ema", d.fast_ema_period)?,
        slow_ema_period: get_count(adapter, "indicators", "slow_ema", d.slow_ema_period)?,
        trend_ema_period: get_count(adapter, "indicators", "trend_ema", d.trend_ema_period)?,
        atr_period: get_count(adapter, "indicators", "atr_period", d.atr_period)?,
        volume_sma_period: get_count(adapter, "indicators", "volume_sma", d.volume_sma_period)?,
        volume_multiplier: adapter.get_double(
            "indicators",
            "volume_multiplier",
            d.volume_multiplier,
        ),
        rsi_period: get_count(adapter, "indicators", "rsi_period", d.rsi_period)?,
        mode,
        atr_stop_multiplier: adapter.get_double(
            "strategy",
            "atr_stop_multiplier",
            d.atr_stop_multiplier,
        ),
        atr_breakout_multiplier: adapter.get_double(
            "strategy",
            "atr_breakout_multiplier",
            d.atr_breakout_multiplier,
        ),
        use_atr_stops: adapter.get_bool("strategy", "use_atr_stops", d.use_atr_stops),
        stop_loss_points: adapter.get_double("strategy", "stop_loss_points", d.stop_loss_points),
        reward_risk_ratio: adapter.get_double("strategy", "reward_risk", d.reward_risk_ratio),
        orb_minutes: get_u32(adapter, "strategy", "orb_minutes", d.orb_minutes)?,
        orb_atr_filter: adapter.get_bool("strategy", "orb_atr_filter", d.orb_atr_filter),
        min_confidence: adapter.get_double("strategy", "min_confidence", d.min_confidence),
        trailing_stop_pct: adapter.get_double("risk", "trailing_stop", d.trailing_stop_pct),
        max_trades_per_session: get_u32(
            adapter,
            "risk",
            "max_trades_per_session",
            d.max_trades_per_session,
        )?,
        slippage_pct: adapter.get_double("execution", "slippage", d.slippage_pct),
        commission_per_contract: adapter.get_double(
            "execution",
            "commission_per_contract",
            d.commission_per_contract,
        ),
        session_boundary,
        risk_free_rate: adapter.get_double("backtest", "risk_free_rate", d.risk_free_rate),
        periods_per_year: adapter.get_double("backtest", "periods_per_year", d.periods_per_year),
    })
}

pub fn build_backtest_settings(
    adapter: &dyn ConfigPort,
    no_walk_forward: bool,
    in_sample_override: Option<f64>,
) -> Result<BacktestSettings, TraderError> {
    let walk_forward = !no_walk_forward && adapter.get_bool("backtest", "walk_forward", true);
    let in_sample = in_sample_override.unwrap_or(adapter.get_double("backtest", "in_sample", 0.7));
    if walk_forward {
        validate_in_sample(in_sample)?;
    }
    Ok(BacktestSettings {
        walk_forward,
        in_sample,
    })
}

fn run_backtest(
    config_path: &PathBuf,
    data_path: Option<&PathBuf>,
    synthetic: Option<usize>,
    no_walk_forward: bool,
    in_sample: Option<f64>,
    trades_path: Option<&PathBuf>,
    report_path: Option<&PathBuf>,
) -> ExitCode {
    // Stage 1: Load and validate config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let config = match load_strategy(&adapter) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let settings = match build_backtest_settings(&adapter, no_walk_forward, in_sample) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 2: Load bars
    let symbol = config.instrument.symbol.clone();
    let data_port: Box<dyn DataPort> = match data_path {
        Some(path) => {
            eprintln!("Loading bars for {symbol} from {}", path.display());
            Box::new(CsvAdapter::new(path.clone()))
        }
        None => {
            let periods = synthetic.unwrap_or(DEFAULT_SYNTHETIC_BARS);
            eprintln!(
                "Generating {periods} synthetic {}-minute bars for {symbol}",
                config.bar_minutes
            );
            Box::new(SyntheticDataAdapter::new(periods, config.bar_minutes))
        }
    };
    let bars = match data_port.fetch_bars(&symbol) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 3: Replay
    eprintln!(
        "Running backtest: {} bars, mode {}, walk-forward {}",
        bars.len(),
        config.mode,
        if settings.walk_forward { "on" } else { "off" }
    );
    let result = match backtest_engine::run_backtest(
        &bars,
        &config,
        settings.walk_forward,
        settings.in_sample,
    ) {
        Ok(r) => r,
        Err(e) => {
            let err = TraderError::from(e);
            eprintln!("error: {err}");
            return (&err).into();
        }
    };

    // Stage 4: Report
    let reporter = TextReportAdapter::new();
    eprintln!("\n{}", reporter.render(&result, &config));

    if let Some(path) = report_path {
        if let Err(e) = reporter.write(&result, &config, &path.display().to_string()) {
            eprintln!("error: {e}");
            return (&e).into();
        }
        eprintln!("Report written to {}", path.display());
    }

    if let Some(path) = trades_path {
        if let Err(e) = CsvLedgerAdapter::new(path.clone()).write_trades(&result.trades) {
            eprintln!("error: {e}");
            return (&e).into();
        }
        eprintln!("Trade ledger written to {}", path.display());
    }

    match result.outcome {
        BacktestOutcome::InsufficientData { bars, required } => {
            let err = TraderError::InsufficientData {
                symbol,
                bars,
                minimum: required,
            };
            eprintln!("error: {err}");
            (&err).into()
        }
        BacktestOutcome::NoTrades { .. } | BacktestOutcome::Completed(_) => ExitCode::SUCCESS,
    }
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let config = match load_strategy(&adapter) {
        Ok(c) => c,
        Err(code) => return code,
    };
    if let Err(e) = build_backtest_settings(&adapter, false, None) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    eprintln!(
        "\nInstrument:   {} (point value {})",
        config.instrument.symbol, config.instrument.point_value
    );
    eprintln!("Mode:         {}", config.mode);
    eprintln!(
        "EMAs:         {}/{}/{}",
        config.fast_ema_period, config.slow_ema_period, config.trend_ema_period
    );
    eprintln!("Risk/trade:   {}", fmt_currency(config.account_size * config.risk_per_trade_pct));
    eprintln!("Daily limit:  {}", fmt_currency(config.max_daily_loss()));
    eprintln!("Min bars:     {}", config.minimum_bars());
    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_size(config_path: &PathBuf, stop: f64) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let config = match load_strategy(&adapter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let risk = RiskManager::new(config);
    let contracts = risk.calculate_position_size(stop);
    let at_risk = risk.calculate_risk_amount(stop, contracts);

    println!("contracts: {contracts}");
    println!("risk:      {}", fmt_currency(at_risk));
    if contracts == 0 {
        eprintln!("warning: stop of {stop} points is too wide (or invalid) for the risk budget");
    }
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn empty_config_builds_defaults() {
        let config = build_strategy_config(&adapter("[account]\n")).unwrap();
        assert_eq!(config, StrategyConfig::default());
    }

    #[test]
    fn config_values_override_defaults() {
        let content = r#"
[account]
size = 50000
risk_per_trade = 0.005

[instrument]
symbol = MES
point_value = 5.0
bar_minutes = 1

[indicators]
fast_ema = 5
slow_ema = 13

[strategy]
mode = orb
use_atr_stops = false
orb_minutes = 30

[risk]
max_trades_per_session = 3

[backtest]
session = calendar
"#;
        let config = build_strategy_config(&adapter(content)).unwrap();
        assert_eq!(config.account_size, 50_000.0);
        assert_eq!(config.instrument.symbol, "MES");
        assert_eq!(config.instrument.point_value, 5.0);
        assert_eq!(config.bar_minutes, 1);
        assert_eq!(config.fast_ema_period, 5);
        assert_eq!(config.slow_ema_period, 13);
        assert_eq!(config.mode, StrategyMode::OpeningRange);
        assert!(!config.use_atr_stops);
        assert_eq!(config.orb_bars(), 30);
        assert_eq!(config.max_trades_per_session, 3);
        assert_eq!(config.session_boundary, SessionBoundary::CalendarDay);
    }

    #[test]
    fn unknown_mode_is_config_invalid() {
        let err = build_strategy_config(&adapter("[strategy]\nmode = scalper\n")).unwrap_err();
        assert!(matches!(err, TraderError::ConfigInvalid { ref key, .. } if key == "mode"));
    }

    #[test]
    fn unknown_session_is_config_invalid() {
        let err = build_strategy_config(&adapter("[backtest]\nsession = weekly\n")).unwrap_err();
        assert!(matches!(err, TraderError::ConfigInvalid { ref key, .. } if key == "session"));
    }

    #[test]
    fn blank_symbol_is_config_missing() {
        let err = build_strategy_config(&adapter("[instrument]\nsymbol =\n")).unwrap_err();
        assert!(matches!(err, TraderError::ConfigMissing { .. }));
    }

    #[test]
    fn negative_period_is_config_invalid() {
        let err = build_strategy_config(&adapter("[indicators]\ntrend_ema = -5\n")).unwrap_err();
        assert!(matches!(err, TraderError::ConfigInvalid { ref key, .. } if key == "trend_ema"));
    }

    #[test]
    fn backtest_settings_defaults_and_overrides() {
        let a = adapter("[backtest]\nin_sample = 0.6\n");
        let s = build_backtest_settings(&a, false, None).unwrap();
        assert_eq!(s, BacktestSettings { walk_forward: true, in_sample: 0.6 });

        let s = build_backtest_settings(&a, true, None).unwrap();
        assert!(!s.walk_forward);

        let s = build_backtest_settings(&a, false, Some(0.5)).unwrap();
        assert_eq!(s.in_sample, 0.5);

        assert!(build_backtest_settings(&a, false, Some(1.5)).is_err());
        // out-of-range fraction is ignored when walk-forward is off
        assert!(build_backtest_settings(&a, true, Some(1.5)).is_ok());
    }
}
