#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use hybridtrader::adapters::synthetic_adapter::SyntheticDataAdapter;
use hybridtrader::domain::error::TraderError;
pub use hybridtrader::domain::ohlcv::Bar;
use hybridtrader::domain::strategy::{StrategyConfig, StrategyMode};
use hybridtrader::ports::data_port::DataPort;
use std::collections::HashMap;
use std::io::Write;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<Bar>, TraderError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(TraderError::DataSource {
                reason: reason.clone(),
            });
        }
        match self.data.get(symbol) {
            Some(bars) if !bars.is_empty() => Ok(bars.clone()),
            _ => Err(TraderError::NoData {
                symbol: symbol.to_string(),
            }),
        }
    }
}

pub fn session_open() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 4)
        .unwrap()
        .and_hms_opt(8, 30, 0)
        .unwrap()
}

pub fn make_bar(index: usize, open: f64, high: f64, low: f64, close: f64, volume: i64) -> Bar {
    Bar {
        timestamp: session_open() + Duration::minutes(5 * index as i64),
        open,
        high,
        low,
        close,
        volume,
    }
}

/// Flat, quiet market: nothing ever crosses or breaks out.
pub fn flat_bars(n: usize) -> Vec<Bar> {
    (0..n)
        .map(|i| make_bar(i, 100.0, 100.5, 99.5, 100.0, 1000))
        .collect()
}

/// Steady uptrend of one point per bar. Every other bar is heavy volume and
/// wicks down through the fast EMA, which the opening-range pullback rule
/// treats as a long entry.
pub fn pullback_uptrend(n: usize) -> Vec<Bar> {
    (0..n)
        .map(|i| {
            let close = 1000.0 + i as f64;
            let heavy = i % 2 == 1;
            let low = if heavy { close - 6.0 } else { close - 1.5 };
            let volume = if heavy { 3000 } else { 1000 };
            make_bar(i, close - 1.0, close + 0.5, low, close, volume)
        })
        .collect()
}

pub fn synthetic_bars(n: usize, seed: u64) -> Vec<Bar> {
    SyntheticDataAdapter::new(n, 5).with_seed(seed).generate()
}

pub fn orb_config() -> StrategyConfig {
    StrategyConfig {
        mode: StrategyMode::OpeningRange,
        ..StrategyConfig::default()
    }
}

pub fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

pub const FIXTURE_INI: &str = r#"
[account]
size = 25000
risk_per_trade = 0.0025
max_daily_loss = 0.02

[instrument]
symbol = MNQ
point_value = 2.0
tick_size = 0.25
margin_per_contract = 50.0
bar_minutes = 5

[indicators]
fast_ema = 9
slow_ema = 21
trend_ema = 50
atr_period = 14
volume_sma = 20
volume_multiplier = 1.2

[strategy]
mode = combined
atr_stop_multiplier = 1.5
use_atr_stops = true
stop_loss_points = 25
reward_risk = 1.75
orb_minutes = 15
min_confidence = 0.5

[risk]
trailing_stop = 0.5
max_trades_per_session = 6

[execution]
slippage = 0.001
commission_per_contract = 0.62

[backtest]
walk_forward = true
in_sample = 0.7
session = cadence
bars_per_session = 78
"#;
