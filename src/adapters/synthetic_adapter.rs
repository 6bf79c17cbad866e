//! Deterministic synthetic bar generator for demos and tests.
//!
//! Closes follow a geometric Brownian motion with a small first-order
//! autocorrelation; open/high/low are jittered around the close and volume
//! is log-normal. The same seed always yields the same series.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::error::TraderError;
use crate::domain::ohlcv::Bar;
use crate::ports::data_port::DataPort;

const TRADING_MINUTES_PER_YEAR: f64 = 60.0 * 24.0 * 252.0;
const AUTOCORRELATION: f64 = 0.1;
const OHLC_NOISE: f64 = 0.001;
const VOLUME_LOG_MEAN: f64 = 8.0;
const VOLUME_LOG_SD: f64 = 1.0;

#[derive(Debug, Clone)]
pub struct SyntheticDataAdapter {
    pub periods: usize,
    pub bar_minutes: u32,
    pub base_price: f64,
    pub annual_volatility: f64,
    pub annual_drift: f64,
    pub seed: u64,
    pub start: NaiveDateTime,
}

impl SyntheticDataAdapter {
    pub fn new(periods: usize, bar_minutes: u32) -> Self {
        SyntheticDataAdapter {
            periods,
            bar_minutes: bar_minutes.max(1),
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn generate(&self) -> Vec<Bar> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let dt = f64::from(self.bar_minutes) / TRADING_MINUTES_PER_YEAR;
        let mean = self.annual_drift * dt;
        let sd = self.annual_volatility * dt.sqrt();

        let mut log_price = self.base_price.ln();
        let mut prev_return = 0.0;
        let step = Duration::minutes(i64::from(self.bar_minutes));

        (0..self.periods)
            .map(|i| {
                let r = mean + sd * standard_normal(&mut rng) + AUTOCORRELATION * prev_return;
                prev_return = r;
                log_price += r;
                let close = log_price.exp();

                let noise = close * OHLC_NOISE;
                let open = close + noise * standard_normal(&mut rng);
                let high = open.max(close) + (2.0 * noise * standard_normal(&mut rng)).abs();
                let low = open.min(close) - (2.0 * noise * standard_normal(&mut rng)).abs();
                let volume =
                    (VOLUME_LOG_MEAN + VOLUME_LOG_SD * standard_normal(&mut rng)).exp() as i64;

                Bar {
                    timestamp: self.start + step * i as i32,
                    open: round_cents(open),
                    high: round_cents(high),
                    low: round_cents(low),
                    close: round_cents(close),
                    volume,
                }
            })
            .collect()
    }
}

impl Default for SyntheticDataAdapter {
    fn default() -> Self {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2)
            .and_then(|d| d.and_hms_opt(8, 30, 0))
            .unwrap_or_default();
        SyntheticDataAdapter {
            periods: 500,
            bar_minutes: 5,
            base_price: 21_500.0,
            annual_volatility: 0.20,
            annual_drift: 0.0001,
            seed: 42,
            start,
        }
    }
}

impl DataPort for SyntheticDataAdapter {
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<Bar>, TraderError> {
        let bars = self.generate();
        if bars.is_empty() {
            return Err(TraderError::NoData {
                symbol: symbol.to_string(),
            });
        }
        tracing::info!(symbol, bars = bars.len(), seed = self.seed, "synthetic bars generated");
        Ok(bars)
    }
}

/// Box-Muller transform.
fn standard_normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen_range(0.0..1.0);
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
