//! Indicator engine.
//!
//! `compute_indicators` turns a bar series into an `EnrichedBar` series. Every
//! series is computed over the entire supplied history, so later values carry
//! full warm-up. Early values are defined but unreliable; callers decide how
//! many leading bars to skip. An enriched series is never patched: when the
//! bars or the config change, recompute it.

pub mod atr;
pub mod ema;
pub mod rsi;
pub mod volume;
pub mod vwap;

use crate::domain::ohlcv::Bar;
use crate::domain::strategy::StrategyConfig;

use self::atr::calculate_atr;
use self::ema::calculate_ema;
use self::rsi::calculate_rsi;
use self::volume::{calculate_volume_sma, is_volume_confirmed};
use self::vwap::calculate_vwap;

/// A bar plus every derived value the signal generator reads.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedBar {
    pub bar: Bar,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub ema_trend: f64,
    pub atr: f64,
    pub volume_sma: f64,
    pub volume_confirmed: bool,
    pub rsi: f64,
    pub vwap: f64,
}

/// Pure and deterministic: same bars and config, same output.
pub fn compute_indicators(bars: &[Bar], config: &StrategyConfig) -> Vec<EnrichedBar> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let ema_fast = calculate_ema(&closes, config.fast_ema_period);
    let ema_slow = calculate_ema(&closes, config.slow_ema_period);
    let ema_trend = calculate_ema(&closes, config.trend_ema_period);
    let atr = calculate_atr(bars, config.atr_period);
    let volume_sma = calculate_volume_sma(bars, config.volume_sma_period);
    let rsi = calculate_rsi(&closes, config.rsi_period);
    let vwap = calculate_vwap(bars);

    bars.iter()
        .enumerate()
        .map(|(i, bar)| EnrichedBar {
            bar: bar.clone(),
            ema_fast: ema_fast[i],
            ema_slow: ema_slow[i],
            ema_trend: ema_trend[i],
            atr: atr[i],
            volume_sma: volume_sma[i],
            volume_confirmed: is_volume_confirmed(
                bar.volume,
                volume_sma[i],
                config.volume_multiplier,
            ),
            rsi: rsi[i],
            vwap: vwap[i],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn make_bars(n: usize) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        (0..n)
            .map(|i| {
                let close = 100.0 + (i as f64 * 0.7).sin() * 5.0 + i as f64 * 0.1;
                Bar {
                    timestamp: start + Duration::minutes(5 * i as i64),
                    open: close - 0.5,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 1000 + (i as i64 % 5) * 300,
                }
            })
            .collect()
    }

    #[test]
    fn enriched_series_matches_input_length() {
        let bars = make_bars(120);
        let enriched = compute_indicators(&bars, &StrategyConfig::default());
        assert_eq!(enriched.len(), bars.len());
        for (e, b) in enriched.iter().zip(&bars) {
            assert_eq!(&e.bar, b);
        }
    }

    #[test]
    fn values_defined_before_longest_period() {
        let bars = make_bars(10);
        let enriched = compute_indicators(&bars, &StrategyConfig::default());
        for e in &enriched {
            assert!(e.ema_fast.is_finite());
            assert!(e.ema_trend.is_finite());
            assert!(e.atr.is_finite() && e.atr >= 0.0);
            assert!((0.0..=100.0).contains(&e.rsi));
            assert!(e.vwap.is_finite());
        }
    }

    #[test]
    fn deterministic_for_same_input() {
        let bars = make_bars(80);
        let config = StrategyConfig::default();
        assert_eq!(
            compute_indicators(&bars, &config),
            compute_indicators(&bars, &config)
        );
    }

    #[test]
    fn prefix_values_ignore_later_bars() {
        let bars = make_bars(100);
        let config = StrategyConfig::default();
        let full = compute_indicators(&bars, &config);
        let prefix = compute_indicators(&bars[..60], &config);
        assert_eq!(&full[..60], &prefix[..]);
    }

    #[test]
    fn volume_confirmation_uses_multiplier() {
        let mut bars = make_bars(30);
        bars[29].volume = 100_000;
        let enriched = compute_indicators(&bars, &StrategyConfig::default());
        assert!(enriched[29].volume_confirmed);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(compute_indicators(&[], &StrategyConfig::default()).is_empty());
    }
}
