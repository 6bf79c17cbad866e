//! Average True Range as an exponential average of the true range.
//!
//! TR[0] = high - low (no prior close); TR[i] = Bar::true_range(close[i-1]).
//! ATR = EMA(TR, n).

use crate::domain::indicator::ema::calculate_ema;
use crate::domain::ohlcv::Bar;

pub fn true_ranges(bars: &[Bar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect()
}

pub fn calculate_atr(bars: &[Bar], period: usize) -> Vec<f64> {
    calculate_ema(&true_ranges(bars), period)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, NaiveDate};

    fn make_bars(hlc: &[(f64, f64, f64)]) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        hlc.iter()
            .enumerate()
            .map(|(i, &(high, low, close))| Bar {
                timestamp: start + Duration::minutes(5 * i as i64),
                open: close,
                high,
                low,
                close,
                volume: 1000,
            })
            .collect()
    }

    #[test]
    fn first_true_range_is_high_minus_low() {
        let bars = make_bars(&[(110.0, 100.0, 105.0)]);
        assert_eq!(true_ranges(&bars), vec![10.0]);
    }

    #[test]
    fn true_range_uses_prior_close_on_gaps() {
        let bars = make_bars(&[(110.0, 100.0, 105.0), (130.0, 120.0, 125.0)]);
        // |130 - 105| = 25 beats high-low = 10
        assert_eq!(true_ranges(&bars), vec![10.0, 25.0]);
    }

    #[test]
    fn atr_is_ema_of_true_range() {
        let bars = make_bars(&[
            (110.0, 100.0, 105.0),
            (115.0, 105.0, 110.0),
            (130.0, 110.0, 125.0),
        ]);
        let atr = calculate_atr(&bars, 3);
        let k = 0.5;
        let a1 = 10.0 * k + 10.0 * (1.0 - k);
        let a2 = 20.0 * k + a1 * (1.0 - k);
        assert_relative_eq!(atr[0], 10.0);
        assert_relative_eq!(atr[1], a1);
        assert_relative_eq!(atr[2], a2);
    }

    #[test]
    fn atr_defined_for_short_series() {
        let bars = make_bars(&[(101.0, 99.0, 100.0)]);
        assert_eq!(calculate_atr(&bars, 14).len(), 1);
    }
}
