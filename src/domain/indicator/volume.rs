//! Volume moving average and confirmation.

use crate::domain::ohlcv::Bar;

/// Simple moving average of volume over n bars.
///
/// Before n bars exist the mean covers every bar seen so far, so the series is
/// defined from the first bar on.
pub fn calculate_volume_sma(bars: &[Bar], period: usize) -> Vec<f64> {
    let period = period.max(1);
    let mut values = Vec::with_capacity(bars.len());
    let mut window_sum = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        window_sum += bar.volume as f64;
        if i >= period {
            window_sum -= bars[i - period].volume as f64;
        }
        let count = (i + 1).min(period);
        values.push(window_sum / count as f64);
    }

    values
}

/// volume > sma * multiplier
pub fn is_volume_confirmed(volume: i64, volume_sma: f64, multiplier: f64) -> bool {
    volume as f64 > volume_sma * multiplier
}
