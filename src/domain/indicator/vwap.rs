//! Cumulative volume-weighted average price over the whole supplied series.
//!
//! VWAP[i] = sum(typical * volume) / sum(volume) for bars 0..=i.
//! Falls back to the bar's typical price while cumulative volume is zero.

use crate::domain::ohlcv::Bar;

pub fn calculate_vwap(bars: &[Bar]) -> Vec<f64> {
    let mut values = Vec::with_capacity(bars.len());
    let mut pv = 0.0;
    let mut vol = 0.0;

    for bar in bars {
        let typical = bar.typical_price();
        pv += typical * bar.volume as f64;
        vol += bar.volume as f64;
        values.push(if vol > 0.0 { pv / vol } else { typical });
    }

    values
}
