//! Opening-Range Breakout/Pullback.
//!
//! The opening range is the high/low of the first `orb_bars()` bars of a
//! session. It is only usable once all of those bars have closed; until then
//! the strategy stays silent.
//!
//! - Breakout LONG: close crosses above the range high, close above the trend
//!   EMA, and (when the ATR filter is on) ATR rising.
//! - Pullback LONG: bar low touches the fast EMA, close back above it, close
//!   above the trend EMA, and volume confirmed.
//!
//! SHORT mirrors both. Breakouts take precedence over pullbacks. Stops use the
//! fixed point distance.

use crate::domain::indicator::EnrichedBar;
use crate::domain::ohlcv::Bar;
use crate::domain::position::Direction;
use crate::domain::signal::{StrategyKind, TradeProposal};
use crate::domain::strategy::StrategyConfig;

const BREAKOUT_CONFIDENCE: f64 = 0.7;
const PULLBACK_CONFIDENCE: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpeningRange {
    pub high: f64,
    pub low: f64,
}

impl OpeningRange {
    pub fn width(&self) -> f64 {
        self.high - self.low
    }
}

/// High/low of `bars[start..start + count]`, truncated at the end of the
/// series. `None` when that window is empty.
pub fn compute_opening_range(bars: &[Bar], start: usize, count: usize) -> Option<OpeningRange> {
    let end = start.saturating_add(count).min(bars.len());
    let window = bars.get(start..end)?;
    let first = window.first()?;
    let init = OpeningRange {
        high: first.high,
        low: first.low,
    };
    Some(window.iter().fold(init, |range, bar| OpeningRange {
        high: range.high.max(bar.high),
        low: range.low.min(bar.low),
    }))
}

/// Incrementally builds the opening range of the current session.
///
/// Call `reset` at each session start, then `observe` every bar in order. The
/// range is exposed only after `bars_needed` bars have been observed.
#[derive(Debug, Clone)]
pub struct OpeningRangeTracker {
    bars_needed: usize,
    seen: usize,
    partial: Option<OpeningRange>,
}

impl OpeningRangeTracker {
    pub fn new(bars_needed: usize) -> Self {
        OpeningRangeTracker {
            bars_needed: bars_needed.max(1),
            seen: 0,
            partial: None,
        }
    }

    pub fn reset(&mut self) {
        self.seen = 0;
        self.partial = Some(OpeningRange {
            high: f64::NEG_INFINITY,
            low: f64::INFINITY,
        });
    }

    pub fn observe(&mut self, bar: &Bar) {
        if self.locked() {
            return;
        }
        if let Some(range) = self.partial.as_mut() {
            range.high = range.high.max(bar.high);
            range.low = range.low.min(bar.low);
            self.seen += 1;
        }
    }

    pub fn locked(&self) -> bool {
        self.partial.is_some() && self.seen >= self.bars_needed
    }

    pub fn range(&self) -> Option<OpeningRange> {
        if self.locked() { self.partial } else { None }
    }
}

pub fn evaluate(
    history: &[EnrichedBar],
    config: &StrategyConfig,
    opening_range: Option<&OpeningRange>,
) -> Option<TradeProposal> {
    let range = opening_range?;
    let [.., prev, cur] = history else {
        return None;
    };
    if !(cur.atr.is_finite() && cur.atr > 0.0) {
        return None;
    }
    let stop_distance = config.stop_loss_points;
    if !(stop_distance.is_finite() && stop_distance > 0.0) {
        return None;
    }

    let close = cur.bar.close;
    let bullish = close > cur.ema_trend;
    let bearish = close < cur.ema_trend;
    let atr_ok = !config.orb_atr_filter || cur.atr > prev.atr;

    let breakout_long = bullish && atr_ok && prev.bar.close <= range.high && close > range.high;
    let breakout_short = bearish && atr_ok && prev.bar.close >= range.low && close < range.low;
    let pullback_long =
        bullish && cur.volume_confirmed && cur.bar.low <= cur.ema_fast && close > cur.ema_fast;
    let pullback_short =
        bearish && cur.volume_confirmed && cur.bar.high >= cur.ema_fast && close < cur.ema_fast;

    let (direction, confidence, rationale) = if breakout_long {
        (
            Direction::Long,
            BREAKOUT_CONFIDENCE,
            format!(
                "close {close:.2} broke above opening range high {:.2} in uptrend",
                range.high
            ),
        )
    } else if breakout_short {
        (
            Direction::Short,
            BREAKOUT_CONFIDENCE,
            format!(
                "close {close:.2} broke below opening range low {:.2} in downtrend",
                range.low
            ),
        )
    } else if pullback_long {
        (
            Direction::Long,
            PULLBACK_CONFIDENCE,
            format!(
                "pullback to EMA {} ({:.2}) held, close {close:.2} above it in uptrend",
                config.fast_ema_period, cur.ema_fast
            ),
        )
    } else if pullback_short {
        (
            Direction::Short,
            PULLBACK_CONFIDENCE,
            format!(
                "rally to EMA {} ({:.2}) rejected, close {close:.2} below it in downtrend",
                config.fast_ema_period, cur.ema_fast
            ),
        )
    } else {
        return None;
    };

    Some(TradeProposal::bracket(
        direction,
        close,
        stop_distance,
        config.reward_risk_ratio,
        confidence,
        StrategyKind::OpeningRange,
        rationale,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn bar(i: i64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 4)
                .unwrap()
                .and_hms_opt(8, 30, 0)
                .unwrap()
                + Duration::minutes(5 * i),
            open: close,
            high,
            low,
            close,
            volume: 1500,
        }
    }

    fn enriched(bar: Bar, ema_fast: f64, ema_trend: f64, atr: f64) -> EnrichedBar {
        EnrichedBar {
            vwap: bar.close,
            bar,
            ema_fast,
            ema_slow: ema_fast,
            ema_trend,
            atr,
            volume_sma: 1000.0,
            volume_confirmed: true,
            rsi: 50.0,
        }
    }

    #[test]
    fn opening_range_covers_window() {
        let bars: Vec<Bar> = (0..20)
            .map(|i| bar(i, 100.0 + i as f64, 90.0 - i as f64, 95.0))
            .collect();
        let range = compute_opening_range(&bars, 0, 15).unwrap();
        assert_eq!(range.high, 114.0);
        assert_eq!(range.low, 76.0);
        assert!(range.width() > 0.0);
    }

    #[test]
    fn opening_range_truncates_and_handles_empty() {
        let bars: Vec<Bar> = (0..3).map(|i| bar(i, 10.0, 5.0, 7.0)).collect();
        assert!(compute_opening_range(&bars, 1, 10).is_some());
        assert!(compute_opening_range(&bars, 3, 2).is_none());
        assert!(compute_opening_range(&bars, 9, 2).is_none());
        assert!(compute_opening_range(&[], 0, 3).is_none());
    }

    #[test]
    fn tracker_locks_after_window() {
        let mut tracker = OpeningRangeTracker::new(3);
        assert!(tracker.range().is_none());

        tracker.reset();
        tracker.observe(&bar(0, 105.0, 100.0, 102.0));
        tracker.observe(&bar(1, 108.0, 101.0, 107.0));
        assert!(tracker.range().is_none());
        tracker.observe(&bar(2, 106.0, 99.0, 100.0));
        let range = tracker.range().unwrap();
        assert_eq!(range, OpeningRange { high: 108.0, low: 99.0 });

        // bars after the lock do not widen the range
        tracker.observe(&bar(3, 200.0, 1.0, 150.0));
        assert_eq!(tracker.range().unwrap(), range);

        tracker.reset();
        assert!(tracker.range().is_none());
    }

    #[test]
    fn tracker_ignores_bars_before_first_reset() {
        let mut tracker = OpeningRangeTracker::new(1);
        tracker.observe(&bar(0, 105.0, 100.0, 102.0));
        assert!(tracker.range().is_none());
    }

    #[test]
    fn breakout_long_above_range() {
        let range = OpeningRange { high: 110.0, low: 100.0 };
        let history = vec![
            enriched(bar(0, 110.0, 105.0, 109.0), 50.0, 100.0, 4.0),
            enriched(bar(1, 113.0, 109.0, 112.0), 50.0, 100.0, 5.0),
        ];
        let p = evaluate(&history, &StrategyConfig::default(), Some(&range)).unwrap();
        assert_eq!(p.direction, Direction::Long);
        assert_eq!(p.confidence, BREAKOUT_CONFIDENCE);
        assert!((p.stop_price - 87.0).abs() < 1e-9);
        assert!((p.target_price - (112.0 + 25.0 * 1.75)).abs() < 1e-9);
        assert_eq!(p.strategy, StrategyKind::OpeningRange);
    }

    #[test]
    fn breakout_short_below_range() {
        let range = OpeningRange { high: 110.0, low: 100.0 };
        let history = vec![
            enriched(bar(0, 102.0, 100.0, 101.0), 150.0, 120.0, 4.0),
            enriched(bar(1, 101.0, 96.0, 97.0), 150.0, 120.0, 5.0),
        ];
        let p = evaluate(&history, &StrategyConfig::default(), Some(&range)).unwrap();
        assert_eq!(p.direction, Direction::Short);
        assert!(p.stop_price > p.entry_price);
    }

    #[test]
    fn atr_filter_blocks_breakout_on_falling_atr() {
        let range = OpeningRange { high: 110.0, low: 100.0 };
        let mut history = vec![
            enriched(bar(0, 110.0, 105.0, 109.0), 50.0, 100.0, 6.0),
            enriched(bar(1, 113.0, 109.0, 112.0), 50.0, 100.0, 5.0),
        ];
        assert!(evaluate(&history, &StrategyConfig::default(), Some(&range)).is_none());

        let config = StrategyConfig {
            orb_atr_filter: false,
            ..StrategyConfig::default()
        };
        assert!(evaluate(&history, &config, Some(&range)).is_some());

        history[1].atr = 7.0;
        assert!(evaluate(&history, &StrategyConfig::default(), Some(&range)).is_some());
    }

    #[test]
    fn pullback_long_to_fast_ema() {
        let range = OpeningRange { high: 200.0, low: 50.0 };
        let history = vec![
            enriched(bar(0, 106.0, 104.0, 105.0), 104.0, 95.0, 4.0),
            enriched(bar(1, 106.0, 103.0, 105.0), 104.0, 95.0, 4.0),
        ];
        let p = evaluate(&history, &StrategyConfig::default(), Some(&range)).unwrap();
        assert_eq!(p.direction, Direction::Long);
        assert_eq!(p.confidence, PULLBACK_CONFIDENCE);
    }

    #[test]
    fn pullback_requires_volume() {
        let range = OpeningRange { high: 200.0, low: 50.0 };
        let mut history = vec![
            enriched(bar(0, 106.0, 104.0, 105.0), 104.0, 95.0, 4.0),
            enriched(bar(1, 106.0, 103.0, 105.0), 104.0, 95.0, 4.0),
        ];
        history[1].volume_confirmed = false;
        assert!(evaluate(&history, &StrategyConfig::default(), Some(&range)).is_none());
    }

    #[test]
    fn silent_without_locked_range() {
        let history = vec![
            enriched(bar(0, 110.0, 105.0, 109.0), 50.0, 100.0, 4.0),
            enriched(bar(1, 113.0, 109.0, 112.0), 50.0, 100.0, 5.0),
        ];
        assert!(evaluate(&history, &StrategyConfig::default(), None).is_none());
    }
}
