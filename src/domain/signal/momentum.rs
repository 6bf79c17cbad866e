//! Momentum-Volatility Fusion.
//!
//! LONG when, on the evaluated bar:
//! - the fast EMA crosses above the slow EMA,
//! - the close is above the trend EMA,
//! - volume is confirmed,
//! - and the prior bar's high exceeded its close + ATR * breakout multiplier.
//!
//! SHORT mirrors every condition. Stops are ATR-scaled unless
//! `use_atr_stops` is off, in which case the fixed point stop applies.

use crate::domain::indicator::EnrichedBar;
use crate::domain::position::Direction;
use crate::domain::signal::{StrategyKind, TradeProposal};
use crate::domain::strategy::StrategyConfig;

pub fn evaluate(history: &[EnrichedBar], config: &StrategyConfig) -> Option<TradeProposal> {
    let [.., prev, cur] = history else {
        return None;
    };
    if !(cur.atr.is_finite() && cur.atr > 0.0) {
        return None;
    }

    let close = cur.bar.close;
    let breakout = prev.atr * config.atr_breakout_multiplier;

    let cross_up = prev.ema_fast <= prev.ema_slow && cur.ema_fast > cur.ema_slow;
    let cross_down = prev.ema_fast >= prev.ema_slow && cur.ema_fast < cur.ema_slow;
    let breakout_up = prev.bar.high > prev.bar.close + breakout;
    let breakout_down = prev.bar.low < prev.bar.close - breakout;

    let direction = if cross_up && close > cur.ema_trend && cur.volume_confirmed && breakout_up {
        Direction::Long
    } else if cross_down && close < cur.ema_trend && cur.volume_confirmed && breakout_down {
        Direction::Short
    } else {
        return None;
    };

    let stop_distance = if config.use_atr_stops {
        cur.atr * config.atr_stop_multiplier
    } else {
        config.stop_loss_points
    };
    if !(stop_distance.is_finite() && stop_distance > 0.0) {
        return None;
    }

    let cross = if direction == Direction::Long { "above" } else { "below" };
    let rationale = format!(
        "EMA {} crossed {} EMA {} with close {:.2} {} trend EMA {} ({:.2}), \
         volume {} vs avg {:.0}, prior-bar ATR breakout",
        config.fast_ema_period,
        cross,
        config.slow_ema_period,
        close,
        cross,
        config.trend_ema_period,
        cur.ema_trend,
        cur.bar.volume,
        cur.volume_sma,
    );

    Some(TradeProposal::bracket(
        direction,
        close,
        stop_distance,
        config.reward_risk_ratio,
        confidence(cur, config),
        StrategyKind::MomentumVolatility,
        rationale,
    ))
}

/// 0.5 base, plus up to 0.25 for distance from the trend EMA (in ATRs) and up
/// to 0.25 for volume above the confirmation threshold.
fn confidence(bar: &EnrichedBar, config: &StrategyConfig) -> f64 {
    let trend_strength = if bar.atr > 0.0 {
        ((bar.bar.close - bar.ema_trend).abs() / bar.atr).min(1.0)
    } else {
        0.0
    };
    let threshold = bar.volume_sma * config.volume_multiplier;
    let volume_strength = if threshold > 0.0 {
        (bar.bar.volume as f64 / threshold - 1.0).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (0.5 + 0.25 * trend_strength + 0.25 * volume_strength).clamp(0.0, 1.0)
}
