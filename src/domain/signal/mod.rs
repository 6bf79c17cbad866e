//! Signal generation.
//!
//! Each strategy inspects an enriched series up to and including one bar and
//! proposes at most one trade. `evaluate` slices the series to `..=index`
//! before any strategy sees it, so a strategy cannot read later bars.
//!
//! The set of strategies is closed: `StrategyMode` is matched exhaustively, so
//! adding a strategy is a compile-checked change here and in the mode enum.

pub mod momentum;
pub mod opening_range;

use std::fmt;

use crate::domain::indicator::{EnrichedBar, compute_indicators};
use crate::domain::ohlcv::Bar;
use crate::domain::position::Direction;
use crate::domain::strategy::{StrategyConfig, StrategyMode};

pub use self::opening_range::{OpeningRange, OpeningRangeTracker, compute_opening_range};

/// Originating-strategy tag carried by proposals and closed trades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    MomentumVolatility,
    OpeningRange,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::MomentumVolatility => write!(f, "Momentum-Volatility Fusion"),
            StrategyKind::OpeningRange => write!(f, "Opening-Range Breakout/Pullback"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeProposal {
    pub direction: Direction,
    pub entry_price: f64,
    pub stop_price: f64,
    pub target_price: f64,
    /// In [0, 1].
    pub confidence: f64,
    pub strategy: StrategyKind,
    pub rationale: String,
}

impl TradeProposal {
    pub fn is_flat(&self) -> bool {
        self.direction == Direction::Flat
    }

    pub fn stop_distance(&self) -> f64 {
        (self.entry_price - self.stop_price).abs()
    }

    /// Build a bracket around `entry`: the stop sits `stop_distance` against
    /// the trade, the target `stop_distance * reward_risk` in its favour.
    pub(crate) fn bracket(
        direction: Direction,
        entry: f64,
        stop_distance: f64,
        reward_risk: f64,
        confidence: f64,
        strategy: StrategyKind,
        rationale: String,
    ) -> Self {
        let sign = direction.sign();
        TradeProposal {
            direction,
            entry_price: entry,
            stop_price: entry - sign * stop_distance,
            target_price: entry + sign * stop_distance * reward_risk,
            confidence: confidence.clamp(0.0, 1.0),
            strategy,
            rationale,
        }
    }
}

/// Evaluate the configured strategy at `index`.
///
/// Returns `None` when nothing fires, when `index` is out of range, or when
/// there is not enough history to compare against a prior bar.
pub fn evaluate(
    bars: &[EnrichedBar],
    config: &StrategyConfig,
    index: usize,
    opening_range: Option<&OpeningRange>,
) -> Option<TradeProposal> {
    evaluate_mode(config.mode, bars, config, index, opening_range)
}

pub fn evaluate_mode(
    mode: StrategyMode,
    bars: &[EnrichedBar],
    config: &StrategyConfig,
    index: usize,
    opening_range: Option<&OpeningRange>,
) -> Option<TradeProposal> {
    if index >= bars.len() {
        return None;
    }
    let history = &bars[..=index];

    let proposal = match mode {
        StrategyMode::MomentumVolatility => momentum::evaluate(history, config),
        StrategyMode::OpeningRange => opening_range::evaluate(history, config, opening_range),
        StrategyMode::Combined => combine(
            momentum::evaluate(history, config),
            opening_range::evaluate(history, config, opening_range),
        ),
    };
    proposal.filter(|p| !p.is_flat())
}

/// Higher-confidence non-FLAT proposal; the first one wins a tie.
pub fn combine(
    first: Option<TradeProposal>,
    second: Option<TradeProposal>,
) -> Option<TradeProposal> {
    let first = first.filter(|p| !p.is_flat());
    let second = second.filter(|p| !p.is_flat());
    match (first, second) {
        (Some(a), Some(b)) => {
            if a.confidence >= b.confidence {
                Some(a)
            } else {
                Some(b)
            }
        }
        (Some(a), None) => Some(a),
        (None, b) => b,
    }
}

/// Live-use convenience: enrich `bars` and evaluate the most recent bar.
pub fn run_strategy(
    bars: &[Bar],
    config: &StrategyConfig,
    opening_range: Option<&OpeningRange>,
) -> Option<TradeProposal> {
    let last = bars.len().checked_sub(1)?;
    let enriched = compute_indicators(bars, config);
    evaluate(&enriched, config, last, opening_range)
}
