//! Open positions and closed trades.

use chrono::NaiveDateTime;
use std::fmt;

use crate::domain::signal::StrategyKind;

/// Opaque trade identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TradeId(pub u64);

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Long,
    Short,
    Flat,
}

impl Direction {
    /// +1 for long, -1 for short, 0 for flat.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
            Direction::Flat => 0.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
            Direction::Flat => write!(f, "FLAT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    SessionEnd,
    Manual,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::StopLoss => write!(f, "Stop Loss"),
            ExitReason::TakeProfit => write!(f, "Take Profit"),
            ExitReason::SessionEnd => write!(f, "Session End"),
            ExitReason::Manual => write!(f, "Manual"),
        }
    }
}

/// The single open position held by a risk manager.
///
/// `stop_price` trails; `target_price` is fixed at entry. The water marks
/// track the most favourable price seen since entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub id: TradeId,
    pub direction: Direction,
    pub entry_price: f64,
    pub stop_price: f64,
    pub target_price: f64,
    pub quantity: u32,
    pub high_water: f64,
    pub low_water: f64,
    pub entry_time: NaiveDateTime,
}

impl Position {
    pub fn is_long(&self) -> bool {
        self.direction == Direction::Long
    }

    pub fn is_short(&self) -> bool {
        self.direction == Direction::Short
    }

    /// Favourable move from entry in points; negative when under water.
    pub fn profit_points(&self, price: f64) -> f64 {
        (price - self.entry_price) * self.direction.sign()
    }

    pub fn stop_hit(&self, bar_high: f64, bar_low: f64) -> bool {
        if self.is_long() {
            bar_low <= self.stop_price
        } else {
            bar_high >= self.stop_price
        }
    }

    pub fn target_hit(&self, bar_high: f64, bar_low: f64) -> bool {
        if self.is_long() {
            bar_high >= self.target_price
        } else {
            bar_low <= self.target_price
        }
    }
}

/// An immutable ledger entry for a finished trade.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub id: TradeId,
    pub direction: Direction,
    pub strategy: StrategyKind,
    pub rationale: String,
    pub confidence: f64,
    pub quantity: u32,
    pub entry_price: f64,
    pub initial_stop: f64,
    pub final_stop: f64,
    pub target_price: f64,
    pub entry_time: NaiveDateTime,
    pub entry_bar: usize,
    /// Trigger price before exit slippage.
    pub exit_price: f64,
    pub fill_price: f64,
    pub exit_time: NaiveDateTime,
    pub exit_bar: usize,
    pub exit_reason: ExitReason,
    pub pnl_points: f64,
    pub gross_pnl: f64,
    pub commission: f64,
    pub net_pnl: f64,
    pub bars_held: usize,
}
