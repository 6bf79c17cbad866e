//! Risk manager: sizing, the pre-trade gate, trailing stops and exit
//! accounting for a single open position.
//!
//! One `RiskManager` is bound to one `StrategyConfig` and owns all of its
//! session state. It is not shared: a backtest and a live session each build
//! their own instance.

use std::fmt;

use chrono::NaiveDateTime;

use crate::domain::error::RiskError;
use crate::domain::position::{Direction, ExitReason, Position, TradeId};
use crate::domain::strategy::StrategyConfig;

/// Why trading was halted for the rest of the session.
#[derive(Debug, Clone, PartialEq)]
pub enum ShutdownReason {
    /// Daily realized P&L reached the loss limit.
    DailyLossLimit { daily_pnl: f64, limit: f64 },
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownReason::DailyLossLimit { daily_pnl, limit } => write!(
                f,
                "max daily loss reached (pnl {daily_pnl:.2}, limit {limit:.2})"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockReason {
    Shutdown(ShutdownReason),
    MaxTrades { limit: u32 },
    PositionOpen(TradeId),
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockReason::Shutdown(reason) => write!(f, "trading halted: {reason}"),
            BlockReason::MaxTrades { limit } => {
                write!(f, "max trades per session reached ({limit})")
            }
            BlockReason::PositionOpen(id) => write!(f, "position {id} already open"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TradeDecision {
    Allowed,
    Blocked(BlockReason),
}

impl TradeDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, TradeDecision::Allowed)
    }
}

/// Per-session mutable state. Reset at each session boundary except for the
/// open position, which survives into the next session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RiskSessionState {
    pub daily_pnl: f64,
    pub trades_today: u32,
    pub shutdown: Option<ShutdownReason>,
    pub position: Option<Position>,
}

/// Everything needed to open a position.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryOrder {
    pub id: TradeId,
    pub direction: Direction,
    pub entry_price: f64,
    pub stop_price: f64,
    pub target_price: f64,
    pub quantity: u32,
    pub entry_time: NaiveDateTime,
}

/// A triggered stop or target: the trigger price and which one fired.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitSignal {
    pub price: f64,
    pub reason: ExitReason,
}

/// Result of finalising an exit.
#[derive(Debug, Clone, PartialEq)]
pub struct ExitRecord {
    pub id: TradeId,
    pub direction: Direction,
    pub entry_price: f64,
    /// Requested exit price before slippage.
    pub exit_price: f64,
    pub fill_price: f64,
    pub final_stop: f64,
    pub quantity: u32,
    pub reason: ExitReason,
    pub pnl_points: f64,
    pub gross_pnl: f64,
    pub commission: f64,
    pub slippage_cost: f64,
    pub net_pnl: f64,
}

/// Read-only snapshot for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskStatus {
    pub daily_pnl: f64,
    pub trades_today: u32,
    pub max_trades: u32,
    pub trades_remaining: u32,
    pub shutdown: Option<ShutdownReason>,
    pub max_daily_loss: f64,
    pub remaining_loss_budget: f64,
    pub open_positions: usize,
    /// Share of the daily loss budget still available, in percent.
    pub loss_budget_pct: f64,
}

#[derive(Debug, Clone)]
pub struct RiskManager {
    config: StrategyConfig,
    state: RiskSessionState,
    trade_log: Vec<ExitRecord>,
}

impl RiskManager {
    pub fn new(config: StrategyConfig) -> Self {
        RiskManager {
            config,
            state: RiskSessionState::default(),
            trade_log: Vec::new(),
        }
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn state(&self) -> &RiskSessionState {
        &self.state
    }

    pub fn open_position(&self) -> Option<&Position> {
        self.state.position.as_ref()
    }

    pub fn trade_log(&self) -> &[ExitRecord] {
        &self.trade_log
    }

    /// Start a new session. The open position, if any, is kept.
    pub fn reset_daily(&mut self) {
        self.state.daily_pnl = 0.0;
        self.state.trades_today = 0;
        self.state.shutdown = None;
    }

    /// Pre-trade gate. Latches the shutdown flag when the daily loss limit
    /// has been reached, so this is not a pure query.
    pub fn can_trade(&mut self) -> TradeDecision {
        if let Some(reason) = &self.state.shutdown {
            return TradeDecision::Blocked(BlockReason::Shutdown(reason.clone()));
        }

        if let Some(reason) = self.daily_loss_breach() {
            tracing::warn!(daily_pnl = self.state.daily_pnl, "daily loss limit latched");
            self.state.shutdown = Some(reason.clone());
            return TradeDecision::Blocked(BlockReason::Shutdown(reason));
        }

        if self.state.trades_today >= self.config.max_trades_per_session {
            return TradeDecision::Blocked(BlockReason::MaxTrades {
                limit: self.config.max_trades_per_session,
            });
        }

        if let Some(position) = &self.state.position {
            return TradeDecision::Blocked(BlockReason::PositionOpen(position.id));
        }

        TradeDecision::Allowed
    }

    /// Contracts for a given stop distance in points.
    ///
    /// floor(risk budget / (stop * point value)), bumped to 1 when the exact
    /// fraction is at least one half, then capped by what the account can
    /// margin. Zero for a non-positive or non-finite stop.
    pub fn calculate_position_size(&self, stop_distance: f64) -> u32 {
        if !(stop_distance.is_finite() && stop_distance > 0.0) {
            return 0;
        }
        let cost_per_contract = stop_distance * self.config.instrument.point_value;
        if !(cost_per_contract > 0.0) {
            return 0;
        }

        let exact = self.risk_budget() / cost_per_contract;
        if !(exact.is_finite() && exact > 0.0) {
            return 0;
        }
        let mut contracts = exact.floor();
        if contracts == 0.0 && exact >= 0.5 {
            contracts = 1.0;
        }

        contracts.min(self.margin_cap()) as u32
    }

    /// Currency at risk for `quantity` contracts with the given stop.
    pub fn calculate_risk_amount(&self, stop_distance: f64, quantity: u32) -> f64 {
        stop_distance * self.config.instrument.point_value * f64::from(quantity)
    }

    /// Open a position. The caller is expected to have consulted `can_trade`.
    pub fn process_entry(&mut self, order: EntryOrder) -> Result<(), RiskError> {
        if let Some(open) = &self.state.position {
            return Err(RiskError::PositionAlreadyOpen {
                open: open.id,
                requested: order.id,
            });
        }
        if order.direction == Direction::Flat {
            return Err(RiskError::FlatDirection { id: order.id });
        }
        if order.quantity == 0 {
            return Err(RiskError::ZeroQuantity { id: order.id });
        }

        tracing::debug!(
            trade_id = %order.id,
            direction = %order.direction,
            entry = order.entry_price,
            stop = order.stop_price,
            target = order.target_price,
            quantity = order.quantity,
            "position opened"
        );

        self.state.position = Some(Position {
            id: order.id,
            direction: order.direction,
            entry_price: order.entry_price,
            stop_price: order.stop_price,
            target_price: order.target_price,
            quantity: order.quantity,
            high_water: order.entry_price,
            low_water: order.entry_price,
            entry_time: order.entry_time,
        });
        self.state.trades_today += 1;
        Ok(())
    }

    /// Check the bar against stop and target. The stop is checked first, so
    /// a bar spanning both resolves as a stop-loss. When neither fires the
    /// trailing stop is advanced with the bar's close.
    pub fn check_exit_conditions(
        &mut self,
        id: TradeId,
        bar_high: f64,
        bar_low: f64,
        bar_close: f64,
    ) -> Result<Option<ExitSignal>, RiskError> {
        let position = self.position_for(id)?;

        if position.stop_hit(bar_high, bar_low) {
            return Ok(Some(ExitSignal {
                price: position.stop_price,
                reason: ExitReason::StopLoss,
            }));
        }
        if position.target_hit(bar_high, bar_low) {
            return Ok(Some(ExitSignal {
                price: position.target_price,
                reason: ExitReason::TakeProfit,
            }));
        }

        self.update_trailing_stop(id, bar_close)?;
        Ok(None)
    }

    /// Trail the stop behind the most favourable price seen since entry.
    ///
    /// Only trails while `current_price` is in profit. The candidate is
    /// `high_water - profit * trailing_stop_pct` for a long (mirrored for a
    /// short) and replaces the stop only when it tightens it. Returns the new
    /// stop when it moved.
    pub fn update_trailing_stop(
        &mut self,
        id: TradeId,
        current_price: f64,
    ) -> Result<Option<f64>, RiskError> {
        let trailing = self.config.trailing_stop_pct;
        let position = self.position_for_mut(id)?;

        if position.is_long() {
            position.high_water = position.high_water.max(current_price);
        } else {
            position.low_water = position.low_water.min(current_price);
        }

        let profit = position.profit_points(current_price);
        if profit <= 0.0 {
            return Ok(None);
        }

        let trail = profit * trailing;
        let (candidate, tighter) = if position.is_long() {
            let c = position.high_water - trail;
            (c, c > position.stop_price)
        } else {
            let c = position.low_water + trail;
            (c, c < position.stop_price)
        };

        if !tighter {
            return Ok(None);
        }

        tracing::debug!(
            trade_id = %id,
            from = position.stop_price,
            to = candidate,
            "trailing stop moved"
        );
        position.stop_price = candidate;
        Ok(Some(candidate))
    }

    /// Close the position at `exit_price`, charging slippage against the
    /// holder and round-trip commission. Daily P&L is updated and the loss
    /// limit re-checked.
    pub fn process_exit(
        &mut self,
        id: TradeId,
        exit_price: f64,
        reason: ExitReason,
    ) -> Result<ExitRecord, RiskError> {
        let position = self.position_for(id)?.clone();

        let point_value = self.config.instrument.point_value;
        let quantity = f64::from(position.quantity);
        let slippage = exit_price * self.config.slippage_pct;
        let fill_price = if position.is_long() {
            exit_price - slippage
        } else {
            exit_price + slippage
        };

        let pnl_points = position.profit_points(fill_price);
        let gross_pnl = pnl_points * point_value * quantity;
        let commission = self.config.commission_per_contract * quantity * 2.0;
        let net_pnl = gross_pnl - commission;

        let record = ExitRecord {
            id,
            direction: position.direction,
            entry_price: position.entry_price,
            exit_price,
            fill_price,
            final_stop: position.stop_price,
            quantity: position.quantity,
            reason,
            pnl_points,
            gross_pnl,
            commission,
            slippage_cost: slippage * point_value * quantity,
            net_pnl,
        };

        self.state.daily_pnl += net_pnl;
        self.state.position = None;
        self.trade_log.push(record.clone());

        tracing::debug!(
            trade_id = %id,
            reason = %reason,
            fill = fill_price,
            net_pnl,
            daily_pnl = self.state.daily_pnl,
            "position closed"
        );

        if self.state.shutdown.is_none() {
            if let Some(shutdown) = self.daily_loss_breach() {
                tracing::warn!(
                    daily_pnl = self.state.daily_pnl,
                    "daily loss limit reached after exit"
                );
                self.state.shutdown = Some(shutdown);
            }
        }

        Ok(record)
    }

    pub fn get_status(&self) -> RiskStatus {
        let max_loss = self.config.max_daily_loss();
        let remaining = max_loss + self.state.daily_pnl;
        RiskStatus {
            daily_pnl: self.state.daily_pnl,
            trades_today: self.state.trades_today,
            max_trades: self.config.max_trades_per_session,
            trades_remaining: self
                .config
                .max_trades_per_session
                .saturating_sub(self.state.trades_today),
            shutdown: self.state.shutdown.clone(),
            max_daily_loss: max_loss,
            remaining_loss_budget: remaining.max(0.0),
            open_positions: usize::from(self.state.position.is_some()),
            loss_budget_pct: if max_loss > 0.0 {
                remaining / max_loss * 100.0
            } else {
                0.0
            },
        }
    }

    fn risk_budget(&self) -> f64 {
        self.config.account_size * self.config.risk_per_trade_pct
    }

    fn margin_cap(&self) -> f64 {
        let margin = self.config.instrument.margin_per_contract;
        if margin > 0.0 {
            (self.config.account_size / margin).floor().max(1.0)
        } else {
            f64::INFINITY
        }
    }

    fn daily_loss_breach(&self) -> Option<ShutdownReason> {
        let limit = self.config.max_daily_loss();
        (self.state.daily_pnl <= -limit).then_some(ShutdownReason::DailyLossLimit {
            daily_pnl: self.state.daily_pnl,
            limit,
        })
    }

    fn position_for(&self, id: TradeId) -> Result<&Position, RiskError> {
        self.state
            .position
            .as_ref()
            .filter(|p| p.id == id)
            .ok_or(RiskError::UnknownTrade { id })
    }

    fn position_for_mut(&mut self, id: TradeId) -> Result<&mut Position, RiskError> {
        self.state
            .position
            .as_mut()
            .filter(|p| p.id == id)
            .ok_or(RiskError::UnknownTrade { id })
    }
}
