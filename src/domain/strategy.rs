//! Strategy configuration: the complete numeric tuning surface shared by the
//! signal generator and the risk manager.
//!
//! A `StrategyConfig` is immutable once built. Changing parameters means
//! building a new config, recomputing indicators and creating a fresh
//! `RiskManager`; nothing in the crate patches a live config in place.

use std::fmt;
use std::str::FromStr;

/// Contract specification of the traded futures instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentSpec {
    pub symbol: String,
    /// Currency value of a one-point move per contract.
    pub point_value: f64,
    pub tick_size: f64,
    /// Approximate intraday margin per contract, used to cap sizing.
    pub margin_per_contract: f64,
}

impl Default for InstrumentSpec {
    /// Micro E-mini Nasdaq-100.
    fn default() -> Self {
        InstrumentSpec {
            symbol: "MNQ".to_string(),
            point_value: 2.0,
            tick_size: 0.25,
            margin_per_contract: 50.0,
        }
    }
}

/// Which signal strategy the orchestrator evaluates each bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyMode {
    MomentumVolatility,
    OpeningRange,
    Combined,
}

impl FromStr for StrategyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "momentum" | "hybrid1" | "momentum-volatility" => Ok(StrategyMode::MomentumVolatility),
            "orb" | "hybrid2" | "opening-range" => Ok(StrategyMode::OpeningRange),
            "combined" | "both" => Ok(StrategyMode::Combined),
            other => Err(format!(
                "unknown strategy mode '{other}' (expected momentum, orb or combined)"
            )),
        }
    }
}

impl fmt::Display for StrategyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyMode::MomentumVolatility => write!(f, "momentum"),
            StrategyMode::OpeningRange => write!(f, "orb"),
            StrategyMode::Combined => write!(f, "combined"),
        }
    }
}

/// How the backtest detects the start of a new trading session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionBoundary {
    /// Every `bars_per_session` bars by absolute index.
    Cadence { bars_per_session: usize },
    /// Whenever the calendar date of the bar timestamp changes.
    CalendarDay,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    // account
    pub account_size: f64,
    pub risk_per_trade_pct: f64,
    pub max_daily_loss_pct: f64,

    pub instrument: InstrumentSpec,
    pub bar_minutes: u32,

    // indicators
    pub fast_ema_period: usize,
    pub slow_ema_period: usize,
    pub trend_ema_period: usize,
    pub atr_period: usize,
    pub volume_sma_period: usize,
    pub volume_multiplier: f64,
    pub rsi_period: usize,

    // entries and exits
    pub mode: StrategyMode,
    pub atr_stop_multiplier: f64,
    pub atr_breakout_multiplier: f64,
    pub use_atr_stops: bool,
    pub stop_loss_points: f64,
    pub reward_risk_ratio: f64,
    pub orb_minutes: u32,
    pub orb_atr_filter: bool,
    pub min_confidence: f64,

    // risk
    pub trailing_stop_pct: f64,
    pub max_trades_per_session: u32,

    // execution
    pub slippage_pct: f64,
    pub commission_per_contract: f64,

    // backtest
    pub session_boundary: SessionBoundary,
    pub risk_free_rate: f64,
    pub periods_per_year: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig {
            account_size: 25_000.0,
            risk_per_trade_pct: 0.0025,
            max_daily_loss_pct: 0.02,
            instrument: InstrumentSpec::default(),
            bar_minutes: 5,
            fast_ema_period: 9,
            slow_ema_period: 21,
            trend_ema_period: 50,
            atr_period: 14,
            volume_sma_period: 20,
            volume_multiplier: 1.2,
            rsi_period: 14,
            mode: StrategyMode::MomentumVolatility,
            atr_stop_multiplier: 1.5,
            atr_breakout_multiplier: 1.0,
            use_atr_stops: true,
            stop_loss_points: 25.0,
            reward_risk_ratio: 1.75,
            orb_minutes: 15,
            orb_atr_filter: true,
            min_confidence: 0.5,
            trailing_stop_pct: 0.5,
            max_trades_per_session: 6,
            slippage_pct: 0.001,
            commission_per_contract: 0.62,
            session_boundary: SessionBoundary::Cadence {
                bars_per_session: 78,
            },
            risk_free_rate: 0.05,
            periods_per_year: 252.0,
        }
    }
}

impl StrategyConfig {
    /// Currency amount of the daily loss limit.
    pub fn max_daily_loss(&self) -> f64 {
        self.account_size * self.max_daily_loss_pct
    }

    /// Number of session bars that make up the opening range.
    pub fn orb_bars(&self) -> usize {
        if self.bar_minutes == 0 {
            return 1;
        }
        let bars = (self.orb_minutes as f64 / self.bar_minutes as f64).round() as usize;
        bars.max(1)
    }

    /// Bars needed before any backtest is attempted.
    pub fn minimum_bars(&self) -> usize {
        self.trend_ema_period + 20
    }

    /// Leading bars skipped when walk-forward splitting is disabled.
    pub fn warmup_bars(&self) -> usize {
        self.trend_ema_period + 5
    }
}
