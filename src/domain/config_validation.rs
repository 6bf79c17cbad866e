//! Configuration validation.
//!
//! `validate_strategy_config` rejects values the engine cannot run with.
//! `config_warnings` returns advisory notes for values that are legal but
//! aggressive; they never block a run.

use crate::domain::error::TraderError;
use crate::domain::strategy::{SessionBoundary, StrategyConfig};

pub fn validate_strategy_config(config: &StrategyConfig) -> Result<(), TraderError> {
    validate_account(config)?;
    validate_instrument(config)?;
    validate_periods(config)?;
    validate_multipliers(config)?;
    validate_risk_limits(config)?;
    validate_costs(config)?;
    validate_backtest(config)?;
    Ok(())
}

fn validate_account(config: &StrategyConfig) -> Result<(), TraderError> {
    if !(config.account_size > 0.0) {
        return Err(TraderError::invalid("account", "size", "must be positive"));
    }
    if !(config.risk_per_trade_pct > 0.0 && config.risk_per_trade_pct <= 1.0) {
        return Err(TraderError::invalid(
            "account",
            "risk_per_trade",
            "must be in (0, 1]",
        ));
    }
    if !(config.max_daily_loss_pct > 0.0 && config.max_daily_loss_pct <= 1.0) {
        return Err(TraderError::invalid(
            "account",
            "max_daily_loss",
            "must be in (0, 1]",
        ));
    }
    Ok(())
}

fn validate_instrument(config: &StrategyConfig) -> Result<(), TraderError> {
    let instrument = &config.instrument;
    if instrument.symbol.trim().is_empty() {
        return Err(TraderError::invalid("instrument", "symbol", "must not be empty"));
    }
    if !(instrument.point_value > 0.0) {
        return Err(TraderError::invalid(
            "instrument",
            "point_value",
            "must be positive",
        ));
    }
    if !(instrument.tick_size > 0.0) {
        return Err(TraderError::invalid("instrument", "tick_size", "must be positive"));
    }
    if instrument.margin_per_contract < 0.0 {
        return Err(TraderError::invalid(
            "instrument",
            "margin_per_contract",
            "must be non-negative",
        ));
    }
    if config.bar_minutes == 0 {
        return Err(TraderError::invalid("instrument", "bar_minutes", "must be at least 1"));
    }
    Ok(())
}

fn validate_periods(config: &StrategyConfig) -> Result<(), TraderError> {
    let periods = [
        ("fast_ema", config.fast_ema_period),
        ("slow_ema", config.slow_ema_period),
        ("trend_ema", config.trend_ema_period),
        ("atr_period", config.atr_period),
        ("volume_sma", config.volume_sma_period),
        ("rsi_period", config.rsi_period),
    ];
    for (key, period) in periods {
        if period == 0 {
            return Err(TraderError::invalid("indicators", key, "must be at least 1"));
        }
    }
    Ok(())
}

fn validate_multipliers(config: &StrategyConfig) -> Result<(), TraderError> {
    if config.volume_multiplier < 0.0 {
        return Err(TraderError::invalid(
            "indicators",
            "volume_multiplier",
            "must be non-negative",
        ));
    }
    if config.use_atr_stops && !(config.atr_stop_multiplier > 0.0) {
        return Err(TraderError::invalid(
            "strategy",
            "atr_stop_multiplier",
            "must be positive when ATR stops are enabled",
        ));
    }
    if config.atr_breakout_multiplier < 0.0 {
        return Err(TraderError::invalid(
            "strategy",
            "atr_breakout_multiplier",
            "must be non-negative",
        ));
    }
    if !(config.reward_risk_ratio > 0.0) {
        return Err(TraderError::invalid("strategy", "reward_risk", "must be positive"));
    }
    if !(0.0..=1.0).contains(&config.min_confidence) {
        return Err(TraderError::invalid(
            "strategy",
            "min_confidence",
            "must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_risk_limits(config: &StrategyConfig) -> Result<(), TraderError> {
    if !(0.0..=1.0).contains(&config.trailing_stop_pct) {
        return Err(TraderError::invalid(
            "risk",
            "trailing_stop",
            "must be between 0 and 1",
        ));
    }
    if config.max_trades_per_session == 0 {
        return Err(TraderError::invalid(
            "risk",
            "max_trades_per_session",
            "must be at least 1",
        ));
    }
    Ok(())
}

fn validate_costs(config: &StrategyConfig) -> Result<(), TraderError> {
    if !(0.0..1.0).contains(&config.slippage_pct) {
        return Err(TraderError::invalid(
            "execution",
            "slippage",
            "must be in [0, 1)",
        ));
    }
    if config.commission_per_contract < 0.0 {
        return Err(TraderError::invalid(
            "execution",
            "commission_per_contract",
            "must be non-negative",
        ));
    }
    Ok(())
}

fn validate_backtest(config: &StrategyConfig) -> Result<(), TraderError> {
    if let SessionBoundary::Cadence { bars_per_session } = config.session_boundary {
        if bars_per_session == 0 {
            return Err(TraderError::invalid(
                "backtest",
                "bars_per_session",
                "must be at least 1",
            ));
        }
    }
    if !(0.0..1.0).contains(&config.risk_free_rate) {
        return Err(TraderError::invalid(
            "backtest",
            "risk_free_rate",
            "must be in [0, 1)",
        ));
    }
    if !(config.periods_per_year > 0.0) {
        return Err(TraderError::invalid(
            "backtest",
            "periods_per_year",
            "must be positive",
        ));
    }
    Ok(())
}

/// Walk-forward in-sample fraction must leave something to trade.
pub fn validate_in_sample(fraction: f64) -> Result<(), TraderError> {
    if !(fraction >= 0.0 && fraction < 1.0) {
        return Err(TraderError::invalid(
            "backtest",
            "in_sample",
            "must be in [0, 1)",
        ));
    }
    Ok(())
}

/// Advisory warnings for legal but aggressive settings.
pub fn config_warnings(config: &StrategyConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.risk_per_trade_pct > 0.02 {
        warnings.push("risk per trade above 2% is extremely aggressive for futures".to_string());
    }
    if config.risk_per_trade_pct > 0.01 {
        warnings.push(
            "risk per trade above 1% is above recommended levels; consider 0.25-0.5%".to_string(),
        );
    }
    if config.max_daily_loss_pct > 0.05 {
        warnings.push(
            "max daily loss above 5% risks blowing the account; 2% is typical".to_string(),
        );
    }
    if config.reward_risk_ratio < 1.0 {
        warnings.push(
            "reward:risk below 1.0 needs a win rate above 50% to break even".to_string(),
        );
    }
    if config.max_trades_per_session > 15 {
        warnings.push("more than 15 trades per session suggests overtrading".to_string());
    }
    if config.stop_loss_points < 10.0 {
        warnings.push(format!(
            "stop loss under 10 points is very tight for {}; expect frequent stop-outs",
            config.instrument.symbol
        ));
    }
    if config.stop_loss_points > 50.0 {
        warnings.push(
            "stop loss over 50 points means large currency risk per contract".to_string(),
        );
    }
    if config.fast_ema_period >= config.slow_ema_period {
        warnings.push(format!(
            "fast EMA ({}) is not shorter than slow EMA ({}); \
             crossovers will be inverted or absent",
            config.fast_ema_period, config.slow_ema_period
        ));
    }

    warnings
}
