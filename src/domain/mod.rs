//! Core domain types and logic: indicators, signals, risk and the backtest
//! orchestrator. Nothing in here performs I/O.

pub mod backtest;
pub mod config_validation;
pub mod error;
pub mod indicator;
pub mod metrics;
pub mod ohlcv;
pub mod position;
pub mod risk;
pub mod session;
pub mod signal;
pub mod strategy;
