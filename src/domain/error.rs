//! Domain error types.

use crate::domain::position::TradeId;

/// An invalid state transition requested of the risk manager.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RiskError {
    #[error("cannot open trade {requested}: trade {open} is still open")]
    PositionAlreadyOpen { open: TradeId, requested: TradeId },

    #[error("no open position with id {id}")]
    UnknownTrade { id: TradeId },

    #[error("refusing to open trade {id} with zero contracts")]
    ZeroQuantity { id: TradeId },

    #[error("refusing to open trade {id} with a FLAT direction")]
    FlatDirection { id: TradeId },
}

/// Top-level error type for hybridtrader.
#[derive(Debug, thiserror::Error)]
pub enum TraderError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("insufficient data for {symbol}: have {bars} bars, need {minimum}")]
    InsufficientData {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error(transparent)]
    Risk(#[from] RiskError),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TraderError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        TraderError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&TraderError> for std::process::ExitCode {
    fn from(err: &TraderError) -> Self {
        let code: u8 = match err {
            TraderError::Io(_) => 1,
            TraderError::ConfigParse { .. }
            | TraderError::ConfigMissing { .. }
            | TraderError::ConfigInvalid { .. } => 2,
            TraderError::DataSource { .. } | TraderError::Csv(_) => 3,
            TraderError::Risk(_) => 4,
            TraderError::NoData { .. } | TraderError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
