//! Market-data port.

use crate::domain::error::TraderError;
use crate::domain::ohlcv::Bar;

/// Supplies an ordered bar series for a symbol.
///
/// Implementations return bars sorted by strictly increasing timestamp.
/// An empty series is reported as `TraderError::NoData`.
pub trait DataPort {
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<Bar>, TraderError>;
}
