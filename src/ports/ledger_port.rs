//! Trade ledger persistence port.

use crate::domain::error::TraderError;
use crate::domain::position::ClosedTrade;

pub trait LedgerPort {
    fn write_trades(&self, trades: &[ClosedTrade]) -> Result<(), TraderError>;
}
