//! Session boundary detection for the backtest loop.
//!
//! The orchestrator asks a `SessionPolicy` whether a bar opens a new trading
//! session; on a boundary it resets the risk manager's daily counters and the
//! opening-range tracker.

use crate::domain::ohlcv::Bar;
use crate::domain::strategy::SessionBoundary;

pub trait SessionPolicy {
    /// True when `bars[index]` is the first bar of a session.
    fn is_session_start(&self, bars: &[Bar], index: usize) -> bool;
}

/// A session every `bars_per_session` bars by absolute index. With 5-minute
/// bars, 78 approximates one regular US equity-index session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedBarCadence {
    pub bars_per_session: usize,
}

impl SessionPolicy for FixedBarCadence {
    fn is_session_start(&self, _bars: &[Bar], index: usize) -> bool {
        self.bars_per_session > 0 && index % self.bars_per_session == 0
    }
}

/// A session starts on the first bar and whenever the calendar date of a bar
/// differs from the previous bar's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CalendarDay;

impl SessionPolicy for CalendarDay {
    fn is_session_start(&self, bars: &[Bar], index: usize) -> bool {
        match (index.checked_sub(1).and_then(|p| bars.get(p)), bars.get(index)) {
            (None, Some(_)) => true,
            (Some(prev), Some(cur)) => prev.timestamp.date() != cur.timestamp.date(),
            _ => false,
        }
    }
}

/// Build the policy selected in configuration.
pub fn policy_for(boundary: SessionBoundary) -> Box<dyn SessionPolicy> {
    match boundary {
        SessionBoundary::Cadence { bars_per_session } => {
            Box::new(FixedBarCadence { bars_per_session })
        }
        SessionBoundary::CalendarDay => Box::new(CalendarDay),
    }
}
