//! Writes the closed-trade ledger as CSV.

use std::path::PathBuf;

use crate::domain::error::TraderError;
use crate::domain::position::ClosedTrade;
use crate::ports::ledger_port::LedgerPort;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const HEADER: [&str; 21] = [
    "id",
    "direction",
    "strategy",
    "confidence",
    "quantity",
    "entry_time",
    "entry_price",
    "initial_stop",
    "final_stop",
    "target_price",
    "exit_time",
    "exit_price",
    "fill_price",
    "exit_reason",
    "pnl_points",
    "gross_pnl",
    "commission",
    "net_pnl",
    "entry_bar",
    "bars_held",
    "rationale",
];

pub struct CsvLedgerAdapter {
    path: PathBuf,
}

impl CsvLedgerAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl LedgerPort for CsvLedgerAdapter {
    fn write_trades(&self, trades: &[ClosedTrade]) -> Result<(), TraderError> {
        let mut writer = csv::Writer::from_path(&self.path)?;
        writer.write_record(HEADER)?;

        for t in trades {
            writer.write_record([
                t.id.0.to_string(),
                t.direction.to_string(),
                t.strategy.to_string(),
                format!("{:.2}", t.confidence),
                t.quantity.to_string(),
                t.entry_time.format(TIMESTAMP_FORMAT).to_string(),
                format!("{:.2}", t.entry_price),
                format!("{:.2}", t.initial_stop),
                format!("{:.2}", t.final_stop),
                format!("{:.2}", t.target_price),
                t.exit_time.format(TIMESTAMP_FORMAT).to_string(),
                format!("{:.2}", t.exit_price),
                format!("{:.2}", t.fill_price),
                t.exit_reason.to_string(),
                format!("{:.2}", t.pnl_points),
                format!("{:.2}", t.gross_pnl),
                format!("{:.2}", t.commission),
                format!("{:.2}", t.net_pnl),
                t.entry_bar.to_string(),
                t.bars_held.to_string(),
                t.rationale.clone(),
            ])?;
        }

        writer.flush()?;
        tracing::info!(path = %self.path.display(), trades = trades.len(), "trade ledger written");
        Ok(())
    }
}
