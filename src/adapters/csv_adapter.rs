//! CSV bar data adapter.
//!
//! Reads `timestamp,open,high,low,close,volume` files with a header row.
//! The adapter path may be a single file, or a directory holding one
//! `<SYMBOL>.csv` per symbol.

use crate::domain::error::TraderError;
use crate::domain::ohlcv::Bar;
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct CsvAdapter {
    path: PathBuf,
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        if self.path.is_dir() {
            self.path.join(format!("{symbol}.csv"))
        } else {
            self.path.clone()
        }
    }
}

pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn field<T: std::str::FromStr>(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
    line: u64,
) -> Result<T, TraderError>
where
    T::Err: std::fmt::Display,
{
    let raw = record.get(index).ok_or_else(|| TraderError::DataSource {
        reason: format!("line {line}: missing {name} column"),
    })?;
    raw.trim().parse().map_err(|e| TraderError::DataSource {
        reason: format!("line {line}: invalid {name} value '{raw}': {e}"),
    })
}

impl DataPort for CsvAdapter {
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<Bar>, TraderError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| TraderError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            let raw_ts = record.get(0).ok_or_else(|| TraderError::DataSource {
                reason: format!("line {line}: missing timestamp column"),
            })?;
            let timestamp = parse_timestamp(raw_ts).ok_or_else(|| TraderError::DataSource {
                reason: format!("line {line}: invalid timestamp '{raw_ts}'"),
            })?;

            bars.push(Bar {
                timestamp,
                open: field(&record, 1, "open", line)?,
                high: field(&record, 2, "high", line)?,
                low: field(&record, 3, "low", line)?,
                close: field(&record, 4, "close", line)?,
                volume: field(&record, 5, "volume", line)?,
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        let before = bars.len();
        bars.dedup_by_key(|b| b.timestamp);
        if bars.len() < before {
            tracing::warn!(
                symbol,
                dropped = before - bars.len(),
                "duplicate timestamps dropped"
            );
        }

        if bars.is_empty() {
            return Err(TraderError::NoData {
                symbol: symbol.to_string(),
            });
        }
        tracing::info!(symbol, bars = bars.len(), path = %path.display(), "bars loaded");
        Ok(bars)
    }
}
