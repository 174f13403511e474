//! Files written after a run.
//!
//! - `history.json` - full simulation history
//! - `ticks.jsonl` - one tick record per line
//! - `market_value.json` - total active value per tick, for plotting
//! - `report.json` - interval and final statistics

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use market_events::SimulationHistory;

use crate::report::MarketReport;

pub const HISTORY_FILE: &str = "history.json";
pub const TICKS_FILE: &str = "ticks.jsonl";
pub const MARKET_VALUE_FILE: &str = "market_value.json";
pub const REPORT_FILE: &str = "report.json";

/// Errors that can occur during output operations.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn write_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), OutputError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

pub fn write_history(history: &SimulationHistory, path: &Path) -> Result<(), OutputError> {
    write_pretty(path, history)
}

/// Writes one JSON object per tick (JSON Lines).
pub fn write_ticks_jsonl(history: &SimulationHistory, path: &Path) -> Result<(), OutputError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    for record in history {
        writeln!(writer, "{}", record.to_jsonl()?)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_market_value(report: &MarketReport, path: &Path) -> Result<(), OutputError> {
    write_pretty(path, &report.value_series)
}

pub fn write_report(report: &MarketReport, path: &Path) -> Result<(), OutputError> {
    write_pretty(path, report)
}

/// Writes every output file into `output_dir`, creating it if needed.
pub fn write_all(
    history: &SimulationHistory,
    report: &MarketReport,
    output_dir: &Path,
) -> Result<(), OutputError> {
    fs::create_dir_all(output_dir)?;

    write_history(history, &output_dir.join(HISTORY_FILE))?;
    write_ticks_jsonl(history, &output_dir.join(TICKS_FILE))?;
    write_market_value(report, &output_dir.join(MARKET_VALUE_FILE))?;
    write_report(report, &output_dir.join(REPORT_FILE))?;

    tracing::info!(dir = %output_dir.display(), ticks = history.len(), "wrote run output");
    Ok(())
}

/// Reads a history written by [`write_history`].
pub fn read_history(path: &Path) -> Result<SimulationHistory, OutputError> {
    let content = fs::read_to_string(path)?;
    Ok(SimulationHistory::from_json(&content)?)
}
