//! Reporting for the Markov market simulation.
//!
//! Consumes a finished [`SimulationHistory`](market_events::SimulationHistory)
//! and never takes part in the simulation itself.
//!
//! # Modules
//!
//! - [`ledger`]: Replays per-investor portfolio values from history
//! - [`stats`]: Mean, median, mode, min and max over a group
//! - [`report`]: Interval summaries and the final report
//! - [`output`]: JSON files written after a run

pub mod ledger;
pub mod output;
pub mod report;
pub mod stats;

pub use ledger::{Holding, LedgerError, PortfolioLedger, ValuePoint, DEFAULT_INITIAL_VALUE};
pub use output::{
    read_history, write_all, write_history, write_market_value, write_report, write_ticks_jsonl,
    OutputError, HISTORY_FILE, MARKET_VALUE_FILE, REPORT_FILE, TICKS_FILE,
};
pub use report::{IntervalSummary, MarketReport, ParticipantReport, ReportError};
pub use stats::{round_cents, summarize, GroupStats};
