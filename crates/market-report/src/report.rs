//! Interval and final reports built from a recorded history.
//!
//! The history is replayed in chunks of `interval` ticks; after each chunk the
//! states it produced and a snapshot of active and exited portfolios are
//! kept, followed by a final summary for the whole run.
//!
//! Portfolio values need the per-investor decisions of every tick. A history
//! recorded without them still reports, with participation counts only.

use std::fmt;

use serde::{Deserialize, Serialize};

use market_events::{MarketState, ParticipationSummary, SimulationHistory};

use crate::ledger::{LedgerError, PortfolioLedger, ValuePoint};
use crate::stats::{summarize, GroupStats};

/// Active and exited investors at a point in the run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParticipantReport {
    pub active_count: usize,
    pub exited_count: usize,
    /// Portfolio statistics; `None` for an empty group or untracked values
    pub active: Option<GroupStats>,
    pub exited: Option<GroupStats>,
}

impl ParticipantReport {
    pub fn from_ledger(ledger: &PortfolioLedger) -> Self {
        let active = ledger.active_values();
        let exited = ledger.exited_values();
        Self {
            active_count: active.len(),
            exited_count: exited.len(),
            active: summarize(&active),
            exited: summarize(&exited),
        }
    }

    /// Counts only, for histories without per-investor decisions.
    pub fn from_participation(summary: &ParticipationSummary) -> Self {
        Self {
            active_count: summary.in_market,
            exited_count: summary.out_of_market(),
            active: None,
            exited: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalSummary {
    pub first_tick: u64,
    pub last_tick: u64,
    pub states: Vec<MarketState>,
    /// Market index after the interval's last tick
    pub market_index: f64,
    pub participants: ParticipantReport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketReport {
    pub seed: u64,
    pub initial_value: f64,
    /// False when the history carries no per-investor decisions
    pub portfolios_tracked: bool,
    pub intervals: Vec<IntervalSummary>,
    pub final_summary: ParticipantReport,
    pub value_series: Vec<ValuePoint>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReportError {
    #[error("report interval must be at least one tick")]
    ZeroInterval,
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl MarketReport {
    pub fn build(
        history: &SimulationHistory,
        interval: usize,
        initial_value: f64,
    ) -> Result<Self, ReportError> {
        if interval == 0 {
            return Err(ReportError::ZeroInterval);
        }

        let untracked = history
            .iter()
            .find(|r| r.decisions.is_empty() && r.participation.total > 0);
        if let Some(record) = untracked {
            tracing::warn!(
                tick = record.tick,
                investors = record.participation.total,
                "history has no per-investor decisions, reporting participation only"
            );
        }

        let portfolios_tracked = untracked.is_none();

        let mut ledger = PortfolioLedger::new(initial_value);
        let mut intervals = Vec::new();

        for chunk in history.records().chunks(interval) {
            if portfolios_tracked {
                for record in chunk {
                    ledger.apply(record)?;
                }
            }
            if let (Some(first), Some(last)) = (chunk.first(), chunk.last()) {
                let participants = if portfolios_tracked {
                    ParticipantReport::from_ledger(&ledger)
                } else {
                    ParticipantReport::from_participation(&last.participation)
                };
                intervals.push(IntervalSummary {
                    first_tick: first.tick,
                    last_tick: last.tick,
                    states: chunk.iter().map(|r| r.new_state).collect(),
                    market_index: last.market_index,
                    participants,
                });
            }
        }

        let final_summary = if portfolios_tracked {
            ParticipantReport::from_ledger(&ledger)
        } else {
            history
                .last()
                .map(|r| ParticipantReport::from_participation(&r.participation))
                .unwrap_or_default()
        };

        Ok(Self {
            seed: history.seed,
            initial_value,
            portfolios_tracked,
            intervals,
            final_summary,
            value_series: ledger.value_series().to_vec(),
        })
    }

    /// Renders the report as plain text for the terminal.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for MarketReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for interval in &self.intervals {
            writeln!(
                f,
                "Ticks {}-{} (market index {:.3})",
                interval.first_tick + 1,
                interval.last_tick + 1,
                interval.market_index
            )?;
            for (offset, state) in interval.states.iter().enumerate() {
                writeln!(
                    f,
                    "  Tick {}: {}",
                    interval.first_tick + offset as u64 + 1,
                    state.as_str().to_uppercase()
                )?;
            }
            self.write_participants(f, &interval.participants)?;
            writeln!(f)?;
        }

        writeln!(f, "==== FINAL SUMMARY ====")?;
        self.write_participants(f, &self.final_summary)
    }
}

impl MarketReport {
    fn write_participants(
        &self,
        f: &mut fmt::Formatter<'_>,
        report: &ParticipantReport,
    ) -> fmt::Result {
        self.write_group(f, "Active Participants", report.active_count, report.active.as_ref())?;
        self.write_group(f, "Exited Participants", report.exited_count, report.exited.as_ref())
    }

    fn write_group(
        &self,
        f: &mut fmt::Formatter<'_>,
        name: &str,
        count: usize,
        stats: Option<&GroupStats>,
    ) -> fmt::Result {
        writeln!(f, "--- {} Report ({} people) ---", name, count)?;
        match stats {
            Some(s) => write_stats(f, s),
            None if count > 0 && !self.portfolios_tracked => {
                writeln!(f, "Portfolio values not recorded.")
            }
            None => writeln!(f, "No data to show."),
        }
    }
}

fn write_stats(f: &mut fmt::Formatter<'_>, s: &GroupStats) -> fmt::Result {
    writeln!(f, "Mean: {:.2}", s.mean)?;
    writeln!(f, "Median: {:.2}", s.median)?;
    match s.mode {
        Some(mode) => writeln!(f, "Mode: {:.2}", mode)?,
        None => writeln!(f, "Mode: No unique mode")?,
    }
    writeln!(f, "Min: {:.2}", s.min)?;
    writeln!(f, "Max: {:.2}", s.max)
}
