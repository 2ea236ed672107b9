use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::error::Result;
use crate::session::Difficulty;

const CSV_HEADER: [&str; 5] = [
    "timestamp",
    "wpm",
    "accuracy",
    "difficulty",
    "duration_secs",
];

/// One finished session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Local>,
    pub wpm: u32,
    pub accuracy: u32,
    pub difficulty: Difficulty,
    pub duration_secs: u64,
}

/// Best WPM and best accuracy seen so far. The two may come from different sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PersonalBest {
    pub wpm: u32,
    pub accuracy: u32,
}

impl PersonalBest {
    pub fn is_set(&self) -> bool {
        self.wpm > 0 || self.accuracy > 0
    }
}

/// Append-only record of finished sessions for the lifetime of the process
#[derive(Debug, Clone, Default)]
pub struct HistoryLedger {
    entries: Vec<HistoryEntry>,
    best: PersonalBest,
}

impl HistoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    pub fn update_best(&mut self, wpm: u32, accuracy: u32) {
        self.best.wpm = self.best.wpm.max(wpm);
        self.best.accuracy = self.best.accuracy.max(accuracy);
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn best(&self) -> PersonalBest {
        self.best
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn average_wpm(&self) -> Option<f64> {
        if self.entries.is_empty() {
            return None;
        }
        let sum: u64 = self.entries.iter().map(|e| u64::from(e.wpm)).sum();
        Some(sum as f64 / self.entries.len() as f64)
    }

    /// Population standard deviation of session WPM, a rough consistency score
    pub fn wpm_std_dev(&self) -> Option<f64> {
        let avg = self.average_wpm()?;
        let variance = self
            .entries
            .iter()
            .map(|e| {
                let diff = f64::from(e.wpm) - avg;
                diff * diff
            })
            .sum::<f64>()
            / self.entries.len() as f64;
        Some(variance.sqrt())
    }

    /// Writes every entry as CSV with a header row
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        // serialize only emits the header along with the first row
        if self.entries.is_empty() {
            csv.write_record(CSV_HEADER)?;
        }
        for entry in &self.entries {
            csv.serialize(entry)?;
        }
        csv.flush()?;
        Ok(())
    }

    pub fn export_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        self.write_csv(file)
    }
}
