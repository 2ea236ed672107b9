use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub const DEFAULT_DURATIONS: [u64; 4] = [30, 60, 120, 300];

/// Which phrase pool a session draws from
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn next(self) -> Self {
        match self {
            Difficulty::Easy => Difficulty::Medium,
            Difficulty::Medium => Difficulty::Hard,
            Difficulty::Hard => Difficulty::Easy,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Difficulty::Easy => Difficulty::Hard,
            Difficulty::Medium => Difficulty::Easy,
            Difficulty::Hard => Difficulty::Medium,
        }
    }

    /// Human facing label, e.g. "Medium"
    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub difficulty: Difficulty,
    pub duration_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Easy,
            duration_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    Running,
    Finished,
}

/// Character tallies for the current input.
///
/// `correct` and `incorrect` describe the input as it is right now, while `total`
/// counts every input event since the session started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeystrokeState {
    pub correct: usize,
    pub incorrect: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionMetrics {
    pub remaining_secs: u64,
    pub wpm: u32,
    pub instant_wpm: u32,
    pub accuracy: u32,
}

impl SessionMetrics {
    /// Metrics of a session that has not seen any input yet
    pub fn fresh(duration_secs: u64) -> Self {
        Self {
            remaining_secs: duration_secs,
            wpm: 0,
            instant_wpm: 0,
            accuracy: 100,
        }
    }

    pub fn elapsed_secs(&self, duration_secs: u64) -> u64 {
        duration_secs.saturating_sub(self.remaining_secs)
    }
}
