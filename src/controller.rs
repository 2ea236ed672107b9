//! Session lifecycle: idle, running, finished.
//!
//! The controller owns every piece of session state and is the only thing that
//! mutates it. Presentation reads a [`Snapshot`] and calls the handles below.

use std::time::Instant;

use rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::corpus::Corpus;
use crate::countdown::Countdown;
use crate::evaluator::{self, Outcome};
use crate::history::{HistoryEntry, HistoryLedger, PersonalBest};
use crate::session::{Difficulty, KeystrokeState, SessionConfig, SessionMetrics, SessionState};

pub type Listener = Box<dyn FnMut(&Snapshot<'_>)>;

/// Read-only view of everything a renderer needs
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub state: SessionState,
    pub phrase: &'a str,
    pub input: &'a str,
    pub metrics: SessionMetrics,
    pub keystrokes: KeystrokeState,
    pub best: PersonalBest,
    pub history: &'a [HistoryEntry],
    pub difficulty: Difficulty,
    pub duration_secs: u64,
}

impl Snapshot<'_> {
    pub fn outcomes(&self) -> Vec<Outcome> {
        evaluator::char_outcomes(self.phrase, self.input)
    }
}

pub struct SessionController<C: Clock = SystemClock> {
    corpus: Corpus,
    clock: C,
    rng: StdRng,
    config: SessionConfig,
    state: SessionState,
    phrase: String,
    input: String,
    keystrokes: KeystrokeState,
    metrics: SessionMetrics,
    countdown: Option<Countdown>,
    last_event: Instant,
    ledger: HistoryLedger,
    listeners: Vec<Listener>,
}

impl<C: Clock> SessionController<C> {
    pub fn new(corpus: Corpus, config: SessionConfig, clock: C) -> Self {
        Self::with_rng(corpus, config, clock, StdRng::from_entropy())
    }

    pub fn with_seed(corpus: Corpus, config: SessionConfig, clock: C, seed: u64) -> Self {
        Self::with_rng(corpus, config, clock, StdRng::seed_from_u64(seed))
    }

    fn with_rng(corpus: Corpus, config: SessionConfig, clock: C, mut rng: StdRng) -> Self {
        let phrase = corpus.select_phrase(config.difficulty, &mut rng).to_string();
        let last_event = clock.now();
        Self {
            corpus,
            clock,
            rng,
            config,
            state: SessionState::Idle,
            phrase,
            input: String::new(),
            keystrokes: KeystrokeState::default(),
            metrics: SessionMetrics::fresh(config.duration_secs),
            countdown: None,
            last_event,
            ledger: HistoryLedger::new(),
            listeners: Vec::new(),
        }
    }

    /// Begins a fresh running session, abandoning whatever was in progress
    pub fn start(&mut self, config: SessionConfig) {
        self.countdown = None;

        self.config = config;
        self.phrase = self
            .corpus
            .select_phrase(config.difficulty, &mut self.rng)
            .to_string();
        self.input.clear();
        self.keystrokes = KeystrokeState::default();
        self.metrics = SessionMetrics::fresh(config.duration_secs);

        let now = self.clock.now();
        self.last_event = now;
        self.countdown = Some(Countdown::arm(config.duration_secs, now));
        self.state = SessionState::Running;

        info!(
            difficulty = %config.difficulty,
            duration_secs = config.duration_secs,
            phrase = %self.phrase,
            "session started"
        );
        self.notify();
    }

    pub fn restart(&mut self) {
        self.start(self.config);
    }

    /// Advances the countdown. Returns true when the snapshot changed.
    pub fn tick(&mut self) -> bool {
        if self.state != SessionState::Running {
            return false;
        }
        let now = self.clock.now();
        let Some(countdown) = self.countdown.as_mut() else {
            return false;
        };

        let fired = countdown.poll(now);
        let expired = countdown.is_expired();
        self.metrics.remaining_secs = countdown.remaining();

        if expired {
            debug!("countdown reached zero");
            self.finish();
            return true;
        }
        if fired > 0 {
            self.notify();
        }
        fired > 0
    }

    /// Replaces the typed text with `raw` and rescores it
    pub fn on_input(&mut self, raw: &str) {
        match self.state {
            SessionState::Finished => {
                debug!("input ignored, session already finished");
                return;
            }
            SessionState::Idle => {
                debug!("first input, starting countdown");
                let now = self.clock.now();
                self.countdown = Some(Countdown::arm(self.metrics.remaining_secs, now));
                self.state = SessionState::Running;
            }
            SessionState::Running => {}
        }

        self.input.clear();
        self.input.push_str(raw);

        let elapsed = self.metrics.elapsed_secs(self.config.duration_secs);
        let eval = evaluator::evaluate(&self.phrase, raw, elapsed);

        self.keystrokes = KeystrokeState {
            correct: eval.correct,
            incorrect: eval.incorrect,
            total: self.keystrokes.total + 1,
        };
        self.metrics.accuracy = eval.accuracy;
        if let Some(wpm) = eval.wpm {
            self.metrics.wpm = wpm;
        }

        let now = self.clock.now();
        let since_last = now.saturating_duration_since(self.last_event);
        if let Some(instant) = evaluator::instant_wpm(eval.words, since_last) {
            self.metrics.instant_wpm = instant;
            self.last_event = now;
        }

        if self.input == self.phrase {
            self.finish();
        } else {
            self.notify();
        }
    }

    /// Ends the running session and records it
    pub fn finish(&mut self) {
        if self.state != SessionState::Running {
            debug!(state = ?self.state, "finish ignored, no running session");
            return;
        }
        self.state = SessionState::Finished;
        self.countdown = None;

        let entry = HistoryEntry {
            timestamp: self.clock.wall(),
            wpm: self.metrics.wpm,
            accuracy: self.metrics.accuracy,
            difficulty: self.config.difficulty,
            duration_secs: self.config.duration_secs,
        };
        info!(
            wpm = entry.wpm,
            accuracy = entry.accuracy,
            difficulty = %entry.difficulty,
            "session finished"
        );
        self.ledger.record(entry);
        self.ledger.update_best(self.metrics.wpm, self.metrics.accuracy);
        self.notify();
    }

    /// Returns false when the change was refused because a session is running
    pub fn set_difficulty(&mut self, difficulty: Difficulty) -> bool {
        if self.state == SessionState::Running {
            debug!("difficulty change ignored while running");
            return false;
        }
        self.config.difficulty = difficulty;
        if self.state == SessionState::Idle {
            self.phrase = self
                .corpus
                .select_phrase(difficulty, &mut self.rng)
                .to_string();
        }
        self.notify();
        true
    }

    /// Returns false when running or when `secs` is zero
    pub fn set_duration(&mut self, secs: u64) -> bool {
        if self.state == SessionState::Running || secs == 0 {
            debug!(secs, "duration change ignored");
            return false;
        }
        self.config.duration_secs = secs;
        if self.state == SessionState::Idle {
            self.metrics.remaining_secs = secs;
        }
        self.notify();
        true
    }

    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&Snapshot<'_>) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            state: self.state,
            phrase: &self.phrase,
            input: &self.input,
            metrics: self.metrics,
            keystrokes: self.keystrokes,
            best: self.ledger.best(),
            history: self.ledger.entries(),
            difficulty: self.config.difficulty,
            duration_secs: self.config.duration_secs,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn history(&self) -> &HistoryLedger {
        &self.ledger
    }

    pub fn has_live_countdown(&self) -> bool {
        self.countdown.is_some()
    }

    fn notify(&mut self) {
        if self.listeners.is_empty() {
            return;
        }
        let mut listeners = std::mem::take(&mut self.listeners);
        let snapshot = self.snapshot();
        for listener in listeners.iter_mut() {
            listener(&snapshot);
        }
        self.listeners = listeners;
    }
}
