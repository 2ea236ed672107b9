use std::cell::Cell;
use std::rc::Rc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::controller::SessionController;
use crate::session::SessionState;

/// Presentation state wrapped around the session controller
pub struct App<C: Clock = SystemClock> {
    pub controller: SessionController<C>,
    pub durations: Vec<u64>,
    pub show_settings: bool,
    pub show_history: bool,
    pub should_quit: bool,
    dirty: Rc<Cell<bool>>,
}

impl<C: Clock> App<C> {
    pub fn new(mut controller: SessionController<C>, durations: Vec<u64>) -> Self {
        let dirty = Rc::new(Cell::new(true));
        let flag = Rc::clone(&dirty);
        controller.subscribe(move |_| flag.set(true));

        Self {
            controller,
            durations,
            show_settings: false,
            show_history: false,
            should_quit: false,
            dirty,
        }
    }

    /// True once per batch of changes since the last call
    pub fn take_redraw(&self) -> bool {
        self.dirty.replace(false)
    }

    pub fn on_tick(&mut self) {
        self.controller.tick();
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if ctrl => self.should_quit = true,
            KeyCode::Tab => self.controller.restart(),
            KeyCode::Char('s') if ctrl => self.toggle(Panel::Settings),
            KeyCode::Char('l') if ctrl => self.toggle(Panel::History),
            KeyCode::Char('w') if ctrl => self.edit(delete_word),
            KeyCode::Backspace => self.edit(|s| {
                s.pop();
            }),
            KeyCode::Char(c) if !ctrl => self.edit(|s| s.push(c)),
            KeyCode::Up if self.show_settings => {
                let d = self.controller.config().difficulty.prev();
                self.controller.set_difficulty(d);
            }
            KeyCode::Down if self.show_settings => {
                let d = self.controller.config().difficulty.next();
                self.controller.set_difficulty(d);
            }
            KeyCode::Left if self.show_settings => self.cycle_duration(false),
            KeyCode::Right if self.show_settings => self.cycle_duration(true),
            _ => {}
        }
    }

    fn edit<F: FnOnce(&mut String)>(&mut self, f: F) {
        if self.controller.state() == SessionState::Finished {
            return;
        }
        let mut input = self.controller.input().to_string();
        f(&mut input);
        if input == self.controller.input() {
            // e.g. backspace on an empty line
            return;
        }
        self.controller.on_input(&input);
    }

    fn toggle(&mut self, panel: Panel) {
        match panel {
            Panel::Settings => self.show_settings = !self.show_settings,
            Panel::History => self.show_history = !self.show_history,
        }
        self.dirty.set(true);
    }

    fn cycle_duration(&mut self, forward: bool) {
        if self.durations.is_empty() {
            return;
        }
        let current = self.controller.config().duration_secs;
        let len = self.durations.len();
        let idx = match self.durations.iter().position(|&d| d == current) {
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None => 0,
        };
        if !self.controller.set_duration(self.durations[idx]) {
            debug!("duration locked while a session runs");
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Panel {
    Settings,
    History,
}

/// Drops trailing whitespace and then the last word, like ctrl+w in a shell
fn delete_word(s: &mut String) {
    let trimmed = s.trim_end().len();
    s.truncate(trimmed);
    let cut = s
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
        .map_or(0, |(i, c)| i + c.len_utf8());
    s.truncate(cut);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::corpus::Corpus;
    use crate::session::{Difficulty, SessionConfig};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn new_app(phrase: &str) -> (App<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let controller = SessionController::with_seed(
            Corpus::single(phrase).unwrap(),
            SessionConfig::default(),
            clock.clone(),
            3,
        );
        (App::new(controller, vec![30, 60, 120, 300]), clock)
    }

    fn type_str(app: &mut App<ManualClock>, s: &str) {
        for c in s.chars() {
            app.on_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn typing_builds_input_and_finishes() {
        let (mut app, _) = new_app("hi");
        type_str(&mut app, "hi");

        let snap = app.controller.snapshot();
        assert_eq!(snap.state, SessionState::Finished);
        assert_eq!(snap.keystrokes.total, 2);
        assert_eq!(snap.history.len(), 1);
    }

    #[test]
    fn backspace_rescored() {
        let (mut app, _) = new_app("cat");
        type_str(&mut app, "cx");
        app.on_key(key(KeyCode::Backspace));
        type_str(&mut app, "a");

        let snap = app.controller.snapshot();
        assert_eq!(snap.input, "ca");
        assert_eq!(snap.keystrokes.correct, 2);
        assert_eq!(snap.keystrokes.total, 4);
    }

    #[test]
    fn backspace_on_empty_is_not_an_event() {
        let (mut app, _) = new_app("cat");
        app.on_key(key(KeyCode::Backspace));
        assert_eq!(app.controller.state(), SessionState::Idle);
        assert_eq!(app.controller.snapshot().keystrokes.total, 0);
    }

    #[test]
    fn ctrl_w_deletes_last_word() {
        let (mut app, _) = new_app("the quick brown fox");
        type_str(&mut app, "the quick bro");
        app.on_key(ctrl('w'));
        assert_eq!(app.controller.input(), "the quick ");
        app.on_key(ctrl('w'));
        assert_eq!(app.controller.input(), "the ");
    }

    #[test]
    fn delete_word_edge_cases() {
        let mut s = String::from("one  two   ");
        delete_word(&mut s);
        assert_eq!(s, "one  ");

        let mut s = String::from("single");
        delete_word(&mut s);
        assert_eq!(s, "");
    }

    #[test]
    fn tab_restarts() {
        let (mut app, _) = new_app("hi");
        type_str(&mut app, "hi");
        app.on_key(key(KeyCode::Tab));

        let snap = app.controller.snapshot();
        assert_eq!(snap.state, SessionState::Running);
        assert_eq!(snap.input, "");
        assert_eq!(snap.history.len(), 1);
    }

    #[test]
    fn escape_and_ctrl_c_quit() {
        let (mut app, _) = new_app("hi");
        app.on_key(key(KeyCode::Esc));
        assert!(app.should_quit);

        let (mut app, _) = new_app("hi");
        app.on_key(ctrl('c'));
        assert!(app.should_quit);
        assert_eq!(app.controller.input(), "");
    }

    #[test]
    fn settings_keys_only_work_with_panel_open() {
        let (mut app, _) = new_app("hi");
        app.on_key(key(KeyCode::Down));
        assert_eq!(app.controller.config().difficulty, Difficulty::Easy);

        app.on_key(ctrl('s'));
        assert!(app.show_settings);
        app.on_key(key(KeyCode::Down));
        assert_eq!(app.controller.config().difficulty, Difficulty::Medium);
        app.on_key(key(KeyCode::Up));
        app.on_key(key(KeyCode::Up));
        assert_eq!(app.controller.config().difficulty, Difficulty::Hard);

        app.on_key(key(KeyCode::Right));
        assert_eq!(app.controller.config().duration_secs, 120);
        app.on_key(key(KeyCode::Left));
        app.on_key(key(KeyCode::Left));
        assert_eq!(app.controller.config().duration_secs, 30);
        app.on_key(key(KeyCode::Left));
        assert_eq!(app.controller.config().duration_secs, 300);
    }

    #[test]
    fn settings_locked_while_typing() {
        let (mut app, _) = new_app("hello");
        app.on_key(ctrl('s'));
        type_str(&mut app, "he");
        app.on_key(key(KeyCode::Down));
        app.on_key(key(KeyCode::Right));

        assert_eq!(app.controller.config().difficulty, Difficulty::Easy);
        assert_eq!(app.controller.config().duration_secs, 60);
    }

    #[test]
    fn history_toggle_and_redraw_flag() {
        let (mut app, clock) = new_app("hi");
        assert!(app.take_redraw());
        assert!(!app.take_redraw());

        app.on_key(ctrl('l'));
        assert!(app.show_history);
        assert!(app.take_redraw());

        type_str(&mut app, "h");
        assert!(app.take_redraw());

        clock.advance_secs(1);
        app.on_tick();
        assert!(app.take_redraw());
        app.on_tick();
        assert!(!app.take_redraw());
    }

    #[test]
    fn typing_after_finish_is_ignored() {
        let (mut app, _) = new_app("hi");
        type_str(&mut app, "hi!");
        assert_eq!(app.controller.input(), "hi");
    }
}
