pub mod charting;
pub mod history;

use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthChar;

use crate::{
    app::App,
    clock::Clock,
    controller::Snapshot,
    evaluator::Outcome,
    session::SessionState,
};

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;

/// Green at 98% and above, yellow from 95%, red below
pub fn accuracy_color(accuracy: u32) -> Color {
    if accuracy >= 98 {
        Color::Green
    } else if accuracy >= 95 {
        Color::Yellow
    } else {
        Color::Red
    }
}

impl<C: Clock> Widget for &App<C> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let snap = self.controller.snapshot();
        let finished = snap.state == SessionState::Finished;

        // the phrase box needs room for every word wrapped line plus its borders
        let text_width = area.width.saturating_sub(HORIZONTAL_MARGIN * 2 + 2).max(1);
        let phrase = phrase_paragraph(&snap);
        let phrase_height = u16::try_from(phrase.line_count(text_width).max(1))
            .unwrap_or(u16::MAX)
            .saturating_add(2);

        let mut constraints = vec![Constraint::Length(1)];
        if self.show_settings {
            constraints.push(Constraint::Length(4));
        }
        if self.show_history {
            constraints.push(Constraint::Length(12));
        }
        constraints.push(Constraint::Length(3));
        if snap.best.is_set() {
            constraints.push(Constraint::Length(1));
        }
        constraints.push(Constraint::Length(phrase_height));
        constraints.push(Constraint::Length(3));
        if finished {
            constraints.push(Constraint::Length(4));
        }
        constraints.push(Constraint::Min(0));
        constraints.push(Constraint::Length(1));

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints(constraints)
            .split(area);
        let mut next = chunks.iter().copied();
        let mut take = || next.next().unwrap_or_default();

        render_title(&snap, take(), buf);
        if self.show_settings {
            render_settings(&snap, &self.durations, take(), buf);
        }
        if self.show_history {
            history::render_history(self.controller.history(), take(), buf);
        }
        render_stats(&snap, take(), buf);
        if snap.best.is_set() {
            render_best(&snap, take(), buf);
        }
        phrase
            .block(Block::default().borders(Borders::ALL))
            .render(take(), buf);
        render_input(&snap, take(), buf);
        if finished {
            render_results(&snap, take(), buf);
        }
        let _filler = take();
        render_legend(take(), buf);
    }
}

fn render_title(snap: &Snapshot<'_>, area: Rect, buf: &mut Buffer) {
    let title = Line::from(vec![
        Span::styled(
            "Typing Speed Test",
            Style::default()
                .fg(Color::Indexed(63))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("   {} / {}s", snap.difficulty.label(), snap.duration_secs),
            Style::default().add_modifier(Modifier::DIM),
        ),
    ]);
    Paragraph::new(title).render(area, buf);
}

fn render_settings(snap: &Snapshot<'_>, durations: &[u64], area: Rect, buf: &mut Buffer) {
    let locked = snap.state == SessionState::Running;
    let durations = durations
        .iter()
        .map(|&d| {
            if d == snap.duration_secs {
                format!("[{d}]")
            } else {
                d.to_string()
            }
        })
        .join(" / ");

    let mut lines = vec![
        Line::from(format!("Difficulty: {}   (up/down)", snap.difficulty.label())),
        Line::from(format!("Test Duration (seconds): {durations}   (left/right)")),
    ];
    if locked {
        lines.push(Line::from(Span::styled(
            "locked while a test is running",
            Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
        )));
    }

    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Settings"))
        .render(area, buf);
}

fn render_stats(snap: &Snapshot<'_>, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    let boxes = [
        ("Time", format!("{}s", snap.metrics.remaining_secs), bold_style),
        (
            "WPM",
            format!("{} ({} now)", snap.metrics.wpm, snap.metrics.instant_wpm),
            bold_style,
        ),
        (
            "Accuracy",
            format!("{}%", snap.metrics.accuracy),
            bold_style.fg(accuracy_color(snap.metrics.accuracy)),
        ),
        ("Keystrokes", snap.keystrokes.total.to_string(), bold_style),
    ];

    for ((title, value, style), chunk) in boxes.into_iter().zip(chunks.iter()) {
        Paragraph::new(Span::styled(value, style))
            .block(Block::default().borders(Borders::ALL).title(title))
            .render(*chunk, buf);
    }
}

fn render_best(snap: &Snapshot<'_>, area: Rect, buf: &mut Buffer) {
    let line = Line::from(vec![
        Span::styled(
            "Personal Best  ",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            "Best WPM: {}   Best Accuracy: {}%",
            snap.best.wpm, snap.best.accuracy
        )),
    ]);
    Paragraph::new(line).render(area, buf);
}

fn phrase_paragraph(snap: &Snapshot<'_>) -> Paragraph<'static> {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let green_bold_style = bold_style.fg(Color::Green);
    let red_bold_style = bold_style.fg(Color::Red);
    let dim_style = Style::default().add_modifier(Modifier::DIM);
    let cursor_style = dim_style.add_modifier(Modifier::UNDERLINED);

    let cursor = snap.input.chars().count();
    let running = snap.state != SessionState::Finished;

    let spans: Vec<Span<'static>> = snap
        .phrase
        .chars()
        .zip(snap.outcomes())
        .enumerate()
        .map(|(idx, (expected, outcome))| match outcome {
            Outcome::Correct => Span::styled(expected.to_string(), green_bold_style),
            Outcome::Incorrect => Span::styled(
                match expected {
                    ' ' => "·".to_owned(),
                    c => c.to_string(),
                },
                red_bold_style,
            ),
            Outcome::Pending if running && idx == cursor => {
                Span::styled(expected.to_string(), cursor_style)
            }
            Outcome::Pending => Span::styled(expected.to_string(), dim_style),
        })
        .collect();

    Paragraph::new(Line::from(spans)).wrap(Wrap { trim: false })
}

fn render_input(snap: &Snapshot<'_>, area: Rect, buf: &mut Buffer) {
    let content = if snap.input.is_empty() && snap.state != SessionState::Finished {
        Span::styled(
            "Start typing...",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )
    } else {
        let inner_width = usize::from(area.width.saturating_sub(2));
        Span::raw(visible_tail(snap.input, inner_width))
    };

    let title = match snap.state {
        SessionState::Idle => "Input",
        SessionState::Running => "Input (typing)",
        SessionState::Finished => "Input (done)",
    };

    Paragraph::new(content)
        .block(Block::default().borders(Borders::ALL).title(title))
        .render(area, buf);
}

/// Longest suffix of `s` that fits in `width` columns, so the cursor end stays visible
fn visible_tail(s: &str, width: usize) -> &str {
    let mut used = 0;
    let mut start = s.len();
    for (idx, c) in s.char_indices().rev() {
        used += c.width().unwrap_or(0);
        if used > width {
            break;
        }
        start = idx;
    }
    &s[start..]
}

fn render_results(snap: &Snapshot<'_>, area: Rect, buf: &mut Buffer) {
    let green_style = Style::default().fg(Color::Green);
    let lines = vec![
        Line::from(Span::styled(
            format!(
                "Final Speed: {} WPM   Accuracy: {}%   Keystrokes: {}",
                snap.metrics.wpm, snap.metrics.accuracy, snap.keystrokes.total
            ),
            green_style.add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!(
                "(Correct: {}, Incorrect: {})",
                snap.keystrokes.correct, snap.keystrokes.incorrect
            ),
            green_style,
        )),
    ];

    Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Test Complete!"),
        )
        .alignment(Alignment::Center)
        .render(area, buf);
}

fn render_legend(area: Rect, buf: &mut Buffer) {
    Paragraph::new(Span::styled(
        "(tab) restart / (^s) settings / (^l) history / (^w) delete word / (esc) quit",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::controller::SessionController;
    use crate::corpus::Corpus;
    use crate::session::SessionConfig;

    fn create_test_app(phrase: &str) -> (App<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let controller = SessionController::with_seed(
            Corpus::single(phrase).unwrap(),
            SessionConfig::default(),
            clock.clone(),
            9,
        );
        (App::new(controller, vec![30, 60, 120, 300]), clock)
    }

    fn render_to_string(app: &App<ManualClock>, area: Rect) -> (Buffer, String) {
        let mut buffer = Buffer::empty(area);
        app.render(area, &mut buffer);
        let rendered = buffer
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>();
        (buffer, rendered)
    }

    #[test]
    fn accuracy_colour_bands() {
        assert_eq!(accuracy_color(100), Color::Green);
        assert_eq!(accuracy_color(98), Color::Green);
        assert_eq!(accuracy_color(97), Color::Yellow);
        assert_eq!(accuracy_color(95), Color::Yellow);
        assert_eq!(accuracy_color(94), Color::Red);
    }

    #[test]
    fn idle_screen_shows_phrase_and_placeholder() {
        let (app, _) = create_test_app("hello world");
        let (_, rendered) = render_to_string(&app, Rect::new(0, 0, 100, 30));

        assert!(rendered.contains("Typing Speed Test"));
        assert!(rendered.contains("hello world"));
        assert!(rendered.contains("Start typing..."));
        assert!(rendered.contains("60s"));
        assert!(!rendered.contains("Personal Best"));
        assert!(!rendered.contains("Test Complete!"));
    }

    #[test]
    fn typed_characters_are_coloured() {
        let (mut app, _) = create_test_app("test");
        app.controller.on_input("tx");
        let area = Rect::new(0, 0, 100, 30);
        let (buffer, _) = render_to_string(&app, area);

        let cells: Vec<_> = buffer
            .content()
            .iter()
            .filter(|c| c.fg == Color::Green || c.fg == Color::Red)
            .map(|c| (c.symbol().to_string(), c.fg))
            .collect();
        assert!(cells.contains(&("t".to_string(), Color::Green)));
        assert!(cells.contains(&("e".to_string(), Color::Red)));
    }

    #[test]
    fn finished_screen_shows_results_and_best() {
        let (mut app, clock) = create_test_app("go");
        app.controller.start(app.controller.config());
        clock.advance_secs(3);
        app.controller.tick();
        app.controller.on_input("go");

        let (_, rendered) = render_to_string(&app, Rect::new(0, 0, 100, 30));
        assert!(rendered.contains("Test Complete!"));
        assert!(rendered.contains("Final Speed: 20 WPM"));
        assert!(rendered.contains("(Correct: 2, Incorrect: 0)"));
        assert!(rendered.contains("Best WPM: 20"));
        assert!(rendered.contains("Best Accuracy: 100%"));
    }

    #[test]
    fn panels_render_when_toggled() {
        let (mut app, _) = create_test_app("go");
        app.show_settings = true;
        app.show_history = true;

        let (_, rendered) = render_to_string(&app, Rect::new(0, 0, 100, 40));
        assert!(rendered.contains("Settings"));
        assert!(rendered.contains("30 / [60] / 120 / 300"));
        assert!(rendered.contains("Test History"));
    }

    #[test]
    fn settings_show_lock_while_running() {
        let (mut app, _) = create_test_app("hello");
        app.show_settings = true;
        app.controller.on_input("h");

        let (_, rendered) = render_to_string(&app, Rect::new(0, 0, 100, 30));
        assert!(rendered.contains("locked while a test is running"));
    }

    #[test]
    fn tiny_area_does_not_panic() {
        let (mut app, _) = create_test_app("hello");
        app.show_history = true;
        app.controller.on_input("hex");
        let area = Rect::new(0, 0, 10, 4);
        let (buffer, _) = render_to_string(&app, area);
        assert_eq!(*buffer.area(), area);
    }

    #[test]
    fn wrapped_phrase_shows_its_last_word() {
        let corpus = Corpus::builtin().unwrap();
        for difficulty in crate::session::Difficulty::ALL {
            for phrase in corpus.pool(difficulty) {
                let last_word = phrase.split_whitespace().last().unwrap();
                let (app, _) = create_test_app(phrase);
                for width in 30..=60 {
                    let (_, rendered) = render_to_string(&app, Rect::new(0, 0, width, 30));
                    assert!(
                        rendered.contains(last_word),
                        "{last_word:?} missing at width {width} for {phrase:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn huge_phrase_does_not_overflow_layout() {
        let phrase = "word ".repeat(20_000);
        let (app, _) = create_test_app(phrase.trim());
        let area = Rect::new(0, 0, 8, 10);
        let (buffer, _) = render_to_string(&app, area);
        assert_eq!(*buffer.area(), area);
    }

    #[test]
    fn long_input_shows_its_tail() {
        let (mut app, _) = create_test_app("hi");
        app.controller.on_input("abcdefghijklmnopqrstuvwxyz");

        // 20 columns minus margins and borders leaves 14 for the input
        let (_, rendered) = render_to_string(&app, Rect::new(0, 0, 20, 30));
        assert!(rendered.contains("mnopqrstuvwxyz"));
        assert!(!rendered.contains("abcdef"));
    }

    #[test]
    fn visible_tail_counts_columns() {
        assert_eq!(visible_tail("hello world", 5), "world");
        assert_eq!(visible_tail("short", 10), "short");
        assert_eq!(visible_tail("", 3), "");
        // wide characters take two columns each
        assert_eq!(visible_tail("ab日本", 4), "日本");
        assert_eq!(visible_tail("ab日本", 3), "本");
    }
}
