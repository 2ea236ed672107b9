use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::Span,
    widgets::{Axis, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table, Widget},
};

use crate::history::{HistoryEntry, HistoryLedger};
use crate::ui::charting::{compute_chart_params, format_label, session_points};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

pub fn render_history(ledger: &HistoryLedger, area: Rect, buf: &mut Buffer) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Test History");
    let inner = block.inner(area);
    block.render(area, buf);

    if ledger.is_empty() {
        Paragraph::new(Span::styled(
            "No finished tests yet",
            Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
        ))
        .render(inner, buf);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(inner);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(chunks[0]);

    // header row takes one line
    let visible = left[0].height.saturating_sub(1) as usize;
    history_table(ledger.entries(), visible).render(left[0], buf);

    let summary = match (ledger.average_wpm(), ledger.wpm_std_dev()) {
        (Some(avg), Some(sd)) => format!("{} tests   avg {avg:.1} wpm   sd {sd:.2}", ledger.len()),
        _ => String::new(),
    };
    Paragraph::new(Span::styled(
        summary,
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(left[1], buf);

    render_wpm_chart(ledger.entries(), chunks[1], buf);
}

/// The newest `visible` entries, oldest first
pub fn history_table(entries: &[HistoryEntry], visible: usize) -> Table<'static> {
    let header = Row::new(vec!["Date", "WPM", "Accuracy", "Difficulty"]).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = entries
        .iter()
        .skip(entries.len().saturating_sub(visible))
        .map(|e| {
            Row::new(vec![
                Cell::from(e.timestamp.format(DATE_FORMAT).to_string()),
                Cell::from(e.wpm.to_string()),
                Cell::from(format!("{}%", e.accuracy)),
                Cell::from(e.difficulty.label()),
            ])
        })
        .collect();

    Table::new(
        rows,
        [
            Constraint::Length(17),
            Constraint::Length(5),
            Constraint::Length(9),
            Constraint::Length(10),
        ],
    )
    .header(header)
}

fn render_wpm_chart(entries: &[HistoryEntry], area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let points = session_points(entries);
    let (last_session, highest_wpm) = compute_chart_params(&points);

    let datasets = vec![Dataset::default()
        .marker(Marker::Braille)
        .style(Style::default().fg(Color::Magenta))
        .graph_type(GraphType::Line)
        .data(&points)];

    Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("test")
                .bounds([1.0, last_session])
                .labels(vec![
                    Span::styled("1", bold_style),
                    Span::styled(format_label(last_session), bold_style),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("wpm")
                .bounds([0.0, highest_wpm])
                .labels(vec![
                    Span::styled("0", bold_style),
                    Span::styled(format_label(highest_wpm), bold_style),
                ]),
        )
        .render(area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Difficulty;
    use chrono::Local;

    fn ledger_with(wpms: &[u32]) -> HistoryLedger {
        let mut ledger = HistoryLedger::new();
        for &wpm in wpms {
            ledger.record(HistoryEntry {
                timestamp: Local::now(),
                wpm,
                accuracy: 96,
                difficulty: Difficulty::Hard,
                duration_secs: 30,
            });
        }
        ledger
    }

    fn rendered(ledger: &HistoryLedger, area: Rect) -> String {
        let mut buf = Buffer::empty(area);
        render_history(ledger, area, &mut buf);
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn empty_history_shows_placeholder() {
        let text = rendered(&HistoryLedger::new(), Rect::new(0, 0, 80, 8));
        assert!(text.contains("No finished tests yet"));
    }

    #[test]
    fn rows_show_entry_fields() {
        let text = rendered(&ledger_with(&[57]), Rect::new(0, 0, 100, 10));
        assert!(text.contains("Test History"));
        assert!(text.contains("57"));
        assert!(text.contains("96%"));
        assert!(text.contains("Hard"));
        assert!(text.contains("avg 57.0 wpm"));
    }

    #[test]
    fn table_keeps_newest_rows() {
        let ledger = ledger_with(&[11, 22, 33, 44]);
        let text = rendered(&ledger, Rect::new(0, 0, 100, 6));
        // 6 rows - 2 border - 1 summary - 1 header leaves two table rows
        assert!(text.contains("33"));
        assert!(text.contains("44"));
        assert!(!text.contains(" 11 "));
    }
}
