use crate::history::HistoryEntry;

/// One point per finished session: (session number, wpm)
pub fn session_points(entries: &[HistoryEntry]) -> Vec<(f64, f64)> {
    entries
        .iter()
        .enumerate()
        .map(|(i, e)| ((i + 1) as f64, f64::from(e.wpm)))
        .collect()
}

/// Compute X (session number) and Y (WPM) upper bounds for the history chart
pub fn compute_chart_params(points: &[(f64, f64)]) -> (f64, f64) {
    let highest_wpm = points.iter().map(|&(_, wpm)| wpm).fold(0.0, f64::max);
    let last_session = points.last().map_or(1.0, |p| p.0);

    // a single point still needs a non-empty x range
    (last_session.max(2.0), highest_wpm.max(10.0).ceil())
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}
