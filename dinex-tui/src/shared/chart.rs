//! Chart engine: inline sparklines and the full annotated chart.
//!
//! Both modes share one input contract: the ordered observations for a
//! single meal plus a surface of known cell width/height. The layout math
//! (bounds, level mapping, gridline labels, change summary) lives in pure
//! functions; rendering wraps them with ratatui widgets. Fewer than
//! [`MIN_POINTS`] observations is a degenerate case, not an error: the
//! sparkline draws nothing and the full chart shows a centered notice.

use chrono::{DateTime, Utc};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, BorderType, Borders, Chart, Dataset, GraphType, Paragraph, Sparkline},
};

use crate::shared::history::PriceObservation;

/// Observations required before anything is drawn
pub const MIN_POINTS: usize = 2;

/// Trend color when the last price is at or above the first
pub const C_RISING: Color = Color::Rgb(0, 255, 127);
/// Trend color when the last price is below the first
pub const C_FALLING: Color = Color::Rgb(255, 69, 58);
const C_DIM: Color = Color::Rgb(128, 128, 150);
const C_BRIGHT: Color = Color::Rgb(220, 220, 220);
const C_ACCENT: Color = Color::Rgb(100, 149, 237);

/// Two-point trend signal: last observation vs. first, not a slope fit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Rising,
    Falling,
}

impl Trend {
    pub fn color(&self) -> Color {
        match self {
            Trend::Rising => C_RISING,
            Trend::Falling => C_FALLING,
        }
    }
}

/// Trend of a buffer: rising when `last >= first`
pub fn trend(history: &[PriceObservation]) -> Trend {
    match (history.first(), history.last()) {
        (Some(first), Some(last)) if last.price >= first.price => Trend::Rising,
        (Some(_), Some(_)) => Trend::Falling,
        _ => Trend::Rising,
    }
}

/// (min, max, range) over the buffer, with the range forced to 1 when the
/// buffer is flat so scaling never divides by zero.
pub fn price_bounds(history: &[PriceObservation]) -> (f64, f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for obs in history {
        min = min.min(obs.price);
        max = max.max(obs.price);
    }
    let range = if max > min { max - min } else { 1.0 };
    (min, max, range)
}

/// Map each observation onto `levels` discrete column heights.
///
/// This is the inverted-y pixel mapping realized on terminal cells: a
/// price at `max` fills the column, lower prices proportionally less. A
/// flat buffer (range forced to 1) renders full-height columns.
pub fn sparkline_levels(history: &[PriceObservation], levels: u64) -> Vec<u64> {
    let (_, max, range) = price_bounds(history);
    history
        .iter()
        .map(|obs| {
            let scaled = levels as f64 * (1.0 - (max - obs.price) / range);
            scaled.round().clamp(0.0, levels as f64) as u64
        })
        .collect()
}

/// The six horizontal gridline labels, top first: `max - fraction*range`
/// at fractions 0, 1/5 .. 1, formatted to two decimals.
pub fn axis_labels(min: f64, max: f64) -> Vec<String> {
    let range = if max > min { max - min } else { 1.0 };
    (0..6)
        .map(|i| format!("{:.2}", max - (i as f64 / 5.0) * range))
        .collect()
}

/// Price-change summary vs. the first observation in the buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChangeSummary {
    /// Last observed price
    pub last: f64,
    /// Absolute change vs. the first observation
    pub delta: f64,
    /// Percent change vs. the first observation; 0 when the first price
    /// is 0
    pub pct: f64,
}

impl ChangeSummary {
    pub fn delta_label(&self) -> String {
        format!("{:+.2}", self.delta)
    }

    pub fn pct_label(&self) -> String {
        format!("{:+.2}%", self.pct)
    }

    pub fn color(&self) -> Color {
        if self.delta >= 0.0 { C_RISING } else { C_FALLING }
    }
}

/// Summary for a buffer with at least [`MIN_POINTS`] observations
pub fn change_summary(history: &[PriceObservation]) -> Option<ChangeSummary> {
    if history.len() < MIN_POINTS {
        return None;
    }
    let first = history[0].price;
    let last = history[history.len() - 1].price;
    let delta = last - first;
    let pct = if first == 0.0 {
        0.0
    } else {
        delta / first * 100.0
    };
    Some(ChangeSummary { last, delta, pct })
}

/// Render a compact trend-only sparkline into `area`.
///
/// With fewer than [`MIN_POINTS`] observations the surface is left
/// cleared. The newest observations win when the surface is narrower than
/// the buffer.
pub fn render_sparkline(f: &mut Frame, area: Rect, history: &[PriceObservation]) {
    if area.width == 0 || area.height == 0 || history.len() < MIN_POINTS {
        return;
    }

    let visible = &history[history.len().saturating_sub(area.width as usize)..];
    let levels = (area.height as u64) * 8;
    let data = sparkline_levels(visible, levels);

    let sparkline = Sparkline::default()
        .data(&data)
        .max(levels)
        .style(Style::default().fg(trend(visible).color()));
    f.render_widget(sparkline, area);
}

fn timestamp_label(time: DateTime<Utc>) -> String {
    time.format("%H:%M:%S").to_string()
}

/// Render the full annotated chart for `name` into `area`: axes, six
/// labelled gridlines, the price polyline with point markers, a centered
/// title, and a change-summary footer.
pub fn render_full_chart(f: &mut Frame, area: Rect, name: &str, history: &[PriceObservation]) {
    let title = Line::from(vec![Span::styled(
        format!(" {name} "),
        Style::default().fg(C_BRIGHT).add_modifier(Modifier::BOLD),
    )]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(C_ACCENT))
        .title_top(title.alignment(Alignment::Center));

    if history.len() < MIN_POINTS {
        let waiting = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "Not enough data yet",
                Style::default().fg(C_DIM).add_modifier(Modifier::ITALIC),
            )),
        ])
        .block(block)
        .alignment(Alignment::Center);
        f.render_widget(waiting, area);
        return;
    }

    let inner = block.inner(area);
    f.render_widget(block, area);
    if inner.height < 2 {
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(inner);

    let (min, max, range) = price_bounds(history);
    let t0 = history[0].time;
    let points: Vec<(f64, f64)> = history
        .iter()
        .map(|obs| {
            let x = (obs.time - t0).num_milliseconds() as f64 / 1000.0;
            (x, obs.price)
        })
        .collect();

    let x_end = points[points.len() - 1].0.max(1.0);
    let line_color = trend(history).color();

    let datasets = vec![
        Dataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(line_color))
            .data(&points),
        // Filled marker at every data point, on top of the polyline
        Dataset::default()
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(C_BRIGHT))
            .data(&points),
    ];

    // Y labels are the six gridline annotations; ratatui lays them out
    // bottom-up, so reverse the top-first ordering
    let mut y_labels = axis_labels(min, max);
    y_labels.reverse();

    let chart = Chart::new(datasets)
        .x_axis(
            Axis::default()
                .style(Style::default().fg(C_DIM))
                .bounds([0.0, x_end])
                .labels(vec![
                    timestamp_label(history[0].time),
                    timestamp_label(history[history.len() - 1].time),
                ]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(C_DIM))
                .bounds([max - range, max])
                .labels(y_labels),
        );
    f.render_widget(chart, chunks[0]);

    if let Some(summary) = change_summary(history) {
        let footer = Line::from(vec![
            Span::styled("Current ", Style::default().fg(C_DIM)),
            Span::styled(
                format!("${:.2}", summary.last),
                Style::default().fg(C_BRIGHT).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {} ({})", summary.delta_label(), summary.pct_label()),
                Style::default()
                    .fg(summary.color())
                    .add_modifier(Modifier::BOLD),
            ),
        ]);
        let footer = Paragraph::new(footer).alignment(Alignment::Center);
        f.render_widget(footer, chunks[1]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(secs: i64, price: f64) -> PriceObservation {
        PriceObservation {
            time: DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap(),
            price,
        }
    }

    #[test]
    fn test_bounds_flat_buffer_range_is_one() {
        let history = vec![obs(0, 5.0), obs(5, 5.0), obs(10, 5.0)];
        let (min, max, range) = price_bounds(&history);
        assert_eq!(min, 5.0);
        assert_eq!(max, 5.0);
        assert_eq!(range, 1.0);
    }

    #[test]
    fn test_sparkline_levels_endpoints() {
        let history = vec![obs(0, 10.0), obs(5, 20.0), obs(10, 15.0)];
        let levels = sparkline_levels(&history, 8);
        assert_eq!(levels, vec![0, 8, 4]);
    }

    #[test]
    fn test_sparkline_levels_flat_does_not_divide_by_zero() {
        let history = vec![obs(0, 7.0), obs(5, 7.0)];
        let levels = sparkline_levels(&history, 8);
        // Flat buffers map to full-height columns (price sits at max)
        assert_eq!(levels, vec![8, 8]);
    }

    #[test]
    fn test_axis_labels_values() {
        let labels = axis_labels(0.0, 10.0);
        assert_eq!(labels, vec!["10.00", "8.00", "6.00", "4.00", "2.00", "0.00"]);
    }

    #[test]
    fn test_axis_labels_flat_uses_unit_range() {
        let labels = axis_labels(5.0, 5.0);
        assert_eq!(labels[0], "5.00");
        assert_eq!(labels[5], "4.00");
    }

    #[test]
    fn test_trend_two_point_signal() {
        assert_eq!(trend(&[obs(0, 5.0), obs(5, 6.0)]), Trend::Rising);
        assert_eq!(trend(&[obs(0, 5.0), obs(5, 5.0)]), Trend::Rising);
        // Dips in the middle are ignored; only first vs. last counts
        assert_eq!(trend(&[obs(0, 5.0), obs(5, 1.0), obs(10, 5.5)]), Trend::Rising);
        assert_eq!(trend(&[obs(0, 6.0), obs(5, 5.0)]), Trend::Falling);
    }

    #[test]
    fn test_change_summary_rising_scenario() {
        // Two polls: bid 5.00 then bid 6.00
        let history = vec![obs(0, 5.0), obs(5, 6.0)];
        let summary = change_summary(&history).unwrap();
        assert_eq!(summary.last, 6.0);
        assert_eq!(summary.delta_label(), "+1.00");
        assert_eq!(summary.pct_label(), "+20.00%");
        assert_eq!(trend(&history), Trend::Rising);
    }

    #[test]
    fn test_change_summary_zero_first_price() {
        let history = vec![obs(0, 0.0), obs(5, 3.0)];
        let summary = change_summary(&history).unwrap();
        assert_eq!(summary.pct, 0.0);
        assert!(summary.pct.is_finite());
    }

    #[test]
    fn test_change_summary_requires_two_points() {
        assert!(change_summary(&[obs(0, 5.0)]).is_none());
        assert!(change_summary(&[]).is_none());
    }
}
