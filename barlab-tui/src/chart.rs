//! Dual-axis grouped bar chart of benchmark results.
//!
//! Each format gets a pair of bars: write time against the left axis and file
//! size against the right axis. The two series are scaled independently to
//! their own maximum, and every bar carries its value (two decimals) just
//! above its top.

use crate::theme::Theme;
use barlab_runner::FormatResult;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    widgets::{Block, Borders, Widget},
};

pub const CHART_TITLE: &str = "File Format Comparison - Time and Size";
pub const TIME_AXIS_TITLE: &str = "Time (seconds)";
pub const SIZE_AXIS_TITLE: &str = "Size (MB)";

const BAR_GLYPH: &str = "\u{2588}"; // █
const MIN_WIDTH: u16 = 30;
const MIN_HEIGHT: u16 = 6;
const MAX_BAR_WIDTH: u16 = 10;

/// Which axis a bar belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Series {
    Time,
    Size,
}

/// One format's values as plotted.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartPoint {
    pub label: String,
    pub seconds: f64,
    pub size_mb: f64,
}

impl ChartPoint {
    pub fn from_results(results: &[FormatResult]) -> Vec<ChartPoint> {
        results
            .iter()
            .map(|r| ChartPoint {
                label: r.label().to_string(),
                seconds: r.seconds(),
                size_mb: r.size_mb(),
            })
            .collect()
    }

    fn value(&self, series: Series) -> f64 {
        match series {
            Series::Time => self.seconds,
            Series::Size => self.size_mb,
        }
    }
}

/// Largest finite positive value, or 0 when there is none.
pub fn axis_max(values: impl IntoIterator<Item = f64>) -> f64 {
    values
        .into_iter()
        .filter(|v| v.is_finite() && *v > 0.0)
        .fold(0.0, f64::max)
}

/// Rows a bar occupies when `axis_max` fills `rows`.
///
/// A positive value always shows at least one row.
pub fn bar_height(value: f64, axis_max: f64, rows: u16) -> u16 {
    if rows == 0 || !(axis_max > 0.0) || !(value > 0.0) {
        return 0;
    }
    let frac = (value / axis_max).min(1.0);
    ((frac * f64::from(rows)).round() as u16).clamp(1, rows)
}

pub struct ComparisonChart<'a> {
    points: &'a [ChartPoint],
    theme: &'a Theme,
}

impl<'a> ComparisonChart<'a> {
    pub fn new(points: &'a [ChartPoint], theme: &'a Theme) -> Self {
        Self { points, theme }
    }
}

impl<'a> Widget for ComparisonChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(format!(" {CHART_TITLE} "))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.accent))
            .style(Style::default().bg(self.theme.background));
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width == 0 || inner.height == 0 {
            return;
        }
        if self.points.is_empty() {
            buf.set_string(
                inner.x,
                inner.y,
                "No results to chart",
                Style::default().fg(self.theme.muted),
            );
            return;
        }
        if inner.width < MIN_WIDTH || inner.height < MIN_HEIGHT {
            return;
        }

        let time_style = Style::default().fg(self.theme.time);
        let size_style = Style::default().fg(self.theme.size);
        let axis_style = Style::default().fg(self.theme.muted);
        let value_style = Style::default().fg(self.theme.text_primary);

        // Row 0: axis titles, doubling as the legend.
        buf.set_string(
            inner.x,
            inner.y,
            TIME_AXIS_TITLE,
            time_style.add_modifier(Modifier::BOLD),
        );
        buf.set_string(
            inner.right().saturating_sub(SIZE_AXIS_TITLE.len() as u16),
            inner.y,
            SIZE_AXIS_TITLE,
            size_style.add_modifier(Modifier::BOLD),
        );

        let time_max = axis_max(self.points.iter().map(|p| p.seconds));
        let size_max = axis_max(self.points.iter().map(|p| p.size_mb));
        let time_tick = format!("{time_max:.2}");
        let size_tick = format!("{size_max:.2}");
        let left_w = time_tick.len().max(4) as u16 + 1;
        let right_w = size_tick.len().max(4) as u16 + 1;

        let label_row = inner.bottom() - 1;
        let baseline = label_row - 1;
        // One row under the titles stays free for the tallest bar's value.
        let top = inner.y + 2;
        let bar_rows = baseline - top;

        let plot_left = inner.x + left_w;
        let plot_right = inner.right().saturating_sub(right_w);
        let n = self.points.len() as u16;
        if plot_right <= plot_left || plot_right - plot_left < n * 3 {
            return;
        }
        let plot_width = plot_right - plot_left;

        // Axes.
        for y in top..baseline {
            buf.set_string(plot_left - 1, y, "\u{2502}", axis_style); // │
            buf.set_string(plot_right, y, "\u{2502}", axis_style);
        }
        for x in (plot_left - 1)..=plot_right {
            buf.set_string(x, baseline, "\u{2500}", axis_style); // ─
        }
        buf.set_string(plot_left - 1 - time_tick.len() as u16, top, &time_tick, time_style);
        buf.set_string(plot_left - 2, baseline, "0", time_style);
        buf.set_string(plot_right + 1, top, &size_tick, size_style);
        buf.set_string(plot_right + 1, baseline, "0", size_style);

        let group_w = plot_width / n;
        let bar_w = (group_w.saturating_sub(2) / 2).clamp(1, MAX_BAR_WIDTH);
        let pad = group_w.saturating_sub(bar_w * 2) / 2;

        for (i, point) in self.points.iter().enumerate() {
            let group_x = plot_left + i as u16 * group_w;
            let bars = [
                (Series::Time, group_x + pad, time_max),
                (Series::Size, group_x + pad + bar_w, size_max),
            ];
            for (series, bar_x, max) in bars {
                let value = point.value(series);
                let height = bar_height(value, max, bar_rows);
                let style = Style::default().fg(self.theme.series_color(series));
                for r in 0..height {
                    let y = baseline - 1 - r;
                    for x in bar_x..(bar_x + bar_w).min(plot_right) {
                        buf.set_string(x, y, BAR_GLYPH, style);
                    }
                }

                let text = format!("{value:.2}");
                let len = text.len() as u16;
                let label_x = (bar_x + bar_w / 2).saturating_sub(len / 2);
                let label_y = baseline - 1 - height;
                if label_x >= inner.x && label_x + len <= inner.right() {
                    buf.set_string(label_x, label_y, &text, value_style);
                }
            }

            let name_len = (point.label.len() as u16).min(group_w);
            buf.set_stringn(
                group_x + (group_w - name_len) / 2,
                label_row,
                &point.label,
                group_w as usize,
                Style::default().fg(self.theme.text_secondary),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn points() -> Vec<ChartPoint> {
        [
            ("CSV", 0.05, 0.07),
            ("Parquet", 0.01, 0.03),
            ("JSON", 0.02, 0.12),
            ("HDF5", 0.004, 0.05),
            ("Feather", 0.003, 0.06),
        ]
        .into_iter()
        .map(|(label, seconds, size_mb)| ChartPoint {
            label: label.to_string(),
            seconds,
            size_mb,
        })
        .collect()
    }

    fn buffer_text(buf: &Buffer, area: Rect) -> String {
        let mut content = String::new();
        for y in 0..area.height {
            for x in 0..area.width {
                content.push_str(buf.cell((x, y)).unwrap().symbol());
            }
            content.push('\n');
        }
        content
    }

    #[test]
    fn test_chart_renders_titles_labels_and_values() {
        let theme = Theme::default();
        let pts = points();
        let area = Rect::new(0, 0, 100, 20);
        let mut buf = Buffer::empty(area);
        ComparisonChart::new(&pts, &theme).render(area, &mut buf);

        let text = buffer_text(&buf, area);
        assert!(text.contains(CHART_TITLE));
        assert!(text.contains(TIME_AXIS_TITLE));
        assert!(text.contains(SIZE_AXIS_TITLE));
        for label in ["CSV", "Parquet", "JSON", "HDF5", "Feather"] {
            assert!(text.contains(label), "missing {label}");
        }
        assert!(text.contains("0.05"));
        assert!(text.contains("0.12"));
    }

    #[test]
    fn test_tallest_bars_reach_the_top_row() {
        let theme = Theme::default();
        let pts = points();
        let area = Rect::new(0, 0, 100, 20);
        let mut buf = Buffer::empty(area);
        ComparisonChart::new(&pts, &theme).render(area, &mut buf);

        // Inner top row for bars is y = 1 (border) + 2.
        let row: String = (0..area.width)
            .map(|x| buf.cell((x, 3)).unwrap().symbol().to_string())
            .collect();
        assert!(row.contains(BAR_GLYPH));
    }

    #[test]
    fn test_chart_empty_results() {
        let theme = Theme::default();
        let area = Rect::new(0, 0, 60, 10);
        let mut buf = Buffer::empty(area);
        ComparisonChart::new(&[], &theme).render(area, &mut buf);
        assert!(buffer_text(&buf, area).contains("No results"));
    }

    #[test]
    fn test_chart_tiny_area_does_not_panic() {
        let theme = Theme::default();
        let pts = points();
        for (w, h) in [(2, 2), (10, 4), (31, 8), (32, 8), (40, 6)] {
            let area = Rect::new(0, 0, w, h);
            let mut buf = Buffer::empty(area);
            ComparisonChart::new(&pts, &theme).render(area, &mut buf);
        }
    }

    #[test]
    fn test_zero_values_draw_no_bar() {
        assert_eq!(bar_height(0.0, 1.0, 10), 0);
        assert_eq!(bar_height(1.0, 0.0, 10), 0);
        assert_eq!(bar_height(f64::NAN, 1.0, 10), 0);
        assert_eq!(axis_max([0.0, f64::NAN, -1.0]), 0.0);
    }

    proptest! {
        #[test]
        fn bar_height_is_bounded_and_monotonic(
            a in 0.0f64..1e6,
            b in 0.0f64..1e6,
            max in 1e-9f64..1e6,
            rows in 0u16..200,
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let h_lo = bar_height(lo, max, rows);
            let h_hi = bar_height(hi, max, rows);
            prop_assert!(h_hi <= rows);
            prop_assert!(h_lo <= h_hi);
        }

        #[test]
        fn axis_max_fills_every_row(values in prop::collection::vec(1e-6f64..1e6, 1..8), rows in 1u16..100) {
            let max = axis_max(values.iter().copied());
            prop_assert_eq!(bar_height(max, max, rows), rows);
        }
    }
}
