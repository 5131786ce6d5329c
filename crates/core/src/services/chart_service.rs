use chrono::Duration;

use crate::models::timeline::TimelinePoint;

const VALUE_MARKER: char = '*';
const PROFIT_MARKER: char = '+';
const AXIS_STEPS: usize = 4; // 5 labels on each axis
const Y_LABEL_WIDTH: usize = 12;

/// Renders a timeline series onto a fixed character grid.
///
/// Two lines share one vertical scale: cumulative market value and
/// profit/loss. Dates map to columns and values to rows by linear scaling;
/// consecutive points are joined by straight segments filling every
/// intermediate column.
pub struct ChartService;

impl ChartService {
    pub fn new() -> Self {
        Self
    }

    /// Render the series into text rows: plot area with y-axis labels,
    /// x-axis border, date markers, and a legend.
    ///
    /// An empty series renders as no rows at all — never an error.
    #[must_use]
    pub fn render(&self, points: &[TimelinePoint], width: usize, height: usize) -> Vec<String> {
        if points.is_empty() {
            return Vec::new();
        }
        let width = width.max(AXIS_STEPS + 1);
        let height = height.max(AXIS_STEPS + 1);

        let (min_value, max_value) = value_bounds(points);
        let range = max_value - min_value;

        let first_date = points[0].date;
        let day_span = (points[points.len() - 1].date - first_date).num_days();

        let scale_y = |value: f64| -> usize {
            if range == 0.0 {
                // Degenerate single-value series: flat line mid-grid
                return height / 2;
            }
            let row = ((max_value - value) / range * (height - 1) as f64).round();
            (row as usize).min(height - 1)
        };
        let scale_x = |point: &TimelinePoint| -> usize {
            if day_span == 0 {
                return 0;
            }
            let days = (point.date - first_date).num_days();
            let col = days as f64 / day_span as f64 * (width - 1) as f64;
            (col.round() as usize).min(width - 1)
        };

        let mut grid = vec![vec![' '; width]; height];

        // Profit/loss first so the value line wins shared cells.
        plot_series(&mut grid, points, &scale_x, &scale_y, |p| p.profit_loss, PROFIT_MARKER);
        plot_series(&mut grid, points, &scale_x, &scale_y, |p| p.total_value, VALUE_MARKER);

        // Five evenly spaced value labels, top (max) to bottom (min).
        let mut label_rows: Vec<Option<f64>> = vec![None; height];
        for i in 0..=AXIS_STEPS {
            let row = i * (height - 1) / AXIS_STEPS;
            let value = max_value - range * i as f64 / AXIS_STEPS as f64;
            label_rows[row] = Some(value);
        }

        let mut out = Vec::with_capacity(height + 3);
        for (row, cells) in grid.iter().enumerate() {
            let line: String = cells.iter().collect();
            match label_rows[row] {
                Some(value) => out.push(format!("{value:>Y_LABEL_WIDTH$.2} ┤{line}")),
                None => out.push(format!("{:>Y_LABEL_WIDTH$} │{line}", "")),
            }
        }

        out.push(format!("{:>Y_LABEL_WIDTH$} └{}", "", "─".repeat(width)));
        out.push(date_axis(points, width, day_span));
        out.push(format!(
            "{:>Y_LABEL_WIDTH$}  {VALUE_MARKER} portfolio value   {PROFIT_MARKER} profit/loss",
            ""
        ));
        out
    }
}

impl Default for ChartService {
    fn default() -> Self {
        Self::new()
    }
}

/// Min and max across the value and profit/loss series combined, so both
/// lines share one scale.
fn value_bounds(points: &[TimelinePoint]) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for p in points {
        for v in [p.total_value, p.profit_loss] {
            min = min.min(v);
            max = max.max(v);
        }
    }
    (min, max)
}

/// Plot one series: mark each point, then join consecutive points with a
/// linearly interpolated segment across the intermediate columns.
fn plot_series(
    grid: &mut [Vec<char>],
    points: &[TimelinePoint],
    scale_x: &dyn Fn(&TimelinePoint) -> usize,
    scale_y: &dyn Fn(f64) -> usize,
    value_of: fn(&TimelinePoint) -> f64,
    marker: char,
) {
    let mut prev: Option<(usize, f64)> = None;

    for point in points {
        let col = scale_x(point);
        let value = value_of(point);
        grid[scale_y(value)][col] = marker;

        if let Some((prev_col, prev_value)) = prev {
            if col > prev_col + 1 {
                let gap = (col - prev_col) as f64;
                for c in (prev_col + 1)..col {
                    let t = (c - prev_col) as f64 / gap;
                    let v = prev_value + t * (value - prev_value);
                    grid[scale_y(v)][c] = marker;
                }
            }
        }
        prev = Some((col, value));
    }
}

/// Five date markers spread across the horizontal axis by day-count
/// interpolation. A zero-day span collapses every marker onto the single
/// date.
fn date_axis(points: &[TimelinePoint], width: usize, day_span: i64) -> String {
    let first_date = points[0].date;
    let total = Y_LABEL_WIDTH + 2 + width;
    let mut line = vec![' '; total.max(Y_LABEL_WIDTH + 2 + 10)];

    for i in 0..=AXIS_STEPS {
        let date = first_date + Duration::days(day_span * i as i64 / AXIS_STEPS as i64);
        let label = date.format("%Y-%m-%d").to_string();
        let col = i * width.saturating_sub(1) / AXIS_STEPS;
        let start = (Y_LABEL_WIDTH + 2 + col).min(line.len() - label.len());
        for (offset, ch) in label.chars().enumerate() {
            line[start + offset] = ch;
        }
    }

    line.into_iter().collect::<String>().trim_end().to_string()
}
