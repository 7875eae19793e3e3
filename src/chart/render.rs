//! Line chart rendering: SVG for the web dashboard, plain text for the
//! terminal.
//!
//! The x axis is categorical (one slot per point, in series order) and the y
//! axis linear over the numeric range of the series. Points whose y is not a
//! number keep their x slot but are not drawn. Lines are never filled.

use anyhow::Result;
use plotters::prelude::*;

use crate::series::{Point, Series};

/// Stroke colour of the single data line.
pub const LINE_COLOR: RGBColor = RGBColor(75, 192, 192);

/// Number of labelled ticks on the y axis.
const Y_TICKS: usize = 5;

/// Upper bound on labelled x ticks.
const MAX_X_TICKS: usize = 10;

/// Labels for one chart.
#[derive(Debug, Clone, Copy)]
pub struct ChartLabels<'a> {
    pub title: &'a str,
    pub x_label: &'a str,
    /// Used for both the y-axis title and the legend entry.
    pub y_label: &'a str,
}

// ---------------------------------------------------------------------------
// Scales
// ---------------------------------------------------------------------------

/// Y range with a little headroom; degenerate ranges are widened so a flat
/// series still draws mid-plot.
pub fn padded_range(lo: f64, hi: f64) -> (f64, f64) {
    if (hi - lo).abs() < f64::EPSILON {
        let pad = if lo == 0.0 { 1.0 } else { lo.abs() * 0.1 };
        return (lo - pad, hi + pad);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}

/// Compact tick label: `1.2M`, `35.5K`, `4.25`.
pub fn format_compact(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1e12 {
        format!("{:.1}T", value / 1e12)
    } else if abs >= 1e9 {
        format!("{:.1}B", value / 1e9)
    } else if abs >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if abs >= 1e4 {
        format!("{:.1}K", value / 1e3)
    } else if value.fract() == 0.0 {
        format!("{value:.0}")
    } else if abs >= 10.0 {
        format!("{value:.1}")
    } else {
        format!("{value:.2}")
    }
}

fn slot(index: usize) -> i32 {
    i32::try_from(index).unwrap_or(i32::MAX)
}

// ---------------------------------------------------------------------------
// SVG
// ---------------------------------------------------------------------------

/// Render `series` as a standalone SVG line chart of `width` x `height`.
///
/// A single point sits mid-plot. A series with no numeric values still gets
/// its axes, titles and x labels.
pub fn line_chart_svg(series: &Series, labels: ChartLabels<'_>, width: u32, height: u32) -> Result<String> {
    let last = slot(series.len().saturating_sub(1));
    let x_range = if last == 0 { -1..1 } else { 0..last };
    let (lo, hi) = series
        .value_range()
        .map_or((0.0, 1.0), |(lo, hi)| padded_range(lo, hi));

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(labels.title, ("sans-serif", 18).into_font())
            .margin(12)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_range, lo..hi)?;

        chart
            .configure_mesh()
            .x_labels(series.len().clamp(1, MAX_X_TICKS))
            .y_labels(Y_TICKS)
            .x_desc(labels.x_label)
            .y_desc(labels.y_label)
            .x_label_formatter(&|i: &i32| {
                usize::try_from(*i)
                    .ok()
                    .and_then(|i| series.points.get(i))
                    .map(Point::label)
                    .unwrap_or_default()
            })
            .y_label_formatter(&|y: &f64| format_compact(*y))
            .draw()?;

        let points: Vec<(i32, f64)> = series.plottable().map(|(i, _, v)| (slot(i), v)).collect();
        if !points.is_empty() {
            let style = LINE_COLOR.stroke_width(2);
            chart
                .draw_series(LineSeries::new(points, style))?
                .label(labels.y_label)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));

            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperLeft)
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;
        }

        root.present()?;
    }
    Ok(svg)
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

/// Render `series` as a plain-text line chart of `width` x `height` cells
/// (plot area only; labels add a few lines and columns).
pub fn line_chart_text(series: &Series, labels: ChartLabels<'_>, width: usize, height: usize) -> Vec<String> {
    let width = width.max(8);
    let height = height.max(3);

    let mut lines = vec![format!("{} ({})", labels.title, labels.y_label)];

    let Some((lo, hi)) = series.value_range() else {
        lines.push("  (no numeric data)".to_string());
        return lines;
    };
    let (lo, hi) = padded_range(lo, hi);

    let mut grid = vec![vec![' '; width]; height];
    let count = series.len();
    let col_of = |i: usize| {
        if count <= 1 {
            width / 2
        } else {
            i * (width - 1) / (count - 1)
        }
    };
    let row_of = |v: f64| {
        let frac = (hi - v) / (hi - lo);
        ((frac * (height - 1) as f64).round() as usize).min(height - 1)
    };

    let mut prev: Option<(usize, f64)> = None;
    for (i, _, v) in series.plottable() {
        let col = col_of(i);
        if let Some((pcol, pv)) = prev {
            for c in pcol + 1..col {
                let t = (c - pcol) as f64 / (col - pcol) as f64;
                let cell = &mut grid[row_of(pv + (v - pv) * t)][c];
                if *cell == ' ' {
                    *cell = '·';
                }
            }
        }
        grid[row_of(v)][col] = '•';
        prev = Some((col, v));
    }

    let hi_label = format_compact(hi);
    let lo_label = format_compact(lo);
    let gutter = hi_label.chars().count().max(lo_label.chars().count());

    for (r, row) in grid.iter().enumerate() {
        let tick = if r == 0 {
            hi_label.as_str()
        } else if r == height - 1 {
            lo_label.as_str()
        } else {
            ""
        };
        let axis = if tick.is_empty() { '│' } else { '┤' };
        let body: String = row.iter().collect();
        lines.push(format!("{tick:>gutter$} {axis}{}", body.trim_end()));
    }
    lines.push(format!("{:>gutter$} └{}", "", "─".repeat(width)));

    let first = series.points.first().map(|p| p.label()).unwrap_or_default();
    let last = series.points.last().map(|p| p.label()).unwrap_or_default();
    let span = width.saturating_sub(first.chars().count() + last.chars().count());
    lines.push(format!(
        "{:>gutter$}  {first}{}{last}",
        "",
        " ".repeat(span.max(1))
    ));
    lines.push(format!("{:>gutter$}  x: {}", "", labels.x_label));

    lines
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::project_series;
    use serde_json::json;

    fn series(values: &[serde_json::Value]) -> Series {
        let rows: Vec<_> = values
            .iter()
            .enumerate()
            .map(|(i, v)| json!({"year": 2000 + i, "v": v}))
            .collect();
        project_series("u", &json!({ "data": rows }), "year", "v").unwrap()
    }

    fn labels() -> ChartLabels<'static> {
        ChartLabels {
            title: "GDP (USA, 100 yrs)",
            x_label: "year",
            y_label: "GDP (Trillions USD)",
        }
    }

    fn has_line_color(svg: &str) -> bool {
        svg.to_lowercase().contains("#4bc0c0")
    }

    #[test]
    fn svg_has_unfilled_line_and_labels() {
        let svg = line_chart_svg(&series(&[json!(1.5), json!(2.5)]), labels(), 640, 360).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("<polyline"));
        assert!(svg.contains(r#"fill="none""#));
        assert!(has_line_color(&svg));
        assert!(svg.contains("GDP (USA, 100 yrs)"));
        assert!(svg.contains("year"));
        assert!(svg.contains("GDP (Trillions USD)"));
        assert!(svg.contains("2000"));
    }

    #[test]
    fn single_point_still_renders() {
        let svg = line_chart_svg(&series(&[json!(2.5)]), labels(), 640, 360).unwrap();
        assert!(svg.contains("2000"));
        assert!(has_line_color(&svg));
    }

    #[test]
    fn empty_series_draws_axes_without_a_line() {
        let svg = line_chart_svg(&Series::default(), labels(), 320, 200).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("year"));
        assert!(!has_line_color(&svg));
    }

    #[test]
    fn non_numeric_values_are_not_drawn() {
        let svg = line_chart_svg(&series(&[json!("n/a"), json!(null)]), labels(), 320, 200).unwrap();
        assert!(!has_line_color(&svg));
    }

    #[test]
    fn flat_series_gets_headroom() {
        assert_eq!(padded_range(5.0, 5.0), (4.5, 5.5));
        assert_eq!(padded_range(0.0, 0.0), (-1.0, 1.0));
        let (lo, hi) = padded_range(0.0, 100.0);
        assert!(lo < 0.0 && hi > 100.0);
    }

    #[test]
    fn compact_format() {
        assert_eq!(format_compact(35_500_000.0), "35.5M");
        assert_eq!(format_compact(48_000.0), "48.0K");
        assert_eq!(format_compact(1990.0), "1990");
        assert_eq!(format_compact(21.43), "21.4");
        assert_eq!(format_compact(4.256), "4.26");
        assert_eq!(format_compact(2.1e12), "2.1T");
    }

    #[test]
    fn text_chart_marks_every_point() {
        let lines = line_chart_text(&series(&[json!(1), json!(3), json!(2)]), labels(), 20, 5);
        let dots: usize = lines.iter().map(|l| l.matches('•').count()).sum();
        assert_eq!(dots, 3);
        assert!(lines[0].starts_with("GDP (USA, 100 yrs)"));
        assert!(lines.iter().any(|l| l.contains("2000") && l.contains("2002")));
        assert!(lines.last().unwrap().contains("x: year"));
    }

    #[test]
    fn text_chart_without_numbers() {
        let lines = line_chart_text(&series(&[json!("n/a")]), labels(), 20, 5);
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("no numeric data"));
    }
}
