//! Chart Models
//! Plain descriptions of the charts the renderer draws, plus the axis helpers
//! shared between them.

use crate::config::AxisSettings;
use plotters::style::RGBColor;

pub const FORCE_COLOR: RGBColor = RGBColor(31, 119, 180); // Blue
pub const VOLTAGE_COLOR: RGBColor = RGBColor(214, 39, 40); // Red
pub const SCATTER_COLOR: RGBColor = RGBColor(44, 160, 44); // Green
pub const GRID_COLOR: RGBColor = RGBColor(105, 105, 105); // Dim grey

/// Colors for device lines.
pub const PALETTE: [RGBColor; 10] = [
    RGBColor(52, 152, 219),  // Blue
    RGBColor(231, 76, 60),   // Red
    RGBColor(46, 204, 113),  // Green
    RGBColor(155, 89, 182),  // Purple
    RGBColor(243, 156, 18),  // Orange
    RGBColor(26, 188, 156),  // Teal
    RGBColor(233, 30, 99),   // Pink
    RGBColor(0, 188, 212),   // Cyan
    RGBColor(121, 85, 72),   // Brown
    RGBColor(96, 125, 139),  // Blue Grey
];

/// Labelled (x, y) points.
#[derive(Debug, Clone, Default)]
pub struct XySeries {
    pub label: String,
    pub points: Vec<(f64, f64)>,
}

impl XySeries {
    pub fn new(label: &str, xs: &[f64], ys: &[f64]) -> Self {
        Self {
            label: label.to_string(),
            points: xs.iter().copied().zip(ys.iter().copied()).collect(),
        }
    }

    pub fn xs(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.0)
    }

    pub fn ys(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.1)
    }
}

/// Two lines sharing an X axis, one per Y axis.
#[derive(Debug, Clone)]
pub struct DualAxisChart {
    pub title: String,
    pub x_axis: AxisSettings,
    pub left_axis: AxisSettings,
    pub right_axis: AxisSettings,
    pub left: XySeries,
    pub right: XySeries,
    /// Line, tick and title color of each Y axis.
    pub left_color: RGBColor,
    pub right_color: RGBColor,
    pub size: (u32, u32),
}

/// How scatter files are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScatterStyle {
    /// Green squares with dashed zero lines.
    Markers,
    /// Dotted lines with circle markers, one legend entry per series.
    Overlay,
}

#[derive(Debug, Clone)]
pub struct ScatterChart {
    pub title: String,
    pub style: ScatterStyle,
    pub series: Vec<XySeries>,
    pub y_range: Option<(f64, f64)>,
    pub size: (u32, u32),
}

/// Mean and error of one device across the intervals.
#[derive(Debug, Clone, Default)]
pub struct IntervalSeries {
    pub label: String,
    pub means: Vec<Option<f64>>,
    pub errors: Vec<Option<f64>>,
}

/// Categorical line chart over intervals with error bars.
#[derive(Debug, Clone)]
pub struct IntervalChart {
    pub title: String,
    pub y_label: String,
    pub categories: Vec<String>,
    pub series: Vec<IntervalSeries>,
    pub size: (u32, u32),
}

impl IntervalChart {
    /// Y range covering every mean ± error, starting at 0.
    pub fn y_range(&self) -> (f64, f64) {
        let top = self
            .series
            .iter()
            .flat_map(|s| {
                s.means.iter().enumerate().filter_map(|(i, m)| {
                    let err = s.errors.get(i).copied().flatten().unwrap_or(0.0);
                    m.map(|m| m + err.abs())
                })
            })
            .filter(|v| v.is_finite())
            .fold(f64::NEG_INFINITY, f64::max);
        if top.is_finite() && top > 0.0 {
            (0.0, top * 1.1)
        } else {
            (0.0, 1.0)
        }
    }
}

/// Color for the n-th series.
pub fn series_color(index: usize) -> RGBColor {
    PALETTE[index % PALETTE.len()]
}

/// Range of the finite values padded by 5% on each side.
pub fn data_range<I: IntoIterator<Item = f64>>(values: I) -> (f64, f64) {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    if !lo.is_finite() {
        return (0.0, 1.0);
    }
    if lo == hi {
        let pad = if lo == 0.0 { 1.0 } else { lo.abs() * 0.05 };
        return (lo - pad, hi + pad);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}

/// Configured range, or the padded data range.
pub fn axis_range<I: IntoIterator<Item = f64>>(axis: &AxisSettings, values: I) -> (f64, f64) {
    axis.range.unwrap_or_else(|| data_range(values))
}

/// Number of labels for a fixed tick step, or a default count.
pub fn tick_count(range: (f64, f64), step: Option<f64>) -> usize {
    match step {
        Some(step) if step > 0.0 => ((range.1 - range.0) / step).round() as usize + 1,
        _ => 10,
    }
}

/// Category label for a position on an index axis, blank between categories.
pub fn category_label(categories: &[String], x: f64) -> String {
    let idx = x.round();
    if (x - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    categories.get(idx as usize).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_range_pads_both_sides() {
        let (lo, hi) = data_range(vec![0.0, 10.0, f64::NAN]);
        assert!((lo + 0.5).abs() < 1e-12);
        assert!((hi - 10.5).abs() < 1e-12);
    }

    #[test]
    fn data_range_handles_flat_and_empty() {
        assert_eq!(data_range(vec![]), (0.0, 1.0));
        assert_eq!(data_range(vec![0.0, 0.0]), (-1.0, 1.0));
        let (lo, hi) = data_range(vec![4.0]);
        assert!(lo < 4.0 && hi > 4.0);
    }

    #[test]
    fn fixed_axis_range_wins() {
        let axis = AxisSettings {
            column: 5,
            label: "Force".into(),
            range: Some((0.0, 12.0)),
            tick_step: Some(2.0),
        };
        assert_eq!(axis_range(&axis, vec![100.0]), (0.0, 12.0));
        assert_eq!(tick_count((0.0, 12.0), axis.tick_step), 7);
        assert_eq!(tick_count((0.0, 12.0), None), 10);
    }

    #[test]
    fn category_labels_only_on_integers() {
        let cats = vec!["0hr".to_string(), "24hr".to_string()];
        assert_eq!(category_label(&cats, 0.0), "0hr");
        assert_eq!(category_label(&cats, 1.0000000001), "24hr");
        assert_eq!(category_label(&cats, 0.5), "");
        assert_eq!(category_label(&cats, 2.0), "");
        assert_eq!(category_label(&cats, -1.0), "");
    }

    #[test]
    fn interval_range_includes_error() {
        let chart = IntervalChart {
            title: String::new(),
            y_label: String::new(),
            categories: vec!["0hr".into(), "24hr".into()],
            series: vec![IntervalSeries {
                label: "Control".into(),
                means: vec![Some(1.0), Some(2.0)],
                errors: vec![None, Some(1.0)],
            }],
            size: (800, 600),
        };
        let (lo, hi) = chart.y_range();
        assert_eq!(lo, 0.0);
        assert!((hi - 3.3).abs() < 1e-9);
    }

    #[test]
    fn palette_wraps() {
        assert_eq!(series_color(0), series_color(PALETTE.len()));
    }
}
