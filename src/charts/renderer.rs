//! Static Chart Renderer
//! Draws the chart models to PNG files with plotters.
//!
//! Three layouts:
//! 1. Dual axis: two lines over one X axis, left and right Y scales, shared legend
//! 2. Scatter: green squares with dashed zero lines, or dotted overlay lines
//! 3. Interval: one line per device over categorical intervals with error bars

use super::plotter::{
    axis_range, category_label, data_range, series_color, tick_count, DualAxisChart,
    IntervalChart, ScatterChart, ScatterStyle, GRID_COLOR, SCATTER_COLOR, VOLTAGE_COLOR,
};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::series::DashedLineSeries;
use std::error::Error;
use std::path::{Path, PathBuf};
use thiserror::Error;

const FONT: &str = "sans-serif";

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Nothing to plot for {0}")]
    Empty(PathBuf),
    #[error("Failed to draw {path}: {message}")]
    Draw { path: PathBuf, message: String },
}

type DrawResult = Result<(), Box<dyn Error>>;

pub struct ChartRenderer;

impl ChartRenderer {
    /// Force/voltage style plot: left series on the primary axis, right series
    /// on the secondary axis.
    pub fn render_dual_axis(chart: &DualAxisChart, path: &Path) -> Result<(), ChartError> {
        if chart.left.points.is_empty() && chart.right.points.is_empty() {
            return Err(ChartError::Empty(path.to_path_buf()));
        }
        Self::finish(path, Self::draw_dual_axis(chart, path))
    }

    pub fn render_scatter(chart: &ScatterChart, path: &Path) -> Result<(), ChartError> {
        if chart.series.iter().all(|s| s.points.is_empty()) {
            return Err(ChartError::Empty(path.to_path_buf()));
        }
        Self::finish(path, Self::draw_scatter(chart, path))
    }

    pub fn render_intervals(chart: &IntervalChart, path: &Path) -> Result<(), ChartError> {
        if chart.categories.is_empty() || chart.series.is_empty() {
            return Err(ChartError::Empty(path.to_path_buf()));
        }
        Self::finish(path, Self::draw_intervals(chart, path))
    }

    fn finish(path: &Path, result: DrawResult) -> Result<(), ChartError> {
        result.map_err(|e| ChartError::Draw {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn draw_dual_axis(chart: &DualAxisChart, path: &Path) -> DrawResult {
        let x_range = axis_range(&chart.x_axis, chart.left.xs().chain(chart.right.xs()));
        let left_range = axis_range(&chart.left_axis, chart.left.ys());
        let right_range = axis_range(&chart.right_axis, chart.right.ys());

        let (left_color, right_color) = (chart.left_color, chart.right_color);
        let root = BitMapBackend::new(path, chart.size).into_drawing_area();
        root.fill(&WHITE)?;

        // X title drawn by hand so the mesh description style can carry the left color
        let (width, height) = chart.size;
        root.draw(&Text::new(
            chart.x_axis.label.as_str(),
            (width as i32 / 2, height as i32 - 8),
            (FONT, 16).into_font().color(&BLACK).pos(Pos::new(HPos::Center, VPos::Bottom)),
        ))?;

        let mut ctx = ChartBuilder::on(&root)
            .caption(&chart.title, (FONT, 22))
            .margin(15)
            .x_label_area_size(55)
            .y_label_area_size(55)
            .right_y_label_area_size(55)
            .build_cartesian_2d(x_range.0..x_range.1, left_range.0..left_range.1)?
            .set_secondary_coord(x_range.0..x_range.1, right_range.0..right_range.1);

        ctx.configure_mesh()
            .y_desc(&chart.left_axis.label)
            .x_labels(tick_count(x_range, chart.x_axis.tick_step))
            .y_labels(tick_count(left_range, chart.left_axis.tick_step))
            .y_label_style((FONT, 12).into_font().color(&left_color))
            .bold_line_style(GRID_COLOR.mix(0.5))
            .light_line_style(TRANSPARENT)
            .axis_desc_style((FONT, 16).into_font().color(&left_color))
            .draw()?;

        ctx.configure_secondary_axes()
            .y_desc(&chart.right_axis.label)
            .y_labels(tick_count(right_range, chart.right_axis.tick_step))
            .label_style((FONT, 12).into_font().color(&right_color))
            .axis_desc_style((FONT, 16).into_font().color(&right_color))
            .draw()?;

        ctx.draw_series(LineSeries::new(
            chart.left.points.iter().copied(),
            left_color.stroke_width(2),
        ))?
        .label(&chart.left.label)
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], left_color.stroke_width(2)));

        ctx.draw_secondary_series(LineSeries::new(
            chart.right.points.iter().copied(),
            right_color.stroke_width(2),
        ))?
        .label(&chart.right.label)
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], right_color.stroke_width(2)));

        ctx.configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    }

    fn draw_scatter(chart: &ScatterChart, path: &Path) -> DrawResult {
        let x_range = data_range(chart.series.iter().flat_map(|s| s.xs()));
        let y_range = chart
            .y_range
            .unwrap_or_else(|| data_range(chart.series.iter().flat_map(|s| s.ys())));

        let root = BitMapBackend::new(path, chart.size).into_drawing_area();
        root.fill(&WHITE)?;

        let mut ctx = ChartBuilder::on(&root)
            .caption(&chart.title, (FONT, 20))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_range.0..x_range.1, y_range.0..y_range.1)?;

        ctx.configure_mesh().light_line_style(TRANSPARENT).draw()?;

        match chart.style {
            ScatterStyle::Markers => {
                // Zero lines
                ctx.draw_series(DashedLineSeries::new(
                    vec![(0.0, y_range.0), (0.0, y_range.1)],
                    8,
                    5,
                    BLACK.stroke_width(1),
                ))?;
                ctx.draw_series(DashedLineSeries::new(
                    vec![(x_range.0, 0.0), (x_range.1, 0.0)],
                    8,
                    5,
                    BLACK.stroke_width(1),
                ))?;

                for s in &chart.series {
                    ctx.draw_series(s.points.iter().map(|&p| {
                        EmptyElement::at(p)
                            + Rectangle::new([(-3, -3), (3, 3)], SCATTER_COLOR.filled())
                    }))?;
                }
            }
            ScatterStyle::Overlay => {
                for s in &chart.series {
                    ctx.draw_series(DashedLineSeries::new(
                        s.points.iter().copied(),
                        2,
                        3,
                        VOLTAGE_COLOR.stroke_width(1),
                    ))?
                    .label(&s.label)
                    .legend(|(x, y)| Circle::new((x + 10, y), 3, VOLTAGE_COLOR.filled()));

                    ctx.draw_series(
                        s.points
                            .iter()
                            .map(|&p| Circle::new(p, 3, VOLTAGE_COLOR.filled())),
                    )?;
                }

                ctx.configure_series_labels()
                    .position(SeriesLabelPosition::UpperRight)
                    .background_style(WHITE.mix(0.8))
                    .border_style(BLACK)
                    .draw()?;
            }
        }

        root.present()?;
        Ok(())
    }

    fn draw_intervals(chart: &IntervalChart, path: &Path) -> DrawResult {
        let n = chart.categories.len();
        let x_range = (-0.5, n as f64 - 0.5);
        let y_range = chart.y_range();

        let root = BitMapBackend::new(path, chart.size).into_drawing_area();
        root.fill(&WHITE)?;

        let mut ctx = ChartBuilder::on(&root)
            .caption(&chart.title, (FONT, 22))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_range.0..x_range.1, y_range.0..y_range.1)?;

        let categories = &chart.categories;
        let label_x = |x: &f64| category_label(categories, *x);
        ctx.configure_mesh()
            .disable_x_mesh()
            .x_labels(n.max(2) * 2)
            .x_label_formatter(&label_x)
            .y_desc(&chart.y_label)
            .axis_desc_style((FONT, 16))
            .draw()?;

        for (i, s) in chart.series.iter().enumerate() {
            let color = series_color(i);
            let points: Vec<(f64, f64)> = s
                .means
                .iter()
                .enumerate()
                .filter_map(|(x, m)| m.filter(|v| v.is_finite()).map(|m| (x as f64, m)))
                .collect();

            ctx.draw_series(
                LineSeries::new(points.iter().copied(), color.stroke_width(2)).point_size(4),
            )?
            .label(&s.label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));

            ctx.draw_series(points.iter().filter_map(|&(x, mean)| {
                let err = s
                    .errors
                    .get(x as usize)
                    .copied()
                    .flatten()
                    .filter(|e| e.is_finite())?;
                Some(ErrorBar::new_vertical(
                    x,
                    mean - err,
                    mean,
                    mean + err,
                    color.filled(),
                    8,
                ))
            }))?;
        }

        ctx.configure_series_labels()
            .position(SeriesLabelPosition::LowerRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    }
}
