//! Charts module - PNG rendering

mod plotter;
mod renderer;

pub use plotter::{
    DualAxisChart, IntervalChart, IntervalSeries, ScatterChart, ScatterStyle, XySeries,
    FORCE_COLOR, VOLTAGE_COLOR,
};
pub use renderer::ChartRenderer;
