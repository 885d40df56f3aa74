//! Data module - file loading and processing

mod angiotool;
mod loader;
mod natural;
mod processor;

pub use angiotool::Experiment;
pub use loader::{SensorLog, TextFormat};
pub use natural::natural_cmp;
pub use processor::{DataProcessor, Measurements, SeriesKey};
