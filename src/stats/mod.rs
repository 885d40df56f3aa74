//! Stats module - descriptive statistics, t-tests and normalization

mod calculator;
mod normalize;

pub use calculator::{SummaryStats, TTestKind};
pub use normalize::{Normalizer, RatioTable};
