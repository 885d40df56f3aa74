//! Settings Module
//! JSON settings file with defaults for every tool.

use crate::stats::TTestKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read settings {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid settings {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid settings: {0}")]
    Invalid(String),
}

/// One plotted channel: which column it comes from and how its axis looks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisSettings {
    pub column: usize,
    pub label: String,
    #[serde(default)]
    pub range: Option<(f64, f64)>,
    #[serde(default)]
    pub tick_step: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForcePlotSettings {
    pub skip_rows: usize,
    pub absolute: bool,
    pub title: String,
    pub x: AxisSettings,
    pub left: AxisSettings,
    pub right: AxisSettings,
    pub width: u32,
    pub height: u32,
}

impl Default for ForcePlotSettings {
    fn default() -> Self {
        Self {
            skip_rows: 2,
            absolute: true,
            title: "Force and Voltage versus Displacement Plot".to_string(),
            x: AxisSettings {
                column: 3,
                label: "Displacement (mm)".to_string(),
                range: None,
                tick_step: None,
            },
            left: AxisSettings {
                column: 5,
                label: "Force (Nm)".to_string(),
                range: Some((0.0, 12.0)),
                tick_step: Some(2.0),
            },
            right: AxisSettings {
                column: 9,
                label: "Voltage (Nm)".to_string(),
                range: Some((0.0, 10.0)),
                tick_step: Some(2.0),
            },
            width: 800,
            height: 600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScatterSettings {
    pub x_column: usize,
    pub y_column: usize,
    /// Fixed Y range for single-file plots; auto when unset.
    pub y_range: Option<(f64, f64)>,
    /// Fixed Y range for the overlay plot.
    pub overlay_y_range: Option<(f64, f64)>,
    pub width: u32,
    pub height: u32,
}

impl Default for ScatterSettings {
    fn default() -> Self {
        Self {
            x_column: 1,
            y_column: 2,
            y_range: None,
            overlay_y_range: Some((0.0, 55000.0)),
            width: 640,
            height: 480,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AngioToolSettings {
    pub control: String,
    /// Interval every well is divided by; the first interval when unset.
    pub baseline: Option<String>,
    pub header_row: usize,
    pub excluded_dirs: Vec<String>,
    pub plot_keys: Vec<String>,
    pub clamp_fields: Vec<String>,
    pub t_test: TTestKind,
    pub render_png: bool,
}

impl Default for AngioToolSettings {
    fn default() -> Self {
        Self {
            control: "Control".to_string(),
            baseline: None,
            header_row: 2,
            excluded_dirs: vec!["plots".to_string(), "excel".to_string()],
            plot_keys: vec![
                "Total Vessels Length".to_string(),
                "Total Number of End Points".to_string(),
                "Total Number of Junctions".to_string(),
            ],
            clamp_fields: vec![
                "Total Number of Junctions".to_string(),
                "Junctions density".to_string(),
            ],
            t_test: TTestKind::Student,
            render_png: true,
        }
    }
}

/// All tool settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub force_plot: ForcePlotSettings,
    pub scatter: ScatterSettings,
    pub angiotool: AngioToolSettings,
}

impl Settings {
    /// Load settings from a JSON file, or use the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let settings = match path {
            None => Self::default(),
            Some(path) => {
                let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?
            }
        };
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (name, axis) in [
            ("force_plot.left", &self.force_plot.left),
            ("force_plot.right", &self.force_plot.right),
            ("force_plot.x", &self.force_plot.x),
        ] {
            if let Some((lo, hi)) = axis.range {
                if lo >= hi {
                    return Err(ConfigError::Invalid(format!(
                        "{name}.range must be increasing, got ({lo}, {hi})"
                    )));
                }
            }
            if matches!(axis.tick_step, Some(step) if step <= 0.0) {
                return Err(ConfigError::Invalid(format!("{name}.tick_step must be positive")));
            }
        }
        if self.force_plot.width == 0 || self.force_plot.height == 0 {
            return Err(ConfigError::Invalid("force_plot size must be non-zero".to_string()));
        }
        if self.scatter.width == 0 || self.scatter.height == 0 {
            return Err(ConfigError::Invalid("scatter size must be non-zero".to_string()));
        }
        if self.angiotool.control.is_empty() {
            return Err(ConfigError::Invalid("angiotool.control must not be empty".to_string()));
        }
        Ok(())
    }
}
