//! Data Processor Module
//! Handles data cleaning and transformation (stack operation).

use super::natural::natsort;
use polars::prelude::*;
use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Long table row {0} has a null key")]
    NullKey(usize),
}

/// One (interval, device) sheet of well measurements.
#[derive(Debug, Clone)]
pub struct DeviceFrame {
    pub interval: String,
    pub device: String,
    pub df: DataFrame,
}

/// Handles data cleaning and transformation operations.
pub struct DataProcessor;

impl DataProcessor {
    /// Replace every value with its absolute value.
    pub fn absolute(df: &DataFrame) -> Result<DataFrame, ProcessorError> {
        let mut columns = Vec::with_capacity(df.width());
        for column in df.get_columns() {
            let values = column.cast(&DataType::Float64)?;
            let abs: Vec<Option<f64>> = values.f64()?.into_iter().map(|v| v.map(f64::abs)).collect();
            columns.push(Column::new(column.name().clone(), abs));
        }
        Ok(DataFrame::new(columns)?)
    }

    /// Get list of numeric column names.
    pub fn numeric_columns(df: &DataFrame) -> Vec<String> {
        df.get_columns()
            .iter()
            .filter(|col| {
                matches!(
                    col.dtype(),
                    DataType::Float32
                        | DataType::Float64
                        | DataType::Int8
                        | DataType::Int16
                        | DataType::Int32
                        | DataType::Int64
                        | DataType::UInt8
                        | DataType::UInt16
                        | DataType::UInt32
                        | DataType::UInt64
                )
            })
            .map(|col| col.name().to_string())
            .collect()
    }

    /// Fields that are numeric in every frame they appear in, in first-seen order.
    ///
    /// A column that is text in any one file is dropped everywhere.
    pub fn shared_numeric_fields(frames: &[DeviceFrame]) -> Vec<String> {
        let mut order: Vec<String> = Vec::new();
        let mut rejected: HashSet<String> = HashSet::new();

        for frame in frames {
            let numeric: HashSet<String> = Self::numeric_columns(&frame.df).into_iter().collect();
            for name in frame.df.get_column_names() {
                let name = name.to_string();
                if !numeric.contains(&name) {
                    rejected.insert(name.clone());
                }
                if !order.contains(&name) {
                    order.push(name);
                }
            }
        }

        order.retain(|name| !rejected.contains(name));
        order
    }

    /// Stack every frame's fields into long format.
    ///
    /// Output columns: ["interval", "device", "well", "field", "value"].
    /// Missing values are dropped.
    pub fn stack_to_long(
        frames: &[DeviceFrame],
        fields: &[String],
    ) -> Result<DataFrame, ProcessorError> {
        let mut intervals: Vec<String> = Vec::new();
        let mut devices: Vec<String> = Vec::new();
        let mut wells: Vec<u32> = Vec::new();
        let mut names: Vec<String> = Vec::new();
        let mut values: Vec<f64> = Vec::new();

        for frame in frames {
            for field in fields {
                let Ok(series) = frame.df.column(field) else {
                    continue;
                };
                let value_f64 = series.cast(&DataType::Float64)?;
                let value_ca = value_f64.f64()?;

                for (well, v) in value_ca.into_iter().enumerate() {
                    if let Some(v) = v {
                        if !v.is_nan() {
                            intervals.push(frame.interval.clone());
                            devices.push(frame.device.clone());
                            wells.push(well as u32);
                            names.push(field.clone());
                            values.push(v);
                        }
                    }
                }
            }
        }

        let df = DataFrame::new(vec![
            Column::new("interval".into(), intervals),
            Column::new("device".into(), devices),
            Column::new("well".into(), wells),
            Column::new("field".into(), names),
            Column::new("value".into(), values),
        ])?;

        Ok(df)
    }

    /// Replace non-positive values of the given fields with 1.
    pub fn clamp_non_positive(
        df: &DataFrame,
        fields: &[String],
    ) -> Result<DataFrame, ProcessorError> {
        let Some((first, rest)) = fields.split_first() else {
            return Ok(df.clone());
        };

        let in_fields = rest
            .iter()
            .fold(col("field").eq(lit(first.as_str())), |acc, f| {
                acc.or(col("field").eq(lit(f.as_str())))
            });

        let clamped = df
            .clone()
            .lazy()
            .with_column(
                when(in_fields.and(col("value").lt_eq(lit(0.0))))
                    .then(lit(1.0))
                    .otherwise(col("value"))
                    .alias("value"),
            )
            .collect()?;
        Ok(clamped)
    }
}

/// Key of one well series: the wells of a device at one interval for one field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeriesKey {
    pub field: String,
    pub device: String,
    pub interval: String,
}

impl SeriesKey {
    pub fn new(field: &str, device: &str, interval: &str) -> Self {
        Self {
            field: field.to_string(),
            device: device.to_string(),
            interval: interval.to_string(),
        }
    }
}

/// Well values indexed by (field, device, interval), with natural ordering lists.
#[derive(Debug, Clone, Default)]
pub struct Measurements {
    pub fields: Vec<String>,
    pub devices: Vec<String>,
    pub intervals: Vec<String>,
    pub n_wells: usize,
    pub values: HashMap<SeriesKey, BTreeMap<u32, f64>>,
}

impl Measurements {
    /// Index a long table produced by [`DataProcessor::stack_to_long`].
    ///
    /// `fields` fixes the column order; devices and intervals are sorted naturally.
    pub fn from_long(df: &DataFrame, fields: &[String]) -> Result<Self, ProcessorError> {
        let intervals = df.column("interval")?.str()?;
        let devices = df.column("device")?.str()?;
        let wells = df.column("well")?.cast(&DataType::UInt32)?;
        let wells = wells.u32()?;
        let names = df.column("field")?.str()?;
        let values = df.column("value")?.cast(&DataType::Float64)?;
        let values = values.f64()?;

        let mut index: HashMap<SeriesKey, BTreeMap<u32, f64>> = HashMap::new();
        let mut device_set: HashSet<String> = HashSet::new();
        let mut interval_set: HashSet<String> = HashSet::new();
        let mut well_set: HashSet<u32> = HashSet::new();

        for i in 0..df.height() {
            let (Some(interval), Some(device), Some(well), Some(field), Some(value)) = (
                intervals.get(i),
                devices.get(i),
                wells.get(i),
                names.get(i),
                values.get(i),
            ) else {
                return Err(ProcessorError::NullKey(i));
            };

            device_set.insert(device.to_string());
            interval_set.insert(interval.to_string());
            well_set.insert(well);
            index
                .entry(SeriesKey::new(field, device, interval))
                .or_default()
                .insert(well, value);
        }

        let mut devices: Vec<String> = device_set.into_iter().collect();
        natsort(&mut devices);
        let mut intervals: Vec<String> = interval_set.into_iter().collect();
        natsort(&mut intervals);

        Ok(Self {
            fields: fields.to_vec(),
            devices,
            intervals,
            n_wells: well_set.len(),
            values: index,
        })
    }

    /// Wells of one series, empty when the series is absent.
    pub fn wells(&self, key: &SeriesKey) -> Option<&BTreeMap<u32, f64>> {
        self.values.get(key)
    }

    /// Largest well index present plus one.
    pub fn well_span(&self) -> u32 {
        self.values
            .values()
            .filter_map(|wells| wells.keys().next_back())
            .max()
            .map(|w| w + 1)
            .unwrap_or(0)
    }
}
