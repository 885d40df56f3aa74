//! Normalization Module
//! Turns raw well measurements into ratio tables (to a baseline interval or to
//! the control device mean) and attaches per-row statistics and p-values.

use super::calculator::{StatsCalculator, SummaryStats, TTestKind};
use crate::data::{Measurements, SeriesKey};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("Baseline interval {0:?} not found (intervals: {1})")]
    UnknownBaseline(String, String),
    #[error("Control device {0:?} not found (devices: {1})")]
    UnknownControl(String, String),
}

/// Normalized well values keyed by (field, device, interval), plus row statistics.
#[derive(Debug, Clone, Default)]
pub struct RatioTable {
    pub fields: Vec<String>,
    pub devices: Vec<String>,
    pub intervals: Vec<String>,
    /// Number of well columns (highest well index + 1).
    pub n_wells: u32,
    pub values: HashMap<SeriesKey, BTreeMap<u32, f64>>,
    pub stats: HashMap<SeriesKey, SummaryStats>,
    pub p_values: HashMap<SeriesKey, f64>,
}

impl RatioTable {
    fn shaped_like(m: &Measurements) -> Self {
        Self {
            fields: m.fields.clone(),
            devices: m.devices.clone(),
            intervals: m.intervals.clone(),
            n_wells: m.well_span(),
            ..Default::default()
        }
    }

    /// Every row key, field-major, then device, then interval.
    pub fn keys(&self) -> Vec<SeriesKey> {
        let mut keys = Vec::with_capacity(self.fields.len() * self.devices.len() * self.intervals.len());
        for field in &self.fields {
            for device in &self.devices {
                for interval in &self.intervals {
                    keys.push(SeriesKey::new(field, device, interval));
                }
            }
        }
        keys
    }

    /// Present (finite) well values of one row.
    pub fn well_values(&self, key: &SeriesKey) -> Vec<f64> {
        self.values
            .get(key)
            .map(|wells| wells.values().copied().collect())
            .unwrap_or_default()
    }

    /// Value of one well, if present.
    pub fn well(&self, key: &SeriesKey, well: u32) -> Option<f64> {
        self.values.get(key).and_then(|wells| wells.get(&well)).copied()
    }

    pub fn row_stats(&self, key: &SeriesKey) -> SummaryStats {
        self.stats.get(key).copied().unwrap_or_default()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    fn insert(&mut self, key: SeriesKey, well: u32, value: f64) {
        if value.is_finite() {
            self.values.entry(key).or_default().insert(well, value);
        }
    }
}

/// Builds ratio tables and their statistics.
pub struct Normalizer;

impl Normalizer {
    /// Divide every well by the same well at the baseline interval.
    pub fn to_baseline(m: &Measurements, baseline: &str) -> Result<RatioTable, NormalizeError> {
        if !m.intervals.iter().any(|i| i == baseline) {
            return Err(NormalizeError::UnknownBaseline(
                baseline.to_string(),
                m.intervals.join(", "),
            ));
        }

        let mut table = RatioTable::shaped_like(m);
        for field in &m.fields {
            for device in &m.devices {
                let Some(base) = m.wells(&SeriesKey::new(field, device, baseline)) else {
                    continue;
                };
                for interval in &m.intervals {
                    let key = SeriesKey::new(field, device, interval);
                    let Some(wells) = m.wells(&key) else {
                        continue;
                    };
                    for (&well, &value) in wells {
                        if let Some(&b) = base.get(&well) {
                            table.insert(key.clone(), well, value / b);
                        }
                    }
                }
            }
        }
        Ok(table)
    }

    /// Express every well as a percentage of the control device's mean at the
    /// same field and interval.
    pub fn to_control(m: &Measurements, control: &str) -> Result<RatioTable, NormalizeError> {
        if !m.devices.iter().any(|d| d == control) {
            return Err(NormalizeError::UnknownControl(
                control.to_string(),
                m.devices.join(", "),
            ));
        }

        let mut table = RatioTable::shaped_like(m);
        for field in &m.fields {
            for interval in &m.intervals {
                let control_values: Vec<f64> = m
                    .wells(&SeriesKey::new(field, control, interval))
                    .map(|w| w.values().copied().collect())
                    .unwrap_or_default();
                let avg = StatsCalculator::compute_descriptive_stats(&control_values).mean;
                if avg.is_nan() {
                    continue;
                }

                for device in &m.devices {
                    let key = SeriesKey::new(field, device, interval);
                    let Some(wells) = m.wells(&key) else {
                        continue;
                    };
                    for (&well, &value) in wells {
                        table.insert(key.clone(), well, value / avg * 100.0);
                    }
                }
            }
        }
        Ok(table)
    }

    /// Mean, standard deviation and standard error of every row.
    pub fn calc_stats(table: &mut RatioTable) {
        let stats: HashMap<SeriesKey, SummaryStats> = table
            .keys()
            .into_iter()
            .map(|key| {
                let s = StatsCalculator::compute_descriptive_stats(&table.well_values(&key));
                (key, s)
            })
            .collect();
        table.stats = stats;
    }

    /// Test every device row against the control row of the same field and interval.
    ///
    /// Returns how many rows differ significantly from the control.
    pub fn t_test(table: &mut RatioTable, control: &str, kind: TTestKind) -> usize {
        let mut p_values = HashMap::new();
        let mut significant = 0;
        for key in table.keys() {
            let control_key = SeriesKey::new(&key.field, control, &key.interval);
            let control_values = table.well_values(&control_key);
            let values = table.well_values(&key);
            if let Some(result) = StatsCalculator::perform_ttest(kind, &control_values, &values) {
                debug!(
                    field = %key.field,
                    device = %key.device,
                    interval = %key.interval,
                    t = result.t,
                    df = result.df,
                    p = result.p_value,
                    "t-test"
                );
                if result.is_significant() {
                    significant += 1;
                }
                p_values.insert(key, result.p_value);
            }
        }
        table.p_values = p_values;
        significant
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    const FIELD: &str = "Total Vessels Length";

    /// Long table with two devices, two intervals and three wells.
    fn measurements() -> Measurements {
        let rows: Vec<(&str, &str, u32, f64)> = vec![
            ("0hr", "Control", 0, 10.0),
            ("0hr", "Control", 1, 20.0),
            ("0hr", "Control", 2, 30.0),
            ("24hr", "Control", 0, 20.0),
            ("24hr", "Control", 1, 30.0),
            ("24hr", "Control", 2, 60.0),
            ("0hr", "Drug", 0, 5.0),
            ("0hr", "Drug", 1, 10.0),
            ("0hr", "Drug", 2, 0.0),
            ("24hr", "Drug", 0, 15.0),
            ("24hr", "Drug", 1, 10.0),
            ("24hr", "Drug", 2, 9.0),
        ];
        let df = DataFrame::new(vec![
            Column::new("interval".into(), rows.iter().map(|r| r.0).collect::<Vec<_>>()),
            Column::new("device".into(), rows.iter().map(|r| r.1).collect::<Vec<_>>()),
            Column::new("well".into(), rows.iter().map(|r| r.2).collect::<Vec<_>>()),
            Column::new("field".into(), rows.iter().map(|_| FIELD).collect::<Vec<_>>()),
            Column::new("value".into(), rows.iter().map(|r| r.3).collect::<Vec<_>>()),
        ])
        .unwrap();
        Measurements::from_long(&df, &[FIELD.to_string()]).unwrap()
    }

    #[test]
    fn baseline_ratio_is_one_at_baseline() {
        let table = Normalizer::to_baseline(&measurements(), "0hr").unwrap();
        let key = SeriesKey::new(FIELD, "Control", "0hr");
        assert_eq!(table.well_values(&key), vec![1.0, 1.0, 1.0]);

        let later = SeriesKey::new(FIELD, "Control", "24hr");
        assert_eq!(table.well_values(&later), vec![2.0, 1.5, 2.0]);
    }

    #[test]
    fn division_by_zero_baseline_is_missing() {
        let table = Normalizer::to_baseline(&measurements(), "0hr").unwrap();
        let key = SeriesKey::new(FIELD, "Drug", "24hr");
        assert_eq!(table.well(&key, 0), Some(3.0));
        assert_eq!(table.well(&key, 2), None);
        assert_eq!(table.n_wells, 3);
    }

    #[test]
    fn unknown_baseline_is_an_error() {
        let err = Normalizer::to_baseline(&measurements(), "1hr").unwrap_err();
        assert!(matches!(err, NormalizeError::UnknownBaseline(ref b, _) if b == "1hr"));
    }

    #[test]
    fn control_mean_becomes_one_hundred() {
        let mut table = Normalizer::to_control(&measurements(), "Control").unwrap();
        Normalizer::calc_stats(&mut table);
        for interval in ["0hr", "24hr"] {
            let s = table.row_stats(&SeriesKey::new(FIELD, "Control", interval));
            assert!((s.mean - 100.0).abs() < 1e-9);
        }
        // 0hr control mean is 20
        let drug = SeriesKey::new(FIELD, "Drug", "0hr");
        assert_eq!(table.well_values(&drug), vec![25.0, 50.0, 0.0]);
    }

    #[test]
    fn missing_control_is_an_error() {
        let err = Normalizer::to_control(&measurements(), "Vehicle").unwrap_err();
        assert!(matches!(err, NormalizeError::UnknownControl(ref c, _) if c == "Vehicle"));
    }

    #[test]
    fn t_test_covers_every_row_and_control_is_one() {
        let mut table = Normalizer::to_control(&measurements(), "Control").unwrap();
        let significant = Normalizer::t_test(&mut table, "Control", TTestKind::Student);
        assert_eq!(table.p_values.len(), 4);
        assert!(significant <= 2);
        let p = table.p_values[&SeriesKey::new(FIELD, "Control", "24hr")];
        assert!((p - 1.0).abs() < 1e-12);
        let p = table.p_values[&SeriesKey::new(FIELD, "Drug", "0hr")];
        assert!(p > 0.0 && p < 1.0);
    }

    #[test]
    fn stats_follow_row_keys() {
        let mut table = Normalizer::to_baseline(&measurements(), "0hr").unwrap();
        Normalizer::calc_stats(&mut table);
        assert_eq!(table.stats.len(), table.keys().len());
        let s = table.row_stats(&SeriesKey::new(FIELD, "Drug", "24hr"));
        assert_eq!(s.count, 2);
        assert_eq!(s.mean, 2.0);
    }
}
