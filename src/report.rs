//! Report Module
//! Lays the AngioTool tables out as `data.xlsx` and `plots.xlsx`, and builds
//! the per-key interval charts.

use crate::charts::{IntervalChart, IntervalSeries};
use crate::data::{Measurements, SeriesKey};
use crate::stats::{RatioTable, SummaryStats};
use crate::xlsx::{
    CellValue, ChartSeries, Chartsheet, LineChart, SheetRange, Workbook, Worksheet, XlsxError,
};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, warn};

pub const RAW_SHEET: &str = "Raw_Device_Data";
pub const BASELINE_SHEET: &str = "Ratio_to_Control";
pub const CONTROL_SHEET: &str = "Ratio_to_Control_2";

/// Row labels of the statistic rows under each block of wells.
const STAT_ROWS: [&str; 3] = ["mean", "stdev", "stErr"];
const P_VALUE_ROW: &str = "p-value";

/// Title of a plot key's chart and Y axis.
pub fn relative_title(key: &str) -> String {
    format!("{} Relative to Control", key)
}

fn stat_value(stats: &SummaryStats, row: &str) -> f64 {
    match row {
        "mean" => stats.mean,
        "stdev" => stats.stdev,
        _ => stats.sterr,
    }
}

/// Builds the report workbooks.
pub struct ReportWriter;

impl ReportWriter {
    /// One row per (device, interval, well) holding every field's raw value.
    pub fn raw_sheet(m: &Measurements) -> Worksheet {
        let mut header = vec!["device".to_string(), "interval".to_string(), "well".to_string()];
        header.extend(m.fields.iter().cloned());
        let mut ws = Worksheet::with_header(RAW_SHEET, &header);

        for device in &m.devices {
            for interval in &m.intervals {
                let keys: Vec<SeriesKey> = m
                    .fields
                    .iter()
                    .map(|field| SeriesKey::new(field, device, interval))
                    .collect();
                let wells: BTreeSet<u32> = keys
                    .iter()
                    .filter_map(|key| m.wells(key))
                    .flat_map(|wells| wells.keys().copied())
                    .collect();

                for well in wells {
                    let mut row: Vec<CellValue> =
                        vec![device.as_str().into(), interval.as_str().into(), well.into()];
                    row.extend(keys.iter().map(|key| {
                        CellValue::from(m.wells(key).and_then(|w| w.get(&well)).copied())
                    }));
                    ws.push_row(row);
                }
            }
        }
        ws
    }

    /// Wells then statistics for every (device, interval); optionally a p-value row.
    pub fn ratio_sheet(name: &str, table: &RatioTable, with_p_values: bool) -> Worksheet {
        let mut header = vec!["device".to_string(), "interval".to_string(), "row".to_string()];
        header.extend(table.fields.iter().cloned());
        let mut ws = Worksheet::with_header(name, &header);

        for device in &table.devices {
            for interval in &table.intervals {
                let keys: Vec<SeriesKey> = table
                    .fields
                    .iter()
                    .map(|field| SeriesKey::new(field, device, interval))
                    .collect();
                let lead = |label: CellValue| -> Vec<CellValue> {
                    vec![device.as_str().into(), interval.as_str().into(), label]
                };

                for well in 0..table.n_wells {
                    let mut row = lead(well.into());
                    row.extend(keys.iter().map(|key| CellValue::from(table.well(key, well))));
                    ws.push_row(row);
                }

                for stat in STAT_ROWS {
                    let mut row = lead(stat.into());
                    row.extend(
                        keys.iter()
                            .map(|key| CellValue::from(stat_value(&table.row_stats(key), stat))),
                    );
                    ws.push_row(row);
                }

                if with_p_values {
                    let mut row = lead(P_VALUE_ROW.into());
                    row.extend(
                        keys.iter()
                            .map(|key| CellValue::from(table.p_values.get(key).copied())),
                    );
                    ws.push_row(row);
                }
            }
        }
        ws
    }

    /// Write `data.xlsx`: raw values, baseline ratios and control ratios with p-values.
    pub fn write_data(
        path: &Path,
        raw: &Measurements,
        baseline: &RatioTable,
        control: &RatioTable,
    ) -> Result<(), XlsxError> {
        let mut wb = Workbook::new();
        wb.add_worksheet(Self::raw_sheet(raw))?;
        wb.add_worksheet(Self::ratio_sheet(BASELINE_SHEET, baseline, false))?;
        wb.add_worksheet(Self::ratio_sheet(CONTROL_SHEET, control, true))?;
        wb.save(path)
    }

    /// Mean rows then stdev rows per device, one column per interval.
    pub fn plot_data_sheet(table: &RatioTable, key: &str) -> Worksheet {
        let mut header = vec!["statistic".to_string(), "device".to_string()];
        header.extend(table.intervals.iter().cloned());
        let mut ws = Worksheet::with_header(&format!("{}_Data", key), &header);

        for stat in ["mean", "stdev"] {
            for device in &table.devices {
                let mut row: Vec<CellValue> = vec![stat.into(), device.as_str().into()];
                row.extend(table.intervals.iter().map(|interval| {
                    let stats = table.row_stats(&SeriesKey::new(key, device, interval));
                    CellValue::from(stat_value(&stats, stat))
                }));
                ws.push_row(row);
            }
        }
        ws
    }

    /// Line chart over the rows of [`Self::plot_data_sheet`].
    pub fn plot_chart(table: &RatioTable, key: &str, data_sheet: &str) -> Chartsheet {
        let n_dev = table.devices.len();
        let last_col = 1 + table.intervals.len();

        let series = (0..n_dev)
            .map(|i| ChartSeries {
                name: SheetRange::cell(data_sheet, 1 + i, 1),
                categories: SheetRange::new(data_sheet, 0, 2, 0, last_col),
                values: SheetRange::new(data_sheet, 1 + i, 2, 1 + i, last_col),
                error_bars: Some(SheetRange::new(
                    data_sheet,
                    1 + n_dev + i,
                    2,
                    1 + n_dev + i,
                    last_col,
                )),
            })
            .collect();

        let title = relative_title(key);
        Chartsheet::new(
            &format!("{} Line", key),
            LineChart {
                title: title.clone(),
                y_axis_title: title,
                y_min: Some(0.0),
                series,
            },
        )
    }

    /// Write `plots.xlsx`. Keys absent from the table are skipped; returns the
    /// keys written. Nothing is written when no key is present.
    pub fn write_plots(
        path: &Path,
        table: &RatioTable,
        plot_keys: &[String],
    ) -> Result<Vec<String>, XlsxError> {
        let mut wb = Workbook::new();
        let mut written = Vec::new();

        for key in plot_keys {
            if !table.has_field(key) {
                warn!(key = %key, "plot key is not a numeric field, skipping");
                continue;
            }
            let data = Self::plot_data_sheet(table, key);
            let chart = Self::plot_chart(table, key, &data.name);
            wb.add_worksheet(data)?;
            wb.add_chartsheet(chart)?;
            written.push(key.clone());
        }

        if !written.is_empty() {
            debug!(sheets = ?wb.sheet_names(), "saving plots workbook");
            wb.save(path)?;
        }
        Ok(written)
    }

    /// Mean ± stdev per device over the intervals, for PNG output.
    pub fn interval_chart(table: &RatioTable, key: &str) -> IntervalChart {
        let series = table
            .devices
            .iter()
            .map(|device| {
                let stats: Vec<SummaryStats> = table
                    .intervals
                    .iter()
                    .map(|interval| table.row_stats(&SeriesKey::new(key, device, interval)))
                    .collect();
                IntervalSeries {
                    label: device.clone(),
                    means: stats.iter().map(|s| Some(s.mean).filter(|v| v.is_finite())).collect(),
                    errors: stats.iter().map(|s| Some(s.stdev).filter(|v| v.is_finite())).collect(),
                }
            })
            .collect();

        let title = relative_title(key);
        IntervalChart {
            title: title.clone(),
            y_label: title,
            categories: table.intervals.clone(),
            series,
            size: (800, 600),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{Normalizer, TTestKind};
    use std::collections::{BTreeMap, HashMap};
    use std::io::Read;

    const LEN: &str = "Total Vessels Length";
    const JUNC: &str = "Total Number of Junctions";

    fn measurements() -> Measurements {
        let mut values: HashMap<SeriesKey, BTreeMap<u32, f64>> = HashMap::new();
        let data = [
            ("Control", "0hr", [10.0, 20.0]),
            ("Control", "24hr", [20.0, 30.0]),
            ("Drug", "0hr", [5.0, 10.0]),
            ("Drug", "24hr", [15.0, 10.0]),
        ];
        for (device, interval, wells) in data {
            for field in [LEN, JUNC] {
                let map = wells.iter().enumerate().map(|(w, v)| (w as u32, *v)).collect();
                values.insert(SeriesKey::new(field, device, interval), map);
            }
        }
        Measurements {
            fields: vec![LEN.to_string(), JUNC.to_string()],
            devices: vec!["Control".into(), "Drug".into()],
            intervals: vec!["0hr".into(), "24hr".into()],
            n_wells: 2,
            values,
        }
    }

    fn baseline() -> RatioTable {
        let mut table = Normalizer::to_baseline(&measurements(), "0hr").unwrap();
        Normalizer::calc_stats(&mut table);
        table
    }

    #[test]
    fn raw_sheet_has_row_per_well() {
        let ws = ReportWriter::raw_sheet(&measurements());
        let rows = ws.rows();
        assert_eq!(rows.len(), 1 + 2 * 2 * 2);
        assert_eq!(rows[0][3], CellValue::Text(LEN.into()));
        assert_eq!(
            rows[1],
            vec!["Control".into(), "0hr".into(), CellValue::Number(0.0), 10.0.into(), 10.0.into()]
        );
    }

    #[test]
    fn ratio_sheet_blocks_end_with_stats() {
        let ws = ReportWriter::ratio_sheet(BASELINE_SHEET, &baseline(), false);
        let rows = ws.rows();
        // header + 4 blocks of (2 wells + 3 stats)
        assert_eq!(rows.len(), 1 + 4 * 5);
        assert_eq!(rows[3][2], CellValue::Text("mean".into()));
        assert_eq!(rows[3][3], CellValue::Number(1.0));
        assert_eq!(rows[5][2], CellValue::Text("stErr".into()));
        // Control/24hr wells: 20/10, 30/20
        assert_eq!(rows[6][3], CellValue::Number(2.0));
        assert_eq!(rows[7][3], CellValue::Number(1.5));
    }

    #[test]
    fn control_sheet_has_p_value_row() {
        let mut table = Normalizer::to_control(&measurements(), "Control").unwrap();
        Normalizer::calc_stats(&mut table);
        Normalizer::t_test(&mut table, "Control", TTestKind::Student);
        let ws = ReportWriter::ratio_sheet(CONTROL_SHEET, &table, true);
        let rows = ws.rows();
        assert_eq!(rows.len(), 1 + 4 * 6);
        assert_eq!(rows[6][2], CellValue::Text(P_VALUE_ROW.into()));
        assert!(matches!(rows[6][3], CellValue::Number(p) if (p - 1.0).abs() < 1e-12));
    }

    #[test]
    fn plot_sheet_layout_matches_chart_refs() {
        let table = baseline();
        let ws = ReportWriter::plot_data_sheet(&table, LEN);
        let rows = ws.rows();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[1][0], CellValue::Text("mean".into()));
        assert_eq!(rows[3][0], CellValue::Text("stdev".into()));
        assert_eq!(rows[3][1], CellValue::Text("Control".into()));

        let chart = ReportWriter::plot_chart(&table, LEN, &ws.name);
        assert_eq!(chart.name, "Total Vessels Length Line");
        let drug = &chart.chart.series[1];
        assert_eq!(drug.name.formula(), "'Total Vessels Length_Data'!$B$3");
        assert_eq!(drug.values.formula(), "'Total Vessels Length_Data'!$C$3:$D$3");
        assert_eq!(
            drug.error_bars.as_ref().unwrap().formula(),
            "'Total Vessels Length_Data'!$C$5:$D$5"
        );
        assert_eq!(chart.chart.title, "Total Vessels Length Relative to Control");
    }

    #[test]
    fn plots_workbook_skips_missing_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("plots.xlsx");
        let keys = vec![LEN.to_string(), "Total Number of End Points".to_string()];
        let written = ReportWriter::write_plots(&path, &baseline(), &keys).unwrap();
        assert_eq!(written, vec![LEN.to_string()]);

        let mut archive = zip::ZipArchive::new(std::fs::File::open(&path).unwrap()).unwrap();
        let mut workbook = String::new();
        archive
            .by_name("xl/workbook.xml")
            .unwrap()
            .read_to_string(&mut workbook)
            .unwrap();
        assert!(workbook.contains("Total Vessels Length_Data"));
        assert!(!workbook.contains("End Points"));
    }

    #[test]
    fn no_plot_keys_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("plots.xlsx");
        let written = ReportWriter::write_plots(&path, &baseline(), &["Nope".to_string()]).unwrap();
        assert!(written.is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn interval_chart_uses_baseline_means() {
        let chart = ReportWriter::interval_chart(&baseline(), LEN);
        assert_eq!(chart.categories, vec!["0hr", "24hr"]);
        assert_eq!(chart.series[0].label, "Control");
        assert_eq!(chart.series[0].means, vec![Some(1.0), Some(1.75)]);
        assert_eq!(chart.series[0].errors[0], Some(0.0));
    }
}
