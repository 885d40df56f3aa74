//! AngioTool Experiment Module
//! Discovers device/interval workbooks under an experiment root and reads them
//! into per-sheet DataFrames.

use super::natural::natsort;
use super::processor::DeviceFrame;
use calamine::{open_workbook, open_workbook_auto, Data, Range, Reader, Xlsx};
use polars::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum AngioToolError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error(
        "The program has stopped because there's an excel file missing.\n\
         The total number of files for the devices ({files}) does not equal the devices ({devices})\n\
         multiplied by the intervals ({intervals}). Please place a dummy file in the\n\
         appropriate directory. Missing: {missing}"
    )]
    MissingFile {
        files: usize,
        devices: usize,
        intervals: usize,
        missing: String,
    },
    #[error("No device directories found under {0}")]
    NoDevices(PathBuf),
    #[error("{path}: header row {row} not found")]
    NoHeader { path: PathBuf, row: usize },
    #[error("{path}: workbook has no sheets")]
    NoSheet { path: PathBuf },
}

/// One interval workbook of one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalFile {
    pub device: String,
    pub interval: String,
    pub path: PathBuf,
}

/// The device × interval layout of an experiment directory.
#[derive(Debug, Clone)]
pub struct Experiment {
    pub devices: Vec<String>,
    pub intervals: Vec<String>,
    /// Device-major, interval-minor, both in natural order.
    pub files: Vec<IntervalFile>,
}

/// A spreadsheet cell after reading.
#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Number(f64),
    Text(String),
    Missing,
}

impl Cell {
    fn from_text(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() || s == "NA" {
            Cell::Missing
        } else if let Ok(v) = s.parse::<f64>() {
            Cell::Number(v)
        } else {
            Cell::Text(s.to_string())
        }
    }

    fn from_data(d: &Data) -> Self {
        match d {
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::Bool(b) => Cell::Text(b.to_string()),
            Data::String(s) => Cell::from_text(s),
            Data::Empty => Cell::Missing,
            other => Cell::Text(other.to_string()),
        }
    }

    fn header_text(&self, index: usize) -> String {
        match self {
            Cell::Number(v) => v.to_string(),
            Cell::Text(s) => s.clone(),
            Cell::Missing => format!("Unnamed: {}", index),
        }
    }
}

fn is_interval_file(name: &str) -> bool {
    name.ends_with(".xls") && !name.ends_with("data.xls")
}

fn read_dir(path: &Path) -> Result<fs::ReadDir, AngioToolError> {
    fs::read_dir(path).map_err(|source| AngioToolError::Io {
        path: path.to_path_buf(),
        source,
    })
}

impl Experiment {
    /// Scan `root` for device directories and their interval workbooks.
    pub fn discover(root: &Path, excluded_dirs: &[String]) -> Result<Self, AngioToolError> {
        let mut devices = Vec::new();
        for entry in read_dir(root)? {
            let entry = entry.map_err(|source| AngioToolError::Io {
                path: root.to_path_buf(),
                source,
            })?;
            if !entry.path().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if excluded_dirs.iter().any(|d| d == &name) {
                debug!(dir = %name, "skipping output directory");
                continue;
            }
            devices.push(name);
        }
        if devices.is_empty() {
            return Err(AngioToolError::NoDevices(root.to_path_buf()));
        }
        natsort(&mut devices);

        let mut found: HashMap<(String, String), PathBuf> = HashMap::new();
        let mut interval_set: BTreeSet<String> = BTreeSet::new();
        for device in &devices {
            let dir = root.join(device);
            for entry in read_dir(&dir)? {
                let entry = entry.map_err(|source| AngioToolError::Io {
                    path: dir.clone(),
                    source,
                })?;
                let path = entry.path();
                let name = entry.file_name().to_string_lossy().to_string();
                if !path.is_file() || !is_interval_file(&name) {
                    continue;
                }
                let interval = name.strip_suffix(".xls").unwrap_or(&name).to_string();
                interval_set.insert(interval.clone());
                found.insert((device.clone(), interval), path);
            }
        }

        let mut intervals: Vec<String> = interval_set.into_iter().collect();
        natsort(&mut intervals);

        let mut files = Vec::with_capacity(devices.len() * intervals.len());
        let mut missing = Vec::new();
        for device in &devices {
            for interval in &intervals {
                match found.get(&(device.clone(), interval.clone())) {
                    Some(path) => files.push(IntervalFile {
                        device: device.clone(),
                        interval: interval.clone(),
                        path: path.clone(),
                    }),
                    None => missing.push(format!("{}/{}.xls", device, interval)),
                }
            }
        }

        if !missing.is_empty() || found.len() != devices.len() * intervals.len() {
            return Err(AngioToolError::MissingFile {
                files: found.len(),
                devices: devices.len(),
                intervals: intervals.len(),
                missing: missing.join(", "),
            });
        }

        Ok(Self {
            devices,
            intervals,
            files,
        })
    }

    /// Read every interval workbook.
    pub fn load_frames(&self, header_row: usize) -> Result<Vec<DeviceFrame>, AngioToolError> {
        self.files
            .iter()
            .map(|file| {
                let df = read_workbook(&file.path, header_row)?;
                debug!(
                    device = %file.device,
                    interval = %file.interval,
                    wells = df.height(),
                    "read workbook"
                );
                Ok(DeviceFrame {
                    interval: file.interval.clone(),
                    device: file.device.clone(),
                    df,
                })
            })
            .collect()
    }
}

/// Read the first sheet of an AngioTool export into a DataFrame.
///
/// Row `header_row` names the columns and every later non-empty row is a well.
/// Files that are not binary workbooks are read as tab-separated text.
pub fn read_workbook(path: &Path, header_row: usize) -> Result<DataFrame, AngioToolError> {
    let rows = match read_spreadsheet_rows(path) {
        Ok(Some(rows)) => rows,
        Ok(None) => {
            return Err(AngioToolError::NoSheet {
                path: path.to_path_buf(),
            })
        }
        Err(err) => {
            debug!(path = %path.display(), error = %err, "not a workbook, reading as tab-separated text");
            read_text_rows(path)?
        }
    };
    rows_to_dataframe(path, rows, header_row)
}

fn read_spreadsheet_rows(path: &Path) -> Result<Option<Vec<Vec<Cell>>>, calamine::Error> {
    match open_workbook_auto(path) {
        Ok(mut workbook) => first_sheet_rows(&mut workbook),
        Err(err) => {
            // ".xls" exports are sometimes OOXML packages
            let Ok(mut workbook) = open_workbook::<Xlsx<_>, _>(path) else {
                return Err(err);
            };
            first_sheet_rows(&mut workbook).map_err(calamine::Error::from)
        }
    }
}

fn first_sheet_rows<RS, R>(workbook: &mut R) -> Result<Option<Vec<Vec<Cell>>>, R::Error>
where
    RS: Read + Seek,
    R: Reader<RS>,
{
    let Some(range) = workbook.worksheet_range_at(0) else {
        return Ok(None);
    };
    Ok(Some(absolute_rows(&range?)))
}

/// Rows addressed from A1. calamine ranges start at the first used cell, so
/// leading blank rows and columns are filled back in as missing cells.
fn absolute_rows(range: &Range<Data>) -> Vec<Vec<Cell>> {
    let Some((end_row, end_col)) = range.end() else {
        return Vec::new();
    };
    (0..=end_row)
        .map(|r| {
            (0..=end_col)
                .map(|c| range.get_value((r, c)).map_or(Cell::Missing, Cell::from_data))
                .collect()
        })
        .collect()
}

fn read_text_rows(path: &Path) -> Result<Vec<Vec<Cell>>, AngioToolError> {
    let text = fs::read_to_string(path).map_err(|source| AngioToolError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_text_rows(&text))
}

fn parse_text_rows(text: &str) -> Vec<Vec<Cell>> {
    text.lines()
        .map(|line| line.split('\t').map(Cell::from_text).collect())
        .collect()
}

fn rows_to_dataframe(
    path: &Path,
    rows: Vec<Vec<Cell>>,
    header_row: usize,
) -> Result<DataFrame, AngioToolError> {
    let header = rows.get(header_row).ok_or_else(|| AngioToolError::NoHeader {
        path: path.to_path_buf(),
        row: header_row,
    })?;
    let names: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(i, c)| c.header_text(i))
        .collect();

    let body: Vec<&Vec<Cell>> = rows
        .iter()
        .skip(header_row + 1)
        .filter(|r| r.iter().any(|c| *c != Cell::Missing))
        .collect();

    let mut columns = Vec::with_capacity(names.len());
    let mut seen: HashMap<String, usize> = HashMap::new();
    for (idx, name) in names.iter().enumerate() {
        let cells: Vec<&Cell> = body
            .iter()
            .map(|r| r.get(idx).unwrap_or(&Cell::Missing))
            .collect();

        // duplicate headers get a ".1", ".2" suffix
        let count = seen.entry(name.clone()).or_insert(0);
        let unique = if *count == 0 {
            name.clone()
        } else {
            format!("{}.{}", name, count)
        };
        *count += 1;

        let numeric = cells.iter().all(|c| !matches!(c, Cell::Text(_)));
        if numeric {
            let values: Vec<Option<f64>> = cells
                .iter()
                .map(|c| match c {
                    Cell::Number(v) => Some(*v),
                    _ => None,
                })
                .collect();
            columns.push(Column::new(unique.into(), values));
        } else {
            let values: Vec<Option<String>> = cells
                .iter()
                .map(|c| match c {
                    Cell::Number(v) => Some(v.to_string()),
                    Cell::Text(s) => Some(s.clone()),
                    Cell::Missing => None,
                })
                .collect();
            columns.push(Column::new(unique.into(), values));
        }
    }

    Ok(DataFrame::new(columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xlsx::{CellValue, Workbook, Worksheet};
    use std::fs;

    const SHEET: &str = "AngioTool Report\n\
\n\
Image Name\tVessels percentage area\tTotal Number of Junctions\tTotal Vessels Length\n\
w1.tif\t12.5\t40\t1000\n\
w2.tif\tNA\t0\t900\n\
\t\t\t\n";

    fn write(dir: &Path, rel: &str, text: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    /// AngioTool layout as a real workbook, with a blank first row and column.
    fn write_xlsx(path: &Path) {
        let mut ws = Worksheet::new("Sheet1");
        ws.push_row(vec![]);
        ws.push_row(vec![CellValue::Empty, "AngioTool Report".into()]);
        ws.push_row(vec![
            CellValue::Empty,
            "Image Name".into(),
            "Total Vessels Length".into(),
            "Junctions density".into(),
            "Notes".into(),
        ]);
        ws.push_row(vec![CellValue::Empty, "w0.tif".into(), 100.0.into(), "NA".into(), 1.0.into()]);
        ws.push_row(vec![CellValue::Empty, "w1.tif".into(), 90.5.into(), 0.25.into(), "dim".into()]);
        let mut wb = Workbook::new();
        wb.add_worksheet(ws).unwrap();
        wb.save(path).unwrap();
    }

    fn floats(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
        df.column(name).unwrap().f64().unwrap().into_iter().collect()
    }

    #[test]
    fn workbook_header_row_counts_from_a1() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("0hr.xlsx");
        write_xlsx(&path);

        let df = read_workbook(&path, 2).unwrap();
        assert_eq!(df.height(), 2);
        let names: Vec<String> = df.get_column_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(
            names,
            vec!["Unnamed: 0", "Image Name", "Total Vessels Length", "Junctions density", "Notes"]
        );
        assert_eq!(floats(&df, "Total Vessels Length"), vec![Some(100.0), Some(90.5)]);
        assert_eq!(floats(&df, "Junctions density"), vec![None, Some(0.25)]);
        assert_eq!(df.column("Notes").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("Image Name").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn workbook_with_xls_name_is_still_read_as_workbook() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("24hr.xls");
        write_xlsx(&path);

        let df = read_workbook(&path, 2).unwrap();
        assert_eq!(floats(&df, "Total Vessels Length"), vec![Some(100.0), Some(90.5)]);
    }

    #[test]
    fn interval_suffix_is_removed_once() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "Control/0hr.xls.xls", SHEET);
        let exp = Experiment::discover(tmp.path(), &[]).unwrap();
        assert_eq!(exp.intervals, vec!["0hr.xls"]);
    }

    #[test]
    fn interval_file_filter() {
        assert!(is_interval_file("0hr.xls"));
        assert!(!is_interval_file("data.xls"));
        assert!(!is_interval_file("rawdata.xls"));
        assert!(!is_interval_file("0hr.xlsx"));
    }

    #[test]
    fn text_sheet_reads_header_row_and_wells() {
        let rows = parse_text_rows(SHEET);
        let df = rows_to_dataframe(Path::new("t.xls"), rows, 2).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.column("Image Name").unwrap().dtype(), &DataType::String);
        let area = df.column("Vessels percentage area").unwrap();
        assert_eq!(area.dtype(), &DataType::Float64);
        assert_eq!(area.null_count(), 1);
    }

    #[test]
    fn missing_header_row_is_an_error() {
        let rows = parse_text_rows("only one line\n");
        let err = rows_to_dataframe(Path::new("t.xls"), rows, 2).unwrap_err();
        assert!(matches!(err, AngioToolError::NoHeader { row: 2, .. }));
    }

    #[test]
    fn discover_orders_devices_and_intervals() {
        let tmp = tempfile::tempdir().unwrap();
        for device in ["Control", "Device10", "Device2"] {
            for interval in ["24hr", "0hr", "2hr"] {
                write(tmp.path(), &format!("{device}/{interval}.xls"), SHEET);
            }
        }
        write(tmp.path(), "excel/data.xls", "");
        write(tmp.path(), "plots/x.xls", "");
        write(tmp.path(), "Control/data.xls", "");

        let exp = Experiment::discover(tmp.path(), &["plots".into(), "excel".into()]).unwrap();
        assert_eq!(exp.devices, vec!["Control", "Device2", "Device10"]);
        assert_eq!(exp.intervals, vec!["0hr", "2hr", "24hr"]);
        assert_eq!(exp.files.len(), 9);
        assert_eq!(exp.files[1].device, "Control");
        assert_eq!(exp.files[1].interval, "2hr");
    }

    #[test]
    fn discover_aborts_on_missing_interval_file() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "Control/0hr.xls", SHEET);
        write(tmp.path(), "Control/24hr.xls", SHEET);
        write(tmp.path(), "Drug/0hr.xls", SHEET);

        let err = Experiment::discover(tmp.path(), &[]).unwrap_err();
        match err {
            AngioToolError::MissingFile {
                files,
                devices,
                intervals,
                missing,
            } => {
                assert_eq!((files, devices, intervals), (3, 2, 2));
                assert_eq!(missing, "Drug/24hr.xls");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn load_frames_falls_back_to_text() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "Control/0hr.xls", SHEET);
        let exp = Experiment::discover(tmp.path(), &[]).unwrap();
        let frames = exp.load_frames(2).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].df.height(), 2);
    }
}
