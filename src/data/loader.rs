//! Sensor Log Loader Module
//! Handles whitespace-delimited measurement files and column extraction using Polars.

use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Line {line}: column {column} is missing")]
    MissingColumn { line: usize, column: usize },
    #[error("Line {line}: column {column} holds non-numeric value {token:?}")]
    BadToken {
        line: usize,
        column: usize,
        token: String,
    },
    #[error("No data loaded")]
    NoData,
}

/// Parsing rules for a delimited text file.
#[derive(Debug, Clone, Copy)]
pub struct TextFormat {
    /// Leading lines to drop before any parsing.
    pub skip_rows: usize,
    /// Treat everything after `#` as a comment.
    pub comments: bool,
}

impl TextFormat {
    /// Space-delimited logger output with two header lines.
    pub const fn sensor_log(skip_rows: usize) -> Self {
        Self {
            skip_rows,
            comments: false,
        }
    }

    /// Plain numeric matrix: `#` comments and blank lines ignored.
    pub const fn numeric_matrix() -> Self {
        Self {
            skip_rows: 0,
            comments: true,
        }
    }
}

/// Loads whitespace-delimited files into a DataFrame of positional text columns
/// (`c0`, `c1`, ...). Typed numeric columns are produced by [`SensorLog::select`].
pub struct SensorLog {
    df: Option<DataFrame>,
    file_path: Option<PathBuf>,
    /// 1-based source line of every DataFrame row.
    line_numbers: Vec<usize>,
}

impl Default for SensorLog {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorLog {
    pub fn new() -> Self {
        Self {
            df: None,
            file_path: None,
            line_numbers: Vec::new(),
        }
    }

    /// Name of the positional column at `index`.
    pub fn column_name(index: usize) -> String {
        format!("c{}", index)
    }

    /// Load a file from disk.
    pub fn load(&mut self, path: &Path, format: TextFormat) -> Result<&DataFrame, LoaderError> {
        let text = fs::read_to_string(path).map_err(|source| LoaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.file_path = Some(path.to_path_buf());
        self.parse(&text, format)
    }

    /// Parse already-read text.
    pub fn parse(&mut self, text: &str, format: TextFormat) -> Result<&DataFrame, LoaderError> {
        let mut rows: Vec<Vec<&str>> = Vec::new();
        let mut line_numbers = Vec::new();

        for (idx, raw) in text.lines().enumerate().skip(format.skip_rows) {
            let line = if format.comments {
                raw.split('#').next().unwrap_or_default()
            } else {
                raw
            };
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.is_empty() {
                continue;
            }
            rows.push(tokens);
            line_numbers.push(idx + 1);
        }

        if rows.is_empty() {
            return Err(LoaderError::NoData);
        }

        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        let columns: Vec<Column> = (0..width)
            .map(|c| {
                let values: Vec<Option<String>> = rows
                    .iter()
                    .map(|r| r.get(c).map(|t| t.to_string()))
                    .collect();
                Column::new(Self::column_name(c).into(), values)
            })
            .collect();

        self.df = Some(DataFrame::new(columns)?);
        self.line_numbers = line_numbers;
        self.df.as_ref().ok_or(LoaderError::NoData)
    }

    /// Extract positional columns as named Float64 columns.
    ///
    /// Every row must carry a numeric token in each requested position.
    pub fn select(&self, picks: &[(usize, &str)]) -> Result<DataFrame, LoaderError> {
        let df = self.df.as_ref().ok_or(LoaderError::NoData)?;
        let first_line = self.line_numbers.first().copied().unwrap_or(1);

        let mut columns = Vec::with_capacity(picks.len());
        for &(index, name) in picks {
            let source = df
                .column(&Self::column_name(index))
                .map_err(|_| LoaderError::MissingColumn {
                    line: first_line,
                    column: index,
                })?;
            let text = source.str()?;

            let mut values = Vec::with_capacity(df.height());
            for (row, token) in text.into_iter().enumerate() {
                let line = self.line_numbers.get(row).copied().unwrap_or(row + 1);
                let token = token.ok_or(LoaderError::MissingColumn {
                    line,
                    column: index,
                })?;
                let value = token.parse::<f64>().map_err(|_| LoaderError::BadToken {
                    line,
                    column: index,
                    token: token.to_string(),
                })?;
                values.push(value);
            }
            columns.push(Column::new(name.into(), values));
        }

        Ok(DataFrame::new(columns)?)
    }

    /// Get the values of a Float64 column from a selected DataFrame.
    pub fn column_values(df: &DataFrame, name: &str) -> Result<Vec<f64>, LoaderError> {
        let values = df.column(name)?.cast(&DataType::Float64)?;
        Ok(values.f64()?.into_iter().flatten().collect())
    }

    /// Get the number of rows in the DataFrame.
    pub fn get_row_count(&self) -> usize {
        self.df.as_ref().map(|df| df.height()).unwrap_or(0)
    }

    /// Get file path.
    pub fn get_file_path(&self) -> Option<&PathBuf> {
        self.file_path.as_ref()
    }
}
