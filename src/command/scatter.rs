use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use tracing::{debug, info};

use crate::charts::{ChartRenderer, ScatterChart, ScatterStyle, XySeries};
use crate::config::ScatterSettings;
use crate::data::{natural_cmp, SensorLog, TextFormat};

const OVERLAY_OUTPUT: &str = "overlay.png";

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ScatterArg {
    /// Data files, or directories to search recursively
    #[arg(required = true)]
    paths: Vec<PathBuf>,
    /// Draw every file into one plot
    #[arg(long)]
    overlay: bool,
    /// Output PNG (overlay, or a single input file)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn walk(dir: &Path, files: &mut Vec<PathBuf>) -> anyhow::Result<()> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))?;
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to list {}", dir.display()))?
            .path();
        if path.is_dir() {
            walk(&path, files)?;
        } else if path.extension().is_some_and(|ext| ext == "png") {
            debug!(file = %path.display(), "skipping image");
        } else if path.is_file() {
            files.push(path);
        }
    }
    Ok(())
}

/// Expand directories into their files in natural order; plain files keep
/// their command-line position.
pub(crate) fn collect_files(paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found = Vec::new();
            walk(path, &mut found)?;
            found.sort_by(|a, b| natural_cmp(&a.to_string_lossy(), &b.to_string_lossy()));
            files.extend(found);
        } else if path.is_file() {
            files.push(path.clone());
        } else {
            bail!("{} does not exist", path.display());
        }
    }
    Ok(files)
}

/// X/Y columns of one numeric data file, labelled with its file name.
pub(crate) fn read_series(path: &Path, settings: &ScatterSettings) -> anyhow::Result<XySeries> {
    let mut log = SensorLog::new();
    log.load(path, TextFormat::numeric_matrix())
        .with_context(|| format!("failed to read {}", path.display()))?;
    let df = log
        .select(&[(settings.x_column, "x"), (settings.y_column, "y")])
        .with_context(|| format!("bad data file {}", path.display()))?;

    let label = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    Ok(XySeries::new(
        &label,
        &SensorLog::column_values(&df, "x")?,
        &SensorLog::column_values(&df, "y")?,
    ))
}

pub(crate) fn run(arg: &ScatterArg, settings: &ScatterSettings) -> anyhow::Result<Vec<PathBuf>> {
    let files = collect_files(&arg.paths)?;
    if files.is_empty() {
        bail!("no data files found");
    }
    info!(files = files.len(), overlay = arg.overlay, "plotting scatter data");

    let size = (settings.width, settings.height);
    if arg.overlay {
        let series = files
            .iter()
            .map(|f| read_series(f, settings))
            .collect::<anyhow::Result<Vec<_>>>()?;
        let output = arg
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(OVERLAY_OUTPUT));
        let chart = ScatterChart {
            title: "Overlay".to_string(),
            style: ScatterStyle::Overlay,
            series,
            y_range: settings.overlay_y_range,
            size,
        };
        ChartRenderer::render_scatter(&chart, &output)?;
        return Ok(vec![output]);
    }

    if arg.output.is_some() && files.len() > 1 {
        bail!("--output needs --overlay or a single input file");
    }

    let mut written = Vec::with_capacity(files.len());
    for file in &files {
        let series = read_series(file, settings)?;
        let output = arg
            .output
            .clone()
            .unwrap_or_else(|| file.with_extension("png"));
        let chart = ScatterChart {
            title: series.label.clone(),
            style: ScatterStyle::Markers,
            series: vec![series],
            y_range: settings.y_range,
            size,
        };
        ChartRenderer::render_scatter(&chart, &output)?;
        written.push(output);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directories_are_walked_in_natural_order() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("run2");
        fs::create_dir(&nested).unwrap();
        for path in [
            tmp.path().join("f10.txt"),
            tmp.path().join("f2.txt"),
            nested.join("a.txt"),
            tmp.path().join("f2.png"),
        ] {
            fs::write(path, "0 1 2\n").unwrap();
        }

        let files = collect_files(&[tmp.path().to_path_buf()]).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|f| f.strip_prefix(tmp.path()).unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["f2.txt", "f10.txt", "run2/a.txt"]);
    }

    #[test]
    fn missing_path_is_an_error() {
        let err = collect_files(&[PathBuf::from("/no/such/file.txt")]).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn series_uses_columns_one_and_two() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("sample.dat");
        fs::write(&file, "# idx x y\n0 -1.5 100\n1 2.5 200 # note\n\n").unwrap();

        let series = read_series(&file, &ScatterSettings::default()).unwrap();
        assert_eq!(series.label, "sample.dat");
        assert_eq!(series.points, vec![(-1.5, 100.0), (2.5, 200.0)]);
    }

    #[test]
    fn unparsable_file_names_itself() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("bad.dat");
        fs::write(&file, "0 1 x\n").unwrap();

        let err = read_series(&file, &ScatterSettings::default()).unwrap_err();
        assert!(err.to_string().contains("bad.dat"));
    }
}
