use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::info;

use crate::charts::ChartRenderer;
use crate::config::AngioToolSettings;
use crate::data::{DataProcessor, Experiment, Measurements};
use crate::report::ReportWriter;
use crate::stats::{Normalizer, TTestKind};

const EXCEL_DIR: &str = "excel";
const PLOTS_DIR: &str = "plots";
const DATA_WORKBOOK: &str = "data.xlsx";
const PLOTS_WORKBOOK: &str = "plots.xlsx";

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct AngioToolArg {
    /// Experiment directory holding one sub-directory per device
    #[arg(value_name = "EXPROOTPATH", value_parser = experiment_dir)]
    root: PathBuf,
    /// Device every other device is compared against
    #[arg(long)]
    control: Option<String>,
    /// Interval the wells are normalised to (default: the first interval)
    #[arg(long)]
    baseline: Option<String>,
    /// Use Welch's t-test instead of Student's
    #[arg(long)]
    welch: bool,
    /// Skip the PNG plots
    #[arg(long)]
    no_png: bool,
}

/// Replace a leading `~` with the home directory.
fn expand_user(raw: &str) -> PathBuf {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    match (raw.strip_prefix('~'), home) {
        (Some(""), Some(home)) => home,
        (Some(rest), Some(home)) if rest.starts_with('/') => home.join(&rest[1..]),
        _ => PathBuf::from(raw),
    }
}

fn experiment_dir(raw: &str) -> Result<PathBuf, String> {
    let path = std::path::absolute(expand_user(raw)).map_err(|e| format!("{}: {}", raw, e))?;
    if path.is_dir() {
        Ok(path)
    } else {
        Err(format!("{} is not a directory", raw))
    }
}

/// Key of a plot as a file name.
fn png_name(key: &str) -> String {
    let name: String = key
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    format!("{}.png", name)
}

pub(crate) fn run(arg: &AngioToolArg, settings: &AngioToolSettings) -> anyhow::Result<Vec<PathBuf>> {
    let mut settings = settings.clone();
    if let Some(control) = &arg.control {
        settings.control = control.clone();
    }
    if arg.baseline.is_some() {
        settings.baseline = arg.baseline.clone();
    }
    if arg.welch {
        settings.t_test = TTestKind::Welch;
    }
    if arg.no_png {
        settings.render_png = false;
    }
    process(&arg.root, &settings)
}

/// Aggregate an experiment and write its workbooks (and plots).
pub(crate) fn process(root: &Path, settings: &AngioToolSettings) -> anyhow::Result<Vec<PathBuf>> {
    let experiment = Experiment::discover(root, &settings.excluded_dirs)?;
    info!(
        devices = experiment.devices.len(),
        intervals = experiment.intervals.len(),
        "found interval workbooks"
    );

    let frames = experiment.load_frames(settings.header_row)?;
    let fields = DataProcessor::shared_numeric_fields(&frames);
    anyhow::ensure!(
        !fields.is_empty(),
        "no column is numeric in every workbook under {}",
        root.display()
    );
    info!(fields = fields.len(), "kept numeric fields");

    let long = DataProcessor::stack_to_long(&frames, &fields)?;
    let long = DataProcessor::clamp_non_positive(&long, &settings.clamp_fields)?;
    let raw = Measurements::from_long(&long, &fields)?;
    info!(values = long.height(), wells = raw.n_wells, "indexed measurements");

    let baseline = settings
        .baseline
        .clone()
        .or_else(|| raw.intervals.first().cloned())
        .context("experiment has no intervals")?;
    let mut by_baseline = Normalizer::to_baseline(&raw, &baseline)?;
    info!(baseline = %baseline, "normalised to baseline interval");
    let mut by_control = Normalizer::to_control(&raw, &settings.control)?;
    info!(control = %settings.control, "normalised to control mean");

    Normalizer::calc_stats(&mut by_baseline);
    Normalizer::calc_stats(&mut by_control);
    let significant = Normalizer::t_test(&mut by_control, &settings.control, settings.t_test);
    info!(
        tests = by_control.p_values.len(),
        significant,
        kind = ?settings.t_test,
        "t-tests done"
    );

    let excel_dir = root.join(EXCEL_DIR);
    fs::create_dir_all(&excel_dir)
        .with_context(|| format!("failed to create {}", excel_dir.display()))?;

    let mut written = Vec::new();
    let data_path = excel_dir.join(DATA_WORKBOOK);
    ReportWriter::write_data(&data_path, &raw, &by_baseline, &by_control)
        .with_context(|| format!("failed to write {}", data_path.display()))?;
    written.push(data_path);

    let plots_path = excel_dir.join(PLOTS_WORKBOOK);
    let keys = ReportWriter::write_plots(&plots_path, &by_baseline, &settings.plot_keys)
        .with_context(|| format!("failed to write {}", plots_path.display()))?;
    if !keys.is_empty() {
        written.push(plots_path);
    }
    info!(plots = keys.len(), "wrote workbooks");

    if settings.render_png && !keys.is_empty() {
        let plots_dir = root.join(PLOTS_DIR);
        fs::create_dir_all(&plots_dir)
            .with_context(|| format!("failed to create {}", plots_dir.display()))?;
        for key in &keys {
            let path = plots_dir.join(png_name(key));
            ChartRenderer::render_intervals(&ReportWriter::interval_chart(&by_baseline, key), &path)?;
            written.push(path);
        }
    }

    Ok(written)
}
