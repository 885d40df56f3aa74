use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::info;

use crate::charts::{ChartRenderer, DualAxisChart, XySeries, FORCE_COLOR, VOLTAGE_COLOR};
use crate::config::ForcePlotSettings;
use crate::data::{DataProcessor, SensorLog, TextFormat};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ForceArg {
    /// Whitespace-delimited sensor log
    input: PathBuf,
    /// Output PNG path
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// `<stem> force-voltage.png` next to the input.
pub(crate) fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    input.with_file_name(format!("{} force-voltage.png", stem))
}

/// Load the displacement, force and voltage channels of a log.
pub(crate) fn build_chart(input: &Path, settings: &ForcePlotSettings) -> anyhow::Result<DualAxisChart> {
    let mut log = SensorLog::new();
    log.load(input, TextFormat::sensor_log(settings.skip_rows))
        .with_context(|| format!("failed to read sensor log {}", input.display()))?;

    let mut df = log
        .select(&[
            (settings.x.column, "displacement"),
            (settings.left.column, "force"),
            (settings.right.column, "voltage"),
        ])
        .with_context(|| format!("bad sensor log {}", input.display()))?;
    if settings.absolute {
        df = DataProcessor::absolute(&df)?;
    }

    let displacement = SensorLog::column_values(&df, "displacement")?;
    let force = SensorLog::column_values(&df, "force")?;
    let voltage = SensorLog::column_values(&df, "voltage")?;
    info!(
        file = ?log.get_file_path(),
        rows = log.get_row_count(),
        "loaded sensor log"
    );

    Ok(DualAxisChart {
        title: settings.title.clone(),
        x_axis: settings.x.clone(),
        left_axis: settings.left.clone(),
        right_axis: settings.right.clone(),
        left: XySeries::new(&settings.left.label, &displacement, &force),
        right: XySeries::new(&settings.right.label, &displacement, &voltage),
        left_color: FORCE_COLOR,
        right_color: VOLTAGE_COLOR,
        size: (settings.width, settings.height),
    })
}

pub(crate) fn run(arg: &ForceArg, settings: &ForcePlotSettings) -> anyhow::Result<PathBuf> {
    let chart = build_chart(&arg.input, settings)?;
    let output = arg
        .output
        .clone()
        .unwrap_or_else(|| default_output(&arg.input));
    ChartRenderer::render_dual_axis(&chart, &output)?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const LOG: &str = "\
Time Ch0 Ch1 Disp Ch3 Load Ch5 Ch6 Ch7 Volt
s - - mm - N - - - V
0.0 0 0 -0.10 0 1.5 0 0 0 2.0
0.1 0 0 -0.20 0 -3.0 0 0 0 2.5
0.2 0 0  0.30 0 4.5 0 0 0 -3.0
";

    #[test]
    fn default_output_sits_next_to_input() {
        assert_eq!(
            default_output(Path::new("/data/run 1.txt")),
            PathBuf::from("/data/run 1 force-voltage.png")
        );
    }

    #[test]
    fn chart_takes_absolute_channels() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("log.txt");
        fs::write(&input, LOG).unwrap();

        let chart = build_chart(&input, &ForcePlotSettings::default()).unwrap();
        assert_eq!(chart.left.points, vec![(0.1, 1.5), (0.2, 3.0), (0.3, 4.5)]);
        assert_eq!(chart.right.points, vec![(0.1, 2.0), (0.2, 2.5), (0.3, 3.0)]);
        assert_eq!(chart.left.label, "Force (Nm)");
        assert_eq!(chart.size, (800, 600));
        assert_eq!(chart.left_color, FORCE_COLOR);
        assert_eq!(chart.right_color, VOLTAGE_COLOR);
    }

    #[test]
    fn signed_values_survive_without_absolute() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("log.txt");
        fs::write(&input, LOG).unwrap();

        let settings = ForcePlotSettings {
            absolute: false,
            ..Default::default()
        };
        let chart = build_chart(&input, &settings).unwrap();
        assert_eq!(chart.left.points[1], (-0.2, -3.0));
    }

    #[test]
    fn short_row_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("log.txt");
        fs::write(&input, "h\nh\n1 2 3 4 5 6\n").unwrap();

        let err = build_chart(&input, &ForcePlotSettings::default()).unwrap_err();
        assert!(format!("{:#}", err).contains("Line 3"));
    }
}
