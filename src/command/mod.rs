use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};

use crate::config::Settings;
use crate::logging::{init_logging, LogFormat};

use self::{angiotool::AngioToolArg, force::ForceArg, scatter::ScatterArg};

mod angiotool;
mod force;
mod scatter;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None, propagate_version = true)]
pub struct CommandArgs {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Human, global = true)]
    log_format: LogFormat,
    /// JSON settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Plot force and voltage against displacement from a sensor log
    Force(#[clap(flatten)] ForceArg),
    /// Scatter plot of two-column data files
    Scatter(#[clap(flatten)] ScatterArg),
    /// Aggregate AngioTool exports of an experiment into workbooks and plots
    #[command(name = "angiotool")]
    AngioTool(#[clap(flatten)] AngioToolArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    init_logging(args.log_format, args.verbose);

    let settings = Settings::load(args.config.as_deref()).context("failed to load settings")?;

    let written = match &args.mode {
        Mode::Force(arg) => vec![force::run(arg, &settings.force_plot)?],
        Mode::Scatter(arg) => scatter::run(arg, &settings.scatter)?,
        Mode::AngioTool(arg) => angiotool::run(arg, &settings.angiotool)?,
    };
    for path in written {
        println!("written: {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_valid() {
        CommandArgs::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let args =
            CommandArgs::try_parse_from(["data-plotting", "force", "log.txt", "-vv", "--log-format", "json"])
                .unwrap();
        assert_eq!(args.verbose, 2);
        assert_eq!(args.log_format, LogFormat::Json);
        assert!(matches!(args.mode, Mode::Force(_)));
    }

    #[test]
    fn scatter_needs_a_path() {
        assert!(CommandArgs::try_parse_from(["data-plotting", "scatter"]).is_err());
    }

    #[test]
    fn angiotool_rejects_missing_root() {
        let err = CommandArgs::try_parse_from(["data-plotting", "angiotool", "/no/such/experiment"])
            .unwrap_err();
        assert!(err.to_string().contains("is not a directory"));
    }

    #[test]
    fn subcommands_print_version() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().to_str().unwrap();
        let err = CommandArgs::try_parse_from(["data-plotting", "angiotool", root, "--version"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }
}
