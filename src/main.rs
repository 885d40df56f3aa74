//! Data Plotting - sensor log plots and AngioTool experiment aggregation
//!
//! A command line tool that turns lab measurement files into PNG charts and
//! Excel workbooks.

mod charts;
mod command;
mod config;
mod data;
mod logging;
mod report;
mod stats;
mod xlsx;

fn main() -> anyhow::Result<()> {
    command::run()
}
