#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line entry point for the crash map toolchain.
//!
//! Every subcommand builds a fresh set of filter criteria from its flags,
//! loads the dataset it needs, and prints or writes the result. Without a
//! subcommand, an interactive menu lets the user pick a tool.
//!
//! Uses `indicatif-log-bridge` (via [`crash_map_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and progress bars never fight for the terminal.

mod commands;
mod interactive;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use crash_map_crash_models::DatasetKind;
use crash_map_filter::criteria::RawCriteria;
use crash_map_source::registry::DATA_DIR_ENV;

#[derive(Parser)]
#[command(name = "crash_map", about = "Nashville traffic crash explorer")]
struct Cli {
    /// Read datasets from this directory instead of their published URLs
    #[arg(long, global = true, env = DATA_DIR_ENV)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Flags shared by every command that filters a dataset.
#[derive(Args, Debug, Clone)]
struct FilterArgs {
    /// Dataset to filter (`all_incidents` or `injury_fatality`)
    #[arg(long, default_value_t = DatasetKind::AllIncidents)]
    dataset: DatasetKind,
    /// Read the dataset from this `GeoJSON` file
    #[arg(long)]
    input: Option<PathBuf>,
    /// Calendar year, or `all`
    #[arg(long)]
    year: Option<String>,
    /// Minutes since midnight, `H:MM AM|PM`, or -1 for any time
    #[arg(long, allow_hyphen_values = true)]
    time: Option<String>,
    /// Weather description, or `all`
    #[arg(long)]
    weather: Option<String>,
    /// Hit-and-run flag, or `all`
    #[arg(long)]
    hit_and_run: Option<String>,
    /// Lighting condition, or `all`
    #[arg(long)]
    illumination: Option<String>,
}

impl FilterArgs {
    fn raw_criteria(&self) -> RawCriteria {
        RawCriteria {
            year: self.year.clone(),
            time: self.time.clone(),
            weather: self.weather.clone(),
            hit_and_run: self.hit_and_run.clone(),
            illumination: self.illumination.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the registered datasets
    Datasets,
    /// Write the matching crashes as a `GeoJSON` `FeatureCollection`
    Filter {
        #[command(flatten)]
        args: FilterArgs,
        /// Output file (defaults to stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Print crash, injury and fatality totals for the matching crashes
    Summary {
        #[command(flatten)]
        args: FilterArgs,
        /// Break the totals down by calendar year
        #[arg(long)]
        by_year: bool,
    },
    /// Print the values offered by each filter dropdown
    Options {
        /// Dataset to inspect
        #[arg(long, default_value_t = DatasetKind::AllIncidents)]
        dataset: DatasetKind,
        /// Read the dataset from this `GeoJSON` file
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Print the story table, or the selection and totals of one step
    Story {
        /// Step index
        step: Option<usize>,
    },
    /// Start the API server
    Serve,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = crash_map_cli_utils::init_logger();
    let cli = Cli::parse();
    let data_dir = cli.data_dir.as_deref();

    let Some(command) = cli.command else {
        return interactive::run(&multi, data_dir).await;
    };

    match command {
        Commands::Datasets => commands::datasets(),
        Commands::Filter { args, output } => {
            commands::filter(&multi, data_dir, &args, output.as_deref()).await?;
        }
        Commands::Summary { args, by_year } => {
            commands::summary(&multi, data_dir, &args, by_year).await?;
        }
        Commands::Options { dataset, input } => {
            commands::options(&multi, data_dir, dataset, input.as_deref()).await?;
        }
        Commands::Story { step } => commands::story(&multi, data_dir, step).await?,
        Commands::Serve => commands::serve(data_dir.map(Path::to_path_buf)).await?,
    }

    Ok(())
}
