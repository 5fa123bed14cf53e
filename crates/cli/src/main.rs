// mwork - meter network reconciliation from the command line

mod dataset;
mod exit_codes;
mod recon;
mod table;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use meterworks_recon::PeriodKey;

use exit_codes::{EXIT_SUCCESS, EXIT_USAGE};
use recon::{period_from_arg, scope_from_args};

#[derive(Parser)]
#[command(name = "mwork")]
#[command(about = "Reconcile hierarchical utility meter readings and attribute losses")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a dataset and check the meter hierarchy without computing anything
    #[command(after_help = "\
Examples:
  mwork validate water.toml")]
    Validate {
        /// Path to the dataset .toml file
        dataset: PathBuf,
    },

    /// Supply, consumption and loss for one scope and period
    #[command(after_help = "\
Examples:
  mwork metrics water.toml
  mwork metrics water.toml --zone Z3 --period 2025-01
  mwork metrics water.toml --zone Z3 --zone Z5 --json
  mwork metrics water.toml --main --period 2025-02")]
    Metrics {
        /// Path to the dataset .toml file
        dataset: PathBuf,

        /// Restrict to a zone code. Repeatable.
        #[arg(long, value_name = "ZONE")]
        zone: Vec<String>,

        /// Reconcile the main meter against zone bulks and direct connections
        #[arg(long, conflicts_with = "zone")]
        main: bool,

        /// Reporting month (YYYY-MM). Omit to sum over every period.
        #[arg(long, value_name = "YYYY-MM")]
        period: Option<PeriodKey>,

        /// Output JSON to stdout instead of a human summary
        #[arg(long)]
        json: bool,
    },

    /// Metrics for every period, in chronological order
    #[command(after_help = "\
Examples:
  mwork series water.toml
  mwork series water.toml --zone Z8 --json
  mwork series water.toml --main")]
    Series {
        /// Path to the dataset .toml file
        dataset: PathBuf,

        /// Restrict to a zone code. Repeatable.
        #[arg(long, value_name = "ZONE")]
        zone: Vec<String>,

        /// Reconcile the main meter against zone bulks and direct connections
        #[arg(long, conflicts_with = "zone")]
        main: bool,

        /// Output JSON to stdout instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Direct children of a meter with their share of the sibling total
    #[command(after_help = "\
Examples:
  mwork children water.toml L1
  mwork children water.toml Z3 --period 2025-03 --json")]
    Children {
        /// Path to the dataset .toml file
        dataset: PathBuf,

        /// Meter id whose children to list
        parent: String,

        /// Reporting month (YYYY-MM). Omit to sum over every period.
        #[arg(long, value_name = "YYYY-MM")]
        period: Option<PeriodKey>,

        /// Output JSON to stdout instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Full loss report: system stages, per-zone bands and a summary
    #[command(after_help = "\
Examples:
  mwork report water.toml
  mwork report water.toml --period 2025-01 --json
  mwork report water.toml --output report.json
  mwork report water.toml --strict")]
    Report {
        /// Path to the dataset .toml file
        dataset: PathBuf,

        /// Reporting month (YYYY-MM). Omit to sum over every period.
        #[arg(long, value_name = "YYYY-MM")]
        period: Option<PeriodKey>,

        /// Output JSON to stdout instead of only the human summary
        #[arg(long)]
        json: bool,

        /// Write JSON output to file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Exit non-zero when any zone is in the critical loss band
        #[arg(long)]
        strict: bool,
    },
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version come through here too
            let code = if e.use_stderr() { EXIT_USAGE } else { EXIT_SUCCESS };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    let result = match cli.command {
        Commands::Validate { dataset } => recon::cmd_validate(dataset),
        Commands::Metrics { dataset, zone, main, period, json } => recon::cmd_metrics(
            dataset,
            scope_from_args(zone, main),
            period_from_arg(period),
            json,
        ),
        Commands::Series { dataset, zone, main, json } => {
            recon::cmd_series(dataset, scope_from_args(zone, main), json)
        }
        Commands::Children { dataset, parent, period, json } => {
            recon::cmd_children(dataset, parent, period_from_arg(period), json)
        }
        Commands::Report { dataset, period, json, output, strict } => {
            recon::cmd_report(dataset, period_from_arg(period), json, output, strict)
        }
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}
