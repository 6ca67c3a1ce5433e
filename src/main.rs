use ageing_slab::cli;
use ageing_slab::error::AgeingResult;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ageing")]
#[command(about = "Recompute disbursement ageing and slabs across every sheet of an Excel workbook.")]
#[command(long_about = "Ageing - disbursement ageing for Excel workbooks

Reads all sheets of an .xlsx file, computes the days elapsed since each
row's 'Date of Disbursement' up to a reference date, buckets rows into
slabs, and writes one 'Processed Data' sheet.

SLABS:
  <=60    ageing <= 60
  >60     60 < ageing <= 90
  >90     90 < ageing <= 180
  >180    180 < ageing <= 365
  >365    ageing > 365
  No Slab missing or invalid disbursement date

COMMANDS:
  process - Compute ageing/slabs and write the consolidated workbook
  inspect - Show sheets, row counts and recognised columns
  slabs   - Print the slab rules

EXAMPLES:
  ageing process loans.xlsx --date 2024-03-31
  ageing process loans.xlsx -d 2024-03-31 -o aged.xlsx --verbose
  ageing inspect loans.xlsx

Set RUST_LOG=debug for pipeline tracing on stderr.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Compute ageing and slabs for every row of every sheet.

Rows from all sheets are concatenated in workbook order. Existing 'Ageing'
and 'Slab' columns are overwritten with the new values; 'new_ageing' and
'new_slab' are always added.

Rows whose 'Date of Disbursement' is missing or unreadable are kept, get no
ageing and the 'No Slab' label, and are listed as a warning.

If no sheet has a 'Date of Disbursement' column the combined sheets are
still written, and the command exits with an error.")]
    /// Compute ageing/slabs and write the consolidated workbook
    Process {
        /// Path to the Excel file (.xlsx)
        input: PathBuf,

        /// Reference date (YYYY-MM-DD); defaults to today
        #[arg(short, long)]
        date: Option<String>,

        /// Output Excel file (default: processed_output.xlsx next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// YAML file overriding column/sheet names
        #[arg(short, long, env = "AGEING_CONFIG")]
        config: Option<PathBuf>,

        /// Show per-sheet details and a preview of the updated columns
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show sheets, row counts and recognised columns
    Inspect {
        /// Path to the Excel file (.xlsx)
        input: PathBuf,

        /// YAML file overriding column/sheet names
        #[arg(short, long, env = "AGEING_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Print the slab rules
    Slabs,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli.command) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(command: Commands) -> AgeingResult<()> {
    match command {
        Commands::Process {
            input,
            date,
            output,
            config,
            verbose,
        } => cli::process(input, date, output, config, verbose),

        Commands::Inspect { input, config } => cli::inspect(input, config),

        Commands::Slabs => cli::slabs(),
    }
}
