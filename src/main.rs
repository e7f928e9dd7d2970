use clap::{Parser, Subcommand};
use colored::Colorize;
use rack_transfer::cli;
use rack_transfer::error::TransferResult;
use rack_transfer::settings::SETTINGS_FILE;
use rack_transfer::types::Side;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "rack-transfer")]
#[command(about = "Copy Rack IDs from a source workbook into a target workbook by Product ID.")]
#[command(long_about = "Rack Transfer - Excel Rack ID copier

Matches rows of a source sheet to rows of a target sheet by Product ID and
copies the source Rack ID into every target row that does not have one yet.

SOURCE SHEET COLUMNS:  Product ID, Rack ID, Duplicated, Copied
TARGET SHEET COLUMNS:  Product ID, Rack ID

RULES:
  - Product IDs that appear more than once in the source are all marked
    Duplicated = YES and never copied
  - Copied source rows are marked Copied = YES
  - Rows marked YES in either column are skipped on later runs
  - A target Rack ID that is already filled in is never overwritten

COMMANDS:
  status    - Show the selected source/target sheets
  select    - Choose the source or target workbook and sheet
  begin     - Run the transfer
  template  - Create an empty source/target workbook

EXAMPLES:
  rack-transfer select source                      # Native file dialog
  rack-transfer select target orders.xlsx --sheet Sheet1
  rack-transfer begin --dry-run --verbose
  rack-transfer begin

Logging: set RUST_LOG (default rack_transfer=info).")]
#[command(version)]
struct Cli {
    /// Settings record holding the selected sheets
    #[arg(
        long,
        global = true,
        env = "RACK_TRANSFER_SETTINGS",
        default_value = SETTINGS_FILE
    )]
    settings: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the selected source/target sheets
    Status {
        /// Print the state as JSON
        #[arg(long)]
        json: bool,
    },

    #[command(long_about = "Choose the workbook and sheet for one side.

Without FILE a native file dialog is opened. Without --sheet the sheets
of the workbook are listed and one is chosen at the prompt. Cancelling
either step leaves the saved selection unchanged.")]
    /// Choose the source or target workbook and sheet
    Select {
        /// Which side to set
        #[arg(value_enum)]
        side: Side,

        /// Workbook path (opens a file dialog when omitted)
        file: Option<PathBuf>,

        /// Sheet name (prompts when omitted)
        #[arg(short, long)]
        sheet: Option<String>,
    },

    #[command(long_about = "Run the transfer for the saved selections.

Both selections must be set. The source sheet is updated first
(Duplicated/Copied markers), then the target sheet (Rack IDs). Any error
aborts the run with a single message.")]
    /// Run the transfer
    Begin {
        /// Compute the updates without writing either workbook
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show skip counts and every target update
        #[arg(short, long)]
        verbose: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Also report completion in a native message dialog
        #[arg(long)]
        notify: bool,
    },

    /// Create an empty source/target workbook with the required headers
    Template {
        /// Output workbook (.xlsx)
        output: PathBuf,

        /// Which header row to write
        #[arg(short, long, value_enum)]
        kind: Side,

        /// Sheet name
        #[arg(short, long, default_value = "Sheet1")]
        sheet: String,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "rack_transfer=debug"
    } else {
        "rack_transfer=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> TransferResult<()> {
    let settings = cli.settings;
    match cli.command {
        Commands::Status { json } => cli::status(settings, json),

        Commands::Select { side, file, sheet } => cli::select(settings, side, file, sheet),

        Commands::Begin {
            dry_run,
            verbose,
            json,
            notify,
        } => cli::begin(settings, dry_run, verbose, json, notify),

        Commands::Template {
            output,
            kind,
            sheet,
            force,
        } => cli::template(output, kind, sheet, force),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(matches!(cli.command, Commands::Begin { verbose: true, .. }));

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("{} {}", "❌ Error:".bold().red(), e);
            ExitCode::FAILURE
        }
    }
}
