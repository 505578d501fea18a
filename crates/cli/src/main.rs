// LedgerLens CLI - balance-sheet analysis with AI summary and chat

mod ai;
mod analyze;
mod exit_codes;
mod input;
mod util;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use ledgerlens_config::Settings;

use exit_codes::{EXIT_ERROR, EXIT_LOAD, EXIT_MISSING_TOTALS, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "llens")]
#[command(about = "Two-period balance-sheet analysis with AI summary and chat")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Settings file (default: <config dir>/ledgerlens/settings.json)
    #[arg(long, global = true, env = "LEDGERLENS_SETTINGS", value_name = "PATH")]
    settings: Option<PathBuf>,

    /// Debug logging to stderr (or set LEDGERLENS_LOG)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// How to read the input file.
#[derive(Args, Clone, Debug)]
pub struct LoadArgs {
    /// Sheet name for multi-sheet workbooks (default: first sheet)
    #[arg(long)]
    sheet: Option<String>,

    /// First row is data, not a header
    #[arg(long)]
    no_headers: bool,

    /// CSV delimiter (default: sniffed)
    #[arg(long)]
    delimiter: Option<char>,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive growth, composition weights and current ratios
    #[command(after_help = "\
Input: three columns per row (line item, prior period, current period).
The first row is a header unless --no-headers is given.

Examples:
  llens analyze balance-sheet.xlsx
  llens analyze bs.csv --no-headers --delimiter ';'
  llens analyze report.xlsx --sheet 'Balance Sheet' --json")]
    Analyze {
        /// Balance sheet (.csv, .tsv, .xlsx, .xls, .ods)
        file: PathBuf,

        #[command(flatten)]
        load: LoadArgs,

        /// Output as JSON for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Print the text snapshot used to ground the AI
    #[command(after_help = "\
Examples:
  llens context balance-sheet.xlsx
  llens context bs.csv | wc -c")]
    Context {
        file: PathBuf,

        #[command(flatten)]
        load: LoadArgs,
    },

    /// One-shot AI assessment of the balance sheet
    #[command(after_help = "\
Requires ai.provider in settings and an API key (keychain or LEDGERLENS_<PROVIDER>_KEY).

Examples:
  llens summary balance-sheet.xlsx
  LEDGERLENS_GEMINI_KEY=... llens summary bs.csv")]
    Summary {
        file: PathBuf,

        #[command(flatten)]
        load: LoadArgs,
    },

    /// Interactive chat grounded in the loaded balance sheet
    #[command(after_help = "\
Commands inside the chat:
  /load <file>   load another balance sheet (resets the chat if data differs)
  /summary       one-shot assessment of the current data
  /reset         start a fresh conversation on the same data
  /history       print the conversation so far
  /status        show session state
  /reconnect     re-read settings and keys after fixing a rejected key
  /quit          leave

Examples:
  llens chat balance-sheet.xlsx
  echo 'What is the current ratio?' | llens chat bs.csv")]
    Chat {
        /// Balance sheet to load at start (or use /load)
        file: Option<PathBuf>,

        #[command(flatten)]
        load: LoadArgs,

        /// Print replies only once complete
        #[arg(long)]
        no_stream: bool,
    },

    /// AI configuration
    Ai {
        #[command(subcommand)]
        command: AiCommands,
    },
}

#[derive(Subcommand)]
enum AiCommands {
    /// Check AI configuration and connectivity
    Doctor {
        /// Output as JSON for machine parsing
        #[arg(long)]
        json: bool,

        /// Send a test prompt to the provider (requires network)
        #[arg(long)]
        test: bool,
    },

    /// Store an API key in the system keychain (read from stdin)
    #[command(after_help = "\
Examples:
  llens ai set-key gemini
  pass show gemini | llens ai set-key gemini")]
    SetKey {
        /// gemini or openai
        provider: String,
    },

    /// Remove an API key from the system keychain
    ClearKey {
        /// gemini or openai
        provider: String,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\ntarget:  ", env!("TARGET"),
    )
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose { "warn,ledgerlens=debug,llens=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("LEDGERLENS_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_settings(path: Option<&Path>) -> Settings {
    match path {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let settings = load_settings(cli.settings.as_deref());

    let result = match cli.command {
        Commands::Analyze { file, load, json } => analyze::cmd_analyze(&settings, &file, &load, json),
        Commands::Context { file, load } => analyze::cmd_context(&settings, &file, &load),
        Commands::Summary { file, load } => ai::cmd_summary(&settings, &file, &load),
        Commands::Chat { file, load, no_stream } => {
            ai::cmd_chat(&settings, cli.settings.as_deref(), file.as_deref(), &load, !no_stream)
        }
        Commands::Ai { command } => match command {
            AiCommands::Doctor { json, test } => ai::cmd_ai_doctor(&settings, json, test),
            AiCommands::SetKey { provider } => ai::cmd_set_key(&provider),
            AiCommands::ClearKey { provider } => ai::cmd_clear_key(&provider),
        },
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

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn load(err: ledgerlens_io::LoadError) -> Self {
        use ledgerlens_io::LoadError;

        let hint = match &err {
            LoadError::ColumnCount { .. } => {
                Some("expected columns: line item, prior period, current period".to_string())
            }
            LoadError::SheetNotFound { .. } => Some("pass --sheet with one of the listed names".to_string()),
            LoadError::Empty => Some("if the file has no header row, pass --no-headers".to_string()),
            _ => None,
        };
        Self { code: EXIT_LOAD, message: err.to_string(), hint }
    }

    pub fn analysis(err: ledgerlens_analysis::AnalysisError) -> Self {
        Self::new(EXIT_MISSING_TOTALS, err.to_string())
            .with_hint("add a total-assets row or extend labels.totalAssets in settings.json")
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
