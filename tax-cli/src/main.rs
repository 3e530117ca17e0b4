use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{debug, error};

use tax_cli::commands::{self, CommandOutput, RequestOverrides};
use tax_cli::config::CliConfig;
use tax_cli::logging;
use tax_core::CalculatorRegistry;
use tax_data::DirectoryRuleSource;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Rule-driven tax computation for federal returns.
///
/// Reads a calculation request as JSON, computes every line of the requested
/// form from the rule data for its tax year, and prints the result as JSON.
#[derive(Debug, Parser)]
#[command(name = "tax-engine", version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Rule data directory, laid out as `<year>/<jurisdiction>/`.
    #[arg(long, global = true)]
    rules_dir: Option<PathBuf>,

    /// Log filter: a level or any `RUST_LOG` directive.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also append logs to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compute every line of a form.
    Calculate(RequestArgs),

    /// Compute a form and trace one line back to its inputs and rules.
    Explain {
        #[command(flatten)]
        request: RequestArgs,

        /// Line code to explain, e.g. `taxable_income`.
        #[arg(long)]
        line: String,
    },

    /// List supported forms, or describe one.
    Forms {
        /// Form code to describe.
        form: Option<String>,
    },

    /// Load and summarize the rule data directory.
    Rules {
        /// Only this tax year.
        #[arg(long)]
        year: Option<i32>,
    },
}

#[derive(Debug, Args)]
struct RequestArgs {
    /// Request JSON file; `-` or absent reads stdin.
    #[arg(long, short)]
    request: Option<PathBuf>,

    /// Override the request's form code.
    #[arg(long)]
    form: Option<String>,

    /// Override the request's tax year.
    #[arg(long)]
    year: Option<i32>,

    /// Override the request's jurisdiction.
    #[arg(long)]
    jurisdiction: Option<String>,
}

impl RequestArgs {
    fn load(self) -> anyhow::Result<tax_core::CalculationRequest> {
        let request = commands::read_request(self.request.as_deref())?;
        Ok(RequestOverrides {
            form_code: self.form,
            tax_year: self.year,
            jurisdiction: self.jurisdiction,
        }
        .apply(request))
    }
}

// ─── entry point ─────────────────────────────────────────────────────────────

async fn run(cli: Cli) -> anyhow::Result<CommandOutput> {
    let config = match &cli.config {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::default(),
    };
    let rules_dir = config.rules_dir(cli.rules_dir.as_deref());
    debug!(rules_dir = %rules_dir.display(), "configuration loaded");

    match cli.command {
        Command::Calculate(args) => {
            let engine = commands::build_engine(config.engine, &rules_dir);
            commands::calculate(&engine, args.load()?).await
        }
        Command::Explain { request, line } => {
            let engine = commands::build_engine(config.engine, &rules_dir);
            commands::explain(&engine, request.load()?, &line).await
        }
        Command::Forms { form } => {
            commands::forms(&CalculatorRegistry::with_builtin_forms(), form.as_deref())
        }
        Command::Rules { year } => {
            commands::rules(&DirectoryRuleSource::new(&rules_dir), year).await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logging(cli.log_level.as_deref(), cli.log_file.as_deref()) {
        eprintln!("{e:#}");
        return ExitCode::FAILURE;
    }

    let output = match run(cli).await {
        Ok(output) => output,
        Err(e) => {
            error!("{e:#}");
            return ExitCode::FAILURE;
        }
    };

    match serde_json::to_string_pretty(&output.body).context("Failed to render output") {
        Ok(text) => println!("{text}"),
        Err(e) => {
            error!("{e:#}");
            return ExitCode::FAILURE;
        }
    }

    if output.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    }
}
