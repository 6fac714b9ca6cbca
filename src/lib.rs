pub mod analysis;
pub mod commands;
pub mod error;
pub mod models;

use clap::{Parser, Subcommand};
use commands::reports::run_reports_internal;
use commands::settings::{load_effective_settings_with, LensSettings};
use commands::weekly::{run_weekly, WeeklyCommand};
use error::LensResult;
use models::report::ReportKind;
use serde_json::json;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "qualitylens")]
#[command(about = "Reconcile incident logs with tracker exports and report on R&D quality", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Workspace holding `.qualitylens/settings.json` and the input files
    #[arg(short, long, global = true, default_value = ".")]
    pub workspace: PathBuf,

    /// Override the report year from settings
    #[arg(long, global = true)]
    pub year: Option<i32>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Incident log vs tracker reconciliation report
    Quality,
    /// Annual quality summary
    Summary,
    /// SaaS vs private deployment comparison
    #[command(alias = "deploy")]
    Deployment,
    /// Bug overview
    Bugs,
    /// All four CSV reports from one load of the inputs
    All,
    /// Weekly engineering report analysis
    Weekly {
        #[command(subcommand)]
        command: WeeklySubcommand,
    },
}

#[derive(Subcommand)]
pub enum WeeklySubcommand {
    /// Executive summary
    Summary,
    /// Entries mentioning a client
    Client { name: String },
    /// Entries containing a keyword
    Search { keyword: String },
    /// Incident digest
    Incidents,
    /// Product line activity
    Products,
    /// Write weekly_report_analysis.json
    Export,
}

impl From<WeeklySubcommand> for WeeklyCommand {
    fn from(command: WeeklySubcommand) -> Self {
        match command {
            WeeklySubcommand::Summary => WeeklyCommand::Summary,
            WeeklySubcommand::Client { name } => WeeklyCommand::Client(name),
            WeeklySubcommand::Search { keyword } => WeeklyCommand::Search(keyword),
            WeeklySubcommand::Incidents => WeeklyCommand::Incidents,
            WeeklySubcommand::Products => WeeklyCommand::Products,
            WeeklySubcommand::Export => WeeklyCommand::Export,
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn load_settings(cli: &Cli) -> LensResult<LensSettings> {
    let overrides = match cli.year {
        Some(year) => json!({ "reportYear": year }),
        None => serde_json::Value::Null,
    };
    load_effective_settings_with(&cli.workspace, &overrides)
}

pub fn run() -> LensResult<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = load_settings(&cli)?;
    let now = chrono::Local::now().naive_local();

    let kinds: Vec<ReportKind> = match cli.command {
        Commands::Quality => vec![ReportKind::Quality],
        Commands::Summary => vec![ReportKind::Summary],
        Commands::Deployment => vec![ReportKind::Deployment],
        Commands::Bugs => vec![ReportKind::Bugs],
        Commands::All => ReportKind::ALL.to_vec(),
        Commands::Weekly { command } => {
            let stamp = now.format("%Y-%m-%dT%H:%M:%S").to_string();
            println!("{}", run_weekly(&command.into(), &settings, &stamp)?);
            return Ok(());
        }
    };

    let outputs = run_reports_internal(&settings, &kinds, now, |progress| {
        log::info!(
            "[{}/{}] Rendering {}",
            progress.current,
            progress.total,
            progress.report.file_name()
        );
    })?;
    for output in &outputs {
        println!("{}", output.path.display());
    }
    Ok(())
}
