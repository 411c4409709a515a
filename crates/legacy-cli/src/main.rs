//! Command-line interface for the legacy-site discovery and analysis
//! engine (spec §6).

use clap::Parser;

mod commands;
mod config;
mod error;

use error::ExitCode;

#[derive(Parser)]
#[command(name = "legacy-discover")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Crawls a legacy site and produces rebuild-ready documentation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Discover a site's URL inventory only, without analyzing it
    Discover(commands::discover::DiscoverArgs),

    /// Run the full discover -> select -> analyze -> document pipeline
    Analyze(commands::analyze::AnalyzeArgs),

    /// Continue an interrupted analysis from its last checkpoint
    Resume(commands::resume::ResumeArgs),

    /// Report progress for a project's analysis run
    Status(commands::status::StatusArgs),

    /// Send a pause/resume/stop signal to a running workflow
    Control(commands::control::ControlArgs),
}

#[tokio::main]
async fn main() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let code = match dispatch().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::TerminalAnalysisError
        }
    };
    std::process::exit(code.as_i32());
}

async fn dispatch() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Discover(args) => {
            commands::discover::run(args).await?;
            Ok(ExitCode::Success)
        }
        Commands::Analyze(args) => commands::analyze::run(args).await,
        Commands::Resume(args) => commands::resume::run(args).await,
        Commands::Status(args) => {
            commands::status::run(args).await?;
            Ok(ExitCode::Success)
        }
        Commands::Control(args) => {
            commands::control::run(args).await?;
            Ok(ExitCode::Success)
        }
    }
}
