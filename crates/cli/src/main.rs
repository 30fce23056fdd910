mod analyze_commands;
mod rules_commands;

use std::{path::PathBuf, process::ExitCode};

use {
    clap::{Parser, Subcommand},
    tracing::debug,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(
    name = "plugcheck",
    version,
    about = "Plugcheck: host-surface compatibility checks for Claude plugins"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (overrides ./plugcheck.toml and the user config dir).
    #[arg(long, global = true, env = "PLUGCHECK_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one or more plugin directories.
    Analyze(analyze_commands::AnalyzeArgs),
    /// List the command classification rules in priority order.
    Rules {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}

/// Initialise tracing. Logs go to stderr so reports on stdout stay parseable.
fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    debug!(version = env!("CARGO_PKG_VERSION"), "plugcheck starting");

    match cli.command {
        Commands::Analyze(args) => {
            let config = match cli.config.as_deref() {
                Some(path) => plugcheck_config::load_or_default(Some(path)),
                None => plugcheck_config::discover_and_load(),
            };
            analyze_commands::handle_analyze(args, &config).await
        },
        Commands::Rules { json } => {
            rules_commands::handle_rules(json)?;
            Ok(ExitCode::SUCCESS)
        },
    }
}
