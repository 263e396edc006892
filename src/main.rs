//! Deploy Tail - trigger a remote deployment and tail its status log.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use deploy_tail::client::HttpDeployClient;
use deploy_tail::config::{apply_env, AppConfig, ConfigError, ConfigLoader, SecretKey};
use deploy_tail::display;
use deploy_tail::events::{ConsoleSink, EventSink, GithubSink, TracingSink};
use deploy_tail::session::{DeploymentSession, SessionOutcome};
use deploy_tail::tail::Tailer;

/// Deployment reported failure.
const EXIT_DEPLOY_FAILED: u8 = 1;
/// Inputs missing or invalid.
const EXIT_CONFIG: u8 = 2;
/// Deployment could not be started or tailed.
const EXIT_SESSION: u8 = 3;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Colored terminal output.
    Pretty,
    /// GitHub Actions workflow commands.
    Github,
    /// Structured log output only.
    Log,
}

#[derive(Parser)]
#[command(
    name = "deploy-tail",
    about = "Trigger a remote deployment and tail its status until it finishes",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file to use instead of the default search paths.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL of the deployment endpoint.
    #[arg(long)]
    url: Option<String>,

    /// Application name to deploy.
    #[arg(long)]
    app_name: Option<String>,

    /// Secret key of the application.
    #[arg(long)]
    secret_key: Option<String>,

    /// Output format for deployment log lines.
    #[arg(short, long, value_enum, default_value_t = FormatArg::Pretty)]
    format: FormatArg,

    /// Wait between status polls, in milliseconds.
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Give up after this many status polls.
    #[arg(long)]
    max_polls: Option<u32>,
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Layer file, environment and command line into one configuration.
fn load_config(cli: &Cli) -> Result<AppConfig, ConfigError> {
    let loader = cli
        .config
        .clone()
        .map_or_else(ConfigLoader::new, ConfigLoader::with_path);
    let mut config = loader.load()?;
    apply_env(&mut config);

    if let Some(url) = &cli.url {
        config.deploy.url = Some(url.clone());
    }
    if let Some(app_name) = &cli.app_name {
        config.deploy.app_name = Some(app_name.clone());
    }
    if let Some(secret_key) = &cli.secret_key {
        config.deploy.secret_key = Some(SecretKey::new(secret_key.clone()));
    }
    if let Some(interval) = cli.poll_interval_ms {
        config.tail.poll_interval_ms = interval;
    }
    if cli.max_polls.is_some() {
        config.tail.max_polls = cli.max_polls;
    }
    Ok(config)
}

fn make_sink(format: FormatArg) -> Box<dyn EventSink> {
    match format {
        FormatArg::Pretty => Box::new(ConsoleSink),
        FormatArg::Github => Box::new(GithubSink::stdout()),
        FormatArg::Log => Box::new(TracingSink),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            display::print_error(&e.to_string());
            return ExitCode::from(EXIT_CONFIG);
        }
    };
    let session_config = match config.deploy.validate() {
        Ok(session_config) => session_config,
        Err(e) => {
            display::print_error(&e.to_string());
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    let client = match HttpDeployClient::new(&config.http) {
        Ok(client) => client,
        Err(e) => {
            display::print_error(&e.to_string());
            return ExitCode::from(EXIT_SESSION);
        }
    };

    tracing::info!(
        app_name = %session_config.app_name,
        url = %session_config.base_url,
        poll_interval_ms = config.tail.poll_interval_ms,
        max_polls = ?config.tail.max_polls,
        "Starting deployment"
    );

    let session = DeploymentSession::new(&client, session_config)
        .with_tailer(Tailer::from_config(&config.tail));
    let mut sink = make_sink(cli.format);

    match session.run(sink.as_mut()).await {
        Ok(outcome) => {
            if matches!(cli.format, FormatArg::Pretty) {
                display::print_deploy_end(outcome.is_success(), outcome.report().polls);
            }
            match outcome {
                SessionOutcome::Succeeded { deployment_id, .. } => {
                    tracing::info!(deployment_id = %deployment_id, "Deployment succeeded");
                    ExitCode::SUCCESS
                }
                SessionOutcome::Failed {
                    deployment_id,
                    reason,
                    ..
                } => {
                    tracing::warn!(deployment_id = %deployment_id, reason = %reason, "Deployment failed");
                    ExitCode::from(EXIT_DEPLOY_FAILED)
                }
            }
        }
        Err(e) => {
            display::print_error(&e.to_string());
            ExitCode::from(EXIT_SESSION)
        }
    }
}
