//! Forgeboard: terminal dashboard for a Discord bot's management API.
#![allow(clippy::print_stdout)]

use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio::time::MissedTickBehavior;
use tracing::info;
use url::Url;

use forgeboard_api::{ApiClient, ApiClientConfig, FormFields, StatusPoller};
use forgeboard_feed::{FeedConfig, LiveUpdateClient, UpdateHandler, feed_url};
use forgeboard_state::{NoticeKind, SharedDashboard};

mod config;
mod render;

use config::Config;

#[derive(Debug, Parser)]
#[command(
    name = "forgeboard",
    version,
    about = "Terminal dashboard for a Discord bot's management API"
)]
struct ForgeboardCli {
    /// Management API base URL (overrides FORGEBOARD_BASE_URL).
    #[arg(long, value_name = "URL", global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Follow the live feed and render the dashboard until interrupted.
    Watch,
    /// Fetch and print the current bot status.
    Status,
    /// List the registered commands.
    Commands,
    /// List the loaded modules.
    Modules,
    /// Submit bot settings as KEY=VALUE fields.
    SetSettings {
        #[arg(value_name = "KEY=VALUE", required = true)]
        fields: Vec<String>,
    },
    /// Register a new command from KEY=VALUE fields.
    AddCommand {
        #[arg(value_name = "KEY=VALUE", required = true)]
        fields: Vec<String>,
    },
    /// Ask the bot to restart.
    Restart,
    /// Ask the bot to stop. Prompts for confirmation unless --yes.
    Stop {
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = ForgeboardCli::parse();
    let mut config = Config::from_env()?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }

    run_command(cli.command, &config).await
}

async fn run_command(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Watch => watch(config).await,
        Command::Status => {
            let status = api_client(config)?
                .status()
                .await
                .context("failed to fetch bot status")?;
            print!("{}", render::render_status(&status));
            Ok(())
        }
        Command::Commands => {
            let commands = api_client(config)?
                .commands()
                .await
                .context("failed to fetch command list")?;
            print!("{}", render::render_commands(&commands));
            Ok(())
        }
        Command::Modules => {
            let modules = api_client(config)?
                .modules()
                .await
                .context("failed to fetch module list")?;
            print!("{}", render::render_modules(&modules));
            Ok(())
        }
        Command::SetSettings { fields } => {
            let fields = parse_fields(&fields)?;
            api_client(config)?
                .save_settings(&fields)
                .await
                .context("failed to save settings")?;
            report(NoticeKind::Success, "Settings saved.");
            Ok(())
        }
        Command::AddCommand { fields } => {
            let fields = parse_fields(&fields)?;
            api_client(config)?
                .add_command(&fields)
                .await
                .context("failed to add command")?;
            report(NoticeKind::Success, "Command added.");
            Ok(())
        }
        Command::Restart => {
            api_client(config)?
                .restart()
                .await
                .context("failed to restart the bot")?;
            report(NoticeKind::Info, "Restart requested.");
            Ok(())
        }
        Command::Stop { yes } => {
            if !yes && !confirm_stop()? {
                println!("Aborted.");
                return Ok(());
            }
            api_client(config)?
                .stop()
                .await
                .context("failed to stop the bot")?;
            report(NoticeKind::Warning, "Stop requested.");
            Ok(())
        }
    }
}

fn api_client(config: &Config) -> Result<ApiClient> {
    let mut api_config = ApiClientConfig::new(config.base_url.clone());
    api_config.timeout_ms = config.request_timeout_ms;
    ApiClient::new(api_config).context("invalid management API configuration")
}

/// Run the live dashboard: the feed client and the status poller feed
/// one shared state, rendered on a fixed cadence until ctrl-c.
async fn watch(config: &Config) -> Result<()> {
    let base = Url::parse(&config.base_url).context("invalid base URL")?;
    let ws_url = feed_url(&base).context("cannot derive feed endpoint from base URL")?;

    let mut feed_config = FeedConfig::new(ws_url);
    feed_config.connect_timeout = Duration::from_millis(config.connect_timeout_ms);
    feed_config.max_reconnect_attempts = config.reconnect_max_attempts;
    feed_config.reconnect_base_delay = Duration::from_millis(config.reconnect_base_delay_ms);

    let shared = SharedDashboard::new();
    let handler: Arc<dyn UpdateHandler> = Arc::new(shared.clone());

    let client = LiveUpdateClient::with_observer(feed_config, shared.state_observer());
    let poller = StatusPoller::new(
        api_client(config)?,
        Duration::from_secs(config.poll_interval_secs.max(1)),
    );

    info!(url = %config.base_url, "starting dashboard");
    let feed_handler = Arc::clone(&handler);
    let feed_task = tokio::spawn(async move { client.run(feed_handler).await });
    let poll_handler = Arc::clone(&handler);
    let poll_task = tokio::spawn(async move { poller.run(poll_handler).await });

    let mut ticker = tokio::time::interval(Duration::from_secs(2));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = chrono::Utc::now();
                let frame = {
                    let mut state = shared.lock();
                    state.prune_notices(now);
                    render::render_dashboard(&state, now)
                };
                println!("{frame}");
            }
            result = tokio::signal::ctrl_c() => {
                result.context("failed to listen for ctrl-c")?;
                info!("shutting down");
                break;
            }
        }
    }

    feed_task.abort();
    poll_task.abort();
    Ok(())
}

/// Parse `KEY=VALUE` pairs into form fields. The value may contain `=`;
/// only the first one splits.
fn parse_fields(pairs: &[String]) -> Result<FormFields> {
    let mut fields = FormFields::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("expected KEY=VALUE, got '{pair}'");
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("empty key in '{pair}'");
        }
        fields.insert(key.to_string(), value.to_string());
    }
    Ok(fields)
}

/// Print a one-shot outcome line with the same tag the watch view uses
/// for notices. Failures surface once through the error boundary.
fn report(kind: NoticeKind, message: &str) {
    println!("[{}] {}", render::notice_tag(kind), message);
}

fn confirm_stop() -> Result<bool> {
    print!("Are you sure you want to stop the bot? [y/N] ");
    std::io::stdout().flush().context("failed to flush prompt")?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read confirmation")?;
    let answer = line.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}
