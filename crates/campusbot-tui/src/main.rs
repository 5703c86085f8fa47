use std::fs::{self, File};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use campusbot_core::{ChatSession, Config, HttpApi, Route, Sender, SharedApi};

mod app;
mod handler;
mod input;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

/// Loading animation and request polling interval
const TICK_RATE: Duration = Duration::from_millis(300);

#[derive(Parser)]
#[command(name = "campusbot")]
#[command(version, about = "Terminal client for the CampusBot campus assistant")]
struct Cli {
    /// Base URL of the CampusBot backend
    #[arg(short, long, env = "CAMPUSBOT_URL")]
    url: Option<String>,

    /// Account email, used to prefill login and for password resets
    #[arg(short, long, env = "CAMPUSBOT_EMAIL")]
    email: Option<String>,

    /// Request timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and print the answer
    Ask {
        /// Your question
        question: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = init_logging() {
        eprintln!("campusbot: logging disabled: {e:#}");
    }

    let config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "could not read config, using defaults");
        Config::new()
    });

    let base_url = cli.url.unwrap_or_else(|| config.base_url().to_string());
    let timeout = cli
        .timeout
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.request_timeout());
    let account_email = cli.email.or_else(|| config.last_email.clone());

    let api = HttpApi::new(&base_url, timeout)
        .with_context(|| format!("invalid backend URL {base_url}"))?;
    let api: SharedApi = Arc::new(api);
    info!(%base_url, ?timeout, "starting campusbot");

    match cli.command {
        Some(Commands::Ask { question }) => ask(api, &question).await,
        None => run_tui(api, base_url, account_email).await,
    }
}

/// Route tracing output to a file under the cache directory; the terminal belongs to the UI.
fn init_logging() -> Result<()> {
    let log_dir = dirs::cache_dir()
        .context("could not determine cache directory")?
        .join("campusbot");
    fs::create_dir_all(&log_dir)?;
    let log_file = File::create(log_dir.join("campusbot.log"))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("campusbot_tui=info,campusbot_core=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;

    Ok(())
}

async fn ask(api: SharedApi, question: &str) -> Result<()> {
    let mut session = ChatSession::open(api);
    if session.settle().await == Some(Route::Landing) {
        anyhow::bail!("the session ended before the question could be sent");
    }

    if !session.submit_message(question) {
        anyhow::bail!("nothing to ask");
    }
    session.settle().await;

    let reply = session
        .messages()
        .iter()
        .rev()
        .find(|m| m.sender == Sender::Bot)
        .context("no reply received")?;

    println!("{}", reply.text);
    if let Some(extra) = &reply.extra_data {
        for (key, value) in extra {
            println!("  • {key}: {value}");
        }
    }

    Ok(())
}

async fn run_tui(api: SharedApi, base_url: String, account_email: Option<String>) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let mut app = App::new(api, base_url, account_email);
    let mut events = EventHandler::new(TICK_RATE);

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;

            let Some(event) = events.next().await else {
                break;
            };
            handler::handle_event(&mut app, event)?;
            app.poll();
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    drop(events);
    tui::restore()?;
    terminal.show_cursor()?;

    info!("campusbot exited");
    result
}
