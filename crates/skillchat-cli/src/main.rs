//! skillchat CLI: terminal chat with Olaf's assistant

use clap::{Parser, Subcommand};
use skillchat_engine::{
    player_for, AskClient, Backend, Config, HttpTransport, Transport, TtsClient, TtsOutcome,
};
use skillchat_tui::Theme;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Ask questions about Olaf's skills and experience
#[derive(Parser)]
#[command(name = "skillchat")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: .skillchat/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL, e.g. http://localhost:8080
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Question endpoint: ask or chat
    #[arg(long, global = true)]
    backend: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the chat TUI (default when no command specified)
    Tui,

    /// Ask one question and print the answer
    Ask {
        /// The question
        #[arg(required = true)]
        question: Vec<String>,
    },

    /// Read text aloud through the TTS endpoint
    Speak {
        /// Text to read
        #[arg(required = true)]
        text: Vec<String>,

        /// Write the audio to this file instead of playing it
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Check that the backend is up
    Health {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the default config file
    Init,
}

const SKILLCHAT_DIR: &str = ".skillchat";
const LOG_FILE: &str = "skillchat.log";

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    let cli = Cli::parse();
    let is_tui = matches!(cli.command, None | Some(Commands::Tui));
    init_tracing(is_tui);

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| Path::new(SKILLCHAT_DIR).join("config.json"));

    if matches!(cli.command, Some(Commands::Init)) {
        exit_on_error(cmd_init(&config_path));
        return;
    }

    let config = match load_config(&config_path, cli.base_url.as_deref(), cli.backend.as_deref())
    {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {e}");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        None | Some(Commands::Tui) => {
            let theme = Theme::named(&std::env::var("SKILLCHAT_THEME").unwrap_or_default());
            rt.block_on(skillchat_tui::run_tui(config, theme))
        }
        Some(Commands::Ask { question }) => rt.block_on(cmd_ask(&config, &question.join(" "))),
        Some(Commands::Speak { text, out }) => {
            rt.block_on(cmd_speak(&config, &text.join(" "), out.as_deref()))
        }
        Some(Commands::Health { json }) => rt.block_on(cmd_health(&config, json)),
        Some(Commands::Init) => Ok(()),
    };
    exit_on_error(result);
}

fn exit_on_error(result: CliResult) {
    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Install the fmt subscriber.
///
/// The filter comes from `RUST_LOG`, then `SKILLCHAT_LOG`, then a default.
/// The TUI logs to a file so output does not corrupt the screen.
fn init_tracing(is_tui: bool) {
    let default_level = if is_tui { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_from_env("SKILLCHAT_LOG"))
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if is_tui {
        let dir = Path::new(SKILLCHAT_DIR);
        let file = std::fs::create_dir_all(dir).and_then(|()| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join(LOG_FILE))
        });
        match file {
            Ok(file) => subscriber.with_ansi(false).with_writer(Mutex::new(file)).init(),
            Err(_) => subscriber.with_writer(std::io::sink).init(),
        }
    } else {
        subscriber.with_writer(std::io::stderr).init();
    }
}

/// File, then environment, then flags.
fn load_config(
    path: &Path,
    base_url: Option<&str>,
    backend: Option<&str>,
) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = Config::load_or_default(path)?;
    config.apply_env()?;
    if let Some(url) = base_url {
        config.set_base_url(url);
    }
    if let Some(backend) = backend {
        config.backend = Backend::parse(backend)?;
    }
    Ok(config)
}

fn transport(config: &Config) -> Result<Arc<dyn Transport>, Box<dyn std::error::Error>> {
    Ok(Arc::new(HttpTransport::new(config)?))
}

async fn cmd_ask(config: &Config, question: &str) -> CliResult {
    if question.trim().is_empty() {
        return Err("question is empty".into());
    }
    let client = AskClient::new(transport(config)?, config);
    info!(url = %client.url(), "asking");

    let outcome = client.ask(question.trim()).await;
    println!("{}", outcome.content);
    match outcome.error {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}

async fn cmd_speak(config: &Config, text: &str, out: Option<&Path>) -> CliResult {
    let client = TtsClient::new(transport(config)?, player_for(config), config);

    if let Some(out) = out {
        let clip = client.synthesize(text).await?;
        std::fs::write(out, &clip.bytes)?;
        println!(
            "Wrote {} bytes ({}) to {}",
            clip.bytes.len(),
            clip.content_type.as_deref().unwrap_or("unknown type"),
            out.display()
        );
        return Ok(());
    }

    match client.speak(text).await {
        TtsOutcome::Played => Ok(()),
        TtsOutcome::Skipped => Err("nothing to say".into()),
        TtsOutcome::Failed(e) => Err(e.into()),
    }
}

async fn cmd_health(config: &Config, json: bool) -> CliResult {
    let client = AskClient::new(transport(config)?, config);
    let status = client.health().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!(
            "{} - HTTP {} ({})",
            status.url,
            status.http_status,
            status.status.as_deref().unwrap_or("no status")
        );
    }

    if status.is_healthy() {
        Ok(())
    } else {
        Err("backend is not healthy".into())
    }
}

fn cmd_init(config_path: &Path) -> CliResult {
    if config_path.exists() {
        println!("Config already exists at {}", config_path.display());
        return Ok(());
    }

    let mut config = Config::default();
    config.apply_env()?;
    config.save(config_path)?;
    println!("Created {}", config_path.display());
    println!("Edit base_url to point at your assistant backend");
    Ok(())
}
