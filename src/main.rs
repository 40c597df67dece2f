mod app;
mod chat;
mod config;
mod constants;
mod error;
mod input;
mod source;
mod sync;
mod timeline;
mod ui;

use anyhow::Result;
use std::env;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::App;
use crate::config::Config;

fn setup_logging() {
    use std::fs::OpenOptions;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,backscroll=debug"));

    // The terminal is taken by the UI, so logs go to a file in the data directory
    let log_file = Config::data_dir()
        .ok()
        .map(|dir| dir.join("backscroll.log"))
        .and_then(|path| {
            OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&path)
                .ok()
        });

    if let Some(file) = log_file {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::sync::Mutex::new(file))
                    .with_ansi(false),
            )
            .init();
    } else {
        // Fallback to stderr if file logging fails
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_usage() {
    eprintln!(
        r#"backscroll - Browse imported chat histories in the terminal

Usage: backscroll [command | <dir>]

Commands:
    (none)      Open the conversations in the configured source directory
    <dir>       Open the conversations in <dir> instead
    init        Write a config file with the default settings
    help        Show this help message

Source layout:
    <dir>/<category>/index.json     conversation listing
    <dir>/<category>/<slug>.json    messages of one conversation

Configuration file: ~/.config/backscroll/config.toml
"#
    );
}

fn run_init() -> Result<()> {
    let config_path = Config::config_path()?;
    if config_path.exists() {
        println!("Configuration already exists at {}", config_path.display());
        return Ok(());
    }

    let config = Config::default();
    config.save()?;
    println!("Configuration saved to {}", config_path.display());
    println!("Conversations are read from {}", config.source.root.display());
    Ok(())
}

async fn run(root: Option<PathBuf>) -> Result<()> {
    setup_logging();

    let mut config = Config::load()?;
    if let Some(root) = root {
        config.source.root = root;
    }
    config.ensure_dirs()?;

    crate::ui::theme::init_theme(config.ui.theme);
    tracing::info!("Reading conversations from {}", config.source.root.display());

    let mut app = App::new(config).await?;
    app.run().await
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("help") | Some("--help") | Some("-h") => {
            print_usage();
            Ok(())
        }
        Some("init") => run_init(),
        Some(flag) if flag.starts_with('-') => {
            eprintln!("Unknown option: {}", flag);
            print_usage();
            std::process::exit(1);
        }
        Some(dir) => run(Some(PathBuf::from(dir))).await,
        None => run(None).await,
    }
}
