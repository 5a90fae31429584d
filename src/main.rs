mod auth;
mod cli;
mod config;
mod error;
mod follow;
mod model;
mod navigation;
mod output;
mod parser;
mod providers;
mod source;
mod tui;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use env_logger::{Env, Target};
use log::info;
use std::fs::OpenOptions;
use std::path::PathBuf;

/// Log file used while the terminal belongs to the TUI.
fn log_file_path() -> Option<PathBuf> {
    dirs::state_dir()
        .or_else(dirs::cache_dir)
        .map(|dir| dir.join("glab-tui").join("glab-tui.log"))
}

fn init_logging(interactive: bool) {
    if !interactive {
        env_logger::init();
        return;
    }

    // Anything written to stderr would corrupt the alternate screen, so the
    // TUI logs to a file or not at all.
    let Some(path) = log_file_path() else {
        return;
    };
    if let Some(dir) = path.parent() {
        if std::fs::create_dir_all(dir).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.is_interactive());

    if !cli.is_interactive() {
        output::print_banner();
    }

    info!("Starting glab-tui {}", env!("CARGO_PKG_VERSION"));
    cli.execute().await?;

    Ok(())
}
