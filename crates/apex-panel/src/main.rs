mod action;
mod app;
mod app_state;
mod component;
mod components;
mod mpv;
mod player;
mod theme;
mod widgets;

use std::path::PathBuf;

use clap::Parser;

use apex_core::{platform, Config};

/// Terminal media panel with a synthetic bar visualizer.
#[derive(Parser, Debug)]
#[command(name = "apex", version, about)]
struct Args {
    /// Media file to open at startup
    path: Option<PathBuf>,

    /// Config file (default: ~/.config/apex/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for the visualizer's random walk and beat trials
    #[arg(long)]
    seed: Option<u64>,

    /// Start with the visualizer hidden
    #[arg(long)]
    no_visualizer: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let data_dir = platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("apex.log");

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; default to debug.
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    // Print log path to stderr so the operator can tail it immediately.
    eprintln!("apex log: {}", log_path.display());

    tracing::info!("apex starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let config_path = args.config.clone().unwrap_or_else(Config::config_path);
    let config = match Config::load_from(&config_path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(
                "config {} rejected, using defaults: {}",
                config_path.display(),
                e
            );
            Config::default()
        }
    };

    // ── Run TUI ──────────────────────────────────────────────────────────────
    let app = app::App::new(config, args.seed, !args.no_visualizer, args.path);
    app.run().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_parse() {
        let args = Args::parse_from(["apex", "--seed", "7", "--no-visualizer", "song.ogg"]);
        assert_eq!(args.seed, Some(7));
        assert!(args.no_visualizer);
        assert_eq!(args.path, Some(PathBuf::from("song.ogg")));
        assert!(args.config.is_none());
    }

    #[test]
    fn args_verify() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
