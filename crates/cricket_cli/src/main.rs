//! scorebook - replay a scored match file and print what the scoreboard shows.
//!
//! Usage:
//!   scorebook match.json summary
//!   scorebook match.json scorecard --innings 2
//!   scorebook match.json commentary --limit 12
//!   scorebook --json match.json snapshot

#[cfg(feature = "cli")]
use anyhow::{Context, Result};
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use cricket_cli::{render_commentary, render_scorecard, render_summary, MatchFile};
#[cfg(feature = "cli")]
use cricket_core::api::{
    commentary_json, engine_config_from_env, load_engine_config, scorecard_json, snapshot_json,
    win_probability_json,
};
#[cfg(feature = "cli")]
use std::path::PathBuf;
#[cfg(feature = "cli")]
use tracing::info;
use tracing_subscriber::EnvFilter;

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(author, version, about = "Replay a ball-by-ball match file")]
struct Args {
    /// Match file (fixture config, lifecycle and deliveries as JSON)
    file: PathBuf,

    /// Engine config (JSON or YAML). Falls back to CRICKET_ENGINE_CONFIG, then defaults
    #[arg(long)]
    engine_config: Option<PathBuf>,

    /// Print the JSON API output instead of text
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Command {
    /// Scores, target and result for both sides.
    Summary,
    /// Batting and bowling card for one innings.
    Scorecard {
        #[arg(long, default_value = "1")]
        innings: u8,
    },
    /// Ball-by-ball commentary, most recent first.
    Commentary {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Chasing or defending side's chance during a live second innings.
    WinProbability,
    /// Full snapshot as served to scoreboard clients.
    Snapshot,
    /// Check the delivery log and replay it.
    Validate,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let file = MatchFile::load(&args.file)?;
    let checked = file.validate()?;

    let engine = match &args.engine_config {
        Some(path) => load_engine_config(path)?,
        None => engine_config_from_env().context("Failed to load engine config from environment")?,
    };
    let session = file.into_session(engine)?;
    info!(phase = ?session.phase()?, "session ready");

    let output = match (args.command, args.json) {
        (Command::Summary, false) => render_summary(&session)?,
        (Command::Summary, true) | (Command::Snapshot, _) => snapshot_json(&session)?,
        (Command::Scorecard { innings }, false) => {
            render_scorecard(&session, &session.scorecard(innings)?)?
        }
        (Command::Scorecard { innings }, true) => scorecard_json(&session, innings)?,
        (Command::Commentary { limit }, false) => render_commentary(&session.commentary()?, limit)?,
        (Command::Commentary { limit }, true) => commentary_json(&session, limit)?,
        (Command::WinProbability, false) => match session.win_probability()? {
            Some(view) => format!("{} {}%", view.favored_team_name, view.percent),
            None => "No live chase".to_string(),
        },
        (Command::WinProbability, true) => win_probability_json(&session)?,
        (Command::Validate, _) => {
            format!("{}: {checked} deliveries OK", session.config().fixture_id)
        }
    };
    println!("{}", output.trim_end());
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    init_tracing();
    tracing::error!("scorebook CLI is not available. Enable the 'cli' feature to use it.");
    std::process::exit(1);
}
