//! # Tracklens
//!
//! Explore a personal listening history: fetch recently played tracks from
//! the streaming service once a day, then chart their audio features.
//!
//! ## Usage
//!
//! ```bash
//! # Append the last day of plays
//! tracklens fetch --token "$SPOTIFY_TOKEN"
//!
//! # Energy against valence for one artist, with a trend line
//! tracklens scatter --x energy --y valence --artist "nina simone" --regression
//!
//! # Late-night plays per key
//! tracklens bars --axis key --time-from 22:00
//! ```

use anyhow::Result;
use chrono::Local;
use clap::{CommandFactory, Parser};
use log::{debug, info};
use tracklens::config::RuntimeConfig;
use tracklens::selection::Constraint;
use tracklens::spotify::SpotifyClient;
use tracklens::{cli, completion, db, etl, view};

/// Main entry point for the Tracklens application.
///
/// Initializes logging, parses command-line arguments, and routes commands
/// to the appropriate module functions.
///
/// # Logging
///
/// Initializes environment logger which can be controlled via `RUST_LOG`:
/// - `RUST_LOG=debug tracklens fetch` - Enable debug logging
/// - `RUST_LOG=tracklens::etl=trace tracklens fetch` - Module-specific logging
fn main() -> Result<()> {
    env_logger::init();

    let args = cli::Args::parse();

    let mut config = RuntimeConfig::load()?;
    if let Some(db_path) = args.db {
        config = config.with_db_path(db_path);
    }
    debug!("Using database {}", config.db_path.display());

    match args.command {
        cli::Command::InitDb => {
            db::open(&config.db_path)?;
            println!("Database ready at {}", config.db_path.display());
        }
        cli::Command::Fetch { token, limit } => {
            let client = SpotifyClient::new(&config.api_base_url, &token, config.request_timeout())?;
            let mut conn = db::open(&config.db_path)?;
            let limit = limit.unwrap_or(config.history_limit);

            match etl::run(&client, &mut conn, Local::now(), limit)? {
                etl::RunOutcome::NothingToLoad => println!("No new plays to load."),
                etl::RunOutcome::Loaded(summary) => println!(
                    "Load completed: {} plays, {} new tracks.",
                    summary.plays_inserted, summary.features_inserted
                ),
            }
        }
        cli::Command::History { limit } => {
            let conn = db::open(&config.db_path)?;
            for play in db::recent_plays(&conn, limit)? {
                println!(
                    "{}  {} - {}",
                    play.played_at.format("%Y-%m-%d %H:%M:%S"),
                    play.artist_name,
                    play.song_name
                );
            }
        }
        cli::Command::Scatter { x, y, song, artist, regression, range, json } => {
            let backing = load_backing(&config)?;
            let constraint = range.apply(Constraint {
                x_axis: x,
                y_axis: y,
                song_filter: song,
                artist_filter: artist,
                show_regression: regression,
                ..Constraint::initial(&backing)
            });

            let scatter = view::render_scatter(&backing, &constraint);
            if json {
                println!("{}", serde_json::to_string_pretty(&scatter)?);
            } else {
                print!("{scatter}");
            }
        }
        cli::Command::Bars { axis, range, json } => {
            let backing = load_backing(&config)?;
            let constraint = range.apply(Constraint {
                bar_axis: axis,
                ..Constraint::initial(&backing)
            });

            let bars = view::render_bars(&backing, &constraint);
            if json {
                println!("{}", serde_json::to_string_pretty(&bars)?);
            } else {
                print!("{bars}");
            }
        }
        cli::Command::Completion { shell } => {
            let mut cmd = cli::Args::command();
            completion::generate_completions(completion::shell_to_completion_shell(&shell), &mut cmd);
        }
    }

    Ok(())
}

/// The backing table lives for the rest of the process.
fn load_backing(config: &RuntimeConfig) -> Result<Vec<tracklens::models::JoinedRow>> {
    let conn = db::open(&config.db_path)?;
    let backing = db::load_joined(&conn)?;
    info!("Loaded {} plays from {}", backing.len(), config.db_path.display());
    Ok(backing)
}
