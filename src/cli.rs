//! # Command-Line Interface Module
//!
//! This module defines the command-line interface for Tracklens using Clap
//! derive macros.
//!
//! ## Commands
//!
//! - `init-db`: Create the store's tables
//! - `fetch`: Pull the last day of plays from the streaming service
//! - `history`: Show the most recent plays
//! - `scatter`: Plot two audio features against each other
//! - `bars`: Count plays per key or time signature
//!
//! ## Examples
//!
//! ```bash
//! tracklens fetch --token "$SPOTIFY_TOKEN"
//! tracklens scatter --x energy --y valence --artist "nina simone" --regression
//! tracklens bars --axis time-signature --from 2024-01-01 --time-from 22:00
//! ```

use crate::models::{BarAxis, FeatureAxis};
use crate::selection::{self, Constraint};
use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

/// Main application arguments structure.
#[derive(Parser)]
#[command(name = "tracklens")]
#[command(about = "Tracklens: explore your listening history - audio-feature scatter plots & key charts")]
#[command(version)]
pub struct Args {
    /// Database file to use instead of the configured one
    #[arg(long, global = true, env = "TRACKLENS_DB")]
    pub db: Option<PathBuf>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the track_plays and audio_features tables
    InitDb,

    /// Fetch the last day of plays and append them to the store
    ///
    /// Requests up to 50 recently played tracks, then the audio features of
    /// every distinct track. The batch is validated as a whole: any missing
    /// value, duplicate, or play older than yesterday aborts the run and
    /// nothing is written.
    Fetch {
        /// OAuth bearer token with the user-read-recently-played scope
        #[arg(long, env = "SPOTIFY_TOKEN", hide_env_values = true)]
        token: String,

        /// Plays to request (at most 50)
        #[arg(long)]
        limit: Option<u32>,
    },

    /// List the most recent plays in the store
    History {
        #[arg(short = 'n', long, default_value = "20")]
        limit: u32,
    },

    /// Plot two audio features of the selected tracks
    ///
    /// Each track appears once, sized by how often it was played. The title
    /// reports the Pearson correlation of the two axes.
    Scatter {
        /// Feature on the x axis
        #[arg(long, value_enum, default_value = "tempo")]
        x: FeatureAxis,

        /// Feature on the y axis
        #[arg(long, value_enum, default_value = "duration")]
        y: FeatureAxis,

        /// Song name includes
        #[arg(long, default_value = "")]
        song: String,

        /// Artist name includes
        #[arg(long, default_value = "")]
        artist: String,

        /// Add the least squares regression line
        #[arg(long)]
        regression: bool,

        #[command(flatten)]
        range: RangeArgs,

        /// Print the view as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Count selected plays per key and mode, or per time signature
    Bars {
        #[arg(long, value_enum, default_value = "key")]
        axis: BarAxis,

        #[command(flatten)]
        range: RangeArgs,

        /// Print the view as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    ///
    /// Usage: tracklens completion bash > ~/.local/share/bash-completion/completions/tracklens
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Date and time-of-day bounds shared by both charts.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct RangeArgs {
    /// First day to include (YYYY-MM-DD); defaults to the earliest play
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last day to include (YYYY-MM-DD); defaults to the latest play
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Earliest time of day to include (HH:MM or HH:MM:SS)
    #[arg(long, value_parser = parse_time_of_day)]
    pub time_from: Option<NaiveTime>,

    /// Latest time of day to include (HH:MM or HH:MM:SS)
    #[arg(long, value_parser = parse_time_of_day)]
    pub time_to: Option<NaiveTime>,
}

impl RangeArgs {
    /// Overrides the bounds of `base` that were given on the command line.
    #[must_use]
    pub fn apply(&self, base: Constraint) -> Constraint {
        Constraint {
            date_begin: self.from.unwrap_or(base.date_begin),
            date_end: self.to.unwrap_or(base.date_end),
            time_begin: self.time_from.unwrap_or(base.time_begin),
            time_end: self.time_to.unwrap_or(base.time_end),
            ..base
        }
    }
}

/// Accepts `HH:MM` or `HH:MM:SS`. `24:00` means the end of the day.
pub fn parse_time_of_day(raw: &str) -> Result<NaiveTime> {
    let raw = raw.trim();
    if raw == "24:00" || raw == "24:00:00" {
        return Ok(selection::end_of_day());
    }
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .with_context(|| format!("Invalid time of day '{raw}', expected HH:MM or HH:MM:SS"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_scatter_arguments() {
        let args = Args::parse_from([
            "tracklens", "scatter", "--x", "energy", "--y", "valence", "--artist", "simone",
            "--from", "2024-01-02", "--time-to", "06:30", "--regression",
        ]);
        match args.command {
            Command::Scatter { x, y, artist, regression, range, .. } => {
                assert_eq!(x, FeatureAxis::Energy);
                assert_eq!(y, FeatureAxis::Valence);
                assert_eq!(artist, "simone");
                assert!(regression);
                assert_eq!(range.from, NaiveDate::from_ymd_opt(2024, 1, 2));
                assert_eq!(range.time_to, NaiveTime::from_hms_opt(6, 30, 0));
            }
            _ => panic!("expected scatter"),
        }
    }

    #[test]
    fn test_parse_bars_axis() {
        let args = Args::parse_from(["tracklens", "--db", "x.db", "bars", "--axis", "time-signature"]);
        assert_eq!(args.db, Some(PathBuf::from("x.db")));
        match args.command {
            Command::Bars { axis, .. } => assert_eq!(axis, BarAxis::TimeSignature),
            _ => panic!("expected bars"),
        }
    }

    #[test]
    fn test_parse_time_of_day() {
        assert_eq!(parse_time_of_day("07:45").unwrap(), NaiveTime::from_hms_opt(7, 45, 0).unwrap());
        assert_eq!(parse_time_of_day("07:45:10").unwrap(), NaiveTime::from_hms_opt(7, 45, 10).unwrap());
        assert_eq!(parse_time_of_day("24:00").unwrap(), selection::end_of_day());
        assert!(parse_time_of_day("7pm").is_err());
    }

    #[test]
    fn test_range_args_override_only_given_bounds() {
        let base = Constraint::initial(&[]);
        let range = RangeArgs {
            to: NaiveDate::from_ymd_opt(2024, 5, 1),
            time_from: NaiveTime::from_hms_opt(12, 0, 0),
            ..RangeArgs::default()
        };
        let applied = range.apply(base.clone());
        assert_eq!(applied.date_begin, base.date_begin);
        assert_eq!(applied.date_end, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(applied.time_begin, NaiveTime::from_hms_opt(12, 0, 0).unwrap());
        assert_eq!(applied.time_end, base.time_end);
    }
}
