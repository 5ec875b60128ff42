//! # Ingestion Job
//!
//! Pulls the last day of plays from a [`ListeningSource`], fetches audio
//! features for every distinct track, validates both batches and appends
//! them to the store. Any failure aborts the run before the store is touched.

use crate::db::{self, LoadSummary};
use crate::models::{AudioFeatures, PlayEvent};
use crate::spotify::{IncomingFeatures, IncomingPlay, ListeningSource};
use anyhow::Result;
use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use log::{debug, info};
use rusqlite::Connection;
use std::collections::HashSet;
use thiserror::Error;

/// Why a fetched batch was refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{dataset} data contains missing values (row {row}, column {column}).")]
    MissingValue {
        dataset: &'static str,
        row: usize,
        column: &'static str,
    },
    #[error("Data contains duplicate 'played at' times: {0}")]
    DuplicatePlayedAt(String),
    #[error("Audio features data contains duplicate track ID's: {0}")]
    DuplicateTrackId(String),
    #[error("Contains data not from yesterday: {played_at} is before {yesterday}")]
    Stale { played_at: String, yesterday: NaiveDate },
    #[error("Unreadable 'played at' time: {0}")]
    BadTimestamp(String),
    #[error("Audio features for track {track_id} have out-of-range {column}: {value}")]
    OutOfRange {
        track_id: String,
        column: &'static str,
        value: i64,
    },
}

/// Result of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The window held no plays; the store was left alone.
    NothingToLoad,
    Loaded(LoadSummary),
}

fn required<T: Clone>(value: &Option<T>, dataset: &'static str, row: usize, column: &'static str) -> Result<T, ValidationError> {
    value
        .clone()
        .ok_or(ValidationError::MissingValue { dataset, row, column })
}

/// Checks a batch of plays and converts it into typed records.
///
/// Every field must be present, `played_at` must be unique within the batch,
/// and no play may be dated before `today - 1 day`. The date compared is the
/// calendar date written in the `played_at` string itself.
pub fn validate_plays(incoming: &[IncomingPlay], today: NaiveDate) -> Result<Vec<PlayEvent>, ValidationError> {
    const DATASET: &str = "Track plays";

    let mut plays = Vec::with_capacity(incoming.len());
    for (row, play) in incoming.iter().enumerate() {
        plays.push((
            required(&play.track_id, DATASET, row, "track_id")?,
            required(&play.song_name, DATASET, row, "song_name")?,
            required(&play.artist_name, DATASET, row, "artist_name")?,
            required(&play.played_at, DATASET, row, "played_at")?,
        ));
    }

    let mut seen = HashSet::new();
    for (_, _, _, played_at) in &plays {
        if !seen.insert(played_at.as_str()) {
            return Err(ValidationError::DuplicatePlayedAt(played_at.clone()));
        }
    }

    let yesterday = today - Duration::days(1);
    for (_, _, _, played_at) in &plays {
        let date = played_at
            .get(..10)
            .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
            .ok_or_else(|| ValidationError::BadTimestamp(played_at.clone()))?;
        if date < yesterday {
            return Err(ValidationError::Stale {
                played_at: played_at.clone(),
                yesterday,
            });
        }
    }

    plays
        .into_iter()
        .map(|(track_id, song_name, artist_name, played_at)| {
            let parsed = DateTime::parse_from_rfc3339(&played_at)
                .map_err(|_| ValidationError::BadTimestamp(played_at.clone()))?;
            Ok(PlayEvent {
                track_id,
                song_name,
                artist_name,
                played_at: parsed.with_timezone(&Utc),
            })
        })
        .collect()
}

/// Checks a batch of audio features and converts it into typed records.
///
/// Every field must be present and `track_id` must be unique within the batch.
pub fn validate_features(incoming: &[IncomingFeatures]) -> Result<Vec<AudioFeatures>, ValidationError> {
    const DATASET: &str = "Audio features";

    let mut features = Vec::with_capacity(incoming.len());
    for (row, f) in incoming.iter().enumerate() {
        let track_id = required(&f.track_id, DATASET, row, "track_id")?;
        let key = required(&f.key, DATASET, row, "key")?;
        let mode = required(&f.mode, DATASET, row, "mode")?;

        features.push(AudioFeatures {
            danceability: required(&f.danceability, DATASET, row, "danceability")?,
            energy: required(&f.energy, DATASET, row, "energy")?,
            key: small_int(&track_id, "key", key, 11)?,
            mode: small_int(&track_id, "mode", mode, 1)?,
            loudness: required(&f.loudness, DATASET, row, "loudness")?,
            speechiness: required(&f.speechiness, DATASET, row, "speechiness")?,
            acousticness: required(&f.acousticness, DATASET, row, "acousticness")?,
            instrumentalness: required(&f.instrumentalness, DATASET, row, "instrumentalness")?,
            liveness: required(&f.liveness, DATASET, row, "liveness")?,
            valence: required(&f.valence, DATASET, row, "valence")?,
            tempo: required(&f.tempo, DATASET, row, "tempo")?,
            duration_ms: required(&f.duration_ms, DATASET, row, "duration_ms")?,
            time_signature: required(&f.time_signature, DATASET, row, "time_signature")?,
            track_id,
        });
    }

    let mut seen = HashSet::new();
    for f in &features {
        if !seen.insert(f.track_id.as_str()) {
            return Err(ValidationError::DuplicateTrackId(f.track_id.clone()));
        }
    }

    Ok(features)
}

/// Key and mode are stored as small integers; anything else cannot be charted.
fn small_int(track_id: &str, column: &'static str, value: i64, max: u8) -> Result<u8, ValidationError> {
    u8::try_from(value)
        .ok()
        .filter(|v| *v <= max)
        .ok_or_else(|| ValidationError::OutOfRange {
            track_id: track_id.to_string(),
            column,
            value,
        })
}

/// Distinct track ids in first-seen order.
fn unique_track_ids(plays: &[IncomingPlay]) -> Vec<String> {
    let mut seen = HashSet::new();
    plays
        .iter()
        .filter_map(|play| play.track_id.clone())
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

/// Runs one ingestion pass against `conn`.
///
/// `now` fixes both the request window (the last 24 hours) and the freshness
/// cut-off (local midnight yesterday).
pub fn run(source: &dyn ListeningSource, conn: &mut Connection, now: DateTime<Local>, limit: u32) -> Result<RunOutcome> {
    let after = (now - Duration::days(1)).with_timezone(&Utc);
    let incoming_plays = source.recently_played(after, limit)?;
    info!("Fetched {} recently played tracks", incoming_plays.len());

    if incoming_plays.is_empty() {
        info!("No tracks played in the last day, nothing to load");
        return Ok(RunOutcome::NothingToLoad);
    }

    let track_ids = unique_track_ids(&incoming_plays);
    let mut incoming_features = Vec::with_capacity(track_ids.len());
    for track_id in &track_ids {
        debug!("Fetching audio features for {track_id}");
        incoming_features.push(source.audio_features(track_id)?);
    }
    info!("Fetched audio features for {} tracks", incoming_features.len());

    let plays = validate_plays(&incoming_plays, now.date_naive())?;
    let features = validate_features(&incoming_features)?;

    db::create_tables(conn)?;
    let summary = db::load(conn, &plays, &features)?;

    Ok(RunOutcome::Loaded(summary))
}
