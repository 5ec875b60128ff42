//! # Listening Store
//!
//! SQLite persistence for the `track_plays` and `audio_features` tables.
//! The ingestion job writes here; the charts read the left join back as
//! [`JoinedRow`]s.

use crate::models::{AudioFeatures, JoinedRow, PlayEvent};
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, info};
use rusqlite::{params, Connection, Transaction};
use std::path::Path;

/// Open (or create) the database at `db_path`.
pub fn connect(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)
        .with_context(|| format!("SQLite connection refused. DB location: {}", db_path.display()))?;

    Ok(conn)
}

/// Creates both tables if they do not already exist. Safe to call on every run.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS track_plays (
            track_id    TEXT NOT NULL,
            song_name   TEXT NOT NULL,
            artist_name TEXT NOT NULL,
            played_at   TEXT NOT NULL,
            timestamp   TEXT NOT NULL,
            PRIMARY KEY (played_at)
        );
        CREATE TABLE IF NOT EXISTS audio_features (
            danceability     REAL    NOT NULL,
            energy           REAL    NOT NULL,
            key              INTEGER NOT NULL,
            mode             INTEGER NOT NULL,
            loudness         REAL    NOT NULL,
            speechiness      REAL    NOT NULL,
            acousticness     REAL    NOT NULL,
            instrumentalness REAL    NOT NULL,
            liveness         REAL    NOT NULL,
            valence          REAL    NOT NULL,
            tempo            REAL    NOT NULL,
            track_id         TEXT    NOT NULL,
            duration_ms      INTEGER NOT NULL,
            time_signature   INTEGER NOT NULL,
            PRIMARY KEY (track_id)
        );",
    )
    .context("Invalid SQL command when CREATEing track_plays and audio_features tables.")?;

    Ok(())
}

/// Opens the database and makes sure the schema exists.
pub fn open(db_path: &Path) -> Result<Connection> {
    let conn = connect(db_path)?;
    create_tables(&conn)?;
    Ok(conn)
}

/// Writes a validated batch in one transaction.
///
/// Plays are appended; a `played_at` already in the store fails the whole
/// batch. Features for a track already in the store are skipped.
pub fn load(conn: &mut Connection, plays: &[PlayEvent], features: &[AudioFeatures]) -> Result<LoadSummary> {
    let tx = conn.transaction()?;

    let plays_inserted = insert_plays(&tx, plays)?;
    let features_inserted = insert_features(&tx, features)?;

    tx.commit().context("Commiting SQL transaction failed.")?;

    let summary = LoadSummary { plays_inserted, features_inserted };
    info!(
        "Loaded {} plays and {} new audio feature rows ({} already known)",
        summary.plays_inserted,
        summary.features_inserted,
        features.len() - summary.features_inserted
    );
    Ok(summary)
}

/// Rows written by [`load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub plays_inserted: usize,
    pub features_inserted: usize,
}

fn insert_plays(tx: &Transaction<'_>, plays: &[PlayEvent]) -> Result<usize> {
    let mut stmt = tx.prepare(
        "INSERT INTO track_plays (track_id, song_name, artist_name, played_at, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;

    for play in plays {
        stmt.execute(params![
            play.track_id,
            play.song_name,
            play.artist_name,
            format_played_at(&play.played_at),
            play.played_at.format("%Y-%m-%d").to_string(),
        ])
        .with_context(|| format!("Failed to INSERT play INTO track_plays: {play:?}"))?;
    }

    Ok(plays.len())
}

fn insert_features(tx: &Transaction<'_>, features: &[AudioFeatures]) -> Result<usize> {
    let mut stmt = tx.prepare(
        "INSERT OR IGNORE INTO audio_features (
            danceability, energy, key, mode, loudness, speechiness, acousticness,
            instrumentalness, liveness, valence, tempo, track_id, duration_ms, time_signature
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
    )?;

    let mut inserted = 0;
    for f in features {
        inserted += stmt
            .execute(params![
                f.danceability,
                f.energy,
                f.key,
                f.mode,
                f.loudness,
                f.speechiness,
                f.acousticness,
                f.instrumentalness,
                f.liveness,
                f.valence,
                f.tempo,
                f.track_id,
                f.duration_ms,
                f.time_signature,
            ])
            .with_context(|| format!("Failed to INSERT audio features for track {}", f.track_id))?;
    }

    Ok(inserted)
}

/// Timestamps are stored as fixed-width UTC RFC 3339 so they sort as text.
fn format_played_at(played_at: &DateTime<Utc>) -> String {
    played_at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_played_at(raw: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("Stored played_at is not an RFC 3339 timestamp: {raw}"))?;
    Ok(parsed.with_timezone(&Utc))
}

/// Reads every play left-joined with its audio features, oldest first.
pub fn load_joined(conn: &Connection) -> Result<Vec<JoinedRow>> {
    let mut stmt = conn
        .prepare(
            "SELECT p.track_id, p.song_name, p.artist_name, p.played_at,
                    f.track_id, f.danceability, f.energy, f.key, f.mode, f.loudness,
                    f.speechiness, f.acousticness, f.instrumentalness, f.liveness,
                    f.valence, f.tempo, f.duration_ms, f.time_signature
             FROM track_plays p
             LEFT JOIN audio_features f ON f.track_id = p.track_id
             ORDER BY p.played_at",
        )
        .context("Invalid SQL statement when SELECTing joined plays.")?;

    let raw_rows = stmt
        .query_map([], |row| {
            let play = (
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            );
            let features = match row.get::<_, Option<String>>(4)? {
                Some(track_id) => Some(AudioFeatures {
                    track_id,
                    danceability: row.get(5)?,
                    energy: row.get(6)?,
                    key: row.get(7)?,
                    mode: row.get(8)?,
                    loudness: row.get(9)?,
                    speechiness: row.get(10)?,
                    acousticness: row.get(11)?,
                    instrumentalness: row.get(12)?,
                    liveness: row.get(13)?,
                    valence: row.get(14)?,
                    tempo: row.get(15)?,
                    duration_ms: row.get(16)?,
                    time_signature: row.get(17)?,
                }),
                None => None,
            };
            Ok((play, features))
        })
        .context("Cannot query joined plays.")?;

    let mut rows = Vec::new();
    for raw in raw_rows {
        let ((track_id, song_name, artist_name, played_at), features) =
            raw.context("Queried play unwrap failed.")?;
        let play = PlayEvent {
            track_id,
            song_name,
            artist_name,
            played_at: parse_played_at(&played_at)?,
        };
        rows.push(JoinedRow::new(play, features));
    }

    debug!("Loaded {} joined plays", rows.len());
    Ok(rows)
}

/// Most recent `limit` plays, newest first.
pub fn recent_plays(conn: &Connection, limit: u32) -> Result<Vec<PlayEvent>> {
    let mut stmt = conn
        .prepare(
            "SELECT track_id, song_name, artist_name, played_at
             FROM track_plays ORDER BY played_at DESC LIMIT ?1",
        )
        .context("Invalid SQL statement when SELECTing recent plays.")?;

    let raw_rows = stmt
        .query_map([limit], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })
        .context("Cannot query recent plays.")?;

    let mut plays = Vec::new();
    for raw in raw_rows {
        let (track_id, song_name, artist_name, played_at) = raw?;
        plays.push(PlayEvent {
            track_id,
            song_name,
            artist_name,
            played_at: parse_played_at(&played_at)?,
        });
    }

    Ok(plays)
}

/// Row counts of `(track_plays, audio_features)`.
pub fn table_counts(conn: &Connection) -> Result<(i64, i64)> {
    let plays = conn.query_row("SELECT COUNT(*) FROM track_plays", [], |row| row.get(0))?;
    let features = conn.query_row("SELECT COUNT(*) FROM audio_features", [], |row| row.get(0))?;
    Ok((plays, features))
}
