//! # Aggregation Stage
//!
//! Group-by counting for the bar charts and the scatter plot's occurrence
//! counts. Bar chart aggregations always zero-fill their fixed category axis,
//! so an empty selection still yields a full set of bars.

use crate::models::{JoinedRow, Mode, PitchClass};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Time signatures always shown on the time signature chart.
pub const TIME_SIGNATURE_RANGE: std::ops::RangeInclusive<i64> = 2..=9;

/// Plays per (pitch class, mode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KeyModeCount {
    pub pitch: PitchClass,
    pub mode: Mode,
    pub count: usize,
}

/// One dodged bar pair on the key chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyBar {
    pub key: String,
    pub major: usize,
    pub minor: usize,
}

/// Plays per time signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeSignatureCount {
    pub time_signature: i64,
    pub count: usize,
}

/// A row annotated with how often its (song, artist) pair was played.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountedRow {
    pub row: JoinedRow,
    pub count: usize,
    pub circle_size: u32,
}

/// Point radius tier for a track played `count` times.
///
/// Only meaningful for `count >= 1`; a listed track was played at least once.
#[must_use]
pub const fn bucket_size(count: usize) -> u32 {
    match count {
        0 | 1 => 5,
        2..=5 => 7,
        _ => 10,
    }
}

/// Counts plays per key and mode, returning all 24 combinations ordered by
/// pitch class then mode. Rows without features, or with an out-of-range key
/// or mode, are not counted.
#[must_use]
pub fn key_mode_counts(rows: &[JoinedRow]) -> Vec<KeyModeCount> {
    let mut counts: BTreeMap<(PitchClass, Mode), usize> = PitchClass::all()
        .flat_map(|pitch| Mode::ALL.into_iter().map(move |mode| ((pitch, mode), 0)))
        .collect();

    for features in rows.iter().filter_map(|row| row.features.as_ref()) {
        if let (Some(pitch), Some(mode)) = (PitchClass::new(features.key), Mode::from_value(features.mode)) {
            *counts.entry((pitch, mode)).or_insert(0) += 1;
        }
    }

    counts
        .into_iter()
        .map(|((pitch, mode), count)| KeyModeCount { pitch, mode, count })
        .collect()
}

/// Reshapes key/mode counts into one bar pair per pitch class.
#[must_use]
pub fn key_bars(counts: &[KeyModeCount]) -> Vec<KeyBar> {
    let mut bars: BTreeMap<PitchClass, (usize, usize)> = BTreeMap::new();
    for entry in counts {
        let (major, minor) = bars.entry(entry.pitch).or_insert((0, 0));
        match entry.mode {
            Mode::Major => *major += entry.count,
            Mode::Minor => *minor += entry.count,
        }
    }

    bars.into_iter()
        .map(|(pitch, (major, minor))| KeyBar { key: pitch.name(), major, minor })
        .collect()
}

/// Counts plays per time signature, zero-filling 2 through 9. Signatures
/// outside that range are kept; the result is sorted ascending.
#[must_use]
pub fn time_signature_counts(rows: &[JoinedRow]) -> Vec<TimeSignatureCount> {
    let mut counts: BTreeMap<i64, usize> = TIME_SIGNATURE_RANGE.map(|ts| (ts, 0)).collect();

    for features in rows.iter().filter_map(|row| row.features.as_ref()) {
        *counts.entry(features.time_signature).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|(time_signature, count)| TimeSignatureCount { time_signature, count })
        .collect()
}

/// Joins each row with the number of plays sharing its song and artist name.
/// Counting happens over `rows` as given, before any de-duplication.
#[must_use]
pub fn occurrence_counts(rows: &[JoinedRow]) -> Vec<CountedRow> {
    let mut counts: HashMap<(&str, &str), usize> = HashMap::new();
    for row in rows {
        *counts
            .entry((row.song_name.as_str(), row.artist_name.as_str()))
            .or_insert(0) += 1;
    }

    rows.iter()
        .map(|row| {
            let count = counts
                .get(&(row.song_name.as_str(), row.artist_name.as_str()))
                .copied()
                .unwrap_or(0);
            CountedRow { row: row.clone(), count, circle_size: bucket_size(count) }
        })
        .collect()
}

/// Keeps the first row seen for each track id.
#[must_use]
pub fn dedup_by_track(rows: Vec<CountedRow>) -> Vec<CountedRow> {
    let mut seen = std::collections::HashSet::new();
    rows.into_iter()
        .filter(|counted| seen.insert(counted.row.track_id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AudioFeatures, PlayEvent};
    use chrono::{TimeZone, Utc};

    fn features(track: &str, key: u8, mode: u8, time_signature: i64) -> AudioFeatures {
        AudioFeatures {
            track_id: track.to_string(),
            danceability: 0.5,
            energy: 0.5,
            key,
            mode,
            loudness: -6.0,
            speechiness: 0.05,
            acousticness: 0.2,
            instrumentalness: 0.0,
            liveness: 0.1,
            valence: 0.4,
            tempo: 110.0,
            duration_ms: 180_000,
            time_signature,
        }
    }

    fn play(track: &str, song: &str, minute: u32, features: Option<AudioFeatures>) -> JoinedRow {
        JoinedRow::new(
            PlayEvent {
                track_id: track.to_string(),
                song_name: song.to_string(),
                artist_name: "Artist".to_string(),
                played_at: Utc.with_ymd_and_hms(2024, 2, 1, 12, minute, 0).unwrap(),
            },
            features,
        )
    }

    #[test]
    fn test_bucket_size() {
        assert_eq!(bucket_size(1), 5);
        assert_eq!(bucket_size(2), 7);
        assert_eq!(bucket_size(3), 7);
        assert_eq!(bucket_size(5), 7);
        assert_eq!(bucket_size(6), 10);
        assert_eq!(bucket_size(100), 10);
    }

    #[test]
    fn test_key_mode_counts_zero_fill_on_empty() {
        let counts = key_mode_counts(&[]);
        assert_eq!(counts.len(), 24);
        assert!(counts.iter().all(|c| c.count == 0));
        assert_eq!(counts[0].pitch.name(), "C");
        assert_eq!(counts[0].mode, Mode::Minor);
        assert_eq!(counts[1].mode, Mode::Major);
        assert_eq!(counts[23].pitch.name(), "B");
    }

    #[test]
    fn test_key_mode_counts() {
        let rows = vec![
            play("a", "A", 0, Some(features("a", 0, 1, 4))),
            play("a", "A", 1, Some(features("a", 0, 1, 4))),
            play("b", "B", 2, Some(features("b", 6, 0, 3))),
            play("c", "C", 3, None),
        ];
        let counts = key_mode_counts(&rows);
        assert_eq!(counts.len(), 24);
        let c_major = counts.iter().find(|c| c.pitch.value() == 0 && c.mode == Mode::Major).unwrap();
        assert_eq!(c_major.count, 2);
        let f_sharp_minor = counts.iter().find(|c| c.pitch.value() == 6 && c.mode == Mode::Minor).unwrap();
        assert_eq!(f_sharp_minor.count, 1);
        assert_eq!(counts.iter().map(|c| c.count).sum::<usize>(), 3);

        let bars = key_bars(&counts);
        assert_eq!(bars.len(), 12);
        assert_eq!(bars[0], KeyBar { key: "C".to_string(), major: 2, minor: 0 });
        assert_eq!(bars[6], KeyBar { key: "F♯".to_string(), major: 0, minor: 1 });
    }

    #[test]
    fn test_time_signature_counts_keep_outliers() {
        let rows = vec![
            play("a", "A", 0, Some(features("a", 0, 1, 4))),
            play("b", "B", 1, Some(features("b", 0, 1, 1))),
            play("c", "C", 2, Some(features("c", 0, 1, 11))),
            play("d", "D", 3, Some(features("d", 0, 1, 4))),
        ];
        let counts = time_signature_counts(&rows);
        let signatures: Vec<i64> = counts.iter().map(|c| c.time_signature).collect();
        assert_eq!(signatures, vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 11]);
        assert_eq!(counts[3], TimeSignatureCount { time_signature: 4, count: 2 });
        assert_eq!(counts[0].count, 1);
        assert_eq!(counts[9].count, 1);
    }

    #[test]
    fn test_time_signature_counts_zero_fill_on_empty() {
        let counts = time_signature_counts(&[]);
        assert_eq!(counts.len(), 8);
        assert!(counts.iter().all(|c| c.count == 0));
    }

    #[test]
    fn test_occurrence_counts_and_dedup() {
        let rows = vec![
            play("a", "Repeat", 0, None),
            play("b", "Once", 1, None),
            play("a", "Repeat", 2, None),
        ];
        let counted = occurrence_counts(&rows);
        assert_eq!(counted.len(), 3);
        assert_eq!(counted[0].count, 2);
        assert_eq!(counted[0].circle_size, 7);
        assert_eq!(counted[1].count, 1);
        assert_eq!(counted[1].circle_size, 5);

        let unique = dedup_by_track(counted);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].row.track_id, "a");
        assert_eq!(unique[0].row.played_at.format("%M").to_string(), "00");
    }
}
