//! # Listening History Records
//!
//! Typed rows for the two stored datasets and their left join, plus the
//! categorical enums used to label chart axes.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One historical play of a track, as stored in `track_plays`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayEvent {
    pub track_id: String,
    pub song_name: String,
    pub artist_name: String,
    pub played_at: DateTime<Utc>,
}

impl PlayEvent {
    /// Calendar date of the play.
    #[must_use]
    pub fn date_played(&self) -> NaiveDate {
        self.played_at.date_naive()
    }

    /// Time of day of the play, date discarded.
    #[must_use]
    pub fn time_played(&self) -> NaiveTime {
        self.played_at.time()
    }
}

/// Audio analysis for one distinct track, as stored in `audio_features`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    pub track_id: String,
    pub danceability: f64,
    pub energy: f64,
    pub key: u8,
    pub mode: u8,
    pub loudness: f64,
    pub speechiness: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
    pub liveness: f64,
    pub valence: f64,
    pub tempo: f64,
    pub duration_ms: i64,
    pub time_signature: i64,
}

impl AudioFeatures {
    /// Duration rounded to whole seconds.
    #[must_use]
    pub fn duration_s(&self) -> f64 {
        (self.duration_ms as f64 / 1000.0).round()
    }

    /// Value of a continuous feature column.
    #[must_use]
    pub fn value(&self, axis: FeatureAxis) -> f64 {
        match axis {
            FeatureAxis::Tempo => self.tempo,
            FeatureAxis::Duration => self.duration_s(),
            FeatureAxis::Danceability => self.danceability,
            FeatureAxis::Energy => self.energy,
            FeatureAxis::Loudness => self.loudness,
            FeatureAxis::Speechiness => self.speechiness,
            FeatureAxis::Acousticness => self.acousticness,
            FeatureAxis::Instrumentalness => self.instrumentalness,
            FeatureAxis::Liveness => self.liveness,
            FeatureAxis::Valence => self.valence,
        }
    }
}

/// A play joined with its track's features.
///
/// `date_played` and `time_played` are derived once when the row is built and
/// never recomputed. `features` is `None` when the store has no analysis for
/// the track.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinedRow {
    pub track_id: String,
    pub song_name: String,
    pub artist_name: String,
    pub played_at: DateTime<Utc>,
    pub date_played: NaiveDate,
    pub time_played: NaiveTime,
    pub features: Option<AudioFeatures>,
}

impl JoinedRow {
    #[must_use]
    pub fn new(play: PlayEvent, features: Option<AudioFeatures>) -> Self {
        let date_played = play.date_played();
        let time_played = play.time_played();
        Self {
            track_id: play.track_id,
            song_name: play.song_name,
            artist_name: play.artist_name,
            played_at: play.played_at,
            date_played,
            time_played,
            features,
        }
    }

    #[must_use]
    pub fn feature(&self, axis: FeatureAxis) -> Option<f64> {
        self.features.as_ref().map(|f| f.value(axis))
    }
}

/// Continuous feature columns selectable on the scatter plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum FeatureAxis {
    Tempo,
    Duration,
    Danceability,
    Energy,
    Loudness,
    Speechiness,
    Acousticness,
    Instrumentalness,
    Liveness,
    Valence,
}

impl FeatureAxis {
    pub const ALL: [FeatureAxis; 10] = [
        FeatureAxis::Tempo,
        FeatureAxis::Duration,
        FeatureAxis::Danceability,
        FeatureAxis::Energy,
        FeatureAxis::Loudness,
        FeatureAxis::Speechiness,
        FeatureAxis::Acousticness,
        FeatureAxis::Instrumentalness,
        FeatureAxis::Liveness,
        FeatureAxis::Valence,
    ];

    /// Axis label shown to the user.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            FeatureAxis::Tempo => "Tempo",
            FeatureAxis::Duration => "Duration (sec)",
            FeatureAxis::Danceability => "Danceability",
            FeatureAxis::Energy => "Energy",
            FeatureAxis::Loudness => "Loudness",
            FeatureAxis::Speechiness => "Speechiness",
            FeatureAxis::Acousticness => "Acousticness",
            FeatureAxis::Instrumentalness => "Instrumentalness",
            FeatureAxis::Liveness => "Liveness",
            FeatureAxis::Valence => "Valence",
        }
    }

    /// Look up an axis by its label.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|axis| axis.label() == label)
    }
}

impl fmt::Display for FeatureAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Categorical columns selectable on the bar chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum BarAxis {
    Key,
    TimeSignature,
}

impl BarAxis {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            BarAxis::Key => "Key",
            BarAxis::TimeSignature => "Time Signature",
        }
    }
}

impl fmt::Display for BarAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

const FLAT: char = '\u{266D}';
const SHARP: char = '\u{266F}';

/// Standard pitch-class integer notation, 0 = C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PitchClass(u8);

impl PitchClass {
    /// Returns `None` outside 0–11.
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if value < 12 {
            Some(Self(value))
        } else {
            None
        }
    }

    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = PitchClass> {
        (0..12).map(PitchClass)
    }

    #[must_use]
    pub fn name(self) -> String {
        match self.0 {
            0 => "C".to_string(),
            1 => format!("D{FLAT}"),
            2 => "D".to_string(),
            3 => format!("E{FLAT}"),
            4 => "E".to_string(),
            5 => "F".to_string(),
            6 => format!("F{SHARP}"),
            7 => "G".to_string(),
            8 => format!("A{FLAT}"),
            9 => "A".to_string(),
            10 => format!("B{FLAT}"),
            _ => "B".to_string(),
        }
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Major/minor modality. Ordered by its stored integer value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Mode {
    Minor,
    Major,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::Minor, Mode::Major];

    /// 0 is minor, 1 is major; anything else is not a mode.
    #[must_use]
    pub const fn from_value(value: u8) -> Option<Self> {
        match value {
            0 => Some(Mode::Minor),
            1 => Some(Mode::Major),
            _ => None,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Mode::Minor => "Minor",
            Mode::Major => "Major",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
