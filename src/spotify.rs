//! # Streaming Service Client
//!
//! Blocking client for the two read endpoints the ingestion job needs:
//! the user's recently played tracks and per-track audio features.
//!
//! Responses are decoded into "incoming" records whose fields are all
//! optional. Nothing is trusted until [`crate::etl`] has validated it.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, error};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_BASE: &str = "https://api.spotify.com/v1";

/// Most plays the recently-played endpoint returns per request.
pub const MAX_HISTORY_LIMIT: u32 = 50;

/// A non-success answer from the API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Error {status} from GET {endpoint}")]
    Status { endpoint: String, status: u16 },
    #[error("No response for audio features for track id {track_id} (status {status})")]
    AudioFeatures { track_id: String, status: u16 },
}

/// One play as it arrived from the API.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncomingPlay {
    pub track_id: Option<String>,
    pub song_name: Option<String>,
    pub artist_name: Option<String>,
    pub played_at: Option<String>,
}

/// One track's audio features as they arrived from the API.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IncomingFeatures {
    #[serde(rename = "id")]
    pub track_id: Option<String>,
    pub danceability: Option<f64>,
    pub energy: Option<f64>,
    pub key: Option<i64>,
    pub mode: Option<i64>,
    pub loudness: Option<f64>,
    pub speechiness: Option<f64>,
    pub acousticness: Option<f64>,
    pub instrumentalness: Option<f64>,
    pub liveness: Option<f64>,
    pub valence: Option<f64>,
    pub tempo: Option<f64>,
    pub duration_ms: Option<i64>,
    pub time_signature: Option<i64>,
}

/// Where the ingestion job gets its data from.
pub trait ListeningSource {
    /// Plays after `after`, at most `limit` of them.
    fn recently_played(&self, after: DateTime<Utc>, limit: u32) -> Result<Vec<IncomingPlay>>;

    /// Audio features of a single track.
    fn audio_features(&self, track_id: &str) -> Result<IncomingFeatures>;
}

#[derive(Deserialize)]
struct RecentlyPlayedResponse {
    #[serde(default)]
    items: Vec<PlayHistoryItem>,
}

#[derive(Deserialize)]
struct PlayHistoryItem {
    track: Option<TrackObject>,
    played_at: Option<String>,
}

#[derive(Deserialize)]
struct TrackObject {
    id: Option<String>,
    name: Option<String>,
    album: Option<AlbumObject>,
}

#[derive(Deserialize)]
struct AlbumObject {
    #[serde(default)]
    artists: Vec<ArtistObject>,
}

#[derive(Deserialize)]
struct ArtistObject {
    name: Option<String>,
}

impl From<PlayHistoryItem> for IncomingPlay {
    fn from(item: PlayHistoryItem) -> Self {
        let (track_id, song_name, artist_name) = match item.track {
            Some(track) => {
                // First credited album artist.
                let artist_name = track
                    .album
                    .and_then(|album| album.artists.into_iter().next())
                    .and_then(|artist| artist.name);
                (track.id, track.name, artist_name)
            }
            None => (None, None, None),
        };

        Self {
            track_id,
            song_name,
            artist_name,
            played_at: item.played_at,
        }
    }
}

pub struct SpotifyClient {
    client: Client,
    base_url: String,
    token: String,
}

impl SpotifyClient {
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn get(&self, url: &str) -> Result<reqwest::blocking::Response> {
        debug!("GET {url}");
        self.client
            .get(url)
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .send()
            .with_context(|| format!("Request to {url} failed"))
    }
}

impl ListeningSource for SpotifyClient {
    fn recently_played(&self, after: DateTime<Utc>, limit: u32) -> Result<Vec<IncomingPlay>> {
        let url = format!(
            "{}/me/player/recently-played?limit={}&after={}",
            self.base_url,
            limit.min(MAX_HISTORY_LIMIT),
            after.timestamp_millis()
        );
        let response = self.get(&url)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            error!("Error {} from GET request: {}", status.as_u16(), body);
            return Err(ApiError::Status {
                endpoint: "recently-played".to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        let body: RecentlyPlayedResponse = response
            .json()
            .context("Malformed recently-played response")?;

        Ok(body.items.into_iter().map(IncomingPlay::from).collect())
    }

    fn audio_features(&self, track_id: &str) -> Result<IncomingFeatures> {
        let url = format!("{}/audio-features/{}", self.base_url, track_id);
        let response = self.get(&url)?;

        let status = response.status();
        if !status.is_success() {
            error!("Error {}", status.as_u16());
            return Err(ApiError::AudioFeatures {
                track_id: track_id.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        response
            .json()
            .with_context(|| format!("Malformed audio features response for track {track_id}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_recently_played() {
        let json = r#"{
            "items": [
                {
                    "track": {
                        "id": "4uLU6hMCjMI75M1A2tKUQC",
                        "name": "Never Gonna Give You Up",
                        "album": { "artists": [ { "name": "Rick Astley" }, { "name": "Other" } ] }
                    },
                    "played_at": "2024-05-01T10:15:30.123Z"
                },
                { "track": null, "played_at": "2024-05-01T10:20:00.000Z" }
            ],
            "next": null
        }"#;
        let body: RecentlyPlayedResponse = serde_json::from_str(json).unwrap();
        let plays: Vec<IncomingPlay> = body.items.into_iter().map(IncomingPlay::from).collect();

        assert_eq!(plays.len(), 2);
        assert_eq!(plays[0].track_id.as_deref(), Some("4uLU6hMCjMI75M1A2tKUQC"));
        assert_eq!(plays[0].artist_name.as_deref(), Some("Rick Astley"));
        assert_eq!(plays[0].played_at.as_deref(), Some("2024-05-01T10:15:30.123Z"));
        assert_eq!(plays[1].track_id, None);
        assert_eq!(plays[1].song_name, None);
    }

    #[test]
    fn test_decode_audio_features_drops_extra_fields() {
        let json = r#"{
            "danceability": 0.735, "energy": 0.578, "key": 5, "loudness": -11.84,
            "mode": 0, "speechiness": 0.0461, "acousticness": 0.514,
            "instrumentalness": 0.0902, "liveness": 0.159, "valence": 0.636,
            "tempo": 98.002, "type": "audio_features", "id": "06AKEBrKUckW0KREUWRnvT",
            "uri": "spotify:track:06AKEBrKUckW0KREUWRnvT",
            "track_href": "https://api.spotify.com/v1/tracks/06AKEBrKUckW0KREUWRnvT",
            "analysis_url": "https://api.spotify.com/v1/audio-analysis/06AKEBrKUckW0KREUWRnvT",
            "duration_ms": 255349, "time_signature": 4
        }"#;
        let features: IncomingFeatures = serde_json::from_str(json).unwrap();
        assert_eq!(features.track_id.as_deref(), Some("06AKEBrKUckW0KREUWRnvT"));
        assert_eq!(features.key, Some(5));
        assert_eq!(features.duration_ms, Some(255_349));
    }

    #[test]
    fn test_missing_feature_fields_decode_as_none() {
        let features: IncomingFeatures = serde_json::from_str(r#"{"id": "x", "tempo": null}"#).unwrap();
        assert_eq!(features.tempo, None);
        assert_eq!(features.energy, None);
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = SpotifyClient::new("http://localhost:9/v1/", "token", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url, "http://localhost:9/v1");
    }
}
