//! Listening history explorer: audio-feature charts over your play log.
//!
//! Core modules:
//! - [`selection`] - Date, time-of-day and text filtering
//! - [`aggregate`] - Group-by counts, zero-fill and circle sizes
//! - [`regression`] - Least squares trend line and correlation
//! - [`view`] - Scatter and bar chart view models
//! - [`etl`] - Daily ingestion job
//!
//! ### Supporting Modules
//!
//! - [`models`] - Typed play, feature and joined rows
//! - [`db`] - SQLite store for plays and audio features
//! - [`spotify`] - Blocking client for the streaming service API
//! - [`config`] - Configuration and data directory management
//! - [`cli`] - Command-line interface definitions with clap integration
//! - [`completion`] - Shell completion generation
//!
//! ## Quick Start Example
//!
//! ```no_run
//! use tracklens::{config, db, selection::Constraint, view};
//!
//! let conn = db::open(&config::get_db_path()?)?;
//! let backing = db::load_joined(&conn)?;
//!
//! let constraint = Constraint {
//!     artist_filter: "coltrane".to_string(),
//!     show_regression: true,
//!     ..Constraint::initial(&backing)
//! };
//!
//! let scatter = view::render_scatter(&backing, &constraint);
//! println!("{}", scatter.title);
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Pipeline
//!
//! Every chart is recomputed from the immutable backing table whenever the
//! constraint changes:
//!
//! 1. **Filter** rows by date, time of day, song and artist text
//! 2. **Aggregate** counts per category, zero-filling fixed axes
//! 3. **Bucket** occurrence counts into circle sizes (1 → 5, 2–5 → 7, >5 → 10)
//! 4. **Regress** one feature on another over the distinct tracks
//!
//! ## Error Handling
//!
//! Fallible functions return `anyhow::Result`. The ingestion job surfaces
//! [`etl::ValidationError`] and [`spotify::ApiError`] inside that error so
//! callers can downcast. The pipeline stages themselves never fail: empty or
//! degenerate input gives an empty or skipped result.
//!
//! ## Logging
//!
//! Uses the `log` facade; the binary installs `env_logger`, so
//! `RUST_LOG=tracklens=debug tracklens fetch` shows per-request detail.

pub mod aggregate;
pub mod cli;
pub mod completion;
pub mod config;
pub mod db;
pub mod etl;
pub mod models;
pub mod regression;
pub mod selection;
pub mod spotify;
pub mod view;
