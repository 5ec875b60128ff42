//! # Chart View Models
//!
//! Each chart is a pure function of the backing table and the current
//! [`Constraint`]: every change recomputes the whole view from scratch.
//!
//! ```text
//! backing table ──filter──▶ selection ──aggregate──▶ counts ──regress──▶ view
//! ```

use crate::aggregate::{self, KeyBar, KeyModeCount, TimeSignatureCount};
use crate::models::{BarAxis, JoinedRow};
use crate::regression::{self, display2, RegressionResult};
use crate::selection::{self, Constraint};
use serde::Serialize;
use std::fmt;

/// One plotted track.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub track_name: String,
    pub artist_name: String,
    pub count: usize,
    pub circle_size: u32,
}

/// Trend line through the plotted points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendLine {
    pub fit: RegressionResult,
    /// `(x, predicted y)` for every plotted point.
    pub points: Vec<(f64, f64)>,
    pub tooltip: [(String, String); 2],
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterView {
    pub title: String,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub plays_selected: usize,
    pub correlation: f64,
    pub points: Vec<ScatterPoint>,
    /// `None` when fewer than two distinct tracks are plotted.
    pub trend: Option<TrendLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Bars {
    Key { counts: Vec<KeyModeCount>, bars: Vec<KeyBar> },
    TimeSignature { counts: Vec<TimeSignatureCount> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarView {
    pub title: String,
    pub x_label: &'static str,
    pub plays_selected: usize,
    pub bars: Bars,
}

/// Builds the scatter plot for `constraint`.
///
/// Occurrence counts are taken over every selected play; the plot then shows
/// each track once. Tracks with no audio features cannot be placed and are
/// left off the plot, though their plays still count toward the title.
#[must_use]
pub fn render_scatter(backing: &[JoinedRow], constraint: &Constraint) -> ScatterView {
    let selected = selection::filter(backing, constraint);
    let plays_selected = selected.len();

    let unique = aggregate::dedup_by_track(aggregate::occurrence_counts(&selected));

    let points: Vec<ScatterPoint> = unique
        .into_iter()
        .filter_map(|counted| {
            let x = counted.row.feature(constraint.x_axis)?;
            let y = counted.row.feature(constraint.y_axis)?;
            Some(ScatterPoint {
                x,
                y,
                track_name: counted.row.song_name,
                artist_name: counted.row.artist_name,
                count: counted.count,
                circle_size: counted.circle_size,
            })
        })
        .collect();

    let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.y).collect();

    let correlation = regression::pearson(&xs, &ys);
    let trend = regression::fit_linear(&xs, &ys).map(|fit| TrendLine {
        points: xs.iter().map(|&x| (x, fit.predict(x))).collect(),
        tooltip: fit.tooltip(),
        visible: constraint.show_regression,
        fit,
    });

    ScatterView {
        title: format!(
            "{plays_selected} track plays selected, correlation: {}",
            display2(correlation)
        ),
        x_label: constraint.x_axis.label(),
        y_label: constraint.y_axis.label(),
        plays_selected,
        correlation,
        points,
        trend,
    }
}

/// Builds the bar chart for `constraint.bar_axis`.
#[must_use]
pub fn render_bars(backing: &[JoinedRow], constraint: &Constraint) -> BarView {
    let selected = selection::filter(backing, constraint);

    let bars = match constraint.bar_axis {
        BarAxis::Key => {
            let counts = aggregate::key_mode_counts(&selected);
            let bars = aggregate::key_bars(&counts);
            Bars::Key { counts, bars }
        }
        BarAxis::TimeSignature => Bars::TimeSignature {
            counts: aggregate::time_signature_counts(&selected),
        },
    };

    BarView {
        title: format!("{} track plays selected", selected.len()),
        x_label: constraint.bar_axis.label(),
        plays_selected: selected.len(),
        bars,
    }
}

/// Plain-text rendering for the terminal.
impl fmt::Display for ScatterView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{:>10}  {:>10}  {:>5}  {:<40}  {}", self.x_label, self.y_label, "Plays", "Track", "Artist")?;
        for point in &self.points {
            writeln!(
                f,
                "{:>10.3}  {:>10.3}  {:>5}  {:<40}  {}",
                point.x, point.y, point.count, point.track_name, point.artist_name
            )?;
        }
        if let Some(trend) = self.trend.as_ref().filter(|t| t.visible) {
            writeln!(f)?;
            for (label, value) in &trend.tooltip {
                writeln!(f, "{label} {value}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for BarView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        match &self.bars {
            Bars::Key { bars, .. } => {
                writeln!(f, "{:<4}  {:>6}  {:>6}", self.x_label, "Major", "Minor")?;
                for bar in bars {
                    writeln!(f, "{:<4}  {:>6}  {:>6}", bar.key, bar.major, bar.minor)?;
                }
            }
            Bars::TimeSignature { counts } => {
                writeln!(f, "{:<14}  {:>6}", self.x_label, "Count")?;
                for entry in counts {
                    writeln!(f, "{:<14}  {:>6}", entry.time_signature, entry.count)?;
                }
            }
        }
        Ok(())
    }
}
