//! # Selection Stage
//!
//! Narrows the backing table to the rows a chart should consider. The
//! backing table is never touched; every call returns a fresh vector.

use crate::models::{BarAxis, FeatureAxis, JoinedRow};
use chrono::{NaiveDate, NaiveTime};
use log::debug;
use serde::{Deserialize, Serialize};

/// Everything the user has chosen for one chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub date_begin: NaiveDate,
    pub date_end: NaiveDate,
    pub time_begin: NaiveTime,
    pub time_end: NaiveTime,
    pub song_filter: String,
    pub artist_filter: String,
    pub x_axis: FeatureAxis,
    pub y_axis: FeatureAxis,
    pub bar_axis: BarAxis,
    pub show_regression: bool,
}

impl Constraint {
    /// Start-up constraint: the whole date span of `table`, the whole day,
    /// no text filters, Tempo against Duration, key chart.
    #[must_use]
    pub fn initial(table: &[JoinedRow]) -> Self {
        let (date_begin, date_end) = date_span(table).unwrap_or((NaiveDate::MIN, NaiveDate::MAX));

        Self {
            date_begin,
            date_end,
            time_begin: NaiveTime::MIN,
            time_end: end_of_day(),
            song_filter: String::new(),
            artist_filter: String::new(),
            x_axis: FeatureAxis::Tempo,
            y_axis: FeatureAxis::Duration,
            bar_axis: BarAxis::Key,
            show_regression: false,
        }
    }

    /// True when `row` passes every active predicate.
    #[must_use]
    pub fn matches(&self, row: &JoinedRow) -> bool {
        contains_ignore_case(&row.song_name, &self.song_filter)
            && contains_ignore_case(&row.artist_name, &self.artist_filter)
            && self.date_begin <= row.date_played
            && row.date_played <= self.date_end
            && self.time_begin <= row.time_played
            && row.time_played <= self.time_end
    }
}

/// Last representable instant of a day.
#[must_use]
pub fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or(NaiveTime::MIN)
}

/// Earliest and latest play dates, `None` for an empty table.
#[must_use]
pub fn date_span(table: &[JoinedRow]) -> Option<(NaiveDate, NaiveDate)> {
    let first = table.iter().map(|row| row.date_played).min()?;
    let last = table.iter().map(|row| row.date_played).max()?;
    Some((first, last))
}

/// Rows of `table` satisfying `constraint`, in their original order.
///
/// A time range whose begin lies after its end matches nothing; it does not
/// wrap past midnight.
#[must_use]
pub fn filter(table: &[JoinedRow], constraint: &Constraint) -> Vec<JoinedRow> {
    let selected: Vec<JoinedRow> = table
        .iter()
        .filter(|row| constraint.matches(row))
        .cloned()
        .collect();

    debug!("Selected {} of {} plays", selected.len(), table.len());
    selected
}

/// Blank needles (empty or whitespace) match everything.
fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    let needle = needle.trim();
    if needle.is_empty() {
        return true;
    }
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
