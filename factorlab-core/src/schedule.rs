//! Rebalance scheduling: calendar boundaries resolved onto trading rows.
//!
//! Every calendar boundary between the first and last panel date is mapped
//! to the nearest trading row (either direction, ties to the later row). A
//! boundary resolving to row 0 is pushed to row 1 so each rebalance sees at
//! least one bar of trailing history. Several boundaries may resolve to the
//! same row; they are all reported and left for the consumer to collapse.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RebalanceFrequency {
    /// First calendar day of each month.
    MonthStart,
    /// Last calendar day of each month.
    #[default]
    MonthEnd,
    /// Each week, labelled by its Friday.
    WeeklyFriday,
}

impl RebalanceFrequency {
    /// Parse a frequency code. Unknown codes fall back to month end.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "M" | "ME" => Self::MonthEnd,
            "MS" => Self::MonthStart,
            "W" | "W-FRI" => Self::WeeklyFriday,
            other => {
                tracing::warn!(code = other, "unknown rebalance frequency, using month end");
                Self::MonthEnd
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::MonthStart => "MS",
            Self::MonthEnd => "M",
            Self::WeeklyFriday => "W-FRI",
        }
    }

    /// Calendar label of the period containing `date`.
    fn label(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::MonthStart => first_of_month(date),
            Self::MonthEnd => last_of_month(date),
            Self::WeeklyFriday => {
                let ahead = (Weekday::Fri.num_days_from_monday() + 7
                    - date.weekday().num_days_from_monday())
                    % 7;
                date + Duration::days(i64::from(ahead))
            }
        }
    }

    /// Label of the period after the one labelled `label`.
    fn next_label(&self, label: NaiveDate) -> NaiveDate {
        match self {
            Self::MonthStart => first_of_month(last_of_month(label) + Duration::days(1)),
            Self::MonthEnd => last_of_month(label + Duration::days(1)),
            Self::WeeklyFriday => label + Duration::days(7),
        }
    }
}

impl From<String> for RebalanceFrequency {
    fn from(code: String) -> Self {
        Self::from_code(&code)
    }
}

impl From<&str> for RebalanceFrequency {
    fn from(code: &str) -> Self {
        Self::from_code(code)
    }
}

impl From<RebalanceFrequency> for String {
    fn from(freq: RebalanceFrequency) -> Self {
        freq.code().to_string()
    }
}

impl fmt::Display for RebalanceFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn last_of_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

/// One scheduled rebalance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalanceEvent {
    /// Calendar boundary that produced the event.
    pub calendar_date: NaiveDate,
    /// Resolved row in the price index.
    pub index: usize,
    /// Trading date at `index`.
    pub date: NaiveDate,
}

/// Calendar boundaries covering `[first, last]` at the given frequency.
pub fn calendar_boundaries(
    first: NaiveDate,
    last: NaiveDate,
    freq: RebalanceFrequency,
) -> Vec<NaiveDate> {
    if last < first {
        return Vec::new();
    }
    let end = freq.label(last);
    let mut label = freq.label(first);
    let mut out = Vec::new();
    while label <= end {
        out.push(label);
        label = freq.next_label(label);
    }
    out
}

/// Row of the date nearest to `target`. Equidistant ties go to the later row.
pub fn nearest_index(dates: &[NaiveDate], target: NaiveDate) -> Option<usize> {
    if dates.is_empty() {
        return None;
    }
    let i = dates.partition_point(|d| *d < target);
    if i == 0 {
        return Some(0);
    }
    if i == dates.len() {
        return Some(dates.len() - 1);
    }
    let before = target - dates[i - 1];
    let after = dates[i] - target;
    Some(if after <= before { i } else { i - 1 })
}

/// Rebalance events for a trading index, in calendar order.
pub fn schedule(dates: &[NaiveDate], freq: RebalanceFrequency) -> Vec<RebalanceEvent> {
    let (Some(&first), Some(&last)) = (dates.first(), dates.last()) else {
        return Vec::new();
    };
    calendar_boundaries(first, last, freq)
        .into_iter()
        .filter_map(|calendar_date| {
            let mut index = nearest_index(dates, calendar_date)?;
            if index == 0 && dates.len() > 1 {
                index = 1;
            }
            Some(RebalanceEvent {
                calendar_date,
                index,
                date: dates[index],
            })
        })
        .collect()
}
