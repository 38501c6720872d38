//! Chain engine: groups calendar days into consecutive-day runs.
//!
//! A run is a maximal sequence of days, newest first, in which each day is
//! exactly one day before the previous one. Run lists are ordered the same
//! way: the run holding the most recent day comes first.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::Result;
use crate::timestamp::RawTimestamp;
use crate::zone::ReferenceZone;

/// Consecutive calendar days, newest first
pub type Run = Vec<NaiveDate>;

/// Which chain length to report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChainMode {
    /// The most recent run, if it is still active
    #[default]
    Current,
    /// The largest run ever recorded
    Longest,
}

impl ChainMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainMode::Current => "current",
            ChainMode::Longest => "longest",
        }
    }
}

/// Chain statistics for one owner
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainStats {
    /// Current chain under the requested except-today policy
    pub current: usize,
    /// Longest chain ever
    pub longest: usize,
    /// Distinct days with activity
    pub active_days: usize,
}

/// A deduplicated set of calendar days.
///
/// Several records on the same day collapse to a single entry, so run sizes
/// count distinct days rather than records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateSet {
    days: BTreeSet<NaiveDate>,
}

impl DateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_dates<I>(dates: I) -> Self
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        Self {
            days: dates.into_iter().collect(),
        }
    }

    /// Convert raw timestamps read from `column` into days in `zone`.
    ///
    /// Stops at the first value that cannot be converted; a bad record is
    /// never skipped.
    pub fn from_timestamps(
        raw: &[RawTimestamp],
        column: &str,
        zone: &ReferenceZone,
    ) -> Result<Self> {
        let mut set = Self::new();
        for value in raw {
            set.insert(value.to_date(column, zone)?);
        }
        Ok(set)
    }

    /// Add a day; returns false if it was already present
    pub fn insert(&mut self, day: NaiveDate) -> bool {
        self.days.insert(day)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn contains(&self, day: &NaiveDate) -> bool {
        self.days.contains(day)
    }

    /// Most recent day, if any
    pub fn latest(&self) -> Option<NaiveDate> {
        self.days.last().copied()
    }

    /// Days from most recent to oldest
    pub fn iter_desc(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days.iter().rev().copied()
    }

    /// Partition the set into maximal runs, most recent first
    pub fn runs(&self) -> Vec<Run> {
        group_descending(self.iter_desc())
    }
}

impl FromIterator<NaiveDate> for DateSet {
    fn from_iter<I: IntoIterator<Item = NaiveDate>>(iter: I) -> Self {
        Self::from_dates(iter)
    }
}

impl Extend<NaiveDate> for DateSet {
    fn extend<I: IntoIterator<Item = NaiveDate>>(&mut self, iter: I) {
        self.days.extend(iter);
    }
}

/// Group dates into maximal consecutive-day runs.
///
/// Duplicates are collapsed first. Empty input gives an empty list.
pub fn extract_runs<I>(dates: I) -> Vec<Run>
where
    I: IntoIterator<Item = NaiveDate>,
{
    DateSet::from_dates(dates).runs()
}

// Input must be strictly descending.
fn group_descending(days: impl Iterator<Item = NaiveDate>) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut run: Run = Vec::new();

    for day in days {
        match run.last() {
            // previous day is "tomorrow" relative to this one
            Some(prev) if day.succ_opt() == Some(*prev) => run.push(day),
            Some(_) => {
                runs.push(std::mem::take(&mut run));
                run.push(day);
            }
            None => run.push(day),
        }
    }

    if !run.is_empty() {
        runs.push(run);
    }
    runs
}

/// Reduce a run list to a single chain length.
///
/// `Longest` reports the largest run and ignores `today` and `except_today`.
/// `Current` only looks at the first (most recent) run: it counts if it
/// contains `today`, or, with `except_today`, the day before `today`.
pub fn chain_length(
    runs: &[Run],
    today: NaiveDate,
    mode: ChainMode,
    except_today: bool,
) -> usize {
    let Some(latest) = runs.first() else {
        return 0;
    };

    let length = match mode {
        ChainMode::Longest => longest_run(runs),
        ChainMode::Current => current_length(latest, today, except_today),
    };

    tracing::trace!(
        mode = mode.as_str(),
        except_today,
        runs = runs.len(),
        length,
        "chain length"
    );
    length
}

/// Compute current, longest and active-day counts in one go
pub fn summarize(runs: &[Run], today: NaiveDate, except_today: bool) -> ChainStats {
    ChainStats {
        current: chain_length(runs, today, ChainMode::Current, except_today),
        longest: longest_run(runs),
        active_days: runs.iter().map(Vec::len).sum(),
    }
}

// Only the size is reported, so equal-sized runs need no tie-break.
fn longest_run(runs: &[Run]) -> usize {
    runs.iter().map(Vec::len).max().unwrap_or(0)
}

fn current_length(run: &Run, today: NaiveDate, except_today: bool) -> usize {
    let yesterday = today.pred_opt();
    let active = run.contains(&today)
        || (except_today && yesterday.is_some_and(|day| run.contains(&day)));

    if active {
        run.len()
    } else {
        0 // stale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_empty_runs() {
        assert!(extract_runs(Vec::<NaiveDate>::new()).is_empty());
        let today = day(2024, 3, 10);
        assert_eq!(chain_length(&[], today, ChainMode::Current, false), 0);
        assert_eq!(chain_length(&[], today, ChainMode::Longest, true), 0);
    }

    #[test]
    fn test_single_day_is_one_run() {
        let runs = extract_runs([day(2024, 3, 10)]);
        assert_eq!(runs, vec![vec![day(2024, 3, 10)]]);
    }

    #[test]
    fn test_unsorted_input_is_grouped() {
        let runs = extract_runs([
            day(2024, 3, 8),
            day(2024, 3, 10),
            day(2024, 3, 4),
            day(2024, 3, 9),
            day(2024, 3, 5),
        ]);
        assert_eq!(
            runs,
            vec![
                vec![day(2024, 3, 10), day(2024, 3, 9), day(2024, 3, 8)],
                vec![day(2024, 3, 5), day(2024, 3, 4)],
            ]
        );
    }

    #[test]
    fn test_month_and_year_boundaries() {
        let runs = extract_runs([
            day(2024, 1, 1),
            day(2023, 12, 31),
            day(2024, 3, 1),
            day(2024, 2, 29),
        ]);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0], vec![day(2024, 3, 1), day(2024, 2, 29)]);
        assert_eq!(runs[1], vec![day(2024, 1, 1), day(2023, 12, 31)]);
    }

    #[test]
    fn test_date_set_collapses_duplicates() {
        let mut set = DateSet::from_dates([day(2024, 3, 10), day(2024, 3, 10)]);
        assert_eq!(set.len(), 1);
        assert!(!set.insert(day(2024, 3, 10)));
        assert!(set.insert(day(2024, 3, 9)));
        assert_eq!(set.latest(), Some(day(2024, 3, 10)));

        set.extend([day(2024, 3, 9), day(2024, 3, 7)]);
        assert_eq!(set.len(), 3);
        assert!(set.contains(&day(2024, 3, 7)));
        assert!(!set.contains(&day(2024, 3, 8)));
        assert_eq!(set.runs().len(), 2);
    }

    #[test]
    fn test_current_ignores_older_runs() {
        let today = day(2024, 3, 10);
        let runs = vec![
            vec![day(2024, 3, 10)],
            vec![day(2024, 3, 7), day(2024, 3, 6), day(2024, 3, 5)],
        ];
        assert_eq!(chain_length(&runs, today, ChainMode::Current, false), 1);
        assert_eq!(chain_length(&runs, today, ChainMode::Longest, false), 3);
    }

    #[test]
    fn test_summarize() {
        let today = day(2024, 3, 10);
        let runs = extract_runs([day(2024, 3, 9), day(2024, 3, 8), day(2024, 3, 1)]);
        let stats = summarize(&runs, today, true);
        assert_eq!(
            stats,
            ChainStats {
                current: 2,
                longest: 2,
                active_days: 3
            }
        );

        let strict = summarize(&runs, today, false);
        assert_eq!(strict.current, 0);
    }

    #[test]
    fn test_mode_default_is_current() {
        assert_eq!(ChainMode::default(), ChainMode::Current);
        assert_eq!(ChainMode::Longest.as_str(), "longest");
    }
}
