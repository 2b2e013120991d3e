//! Streak and statistics calculator.
//!
//! Pure functions over a user's dated journal records: weekly/monthly/total
//! counts, consecutive-day streaks, most-active weekday and category, and a
//! monthly average. Everything here is a function of its inputs and the
//! caller-supplied "today" — no clock reads, no I/O — so stats are always
//! consistent with the record set they were computed from.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc, Weekday};
use serde::Serialize;

/// The minimal slice of a journal record the calculator needs: the calendar
/// day it belongs to and when the row was created.
#[derive(Debug, Clone, Copy)]
pub struct DatedRecord {
    pub diary_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Derived statistics for the milestone view. Recomputed on every request;
/// never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneStats {
    pub weekly_count: u32,
    pub monthly_count: u32,
    pub total_count: u32,
    pub streak_days: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_active_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_active_category_count: Option<u32>,
    pub monthly_average: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_active_day: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_active_day_count: Option<u32>,
}

/// Compute milestone statistics for one user.
///
/// `records` is the all-time record list (any order); rows dated after
/// `today` are ignored, matching the epoch-floor-to-today range the store
/// queries with. `analysis_categories` is the category breakdown of the
/// latest strength analysis — the most-active category comes from there,
/// not from raw records.
pub fn milestone_stats(
    records: &[DatedRecord],
    analysis_categories: Option<&BTreeMap<String, u32>>,
    today: NaiveDate,
) -> MilestoneStats {
    let records: Vec<&DatedRecord> = records.iter().filter(|r| r.diary_date <= today).collect();

    if records.is_empty() {
        return MilestoneStats::default();
    }

    let (week_start, week_end) = iso_week_bounds(today);
    let (month_start, month_end) = month_bounds(today);

    let weekly_count = records
        .iter()
        .filter(|r| r.diary_date >= week_start && r.diary_date <= week_end)
        .count() as u32;
    let monthly_count = records
        .iter()
        .filter(|r| r.diary_date >= month_start && r.diary_date <= month_end)
        .count() as u32;
    let total_count = records.len() as u32;

    let streak_days = streak_days(&records, today);

    let (most_active_category, most_active_category_count) =
        most_active_category(analysis_categories);

    // Months active: from the oldest record's creation date to today,
    // inclusive of the current month.
    let oldest = records
        .iter()
        .map(|r| r.created_at.date_naive())
        .min()
        .unwrap_or(today);
    let months_active = full_months_between(oldest, today).max(0) + 1;
    let months_active = months_active.max(1) as f64;
    let monthly_average = round1(total_count as f64 / months_active);

    let (most_active_day, most_active_day_count) = most_active_weekday(&records);

    MilestoneStats {
        weekly_count,
        monthly_count,
        total_count,
        streak_days,
        most_active_category,
        most_active_category_count,
        monthly_average,
        most_active_day,
        most_active_day_count,
    }
}

/// Consecutive-day streak ending at `today` (or yesterday, when today has no
/// record yet). A gap of more than one day between recorded days breaks the
/// chain; a most-recent record older than yesterday means no streak at all.
fn streak_days(records: &[&DatedRecord], today: NaiveDate) -> u32 {
    let mut dates: Vec<NaiveDate> = records.iter().map(|r| r.diary_date).collect();
    dates.sort_unstable();
    dates.dedup();
    dates.reverse();

    let Some(&latest) = dates.first() else {
        return 0;
    };

    if latest != today && (today - latest).num_days() > 1 {
        return 0;
    }

    let mut streak = 1;
    for pair in dates.windows(2) {
        if (pair[0] - pair[1]).num_days() > 1 {
            break;
        }
        streak += 1;
    }
    streak
}

/// Most-active category from the latest analysis breakdown: highest count
/// wins; ties go to the lexicographically smallest name. (The original's
/// tie-break depended on iteration order; this one is deterministic.)
fn most_active_category(
    categories: Option<&BTreeMap<String, u32>>,
) -> (Option<String>, Option<u32>) {
    let Some(categories) = categories.filter(|c| !c.is_empty()) else {
        return (None, None);
    };

    let mut best: Option<(&String, u32)> = None;
    for (name, &count) in categories {
        // BTreeMap iterates name-ascending, so strictly-greater keeps the
        // smallest name among equal counts.
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((name, count));
        }
    }

    match best {
        Some((name, count)) => (Some(name.clone()), Some(count)),
        None => (None, None),
    }
}

/// Most-active weekday over all-time records, counted by creation timestamp.
/// Ties go to the earliest weekday, Monday first. (Deterministic replacement
/// for the original's insertion-order tie-break.)
fn most_active_weekday(records: &[&DatedRecord]) -> (Option<String>, Option<u32>) {
    let mut counts = [0u32; 7];
    for r in records {
        counts[r.created_at.weekday().num_days_from_monday() as usize] += 1;
    }

    let mut best: Option<(usize, u32)> = None;
    for (i, &count) in counts.iter().enumerate() {
        if count > 0 && best.is_none_or(|(_, c)| count > c) {
            best = Some((i, count));
        }
    }

    match best {
        Some((i, count)) => (Some(WEEKDAY_NAMES_ZH[i].to_string()), Some(count)),
        None => (None, None),
    }
}

/// zh-CN weekday names, Monday first.
const WEEKDAY_NAMES_ZH: [&str; 7] = [
    "星期一",
    "星期二",
    "星期三",
    "星期四",
    "星期五",
    "星期六",
    "星期日",
];

/// Localized weekday name for `day`.
pub fn weekday_name_zh(day: Weekday) -> &'static str {
    WEEKDAY_NAMES_ZH[day.num_days_from_monday() as usize]
}

/// Start and end of the week containing `date`, Monday through Sunday
/// (the zh-CN locale week).
pub fn iso_week_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = date - Days::new(date.weekday().num_days_from_monday() as u64);
    (start, start + Days::new(6))
}

/// First and last day of the calendar month containing `date`.
pub fn month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = date.with_day(1).unwrap_or(date);
    let next_month = if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    };
    let end = next_month
        .map(|d| d - Days::new(1))
        .unwrap_or(date);
    (start, end)
}

/// Number of whole calendar months from `from` to `to` (0 when less than a
/// full month apart).
pub fn full_months_between(from: NaiveDate, to: NaiveDate) -> i32 {
    let mut months =
        (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32;
    if to.day() < from.day() {
        months -= 1;
    }
    months
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
