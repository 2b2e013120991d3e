//! End-to-end scenarios over the pure journal machinery: statistics,
//! milestone generation, and analysis-tier progression as a user's history
//! grows. No network; everything here is a function of its inputs.

use std::collections::BTreeMap;

use chrono::{NaiveDate, TimeZone, Utc};

use kudos::analysis::{AnalysisTier, auto_tier, tier_for_count};
use kudos::milestone::generate_milestones;
use kudos::stats::{DatedRecord, milestone_stats};

fn d(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn rec(date: &str) -> DatedRecord {
    let diary_date = d(date);
    DatedRecord {
        diary_date,
        created_at: Utc.from_utc_datetime(&diary_date.and_hms_opt(20, 30, 0).unwrap()),
    }
}

/// Consecutive daily records starting at `first`, one per day.
fn daily_run(first: &str, days: u64) -> Vec<DatedRecord> {
    let start = d(first);
    (0..days)
        .map(|i| rec(&(start + chrono::Days::new(i)).to_string()))
        .collect()
}

// ---------------------------------------------------------------------------
// a week of journaling earns the weekly and streak milestones
// ---------------------------------------------------------------------------

#[test]
fn first_week_of_journaling() {
    // Mon 2024-05-06 through Wed 2024-05-08, one entry per day.
    let records = daily_run("2024-05-06", 3);
    let today = d("2024-05-08");

    let stats = milestone_stats(&records, None, today);
    assert_eq!(stats.weekly_count, 3);
    assert_eq!(stats.monthly_count, 3);
    assert_eq!(stats.streak_days, 3);
    assert_eq!(stats.monthly_average, 3.0);

    let milestones = generate_milestones(&stats, today);
    let ids: Vec<&str> = milestones.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["weekly-2024-W19", "streak-3"]);
}

// ---------------------------------------------------------------------------
// a missed day resets the streak but keeps the counts
// ---------------------------------------------------------------------------

#[test]
fn missed_day_resets_streak_only() {
    let mut records = daily_run("2024-05-01", 5); // 05-01..05-05
    records.push(rec("2024-05-08"));
    let today = d("2024-05-08");

    let stats = milestone_stats(&records, None, today);
    assert_eq!(stats.total_count, 6);
    assert_eq!(stats.streak_days, 1);

    // No streak milestone below three days; the monthly count still grows.
    let milestones = generate_milestones(&stats, today);
    assert!(!milestones.iter().any(|m| m.id.starts_with("streak-")));
}

// ---------------------------------------------------------------------------
// a long-running journal earns the full milestone slate
// ---------------------------------------------------------------------------

#[test]
fn mature_journal_earns_everything() {
    // Daily entries 2024-03-15 through 2024-05-08 (55 days).
    let records = daily_run("2024-03-15", 55);
    let today = d("2024-05-08");

    let mut categories = BTreeMap::new();
    categories.insert("学习成长".to_string(), 21u32);
    categories.insert("工作".to_string(), 14u32);

    let stats = milestone_stats(&records, Some(&categories), today);
    assert_eq!(stats.total_count, 55);
    assert_eq!(stats.streak_days, 55);
    // Only eight May entries so far: no monthly milestone yet.
    assert_eq!(stats.monthly_count, 8);
    assert_eq!(stats.most_active_category.as_deref(), Some("学习成长"));
    // Mar 15 → May 8 is one full month plus the current one.
    assert_eq!(stats.monthly_average, 27.5);

    let milestones = generate_milestones(&stats, today);
    let ids: Vec<&str> = milestones.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "weekly-2024-W19",
            "streak-55",
            "category-学习成长",
            "active-day",
            "total-50",
        ]
    );

    // Every entry was created at 20:30 local-as-UTC, so the dominant weekday
    // count covers all 55 days spread across the week.
    assert!(stats.most_active_day.is_some());
}

// ---------------------------------------------------------------------------
// recomputation is stable: same history, same output
// ---------------------------------------------------------------------------

#[test]
fn regeneration_is_idempotent() {
    let records = daily_run("2024-04-20", 19);
    let today = d("2024-05-08");

    let first = milestone_stats(&records, None, today);
    let second = milestone_stats(&records, None, today);
    assert_eq!(first, second);

    let a = generate_milestones(&first, today);
    let b = generate_milestones(&second, today);
    assert_eq!(
        a.iter().map(|m| &m.id).collect::<Vec<_>>(),
        b.iter().map(|m| &m.id).collect::<Vec<_>>()
    );
}

// ---------------------------------------------------------------------------
// analysis tiers fire once each as the event count grows
// ---------------------------------------------------------------------------

#[test]
fn tier_progression_over_a_growing_history() {
    let mut deepest: Option<AnalysisTier> = None;
    let mut fired = Vec::new();

    for count in 1..=120usize {
        if let Some(tier) = auto_tier(count, deepest) {
            fired.push((count, tier));
            deepest = Some(tier);
        }
    }

    assert_eq!(
        fired,
        vec![
            (25, AnalysisTier::Preliminary),
            (50, AnalysisTier::Interim),
            (100, AnalysisTier::Full),
        ]
    );
}

#[test]
fn tier_progression_survives_skipped_counts() {
    // Bulk imports jump the count past a threshold without landing on it.
    let mut deepest: Option<AnalysisTier> = None;
    let mut fired = Vec::new();

    for count in [10, 23, 31, 47, 62, 99, 104] {
        if let Some(tier) = auto_tier(count, deepest) {
            fired.push((count, tier));
            deepest = Some(tier);
        }
    }

    assert_eq!(
        fired,
        vec![
            (31, AnalysisTier::Preliminary),
            (62, AnalysisTier::Interim),
            (104, AnalysisTier::Full),
        ]
    );
}

#[test]
fn manual_tier_matches_deepest_qualifying() {
    assert_eq!(tier_for_count(24), None);
    assert_eq!(tier_for_count(75), Some(AnalysisTier::Interim));
    assert_eq!(tier_for_count(500), Some(AnalysisTier::Full));
}

// ---------------------------------------------------------------------------
// rows dated in the future never count
// ---------------------------------------------------------------------------

#[test]
fn future_dated_rows_are_ignored() {
    let mut records = daily_run("2024-05-06", 3);
    records.push(rec("2024-06-01"));

    let stats = milestone_stats(&records, None, d("2024-05-08"));
    assert_eq!(stats.total_count, 3);
    assert_eq!(stats.streak_days, 3);
}
