//! Milestone generator: threshold rules over [`MilestoneStats`].
//!
//! Milestones are derived notifications, regenerated from current stats on
//! every view and never persisted. Ids are deterministic functions of
//! type + period, so identical stats always produce an identical list and a
//! caller that later persists milestones can deduplicate by id.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::stats::MilestoneStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MilestoneType {
    Weekly,
    Monthly,
    Yearly,
    Achievement,
    Streak,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserMilestone {
    pub id: String,
    pub title: String,
    pub description: String,
    pub date: String,
    #[serde(rename = "type")]
    pub kind: MilestoneType,
}

/// Minimum weekly entries for the weekly milestone.
pub const WEEKLY_THRESHOLD: u32 = 3;
/// Minimum monthly entries for the monthly milestone.
pub const MONTHLY_THRESHOLD: u32 = 10;
/// Minimum consecutive days for the streak milestone.
pub const STREAK_THRESHOLD: u32 = 3;
/// Minimum count for the category / active-day achievements.
pub const ACTIVITY_THRESHOLD: u32 = 5;
/// Minimum total entries for the cumulative achievement.
pub const TOTAL_THRESHOLD: u32 = 10;

/// Generate the milestone list for `stats` as of `today`.
///
/// Pure and idempotent: same stats, same date ⇒ same ids and text.
pub fn generate_milestones(stats: &MilestoneStats, today: NaiveDate) -> Vec<UserMilestone> {
    let mut milestones = Vec::new();
    let date = today.format("%Y-%m-%d").to_string();

    if stats.weekly_count >= WEEKLY_THRESHOLD {
        let iso = today.iso_week();
        milestones.push(UserMilestone {
            id: format!("weekly-{:04}-W{:02}", iso.year(), iso.week()),
            title: "本周记录".to_string(),
            description: format!("本周已记录{}条日记，坚持！", stats.weekly_count),
            date: date.clone(),
            kind: MilestoneType::Weekly,
        });
    }

    if stats.monthly_count >= MONTHLY_THRESHOLD {
        milestones.push(UserMilestone {
            id: format!("monthly-{:04}-{:02}", today.year(), today.month()),
            title: "月度坚持".to_string(),
            description: format!("本月已记录{}条成就，继续加油！", stats.monthly_count),
            date: date.clone(),
            kind: MilestoneType::Monthly,
        });
    }

    if stats.streak_days >= STREAK_THRESHOLD {
        milestones.push(UserMilestone {
            id: format!("streak-{}", stats.streak_days),
            title: "连续记录".to_string(),
            description: format!("已连续记录{}天，习惯养成中！", stats.streak_days),
            date: date.clone(),
            kind: MilestoneType::Streak,
        });
    }

    if let (Some(category), Some(count)) = (
        stats.most_active_category.as_deref(),
        stats.most_active_category_count,
    ) {
        if count >= ACTIVITY_THRESHOLD {
            milestones.push(UserMilestone {
                id: format!("category-{category}"),
                title: "擅长领域".to_string(),
                description: format!("「{category}」类别记录最多，共{count}条！"),
                date: date.clone(),
                kind: MilestoneType::Achievement,
            });
        }
    }

    if let (Some(day), Some(count)) = (stats.most_active_day.as_deref(), stats.most_active_day_count)
    {
        if count >= ACTIVITY_THRESHOLD {
            milestones.push(UserMilestone {
                // Constant id: a recurrence in a later period produces the
                // same milestone. Kept as-is for id stability.
                id: "active-day".to_string(),
                title: "最活跃日".to_string(),
                description: format!("{day}是你记录最活跃的一天，共{count}条记录！"),
                date: date.clone(),
                kind: MilestoneType::Achievement,
            });
        }
    }

    if stats.total_count >= TOTAL_THRESHOLD {
        milestones.push(UserMilestone {
            id: format!("total-{}", stats.total_count / 10 * 10),
            title: "成就累积".to_string(),
            description: format!("已累计记录{}条成就，持续进步中！", stats.total_count),
            date,
            kind: MilestoneType::Achievement,
        });
    }

    milestones
}
