//! Diary record pass-through: date-keyed journal entries.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{EPOCH_FLOOR, Session, StoreClient};
use crate::error::KudosError;
use crate::stats::DatedRecord;

const TABLE: &str = "diary_items";

/// A journal entry row, read and written verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiaryRecord {
    pub id: String,
    pub content: String,
    pub diary_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub user_id: String,
}

impl From<&DiaryRecord> for DatedRecord {
    fn from(record: &DiaryRecord) -> Self {
        DatedRecord {
            diary_date: record.diary_date,
            created_at: record.created_at,
        }
    }
}

/// Partial update for an owned entry. `image_url: Some(None)` clears the
/// stored image reference.
#[derive(Debug, Default, Serialize)]
pub struct EntryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<Option<String>>,
}

#[derive(Serialize)]
struct NewEntry<'a> {
    content: &'a str,
    diary_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_url: Option<&'a str>,
    user_id: &'a str,
}

impl StoreClient {
    /// Entries for a single day, newest first within the day.
    pub async fn entries_for_date(
        &self,
        session: &Session,
        date: NaiveDate,
    ) -> Result<Vec<DiaryRecord>, KudosError> {
        let req = self.authed(
            self.http().get(self.rest_url(TABLE)).query(&[
                ("select", "*"),
                ("diary_date", &format!("eq.{date}")),
                ("user_id", &format!("eq.{}", session.user_id)),
                ("order", "created_at.desc"),
            ]),
            Some(session),
        );
        self.send_json(req).await
    }

    /// Entries within an inclusive diary-date range, newest day first.
    pub async fn entries_in_range(
        &self,
        session: &Session,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DiaryRecord>, KudosError> {
        let req = self.authed(
            self.http().get(self.rest_url(TABLE)).query(&[
                ("select", "*"),
                ("diary_date", &format!("gte.{start}")),
                ("diary_date", &format!("lte.{end}")),
                ("user_id", &format!("eq.{}", session.user_id)),
                ("order", "diary_date.desc,created_at.desc"),
            ]),
            Some(session),
        );
        self.send_json(req).await
    }

    /// All-time entries up to `today` (the fixed epoch floor bounds the scan).
    pub async fn all_entries(
        &self,
        session: &Session,
        today: NaiveDate,
    ) -> Result<Vec<DiaryRecord>, KudosError> {
        let floor: NaiveDate = EPOCH_FLOOR.parse().unwrap_or(today);
        self.entries_in_range(session, floor, today).await
    }

    pub async fn create_entry(
        &self,
        session: &Session,
        content: &str,
        diary_date: NaiveDate,
        image_url: Option<&str>,
    ) -> Result<DiaryRecord, KudosError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(KudosError::Validation("content must not be empty".to_string()));
        }

        let body = NewEntry {
            content,
            diary_date,
            image_url,
            user_id: &session.user_id,
        };
        let req = self.authed(
            self.http()
                .post(self.rest_url(TABLE))
                .header("Prefer", "return=representation")
                .json(&body),
            Some(session),
        );
        let rows: Vec<DiaryRecord> = self.send_json(req).await?;
        rows.into_iter().next().ok_or_else(|| KudosError::Upstream {
            service: "storage".to_string(),
            message: "insert returned no rows".to_string(),
            status: None,
        })
    }

    /// Update an entry the session owns. The owner id is part of the write
    /// predicate, so a non-owned or missing id updates zero rows and maps to
    /// a typed failure.
    pub async fn update_entry(
        &self,
        session: &Session,
        id: &str,
        patch: &EntryPatch,
    ) -> Result<DiaryRecord, KudosError> {
        if let Some(content) = &patch.content {
            if content.trim().is_empty() {
                return Err(KudosError::Validation("content must not be empty".to_string()));
            }
        }

        let req = self.authed(
            self.http()
                .patch(self.rest_url(TABLE))
                .query(&[
                    ("id", &format!("eq.{id}")),
                    ("user_id", &format!("eq.{}", session.user_id)),
                ])
                .header("Prefer", "return=representation")
                .json(patch),
            Some(session),
        );
        let rows: Vec<DiaryRecord> = self.send_json(req).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| KudosError::NotOwner { id: id.to_string() })
    }

    /// Delete an owned entry; the stored image (if any) is removed afterwards.
    /// Image cleanup is best-effort — a failed object delete only logs.
    pub async fn delete_entry(&self, session: &Session, id: &str) -> Result<(), KudosError> {
        let req = self.authed(
            self.http()
                .delete(self.rest_url(TABLE))
                .query(&[
                    ("id", &format!("eq.{id}")),
                    ("user_id", &format!("eq.{}", session.user_id)),
                ])
                .header("Prefer", "return=representation"),
            Some(session),
        );
        let rows: Vec<DiaryRecord> = self.send_json(req).await?;
        let deleted = rows
            .into_iter()
            .next()
            .ok_or_else(|| KudosError::NotOwner { id: id.to_string() })?;

        if let Some(url) = deleted.image_url.as_deref() {
            if let Err(e) = self.remove_image(session, url).await {
                tracing::warn!("failed to remove image for deleted entry {id}: {e}");
            }
        }
        Ok(())
    }
}
