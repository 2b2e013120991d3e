//! Success-event pass-through: short tagged notes of personal wins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Session, StoreClient};
use crate::error::KudosError;

const TABLE: &str = "success_events";

/// A success-event row, read and written verbatim. `category` is one of a
/// small fixed tag set, or absent for untagged events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessEvent {
    pub id: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub user_id: String,
}

/// Partial update for an owned event. `category: Some(None)` untags it.
#[derive(Debug, Default, Serialize)]
pub struct EventPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Option<String>>,
}

#[derive(Serialize)]
struct NewEvent<'a> {
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'a str>,
    user_id: &'a str,
}

impl StoreClient {
    /// All of the user's events, newest first.
    pub async fn events_for_user(
        &self,
        session: &Session,
    ) -> Result<Vec<SuccessEvent>, KudosError> {
        let req = self.authed(
            self.http().get(self.rest_url(TABLE)).query(&[
                ("select", "*"),
                ("user_id", &format!("eq.{}", session.user_id)),
                ("order", "created_at.desc"),
            ]),
            Some(session),
        );
        self.send_json(req).await
    }

    /// The user's most recent events, newest first, capped at `limit`.
    pub async fn recent_events(
        &self,
        session: &Session,
        limit: usize,
    ) -> Result<Vec<SuccessEvent>, KudosError> {
        let req = self.authed(
            self.http().get(self.rest_url(TABLE)).query(&[
                ("select", "*"),
                ("user_id", &format!("eq.{}", session.user_id)),
                ("order", "created_at.desc"),
                ("limit", &limit.to_string()),
            ]),
            Some(session),
        );
        self.send_json(req).await
    }

    pub async fn add_event(
        &self,
        session: &Session,
        content: &str,
        category: Option<&str>,
    ) -> Result<SuccessEvent, KudosError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(KudosError::Validation("content must not be empty".to_string()));
        }

        let body = NewEvent {
            content,
            category,
            user_id: &session.user_id,
        };
        let req = self.authed(
            self.http()
                .post(self.rest_url(TABLE))
                .header("Prefer", "return=representation")
                .json(&body),
            Some(session),
        );
        let rows: Vec<SuccessEvent> = self.send_json(req).await?;
        rows.into_iter().next().ok_or_else(|| KudosError::Upstream {
            service: "storage".to_string(),
            message: "insert returned no rows".to_string(),
            status: None,
        })
    }

    /// Conditional write: owner id in the predicate, zero rows ⇒ typed failure.
    pub async fn update_event(
        &self,
        session: &Session,
        id: &str,
        patch: &EventPatch,
    ) -> Result<SuccessEvent, KudosError> {
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
        let rows: Vec<SuccessEvent> = self.send_json(req).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| KudosError::NotOwner { id: id.to_string() })
    }

    pub async fn delete_event(&self, session: &Session, id: &str) -> Result<(), KudosError> {
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
        let rows: Vec<SuccessEvent> = self.send_json(req).await?;
        if rows.is_empty() {
            return Err(KudosError::NotOwner { id: id.to_string() });
        }
        Ok(())
    }
}
