//! Strength-analysis rows: append-only results of LLM analysis runs.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Session, StoreClient};
use crate::analysis::AnalysisTier;
use crate::error::KudosError;

const TABLE: &str = "strength_analysis";

/// A stored analysis. Never mutated or merged: each run inserts a new row
/// and "latest" is the most recent `created_at`. The `tier` column records
/// the depth the analysis was produced at and drives auto-trigger decisions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrengthAnalysis {
    pub id: String,
    pub user_id: String,
    pub analysis_text: String,
    #[serde(default)]
    pub key_strengths: Vec<String>,
    #[serde(default)]
    pub career_suggestions: Vec<String>,
    #[serde(default)]
    pub categories: BTreeMap<String, u32>,
    #[serde(default)]
    pub tier: Option<AnalysisTier>,
    pub created_at: DateTime<Utc>,
}

/// Insert body for a completed analysis. Only ever written whole — a failed
/// run persists nothing.
#[derive(Debug, Serialize)]
pub struct NewAnalysis<'a> {
    pub user_id: &'a str,
    pub analysis_text: &'a str,
    pub key_strengths: &'a [String],
    pub career_suggestions: &'a [String],
    pub categories: &'a BTreeMap<String, u32>,
    pub tier: AnalysisTier,
}

#[derive(Deserialize)]
struct TierRow {
    #[serde(default)]
    tier: Option<AnalysisTier>,
}

impl StoreClient {
    /// The user's most recent analysis, if any.
    pub async fn latest_analysis(
        &self,
        session: &Session,
    ) -> Result<Option<StrengthAnalysis>, KudosError> {
        let req = self.authed(
            self.http().get(self.rest_url(TABLE)).query(&[
                ("select", "*"),
                ("user_id", &format!("eq.{}", session.user_id)),
                ("order", "created_at.desc"),
                ("limit", "1"),
            ]),
            Some(session),
        );
        let rows: Vec<StrengthAnalysis> = self.send_json(req).await?;
        Ok(rows.into_iter().next())
    }

    /// The deepest tier among the user's stored analyses. This is the
    /// persisted trigger state: auto-analysis only fires for tiers strictly
    /// deeper than this.
    pub async fn deepest_analysis_tier(
        &self,
        session: &Session,
    ) -> Result<Option<AnalysisTier>, KudosError> {
        let req = self.authed(
            self.http().get(self.rest_url(TABLE)).query(&[
                ("select", "tier"),
                ("user_id", &format!("eq.{}", session.user_id)),
            ]),
            Some(session),
        );
        let rows: Vec<TierRow> = self.send_json(req).await?;
        Ok(rows.into_iter().filter_map(|r| r.tier).max())
    }

    pub async fn insert_analysis(
        &self,
        session: &Session,
        analysis: &NewAnalysis<'_>,
    ) -> Result<StrengthAnalysis, KudosError> {
        let req = self.authed(
            self.http()
                .post(self.rest_url(TABLE))
                .header("Prefer", "return=representation")
                .json(analysis),
            Some(session),
        );
        let rows: Vec<StrengthAnalysis> = self.send_json(req).await?;
        rows.into_iter().next().ok_or_else(|| KudosError::Upstream {
            service: "storage".to_string(),
            message: "insert returned no rows".to_string(),
            status: None,
        })
    }
}
