//! Analysis tier selection and the strength-analysis engine.
//!
//! Three analysis depths keyed to cumulative event count. Manual runs pick
//! the deepest tier the count qualifies for. Automatic runs fire after an
//! event insert, for the deepest qualifying tier not yet persisted — keyed
//! to the recorded tier of prior analyses rather than exact count equality,
//! so a skipped count (concurrent inserts, retried submissions) cannot lose
//! an analysis.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::KudosError;
use crate::llm::{ChatMessage, LlmClient, Sampling, content_text};
use crate::store::analyses::{NewAnalysis, StrengthAnalysis};
use crate::store::events::SuccessEvent;
use crate::store::{Session, StoreClient};

/// Minimum event count for any analysis.
pub const MIN_EVENTS_FOR_ANALYSIS: usize = 25;

/// System prompt for the analysis collaborator.
const ANALYST_SYSTEM_PROMPT: &str =
    "你是一位专业的职业发展顾问，需要根据用户的成功经历分析其核心优势并提供职业建议";

/// Analysis depth. Ordered: deeper tiers compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisTier {
    Preliminary,
    Interim,
    Full,
}

impl AnalysisTier {
    /// Event count at which this tier becomes available.
    pub fn threshold(self) -> usize {
        match self {
            Self::Preliminary => 25,
            Self::Interim => 50,
            Self::Full => 100,
        }
    }

    /// zh-CN depth label, interpolated into the prompt.
    pub fn label(self) -> &'static str {
        match self {
            Self::Preliminary => "初步",
            Self::Interim => "阶段性",
            Self::Full => "完整",
        }
    }

    /// Sampling parameters: the full report uses tighter sampling for a more
    /// deterministic result.
    pub fn sampling(self) -> Sampling {
        Sampling {
            temperature: match self {
                Self::Full => 0.5,
                _ => 0.7,
            },
            max_tokens: 2000,
        }
    }

    fn all() -> [Self; 3] {
        [Self::Preliminary, Self::Interim, Self::Full]
    }
}

/// Tier for a manual analysis run: the deepest tier `count` qualifies for,
/// or `None` below the preliminary threshold.
pub fn tier_for_count(count: usize) -> Option<AnalysisTier> {
    AnalysisTier::all()
        .into_iter()
        .rev()
        .find(|t| count >= t.threshold())
}

/// Tier for an automatic post-insert run: the deepest qualifying tier that
/// is strictly deeper than anything already persisted.
pub fn auto_tier(count: usize, deepest_stored: Option<AnalysisTier>) -> Option<AnalysisTier> {
    tier_for_count(count).filter(|t| deepest_stored.is_none_or(|d| *t > d))
}

/// Render the tier's analysis prompt over the full event list.
pub fn build_analysis_prompt(events: &[SuccessEvent], tier: AnalysisTier) -> String {
    let listing: String = events
        .iter()
        .map(|e| {
            format!(
                "- {} (类别: {})\n",
                e.content,
                e.category.as_deref().unwrap_or("未分类")
            )
        })
        .collect();

    let instructions = match tier {
        AnalysisTier::Full => {
            "请提供详尽的分析：\n\
             1. 总结这些经历反映出的关键优势（4-6个），并详细说明每个优势的具体表现\n\
             2. 基于这些优势，推荐3-4个最适合的职业发展方向，并解释为什么适合\n\
             3. 对这些成功经历进行多维度分类统计，发现规律\n\
             4. 结合所有分析，给出未来发展建议"
        }
        AnalysisTier::Interim => {
            "请提供以下分析：\n\
             1. 总结这些经历反映出的关键优势（3-5个）\n\
             2. 基于这些优势，推荐2-3个适合的职业发展方向\n\
             3. 对这些成功经历按领域进行分类统计"
        }
        AnalysisTier::Preliminary => {
            "请提供初步分析：\n\
             1. 总结这些经历反映出的主要优势（2-3个）\n\
             2. 基于目前的观察，建议可以关注的发展方向（1-2个）\n\
             3. 对已有经历进行简单分类"
        }
    };

    format!(
        "作为一位职业发展顾问，请{label}分析以下{count}条成功经历：\n\n\
         {listing}\n\
         {instructions}\n\n\
         请用中文回答，采用以下JSON格式：\n\
         {{\n\
           \"key_strengths\": [\"优势1\", \"优势2\", ...],\n\
           \"career_suggestions\": [\"职业方向1\", \"职业方向2\", ...],\n\
           \"categories\": {{\"领域1\": 数量, \"领域2\": 数量, ...}},\n\
           \"analysis_text\": \"整体分析文本\"\n\
         }}",
        label = tier.label(),
        count = events.len(),
    )
}

/// Structured analysis payload expected back from the collaborator.
#[derive(Debug, Default, Deserialize)]
pub struct ParsedAnalysis {
    #[serde(default)]
    pub key_strengths: Vec<String>,
    #[serde(default)]
    pub career_suggestions: Vec<String>,
    #[serde(default)]
    pub categories: BTreeMap<String, u32>,
    #[serde(default)]
    pub analysis_text: String,
}

/// Parse the completion content, tolerating both delivery shapes: a
/// JSON-encoded string or an already-structured object.
pub fn parse_analysis(content: &serde_json::Value) -> Result<ParsedAnalysis, KudosError> {
    let parsed = match content {
        serde_json::Value::String(s) => serde_json::from_str(s),
        other => serde_json::from_value(other.clone()),
    };
    parsed.map_err(|e| KudosError::SchemaParse(format!("analysis payload: {e}")))
}

/// Runs analyses end to end: gather events, prompt the LLM, persist the
/// result. A failed call or unparseable reply persists nothing.
pub struct StrengthAnalyzer {
    store: Arc<StoreClient>,
    llm: Arc<LlmClient>,
}

impl StrengthAnalyzer {
    pub fn new(store: Arc<StoreClient>, llm: Arc<LlmClient>) -> Self {
        Self { store, llm }
    }

    /// Manual trigger: analyze at the deepest tier the current event count
    /// qualifies for. Below the preliminary threshold this is a validation
    /// failure — nothing is sent to the collaborator.
    pub async fn analyze(&self, session: &Session) -> Result<StrengthAnalysis, KudosError> {
        let events = self.store.events_for_user(session).await?;
        let tier = tier_for_count(events.len()).ok_or_else(|| {
            KudosError::Validation(format!(
                "analysis needs at least {MIN_EVENTS_FOR_ANALYSIS} recorded events (have {})",
                events.len()
            ))
        })?;
        self.run(session, &events, tier).await
    }

    /// Automatic trigger after an event insert. Returns the stored analysis
    /// when a new tier fired, `None` when no tier was due.
    pub async fn auto_analyze(
        &self,
        session: &Session,
    ) -> Result<Option<StrengthAnalysis>, KudosError> {
        let events = self.store.events_for_user(session).await?;
        let deepest = self.store.deepest_analysis_tier(session).await?;

        let Some(tier) = auto_tier(events.len(), deepest) else {
            return Ok(None);
        };

        tracing::info!(
            "auto-analysis firing: {} events, tier {:?}",
            events.len(),
            tier
        );
        self.run(session, &events, tier).await.map(Some)
    }

    async fn run(
        &self,
        session: &Session,
        events: &[SuccessEvent],
        tier: AnalysisTier,
    ) -> Result<StrengthAnalysis, KudosError> {
        let messages = [
            ChatMessage::system(ANALYST_SYSTEM_PROMPT),
            ChatMessage::user(build_analysis_prompt(events, tier)),
        ];

        let content = self
            .llm
            .complete(&messages, tier.sampling(), true)
            .await?;
        let parsed = parse_analysis(&content).inspect_err(|e| {
            tracing::warn!(
                "discarding unparseable analysis reply: {e}; content preview: {}",
                content_text(&content).chars().take(120).collect::<String>()
            );
        })?;

        let row = NewAnalysis {
            user_id: &session.user_id,
            analysis_text: &parsed.analysis_text,
            key_strengths: &parsed.key_strengths,
            career_suggestions: &parsed.career_suggestions,
            categories: &parsed.categories,
            tier,
        };
        self.store.insert_analysis(session, &row).await
    }
}
