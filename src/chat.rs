//! Chat context builder and encouragement coach.
//!
//! Assembles a bounded context block (recent events plus the latest strength
//! analysis) into a fixed system prompt and a synthetic two-turn primer, then
//! appends the live user message. The coach never surfaces an error: any
//! collaborator failure is logged and answered with a fixed apology sentinel.

use std::sync::Arc;

use crate::llm::{ChatMessage, LlmClient, Sampling, content_text};
use crate::store::analyses::StrengthAnalysis;
use crate::store::events::SuccessEvent;
use crate::store::{Session, StoreClient};

/// How many recent events feed the context block.
pub const RECENT_EVENTS_LIMIT: usize = 20;

/// Character budget for the analysis text inside the context block.
pub const ANALYSIS_TEXT_BUDGET: usize = 500;

/// Record count at which the primer assumes a real history.
pub const ENOUGH_RECORDS: usize = 10;

/// Returned verbatim when the collaborator call fails for any reason.
pub const FALLBACK_REPLY: &str = "抱歉，出现了一点技术问题，请稍后再试。";

const COACH_SAMPLING: Sampling = Sampling {
    temperature: 0.7,
    max_tokens: 800,
};

const COACH_SYSTEM_PROMPT: &str = "你是用户的朋友和成长伙伴，语气温暖自然，富有同理心。你的目标是：

帮助用户面对当前的挑战，像一个亲密的朋友那样支持他们。请按照以下自然的对话流程来回应：

首先，真诚理解用户当前的感受，用温暖的语气表达共情。

接着，自然地引用用户过去的成功经历（具体提及1-2个相关事例），就像你们共同经历过似的，提醒他们自己曾经的成就。

然后，友善地指出你看到的用户优势，并解释为什么这些优势在当前情况下会有帮助，语气亲切，如同老朋友间的鼓励。

最后，给予温暖而具体的建议和支持，像朋友间的聊天自然结束，不要使用说教的语气。

重要的是保持自然流畅的对话感，不要使用明显的分段标记或编号，避免过于公式化的语言。使用日常对话中会有的语气词、转折词，让整个回复像是朋友间真实的对话。

如果用户的历史记录不足（少于10条或找不到相关记录），请调整为：

首先，以朋友的口吻表达理解和支持。

然后，自然地提及记录成功经历的价值，就像朋友间的建议那样，而不是教导。

接着，基于用户当前的问题，给予一个贴心的、具体的小建议。

最后，用鼓励的话自然地结束对话，表达你对他们的信心。

始终保持自然、温暖、真诚的语气，像真正的朋友那样交流，避免机械化或过于专业的表达方式。不要使用空洞的鼓励，保持真实和具体。";

const RELEVANCE_NOTES: &str = "
补充说明：在回复时，请注意找出用户历史记录中与当前话题相关的内容：

- 即使有很多记录，如果没有与当前问题相关的内容，请采用更通用的支持方式，但仍保持朋友间交谈的自然语气。

- 尝试找出间接相关的经历，比如用户在学习中展现的毅力可能与工作中的挑战相关，因为这反映了他们面对困难的态度。

- 整体上，让对话自然流畅，像是两个朋友在咖啡厅里聊天时会有的真实互动。
";

/// Render the bounded context block: numbered recent events with category,
/// record total, then the latest analysis (strength and direction lists
/// joined, analysis text truncated to the character budget).
pub fn build_context(events: &[SuccessEvent], analysis: Option<&StrengthAnalysis>) -> String {
    let mut context = String::new();

    if events.is_empty() {
        context.push_str("用户尚未记录任何成功事件。\n");
    } else {
        context.push_str("用户的成功事件记录:\n");
        for (i, event) in events.iter().enumerate() {
            context.push_str(&format!(
                "{}. {} ({})\n",
                i + 1,
                event.content,
                event.category.as_deref().unwrap_or("未分类")
            ));
        }
        context.push_str(&format!("\n记录总数: {} 条\n", events.len()));
    }

    if let Some(analysis) = analysis {
        context.push_str("\n用户的优势分析:\n");
        if !analysis.key_strengths.is_empty() {
            context.push_str(&format!("核心优势: {}\n", analysis.key_strengths.join(", ")));
        }
        if !analysis.career_suggestions.is_empty() {
            context.push_str(&format!(
                "适合方向: {}\n",
                analysis.career_suggestions.join(", ")
            ));
        }
        if !analysis.analysis_text.is_empty() {
            let truncated: String = analysis
                .analysis_text
                .chars()
                .take(ANALYSIS_TEXT_BUDGET)
                .collect();
            context.push_str(&format!("详细分析: {truncated}...\n"));
        }
    }

    context
}

/// Assemble the full message sequence: system prompt, a synthetic two-turn
/// primer presenting the context, then the live user message.
pub fn build_chat_messages(
    events: &[SuccessEvent],
    analysis: Option<&StrengthAnalysis>,
    user_message: &str,
) -> Vec<ChatMessage> {
    let context = build_context(events, analysis);
    let has_enough_records = events.len() >= ENOUGH_RECORDS;

    let context_turn = format!(
        "嗨，这些是我过去的一些经历和成就，希望能帮你更好地了解我：\n\n{context}\n\n{}",
        if has_enough_records {
            "希望你能根据这些记录中与我当前问题相关的部分来给我一些建议。"
        } else {
            "我才刚开始记录我的成功经历，希望你能给我一些通用但有用的建议。"
        }
    );

    let ack_turn = if has_enough_records {
        "嗨！我看了你分享的经历，真的很棒。每次看到你的成长和成就都很开心。有什么最近困扰你的事情吗？或者有什么想聊的？"
    } else {
        "嗨！很高兴你开始记录自己的成功经历了，这是认识自己的好方法。有什么我能帮到你的吗？无论是什么困扰或想法，都可以和我分享。"
    };

    vec![
        ChatMessage::system(format!("{COACH_SYSTEM_PROMPT}{RELEVANCE_NOTES}")),
        ChatMessage::user(context_turn),
        ChatMessage::assistant(ack_turn),
        ChatMessage::user(user_message),
    ]
}

/// Conversational collaborator grounded in the user's own history.
pub struct EncouragementCoach {
    store: Arc<StoreClient>,
    llm: Arc<LlmClient>,
}

impl EncouragementCoach {
    pub fn new(store: Arc<StoreClient>, llm: Arc<LlmClient>) -> Self {
        Self { store, llm }
    }

    /// Answer `message` with the user's history as context. Infallible by
    /// contract: failures are logged and degrade to the apology sentinel.
    pub async fn reply(&self, session: &Session, message: &str) -> String {
        let gathered = futures_util::try_join!(
            self.store.recent_events(session, RECENT_EVENTS_LIMIT),
            self.store.latest_analysis(session),
        );

        let (events, analysis) = match gathered {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!("chat context fetch failed: {e}");
                return FALLBACK_REPLY.to_string();
            }
        };

        let messages = build_chat_messages(&events, analysis.as_ref(), message);

        match self.llm.complete(&messages, COACH_SAMPLING, false).await {
            Ok(content) => content_text(&content),
            Err(e) => {
                tracing::warn!("chat completion failed: {e}");
                FALLBACK_REPLY.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn event(content: &str, category: Option<&str>) -> SuccessEvent {
        SuccessEvent {
            id: "evt".to_string(),
            content: content.to_string(),
            category: category.map(|c| c.to_string()),
            created_at: Utc::now(),
            user_id: "user".to_string(),
        }
    }

    fn analysis(text: &str) -> StrengthAnalysis {
        let mut categories = BTreeMap::new();
        categories.insert("学习成长".to_string(), 5u32);
        StrengthAnalysis {
            id: "ana".to_string(),
            user_id: "user".to_string(),
            analysis_text: text.to_string(),
            key_strengths: vec!["坚持".to_string(), "好奇心".to_string()],
            career_suggestions: vec!["教育".to_string()],
            categories,
            tier: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn context_numbers_events_and_counts_them() {
        let events = vec![event("读完一本书", Some("学习成长")), event("跑了五公里", None)];
        let context = build_context(&events, None);
        assert!(context.contains("1. 读完一本书 (学习成长)"));
        assert!(context.contains("2. 跑了五公里 (未分类)"));
        assert!(context.contains("记录总数: 2 条"));
    }

    #[test]
    fn context_mentions_empty_history() {
        let context = build_context(&[], None);
        assert!(context.contains("用户尚未记录任何成功事件"));
    }

    #[test]
    fn context_includes_analysis_sections() {
        let events = vec![event("完成项目", None)];
        let context = build_context(&events, Some(&analysis("这是一段分析")));
        assert!(context.contains("核心优势: 坚持, 好奇心"));
        assert!(context.contains("适合方向: 教育"));
        assert!(context.contains("详细分析: 这是一段分析..."));
    }

    #[test]
    fn analysis_text_is_truncated_to_budget() {
        let long_text: String = "长".repeat(ANALYSIS_TEXT_BUDGET * 2);
        let context = build_context(&[], Some(&analysis(&long_text)));
        let detail_line = context
            .lines()
            .find(|l| l.starts_with("详细分析: "))
            .unwrap();
        let body = detail_line.trim_start_matches("详细分析: ").trim_end_matches("...");
        assert_eq!(body.chars().count(), ANALYSIS_TEXT_BUDGET);
    }

    #[test]
    fn primer_wording_switches_on_record_count() {
        let few: Vec<SuccessEvent> = (0..ENOUGH_RECORDS - 1)
            .map(|i| event(&format!("win {i}"), None))
            .collect();
        let messages = build_chat_messages(&few, None, "最近有点累");
        assert!(messages[1].content.contains("我才刚开始记录"));
        assert!(messages[2].content.contains("很高兴你开始记录"));

        let many: Vec<SuccessEvent> = (0..ENOUGH_RECORDS)
            .map(|i| event(&format!("win {i}"), None))
            .collect();
        let messages = build_chat_messages(&many, None, "最近有点累");
        assert!(messages[1].content.contains("与我当前问题相关的部分"));
        assert!(messages[2].content.contains("每次看到你的成长"));
    }

    #[test]
    fn message_sequence_ends_with_live_user_turn() {
        let messages = build_chat_messages(&[], None, "你好");
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[2].role, "assistant");
        assert_eq!(messages[3].role, "user");
        assert_eq!(messages[3].content, "你好");
        assert!(messages[0].content.contains("补充说明"));
    }
}
