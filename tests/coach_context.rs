//! Prompt- and context-assembly behavior for the two LLM-backed features:
//! the strength analysis and the encouragement coach. These cover the exact
//! message sequences sent upstream without making any network calls.

use std::collections::BTreeMap;

use chrono::Utc;

use kudos::analysis::{AnalysisTier, build_analysis_prompt, parse_analysis};
use kudos::chat::{
    ANALYSIS_TEXT_BUDGET, ENOUGH_RECORDS, FALLBACK_REPLY, build_chat_messages, build_context,
};
use kudos::store::analyses::StrengthAnalysis;
use kudos::store::events::SuccessEvent;

fn event(content: &str, category: Option<&str>) -> SuccessEvent {
    SuccessEvent {
        id: "evt".to_string(),
        content: content.to_string(),
        category: category.map(|c| c.to_string()),
        created_at: Utc::now(),
        user_id: "user".to_string(),
    }
}

fn events(n: usize) -> Vec<SuccessEvent> {
    (0..n).map(|i| event(&format!("win {i}"), None)).collect()
}

fn analysis() -> StrengthAnalysis {
    let mut categories = BTreeMap::new();
    categories.insert("学习成长".to_string(), 12u32);
    StrengthAnalysis {
        id: "ana".to_string(),
        user_id: "user".to_string(),
        analysis_text: "持续学习是核心驱动力".to_string(),
        key_strengths: vec!["坚持".to_string(), "执行力".to_string()],
        career_suggestions: vec!["教育".to_string(), "产品".to_string()],
        categories,
        tier: Some(AnalysisTier::Preliminary),
        created_at: Utc::now(),
    }
}

// ---------------------------------------------------------------------------
// analysis prompt
// ---------------------------------------------------------------------------

#[test]
fn analysis_prompt_lists_every_event() {
    let evts = vec![
        event("组织了团队分享会", Some("工作")),
        event("学会了做面包", None),
    ];
    let prompt = build_analysis_prompt(&evts, AnalysisTier::Preliminary);
    assert!(prompt.contains("- 组织了团队分享会 (类别: 工作)"));
    assert!(prompt.contains("- 学会了做面包 (类别: 未分类)"));
    assert!(prompt.contains("请初步分析以下2条成功经历"));
}

#[test]
fn analysis_prompt_requests_json_shape() {
    let prompt = build_analysis_prompt(&events(25), AnalysisTier::Preliminary);
    for field in [
        "\"key_strengths\"",
        "\"career_suggestions\"",
        "\"categories\"",
        "\"analysis_text\"",
    ] {
        assert!(prompt.contains(field), "missing {field}");
    }
}

#[test]
fn sampling_tightens_for_the_full_report() {
    assert_eq!(AnalysisTier::Full.sampling().temperature, 0.5);
    assert_eq!(AnalysisTier::Interim.sampling().temperature, 0.7);
    assert_eq!(AnalysisTier::Preliminary.sampling().max_tokens, 2000);
}

#[test]
fn analysis_reply_roundtrips_through_the_parser() {
    // Providers sometimes return the JSON object as a string payload.
    let as_string = serde_json::Value::String(
        r#"{"key_strengths":["坚持"],"career_suggestions":[],"categories":{"工作":2},"analysis_text":"分析"}"#.to_string(),
    );
    let parsed = parse_analysis(&as_string).unwrap();
    assert_eq!(parsed.key_strengths, vec!["坚持"]);
    assert_eq!(parsed.categories.get("工作"), Some(&2));
}

// ---------------------------------------------------------------------------
// coach context and primer
// ---------------------------------------------------------------------------

#[test]
fn coach_context_reflects_history_and_analysis() {
    let evts = vec![event("完成了马拉松", Some("健康"))];
    let context = build_context(&evts, Some(&analysis()));

    assert!(context.contains("1. 完成了马拉松 (健康)"));
    assert!(context.contains("记录总数: 1 条"));
    assert!(context.contains("核心优势: 坚持, 执行力"));
    assert!(context.contains("适合方向: 教育, 产品"));
    assert!(context.contains("详细分析: 持续学习是核心驱动力..."));
}

#[test]
fn coach_context_caps_analysis_text() {
    let mut long = analysis();
    long.analysis_text = "析".repeat(ANALYSIS_TEXT_BUDGET + 300);
    let context = build_context(&[], Some(&long));

    let detail = context
        .lines()
        .find(|l| l.starts_with("详细分析: "))
        .unwrap();
    assert!(detail.ends_with("..."));
    assert_eq!(
        detail
            .trim_start_matches("详细分析: ")
            .trim_end_matches("...")
            .chars()
            .count(),
        ANALYSIS_TEXT_BUDGET
    );
}

#[test]
fn sparse_history_gets_the_gentler_primer() {
    let messages = build_chat_messages(&events(3), None, "最近工作压力很大");
    assert_eq!(messages.len(), 4);
    assert!(messages[1].content.contains("我才刚开始记录"));
    assert_eq!(messages[3].content, "最近工作压力很大");
}

#[test]
fn rich_history_gets_the_grounded_primer() {
    let messages = build_chat_messages(&events(ENOUGH_RECORDS), None, "最近工作压力很大");
    assert!(messages[1].content.contains("与我当前问题相关的部分"));
    assert!(messages[2].content.contains("每次看到你的成长"));
}

#[test]
fn fallback_reply_is_the_fixed_sentinel() {
    assert_eq!(FALLBACK_REPLY, "抱歉，出现了一点技术问题，请稍后再试。");
}
