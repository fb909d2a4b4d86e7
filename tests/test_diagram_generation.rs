//! Diagram text generators over the chat client.

mod common;

use std::sync::Arc;

use workplace_rca::analysis::AnalysisText;
use workplace_rca::config::{Credential, NotationPolicy};
use workplace_rca::diagram::{generate_mindmap, generate_structured_data, generate_wbs};
use workplace_rca::llm::ChatClient;

use common::fixtures::{ANALYSIS, MINDMAP, WBS};
use common::transport::RecordingTransport;

fn chat(transport: &Arc<RecordingTransport>) -> ChatClient {
    ChatClient::new(transport.clone(), "https://api.test/v1/chat/completions", "vision-model")
}

#[test]
fn identical_calls_are_separate_requests() {
    let transport = RecordingTransport::new();
    transport.push_chat_content(MINDMAP);
    transport.push_chat_content(MINDMAP);
    let client = chat(&transport);
    let key = Credential::new("k").unwrap();
    let analysis = AnalysisText::new(ANALYSIS);

    let first = generate_mindmap(&client, &key, &analysis, NotationPolicy::Lenient).unwrap();
    let second = generate_mindmap(&client, &key, &analysis, NotationPolicy::Lenient).unwrap();

    assert_eq!(transport.chat_calls(), 2);
    assert_eq!(first, second);
    assert_eq!(transport.chat_prompt(0), transport.chat_prompt(1));
}

#[test]
fn prompts_embed_analysis_verbatim() {
    let transport = RecordingTransport::new();
    transport.push_chat_content(MINDMAP);
    transport.push_chat_content(WBS);
    transport.push_chat_content("@startjson\n{\"root_cause_analysis\": []}\n@endjson");
    let client = chat(&transport);
    let key = Credential::new("k").unwrap();
    let analysis = AnalysisText::new(ANALYSIS);

    generate_mindmap(&client, &key, &analysis, NotationPolicy::Lenient).unwrap();
    generate_wbs(&client, &key, &analysis, NotationPolicy::Lenient).unwrap();
    generate_structured_data(&client, &key, &analysis, NotationPolicy::Lenient).unwrap();

    for i in 0..3 {
        let prompt = transport.chat_prompt(i);
        assert!(prompt.contains(ANALYSIS), "prompt {i} lost the analysis");
        assert!(prompt.contains("#FF0000"));
    }
    assert!(transport.chat_prompt(0).contains("@startmindmap"));
    assert!(transport.chat_prompt(1).contains("@startwbs"));
    assert!(transport.chat_prompt(2).contains("@startjson"));
}

#[test]
fn fenced_output_is_accepted_leniently_and_rejected_strictly() {
    let fenced = format!("```plantuml\n{}\n```", WBS);
    let transport = RecordingTransport::new();
    transport.push_chat_content(&fenced);
    transport.push_chat_content(&fenced);
    let client = chat(&transport);
    let key = Credential::new("k").unwrap();
    let analysis = AnalysisText::new(ANALYSIS);

    let lenient = generate_wbs(&client, &key, &analysis, NotationPolicy::Lenient).unwrap();
    assert_eq!(lenient.source, WBS);
    assert_eq!(lenient.raw, fenced);

    let err = generate_wbs(&client, &key, &analysis, NotationPolicy::Strict).unwrap_err();
    assert_eq!(err.category(), "notation");
}
