mod helpers;

use helpers::{test_agent, test_config};
use lore::knowledge::RawMetadata;
use serde_json::json;

#[test]
fn reset_clears_knowledge_sessions_and_messages() {
    let mut t = test_agent(&test_config());
    t.agent.add("first note", "cli", &RawMetadata::new()).unwrap();
    t.agent.add("second note", "cli", &RawMetadata::new()).unwrap();
    t.agent.start_session(&json!({ "mode": "test" })).unwrap();
    t.agent.chat("hello", true).unwrap();
    t.agent.start_session(&json!({})).unwrap();

    let summary = t.agent.reset_all().unwrap();

    assert_eq!(summary.vector_documents_deleted, 2);
    assert_eq!(summary.sessions_deleted, 2);
    assert_eq!(summary.messages_deleted, 2);
    assert!(t.agent.current_session().is_none());
    assert_eq!(t.agent.stats().unwrap().total_documents, 0);
    assert!(t.agent.query("note", Some(5)).unwrap().ids.is_empty());

    let health = t.agent.health().unwrap();
    assert_eq!(health.vector_count, 0);
    assert_eq!(health.message_count, 0);
    assert!(health.is_healthy());
}

#[test]
fn reset_of_empty_agent_reports_zeroes() {
    let mut t = test_agent(&test_config());

    let summary = t.agent.reset_all().unwrap();

    assert_eq!(summary.vector_documents_deleted, 0);
    assert_eq!(summary.sessions_deleted, 0);
    assert_eq!(summary.messages_deleted, 0);
}

#[test]
fn agent_is_usable_after_reset() {
    let mut t = test_agent(&test_config());
    t.agent.add("stale", "cli", &RawMetadata::new()).unwrap();
    t.agent.reset_all().unwrap();

    let ids = t.agent.add("fresh", "cli", &RawMetadata::new()).unwrap();
    let session = t.agent.start_session(&json!({})).unwrap();
    t.agent.chat("anything new?", true).unwrap();

    assert_eq!(t.agent.list(10).unwrap()[0].id, ids[0]);
    assert_eq!(t.agent.history(&session, 10).unwrap().len(), 2);
}
