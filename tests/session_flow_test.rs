//! 配置 → 轮询参数 → 链式执行 的端到端流程（脚本化 API，暂停时钟）

use std::collections::HashMap;
use std::time::Duration;

use devin_cli::api::mock::{ApiCall, MockSessionApi};
use devin_cli::config::{ConfigStore, MemoryConfigStore, Settings};
use devin_cli::core::{
    poll_session, steps_from_playbooks, ChainRunner, NullSink, PollOptions, PollOutcome, SessionEvent,
};
use serde_json::json;

fn waits(events: &[SessionEvent]) -> Vec<Duration> {
    events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::Waiting { delay } => Some(*delay),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_env_tuned_chain_ceiling_does_not_touch_watch() {
    let env: HashMap<String, String> =
        [("DEVIN_POLL__CHAIN_CEILING_SECS".to_string(), "2".to_string())].into();
    let settings = Settings::from_sources(&json!({"api_token": "apk_x"}), Some(env)).unwrap();

    let api = MockSessionApi::new().with_statuses(["working"; 6]);
    let mut store = MemoryConfigStore::new();
    let mut events: Vec<SessionEvent> = Vec::new();
    ChainRunner::new(&api, &mut store, PollOptions::chain(&settings.poll))
        .run(&steps_from_playbooks("Go", "pb-1"), &mut events)
        .await
        .unwrap();
    let chain_waits = waits(&events);
    assert_eq!(chain_waits.len(), 6);
    assert!(chain_waits.iter().all(|d| *d <= Duration::from_secs(2)));
    assert_eq!(*chain_waits.last().unwrap(), Duration::from_secs(2));

    let api = MockSessionApi::new().with_statuses(["working"; 12]);
    let mut events: Vec<SessionEvent> = Vec::new();
    let outcome = poll_session(&api, "devin-w", &PollOptions::watch(&settings.poll), &mut events, None)
        .await
        .unwrap();
    assert!(matches!(outcome, PollOutcome::Settled(_)));
    assert_eq!(*waits(&events).last().unwrap(), Duration::from_secs(30));
}

#[tokio::test(start_paused = true)]
async fn test_three_step_chain_call_order() {
    let api = MockSessionApi::new().with_statuses(["working", "finished", "blocked", "working", "finished"]);
    let mut store = MemoryConfigStore::new();

    let report = ChainRunner::new(&api, &mut store, PollOptions::chain(&Default::default()))
        .run(&steps_from_playbooks("Ship it", "plan, build, review"), &mut NullSink)
        .await
        .unwrap();

    assert_eq!(report.steps.len(), 3);
    assert_eq!(store.current_session_id().as_deref(), Some(report.session_id.as_str()));

    let shape: Vec<&str> = api
        .calls()
        .iter()
        .map(|c| match c {
            ApiCall::Create { .. } => "create",
            ApiCall::Send { .. } => "send",
            ApiCall::Get { .. } => "get",
        })
        .collect();
    assert_eq!(
        shape,
        vec!["create", "get", "get", "send", "get", "send", "get", "get"]
    );
}
