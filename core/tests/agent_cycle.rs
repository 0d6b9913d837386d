mod common;

use common::{fetch_timeout, record, ScriptedMothership, TableDelegate};
use dbagent_core::api::{
    Agent, CycleError, CycleOutcome, ExecutionStatus, FetchError, TaskResult,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn agent(mothership: &ScriptedMothership, delegate: &TableDelegate) -> Agent {
    Agent::new(Box::new(mothership.clone()), Box::new(delegate.clone()))
}

#[tokio::test]
async fn runs_fetched_query_and_echoes_uuid() {
    let mothership = ScriptedMothership::new();
    mothership.push_task("abc-123", "SELECT 1");
    let delegate = TableDelegate::new();
    delegate.answer("SELECT 1", vec![record(&[("col", json!(1))])]);

    let outcome = agent(&mothership, &delegate).run_cycle().await.unwrap();

    assert_eq!(delegate.executed(), vec!["SELECT 1".to_string()]);
    assert_eq!(
        mothership.posts(),
        vec![(
            "abc-123".to_string(),
            TaskResult::Rows(vec![record(&[("col", json!(1))])])
        )]
    );
    assert_eq!(
        outcome,
        CycleOutcome::Reported {
            task_id: "abc-123".to_string(),
            status: 200,
            execution: ExecutionStatus::Succeeded { rows: 1 },
        }
    );
}

#[tokio::test]
async fn no_task_means_no_execute_and_no_report() {
    let mothership = ScriptedMothership::new();
    mothership.push_no_task();
    let delegate = TableDelegate::new();

    let outcome = agent(&mothership, &delegate).run_cycle().await.unwrap();

    assert_eq!(outcome, CycleOutcome::NoTask);
    assert!(delegate.executed().is_empty());
    assert!(mothership.posts().is_empty());
    assert_eq!(mothership.skipped_posts(), 0);
}

#[tokio::test]
async fn query_failure_is_still_reported() {
    let mothership = ScriptedMothership::new();
    mothership.push_task("t-9", "SELECT * FROM missing");
    let delegate = TableDelegate::new();
    delegate.fail("SELECT * FROM missing", "TABLE_NOT_FOUND: missing");

    let outcome = agent(&mothership, &delegate).run_cycle().await.unwrap();

    let posts = mothership.posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].0, "t-9");
    match &posts[0].1 {
        TaskResult::Error(msg) => {
            assert!(!msg.is_empty());
            assert!(msg.contains("TABLE_NOT_FOUND"));
            assert!(msg.contains("SELECT * FROM missing"));
        }
        other => panic!("expected error result, got {other:?}"),
    }
    assert!(matches!(
        outcome,
        CycleOutcome::Reported {
            execution: ExecutionStatus::Failed,
            ..
        }
    ));
}

#[tokio::test]
async fn fetch_error_abandons_cycle() {
    let mothership = ScriptedMothership::new();
    mothership.push_error(fetch_timeout());
    let delegate = TableDelegate::new();

    let err = agent(&mothership, &delegate).run_cycle().await.unwrap_err();

    assert!(matches!(err, CycleError::Fetch(ref e) if e.is_timeout()));
    assert!(delegate.executed().is_empty());
    assert!(mothership.posts().is_empty());
}

#[tokio::test]
async fn post_error_carries_task_id() {
    let mothership = ScriptedMothership::new();
    mothership.push_task("lost-1", "SELECT 1");
    mothership.fail_posts();
    let delegate = TableDelegate::new();
    delegate.answer("SELECT 1", vec![record(&[("col", json!(1))])]);

    let err = agent(&mothership, &delegate).run_cycle().await.unwrap_err();

    match err {
        CycleError::Post { task_id, .. } => assert_eq!(task_id, "lost-1"),
        other => panic!("expected post error, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_result_is_not_reported() {
    let mothership = ScriptedMothership::new();
    mothership.push_task("t-empty", "SELECT 1 WHERE false");
    let delegate = TableDelegate::new();
    delegate.answer("SELECT 1 WHERE false", vec![]);

    let outcome = agent(&mothership, &delegate).run_cycle().await.unwrap();

    assert_eq!(
        outcome,
        CycleOutcome::NothingToReport {
            task_id: "t-empty".to_string()
        }
    );
    assert!(mothership.posts().is_empty());
    assert_eq!(mothership.skipped_posts(), 1);
}

#[tokio::test]
async fn no_stale_id_after_no_task_or_failed_fetch() {
    let mothership = ScriptedMothership::new();
    mothership
        .push_task("first", "SELECT 1")
        .push_no_task()
        .push_no_task()
        .push_error(FetchError::MissingField("uuid"))
        .push_task("second", "SELECT 2");
    let delegate = TableDelegate::new();
    delegate
        .answer("SELECT 1", vec![record(&[("n", json!(1))])])
        .answer("SELECT 2", vec![record(&[("n", json!(2))])]);
    let agent = agent(&mothership, &delegate);

    assert!(agent.run_cycle().await.is_ok());
    assert_eq!(agent.run_cycle().await.unwrap(), CycleOutcome::NoTask);
    assert_eq!(agent.run_cycle().await.unwrap(), CycleOutcome::NoTask);
    assert!(agent.run_cycle().await.is_err());
    assert!(agent.run_cycle().await.is_ok());

    let ids: Vec<String> = mothership.posts().into_iter().map(|(id, _)| id).collect();
    assert_eq!(ids, vec!["first".to_string(), "second".to_string()]);
    assert_eq!(
        delegate.executed(),
        vec!["SELECT 1".to_string(), "SELECT 2".to_string()]
    );
    assert_eq!(mothership.fetch_calls(), 5);
}
