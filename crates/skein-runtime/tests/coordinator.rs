//! Integration tests for the run coordinator against the scripted
//! conversation service.

use std::sync::Arc;
use std::time::Duration;

use rstest::rstest;
use serde_json::json;

use skein_core::{
    AssistantId, ConversationService, CoordinatorError, RunEvent, RunStatus, ToolArguments,
    ToolCall, ToolCallId, ToolName,
};
use skein_runtime::{CoordinatorConfig, MessageOrder, RetryPolicy, RunCoordinator};
use skein_testing::{MockToolHandler, RecordingSink, RunScript, ScriptedConversationService};

const ASSISTANT: &str = "asst_demo";

fn assistant() -> AssistantId {
    AssistantId::new_unchecked(ASSISTANT)
}

fn service() -> ScriptedConversationService {
    ScriptedConversationService::new().with_assistant(assistant())
}

fn quiz_call(id: &str, title: &str) -> ToolCall {
    ToolCall::new(
        ToolCallId::new_unchecked(id),
        ToolName::new_unchecked("display_quiz"),
        ToolArguments::empty()
            .with("title", json!(title))
            .with("questions", json!([{"question_text": "2+2?"}])),
    )
}

fn fast_config() -> CoordinatorConfig {
    CoordinatorConfig {
        poll_interval: Duration::from_millis(100),
        run_timeout: Duration::from_secs(30),
        retry: RetryPolicy::default(),
    }
}

#[tokio::test(start_paused = true)]
async fn active_statuses_never_trigger_dispatch() {
    let coordinator = RunCoordinator::new(service()).with_config(fast_config());
    coordinator.service().push_run_script(
        RunScript::new()
            .then_status(RunStatus::InProgress)
            .then_status(RunStatus::InProgress)
            .then_status(RunStatus::Completed),
    );
    let handler = MockToolHandler::new("display_quiz");
    coordinator
        .register_tool(Arc::new(handler.clone()))
        .unwrap();

    let thread = coordinator.create_thread().await.unwrap();
    let handle = coordinator.start_run(&thread.id, &assistant()).await.unwrap();
    let terminal = coordinator.await_completion(&handle).await.unwrap();

    assert!(terminal.is_completed());
    assert_eq!(handler.call_count(), 0);
    assert!(coordinator.service().submissions().is_empty());
}

#[tokio::test(start_paused = true)]
async fn requires_action_invokes_once_per_call_id() {
    let coordinator = RunCoordinator::new(service()).with_config(fast_config());
    // Two calls share a name; the third uses a different tool.
    coordinator.service().push_run_script(
        RunScript::new()
            .then_requires_action(vec![
                quiz_call("call_1", "Quiz A"),
                quiz_call("call_2", "Quiz B"),
                ToolCall::new(
                    ToolCallId::new_unchecked("call_3"),
                    ToolName::new_unchecked("grade_quiz"),
                    ToolArguments::empty().with("answers", json!(["4"])),
                ),
            ])
            .then_status(RunStatus::Completed),
    );

    let quiz = MockToolHandler::new("display_quiz").with_response(json!({"displayed": true}));
    let grade = MockToolHandler::new("grade_quiz").with_response(json!({"score": 1}));
    coordinator.register_tool(Arc::new(quiz.clone())).unwrap();
    coordinator.register_tool(Arc::new(grade.clone())).unwrap();

    let thread = coordinator.create_thread().await.unwrap();
    let handle = coordinator.start_run(&thread.id, &assistant()).await.unwrap();
    let terminal = coordinator.await_completion(&handle).await.unwrap();

    assert!(terminal.is_completed());
    // One handler invocation per call id, duplicate names included.
    assert_eq!(quiz.call_count(), 2);
    assert_eq!(grade.call_count(), 1);

    // Exactly one batch, with one output per call, in call order.
    let submissions = coordinator.service().submissions();
    assert_eq!(submissions.len(), 1);
    let ids: Vec<&str> = submissions[0]
        .iter()
        .map(|o| o.tool_call_id.as_str())
        .collect();
    assert_eq!(ids, ["call_1", "call_2", "call_3"]);
}

#[tokio::test(start_paused = true)]
async fn unregistered_tools_abort_the_whole_batch() {
    let coordinator = RunCoordinator::new(service()).with_config(fast_config());
    coordinator.service().push_run_script(
        RunScript::new().then_requires_action(vec![
            quiz_call("call_1", "Quiz A"),
            ToolCall::new(
                ToolCallId::new_unchecked("call_2"),
                ToolName::new_unchecked("grade_quiz"),
                ToolArguments::empty(),
            ),
            ToolCall::new(
                ToolCallId::new_unchecked("call_3"),
                ToolName::new_unchecked("publish_scores"),
                ToolArguments::empty(),
            ),
            ToolCall::new(
                ToolCallId::new_unchecked("call_4"),
                ToolName::new_unchecked("grade_quiz"),
                ToolArguments::empty(),
            ),
        ]),
    );

    let quiz = MockToolHandler::new("display_quiz");
    coordinator.register_tool(Arc::new(quiz.clone())).unwrap();

    let thread = coordinator.create_thread().await.unwrap();
    let handle = coordinator.start_run(&thread.id, &assistant()).await.unwrap();
    let err = coordinator.await_completion(&handle).await.unwrap_err();

    match err {
        CoordinatorError::UnresolvedToolCalls { missing } => {
            // Every missing name, once each, no duplicates.
            assert_eq!(
                missing,
                vec![
                    ToolName::new_unchecked("grade_quiz"),
                    ToolName::new_unchecked("publish_scores"),
                ]
            );
        }
        other => panic!("expected UnresolvedToolCalls, got {other:?}"),
    }

    // Nothing was submitted and nothing was invoked, not even the
    // registered handler.
    assert!(coordinator.service().submissions().is_empty());
    assert_eq!(quiz.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn handler_failure_aborts_without_partial_submission() {
    let coordinator = RunCoordinator::new(service()).with_config(fast_config());
    coordinator.service().push_run_script(
        RunScript::new().then_requires_action(vec![
            quiz_call("call_1", "Quiz A"),
            ToolCall::new(
                ToolCallId::new_unchecked("call_2"),
                ToolName::new_unchecked("grade_quiz"),
                ToolArguments::empty(),
            ),
        ]),
    );

    let quiz = MockToolHandler::new("display_quiz").with_response(json!({"ok": true}));
    let grade = MockToolHandler::new("grade_quiz").with_failure("grading backend offline");
    coordinator.register_tool(Arc::new(quiz)).unwrap();
    coordinator.register_tool(Arc::new(grade)).unwrap();

    let thread = coordinator.create_thread().await.unwrap();
    let handle = coordinator.start_run(&thread.id, &assistant()).await.unwrap();
    let err = coordinator.await_completion(&handle).await.unwrap_err();

    match err {
        CoordinatorError::ToolHandler {
            tool_call_id,
            name,
            message,
        } => {
            assert_eq!(tool_call_id.as_str(), "call_2");
            assert_eq!(name.as_str(), "grade_quiz");
            assert_eq!(message, "grading backend offline");
        }
        other => panic!("expected ToolHandler, got {other:?}"),
    }
    assert!(coordinator.service().submissions().is_empty());
}

#[tokio::test(start_paused = true)]
async fn quiz_round_trip_submits_json_encoded_output() {
    let coordinator = RunCoordinator::new(service()).with_config(fast_config());
    coordinator.service().push_run_script(
        RunScript::new()
            .then_status(RunStatus::InProgress)
            .then_requires_action(vec![quiz_call("call_quiz", "Sample Quiz")])
            .then_status(RunStatus::Completed)
            .with_reply("Thanks, quiz displayed."),
    );

    let responses = json!({"responses": ["a student answer"]});
    let quiz = MockToolHandler::new("display_quiz").with_response(responses.clone());
    coordinator.register_tool(Arc::new(quiz.clone())).unwrap();

    let thread = coordinator.create_thread().await.unwrap();
    coordinator
        .post_message(&thread.id, "Make a quiz")
        .await
        .unwrap();
    let handle = coordinator.start_run(&thread.id, &assistant()).await.unwrap();
    let terminal = coordinator.await_completion(&handle).await.unwrap();

    assert!(terminal.is_completed());

    // The handler saw the structured arguments the service sent.
    let seen = quiz.call_history();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].require_str("title").unwrap(), "Sample Quiz");

    // Exactly one output, carrying the handler's return value JSON-encoded.
    let submissions = coordinator.service().submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].len(), 1);
    assert_eq!(submissions[0][0].tool_call_id.as_str(), "call_quiz");
    assert_eq!(submissions[0][0].output, responses.to_string());
}

#[tokio::test(start_paused = true)]
async fn end_to_end_conversation_in_chronological_order() {
    let coordinator = RunCoordinator::new(service()).with_config(fast_config());
    coordinator
        .service()
        .push_run_script(RunScript::completing_with("4"));

    let thread = coordinator.create_thread().await.unwrap();
    coordinator.post_message(&thread.id, "2+2?").await.unwrap();

    let handle = coordinator.start_run(&thread.id, &assistant()).await.unwrap();
    let terminal = coordinator.await_completion(&handle).await.unwrap();
    assert_eq!(terminal.status, RunStatus::Completed);

    let messages = coordinator
        .list_messages(&thread.id, MessageOrder::Ascending)
        .await
        .unwrap();
    assert_eq!(messages.len(), 2);
    assert!(messages[0].is_user());
    assert_eq!(messages[0].content, "2+2?");
    assert!(messages[1].is_assistant());
    assert_eq!(messages[1].content, "4");

    // Descending mirrors the remote default.
    let reversed = coordinator
        .list_messages(&thread.id, MessageOrder::Descending)
        .await
        .unwrap();
    assert_eq!(reversed[0].content, "4");
}

#[tokio::test(start_paused = true)]
async fn timeout_leaves_run_running_without_submitting() {
    let coordinator = RunCoordinator::new(service()).with_config(fast_config());
    // No script: the remote never leaves `queued`.
    let thread = coordinator.create_thread().await.unwrap();
    let handle = coordinator.start_run(&thread.id, &assistant()).await.unwrap();

    let err = coordinator
        .await_completion_with(&handle, Duration::from_millis(100), Duration::from_millis(50))
        .await
        .unwrap_err();

    match err {
        CoordinatorError::Timeout { budget } => {
            assert_eq!(budget, Duration::from_millis(50));
            assert!(CoordinatorError::Timeout { budget }.is_recoverable());
        }
        other => panic!("expected Timeout, got {other:?}"),
    }
    assert!(coordinator.service().submissions().is_empty());

    // The remote run was left running, not cancelled.
    let run = coordinator
        .service()
        .retrieve_run(&thread.id, handle.run_id())
        .await
        .unwrap();
    assert_eq!(run.status, RunStatus::Queued);
}

#[tokio::test(start_paused = true)]
async fn transient_failures_are_retried_within_budget() {
    let config = CoordinatorConfig {
        retry: RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(10),
        },
        ..fast_config()
    };
    let coordinator = RunCoordinator::new(service()).with_config(config);
    coordinator
        .service()
        .push_run_script(RunScript::completing_with("done"));
    coordinator.service().fail_next_retrieves(2);

    let thread = coordinator.create_thread().await.unwrap();
    let handle = coordinator.start_run(&thread.id, &assistant()).await.unwrap();
    let terminal = coordinator.await_completion(&handle).await.unwrap();
    assert!(terminal.is_completed());
}

#[tokio::test(start_paused = true)]
async fn transient_failures_beyond_budget_surface_as_remote() {
    let config = CoordinatorConfig {
        retry: RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(10),
        },
        ..fast_config()
    };
    let coordinator = RunCoordinator::new(service()).with_config(config);
    coordinator.service().fail_next_retrieves(5);

    let thread = coordinator.create_thread().await.unwrap();
    let handle = coordinator.start_run(&thread.id, &assistant()).await.unwrap();
    let err = coordinator.await_completion(&handle).await.unwrap_err();

    match err {
        CoordinatorError::Remote { attempts, .. } => assert_eq!(attempts, 3),
        other => panic!("expected Remote, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn start_run_surfaces_unknown_assistant_immediately() {
    let coordinator = RunCoordinator::new(service()).with_config(fast_config());
    let thread = coordinator.create_thread().await.unwrap();

    let err = coordinator
        .start_run(&thread.id, &AssistantId::new_unchecked("asst_unknown"))
        .await
        .unwrap_err();
    assert!(matches!(err, CoordinatorError::InvalidReference { .. }));
    assert!(!err.is_recoverable());
}

#[tokio::test(start_paused = true)]
async fn cancellation_is_honored_at_the_wait_boundary() {
    let coordinator = Arc::new(RunCoordinator::new(service()).with_config(fast_config()));
    // No script: the run would otherwise poll until the timeout.
    let thread = coordinator.create_thread().await.unwrap();
    let handle = coordinator.start_run(&thread.id, &assistant()).await.unwrap();
    let canceller = handle.canceller();

    let task = tokio::spawn({
        let coordinator = Arc::clone(&coordinator);
        async move { coordinator.await_completion(&handle).await }
    });

    // Let the loop reach its wait point, then signal.
    tokio::time::sleep(Duration::from_millis(10)).await;
    canceller.cancel();

    let terminal = task.await.unwrap().unwrap();
    assert_eq!(terminal.status, RunStatus::Cancelled);
}

#[tokio::test(start_paused = true)]
async fn events_are_emitted_through_the_whole_lifecycle() {
    let sink = RecordingSink::new();
    let coordinator = RunCoordinator::new(service())
        .with_config(fast_config())
        .with_event_sink(Arc::new(sink.clone()));
    coordinator.service().push_run_script(
        RunScript::new()
            .then_requires_action(vec![quiz_call("call_1", "Quiz")])
            .then_status(RunStatus::Completed),
    );
    coordinator
        .register_tool(Arc::new(MockToolHandler::new("display_quiz")))
        .unwrap();

    let thread = coordinator.create_thread().await.unwrap();
    let handle = coordinator.start_run(&thread.id, &assistant()).await.unwrap();
    coordinator.await_completion(&handle).await.unwrap();

    let events = sink.events();
    assert!(matches!(events.first(), Some(RunEvent::RunStarted { .. })));
    assert!(matches!(events.last(), Some(RunEvent::RunFinished { .. })));
    assert_eq!(
        sink.count_matching(|e| matches!(e, RunEvent::ToolDispatched { .. })),
        1
    );
    assert_eq!(
        sink.count_matching(|e| matches!(e, RunEvent::OutputsSubmitted { count: 1, .. })),
        1
    );
    assert!(sink.count_matching(|e| matches!(e, RunEvent::StatusPolled { .. })) >= 2);
}

#[rstest]
#[case::completed(RunStatus::Completed)]
#[case::cancelled(RunStatus::Cancelled)]
#[case::expired(RunStatus::Expired)]
#[tokio::test(start_paused = true)]
async fn every_terminal_status_ends_the_poll_loop(#[case] status: RunStatus) {
    let coordinator = RunCoordinator::new(service()).with_config(fast_config());
    coordinator.service().push_run_script(
        RunScript::new()
            .then_status(RunStatus::InProgress)
            .then_status(status),
    );

    let thread = coordinator.create_thread().await.unwrap();
    let handle = coordinator.start_run(&thread.id, &assistant()).await.unwrap();
    let terminal = coordinator.await_completion(&handle).await.unwrap();

    assert_eq!(terminal.status, status);
    // Terminal states are never retried by the coordinator itself.
    assert_eq!(coordinator.service().retrieve_count(handle.run_id()), 2);
}

#[tokio::test(start_paused = true)]
async fn failed_runs_carry_remote_error_detail() {
    let coordinator = RunCoordinator::new(service()).with_config(fast_config());
    coordinator.service().push_run_script(
        RunScript::new()
            .then_status(RunStatus::InProgress)
            .then_failed("rate_limit_exceeded", "too many requests"),
    );

    let thread = coordinator.create_thread().await.unwrap();
    let handle = coordinator.start_run(&thread.id, &assistant()).await.unwrap();
    let terminal = coordinator.await_completion(&handle).await.unwrap();

    assert_eq!(terminal.status, RunStatus::Failed);
    let error = terminal.error.expect("failed run reports error detail");
    assert_eq!(error.code, "rate_limit_exceeded");
    assert_eq!(error.message, "too many requests");
}
