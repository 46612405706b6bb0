//! End-to-end quiz demo: a run that requests a local `display_quiz` tool,
//! gets its output submitted back, and completes with an assistant reply.
//!
//! The remote side is played by the scripted service from `skein-testing`,
//! so the demo runs without network access:
//!
//! ```sh
//! cargo run --example quiz_run
//! ```

use std::sync::Arc;

use serde_json::json;
use skein::{
    AssistantId, ExecutionResult, MessageOrder, RunCoordinator, RunStatus, ToolArguments,
    ToolCall, ToolCallId, ToolHandler, ToolName,
};
use skein_testing::{RunScript, ScriptedConversationService};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Shows a quiz to the "student" and collects canned responses
struct DisplayQuizTool;

impl ToolHandler for DisplayQuizTool {
    fn name(&self) -> &str {
        "display_quiz"
    }

    fn description(&self) -> &str {
        "Displays a quiz and returns the student's responses"
    }

    fn call(&self, arguments: ToolArguments) -> ExecutionResult {
        let title = match arguments.require_str("title") {
            Ok(title) => title,
            Err(e) => return ExecutionResult::failure(e.to_string()),
        };
        let questions = match arguments.require_array("questions") {
            Ok(questions) => questions,
            Err(e) => return ExecutionResult::failure(e.to_string()),
        };

        println!("Quiz: {title}");
        let mut responses = Vec::with_capacity(questions.len());
        for question in questions {
            let text = question
                .get("question_text")
                .and_then(|v| v.as_str())
                .unwrap_or("(no question text)");
            println!("  - {text}");
            responses.push(json!("a student answer"));
        }

        ExecutionResult::success(json!({ "responses": responses }))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry().with(fmt::layer()).init();

    let assistant = AssistantId::parse("asst_quiz_demo")?;
    let service = ScriptedConversationService::new().with_assistant(assistant.clone());

    // Script what the "remote" assistant will do: think, request the quiz
    // tool, then wrap up.
    service.push_run_script(
        RunScript::new()
            .then_status(RunStatus::InProgress)
            .then_requires_action(vec![ToolCall::new(
                ToolCallId::new_unchecked("call_quiz_1"),
                ToolName::new_unchecked("display_quiz"),
                ToolArguments::empty()
                    .with("title", json!("Arithmetic Check"))
                    .with(
                        "questions",
                        json!([
                            { "question_text": "What is 2+2?" },
                            { "question_text": "What is 7*6?" }
                        ]),
                    ),
            )])
            .then_status(RunStatus::Completed)
            .with_reply("Nice work - quiz delivered and responses recorded."),
    );

    let coordinator = RunCoordinator::new(service);
    coordinator.register_tool(Arc::new(DisplayQuizTool))?;

    let thread = coordinator.create_thread().await?;
    coordinator
        .post_message(&thread.id, "Please quiz me on arithmetic.")
        .await?;

    let handle = coordinator.start_run(&thread.id, &assistant).await?;
    let terminal = coordinator.await_completion(&handle).await?;
    println!("run {} finished: {}", terminal.run_id, terminal.status);

    println!();
    println!("conversation:");
    for message in coordinator
        .list_messages(&thread.id, MessageOrder::Ascending)
        .await?
    {
        println!("  [{}] {}", message.role, message.content);
    }

    Ok(())
}
