//! # Scripted Conversation Service
//!
//! An in-memory [`ConversationService`] that plays back predefined run
//! scripts, allowing reliable and controlled coordinator testing without a
//! remote service. Every interaction is recorded for assertions.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use skein_core::{
    AssistantId, ConversationService, Message, MessageId, ReferenceKind, RequiredAction, Role,
    Run, RunError, RunId, RunStatus, ServiceError, ServiceResult, Thread, ThreadId, ToolCall,
    ToolOutput,
};

/// One scripted transition of a run's remote state
#[derive(Debug, Clone)]
pub enum RunStep {
    /// The next poll observes this status
    Status(RunStatus),

    /// The next poll observes `requires_action` with these pending calls
    RequiresAction(Vec<ToolCall>),

    /// The next poll observes `failed` with this error detail
    Failed(RunError),
}

/// Script for a single run: the sequence of states the remote service will
/// report, plus the assistant reply appended to the thread on completion.
///
/// A run always starts `queued` (that is what `create_run` returns); each
/// subsequent `retrieve_run` consumes one step. An exhausted script keeps
/// reporting the last state, so repeated polls without scripted change are
/// idempotent. A run sitting in `requires_action` never advances on polls;
/// only `submit_tool_outputs` moves it.
#[derive(Debug, Clone, Default)]
pub struct RunScript {
    steps: VecDeque<RunStep>,
    reply: Option<String>,
}

impl RunScript {
    /// Create an empty script; the run stays `queued` forever
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a status transition
    pub fn then_status(mut self, status: RunStatus) -> Self {
        self.steps.push_back(RunStep::Status(status));
        self
    }

    /// Append a `requires_action` state with pending tool calls
    pub fn then_requires_action(mut self, tool_calls: Vec<ToolCall>) -> Self {
        self.steps.push_back(RunStep::RequiresAction(tool_calls));
        self
    }

    /// Append a `failed` state with error detail
    pub fn then_failed(mut self, code: impl Into<String>, message: impl Into<String>) -> Self {
        self.steps.push_back(RunStep::Failed(RunError {
            code: code.into(),
            message: message.into(),
        }));
        self
    }

    /// Set the assistant message appended to the thread when the run
    /// completes
    pub fn with_reply(mut self, content: impl Into<String>) -> Self {
        self.reply = Some(content.into());
        self
    }

    /// Shorthand for the common queued → in_progress → completed script
    pub fn completing_with(reply: impl Into<String>) -> Self {
        Self::new()
            .then_status(RunStatus::InProgress)
            .then_status(RunStatus::Completed)
            .with_reply(reply)
    }
}

#[derive(Debug)]
struct RunRecord {
    run: Run,
    script: VecDeque<RunStep>,
    reply: Option<String>,
}

#[derive(Debug, Default)]
struct State {
    assistants: HashSet<AssistantId>,
    threads: HashMap<ThreadId, Vec<Message>>,
    runs: HashMap<RunId, RunRecord>,
    pending_scripts: VecDeque<RunScript>,
    seq: u64,
    retrieve_counts: HashMap<RunId, u32>,
    submissions: Vec<Vec<ToolOutput>>,
    fail_next_retrieves: u32,
    fail_next_submits: u32,
}

/// In-memory conversation service with scripted run progressions.
///
/// # Example
///
/// ```rust
/// use skein_testing::{RunScript, ScriptedConversationService};
/// use skein_core::AssistantId;
///
/// let service = ScriptedConversationService::new()
///     .with_assistant(AssistantId::new_unchecked("asst_demo"));
/// service.push_run_script(RunScript::completing_with("4"));
/// ```
#[derive(Debug, Default)]
pub struct ScriptedConversationService {
    state: Mutex<State>,
}

impl ScriptedConversationService {
    /// Create an empty service with no known assistants
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an assistant reference the service will accept
    pub fn with_assistant(self, assistant: AssistantId) -> Self {
        self.state
            .lock()
            .expect("mock state lock poisoned")
            .assistants
            .insert(assistant);
        self
    }

    /// Queue a script for the next created run.
    ///
    /// Scripts are consumed by `create_run` in FIFO order; a run created
    /// with no queued script stays `queued` until cancelled.
    pub fn push_run_script(&self, script: RunScript) {
        self.state
            .lock()
            .expect("mock state lock poisoned")
            .pending_scripts
            .push_back(script);
    }

    /// Make the next `n` `retrieve_run` calls fail transiently
    pub fn fail_next_retrieves(&self, n: u32) {
        self.state
            .lock()
            .expect("mock state lock poisoned")
            .fail_next_retrieves = n;
    }

    /// Make the next `n` `submit_tool_outputs` calls fail transiently
    pub fn fail_next_submits(&self, n: u32) {
        self.state
            .lock()
            .expect("mock state lock poisoned")
            .fail_next_submits = n;
    }

    /// Every output batch submitted so far, in submission order
    pub fn submissions(&self) -> Vec<Vec<ToolOutput>> {
        self.state
            .lock()
            .expect("mock state lock poisoned")
            .submissions
            .clone()
    }

    /// How many times a run's status has been retrieved
    pub fn retrieve_count(&self, run: &RunId) -> u32 {
        self.state
            .lock()
            .expect("mock state lock poisoned")
            .retrieve_counts
            .get(run)
            .copied()
            .unwrap_or(0)
    }

    fn base_time() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .expect("valid base timestamp")
            .with_timezone(&Utc)
    }
}

impl State {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn timestamp(&self, seq: u64) -> DateTime<Utc> {
        ScriptedConversationService::base_time() + Duration::seconds(seq as i64)
    }

    fn thread_messages(&mut self, thread: &ThreadId) -> ServiceResult<&mut Vec<Message>> {
        self.threads.get_mut(thread).ok_or_else(|| {
            ServiceError::unknown_reference(ReferenceKind::Thread, thread.as_str())
        })
    }

    fn append_message(
        &mut self,
        thread: &ThreadId,
        role: Role,
        content: &str,
    ) -> ServiceResult<Message> {
        let seq = self.next_seq();
        let created_at = self.timestamp(seq);
        let message = Message::new(
            MessageId::new_unchecked(format!("msg_{seq}")),
            role,
            content,
            created_at,
        );
        self.thread_messages(thread)?.push(message.clone());
        Ok(message)
    }

    /// Apply the next scripted step, appending the reply when the run
    /// completes
    fn advance(&mut self, run_id: &RunId) {
        let completion = {
            let Some(record) = self.runs.get_mut(run_id) else {
                return;
            };
            let Some(step) = record.script.pop_front() else {
                return;
            };

            match step {
                RunStep::Status(status) => {
                    record.run.status = status;
                    record.run.required_action = None;
                }
                RunStep::RequiresAction(tool_calls) => {
                    record.run.status = RunStatus::RequiresAction;
                    record.run.required_action = Some(RequiredAction::new(tool_calls));
                }
                RunStep::Failed(error) => {
                    record.run.status = RunStatus::Failed;
                    record.run.required_action = None;
                    record.run.last_error = Some(error);
                }
            }

            if record.run.status == RunStatus::Completed {
                record
                    .reply
                    .take()
                    .map(|reply| (record.run.thread_id.clone(), reply))
            } else {
                None
            }
        };

        if let Some((thread, reply)) = completion {
            let _ = self.append_message(&thread, Role::Assistant, &reply);
        }
    }
}

#[async_trait]
impl ConversationService for ScriptedConversationService {
    async fn create_thread(&self) -> ServiceResult<Thread> {
        let mut state = self.state.lock().expect("mock state lock poisoned");
        let seq = state.next_seq();
        let id = ThreadId::new_unchecked(format!("thread_{seq}"));
        let thread = Thread::new(id.clone(), state.timestamp(seq));
        state.threads.insert(id, Vec::new());
        Ok(thread)
    }

    async fn create_message(
        &self,
        thread: &ThreadId,
        role: Role,
        content: &str,
    ) -> ServiceResult<Message> {
        let mut state = self.state.lock().expect("mock state lock poisoned");
        state.append_message(thread, role, content)
    }

    async fn list_messages(
        &self,
        thread: &ThreadId,
        after: Option<&MessageId>,
    ) -> ServiceResult<Vec<Message>> {
        let mut state = self.state.lock().expect("mock state lock poisoned");
        let messages = state.thread_messages(thread)?;

        // Native delivery order: newest first.
        let mut listed: Vec<Message> = match after {
            Some(cursor) => messages
                .iter()
                .skip_while(|m| &m.id != cursor)
                .skip(1)
                .cloned()
                .collect(),
            None => messages.clone(),
        };
        listed.reverse();
        Ok(listed)
    }

    async fn create_run(&self, thread: &ThreadId, assistant: &AssistantId) -> ServiceResult<Run> {
        let mut state = self.state.lock().expect("mock state lock poisoned");
        if !state.threads.contains_key(thread) {
            return Err(ServiceError::unknown_reference(
                ReferenceKind::Thread,
                thread.as_str(),
            ));
        }
        if !state.assistants.contains(assistant) {
            return Err(ServiceError::unknown_reference(
                ReferenceKind::Assistant,
                assistant.as_str(),
            ));
        }

        let script = state.pending_scripts.pop_front().unwrap_or_default();
        let seq = state.next_seq();
        let run = Run {
            id: RunId::new_unchecked(format!("run_{seq}")),
            thread_id: thread.clone(),
            assistant_id: assistant.clone(),
            status: RunStatus::Queued,
            required_action: None,
            last_error: None,
            created_at: state.timestamp(seq),
        };
        state.runs.insert(
            run.id.clone(),
            RunRecord {
                run: run.clone(),
                script: script.steps,
                reply: script.reply,
            },
        );
        Ok(run)
    }

    async fn retrieve_run(&self, thread: &ThreadId, run: &RunId) -> ServiceResult<Run> {
        let mut state = self.state.lock().expect("mock state lock poisoned");
        if state.fail_next_retrieves > 0 {
            state.fail_next_retrieves -= 1;
            return Err(ServiceError::transient("injected retrieve failure"));
        }

        *state.retrieve_counts.entry(run.clone()).or_insert(0) += 1;

        let record = state.runs.get(run).ok_or_else(|| {
            ServiceError::unknown_reference(ReferenceKind::Run, run.as_str())
        })?;
        if &record.run.thread_id != thread {
            return Err(ServiceError::unknown_reference(
                ReferenceKind::Thread,
                thread.as_str(),
            ));
        }

        // A requires_action run is stuck until outputs arrive; anything else
        // advances one scripted step per poll.
        let advance = record.run.status != RunStatus::RequiresAction && !record.run.is_terminal();
        if advance {
            state.advance(run);
        }

        Ok(state
            .runs
            .get(run)
            .expect("run record disappeared")
            .run
            .clone())
    }

    async fn submit_tool_outputs(
        &self,
        thread: &ThreadId,
        run: &RunId,
        outputs: Vec<ToolOutput>,
    ) -> ServiceResult<Run> {
        let mut state = self.state.lock().expect("mock state lock poisoned");
        if state.fail_next_submits > 0 {
            state.fail_next_submits -= 1;
            return Err(ServiceError::transient("injected submit failure"));
        }

        let record = state.runs.get(run).ok_or_else(|| {
            ServiceError::unknown_reference(ReferenceKind::Run, run.as_str())
        })?;
        if &record.run.thread_id != thread {
            return Err(ServiceError::unknown_reference(
                ReferenceKind::Thread,
                thread.as_str(),
            ));
        }
        if record.run.status != RunStatus::RequiresAction {
            return Err(ServiceError::contract(format!(
                "submit_tool_outputs on run in status {}",
                record.run.status
            )));
        }

        let pending: HashSet<&str> = record
            .run
            .required_action
            .as_ref()
            .map(|action| {
                action
                    .tool_calls
                    .iter()
                    .map(|call| call.id.as_str())
                    .collect()
            })
            .unwrap_or_default();
        let submitted: HashSet<&str> = outputs
            .iter()
            .map(|output| output.tool_call_id.as_str())
            .collect();
        if pending != submitted {
            return Err(ServiceError::contract(
                "submitted outputs do not match the pending tool call ids",
            ));
        }

        state.submissions.push(outputs);

        // The batch unblocks the run; play the next scripted step.
        if let Some(record) = state.runs.get_mut(run) {
            record.run.required_action = None;
            record.run.status = RunStatus::InProgress;
        }
        state.advance(run);

        Ok(state
            .runs
            .get(run)
            .expect("run record disappeared")
            .run
            .clone())
    }

    async fn cancel_run(&self, thread: &ThreadId, run: &RunId) -> ServiceResult<Run> {
        let mut state = self.state.lock().expect("mock state lock poisoned");
        let record = state.runs.get_mut(run).ok_or_else(|| {
            ServiceError::unknown_reference(ReferenceKind::Run, run.as_str())
        })?;
        if &record.run.thread_id != thread {
            return Err(ServiceError::unknown_reference(
                ReferenceKind::Thread,
                thread.as_str(),
            ));
        }

        if !record.run.is_terminal() {
            record.run.status = RunStatus::Cancelled;
            record.run.required_action = None;
        }
        Ok(record.run.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_run_rejects_unknown_references() {
        let service = ScriptedConversationService::new()
            .with_assistant(AssistantId::new_unchecked("asst_1"));
        let thread = service.create_thread().await.unwrap();

        let unknown_thread = service
            .create_run(
                &ThreadId::new_unchecked("thread_nope"),
                &AssistantId::new_unchecked("asst_1"),
            )
            .await;
        assert!(matches!(
            unknown_thread,
            Err(ServiceError::UnknownReference {
                kind: ReferenceKind::Thread,
                ..
            })
        ));

        let unknown_assistant = service
            .create_run(&thread.id, &AssistantId::new_unchecked("asst_nope"))
            .await;
        assert!(matches!(
            unknown_assistant,
            Err(ServiceError::UnknownReference {
                kind: ReferenceKind::Assistant,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn exhausted_script_is_idempotent_under_polling() {
        let service = ScriptedConversationService::new()
            .with_assistant(AssistantId::new_unchecked("asst_1"));
        let thread = service.create_thread().await.unwrap();
        let run = service
            .create_run(&thread.id, &AssistantId::new_unchecked("asst_1"))
            .await
            .unwrap();

        for _ in 0..5 {
            let polled = service.retrieve_run(&thread.id, &run.id).await.unwrap();
            assert_eq!(polled.status, RunStatus::Queued);
        }
        assert_eq!(service.retrieve_count(&run.id), 5);
    }

    #[tokio::test]
    async fn list_messages_delivers_newest_first() {
        let service = ScriptedConversationService::new();
        let thread = service.create_thread().await.unwrap();
        for content in ["first", "second", "third"] {
            service
                .create_message(&thread.id, Role::User, content)
                .await
                .unwrap();
        }

        let listed = service.list_messages(&thread.id, None).await.unwrap();
        let contents: Vec<&str> = listed.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["third", "second", "first"]);
    }

    #[tokio::test]
    async fn submit_rejects_mismatched_call_ids() {
        use skein_core::{ToolArguments, ToolCallId, ToolName};

        let service = ScriptedConversationService::new()
            .with_assistant(AssistantId::new_unchecked("asst_1"));
        service.push_run_script(RunScript::new().then_requires_action(vec![ToolCall::new(
            ToolCallId::new_unchecked("call_1"),
            ToolName::new_unchecked("display_quiz"),
            ToolArguments::empty(),
        )]));

        let thread = service.create_thread().await.unwrap();
        let run = service
            .create_run(&thread.id, &AssistantId::new_unchecked("asst_1"))
            .await
            .unwrap();
        let polled = service.retrieve_run(&thread.id, &run.id).await.unwrap();
        assert_eq!(polled.status, RunStatus::RequiresAction);

        let result = service
            .submit_tool_outputs(
                &thread.id,
                &run.id,
                vec![ToolOutput {
                    tool_call_id: ToolCallId::new_unchecked("call_other"),
                    output: "{}".to_string(),
                }],
            )
            .await;
        assert!(matches!(result, Err(ServiceError::Contract { .. })));
        assert!(service.submissions().is_empty());
    }
}
