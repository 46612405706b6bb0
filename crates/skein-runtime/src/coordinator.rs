//! The run coordinator: polling loop, tool-call dispatch, and batch
//! submission against a [`ConversationService`].

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use skein_core::{
    AssistantId, ConversationService, CoordinatorError, CoordinatorResult, EventSink,
    ExecutionResult, Message, Role, Run, RunEvent, RunId, ServiceResult, TerminalRun, Thread,
    ThreadId, ToolHandler, ToolName, ToolOutput,
};
use skein_tools::InMemoryToolRegistry;

use crate::cancel::{CancelState, RunCanceller};
use crate::config::CoordinatorConfig;
use crate::order::{MessageOrder, normalize_order};

/// Handle to a run created by [`RunCoordinator::start_run`].
///
/// Carries the references the poll loop needs, the wall-clock start instant
/// the timeout budget is measured from, and the cooperative cancellation
/// state.
#[derive(Debug)]
pub struct RunHandle {
    run_id: RunId,
    thread_id: ThreadId,
    started_at: Instant,
    cancel: Arc<CancelState>,
}

impl RunHandle {
    /// The run this handle tracks
    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// The thread the run executes against
    pub fn thread_id(&self) -> &ThreadId {
        &self.thread_id
    }

    /// Wall-clock time since `start_run`
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Obtain a cancellation handle for this run.
    ///
    /// The signal is honored at the next poll wait boundary, never
    /// mid-tool-invocation.
    pub fn canceller(&self) -> RunCanceller {
        RunCanceller::new(Arc::clone(&self.cancel))
    }
}

/// Client-side coordinator for conversational runs.
///
/// Owns the lifecycle of runs against an external conversation service:
/// submitting input, polling for completion, dispatching `requires_action`
/// tool calls to locally registered handlers, submitting their outputs, and
/// resuming polling until a terminal state is reached.
///
/// # Scheduling model
///
/// Cooperative: `await_completion` is an async fn whose only suspension
/// point per iteration is the poll wait, so many runs' loops interleave on
/// one tokio runtime. Independent coordinator instances share no mutable
/// state unless they are explicitly constructed over the same registry.
///
/// # Example
///
/// ```rust,ignore
/// let coordinator = RunCoordinator::new(service)
///     .with_config(CoordinatorConfig::from_env()?);
/// coordinator.register_tool(Arc::new(QuizTool))?;
///
/// let thread = coordinator.create_thread().await?;
/// coordinator.post_message(&thread.id, "2+2?").await?;
///
/// let handle = coordinator.start_run(&thread.id, &assistant).await?;
/// let terminal = coordinator.await_completion(&handle).await?;
/// assert!(terminal.is_completed());
/// ```
pub struct RunCoordinator<S> {
    service: S,
    registry: Arc<InMemoryToolRegistry>,
    config: CoordinatorConfig,
    sinks: Vec<Arc<dyn EventSink>>,
}

impl<S: ConversationService> RunCoordinator<S> {
    /// Create a coordinator over a service with default configuration and
    /// a fresh, private tool registry
    pub fn new(service: S) -> Self {
        Self {
            service,
            registry: Arc::new(InMemoryToolRegistry::new()),
            config: CoordinatorConfig::default(),
            sinks: Vec::new(),
        }
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Share a tool registry with other coordinator instances.
    ///
    /// Concurrent reads are safe; `register_tool` writes are serialized
    /// behind the registry's lock.
    pub fn with_registry(mut self, registry: Arc<InMemoryToolRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Subscribe an event sink to this coordinator's lifecycle events
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// The tool registry this coordinator dispatches against
    pub fn registry(&self) -> &Arc<InMemoryToolRegistry> {
        &self.registry
    }

    /// The underlying conversation service
    pub fn service(&self) -> &S {
        &self.service
    }

    /// The active configuration
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Register a tool handler, adding it or replacing an existing entry
    /// under the same name.
    ///
    /// Must be called before a run reaches `requires_action` for that tool
    /// name, or the dispatch step fails with
    /// [`CoordinatorError::UnresolvedToolCalls`].
    pub fn register_tool(&self, handler: Arc<dyn ToolHandler>) -> CoordinatorResult<ToolName> {
        let name = self.registry.register(handler)?;
        debug!(tool = %name, "registered tool handler");
        Ok(name)
    }

    /// Create a new thread on the remote service
    pub async fn create_thread(&self) -> CoordinatorResult<Thread> {
        self.call_with_retry(|| self.service.create_thread()).await
    }

    /// Append a user message to a thread
    pub async fn post_message(
        &self,
        thread: &ThreadId,
        content: &str,
    ) -> CoordinatorResult<Message> {
        self.call_with_retry(|| self.service.create_message(thread, Role::User, content))
            .await
    }

    /// List a thread's messages in the requested presentation order.
    ///
    /// The remote service delivers newest-first; normalization is a pure,
    /// deterministic transform (stable by `created_at`, then id).
    pub async fn list_messages(
        &self,
        thread: &ThreadId,
        order: MessageOrder,
    ) -> CoordinatorResult<Vec<Message>> {
        let raw = self
            .call_with_retry(|| self.service.list_messages(thread, None))
            .await?;
        Ok(normalize_order(raw, order))
    }

    /// Begin a run of an assistant against an existing thread.
    ///
    /// Fails with [`CoordinatorError::InvalidReference`] if either reference
    /// is unknown to the remote service. Surfaced from the remote call, not
    /// validated locally, and never retried.
    pub async fn start_run(
        &self,
        thread: &ThreadId,
        assistant: &AssistantId,
    ) -> CoordinatorResult<RunHandle> {
        let run = self
            .service
            .create_run(thread, assistant)
            .await
            .map_err(|e| CoordinatorError::from_service(e, 1))?;

        info!(run_id = %run.id, thread_id = %thread, "run started");
        self.emit(RunEvent::RunStarted {
            run_id: run.id.clone(),
            thread_id: thread.clone(),
        });

        Ok(RunHandle {
            run_id: run.id,
            thread_id: thread.clone(),
            started_at: Instant::now(),
            cancel: Arc::new(CancelState::default()),
        })
    }

    /// Drive the run's state machine to a terminal state, dispatching tool
    /// calls as needed, using the configured poll interval and timeout.
    pub async fn await_completion(&self, handle: &RunHandle) -> CoordinatorResult<TerminalRun> {
        self.await_completion_with(handle, self.config.poll_interval, self.config.run_timeout)
            .await
    }

    /// Like [`await_completion`](Self::await_completion) with explicit poll
    /// interval and wall-clock timeout for this run only.
    ///
    /// The timeout is measured from `start_run`, not from this call and not
    /// per poll. On timeout the remote run is left running; it is only
    /// cancelled when the caller signals the handle's
    /// [`canceller`](RunHandle::canceller).
    pub async fn await_completion_with(
        &self,
        handle: &RunHandle,
        poll_interval: Duration,
        timeout: Duration,
    ) -> CoordinatorResult<TerminalRun> {
        let mut poll: u32 = 0;

        loop {
            let run = self
                .call_with_retry(|| self.service.retrieve_run(&handle.thread_id, &handle.run_id))
                .await?;
            poll += 1;

            debug!(run_id = %run.id, status = %run.status, poll, "polled run status");
            self.emit(RunEvent::StatusPolled {
                run_id: run.id.clone(),
                status: run.status,
                poll,
            });

            if run.is_terminal() {
                return Ok(self.finish(run));
            }

            if run.requires_action() {
                // Dispatch immediately; a requires_action run is not waiting.
                self.dispatch_required_action(&run).await?;
            }

            if handle.elapsed() >= timeout {
                warn!(run_id = %handle.run_id, "run timed out; remote run left running");
                return Err(CoordinatorError::Timeout { budget: timeout });
            }

            // The single suspension point per iteration: the poll wait,
            // raced against the cancellation signal.
            tokio::select! {
                _ = tokio::time::sleep(poll_interval) => {}
                _ = handle.cancel.notified() => {}
            }

            if handle.cancel.is_requested() {
                let run = self.cancel_remote(handle).await?;
                if run.is_terminal() {
                    return Ok(self.finish(run));
                }
                // Service acknowledged but has not settled yet; keep polling.
            }
        }
    }

    /// Dispatch every pending tool call of a `requires_action` run and
    /// submit the complete batch of outputs.
    ///
    /// All-or-nothing: handler resolution happens for the whole batch before
    /// any handler runs, and a handler failure aborts the batch with nothing
    /// submitted.
    async fn dispatch_required_action(&self, run: &Run) -> CoordinatorResult<Run> {
        let action = run.required_action.as_ref().ok_or_else(|| {
            CoordinatorError::contract("requires_action run carried no required_action payload")
        })?;
        if action.tool_calls.is_empty() {
            return Err(CoordinatorError::contract(
                "requires_action run requested an empty tool call batch",
            ));
        }

        let names: Vec<&ToolName> = action.tool_calls.iter().map(|call| &call.name).collect();
        let handlers = self
            .registry
            .resolve_batch(&names)
            .map_err(|missing| CoordinatorError::UnresolvedToolCalls { missing })?;

        let mut outputs = Vec::with_capacity(action.tool_calls.len());
        for (call, handler) in action.tool_calls.iter().zip(handlers) {
            debug!(
                run_id = %run.id,
                tool_call_id = %call.id,
                tool = %call.name,
                "dispatching tool call"
            );
            self.emit(RunEvent::ToolDispatched {
                run_id: run.id.clone(),
                tool_call_id: call.id.clone(),
                name: call.name.clone(),
            });

            match handler.call(call.arguments.clone()) {
                ExecutionResult::Success { output } => {
                    outputs.push(ToolOutput::from_value(call.id.clone(), &output));
                }
                ExecutionResult::Failure { error } => {
                    return Err(CoordinatorError::ToolHandler {
                        tool_call_id: call.id.clone(),
                        name: call.name.clone(),
                        message: error,
                    });
                }
            }
        }

        let submitted = outputs.len();
        let resumed = self
            .call_with_retry(|| {
                self.service
                    .submit_tool_outputs(&run.thread_id, &run.id, outputs.clone())
            })
            .await?;

        debug!(run_id = %run.id, count = submitted, "submitted tool output batch");
        self.emit(RunEvent::OutputsSubmitted {
            run_id: run.id.clone(),
            count: submitted,
        });

        Ok(resumed)
    }

    /// Ask the remote service to cancel the run
    async fn cancel_remote(&self, handle: &RunHandle) -> CoordinatorResult<Run> {
        info!(run_id = %handle.run_id, "cancellation requested; cancelling remote run");
        self.call_with_retry(|| self.service.cancel_run(&handle.thread_id, &handle.run_id))
            .await
    }

    /// Retry a single remote call on transient failures, bounded by the
    /// configured policy, with exponential backoff between attempts.
    async fn call_with_retry<T, F, Fut>(&self, mut call: F) -> CoordinatorResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ServiceResult<T>>,
    {
        let mut attempt: u32 = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.config.retry.max_attempts => {
                    let delay = self.config.retry.delay_for(attempt);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient service failure; retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(CoordinatorError::from_service(err, attempt)),
            }
        }
    }

    fn finish(&self, run: Run) -> TerminalRun {
        info!(run_id = %run.id, status = %run.status, "run reached terminal state");
        self.emit(RunEvent::RunFinished {
            run_id: run.id.clone(),
            status: run.status,
        });
        TerminalRun {
            run_id: run.id,
            thread_id: run.thread_id,
            status: run.status,
            error: run.last_error,
        }
    }

    fn emit(&self, event: RunEvent) {
        for sink in &self.sinks {
            sink.on_event(&event);
        }
    }
}
