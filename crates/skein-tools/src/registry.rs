use skein_core::{ExecutionResult, ToolCall, ToolHandler, ToolName};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Trait for managing and dispatching tool calls.
///
/// Tool registries maintain collections of registered handlers and route
/// incoming tool calls to the appropriate implementations. The coordinator
/// resolves an entire `requires_action` batch before invoking anything, so
/// the resolution step is exposed separately from dispatch.
pub trait ToolRegistry {
    /// Look up the handler registered under a name.
    ///
    /// # Returns
    ///
    /// `Some(handler)` if the name is registered, `None` otherwise
    fn resolve(&self, name: &ToolName) -> Option<Arc<dyn ToolHandler>>;

    /// Resolve and invoke the handler for a single tool call.
    ///
    /// Returns `None` if the requested tool is not found in the registry.
    fn dispatch(&self, call: &ToolCall) -> Option<ExecutionResult> {
        self.resolve(&call.name)
            .map(|handler| handler.call(call.arguments.clone()))
    }

    /// Get all tool names currently registered
    fn tool_names(&self) -> Vec<ToolName>;
}

/// In-memory tool registry for local handler storage and dispatch.
///
/// Handlers are stored in a `HashMap` behind a `RwLock`: lookups during a
/// run take the read lock and may proceed concurrently across runs, while
/// `register` takes the write lock and is serialized against all readers.
/// A dispatch batch resolves all of its handlers under one read guard, so a
/// concurrent `register` is observed atomically per batch: it lands either
/// before the whole batch or after it.
///
/// # Example
///
/// ```rust
/// use skein_tools::{InMemoryToolRegistry, ToolRegistry};
/// use skein_core::{ExecutionResult, ToolArguments, ToolHandler, ToolName};
/// use std::sync::Arc;
///
/// struct EchoTool;
///
/// impl ToolHandler for EchoTool {
///     fn name(&self) -> &str { "echo" }
///     fn call(&self, arguments: ToolArguments) -> ExecutionResult {
///         ExecutionResult::success(arguments.into())
///     }
/// }
///
/// let registry = InMemoryToolRegistry::new().with_handler(Arc::new(EchoTool)).unwrap();
/// let name = ToolName::parse("echo").unwrap();
/// assert!(registry.resolve(&name).is_some());
/// ```
#[derive(Default)]
pub struct InMemoryToolRegistry {
    handlers: RwLock<HashMap<ToolName, Arc<dyn ToolHandler>>>,
}

impl InMemoryToolRegistry {
    /// Create a new empty tool registry
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Add a handler to the registry using the builder pattern.
    ///
    /// The handler's own `name()` is validated and used as the registry
    /// key.
    ///
    /// # Returns
    ///
    /// `Ok(Self)` for method chaining, or the validation error if the
    /// handler reports an invalid name
    pub fn with_handler(
        self,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<Self, skein_core::IdValidationError> {
        self.register(handler)?;
        Ok(self)
    }

    /// Register a handler, adding it or replacing any existing entry under
    /// the same name.
    ///
    /// Writers are serialized behind the registry's write lock. Must be
    /// called before a run reaches `requires_action` for the name, or that
    /// dispatch batch fails with an unresolved-tool error.
    pub fn register(
        &self,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<ToolName, skein_core::IdValidationError> {
        let name = ToolName::parse(handler.name())?;
        let mut handlers = self.handlers.write().expect("registry lock poisoned");
        if handlers.insert(name.clone(), handler).is_some() {
            tracing::debug!(tool = %name, "replaced tool handler");
        }
        Ok(name)
    }

    /// Register a handler under an explicit name, ignoring the handler's
    /// own `name()`.
    pub fn register_as(&self, name: ToolName, handler: Arc<dyn ToolHandler>) {
        let mut handlers = self.handlers.write().expect("registry lock poisoned");
        handlers.insert(name, handler);
    }

    /// Resolve every name in a batch under a single read guard.
    ///
    /// Returns the handlers in call order, or the complete list of missing
    /// names. All-or-nothing, matching the dispatch contract.
    pub fn resolve_batch(
        &self,
        names: &[&ToolName],
    ) -> Result<Vec<Arc<dyn ToolHandler>>, Vec<ToolName>> {
        let handlers = self.handlers.read().expect("registry lock poisoned");

        let mut resolved = Vec::with_capacity(names.len());
        let mut missing: Vec<ToolName> = Vec::new();
        for name in names {
            match handlers.get(name) {
                Some(handler) => resolved.push(Arc::clone(handler)),
                None => {
                    if !missing.contains(name) {
                        missing.push((*name).clone());
                    }
                }
            }
        }

        if missing.is_empty() {
            Ok(resolved)
        } else {
            Err(missing)
        }
    }

    /// Get the number of handlers registered
    pub fn len(&self) -> usize {
        self.handlers.read().expect("registry lock poisoned").len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.handlers
            .read()
            .expect("registry lock poisoned")
            .is_empty()
    }
}

impl ToolRegistry for InMemoryToolRegistry {
    fn resolve(&self, name: &ToolName) -> Option<Arc<dyn ToolHandler>> {
        self.handlers
            .read()
            .expect("registry lock poisoned")
            .get(name)
            .cloned()
    }

    fn tool_names(&self) -> Vec<ToolName> {
        self.handlers
            .read()
            .expect("registry lock poisoned")
            .keys()
            .cloned()
            .collect()
    }
}
