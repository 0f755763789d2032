//! Hook system for observing command execution.
//!
//! Hooks run at fixed points of a dispatch and let applications add
//! cross-cutting behaviour (auditing, telemetry, result rewriting) without
//! touching command bodies.
//!
//! # Pipeline Position
//!
//! ```text
//! argv
//!   → path matching, binding, processors, derived resolution
//!   → ON-CMD-RUN HOOK ← (audit, telemetry; can abort)
//!   → command body
//!   → POST-RUN HOOK ← (inspect or replace the returned value)
//! ```
//!
//! Both hooks receive a [`CommandMeta`]: the dotted command path, the keyword
//! set the body is invoked with (derived values appear under their parameter
//! names, never as derived nodes), and the leaf option values they were
//! computed from.

use std::fmt;
use std::rc::Rc;
use thiserror::Error;

use crate::value::{Args, Value};

/// What a hook sees about the command about to run (or that just ran).
#[derive(Debug, Clone)]
pub struct CommandMeta {
    /// Dispatch tokens from the root, e.g. `["sub", "foo"]`.
    pub path: Vec<String>,
    /// The keyword set passed to the command body.
    pub args: Args,
    /// Every leaf option value resolved for the command, including the
    /// inputs of derived parameters.
    pub leaves: Args,
}

impl CommandMeta {
    /// The command path joined with dots, e.g. `sub.foo`.
    pub fn command_name(&self) -> String {
        path_to_string(&self.path)
    }
}

/// The phase at which a hook error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    /// Error occurred before the command body ran
    OnCommandRun,
    /// Error occurred after the command body returned
    PostRun,
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookPhase::OnCommandRun => write!(f, "on-cmd-run"),
            HookPhase::PostRun => write!(f, "post-run"),
        }
    }
}

/// Error returned by a hook.
#[derive(Debug, Error)]
#[error("hook error ({phase}): {message}")]
pub struct HookError {
    /// Human-readable error message
    pub message: String,
    /// The hook phase where the error occurred
    pub phase: HookPhase,
    /// The underlying error source, if any
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl HookError {
    /// Creates a new hook error for the on-cmd-run phase.
    pub fn on_command_run(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            phase: HookPhase::OnCommandRun,
            source: None,
        }
    }

    /// Creates a new hook error for the post-run phase.
    pub fn post_run(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            phase: HookPhase::PostRun,
            source: None,
        }
    }

    /// Sets the source error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        self.source = Some(source.into());
        self
    }
}

/// Type alias for on-cmd-run hook functions.
pub type OnCommandRunFn = Rc<dyn Fn(&CommandMeta) -> Result<(), HookError>>;

/// Type alias for post-run hook functions.
pub type PostRunFn = Rc<dyn Fn(&CommandMeta, Value) -> Result<Value, HookError>>;

/// Tree-wide hook configuration.
///
/// Hooks registered on the root apply to every command beneath it and run in
/// registration order.
#[derive(Clone, Default)]
pub struct Hooks {
    on_cmd_run: Vec<OnCommandRunFn>,
    post_run: Vec<PostRunFn>,
}

impl Hooks {
    /// Creates a new empty hooks configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if no hooks are registered.
    pub fn is_empty(&self) -> bool {
        self.on_cmd_run.is_empty() && self.post_run.is_empty()
    }

    /// Adds a hook invoked immediately before every command body.
    ///
    /// # Example
    ///
    /// ```rust
    /// use roost_dispatch::{Hooks, HookError};
    ///
    /// let hooks = Hooks::new().on_cmd_run(|meta| {
    ///     if meta.command_name() == "forbidden" {
    ///         return Err(HookError::on_command_run("not allowed"));
    ///     }
    ///     Ok(())
    /// });
    /// assert!(!hooks.is_empty());
    /// ```
    pub fn on_cmd_run<F>(mut self, f: F) -> Self
    where
        F: Fn(&CommandMeta) -> Result<(), HookError> + 'static,
    {
        self.on_cmd_run.push(Rc::new(f));
        self
    }

    /// Adds a hook that receives the command's return value and may replace it.
    pub fn post_run<F>(mut self, f: F) -> Self
    where
        F: Fn(&CommandMeta, Value) -> Result<Value, HookError> + 'static,
    {
        self.post_run.push(Rc::new(f));
        self
    }

    /// Appends every hook of `other` after the hooks already registered.
    pub fn extend(&mut self, other: Hooks) {
        self.on_cmd_run.extend(other.on_cmd_run);
        self.post_run.extend(other.post_run);
    }

    /// Runs all on-cmd-run hooks, stopping at the first error.
    pub fn run_on_cmd_run(&self, meta: &CommandMeta) -> Result<(), HookError> {
        for hook in &self.on_cmd_run {
            hook(meta)?;
        }
        Ok(())
    }

    /// Runs all post-run hooks, chaining transformations.
    pub fn run_post_run(&self, meta: &CommandMeta, value: Value) -> Result<Value, HookError> {
        let mut current = value;
        for hook in &self.post_run {
            current = hook(meta, current)?;
        }
        Ok(current)
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("on_cmd_run_count", &self.on_cmd_run.len())
            .field("post_run_count", &self.post_run.len())
            .finish()
    }
}

/// Converts a command path vector to a dot-separated string.
///
/// For example, `["db", "migrate"]` becomes `"db.migrate"`.
pub fn path_to_string(path: &[String]) -> String {
    path.join(".")
}
