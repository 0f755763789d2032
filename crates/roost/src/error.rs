//! Errors raised by the facade itself.

use thiserror::Error;

/// Failure to render a help page.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("no command or group at '{0}'")]
    UnknownPath(String),
}
