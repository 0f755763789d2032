//! Help and error rendering.
//!
//! A [`Formatter`] turns a help request or a dispatch failure into the text
//! shown to the user. Two implementations ship with the crate:
//!
//! | Formatter | Output |
//! |-----------|--------|
//! | [`PlainFormatter`] | plain text, safe for pipes and logs |
//! | [`StyledFormatter`] | ANSI-styled text, themed through [`Theme`] |
//!
//! Both render help pages from a minijinja template with `USAGE`,
//! `ARGUMENTS`, `OPTIONS`, `GLOBAL OPTIONS`, `AVAILABLE COMMANDS` and
//! `DESCRIPTION` sections. Errors a user can fix (bad arguments, unknown
//! commands) are followed by a suggestion and the usage line; a
//! [`CommandError`](roost_dispatch::CommandError) prints its message alone.

mod data;
mod render;

use roost_dispatch::{CommandTree, Error};

use crate::config::CliConfig;
use crate::error::RenderError;
use render::Renderer;

pub use render::{default_theme, Theme};

/// Renders help pages and errors for a command tree.
pub trait Formatter {
    /// The help page of the node at `path` (empty for the root).
    fn render_help(
        &self,
        tree: &CommandTree,
        path: &[String],
        config: &CliConfig,
    ) -> Result<String, RenderError>;

    /// The report printed for a failed dispatch.
    fn render_error(&self, tree: &CommandTree, error: &Error, config: &CliConfig) -> String;
}

/// Plain-text formatter.
#[derive(Debug, Clone)]
pub struct PlainFormatter {
    renderer: Renderer,
}

impl PlainFormatter {
    pub fn new() -> Self {
        Self {
            renderer: Renderer {
                theme: Theme::new(),
                use_color: false,
                template: None,
            },
        }
    }

    /// Replaces the built-in help template.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.renderer.template = Some(template.into());
        self
    }
}

impl Default for PlainFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter for PlainFormatter {
    fn render_help(
        &self,
        tree: &CommandTree,
        path: &[String],
        config: &CliConfig,
    ) -> Result<String, RenderError> {
        self.renderer.help(tree, path, config)
    }

    fn render_error(&self, tree: &CommandTree, error: &Error, config: &CliConfig) -> String {
        self.renderer.error(tree, error, config)
    }
}

/// ANSI-styled formatter.
#[derive(Debug, Clone)]
pub struct StyledFormatter {
    renderer: Renderer,
}

impl StyledFormatter {
    pub fn new() -> Self {
        Self::with_theme(default_theme())
    }

    pub fn with_theme(theme: Theme) -> Self {
        Self {
            renderer: Renderer {
                theme,
                use_color: true,
                template: None,
            },
        }
    }

    /// Replaces the built-in help template.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.renderer.template = Some(template.into());
        self
    }
}

impl Default for StyledFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter for StyledFormatter {
    fn render_help(
        &self,
        tree: &CommandTree,
        path: &[String],
        config: &CliConfig,
    ) -> Result<String, RenderError> {
        self.renderer.help(tree, path, config)
    }

    fn render_error(&self, tree: &CommandTree, error: &Error, config: &CliConfig) -> String {
        self.renderer.error(tree, error, config)
    }
}
