//! Runtime configuration for a [`Cli`](crate::Cli).

use std::str::FromStr;
use thiserror::Error;

/// Environment variable read by [`CliConfig::from_env`].
pub const FORMATTER_ENV: &str = "ROOST_FORMATTER";

/// Which formatter renders help and errors.
///
/// - `Auto` - Detect terminal capabilities (TTY → Styled, pipe → Plain)
/// - `Plain` - Never emit ANSI codes
/// - `Styled` - Always emit ANSI codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatterChoice {
    #[default]
    Auto,
    Plain,
    Styled,
}

impl FormatterChoice {
    /// Resolves `Auto` to `Styled` or `Plain` based on TTY detection.
    ///
    /// For other choices, returns self unchanged.
    pub fn resolve_auto(&self) -> FormatterChoice {
        match self {
            FormatterChoice::Auto => {
                if atty::is(atty::Stream::Stdout) {
                    FormatterChoice::Styled
                } else {
                    FormatterChoice::Plain
                }
            }
            other => *other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown formatter '{0}': expected plain, styled or auto")]
pub struct UnknownFormatter(pub String);

impl FromStr for FormatterChoice {
    type Err = UnknownFormatter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" | "" => Ok(FormatterChoice::Auto),
            "plain" | "raw" => Ok(FormatterChoice::Plain),
            "styled" | "rich" => Ok(FormatterChoice::Styled),
            _ => Err(UnknownFormatter(s.to_string())),
        }
    }
}

/// Settings shared by the formatters and the process entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    pub formatter: FormatterChoice,
    /// Append `(default: …)` to option help.
    pub show_default: bool,
    /// Name shown in usage lines; defaults to the basename of `argv[0]`.
    pub program_name: Option<String>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            formatter: FormatterChoice::Auto,
            show_default: true,
            program_name: None,
        }
    }
}

impl CliConfig {
    /// Default settings with the formatter taken from `ROOST_FORMATTER`.
    ///
    /// Unset or unrecognised values fall back to `Auto`.
    pub fn from_env() -> Self {
        let formatter = match std::env::var(FORMATTER_ENV) {
            Ok(raw) => raw.parse().unwrap_or_else(|err: UnknownFormatter| {
                tracing::warn!(error = %err, "ignoring {}", FORMATTER_ENV);
                FormatterChoice::Auto
            }),
            Err(_) => FormatterChoice::Auto,
        };
        Self {
            formatter,
            ..Self::default()
        }
    }

    pub fn formatter(mut self, formatter: FormatterChoice) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn show_default(mut self, yes: bool) -> Self {
        self.show_default = yes;
        self
    }

    pub fn program_name(mut self, name: impl Into<String>) -> Self {
        self.program_name = Some(name.into());
        self
    }
}
