//! Error taxonomy.
//!
//! | Family | Raised | Exit code |
//! |--------|--------|-----------|
//! | [`DefinitionError`] | while building the tree | fatal, never dispatched |
//! | [`CastError`] | binding or casting an argument | 2 |
//! | [`DispatchError`] | matching the command path | 2 |
//! | [`CommandError`] | explicitly by a command body | 1, message only |
//! | [`HookError`] | by an `on_cmd_run` hook | 1 |
//! | [`Error::Failed`] | any other body/producer error | 1, full diagnostic |

use std::fmt;
use thiserror::Error;

use crate::hooks::HookError;

/// Registration-time errors. The tree is never built when one occurs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("duplicated command found for '{0}'")]
    DuplicateCommand(String),

    #[error("duplicate keyword args found \"{flag}\" in '{scope}'")]
    DuplicateFlag { flag: String, scope: String },

    #[error(
        "parameter name '{name}' is declared by both {first} and {second} in '{scope}'; \
         rename one of them with arg_name"
    )]
    NameCollision {
        name: String,
        first: String,
        second: String,
        scope: String,
    },

    #[error("derived parameter '{0}' depends on itself")]
    CyclicDerived(String),

    #[error("group '{group}' already has main command '{existing}'")]
    MultipleMain { group: String, existing: String },

    #[error("invalid flag \"{flag}\": flags start with '-' and carry a name")]
    InvalidFlag { flag: String },

    #[error(
        "required positional '{required}' is declared after optional positional \
         '{optional}' in '{scope}'"
    )]
    PositionalOrder {
        required: String,
        optional: String,
        scope: String,
    },

    #[error("list positional '{name}' must be the last positional in '{scope}'")]
    ListPositionalNotLast { name: String, scope: String },

    #[error("option '{0}' cannot combine a literal type with choices")]
    ChoicesWithLiteral(String),

    #[error("group option '{name}' in '{group}' must declare at least one flag")]
    PositionalGroupOption { name: String, group: String },
}

/// The specific reason a token could not be bound or cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastErrorKind {
    /// A required descriptor received no token.
    MissingRequired,
    /// A value-taking flag was the last token.
    MissingValue,
    /// The token does not parse as the descriptor type.
    InvalidType,
    /// The token is not in the expected textual format (dates, uuids, JSON).
    InvalidFormat,
    /// The value is not among the allowed choices.
    InvalidChoice,
    /// A `Path` descriptor points at nothing.
    PathNotFound,
    /// A flag no descriptor in scope declares.
    UnknownOption,
    /// More positional tokens than positional descriptors.
    UnexpectedArgument,
}

impl fmt::Display for CastErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CastErrorKind::MissingRequired => "missing required argument",
            CastErrorKind::MissingValue => "missing value",
            CastErrorKind::InvalidType => "invalid type",
            CastErrorKind::InvalidFormat => "invalid format",
            CastErrorKind::InvalidChoice => "invalid choice",
            CastErrorKind::PathNotFound => "path not found",
            CastErrorKind::UnknownOption => "unknown option",
            CastErrorKind::UnexpectedArgument => "unexpected argument",
        };
        f.write_str(label)
    }
}

/// A per-invocation argument resolution failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CastError {
    pub kind: CastErrorKind,
    /// The offending flag (`--foo2`) or positional (`<foo1>`).
    pub option: String,
    pub message: String,
    /// Allowed values, for `InvalidChoice`.
    pub allowed: Vec<String>,
    /// Closest matches to what was typed.
    pub suggestions: Vec<String>,
    /// Command path being resolved, filled in by the dispatcher.
    pub path: Vec<String>,
}

impl CastError {
    pub fn new(kind: CastErrorKind, option: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            option: option.into(),
            message: message.into(),
            allowed: Vec::new(),
            suggestions: Vec::new(),
            path: Vec::new(),
        }
    }

    pub fn missing_required(option: impl Into<String>) -> Self {
        let option = option.into();
        let message = format!("Missing value for required parameter '{}'", option);
        Self::new(CastErrorKind::MissingRequired, option, message)
    }

    pub fn missing_value(option: impl Into<String>) -> Self {
        let option = option.into();
        let message = format!("Expected a value for '{}'", option);
        Self::new(CastErrorKind::MissingValue, option, message)
    }

    pub fn invalid_type(option: impl Into<String>, token: &str, expected: &str) -> Self {
        let option = option.into();
        let message = format!(
            "Invalid value '{}' for '{}': expected {}",
            token, option, expected
        );
        Self::new(CastErrorKind::InvalidType, option, message)
    }

    pub fn invalid_format(
        option: impl Into<String>,
        token: &str,
        reason: impl fmt::Display,
    ) -> Self {
        let option = option.into();
        let message = format!("Invalid format '{}' for '{}': {}", token, option, reason);
        Self::new(CastErrorKind::InvalidFormat, option, message)
    }

    pub fn path_not_found(option: impl Into<String>, token: &str) -> Self {
        Self::new(
            CastErrorKind::PathNotFound,
            option,
            format!("File not found: \"{}\"", token),
        )
    }

    pub fn invalid_choice(option: impl Into<String>, token: &str, allowed: Vec<String>) -> Self {
        let option = option.into();
        let message = format!(
            "\"{}\" is not a valid value for '{}'. Possible values are: {}",
            token,
            option,
            allowed.join(", ")
        );
        Self {
            allowed,
            ..Self::new(CastErrorKind::InvalidChoice, option, message)
        }
    }

    pub fn unknown_option(flag: impl Into<String>) -> Self {
        let flag = flag.into();
        let message = format!("Could not find parameter '{}'", flag);
        Self::new(CastErrorKind::UnknownOption, flag, message)
    }

    pub fn unexpected_argument(token: impl Into<String>, expected: usize) -> Self {
        let token = token.into();
        let message = format!(
            "Unexpected argument '{}': expected {} positional value{}",
            token,
            expected,
            if expected == 1 { "" } else { "s" }
        );
        Self::new(CastErrorKind::UnexpectedArgument, token, message)
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }

    pub fn with_path(mut self, path: &[String]) -> Self {
        self.path = path.to_vec();
        self
    }
}

/// Failure to resolve argv to a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("{}", describe_not_found(.token.as_deref()))]
    CommandNotFound {
        /// The token that failed to match, `None` when argv ran out.
        token: Option<String>,
        /// Group path where matching stopped.
        path: Vec<String>,
        /// Dispatch tokens available at that point.
        available: Vec<String>,
        suggestions: Vec<String>,
    },

    #[error("'{token}' is neither a command nor an argument of the main command '{main}'")]
    AmbiguousMain {
        token: String,
        path: Vec<String>,
        main: String,
        suggestions: Vec<String>,
    },
}

fn describe_not_found(token: Option<&str>) -> String {
    match token {
        Some(token) => format!("Unknown command \"{}\"", token),
        None => "No command given".to_string(),
    }
}

impl DispatchError {
    pub fn suggestions(&self) -> &[String] {
        match self {
            DispatchError::CommandNotFound { suggestions, .. }
            | DispatchError::AmbiguousMain { suggestions, .. } => suggestions,
        }
    }

    pub fn path(&self) -> &[String] {
        match self {
            DispatchError::CommandNotFound { path, .. }
            | DispatchError::AmbiguousMain { path, .. } => path,
        }
    }
}

/// A user-facing failure raised from a command body.
///
/// Only the message is shown; no diagnostic detail is attached.
///
/// ```rust
/// use roost_dispatch::CommandError;
///
/// fn deploy(env: &str) -> anyhow::Result<()> {
///     if env != "prod" {
///         return Err(CommandError::new("bad env").into());
///     }
///     Ok(())
/// }
/// assert!(deploy("dev").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CommandError {
    pub message: String,
}

impl CommandError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Coarse classification of [`Error`], for formatters and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Resolution,
    Dispatch,
    Command,
    Hook,
    Unhandled,
}

/// Everything a dispatch can fail with.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Cast(#[from] CastError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Hook(#[from] HookError),

    #[error("{0:#}")]
    Failed(anyhow::Error),
}

impl Error {
    /// Classifies an error returned by a body, processor or producer.
    ///
    /// `CommandError` and `CastError` raised inside user code keep their
    /// meaning; anything else is unhandled.
    pub fn from_body(err: anyhow::Error) -> Self {
        let err = match err.downcast::<CommandError>() {
            Ok(command) => return Error::Command(command),
            Err(err) => err,
        };
        match err.downcast::<CastError>() {
            Ok(cast) => Error::Cast(cast),
            Err(err) => Error::Failed(err),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Cast(_) => ErrorKind::Resolution,
            Error::Dispatch(_) => ErrorKind::Dispatch,
            Error::Command(_) => ErrorKind::Command,
            Error::Hook(_) => ErrorKind::Hook,
            Error::Failed(_) => ErrorKind::Unhandled,
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::Resolution | ErrorKind::Dispatch => 2,
            ErrorKind::Command | ErrorKind::Hook | ErrorKind::Unhandled => 1,
        }
    }

    /// Whether the formatter should print usage alongside the message.
    pub fn wants_usage(&self) -> bool {
        matches!(self.kind(), ErrorKind::Resolution | ErrorKind::Dispatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_error_survives_anyhow_round_trip() {
        let err: anyhow::Error = CommandError::new("bad env").into();
        let err = Error::from_body(err);

        assert!(matches!(err, Error::Command(ref c) if c.message == "bad env"));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.to_string(), "bad env");
    }

    #[test]
    fn test_other_errors_are_unhandled() {
        let err = Error::from_body(anyhow::anyhow!("disk on fire").context("writing report"));

        assert_eq!(err.kind(), ErrorKind::Unhandled);
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.to_string(), "writing report: disk on fire");
    }

    #[test]
    fn test_resolution_errors_exit_with_usage() {
        let err: Error = CastError::missing_required("<foo1>").into();
        assert_eq!(err.exit_code(), 2);
        assert!(err.wants_usage());

        let err: Error = DispatchError::CommandNotFound {
            token: Some("fo".into()),
            path: vec![],
            available: vec!["foo".into()],
            suggestions: vec!["foo".into()],
        }
        .into();
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.to_string(), "Unknown command \"fo\"");
    }

    #[test]
    fn test_invalid_choice_lists_allowed_values() {
        let err = CastError::invalid_choice("--env", "qa", vec!["prod".into(), "staging".into()]);
        assert_eq!(err.kind, CastErrorKind::InvalidChoice);
        assert_eq!(
            err.to_string(),
            "\"qa\" is not a valid value for '--env'. Possible values are: prod, staging"
        );
    }

    #[test]
    fn test_definition_error_display() {
        let err = DefinitionError::DuplicateCommand("foo".into());
        assert_eq!(err.to_string(), "duplicated command found for 'foo'");
    }
}
