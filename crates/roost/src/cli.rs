//! The process entry point.
//!
//! [`Cli`] owns a built [`CommandTree`], a [`CliConfig`] and a
//! [`Formatter`], and maps every dispatch outcome to output and an exit code:
//!
//! | Outcome | Stream | Exit code |
//! |---------|--------|-----------|
//! | command returned a value | stdout (nothing for `None`) | 0 |
//! | help requested | stdout | 0 |
//! | `CommandError` | stderr, message only | 1 |
//! | hook or unhandled error | stderr, full error chain | 1 |
//! | bad arguments, unknown command | stderr, with suggestion and usage | 2 |

use std::ffi::OsString;
use std::io::Write;
use std::path::Path;

use roost_dispatch::{CastError, CastErrorKind, CommandTree, Error, Outcome};

use crate::config::{CliConfig, FormatterChoice};
use crate::formatter::{Formatter, PlainFormatter, StyledFormatter};

/// What one invocation printed and how it ended.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl RunResult {
    fn stdout(text: String) -> Self {
        Self {
            exit_code: 0,
            stdout: text,
            stderr: String::new(),
        }
    }

    fn failure(exit_code: i32, text: String) -> Self {
        Self {
            exit_code,
            stdout: String::new(),
            stderr: text,
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// A runnable command-line application.
///
/// ```rust
/// use roost::{Cli, CliConfig, Command, CommandTree, FormatterChoice, Opt};
///
/// let tree = CommandTree::builder()
///     .command(
///         Command::new("greet", |args| Ok(format!("hello {}", args.get::<String>("name")?)))
///             .option(Opt::positional("name")),
///     )
///     .build()?;
///
/// let cli = Cli::builder(tree)
///     .config(CliConfig::default().formatter(FormatterChoice::Plain))
///     .build();
///
/// let result = cli.execute_blocking(["greet", "world"]);
/// assert_eq!(result.exit_code, 0);
/// assert_eq!(result.stdout, "hello world");
/// # Ok::<(), roost::DefinitionError>(())
/// ```
pub struct Cli {
    tree: CommandTree,
    config: CliConfig,
    formatter: Box<dyn Formatter>,
}

impl Cli {
    /// A CLI with the default configuration.
    pub fn new(tree: CommandTree) -> Self {
        Self::builder(tree).build()
    }

    pub fn builder(tree: CommandTree) -> CliBuilder {
        CliBuilder {
            tree,
            config: CliConfig::default(),
            formatter: None,
        }
    }

    pub fn tree(&self) -> &CommandTree {
        &self.tree
    }

    pub fn config(&self) -> &CliConfig {
        &self.config
    }

    /// Dispatches `argv` (without the program name) and renders the outcome.
    pub async fn execute<I, S>(&self, argv: I) -> RunResult
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match self.tree.dispatch(argv).await {
            Ok(Outcome::Completed { value, .. }) if value.is_null() => RunResult::default(),
            Ok(Outcome::Completed { value, .. }) => RunResult::stdout(value.to_string()),
            Ok(Outcome::Help { path }) => {
                match self.formatter.render_help(&self.tree, &path, &self.config) {
                    Ok(help) => RunResult::stdout(help),
                    Err(err) => RunResult::failure(1, err.to_string()),
                }
            }
            Err(err) => {
                tracing::debug!(kind = ?err.kind(), "dispatch failed");
                let report = self.formatter.render_error(&self.tree, &err, &self.config);
                RunResult::failure(err.exit_code(), report)
            }
        }
    }

    /// Like [`execute`](Self::execute), on the current thread.
    pub fn execute_blocking<I, S>(&self, argv: I) -> RunResult
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        futures::executor::block_on(self.execute(argv))
    }

    /// Runs with the process arguments, prints the result and returns the
    /// exit code.
    ///
    /// The program name defaults to the basename of `argv[0]`.
    pub fn run(mut self) -> i32 {
        let mut args = std::env::args_os();
        let argv0 = args.next();
        if self.config.program_name.is_none() {
            self.config.program_name = argv0.as_deref().and_then(|p| basename(Path::new(p)));
        }

        let result = match utf8_args(args) {
            Ok(argv) => self.execute_blocking(argv),
            Err(err) => {
                let report = self.formatter.render_error(&self.tree, &err, &self.config);
                RunResult::failure(err.exit_code(), report)
            }
        };
        if !result.stdout.is_empty() {
            let mut out = std::io::stdout().lock();
            // Broken pipes are ignored.
            let _ = writeln!(out, "{}", result.stdout);
        }
        if !result.stderr.is_empty() {
            let _ = writeln!(std::io::stderr().lock(), "{}", result.stderr);
        }
        result.exit_code
    }
}

/// Rejects the first argument that is not valid UTF-8.
fn utf8_args<I>(args: I) -> Result<Vec<String>, Error>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            arg.into_string().map_err(|raw| {
                let token = raw.to_string_lossy().to_string();
                Error::Cast(CastError::new(
                    CastErrorKind::InvalidFormat,
                    token.clone(),
                    format!("Argument \"{}\" is not valid UTF-8", token),
                ))
            })
        })
        .collect()
}

fn basename(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
}

/// Builder for [`Cli`].
pub struct CliBuilder {
    tree: CommandTree,
    config: CliConfig,
    formatter: Option<Box<dyn Formatter>>,
}

impl CliBuilder {
    pub fn config(mut self, config: CliConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides the formatter chosen by [`CliConfig::formatter`].
    pub fn formatter(mut self, formatter: impl Formatter + 'static) -> Self {
        self.formatter = Some(Box::new(formatter));
        self
    }

    pub fn build(self) -> Cli {
        let choice = self.config.formatter.resolve_auto();
        let formatter: Box<dyn Formatter> = match (self.formatter, choice) {
            (Some(formatter), _) => formatter,
            (None, FormatterChoice::Styled) => Box::new(StyledFormatter::new()),
            (None, _) => Box::new(PlainFormatter::new()),
        };
        Cli {
            tree: self.tree,
            config: self.config,
            formatter,
        }
    }
}
