//! # Roost - Declarative command-line applications
//!
//! Roost builds a command-line application from a tree of commands whose
//! parameters are declared as typed option descriptors. Argument parsing,
//! casting, validation, derived parameters and dispatch come from
//! [`roost_dispatch`], re-exported here; this crate adds the process entry
//! point and the help/error formatters.
//!
//! ## Quick Start
//!
//! ```rust
//! use roost::{ArgType, Cli, CliConfig, Command, CommandTree, FormatterChoice, Opt};
//!
//! let tree = CommandTree::builder()
//!     .description("A CLI tool")
//!     .option(Opt::switch(["-q", "--quiet"]).help("Do not output any message"))
//!     .command(
//!         Command::new("foo", |args| {
//!             let foo1: i64 = args.get("foo1")?;
//!             let foo2: String = args.get("foo2")?;
//!             Ok(format!("{} {}", foo1, foo2))
//!         })
//!         .help("Run foo command")
//!         .option(Opt::positional("foo1").ty(ArgType::Int).help("Foo argument"))
//!         .option(Opt::keyword(["-f", "--foo2"]).help("Foo2 argument")),
//!     )
//!     .build()?;
//!
//! let cli = Cli::builder(tree)
//!     .config(CliConfig::default().formatter(FormatterChoice::Plain).program_name("tool"))
//!     .build();
//!
//! assert_eq!(cli.execute_blocking(["foo", "1", "-f", "toto"]).stdout, "1 toto");
//!
//! let help = cli.execute_blocking(["foo", "--help"]);
//! assert!(help.stdout.starts_with("USAGE\n tool [-q] foo <foo1> [-f]"));
//! # Ok::<(), roost::DefinitionError>(())
//! ```
//!
//! In a binary, finish with `std::process::exit(cli.run())`.
//!
//! ## Formatters
//!
//! [`CliConfig::formatter`] selects between [`PlainFormatter`] and
//! [`StyledFormatter`]; `Auto` picks styled output when stdout is a
//! terminal. Any [`Formatter`] implementation can be passed to
//! [`CliBuilder::formatter`] instead.

mod cli;
mod config;
mod error;
mod formatter;

pub use cli::{Cli, CliBuilder, RunResult};
pub use config::{CliConfig, FormatterChoice, UnknownFormatter, FORMATTER_ENV};
pub use error::RenderError;
pub use formatter::{default_theme, Formatter, PlainFormatter, StyledFormatter, Theme};

pub use roost_dispatch::*;
