//! Declarative command trees, argument resolution and dispatch.
//!
//! `roost-dispatch` is the engine behind the `roost` CLI framework. It turns
//! a tree of commands, each declaring its parameters as option descriptors,
//! into a dispatcher that maps argv to exactly one command body with fully
//! typed keyword arguments. It does no terminal output of its own; help and
//! error rendering live in `roost`.
//!
//! # Features
//!
//! - **Option descriptors**: positional, keyword and switch parameters with
//!   types, defaults, choices (static, regex or produced lazily) and masking
//! - **Type casting**: ints, floats, bools, paths, dates, datetimes, UUIDs,
//!   JSON objects, lists and literals
//! - **Derived parameters**: values computed from other parameters, resolved
//!   as a DAG and evaluated once per dispatch
//! - **Command tree**: nested groups, main commands, options processors and
//!   option propagation
//! - **Hooks**: `on_cmd_run` and `post_run`, registered per group
//! - **Async**: sync and async bodies mix freely within one tree
//!
//! # Example
//!
//! ```rust
//! use roost_dispatch::{ArgType, Command, CommandTree, Opt, Outcome, Value};
//!
//! let tree = CommandTree::builder()
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
//! let outcome = tree.dispatch_blocking(["foo", "1", "-f", "toto"])?;
//! assert_eq!(outcome.value(), Some(&Value::from("1 toto")));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Error handling
//!
//! Definition problems surface from [`GroupBuilder::build`] as
//! [`DefinitionError`]. Everything that can go wrong during a dispatch is an
//! [`Error`]; see [`Error::exit_code`] for the process exit code each family
//! maps to.

mod bind;
mod body;
mod cast;
mod choices;
mod command;
mod derived;
mod dispatch;
mod error;
mod hooks;
mod option;
mod plan;
mod suggest;
mod tree;
mod value;

pub use body::{AsyncFn, Body, SyncFn};
pub use cast::{cast_value, convert, Bound};
pub use choices::{AsyncProducerFn, Choice, Choices, ProducerFn};
pub use command::{Command, Processor};
pub use derived::{Derived, DerivedBuilder, Param};
pub use dispatch::Outcome;
pub use error::{
    CastError, CastErrorKind, CommandError, DefinitionError, DispatchError, Error, ErrorKind,
};
pub use hooks::{
    path_to_string, CommandMeta, HookError, HookPhase, Hooks, OnCommandRunFn, PostRunFn,
};
pub use option::{name_from_flags, ArgType, DefaultValue, Masking, Opt};
pub use suggest::{did_you_mean, suggestions, Suggestion, MAX_SUGGESTION_DISTANCE};
pub use tree::{CommandTree, Group, GroupBuilder, Node, NodeRef};
pub use value::{Args, FromValue, Value, ValueError};
