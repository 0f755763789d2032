//! Dispatching argv against a [`CommandTree`].
//!
//! ```text
//! argv
//!   → path matching     (group tokens, group flags set aside, command token or main fallback)
//!   → help check        (-h/--help not claimed by any descriptor → Outcome::Help)
//!   → binding           (tokens split across every level in scope)
//!   → processor phase   (root → leaf: cast group options, run processors)
//!   → command phase     (cast command options, resolve derived parameters)
//!   → on_cmd_run hooks  (root → leaf)
//!   → body
//!   → post_run hooks    (root → leaf)
//! ```
//!
//! `argv` never includes the program name.

use std::iter;
use std::rc::Rc;

use crate::bind::{bind, looks_like_flag, split_inline};
use crate::command::Command;
use crate::error::{DispatchError, Error};
use crate::hooks::CommandMeta;
use crate::option::Opt;
use crate::plan::Invocation;
use crate::suggest::did_you_mean;
use crate::tree::{CommandTree, Group};
use crate::value::{Args, Value};

const HELP_FLAGS: [&str; 2] = ["-h", "--help"];

/// What a successful dispatch produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The command ran and returned `value`.
    Completed { path: Vec<String>, value: Value },
    /// Help was requested for the node at `path`; nothing ran.
    Help { path: Vec<String> },
}

impl Outcome {
    pub fn path(&self) -> &[String] {
        match self {
            Outcome::Completed { path, .. } | Outcome::Help { path } => path,
        }
    }

    /// The command's return value, if it ran.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Outcome::Completed { value, .. } => Some(value),
            Outcome::Help { .. } => None,
        }
    }
}

/// A command selected by path matching.
struct Target<'t> {
    /// Groups whose options are in scope, root first.
    groups: Vec<&'t Group>,
    command: &'t Command,
    path: Vec<String>,
    /// Tokens left for the binder.
    tail: Vec<String>,
}

/// Where path matching stopped.
struct Walk<'t> {
    groups: Vec<&'t Group>,
    group_tokens: Vec<String>,
    /// Group flags (and their values) met between group tokens.
    early: Vec<String>,
    remaining: Vec<String>,
}

impl CommandTree {
    /// Dispatches `argv` and returns what happened.
    pub async fn dispatch<I, S>(&self, argv: I) -> Result<Outcome, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = argv.into_iter().map(Into::into).collect();
        tracing::debug!(?tokens, "dispatching");

        let walk = self.walk(tokens);
        let target = match self.select(&walk) {
            Ok(target) => target,
            Err(err) => {
                let scope: Vec<&[Rc<Opt>]> = walk.groups.iter().map(|g| g.options()).collect();
                let rest: Vec<String> = walk.early.iter().chain(&walk.remaining).cloned().collect();
                if wants_help(&scope, &rest) {
                    return Ok(Outcome::Help {
                        path: walk.group_tokens,
                    });
                }
                tracing::debug!(error = %err, "no command matched");
                return Err(err.into());
            }
        };

        let levels: Vec<&[Rc<Opt>]> = target
            .groups
            .iter()
            .map(|g| g.options())
            .chain(iter::once(target.command.options()))
            .collect();
        if wants_help(&levels, &target.tail) {
            return Ok(Outcome::Help { path: target.path });
        }

        self.run(target, &levels).await
    }

    /// Dispatches on the current thread, driving async bodies to completion.
    pub fn dispatch_blocking<I, S>(&self, argv: I) -> Result<Outcome, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        futures::executor::block_on(self.dispatch(argv))
    }

    /// Consumes leading group tokens, setting aside the group flags met on
    /// the way.
    fn walk(&self, tokens: Vec<String>) -> Walk<'_> {
        let mut groups = vec![self.root()];
        let mut current = self.root();
        let mut group_tokens = Vec::new();
        let mut early = Vec::new();
        let mut i = 0;

        while i < tokens.len() {
            let token = &tokens[i];
            if let Some(group) = current.group(token) {
                groups.push(group);
                current = group;
                group_tokens.push(token.clone());
                i += 1;
                continue;
            }
            let Some(opt) = groups.iter().rev().find_map(|g| g.flag(token)) else {
                break;
            };
            let width = if opt.arg_type().is_bool() || split_inline(token).1.is_some() {
                1
            } else if opt.arg_type().is_list() {
                break;
            } else {
                2
            };
            if i + width > tokens.len() {
                break;
            }
            early.extend(tokens[i..i + width].iter().cloned());
            i += width;
        }

        Walk {
            groups,
            group_tokens,
            early,
            remaining: tokens[i..].to_vec(),
        }
    }

    fn select<'t>(&'t self, walk: &Walk<'t>) -> Result<Target<'t>, DispatchError> {
        let landed = walk.groups[walk.groups.len() - 1];

        if let Some(first) = walk.remaining.first() {
            if let Some(command) = landed.command(first) {
                let mut path = walk.group_tokens.clone();
                path.push(first.clone());
                return Ok(Target {
                    groups: walk.groups.clone(),
                    command,
                    path,
                    tail: walk.early.iter().chain(&walk.remaining[1..]).cloned().collect(),
                });
            }
        }

        for depth in (0..walk.groups.len()).rev() {
            let group = walk.groups[depth];
            let Some(main) = group.main_command() else {
                continue;
            };
            let restored: Vec<String> = walk.group_tokens[depth..]
                .iter()
                .chain(&walk.remaining)
                .cloned()
                .collect();
            let mut path = walk.group_tokens[..depth].to_vec();
            if let Some(bare) = restored.first().filter(|t| !looks_like_flag(t)) {
                if main.plan.positionals().next().is_none() {
                    return Err(DispatchError::AmbiguousMain {
                        token: bare.clone(),
                        path,
                        main: main.id().to_string(),
                        suggestions: did_you_mean(bare, group.tokens()),
                    });
                }
            }
            path.push(main.id().to_string());
            tracing::debug!(main = main.id(), "falling back to main command");
            return Ok(Target {
                groups: walk.groups[..=depth].to_vec(),
                command: main,
                path,
                tail: walk.early.iter().chain(&restored).cloned().collect(),
            });
        }

        let token = walk
            .remaining
            .first()
            .filter(|t| !looks_like_flag(t))
            .cloned();
        let suggestions = token
            .as_deref()
            .map(|t| did_you_mean(t, landed.tokens()))
            .unwrap_or_default();
        Err(DispatchError::CommandNotFound {
            token,
            path: walk.group_tokens.clone(),
            available: landed.tokens().map(String::from).collect(),
            suggestions,
        })
    }

    async fn run(&self, target: Target<'_>, levels: &[&[Rc<Opt>]]) -> Result<Outcome, Error> {
        let path = target.path;
        let bound = bind(levels, &target.tail).map_err(|e| e.with_path(&path))?;
        let with_path = |err: Error| match err {
            Error::Cast(cast) => Error::Cast(cast.with_path(&path)),
            other => other,
        };

        let mut invocation = Invocation::new();
        let mut scope_leaves = Args::new();
        let mut propagated = Args::new();

        for (level, group) in target.groups.iter().enumerate() {
            let resolved = invocation
                .resolve(&group.plan, &bound[level])
                .await
                .map_err(with_path)?;
            if let Some(processor) = group.processor() {
                let name = group.id().unwrap_or("<root>");
                tracing::debug!(group = name, "running options processor");
                let args = invocation.bind(processor.params(), &resolved.leaves);
                processor
                    .body()
                    .call(args)
                    .await
                    .map_err(|e| with_path(Error::from_body(e)))?;
            }
            for (name, value) in resolved.leaves.iter() {
                scope_leaves.insert(name, value.clone());
                if group.propagates_options() {
                    propagated.insert(name, value.clone());
                }
            }
        }

        let command = target.command;
        let resolved = invocation
            .resolve(&command.plan, &bound[levels.len() - 1])
            .await
            .map_err(with_path)?;

        let mut args = resolved.args;
        args.merge_under(&propagated);
        let mut leaves = resolved.leaves;
        leaves.merge_under(&scope_leaves);

        let meta = CommandMeta { path, args, leaves };
        for group in &target.groups {
            group.run_on_cmd_run(&meta)?;
        }

        tracing::debug!(command = %meta.command_name(), "invoking command");
        let mut value = command
            .body()
            .call(meta.args.clone())
            .await
            .map_err(Error::from_body)?;

        for group in &target.groups {
            value = group.run_post_run(&meta, value)?;
        }
        Ok(Outcome::Completed {
            path: meta.path,
            value,
        })
    }
}

/// True when `-h`/`--help` appears before `--` and no descriptor in scope
/// claims it.
fn wants_help(levels: &[&[Rc<Opt>]], tokens: &[String]) -> bool {
    let claimed = |flag: &str| {
        levels
            .iter()
            .flat_map(|opts| opts.iter())
            .any(|opt| opt.flags().iter().any(|f| f == flag))
    };
    tokens
        .iter()
        .take_while(|t| t.as_str() != "--")
        .any(|t| HELP_FLAGS.contains(&t.as_str()) && !claimed(t))
}
