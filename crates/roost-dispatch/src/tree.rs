//! The command tree.
//!
//! Groups are declared with a fluent builder and validated once, at
//! [`GroupBuilder::build`]. A built [`CommandTree`] is immutable.
//!
//! ```rust
//! use roost_dispatch::{Command, CommandTree, Opt};
//!
//! let tree = CommandTree::builder()
//!     .option(Opt::switch(["-q", "--quiet"]).help("Do not output any message"))
//!     .command(Command::new("foo", |_| Ok(())).help("Run foo command"))
//!     .group("sub", |g| g
//!         .help("A sub command")
//!         .command(Command::new("bar", |_| Ok(()))))
//!     .build()?;
//!
//! assert!(tree.find(["sub", "bar"]).is_some());
//! # Ok::<(), roost_dispatch::DefinitionError>(())
//! ```
//!
//! # Scopes
//!
//! Every group owns a set of local options (its own flags plus the leaves of
//! its options processor). A command's scope is its own options plus the
//! local options of every group between the root and the command.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::command::{clean_multiline, Command, Processor};
use crate::derived::Param;
use crate::error::DefinitionError;
use crate::hooks::{CommandMeta, HookError, Hooks};
use crate::option::Opt;
use crate::plan::Plan;
use crate::value::Value;

/// A child of a group.
#[derive(Debug, Clone)]
pub enum Node {
    Command(Command),
    Group(Group),
}

impl Node {
    pub fn help_text(&self) -> Option<&str> {
        match self {
            Node::Command(command) => command.help_text(),
            Node::Group(group) => group.help_text(),
        }
    }
}

/// A borrowed command or group, as returned by [`CommandTree::find`].
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Command(&'a Command),
    Group(&'a Group),
}

/// An interior node of the tree.
#[derive(Debug, Clone)]
pub struct Group {
    id: Option<String>,
    help: Option<String>,
    description: Option<String>,
    processor: Option<Processor>,
    propagate_options: bool,
    children: BTreeMap<String, Node>,
    main: Option<String>,
    hooks: Hooks,
    pub(crate) plan: Plan,
}

impl Group {
    /// The dispatch token; `None` for the root.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn help_text(&self) -> Option<&str> {
        self.help
            .as_deref()
            .or_else(|| self.description.as_deref().and_then(|d| d.lines().next()))
    }

    pub fn description_text(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Local options: declared flags plus the processor's leaves.
    pub fn options(&self) -> &[Rc<Opt>] {
        self.plan.leaves()
    }

    pub fn processor(&self) -> Option<&Processor> {
        self.processor.as_ref()
    }

    pub fn propagates_options(&self) -> bool {
        self.propagate_options
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    /// Children in token order.
    pub fn children(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.children.iter().map(|(id, node)| (id.as_str(), node))
    }

    pub fn child(&self, token: &str) -> Option<&Node> {
        self.children.get(token)
    }

    pub fn command(&self, token: &str) -> Option<&Command> {
        match self.children.get(token) {
            Some(Node::Command(command)) => Some(command),
            _ => None,
        }
    }

    pub fn group(&self, token: &str) -> Option<&Group> {
        match self.children.get(token) {
            Some(Node::Group(group)) => Some(group),
            _ => None,
        }
    }

    pub fn main_command(&self) -> Option<&Command> {
        self.main.as_deref().and_then(|id| self.command(id))
    }

    /// Dispatch tokens of the direct children.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    /// Finds a local option by one of its flags, accepting `--flag=value`.
    pub(crate) fn flag(&self, token: &str) -> Option<&Rc<Opt>> {
        let flag = token.split_once('=').map_or(token, |(flag, _)| flag);
        self.options()
            .iter()
            .find(|opt| opt.flags().iter().any(|f| f == flag))
    }

    pub(crate) fn run_on_cmd_run(&self, meta: &CommandMeta) -> Result<(), HookError> {
        self.hooks.run_on_cmd_run(meta)
    }

    pub(crate) fn run_post_run(
        &self,
        meta: &CommandMeta,
        value: Value,
    ) -> Result<Value, HookError> {
        self.hooks.run_post_run(meta, value)
    }
}

enum GroupEntry {
    Command(Command),
    Group(GroupBuilder),
}

/// Fluent builder for a group and, at the root, the whole tree.
#[derive(Default)]
pub struct GroupBuilder {
    help: Option<String>,
    description: Option<String>,
    options: Vec<Opt>,
    processor: Option<Processor>,
    propagate_options: bool,
    entries: Vec<(String, GroupEntry)>,
    hooks: Hooks,
}

impl GroupBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn description(mut self, text: impl AsRef<str>) -> Self {
        self.description = Some(clean_multiline(text.as_ref()));
        self
    }

    /// Declares a group-local option. Group options must carry flags.
    pub fn option(mut self, opt: Opt) -> Self {
        self.options.push(opt);
        self
    }

    /// Sets the options processor run before any command of this group.
    pub fn processor(mut self, processor: Processor) -> Self {
        self.processor = Some(processor);
        self
    }

    /// Passes this group's option values to its commands' bodies.
    pub fn propagate_options(mut self, yes: bool) -> Self {
        self.propagate_options = yes;
        self
    }

    pub fn command(mut self, command: Command) -> Self {
        self.entries
            .push((command.id().to_string(), GroupEntry::Command(command)));
        self
    }

    /// Adds a nested group configured by `configure`.
    pub fn group<F>(self, id: impl Into<String>, configure: F) -> Self
    where
        F: FnOnce(GroupBuilder) -> GroupBuilder,
    {
        self.add_group(id, configure(GroupBuilder::new()))
    }

    pub fn add_group(mut self, id: impl Into<String>, group: GroupBuilder) -> Self {
        self.entries.push((id.into(), GroupEntry::Group(group)));
        self
    }

    /// Hook run before every command under this group.
    pub fn on_cmd_run<F>(mut self, f: F) -> Self
    where
        F: Fn(&CommandMeta) -> Result<(), HookError> + 'static,
    {
        self.hooks = self.hooks.on_cmd_run(f);
        self
    }

    /// Hook run on the value of every command under this group.
    pub fn post_run<F>(mut self, f: F) -> Self
    where
        F: Fn(&CommandMeta, Value) -> Result<Value, HookError> + 'static,
    {
        self.hooks = self.hooks.post_run(f);
        self
    }

    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.hooks.extend(hooks);
        self
    }

    /// Validates every definition and builds the tree.
    pub fn build(self) -> Result<CommandTree, DefinitionError> {
        let root = self.compile(None, &[], &[])?;
        tracing::debug!(commands = root.children.len(), "command tree built");
        Ok(CommandTree { root })
    }

    /// `inherited` holds the leaves propagated by enclosing groups, with the
    /// group that declared each one.
    fn compile(
        self,
        id: Option<String>,
        path: &[String],
        inherited: &[(Rc<Opt>, String)],
    ) -> Result<Group, DefinitionError> {
        let scope = if path.is_empty() {
            "<root>".to_string()
        } else {
            path.join(" ")
        };

        let mut params: Vec<Param> = self
            .options
            .into_iter()
            .map(|opt| Param::Opt(Rc::new(opt)))
            .collect();
        if let Some(processor) = &self.processor {
            params.extend(processor.params().iter().cloned());
        }
        let plan = Plan::build(&scope, &params)?;
        if let Some(opt) = plan.positionals().next() {
            return Err(DefinitionError::PositionalGroupOption {
                name: opt.name().to_string(),
                group: scope,
            });
        }

        let mut propagated = inherited.to_vec();
        if self.propagate_options {
            let owner = format!("group '{}'", scope);
            for opt in plan.leaves() {
                check_propagated(&propagated, opt.name(), Some(opt), &owner, &scope)?;
                propagated.push((opt.clone(), owner.clone()));
            }
        }

        let mut children = BTreeMap::new();
        let mut main: Option<String> = None;
        for (token, entry) in self.entries {
            let mut child_path = path.to_vec();
            child_path.push(token.clone());
            if children.contains_key(&token) {
                return Err(DefinitionError::DuplicateCommand(child_path.join(" ")));
            }
            let node = match entry {
                GroupEntry::Command(mut command) => {
                    let command_scope = child_path.join(" ");
                    for param in command.params() {
                        let opt = match param {
                            Param::Opt(opt) => Some(opt),
                            Param::Derived { .. } => None,
                        };
                        check_propagated(
                            &propagated,
                            param.name(),
                            opt,
                            &command_scope,
                            &command_scope,
                        )?;
                    }
                    command.compile(&command_scope)?;
                    if command.is_main() {
                        if let Some(existing) = main.replace(token.clone()) {
                            return Err(DefinitionError::MultipleMain {
                                group: scope,
                                existing,
                            });
                        }
                    }
                    Node::Command(command)
                }
                GroupEntry::Group(builder) => {
                    Node::Group(builder.compile(Some(token.clone()), &child_path, &propagated)?)
                }
            };
            children.insert(token, node);
        }

        Ok(Group {
            id,
            help: self.help,
            description: self.description,
            processor: self.processor,
            propagate_options: self.propagate_options,
            children,
            main,
            hooks: self.hooks,
            plan,
        })
    }
}

/// Rejects `name` when a propagating group already passes a different
/// descriptor under it. The same shared descriptor is not a collision.
fn check_propagated(
    propagated: &[(Rc<Opt>, String)],
    name: &str,
    opt: Option<&Rc<Opt>>,
    owner: &str,
    scope: &str,
) -> Result<(), DefinitionError> {
    let clash = propagated.iter().find(|(existing, _)| {
        existing.name() == name && !opt.is_some_and(|opt| Rc::ptr_eq(existing, opt))
    });
    match clash {
        Some((_, first)) => Err(DefinitionError::NameCollision {
            name: name.to_string(),
            first: first.clone(),
            second: owner.to_string(),
            scope: scope.to_string(),
        }),
        None => Ok(()),
    }
}

/// A validated, immutable command tree.
#[derive(Debug, Clone)]
pub struct CommandTree {
    root: Group,
}

impl CommandTree {
    pub fn builder() -> GroupBuilder {
        GroupBuilder::new()
    }

    pub fn root(&self) -> &Group {
        &self.root
    }

    /// Looks up a node by its dispatch tokens. An empty path is the root.
    pub fn find<I, S>(&self, path: I) -> Option<NodeRef<'_>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut current = NodeRef::Group(&self.root);
        for token in path {
            current = match current {
                NodeRef::Group(group) => match group.child(token.as_ref())? {
                    Node::Command(command) => NodeRef::Command(command),
                    Node::Group(group) => NodeRef::Group(group),
                },
                NodeRef::Command(_) => return None,
            };
        }
        Some(current)
    }

    /// The groups traversed by `path`, root first. Stops at the first token
    /// that is not a group.
    pub fn groups_along<S: AsRef<str>>(&self, path: &[S]) -> Vec<&Group> {
        let mut groups = vec![&self.root];
        let mut current = &self.root;
        for token in path {
            match current.group(token.as_ref()) {
                Some(group) => {
                    groups.push(group);
                    current = group;
                }
                None => break,
            }
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(id: &str) -> Command {
        Command::new(id, |_| Ok(()))
    }

    #[test]
    fn test_builds_nested_groups() {
        let tree = CommandTree::builder()
            .command(noop("foo"))
            .group("sub", |g| g.command(noop("bar")).group("deep", |g| g.command(noop("baz"))))
            .build()
            .unwrap();

        assert!(matches!(tree.find(["foo"]), Some(NodeRef::Command(c)) if c.id() == "foo"));
        assert!(matches!(tree.find(["sub"]), Some(NodeRef::Group(g)) if g.id() == Some("sub")));
        assert!(tree.find(["sub", "deep", "baz"]).is_some());
        assert!(tree.find(["foo", "bar"]).is_none());
        assert!(matches!(tree.find(Vec::<String>::new()), Some(NodeRef::Group(_))));
    }

    #[test]
    fn test_duplicate_tokens_are_rejected() {
        let err = CommandTree::builder()
            .command(noop("foo"))
            .command(noop("foo"))
            .build()
            .unwrap_err();
        assert_eq!(err, DefinitionError::DuplicateCommand("foo".into()));

        let err = CommandTree::builder()
            .group("sub", |g| g.command(noop("bar")).command(noop("bar")))
            .build()
            .unwrap_err();
        assert_eq!(err, DefinitionError::DuplicateCommand("sub bar".into()));

        let err = CommandTree::builder()
            .command(noop("sub"))
            .group("sub", |g| g)
            .build()
            .unwrap_err();
        assert_eq!(err, DefinitionError::DuplicateCommand("sub".into()));
    }

    #[test]
    fn test_second_main_is_rejected() {
        let err = CommandTree::builder()
            .command(noop("run").main())
            .command(noop("other").main())
            .build()
            .unwrap_err();
        assert!(
            matches!(err, DefinitionError::MultipleMain { ref existing, .. } if existing == "run")
        );
    }

    #[test]
    fn test_main_command_is_also_a_child() {
        let tree = CommandTree::builder()
            .command(noop("run").main())
            .build()
            .unwrap();
        assert_eq!(tree.root().main_command().map(Command::id), Some("run"));
        assert!(tree.root().command("run").is_some());
    }

    #[test]
    fn test_group_options_include_processor_leaves() {
        let tree = CommandTree::builder()
            .option(Opt::switch(["-q", "--quiet"]))
            .processor(Processor::new(|_| Ok(())).option(Opt::switch(["--verbose"])))
            .command(noop("foo"))
            .build()
            .unwrap();
        let names: Vec<&str> = tree.root().options().iter().map(|o| o.name()).collect();
        assert_eq!(names, vec!["quiet", "verbose"]);
        assert!(tree.root().flag("--verbose").is_some());
        assert!(tree.root().flag("--quiet=true").is_some());
    }

    #[test]
    fn test_group_options_must_have_flags() {
        let err = CommandTree::builder()
            .option(Opt::positional("name"))
            .build()
            .unwrap_err();
        assert!(matches!(err, DefinitionError::PositionalGroupOption { .. }));
    }

    #[test]
    fn test_command_definition_errors_surface_at_build() {
        let err = CommandTree::builder()
            .command(
                noop("foo")
                    .option(Opt::keyword(["-f", "--foo"]))
                    .option(Opt::keyword(["-f", "--bar"])),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, DefinitionError::DuplicateFlag { ref scope, .. } if scope == "foo"));
    }

    #[test]
    fn test_groups_along_stops_at_commands() {
        let tree = CommandTree::builder()
            .group("sub", |g| g.command(noop("bar")))
            .build()
            .unwrap();
        assert_eq!(tree.groups_along(&["sub", "bar"]).len(), 2);
        assert_eq!(tree.groups_along::<&str>(&[]).len(), 1);
    }
}
