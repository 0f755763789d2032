//! Help data extraction from a command tree.

use roost_dispatch::{ArgType, Choices, CommandTree, Group, NodeRef, Opt};
use serde::Serialize;
use std::rc::Rc;

/// Fixed width for the name column in help output (commands, options).
pub(crate) const NAME_COLUMN_WIDTH: usize = 28;

/// Beyond this many choices the list moves below the help text.
const INLINE_CHOICES: usize = 3;

#[derive(Debug, Serialize)]
pub(crate) struct HelpData {
    pub usage: Vec<String>,
    pub arguments: Vec<OptionData>,
    pub options: Vec<OptionData>,
    pub global_options: Vec<OptionData>,
    pub commands: Vec<CommandData>,
    /// Description split into lines.
    pub description: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct OptionData {
    pub name: String,
    pub help: String,
    pub padding: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct CommandData {
    pub name: String,
    pub help: String,
    pub padding: String,
}

/// Collects what the help page for the node at `path` shows.
///
/// Returns `None` when `path` names nothing in the tree.
pub(crate) fn extract_help_data(
    tree: &CommandTree,
    path: &[String],
    program: &str,
    show_default: bool,
) -> Option<HelpData> {
    let node = tree.find(path)?;
    let groups = tree.groups_along(path);

    let data = match node {
        NodeRef::Command(command) => {
            let options = command.options();
            HelpData {
                usage: vec![usage_line(program, &groups, path, Some(options))],
                arguments: option_rows(options.iter().filter(|o| o.is_positional()), show_default),
                options: option_rows(options.iter().filter(|o| !o.is_positional()), show_default),
                global_options: global_rows(&groups, show_default),
                commands: Vec::new(),
                description: lines(command.description_text().or(command.help_text())),
            }
        }
        NodeRef::Group(group) => {
            let (local, inherited) = groups.split_last()?;
            HelpData {
                usage: vec![usage_line(program, &groups, path, None)],
                arguments: Vec::new(),
                options: option_rows(local.options().iter(), show_default),
                global_options: global_rows(inherited, show_default),
                commands: command_rows(group),
                description: lines(group.description_text().or(group.help_text())),
            }
        }
    };
    Some(data)
}

fn lines(text: Option<&str>) -> Vec<String> {
    text.map(|t| t.lines().map(String::from).collect())
        .unwrap_or_default()
}

/// The usage line for the node at `path`, if there is one.
pub(crate) fn usage_for(tree: &CommandTree, path: &[String], program: &str) -> Option<String> {
    let groups = tree.groups_along(path);
    match tree.find(path)? {
        NodeRef::Command(command) => {
            Some(usage_line(program, &groups, path, Some(command.options())))
        }
        NodeRef::Group(_) => Some(usage_line(program, &groups, path, None)),
    }
}

/// The usage line for a node. Each group's flags follow that group's token.
///
/// `command` carries the target's options; `None` renders `<command>`.
pub(crate) fn usage_line(
    program: &str,
    groups: &[&Group],
    path: &[String],
    command: Option<&[Rc<Opt>]>,
) -> String {
    let mut parts = vec![program.to_string()];
    for (index, group) in groups.iter().enumerate() {
        if index > 0 {
            if let Some(token) = path.get(index - 1) {
                parts.push(token.clone());
            }
        }
        parts.extend(group.options().iter().map(|opt| usage_token(opt)));
    }
    match command {
        Some(options) => {
            if let Some(token) = path.last() {
                parts.push(token.clone());
            }
            parts.extend(options.iter().map(|opt| usage_token(opt)));
        }
        None => parts.push("<command>".to_string()),
    }
    parts.join(" ")
}

/// `<name>` for positionals, `[-f]` for keyword options (shortest flag).
fn usage_token(opt: &Opt) -> String {
    if opt.is_positional() {
        return opt.display_name();
    }
    let flag = opt
        .flags()
        .iter()
        .min_by_key(|flag| flag.len())
        .map(String::as_str)
        .unwrap_or_default();
    format!("[{}]", flag)
}

fn option_rows<'a, I>(options: I, show_default: bool) -> Vec<OptionData>
where
    I: Iterator<Item = &'a Rc<Opt>>,
{
    options
        .map(|opt| {
            let name = option_label(opt);
            OptionData {
                padding: " ".repeat(NAME_COLUMN_WIDTH.saturating_sub(name.len())),
                help: option_help(opt, show_default),
                name,
            }
        })
        .collect()
}

/// Options of every enclosing group, innermost first.
fn global_rows(groups: &[&Group], show_default: bool) -> Vec<OptionData> {
    groups
        .iter()
        .rev()
        .flat_map(|group| option_rows(group.options().iter(), show_default))
        .collect()
}

fn command_rows(group: &Group) -> Vec<CommandData> {
    group
        .children()
        .map(|(token, node)| CommandData {
            name: token.to_string(),
            help: node.help_text().unwrap_or_default().to_string(),
            padding: " ".repeat(NAME_COLUMN_WIDTH.saturating_sub(token.len() + 1)),
        })
        .collect()
}

/// `-f (--foo2)*`: first flag, the others in parentheses, `*` when required.
pub(crate) fn option_label(opt: &Opt) -> String {
    if opt.is_positional() {
        return opt.display_name();
    }
    let required = if opt.is_required() { "*" } else { "" };
    match opt.flags().split_first() {
        Some((first, [])) => format!("{}{}", first, required),
        Some((first, others)) => format!("{} ({}){}", first, others.join(", "), required),
        None => opt.name().to_string(),
    }
}

/// Help text with the default or the allowed values appended.
pub(crate) fn option_help(opt: &Opt, show_default: bool) -> String {
    let help = opt.help_text().unwrap_or_default();
    let suffix = match opt.display_default() {
        Some(default) if show_default && !opt.is_required() => format!("(default: {})", default),
        _ => match listed_choices(opt) {
            Some(choices) if choices.len() <= INLINE_CHOICES => {
                format!("(choices are: {})", choices.join(", "))
            }
            Some(choices) => format!("\nPossible choices are:\n - {}", choices.join("\n - ")),
            None => return help.to_string(),
        },
    };
    if help.is_empty() {
        suffix.trim_start().to_string()
    } else {
        format!("{} {}", help, suffix)
    }
}

/// Allowed values known without running a producer.
fn listed_choices(opt: &Opt) -> Option<Vec<String>> {
    if opt.choices_hidden() {
        return None;
    }
    let item_type = match opt.arg_type() {
        ArgType::List(inner) => inner.as_ref(),
        other => other,
    };
    if let ArgType::Literal(values) = item_type {
        return Some(values.clone());
    }
    opt.choice_set()
        .and_then(Choices::static_choices)
        .map(|choices| choices.iter().map(|c| c.display()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use roost_dispatch::{Choice, Command};

    fn tree() -> CommandTree {
        CommandTree::builder()
            .description("A CLI tool")
            .option(Opt::switch(["-q", "--quiet"]).help("Do not output any message"))
            .option(Opt::switch(["--verbose"]).help("Increase verbosity"))
            .command(
                Command::new("foo", |_| Ok(()))
                    .help("Run foo command")
                    .option(Opt::positional("foo1").ty(ArgType::Int).help("Foo arguments"))
                    .option(Opt::keyword(["-f", "--foo2"]).help("Foo2 arguments"))
                    .option(
                        Opt::keyword(["-g", "--foo3"])
                            .default("a-value")
                            .help("Foo3 arguments"),
                    ),
            )
            .group("sub", |g| {
                g.help("A sub command")
                    .option(Opt::switch(["-t", "--test"]).help("Test mode"))
                    .command(Command::new("bar", |_| Ok(())).help("Run bar command"))
            })
            .build()
            .unwrap()
    }

    fn path(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_root_help() {
        let data = extract_help_data(&tree(), &[], "prog", false).unwrap();
        assert_eq!(data.usage, vec!["prog [-q] [--verbose] <command>"]);
        assert_eq!(data.options.len(), 2);
        assert!(data.global_options.is_empty());
        let names: Vec<&str> = data.commands.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["foo", "sub"]);
        assert_eq!(data.description, vec!["A CLI tool"]);
    }

    #[test]
    fn test_command_help() {
        let data = extract_help_data(&tree(), &path(&["foo"]), "prog", false).unwrap();
        assert_eq!(data.usage, vec!["prog [-q] [--verbose] foo <foo1> [-f] [-g]"]);
        assert_eq!(data.arguments[0].name, "<foo1>");
        assert_eq!(data.options[0].name, "-f (--foo2)*");
        assert_eq!(data.options[1].help, "Foo3 arguments");
        assert_eq!(data.global_options[0].name, "-q (--quiet)");
        assert_eq!(data.description, vec!["Run foo command"]);
    }

    #[test]
    fn test_nested_usage_places_group_flags() {
        let data = extract_help_data(&tree(), &path(&["sub", "bar"]), "prog", false).unwrap();
        assert_eq!(data.usage, vec!["prog [-q] [--verbose] sub [-t] bar"]);
        let globals: Vec<&str> = data.global_options.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(globals, vec!["-t (--test)", "-q (--quiet)", "--verbose"]);
    }

    #[test]
    fn test_usage_token_uses_shortest_flag() {
        assert_eq!(usage_token(&Opt::switch(["-a", "-bb"])), "[-a]");
        assert_eq!(usage_token(&Opt::keyword(["--output", "-o"])), "[-o]");
        assert_eq!(usage_token(&Opt::positional("target")), "<target>");
    }

    #[test]
    fn test_unknown_path() {
        assert!(extract_help_data(&tree(), &path(&["nope"]), "prog", false).is_none());
    }

    #[test]
    fn test_defaults_shown_on_request() {
        let opt = Opt::keyword(["-g", "--foo3"]).default("a-value").help("Foo3 arguments");
        assert_eq!(option_help(&opt, true), "Foo3 arguments (default: a-value)");
        assert_eq!(option_help(&opt, false), "Foo3 arguments");

        let password = Opt::keyword(["-p"])
            .ty(ArgType::Password)
            .default("hunter2")
            .help("Password");
        assert_eq!(option_help(&password, true), "Password (default: ******)");
    }

    #[test]
    fn test_choices_listing() {
        let few = Opt::keyword(["--env"])
            .choices(vec![Choice::from("prod"), Choice::regex(r"dev-\d+").unwrap()])
            .help("Target");
        assert_eq!(option_help(&few, false), "Target (choices are: prod, /dev-\\d+/)");

        let many = Opt::keyword(["--pick"]).choices(["foo", "bar", "baz", "others"]);
        assert_eq!(
            option_help(&many, false),
            "Possible choices are:\n - foo\n - bar\n - baz\n - others"
        );

        let literal = Opt::keyword(["--mode"]).ty(ArgType::literal(["fast", "slow"]));
        assert_eq!(option_help(&literal, false), "(choices are: fast, slow)");

        let hidden = Opt::keyword(["--pick"]).choices(["a"]).hide_choices().help("Pick");
        assert_eq!(option_help(&hidden, false), "Pick");
    }
}
