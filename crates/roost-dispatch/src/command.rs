//! Commands and options processors.

use std::future::Future;
use std::rc::Rc;

use crate::body::Body;
use crate::derived::{Derived, Param};
use crate::error::DefinitionError;
use crate::option::Opt;
use crate::plan::Plan;
use crate::value::{Args, Value};

/// A leaf of the command tree: a dispatch token bound to a body.
///
/// ```rust
/// use roost_dispatch::{ArgType, Command, Opt};
///
/// let foo = Command::new("foo", |args| {
///     let foo1: i64 = args.get("foo1")?;
///     let foo2: String = args.get("foo2")?;
///     Ok(format!("{} {}", foo1, foo2))
/// })
/// .help("Run foo command")
/// .option(Opt::positional("foo1").ty(ArgType::Int).help("Foo argument"))
/// .option(Opt::keyword(["-f", "--foo2"]).help("Foo2 argument"));
/// assert_eq!(foo.id(), "foo");
/// ```
#[derive(Debug, Clone)]
pub struct Command {
    id: String,
    help: Option<String>,
    description: Option<String>,
    params: Vec<Param>,
    body: Body,
    main: bool,
    pub(crate) plan: Plan,
}

impl Command {
    /// A command with a synchronous body.
    pub fn new<F, R>(id: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Args) -> anyhow::Result<R> + 'static,
        R: Into<Value>,
    {
        Self::with_body(id.into(), Body::sync(f))
    }

    /// A command with an asynchronous body.
    pub fn new_async<F, Fut, R>(id: impl Into<String>, f: F) -> Self
    where
        F: Fn(Args) -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<R>> + 'static,
        R: Into<Value>,
    {
        Self::with_body(id.into(), Body::from_async(f))
    }

    fn with_body(id: String, body: Body) -> Self {
        Self {
            id,
            help: None,
            description: None,
            params: Vec::new(),
            body,
            main: false,
            plan: Plan::default(),
        }
    }

    /// One-line summary shown in command listings.
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Longer text shown on the command's own help page. Leading
    /// indentation is removed; the first line doubles as the summary when no
    /// help is set.
    pub fn description(mut self, text: impl AsRef<str>) -> Self {
        self.description = Some(clean_multiline(text.as_ref()));
        self
    }

    pub fn option(mut self, opt: Opt) -> Self {
        self.params.push(Param::Opt(Rc::new(opt)));
        self
    }

    /// Adds a descriptor shared with derived nodes or other commands.
    pub fn shared_option(mut self, opt: Rc<Opt>) -> Self {
        self.params.push(Param::Opt(opt));
        self
    }

    /// Passes the value of `node` to the body under `name`.
    pub fn derived(mut self, name: impl Into<String>, node: impl Into<Derived>) -> Self {
        self.params.push(Param::Derived {
            name: name.into(),
            node: node.into(),
        });
        self
    }

    /// Makes this the command run when no other command token matches.
    pub fn main(mut self) -> Self {
        self.main = true;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn help_text(&self) -> Option<&str> {
        self.help.as_deref().or_else(|| {
            self.description
                .as_deref()
                .and_then(|d| d.lines().next())
        })
    }

    pub fn description_text(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Every leaf descriptor the command binds, derived inputs included.
    pub fn options(&self) -> &[Rc<Opt>] {
        self.plan.leaves()
    }

    pub fn is_main(&self) -> bool {
        self.main
    }

    pub fn is_async(&self) -> bool {
        self.body.is_async()
    }

    pub(crate) fn body(&self) -> &Body {
        &self.body
    }

    pub(crate) fn compile(&mut self, scope: &str) -> Result<(), DefinitionError> {
        self.plan = Plan::build(scope, &self.params)?;
        Ok(())
    }
}

/// Runs before any command of its group, with the group's options.
///
/// Its return value is ignored; an error aborts the dispatch.
#[derive(Debug, Clone)]
pub struct Processor {
    params: Vec<Param>,
    body: Body,
}

impl Processor {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Args) -> anyhow::Result<()> + 'static,
    {
        Self {
            params: Vec::new(),
            body: Body::sync(f),
        }
    }

    pub fn new_async<F, Fut>(f: F) -> Self
    where
        F: Fn(Args) -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<()>> + 'static,
    {
        Self {
            params: Vec::new(),
            body: Body::from_async(f),
        }
    }

    pub fn option(mut self, opt: Opt) -> Self {
        self.params.push(Param::Opt(Rc::new(opt)));
        self
    }

    pub fn derived(mut self, name: impl Into<String>, node: impl Into<Derived>) -> Self {
        self.params.push(Param::Derived {
            name: name.into(),
            node: node.into(),
        });
        self
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn is_async(&self) -> bool {
        self.body.is_async()
    }

    pub(crate) fn body(&self) -> &Body {
        &self.body
    }
}

/// Strips the common indentation of every line but the first, then trims.
///
/// Indentation is counted in whitespace characters, not bytes.
pub(crate) fn clean_multiline(text: &str) -> String {
    let mut lines = text.lines();
    let first = lines.next().unwrap_or_default().trim().to_string();
    let rest: Vec<&str> = lines.collect();
    let indent = rest
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.chars().take_while(|c| c.is_whitespace()).count())
        .min()
        .unwrap_or(0);

    let mut out = vec![first];
    out.extend(rest.iter().map(|line| dedent(line, indent).trim_end().to_string()));
    out.join("\n").trim().to_string()
}

/// Drops up to `indent` leading whitespace characters.
fn dedent(line: &str, indent: usize) -> &str {
    let start = line
        .char_indices()
        .take_while(|(_, c)| c.is_whitespace())
        .take(indent)
        .last()
        .map_or(0, |(at, c)| at + c.len_utf8());
    &line[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_falls_back_to_description_first_line() {
        let cmd = Command::new("foo", |_| Ok(())).description(
            "
            Run foo command.

            Longer explanation
              indented detail
            ",
        );
        assert_eq!(cmd.help_text(), Some("Run foo command."));
        assert_eq!(
            cmd.description_text(),
            Some("Run foo command.\n\nLonger explanation\n  indented detail")
        );

        let cmd = cmd.help("Short");
        assert_eq!(cmd.help_text(), Some("Short"));
    }

    #[test]
    fn test_multibyte_indentation_is_stripped_by_character() {
        assert_eq!(clean_multiline("head\n  a\n\u{3000}b"), "head\n a\nb");
        assert_eq!(clean_multiline("head\n\u{3000}\u{3000}a\n\u{3000}b"), "head\n\u{3000}a\nb");
    }

    #[test]
    fn test_main_flag() {
        assert!(Command::new("run", |_| Ok(())).main().is_main());
        assert!(!Command::new("run", |_| Ok(())).is_main());
    }

    #[test]
    fn test_compile_builds_plan() {
        let mut cmd = Command::new("foo", |_| Ok(()))
            .option(Opt::positional("foo1"))
            .option(Opt::keyword(["-f", "--foo2"]));
        cmd.compile("foo").unwrap();
        let names: Vec<&str> = cmd.options().iter().map(|o| o.name()).collect();
        assert_eq!(names, vec!["foo1", "foo2"]);
    }

    #[test]
    fn test_async_commands_report_async() {
        let cmd = Command::new_async("later", |_| async { Ok::<_, anyhow::Error>(1i64) });
        assert!(cmd.is_async());
        let processor = Processor::new_async(|_| async { Ok::<(), anyhow::Error>(()) });
        assert!(processor.is_async());
    }
}
