//! Template rendering and theming shared by the built-in formatters.

use console::Style;
use minijinja::{Environment, Value};
use roost_dispatch::{CastError, CommandTree, DispatchError, Error};
use std::collections::HashMap;

use super::data::{extract_help_data, usage_for};
use crate::config::CliConfig;
use crate::error::RenderError;

const HELP_TEMPLATE: &str = include_str!("template.txt");

/// Named styles applied through the `style` template filter.
#[derive(Debug, Clone, Default)]
pub struct Theme {
    styles: HashMap<String, Style>,
}

impl Theme {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, name: impl Into<String>, style: Style) -> Self {
        self.styles.insert(name.into(), style);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Style> {
        self.styles.get(name)
    }

    /// Styles `text` when `use_color` is set and `name` is known.
    pub fn apply(&self, name: &str, text: &str, use_color: bool) -> String {
        match self.styles.get(name) {
            Some(style) if use_color => {
                style.clone().force_styling(true).apply_to(text).to_string()
            }
            _ => text.to_string(),
        }
    }
}

/// Returns the default theme for help and error rendering.
pub fn default_theme() -> Theme {
    Theme::new()
        .add("header", Style::new().bold().bright().white())
        .add("item", Style::new().cyan())
        .add("desc", Style::new())
        .add("usage", Style::new())
        .add("about", Style::new())
        .add("error", Style::new().red())
        .add("suggestion", Style::new().yellow())
}

/// Renders help pages and error reports with one theme.
#[derive(Debug, Clone)]
pub(crate) struct Renderer {
    pub(crate) theme: Theme,
    pub(crate) use_color: bool,
    pub(crate) template: Option<String>,
}

impl Renderer {
    pub(crate) fn help(
        &self,
        tree: &CommandTree,
        path: &[String],
        config: &CliConfig,
    ) -> Result<String, RenderError> {
        let program = program_name(config);
        let data = extract_help_data(tree, path, &program, config.show_default)
            .ok_or_else(|| RenderError::UnknownPath(path.join(" ")))?;

        let mut env = Environment::new();
        register_filters(&mut env, self.theme.clone(), self.use_color);
        let template = self.template.as_deref().unwrap_or(HELP_TEMPLATE);
        env.add_template_owned("help".to_string(), template.to_string())?;
        let rendered = env.get_template("help")?.render(&data)?;
        Ok(normalize(&rendered))
    }

    pub(crate) fn error(&self, tree: &CommandTree, error: &Error, config: &CliConfig) -> String {
        match error {
            Error::Command(err) => err.message.clone(),
            Error::Hook(err) => self.paint("error", &err.to_string()),
            Error::Failed(err) => format!("{:?}", err),
            Error::Cast(err) => {
                self.usage_error(tree, err.path.as_slice(), cast_report(err), config)
            }
            Error::Dispatch(err) => {
                self.usage_error(tree, err.path(), dispatch_report(err), config)
            }
        }
    }

    /// Message, then suggestions, then the usage of the node at `path`.
    fn usage_error(
        &self,
        tree: &CommandTree,
        path: &[String],
        (message, suggestions): (String, &[String]),
        config: &CliConfig,
    ) -> String {
        let mut out = vec![self.paint("error", &message)];
        if let Some(hint) = did_you_mean(suggestions) {
            out.push(self.paint("suggestion", &hint));
        }
        if let Some(usage) = usage_for(tree, path, &program_name(config)) {
            out.push(String::new());
            out.push(self.paint("header", "USAGE"));
            out.push(format!(" {}", self.paint("usage", &usage)));
        }
        out.join("\n")
    }

    fn paint(&self, style: &str, text: &str) -> String {
        self.theme.apply(style, text, self.use_color)
    }
}

fn cast_report(err: &CastError) -> (String, &[String]) {
    (err.message.clone(), &err.suggestions)
}

fn dispatch_report(err: &DispatchError) -> (String, &[String]) {
    (err.to_string(), err.suggestions())
}

fn did_you_mean(suggestions: &[String]) -> Option<String> {
    match suggestions {
        [] => None,
        [only] => Some(format!("Did you mean \"{}\"?", only)),
        many => Some(format!("Did you mean one of: {}?", many.join(", "))),
    }
}

pub(crate) fn program_name(config: &CliConfig) -> String {
    config
        .program_name
        .clone()
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string())
}

fn register_filters(env: &mut Environment<'static>, theme: Theme, use_color: bool) {
    env.add_filter("style", move |value: Value, name: String| -> String {
        theme.apply(&name, &value.to_string(), use_color)
    });
}

/// Strips trailing spaces and collapses runs of blank lines.
fn normalize(rendered: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for line in rendered.lines().map(str::trim_end) {
        if line.is_empty() && out.last().map_or(true, |prev| prev.is_empty()) {
            continue;
        }
        out.push(line);
    }
    while out.last().is_some_and(|line| line.is_empty()) {
        out.pop();
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use roost_dispatch::{ArgType, Command, Opt};

    fn plain() -> Renderer {
        Renderer {
            theme: default_theme(),
            use_color: false,
            template: None,
        }
    }

    fn config() -> CliConfig {
        CliConfig::default().show_default(false).program_name("prog")
    }

    fn tree() -> CommandTree {
        CommandTree::builder()
            .description("A CLI tool")
            .option(Opt::switch(["-q", "--quiet"]).help("Do not output any message"))
            .command(
                Command::new("foo", |_| Ok(()))
                    .help("Run foo command")
                    .option(Opt::positional("foo1").ty(ArgType::Int).help("Foo arguments"))
                    .option(Opt::keyword(["-f", "--foo2"]).help("Foo2 arguments")),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("a  \n\n\n\nb\n\n"), "a\n\nb");
        assert_eq!(normalize("\n\na"), "a");
    }

    #[test]
    fn test_root_help_layout() {
        let out = plain().help(&tree(), &[], &config()).unwrap();
        let expected = [
            "USAGE",
            " prog [-q] <command>",
            "",
            "OPTIONS",
            "    -q (--quiet)                Do not output any message",
            "",
            "AVAILABLE COMMANDS",
            "     foo                        Run foo command",
            "",
            "DESCRIPTION",
            " A CLI tool",
        ]
        .join("\n");
        assert_eq!(out, expected);
    }

    #[test]
    fn test_command_help_layout() {
        let out = plain().help(&tree(), &["foo".to_string()], &config()).unwrap();
        let expected = [
            "USAGE",
            " prog [-q] foo <foo1> [-f]",
            "",
            "ARGUMENTS",
            "    <foo1>                      Foo arguments",
            "",
            "OPTIONS",
            "    -f (--foo2)*                Foo2 arguments",
            "",
            "GLOBAL OPTIONS",
            "    -q (--quiet)                Do not output any message",
            "",
            "DESCRIPTION",
            " Run foo command",
        ]
        .join("\n");
        assert_eq!(out, expected);
    }

    #[test]
    fn test_unknown_path_is_an_error() {
        let err = plain().help(&tree(), &["nope".to_string()], &config()).unwrap_err();
        assert!(matches!(err, RenderError::UnknownPath(ref p) if p == "nope"));
    }

    #[test]
    fn test_styled_output_carries_ansi_codes() {
        let styled = Renderer {
            use_color: true,
            ..plain()
        };
        let out = styled.help(&tree(), &[], &config()).unwrap();
        assert!(out.contains("\u{1b}["));
        assert_eq!(console::strip_ansi_codes(&out), plain().help(&tree(), &[], &config()).unwrap());
    }

    #[test]
    fn test_cast_error_report() {
        let err = tree().dispatch_blocking(["foo", "-f", "x"]).unwrap_err();
        let out = plain().error(&tree(), &err, &config());
        assert_eq!(
            out,
            "Missing value for required parameter '<foo1>'\n\nUSAGE\n prog [-q] foo <foo1> [-f]"
        );
    }

    #[test]
    fn test_dispatch_error_report_suggests() {
        let err = tree().dispatch_blocking(["fo"]).unwrap_err();
        let out = plain().error(&tree(), &err, &config());
        assert_eq!(
            out,
            "Unknown command \"fo\"\nDid you mean \"foo\"?\n\nUSAGE\n prog [-q] <command>"
        );
    }

    #[test]
    fn test_command_error_is_bare() {
        let err = Error::Command(roost_dispatch::CommandError::new("bad env"));
        let styled = Renderer {
            use_color: true,
            ..plain()
        };
        assert_eq!(styled.error(&tree(), &err, &config()), "bad env");
    }
}
