//! Option descriptors.
//!
//! An [`Opt`] is the static description of one bindable argument: its name,
//! flags, type, default and validation rules. Descriptors are built with a
//! fluent API at registration time and never mutated afterwards.
//!
//! ```rust
//! use roost_dispatch::{ArgType, Opt};
//!
//! // positional, required
//! let foo1 = Opt::positional("foo1").ty(ArgType::Int).help("Foo argument");
//!
//! // keyword, required, name synthesized from the flags
//! let foo2 = Opt::keyword(["-f", "--foo2"]).help("Foo2 argument");
//! assert_eq!(foo2.name(), "foo2");
//!
//! // keyword, optional
//! let foo3 = Opt::keyword(["--foo3"]).optional();
//!
//! // zero-arity switch, defaults to false
//! let quiet = Opt::switch(["-q", "--quiet"]);
//! assert!(!quiet.is_required());
//! # let _ = (foo1, foo3);
//! ```

use std::collections::HashSet;
use std::fmt;

use crate::choices::Choices;
use crate::error::DefinitionError;
use crate::value::Value;

/// The type a descriptor casts its token(s) to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgType {
    Str,
    Int,
    Float,
    /// Zero-arity switch when keyword; `true`/`false` words when positional.
    Bool,
    /// A path that must exist (unless the descriptor disables the check).
    Path,
    /// A path that is never checked.
    MaybePath,
    /// ISO-8601 date.
    Date,
    /// ISO-8601 datetime, optionally with an offset.
    DateTime,
    Uuid,
    /// JSON object.
    Dict,
    /// Every following token up to the next recognised flag.
    List(Box<ArgType>),
    /// One of a fixed set of strings.
    Literal(Vec<String>),
    /// A string whose value is partially masked in help output.
    Secret,
    /// A string whose value is fully masked in help output.
    Password,
}

impl ArgType {
    /// A list whose items are cast with `inner`.
    pub fn list_of(inner: ArgType) -> Self {
        ArgType::List(Box::new(inner))
    }

    /// A literal type accepting exactly `values`.
    pub fn literal<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ArgType::Literal(values.into_iter().map(Into::into).collect())
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, ArgType::Bool)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, ArgType::List(_))
    }

    /// True for secret and password types.
    pub fn is_masked(&self) -> bool {
        matches!(self, ArgType::Secret | ArgType::Password)
    }
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgType::Str => f.write_str("str"),
            ArgType::Int => f.write_str("int"),
            ArgType::Float => f.write_str("float"),
            ArgType::Bool => f.write_str("bool"),
            ArgType::Path => f.write_str("path"),
            ArgType::MaybePath => f.write_str("path"),
            ArgType::Date => f.write_str("date"),
            ArgType::DateTime => f.write_str("datetime"),
            ArgType::Uuid => f.write_str("uuid"),
            ArgType::Dict => f.write_str("dict"),
            ArgType::List(inner) => write!(f, "list[{}]", inner),
            ArgType::Literal(values) => write!(f, "literal[{}]", values.join(", ")),
            ArgType::Secret => f.write_str("secret"),
            ArgType::Password => f.write_str("password"),
        }
    }
}

/// Either "must be supplied" or a concrete fallback value.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Required,
    Value(Value),
}

/// How a secret value is shown by formatters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Masking {
    /// Leading characters left visible.
    pub show_first: usize,
    /// Trailing characters left visible.
    pub show_last: usize,
    /// Text shown in place of the hidden characters.
    pub replacement: String,
}

impl Default for Masking {
    fn default() -> Self {
        Self {
            show_first: 0,
            show_last: 2,
            replacement: "******".to_string(),
        }
    }
}

impl Masking {
    /// Masks everything.
    pub fn full() -> Self {
        Self {
            show_first: 0,
            show_last: 0,
            ..Self::default()
        }
    }

    /// Applies the mask. Values too short to keep anything hidden are
    /// replaced entirely.
    pub fn apply(&self, value: &str) -> String {
        let chars: Vec<char> = value.chars().collect();
        if self.show_first + self.show_last >= chars.len() {
            return self.replacement.clone();
        }
        let head: String = chars[..self.show_first].iter().collect();
        let tail: String = chars[chars.len() - self.show_last..].iter().collect();
        format!("{}{}{}", head, self.replacement, tail)
    }
}

/// Static metadata describing one bindable argument.
#[derive(Debug, Clone)]
pub struct Opt {
    name: String,
    flags: Vec<String>,
    default: DefaultValue,
    ty: ArgType,
    choices: Option<Choices>,
    case_sensitive: bool,
    check_exists: bool,
    help: Option<String>,
    masking: Option<Masking>,
    hide_choices: bool,
}

impl Opt {
    fn base(name: String, flags: Vec<String>, ty: ArgType, default: DefaultValue) -> Self {
        Self {
            name,
            flags,
            default,
            ty,
            choices: None,
            case_sensitive: true,
            check_exists: true,
            help: None,
            masking: None,
            hide_choices: false,
        }
    }

    /// A positional argument. Required until a default is given.
    pub fn positional(name: impl Into<String>) -> Self {
        Self::base(name.into(), Vec::new(), ArgType::Str, DefaultValue::Required)
    }

    /// A keyword argument taking a value. Required until a default is given.
    ///
    /// The logical name is synthesized from the flags (`--pg-host` →
    /// `pg_host`); use [`arg_name`](Self::arg_name) to override it.
    pub fn keyword<I, S>(flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let flags: Vec<String> = flags.into_iter().map(Into::into).collect();
        Self::base(
            name_from_flags(&flags),
            flags,
            ArgType::Str,
            DefaultValue::Required,
        )
    }

    /// A boolean switch defaulting to `false`.
    pub fn switch<I, S>(flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::keyword(flags).ty(ArgType::Bool).default(false)
    }

    /// Overrides the logical parameter name.
    pub fn arg_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn ty(mut self, ty: ArgType) -> Self {
        if ty == ArgType::Password && self.masking.is_none() {
            self.masking = Some(Masking::full());
        }
        self.ty = ty;
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = DefaultValue::Value(value.into());
        self
    }

    /// Makes the argument optional with a `Null` default.
    pub fn optional(self) -> Self {
        self.default(Value::Null)
    }

    pub fn required(mut self) -> Self {
        self.default = DefaultValue::Required;
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn choices(mut self, choices: impl Into<Choices>) -> Self {
        self.choices = Some(choices.into());
        self
    }

    /// Controls case sensitivity of literal and string choice matching.
    /// Regex choices are always case-sensitive.
    pub fn case_sensitive(mut self, yes: bool) -> Self {
        self.case_sensitive = yes;
        self
    }

    /// For `Path` types: whether a missing path is an error.
    pub fn check_exists(mut self, yes: bool) -> Self {
        self.check_exists = yes;
        self
    }

    /// Masks the value in help output, keeping the given number of leading
    /// and trailing characters.
    pub fn mask(mut self, show_first: usize, show_last: usize) -> Self {
        let replacement = self.masking.take().unwrap_or_default().replacement;
        self.masking = Some(Masking {
            show_first,
            show_last,
            replacement,
        });
        self
    }

    /// Text shown in place of masked characters.
    pub fn replacement(mut self, replacement: impl Into<String>) -> Self {
        let mut masking = self.masking.take().unwrap_or_default();
        masking.replacement = replacement.into();
        self.masking = Some(masking);
        self
    }

    /// Keeps the choice list out of help output.
    pub fn hide_choices(mut self) -> Self {
        self.hide_choices = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    pub fn default_value(&self) -> &DefaultValue {
        &self.default
    }

    pub fn arg_type(&self) -> &ArgType {
        &self.ty
    }

    pub fn choice_set(&self) -> Option<&Choices> {
        self.choices.as_ref()
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn checks_existence(&self) -> bool {
        self.check_exists
    }

    pub fn help_text(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub fn choices_hidden(&self) -> bool {
        self.hide_choices
    }

    pub fn is_required(&self) -> bool {
        matches!(self.default, DefaultValue::Required)
    }

    pub fn is_positional(&self) -> bool {
        self.flags.is_empty()
    }

    /// How the descriptor is referred to in messages: the first flag, or
    /// `<name>` for positionals.
    pub fn display_name(&self) -> String {
        match self.flags.first() {
            Some(flag) => flag.clone(),
            None => format!("<{}>", self.name),
        }
    }

    /// The masking in effect, if this is a secret or password.
    pub fn masking(&self) -> Option<Masking> {
        match (&self.ty, &self.masking) {
            (ArgType::Password, _) => Some(Masking::full()),
            (_, Some(masking)) => Some(masking.clone()),
            (ArgType::Secret, None) => Some(Masking::default()),
            _ => None,
        }
    }

    /// Presentation of a value of this descriptor, masked when secret.
    pub fn masked(&self, value: &str) -> String {
        match self.masking() {
            Some(masking) => masking.apply(value),
            None => value.to_string(),
        }
    }

    /// The default rendered for help output; `None` when required or null.
    pub fn display_default(&self) -> Option<String> {
        match &self.default {
            DefaultValue::Value(value) if !value.is_null() => Some(self.masked(&value.to_string())),
            _ => None,
        }
    }

    /// Checks the descriptor-local definition rules.
    pub(crate) fn validate(&self) -> Result<(), DefinitionError> {
        let mut seen = HashSet::new();
        for flag in &self.flags {
            let bare = flag.trim_start_matches('-');
            let malformed =
                bare.is_empty() || flag.contains(char::is_whitespace) || flag.contains('=');
            if !flag.starts_with('-') || malformed {
                return Err(DefinitionError::InvalidFlag { flag: flag.clone() });
            }
            if !seen.insert(flag.as_str()) {
                return Err(DefinitionError::DuplicateFlag {
                    flag: flag.clone(),
                    scope: self.name.clone(),
                });
            }
        }
        if matches!(self.ty, ArgType::Literal(_)) && self.choices.is_some() {
            return Err(DefinitionError::ChoicesWithLiteral(self.name.clone()));
        }
        Ok(())
    }
}

/// Formats a flag list into a parameter name: `--quiet-v2` → `quiet_v2`.
///
/// The lexicographically first flag wins, which prefers `--long` over `-s`.
pub fn name_from_flags(flags: &[String]) -> String {
    flags
        .iter()
        .min()
        .map(|flag| flag.trim_start_matches('-').replace('-', "_"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_name_prefers_long_flag() {
        assert_eq!(Opt::keyword(["-f", "--foo2"]).name(), "foo2");
        assert_eq!(Opt::keyword(["--pg-host"]).name(), "pg_host");
        assert_eq!(Opt::keyword(["-q"]).name(), "q");
    }

    #[test]
    fn test_arg_name_overrides_synthesized_name() {
        let opt = Opt::keyword(["--pg-host"]).arg_name("source_pg_host");
        assert_eq!(opt.name(), "source_pg_host");
        assert_eq!(opt.flags(), ["--pg-host"]);
    }

    #[test]
    fn test_required_and_positional_flags() {
        let opt = Opt::positional("foo");
        assert!(opt.is_required());
        assert!(opt.is_positional());

        let opt = Opt::keyword([String::from("--foo")]).optional();
        assert!(!opt.is_required());
        assert!(!opt.is_positional());
        assert_eq!(opt.default_value(), &DefaultValue::Value(Value::Null));
    }

    #[test]
    fn test_switch_defaults_to_false() {
        let opt = Opt::switch(["--verbose"]);
        assert!(opt.arg_type().is_bool());
        assert_eq!(opt.default_value(), &DefaultValue::Value(Value::Bool(false)));
    }

    #[test]
    fn test_display_name_for_messages() {
        assert_eq!(Opt::positional("foo1").display_name(), "<foo1>");
        assert_eq!(Opt::keyword(["-f", "--foo2"]).display_name(), "-f");
    }

    #[test]
    fn test_masking_secret_and_password() {
        let secret = Opt::keyword(["--token"]).ty(ArgType::Secret).default("abcdef123");
        assert_eq!(secret.display_default().unwrap(), "******23");

        let custom = Opt::keyword(["--token"])
            .ty(ArgType::Secret)
            .mask(2, 2)
            .replacement("...")
            .default("abcdef123");
        assert_eq!(custom.display_default().unwrap(), "ab...23");

        let password = Opt::keyword(["--pwd"]).ty(ArgType::Password).default("hunter2");
        assert_eq!(password.display_default().unwrap(), "******");

        let plain = Opt::keyword(["--user"]).default("postgres");
        assert_eq!(plain.display_default().unwrap(), "postgres");
    }

    #[test]
    fn test_masking_short_values_hides_everything() {
        let masking = Masking {
            show_first: 2,
            show_last: 2,
            replacement: "***".into(),
        };
        assert_eq!(masking.apply("abc"), "***");
        assert_eq!(masking.apply("abcde"), "ab***de");
    }

    #[test]
    fn test_validate_rejects_bad_flags() {
        assert!(matches!(
            Opt::keyword(["foo"]).validate(),
            Err(DefinitionError::InvalidFlag { .. })
        ));
        assert!(matches!(
            Opt::keyword(["--"]).validate(),
            Err(DefinitionError::InvalidFlag { .. })
        ));
        assert!(matches!(
            Opt::keyword(["-f", "--foo", "--foo"]).validate(),
            Err(DefinitionError::DuplicateFlag { ref flag, .. }) if flag == "--foo"
        ));
    }

    #[test]
    fn test_validate_rejects_literal_with_choices() {
        let opt = Opt::keyword(["--env"])
            .ty(ArgType::literal(["prod", "staging"]))
            .choices(["prod"]);
        assert_eq!(
            opt.validate(),
            Err(DefinitionError::ChoicesWithLiteral("env".into()))
        );
    }

    #[test]
    fn test_arg_type_display() {
        assert_eq!(ArgType::list_of(ArgType::Int).to_string(), "list[int]");
        assert_eq!(
            ArgType::literal(["foo", "bar"]).to_string(),
            "literal[foo, bar]"
        );
    }
}
