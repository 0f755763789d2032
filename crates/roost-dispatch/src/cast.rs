//! Type casting pipeline.
//!
//! ```text
//! Bound (Absent | Switch | Tokens)
//!   → default / missing check
//!   → per-token conversion to the descriptor type
//!   → choice validation (static list, or producer resolved once per invocation)
//!   → Value
//! ```
//!
//! Defaults are returned as declared and never validated against choices.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::choices::{find_match, Choice, ChoiceCache, Choices};
use crate::error::CastError;
use crate::option::{ArgType, DefaultValue, Opt};
use crate::suggest::did_you_mean;
use crate::value::{Value, DATE_FORMAT};

/// What the binder found for one descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bound {
    /// Nothing on the command line.
    Absent,
    /// A boolean flag given without a value.
    Switch,
    /// One token for scalars, every collected token for lists.
    Tokens(Vec<String>),
}

impl Bound {
    pub fn token(token: impl Into<String>) -> Self {
        Bound::Tokens(vec![token.into()])
    }
}

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const ZONED_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Converts one token to the descriptor's type, without choice validation.
///
/// List descriptors convert the token with their item type.
pub fn convert(opt: &Opt, token: &str) -> Result<Value, CastError> {
    let ty = match opt.arg_type() {
        ArgType::List(inner) => inner.as_ref(),
        other => other,
    };
    convert_as(opt, ty, token)
}

fn convert_as(opt: &Opt, ty: &ArgType, token: &str) -> Result<Value, CastError> {
    let label = opt.display_name();
    match ty {
        ArgType::Str | ArgType::Secret | ArgType::Password => Ok(Value::Str(token.to_string())),
        ArgType::Int => token
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| CastError::invalid_type(label, token, "an integer")),
        ArgType::Float => token
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| CastError::invalid_type(label, token, "a number")),
        ArgType::Bool => parse_bool(token)
            .map(Value::Bool)
            .ok_or_else(|| CastError::invalid_type(label, token, "true or false")),
        ArgType::Path => {
            if opt.checks_existence() && !Path::new(token).exists() {
                return Err(CastError::path_not_found(label, token));
            }
            Ok(Value::Path(PathBuf::from(token)))
        }
        ArgType::MaybePath => Ok(Value::Path(PathBuf::from(token))),
        ArgType::Date => NaiveDate::parse_from_str(token, DATE_FORMAT)
            .map(Value::Date)
            .map_err(|e| CastError::invalid_format(label, token, e)),
        ArgType::DateTime => {
            parse_datetime(token).ok_or_else(|| {
                CastError::invalid_format(label, token, "expected an ISO-8601 datetime")
            })
        }
        ArgType::Uuid => Uuid::parse_str(token)
            .map(Value::Uuid)
            .map_err(|e| CastError::invalid_format(label, token, e)),
        ArgType::Dict => match serde_json::from_str::<serde_json::Value>(token) {
            Ok(serde_json::Value::Object(map)) => Ok(Value::Dict(map)),
            Ok(_) => Err(CastError::invalid_type(label, token, "a JSON object")),
            Err(e) => Err(CastError::invalid_format(label, token, e)),
        },
        ArgType::List(inner) => convert_as(opt, inner, token),
        ArgType::Literal(values) => {
            let found = values.iter().find(|v| {
                if opt.is_case_sensitive() {
                    v.as_str() == token
                } else {
                    v.to_lowercase() == token.to_lowercase()
                }
            });
            match found {
                Some(canonical) => Ok(Value::Str(canonical.clone())),
                None => Err(CastError::invalid_choice(label, token, values.clone())
                    .with_suggestions(did_you_mean(token, values.iter().map(String::as_str)))),
            }
        }
    }
}

fn parse_bool(token: &str) -> Option<bool> {
    match token.to_lowercase().as_str() {
        "true" | "yes" | "y" | "on" | "1" => Some(true),
        "false" | "no" | "n" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn parse_datetime(token: &str) -> Option<Value> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(token) {
        return Some(Value::ZonedDateTime(dt));
    }
    for format in ZONED_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(token, format) {
            return Some(Value::ZonedDateTime(dt));
        }
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(token, format) {
            return Some(Value::DateTime(dt));
        }
    }
    NaiveDate::parse_from_str(token, DATE_FORMAT)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(Value::DateTime)
}

enum Raw {
    Default(Value),
    Parsed(Value),
}

fn cast_raw(opt: &Opt, bound: &Bound) -> Result<Raw, CastError> {
    match bound {
        Bound::Absent => match opt.default_value() {
            DefaultValue::Required => Err(CastError::missing_required(opt.display_name())),
            DefaultValue::Value(value) => Ok(Raw::Default(value.clone())),
        },
        Bound::Switch if opt.arg_type().is_bool() => Ok(Raw::Parsed(Value::Bool(true))),
        Bound::Switch => Err(CastError::missing_value(opt.display_name())),
        Bound::Tokens(tokens) => {
            if opt.arg_type().is_list() {
                if tokens.is_empty() {
                    return Err(CastError::missing_value(opt.display_name()));
                }
                let items = tokens
                    .iter()
                    .map(|token| convert(opt, token))
                    .collect::<Result<Vec<_>, _>>()?;
                return Ok(Raw::Parsed(Value::List(items)));
            }
            match tokens.last() {
                Some(token) => convert(opt, token).map(Raw::Parsed),
                None => Err(CastError::missing_value(opt.display_name())),
            }
        }
    }
}

fn check_choices(opt: &Opt, value: Value, allowed: &[Choice]) -> Result<Value, CastError> {
    if let Value::List(items) = value {
        return items
            .into_iter()
            .map(|item| check_choices(opt, item, allowed))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List);
    }
    if let Some(canonical) = find_match(allowed, &value, opt.is_case_sensitive()) {
        return Ok(canonical);
    }
    let token = value.to_token();
    let listed: Vec<String> = allowed.iter().map(Choice::display).collect();
    let plain: Vec<&str> = allowed
        .iter()
        .filter_map(|c| match c {
            Choice::Value(Value::Str(s)) => Some(s.as_str()),
            _ => None,
        })
        .collect();
    let suggestions = did_you_mean(&token, plain);
    Err(CastError::invalid_choice(opt.display_name(), &token, listed).with_suggestions(suggestions))
}

/// Casts a bound descriptor, validating static choices only.
///
/// Producer-backed choices need an invocation context; see [`cast`].
pub fn cast_value(opt: &Opt, bound: &Bound) -> Result<Value, CastError> {
    match cast_raw(opt, bound)? {
        Raw::Default(value) => Ok(value),
        Raw::Parsed(value) => match opt.choice_set().and_then(Choices::static_choices) {
            Some(allowed) => check_choices(opt, value, allowed),
            None => Ok(value),
        },
    }
}

/// Casts a bound descriptor, resolving producer choices through `cache`.
pub(crate) async fn cast(
    opt: &Opt,
    bound: &Bound,
    cache: &mut ChoiceCache,
) -> Result<Value, CastError> {
    match cast_raw(opt, bound)? {
        Raw::Default(value) => Ok(value),
        Raw::Parsed(value) => match opt.choice_set() {
            Some(choices) => {
                let allowed = cache.resolve(choices).await;
                check_choices(opt, value, &allowed)
            }
            None => Ok(value),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CastErrorKind;
    use chrono::NaiveDate;
    use futures::executor::block_on;
    use proptest::prelude::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn cast_one(opt: &Opt, token: &str) -> Result<Value, CastError> {
        cast_value(opt, &Bound::token(token))
    }

    #[test]
    fn test_casts_scalars() {
        assert_eq!(cast_one(&Opt::positional("a").ty(ArgType::Int), "3").unwrap(), Value::Int(3));
        assert_eq!(
            cast_one(&Opt::positional("a").ty(ArgType::Float), "0.5").unwrap(),
            Value::Float(0.5)
        );
        assert_eq!(
            cast_one(&Opt::positional("a").ty(ArgType::Bool), "yes").unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            cast_one(&Opt::positional("a").ty(ArgType::Bool), "False").unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_invalid_int_is_invalid_type() {
        let err = cast_one(&Opt::positional("foo1").ty(ArgType::Int), "abc").unwrap_err();
        assert_eq!(err.kind, CastErrorKind::InvalidType);
        assert_eq!(err.option, "<foo1>");
    }

    #[test]
    fn test_absent_required_and_defaults() {
        let required = Opt::keyword(["--foo2"]);
        let err = cast_value(&required, &Bound::Absent).unwrap_err();
        assert_eq!(err.kind, CastErrorKind::MissingRequired);

        let optional = Opt::keyword(["--foo3"]).optional();
        assert_eq!(cast_value(&optional, &Bound::Absent).unwrap(), Value::Null);

        let switch = Opt::switch(["-q", "--quiet"]);
        assert_eq!(cast_value(&switch, &Bound::Absent).unwrap(), Value::Bool(false));
        assert_eq!(cast_value(&switch, &Bound::Switch).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_defaults_skip_choice_validation() {
        let opt = Opt::keyword(["--env"]).choices(["prod", "staging"]).default("dev");
        assert_eq!(cast_value(&opt, &Bound::Absent).unwrap(), Value::from("dev"));
    }

    #[test]
    fn test_dates_and_datetimes() {
        let date = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();
        assert_eq!(
            cast_one(&Opt::positional("d").ty(ArgType::Date), "2019-01-01").unwrap(),
            Value::Date(date)
        );

        let dt = Opt::positional("d").ty(ArgType::DateTime);
        assert_eq!(
            cast_one(&dt, "2019-01-01T01:01:01").unwrap(),
            Value::DateTime(date.and_hms_opt(1, 1, 1).unwrap())
        );
        assert!(matches!(
            cast_one(&dt, "2019-01-01T01:01:01+01:00").unwrap(),
            Value::ZonedDateTime(_)
        ));

        let err = cast_one(&Opt::positional("d").ty(ArgType::Date), "01/01/2019").unwrap_err();
        assert_eq!(err.kind, CastErrorKind::InvalidFormat);
    }

    #[test]
    fn test_dict_requires_json_object() {
        let opt = Opt::positional("d").ty(ArgType::Dict);
        match cast_one(&opt, r#"{"a": 1}"#).unwrap() {
            Value::Dict(map) => assert_eq!(map["a"], serde_json::json!(1)),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(cast_one(&opt, "{nope").unwrap_err().kind, CastErrorKind::InvalidFormat);
        assert_eq!(cast_one(&opt, "[1, 2]").unwrap_err().kind, CastErrorKind::InvalidType);
    }

    #[test]
    fn test_uuid_parses_canonical_form() {
        let opt = Opt::positional("id").ty(ArgType::Uuid);
        let token = "67e55044-10b1-426f-9247-bb680e5fe0c8";
        assert_eq!(cast_one(&opt, token).unwrap().to_token(), token);
        assert_eq!(cast_one(&opt, "not-a-uuid").unwrap_err().kind, CastErrorKind::InvalidFormat);
    }

    #[test]
    fn test_path_existence_is_checked() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("data.txt");
        std::fs::write(&file, "x").unwrap();
        let file_token = file.to_string_lossy().to_string();
        let missing_token = dir.path().join("missing.txt").to_string_lossy().to_string();

        let checked = Opt::positional("p").ty(ArgType::Path);
        assert_eq!(cast_one(&checked, &file_token).unwrap(), Value::Path(file.clone()));

        let err = cast_one(&checked, &missing_token).unwrap_err();
        assert_eq!(err.kind, CastErrorKind::PathNotFound);
        assert_eq!(err.to_string(), format!("File not found: \"{}\"", missing_token));

        let unchecked = Opt::positional("p").ty(ArgType::Path).check_exists(false);
        assert!(cast_one(&unchecked, &missing_token).is_ok());
        let maybe = Opt::positional("p").ty(ArgType::MaybePath);
        assert!(cast_one(&maybe, &missing_token).is_ok());
    }

    #[test]
    fn test_literal_returns_canonical_spelling() {
        let opt = Opt::keyword(["--env"])
            .ty(ArgType::literal(["Prod", "Staging"]))
            .case_sensitive(false);
        assert_eq!(cast_one(&opt, "prod").unwrap(), Value::from("Prod"));

        let strict = Opt::keyword(["--env"]).ty(ArgType::literal(["Prod", "Staging"]));
        let err = cast_one(&strict, "prod").unwrap_err();
        assert_eq!(err.kind, CastErrorKind::InvalidChoice);
        assert_eq!(err.allowed, vec!["Prod", "Staging"]);
        assert_eq!(err.suggestions, vec!["Prod"]);
    }

    #[test]
    fn test_list_items_are_cast_and_validated() {
        let opt = Opt::keyword(["--ids"])
            .ty(ArgType::list_of(ArgType::Int))
            .choices([1i64, 2, 3]);
        assert_eq!(
            cast_value(&opt, &Bound::Tokens(vec!["1".into(), "3".into()])).unwrap(),
            Value::List(vec![Value::Int(1), Value::Int(3)])
        );
        let err = cast_value(&opt, &Bound::Tokens(vec!["1".into(), "4".into()])).unwrap_err();
        assert_eq!(err.kind, CastErrorKind::InvalidChoice);
    }

    #[test]
    fn test_repeated_scalar_keeps_last_token() {
        let opt = Opt::keyword(["--n"]).ty(ArgType::Int);
        assert_eq!(
            cast_value(&opt, &Bound::Tokens(vec!["1".into(), "2".into()])).unwrap(),
            Value::Int(2)
        );
    }

    #[test]
    fn test_invalid_choice_suggests_close_match() {
        let opt = Opt::keyword(["--foo"]).choices(["staging", "prod"]);
        let err = cast_one(&opt, "stagin").unwrap_err();
        assert_eq!(err.suggestions, vec!["staging"]);
    }

    #[test]
    fn test_producer_choices_are_evaluated_once_per_cache() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let opt = Opt::positional("value").ty(ArgType::Int).choices(Choices::producer(move || {
            counter.set(counter.get() + 1);
            (0..10i64).collect::<Vec<_>>()
        }));

        let mut cache = ChoiceCache::new();
        assert_eq!(
            block_on(cast(&opt, &Bound::token("5"), &mut cache)).unwrap(),
            Value::Int(5)
        );
        let err = block_on(cast(&opt, &Bound::token("42"), &mut cache)).unwrap_err();
        assert_eq!(err.kind, CastErrorKind::InvalidChoice);
        assert_eq!(calls.get(), 1);

        // without an invocation context, producers are not consulted
        assert_eq!(cast_one(&opt, "42").unwrap(), Value::Int(42));
    }

    #[test]
    fn test_regex_choice_rejects_partial_match() {
        let opt = Opt::keyword(["--tag"]).choices(vec![Choice::regex("v[0-9]+").unwrap()]);
        assert!(cast_one(&opt, "v12").is_ok());
        let err = cast_one(&opt, "v12-beta").unwrap_err();
        assert_eq!(err.allowed, vec!["/v[0-9]+/"]);
    }

    proptest! {
        #[test]
        fn test_int_tokens_round_trip(n in any::<i64>()) {
            let opt = Opt::positional("n").ty(ArgType::Int);
            let value = cast_one(&opt, &n.to_string()).unwrap();
            prop_assert_eq!(cast_one(&opt, &value.to_token()).unwrap(), value);
        }

        #[test]
        fn test_date_tokens_round_trip(days in 0i64..200_000) {
            let base = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap();
            let date = base + chrono::Duration::days(days);
            let opt = Opt::positional("d").ty(ArgType::Date);
            let value = cast_one(&opt, &date.format(DATE_FORMAT).to_string()).unwrap();
            prop_assert_eq!(&value, &Value::Date(date));
            prop_assert_eq!(cast_one(&opt, &value.to_token()).unwrap(), value);
        }

        #[test]
        fn test_str_tokens_are_identity(s in "[a-zA-Z0-9 _./-]{0,24}") {
            let opt = Opt::positional("s");
            prop_assert_eq!(cast_one(&opt, &s).unwrap(), Value::Str(s.clone()));
        }
    }
}
