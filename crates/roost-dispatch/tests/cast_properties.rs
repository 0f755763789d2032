use chrono::{FixedOffset, NaiveDate, TimeZone};
use proptest::prelude::*;
use roost_dispatch::{cast_value, ArgType, Bound, CastErrorKind, Choice, Choices, Opt, Value};
use uuid::Uuid;

fn cast(opt: &Opt, token: &str) -> Result<Value, roost_dispatch::CastError> {
    cast_value(opt, &Bound::token(token))
}

fn round_trips(opt: &Opt, token: &str) -> Result<(), TestCaseError> {
    let value = cast(opt, token).map_err(|e| TestCaseError::fail(e.to_string()))?;
    let again = cast(opt, &value.to_token()).map_err(|e| TestCaseError::fail(e.to_string()))?;
    prop_assert_eq!(again, value);
    Ok(())
}

proptest! {
    #[test]
    fn test_float_tokens_round_trip(x in -1.0e12f64..1.0e12f64) {
        round_trips(&Opt::positional("x").ty(ArgType::Float), &x.to_string())?;
    }

    #[test]
    fn test_naive_datetime_tokens_round_trip(
        days in 0i64..100_000,
        secs in 0u32..86_400,
        millis in 0u32..1000,
    ) {
        let date = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap() + chrono::Duration::days(days);
        let dt = date
            .and_hms_milli_opt(secs / 3600, (secs / 60) % 60, secs % 60, millis)
            .unwrap();
        let opt = Opt::positional("at").ty(ArgType::DateTime);
        let value = cast(&opt, &dt.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()).unwrap();
        prop_assert_eq!(&value, &Value::DateTime(dt));
        round_trips(&opt, &value.to_token())?;
    }

    #[test]
    fn test_zoned_datetime_tokens_round_trip(
        secs in 0i64..4_000_000_000,
        offset_hours in -12i32..=12,
    ) {
        let tz = FixedOffset::east_opt(offset_hours * 3600).unwrap();
        let dt = tz.timestamp_opt(secs, 0).unwrap();
        round_trips(&Opt::positional("at").ty(ArgType::DateTime), &dt.to_rfc3339())?;
    }

    #[test]
    fn test_uuid_tokens_round_trip(bits in any::<u128>()) {
        let id = Uuid::from_u128(bits);
        let opt = Opt::positional("id").ty(ArgType::Uuid);
        prop_assert_eq!(cast(&opt, &id.to_string()).unwrap(), Value::Uuid(id));
        round_trips(&opt, &id.simple().to_string())?;
    }

    #[test]
    fn test_dict_tokens_round_trip(
        entries in prop::collection::btree_map("[a-z]{1,8}", any::<i64>(), 0..6),
    ) {
        let token = serde_json::to_string(&entries).unwrap();
        round_trips(&Opt::positional("cfg").ty(ArgType::Dict), &token)?;
    }

    #[test]
    fn test_int_lists_keep_their_order(items in prop::collection::vec(any::<i32>(), 1..8)) {
        let opt = Opt::positional("n").ty(ArgType::list_of(ArgType::Int));
        let tokens: Vec<String> = items.iter().map(i32::to_string).collect();
        let value = cast_value(&opt, &Bound::Tokens(tokens)).unwrap();
        let expected: Vec<Value> = items.iter().map(|i| Value::Int(i64::from(*i))).collect();
        prop_assert_eq!(value, Value::List(expected));
    }
}

fn env_choices() -> Choices {
    Choices::values([
        Choice::from("prod"),
        Choice::from("staging"),
        Choice::regex(r"dev-\d+").unwrap(),
    ])
}

#[test]
fn test_regex_choices_match_whole_token() {
    let opt = Opt::keyword(["--env"]).choices(env_choices());

    assert_eq!(cast(&opt, "dev-42").unwrap(), Value::from("dev-42"));
    assert_eq!(cast(&opt, "prod").unwrap(), Value::from("prod"));

    let err = cast(&opt, "dev-").unwrap_err();
    assert_eq!(err.kind, CastErrorKind::InvalidChoice);
    assert_eq!(err.allowed, vec!["prod", "staging", "/dev-\\d+/"]);

    assert_eq!(cast(&opt, "xdev-1").unwrap_err().kind, CastErrorKind::InvalidChoice);
    assert_eq!(cast(&opt, "DEV-1").unwrap_err().kind, CastErrorKind::InvalidChoice);
}

#[test]
fn test_case_insensitive_choices_return_canonical_value() {
    let opt = Opt::keyword(["--env"])
        .choices(env_choices())
        .case_sensitive(false);

    assert_eq!(cast(&opt, "PROD").unwrap(), Value::from("prod"));
    assert_eq!(cast(&opt, "Staging").unwrap(), Value::from("staging"));
}

#[test]
fn test_invalid_choice_suggests_close_values() {
    let opt = Opt::keyword(["--env"]).choices(env_choices());
    let err = cast(&opt, "prd").unwrap_err();
    assert_eq!(err.suggestions, vec!["prod"]);
}

#[test]
fn test_defaults_skip_choice_validation() {
    let opt = Opt::keyword(["--env"])
        .choices(env_choices())
        .default("local");
    assert_eq!(cast_value(&opt, &Bound::Absent).unwrap(), Value::from("local"));
}

#[test]
fn test_list_items_are_checked_against_choices() {
    let opt = Opt::keyword(["--env"])
        .ty(ArgType::list_of(ArgType::Str))
        .choices(env_choices());

    let ok = cast_value(&opt, &Bound::Tokens(vec!["prod".into(), "dev-1".into()])).unwrap();
    assert_eq!(ok, Value::List(vec![Value::from("prod"), Value::from("dev-1")]));

    let err = cast_value(&opt, &Bound::Tokens(vec!["prod".into(), "qa".into()])).unwrap_err();
    assert_eq!(err.kind, CastErrorKind::InvalidChoice);
}

#[test]
fn test_path_existence_is_checked() {
    let dir = tempfile::tempdir().unwrap();
    let existing = dir.path().to_string_lossy().to_string();
    let missing = dir.path().join("missing.txt").to_string_lossy().to_string();

    let opt = Opt::positional("file").ty(ArgType::Path);
    assert!(cast(&opt, &existing).is_ok());
    assert_eq!(cast(&opt, &missing).unwrap_err().kind, CastErrorKind::PathNotFound);

    let lenient = Opt::positional("file").ty(ArgType::Path).check_exists(false);
    assert!(cast(&lenient, &missing).is_ok());
    assert!(cast(&Opt::positional("file").ty(ArgType::MaybePath), &missing).is_ok());
}
