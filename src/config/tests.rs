use clap::Parser;

use super::*;

#[test]
fn defaults_resolve_without_any_source() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
    assert_eq!(settings.search.url.as_str(), "http://127.0.0.1:9200/");
    assert_eq!(settings.search.timeout, Duration::from_secs(10));
    assert_eq!(settings.graphql.default_limit.get(), 10);
    assert_eq!(settings.graphql.default_sort_field, "_score");
    assert_eq!(settings.graphql.default_sort_order, SortOrder::Desc);
    assert!(!settings.graphql.strict_filters);
    assert_eq!(settings.cache.entry_limit, DEFAULT_CACHE_ENTRY_LIMIT);
    assert_eq!(settings.sites.root, PathBuf::from("sites"));
    assert_eq!(settings.sites.fallback_site, "default");
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("info".to_string());
    raw.search.url = Some("http://search.internal:9200".to_string());

    let overrides = CommonOverrides {
        log_level: Some("debug".to_string()),
        search_url: Some("http://localhost:9201".to_string()),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert_eq!(settings.search.url.port(), Some(9201));
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    raw.apply_overrides(&CommonOverrides {
        log_json: Some(true),
        ..Default::default()
    });

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn sort_order_is_parsed_case_insensitively() {
    let mut raw = RawSettings::default();
    raw.graphql.default_sort_order = Some("asc".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.graphql.default_sort_order, SortOrder::Asc);
}

#[test]
fn unknown_sort_order_is_rejected() {
    let mut raw = RawSettings::default();
    raw.graphql.default_sort_order = Some("sideways".to_string());

    let err = Settings::from_raw(raw).expect_err("sort order must be validated");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "graphql.default_sort_order",
            ..
        }
    ));
}

#[test]
fn zero_default_limit_is_rejected() {
    let mut raw = RawSettings::default();
    raw.graphql.default_limit = Some(0);

    let err = Settings::from_raw(raw).expect_err("limit must be positive");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "graphql.default_limit",
            ..
        }
    ));
}

#[test]
fn zero_search_timeout_is_rejected() {
    let mut raw = RawSettings::default();
    raw.search.timeout_seconds = Some(0);

    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn invalid_search_url_is_rejected() {
    let mut raw = RawSettings::default();
    raw.search.url = Some("not a url".to_string());

    let err = Settings::from_raw(raw).expect_err("url must parse");
    assert!(matches!(err, LoadError::Invalid { key: "search.url", .. }));
}

#[test]
fn index_pattern_substitutes_site() {
    let mut raw = RawSettings::default();
    raw.search.index_pattern = Some("{site}-authoring".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.search.index_for("editorial"), "editorial-authoring");
}

#[test]
fn parse_warm_arguments() {
    let args = CliArgs::try_parse_from(["lectern", "warm", "editorial", "--switch"])
        .expect("warm arguments should parse");

    match args.command {
        Command::Warm(warm) => {
            assert_eq!(warm.site, "editorial");
            assert!(warm.switch_cache);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn parse_query_arguments_with_overrides() {
    let args = CliArgs::try_parse_from([
        "lectern",
        "query",
        "editorial",
        "query.json",
        "--search-url",
        "http://localhost:9200",
        "--log-json",
        "true",
    ])
    .expect("query arguments should parse");

    match args.command {
        Command::Query(query) => {
            assert_eq!(query.site, "editorial");
            assert_eq!(query.document, PathBuf::from("query.json"));
            assert_eq!(
                query.overrides.search_url.as_deref(),
                Some("http://localhost:9200")
            );
            assert_eq!(query.overrides.log_json, Some(true));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
#[serial_test::serial]
fn file_then_environment_then_cli() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("lectern.toml");
    std::fs::write(
        &path,
        "[search]\nurl = \"http://file:9200\"\n\n[graphql]\ndefault_limit = 5\ndefault_sort_field = \"date_dt\"\n",
    )
    .expect("config file");

    let args = CliArgs::try_parse_from([
        "lectern",
        "--config-file",
        path.to_str().expect("utf-8 path"),
        "sites",
        "--search-url",
        "http://cli:9200",
    ])
    .expect("sites arguments should parse");

    // SAFETY: serialized with every other test touching the process environment.
    unsafe { std::env::set_var("LECTERN__GRAPHQL__DEFAULT_LIMIT", "25") };
    let loaded = load(&args);
    unsafe { std::env::remove_var("LECTERN__GRAPHQL__DEFAULT_LIMIT") };

    let settings = loaded.expect("valid settings");
    assert_eq!(settings.search.url.host_str(), Some("cli"));
    assert_eq!(settings.graphql.default_limit.get(), 25);
    assert_eq!(settings.graphql.default_sort_field, "date_dt");
}

#[test]
#[serial_test::serial]
fn missing_explicit_config_file_is_an_error() {
    let args = CliArgs::try_parse_from([
        "lectern",
        "--config-file",
        "/nonexistent/lectern.toml",
        "sites",
    ])
    .expect("sites arguments should parse");

    assert!(matches!(load(&args), Err(LoadError::Build(_))));
}
