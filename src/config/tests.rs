use std::io::Write;

use serial_test::serial;

use super::*;
use crate::cache::FrontPage;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("info".to_string());
    raw.flush.home_url = "http://example.com/".to_string();

    let overrides = Overrides {
        log_level: Some("debug".to_string()),
        home_url: Some("https://example.com/".to_string()),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert_eq!(settings.flush.home_url, "https://example.com/");
    assert!(settings.flush.is_https());
}

#[test]
fn defaults_are_valid() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
    assert_eq!(settings.flush.postpages_limit, 10);
    assert_eq!(settings.flush.feed_types, vec!["rss2".to_string()]);
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = Overrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn cli_debug_purge_switches_flag_on() {
    let mut raw = RawSettings::default();
    raw.apply_overrides(&Overrides {
        debug_purge: true,
        ..Default::default()
    });
    assert!(raw.flush.debug_purge);
}

#[test]
fn invalid_log_level_is_rejected() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("loud".to_string());

    let err = Settings::from_raw(raw).unwrap_err();
    assert!(matches!(err, LoadError::Invalid { key: "logging.level", .. }));
}

#[test]
fn invalid_home_url_is_rejected() {
    let mut raw = RawSettings::default();
    raw.flush.home_url = "not a url".to_string();
    let err = Settings::from_raw(raw).unwrap_err();
    assert!(matches!(err, LoadError::Invalid { key: "flush.home_url", .. }));

    let mut raw = RawSettings::default();
    raw.flush.home_url = "ftp://example.com/".to_string();
    let err = Settings::from_raw(raw).unwrap_err();
    assert!(err.to_string().contains("unsupported scheme `ftp`"));
}

#[test]
fn zero_postpages_limit_is_rejected() {
    let mut raw = RawSettings::default();
    raw.flush.postpages_limit = 0;

    let err = Settings::from_raw(raw).unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid configuration for `flush.postpages_limit`: must be greater than zero"
    );
}

#[test]
fn invalid_sitemap_regex_is_rejected() {
    let mut raw = RawSettings::default();
    raw.flush.sitemap_regex = Some("sitemap(".to_string());
    let err = Settings::from_raw(raw).unwrap_err();
    assert!(matches!(err, LoadError::Invalid { key: "flush.sitemap_regex", .. }));

    let mut raw = RawSettings::default();
    raw.flush.sitemap_regex = Some(r"^/maps/index-\d+\.xml$".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.flush.sitemap_regex.is_some());
}

#[test]
fn parse_url_arguments() {
    let args = CliArgs::parse_from([
        "pagepurge",
        "url",
        "https://example.com/a/",
        "https://example.com/b/",
        "--group",
        "rest",
        "--log-level",
        "warn",
    ]);

    match args.command {
        Command::Url(url) => {
            assert_eq!(url.urls.len(), 2);
            assert_eq!(url.group.as_deref(), Some("rest"));
        }
        other => panic!("unexpected command: {other:?}"),
    }
    assert_eq!(args.overrides.log_level.as_deref(), Some("warn"));
}

#[test]
fn parse_group_and_global_flags() {
    let args = CliArgs::parse_from([
        "pagepurge",
        "--log-json",
        "true",
        "--home-url",
        "https://example.com/",
        "group",
        "rest",
        "sitemaps",
    ]);

    match args.command {
        Command::Group(group) => assert_eq!(group.groups, vec!["rest", "sitemaps"]),
        other => panic!("unexpected command: {other:?}"),
    }
    assert_eq!(args.overrides.log_json, Some(true));
    assert_eq!(args.overrides.home_url.as_deref(), Some("https://example.com/"));
}

#[test]
fn parse_flagless_commands() {
    assert!(matches!(
        CliArgs::parse_from(["pagepurge", "all"]).command,
        Command::All
    ));
    assert!(matches!(
        CliArgs::parse_from(["pagepurge", "variants", "--debug-purge"]).command,
        Command::Variants
    ));
}

#[test]
#[serial]
fn load_reads_explicit_config_file() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp config file");
    writeln!(
        file,
        r#"
[logging]
level = "debug"

[flush]
purge_terms = true
postpages_limit = 3
front_page = "page"
home_url = "https://blog.example.com/"
device_groups = ["mobile"]
"#
    )
    .expect("write config");

    let path = file.path().to_string_lossy().into_owned();
    let args = CliArgs::parse_from(["pagepurge", "--config-file", path.as_str(), "all"]);
    let settings = load(&args).expect("settings load");

    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert!(settings.flush.purge_terms);
    assert!(settings.flush.purge_post);
    assert_eq!(settings.flush.postpages_limit, 3);
    assert_eq!(settings.flush.front_page, FrontPage::Page);
    assert_eq!(settings.flush.device_groups, vec!["mobile".to_string()]);
}

#[test]
#[serial]
fn load_fails_for_missing_config_file() {
    let args = CliArgs::parse_from([
        "pagepurge",
        "--config-file",
        "/nonexistent/pagepurge.toml",
        "all",
    ]);
    let err = load(&args).unwrap_err();
    assert!(matches!(err, LoadError::Build(_)));
}
