//! Tests for the logging system

use super::*;
use proptest::prelude::*;

#[test]
fn test_log_level_display() {
    assert_eq!(LogLevel::Trace.to_string(), "trace");
    assert_eq!(LogLevel::Debug.to_string(), "debug");
    assert_eq!(LogLevel::Info.to_string(), "info");
    assert_eq!(LogLevel::Warn.to_string(), "warn");
    assert_eq!(LogLevel::Error.to_string(), "error");
}

#[test]
fn test_logging_config_default() {
    let config = LoggingConfig::default();
    assert_eq!(config.level, LogLevel::Warn);
    assert_eq!(config.format, LogFormat::Text);
    assert!(config.honor_env);
    assert!(config.show_target);
    assert!(!config.show_location);
    assert!(config.directives.is_empty());
}

#[test]
fn test_logging_config_development() {
    let config = LoggingConfig::development();
    assert_eq!(config.level, LogLevel::Warn);
    assert_eq!(config.directives, vec!["content_action=debug".to_string()]);
    assert!(config.show_location);
    assert!(config.ansi);
}

#[test]
fn test_cli_verbosity_levels() {
    assert_eq!(LoggingConfig::cli(0).level, LogLevel::Warn);
    assert_eq!(LoggingConfig::cli(1).level, LogLevel::Info);
    assert_eq!(LoggingConfig::cli(2).level, LogLevel::Debug);
    assert_eq!(LoggingConfig::cli(7).level, LogLevel::Trace);
    assert!(!LoggingConfig::cli(0).show_target);
    assert!(LoggingConfig::cli(2).show_target);
}

#[test]
fn test_env_filter_with_directives() {
    let config = LoggingConfig {
        honor_env: false,
        ..LoggingConfig::development()
    };
    assert!(LoggingSystem::build_env_filter(&config).is_ok());
}

#[test]
fn test_env_filter_rejects_bad_directive() {
    let config = LoggingConfig {
        honor_env: false,
        directives: vec!["content_action=verbose".to_string()],
        ..LoggingConfig::default()
    };
    assert!(matches!(
        LoggingSystem::build_env_filter(&config),
        Err(LoggingError::InvalidDirective { .. })
    ));
}

#[test]
fn test_logging_config_serialization() {
    let config = LoggingConfig {
        level: LogLevel::Info,
        format: LogFormat::Json,
        ..LoggingConfig::default()
    };
    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains("\"info\""));
    assert!(json.contains("\"json\""));

    let parsed: LoggingConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.level, LogLevel::Info);
    assert_eq!(parsed.format, LogFormat::Json);
}

#[test]
fn test_logging_config_missing_fields_use_defaults() {
    let parsed: LoggingConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(parsed.level, LogLevel::Warn);
    assert!(parsed.show_target);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_verbosity_is_monotone(a in 0u8..10, b in 0u8..10) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        // more -v never selects a less verbose level
        prop_assert!(LogLevel::from_verbosity(hi) <= LogLevel::from_verbosity(lo));
    }
}
