//! Integration tests for logging system

use bridge_traits::time::LogLevel;
use core_runtime::logging::{redact_if_sensitive, strip_path, LogFormat, LoggingConfig};

#[test]
fn test_logging_configuration() {
    // Logging can only be initialized once per process, so only the builder is exercised
    let config = LoggingConfig::default()
        .with_format(LogFormat::Json)
        .with_level(LogLevel::Debug)
        .with_pii_redaction(true)
        .with_filter("core_storage=debug,core_worker=trace")
        .with_spans(true);

    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.level, LogLevel::Debug);
    assert!(config.redact_pii);
    assert!(config.enable_spans);
    assert_eq!(
        config.filter.as_deref(),
        Some("core_storage=debug,core_worker=trace")
    );
}

#[test]
fn test_redaction_of_stored_values() {
    assert_eq!(redact_if_sensitive("payload", "{\"score\":7}"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("encryption_key", "xyz"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("access_token", "abc"), "[REDACTED]");
}

#[test]
fn test_redaction_of_emails() {
    let redacted = redact_if_sensitive("owner", "ada@quiz.example");

    assert!(redacted.starts_with('a'));
    assert!(redacted.contains("[REDACTED]"));
    assert!(!redacted.contains("quiz.example"));
}

#[test]
fn test_plain_values_pass_through() {
    assert_eq!(redact_if_sensitive("key", "offline_quizzes"), "offline_quizzes");
    assert_eq!(redact_if_sensitive("version", "quiz-offline-v1"), "quiz-offline-v1");
    assert_eq!(redact_if_sensitive("url", "/api/quizzes"), "/api/quizzes");
}

#[test]
fn test_path_stripping() {
    assert_eq!(
        strip_path("/home/ada/.local/share/quiz-offline-core/offline-store.json"),
        "offline-store.json"
    );
    assert_eq!(
        strip_path("C:\\Users\\Ada\\AppData\\offline-store.json"),
        "offline-store.json"
    );
    assert_eq!(strip_path("offline-store.json"), "offline-store.json");
    assert_eq!(strip_path("/var/log/"), "");
    assert_eq!(strip_path(""), "");
}

#[test]
fn test_format_selection() {
    #[cfg(debug_assertions)]
    assert_eq!(LoggingConfig::default().format, LogFormat::Pretty);

    #[cfg(not(debug_assertions))]
    assert_eq!(LoggingConfig::default().format, LogFormat::Json);
}
