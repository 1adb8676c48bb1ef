use pwdash::logging::{LogContext, get_logger_with_context, parse_line_level, parse_log_level};
use tracing::Level;

#[test]
fn should_emit_filters_below_runtime_level() {
    use pwdash::logging::{set_web_log_level, should_emit_to_web};
    // Runtime level WARN: INFO lines are filtered out, ERROR passes
    set_web_log_level(Level::WARN);
    assert!(!should_emit_to_web(" INFO message"));
    assert!(should_emit_to_web(" ERROR something"));
    set_web_log_level(Level::INFO);
}

#[test]
fn line_levels_from_plain_and_json() {
    assert_eq!(
        parse_line_level("2026-01-01T00:00:00Z  WARN pwdash::controller: /soc failed"),
        Some(Level::WARN)
    );
    assert_eq!(
        parse_line_level(r#"{"level":"DEBUG","fields":{"message":"cycle"}}"#),
        Some(Level::DEBUG)
    );
    assert!(parse_log_level("verbose").is_err());
}

#[test]
fn activation_context_carries_id() {
    let ctx = LogContext::new("controller").with_activation_id("a-1".to_string());
    let logger = get_logger_with_context(ctx);
    assert_eq!(logger.context().activation_id.as_deref(), Some("a-1"));
    logger.info("context test line");
}
