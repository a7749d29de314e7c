//! Tests for topics and topic matchers

use crate::{ProtocolError, Topic, TopicMatcher, glob_to_regex};

// =============================================================================
// Topic tests
// =============================================================================

#[test]
fn test_topic_new_valid() {
    let topic = Topic::new("web", "api", "host1").unwrap();
    assert_eq!(topic.app(), "web");
    assert_eq!(topic.process(), "api");
    assert_eq!(topic.host(), "host1");
}

#[test]
fn test_topic_rejects_colon() {
    let result = Topic::new("web:prod", "api", "host1");
    assert!(matches!(
        result,
        Err(ProtocolError::ForbiddenCharacter { field: "app" })
    ));
}

#[test]
fn test_topic_rejects_newline_in_each_field() {
    assert!(matches!(
        Topic::new("web", "a\npi", "host1"),
        Err(ProtocolError::ForbiddenCharacter { field: "proc" })
    ));
    assert!(matches!(
        Topic::new("web", "api", "host\r1"),
        Err(ProtocolError::ForbiddenCharacter { field: "host" })
    ));
}

#[test]
fn test_topic_allows_empty_fields() {
    assert!(Topic::new("", "", "").is_ok());
}

#[test]
fn test_topic_key() {
    let topic = Topic::new("web", "api", "host1").unwrap();
    assert_eq!(topic.key("alice"), "alice:web:api:host1");
    assert_eq!(topic.key(""), ":web:api:host1");
}

#[test]
fn test_topic_display() {
    let topic = Topic::new("web", "api", "host1").unwrap();
    assert_eq!(topic.to_string(), "web[api]@host1");
}

#[test]
fn test_topics_distinct_when_any_field_differs() {
    let a = Topic::unchecked("web", "api", "h1");
    assert_ne!(a, Topic::unchecked("web", "api", "h2"));
    assert_ne!(a, Topic::unchecked("web", "worker", "h1"));
    assert_ne!(a, Topic::unchecked("db", "api", "h1"));
    assert_eq!(a, Topic::unchecked("web", "api", "h1"));
}

#[test]
fn test_topic_serializes_proc_field_name() {
    let topic = Topic::unchecked("web", "api", "h1");
    let json = serde_json::to_string(&topic).unwrap();
    assert_eq!(json, r#"{"app":"web","proc":"api","host":"h1"}"#);
}

// =============================================================================
// Matcher tests
// =============================================================================

#[test]
fn test_matcher_search_semantics() {
    let matcher = TopicMatcher::new("bar$", "^baz", "");

    assert!(matcher.matches(&Topic::unchecked("bar", "baz", "")));
    assert!(matcher.matches(&Topic::unchecked("open bar", "baz-ness", "")));
}

#[test]
fn test_matcher_empty_matches_everything() {
    let matcher = TopicMatcher::default();
    assert!(matcher.is_match_all());

    assert!(matcher.matches(&Topic::default()));
    assert!(matcher.matches(&Topic::unchecked("will", "do", "anything")));
}

#[test]
fn test_matcher_rejects_on_any_field() {
    let matcher = TopicMatcher::new("bar$", "^baz", "foo.*");

    assert!(!matcher.matches(&Topic::unchecked("bar", "baz", "fu not")));
    assert!(!matcher.matches(&Topic::unchecked("bart", "baz", "foo")));
    assert!(!matcher.matches(&Topic::unchecked("bar", "haz baz", "foo")));
    assert!(matcher.matches(&Topic::unchecked("bar", "baz", "foo")));
}

#[test]
fn test_matcher_host_pattern_is_checked() {
    let matcher = TopicMatcher::new("", "", "^db-");
    assert!(matcher.matches(&Topic::unchecked("web", "api", "db-1")));
    assert!(!matcher.matches(&Topic::unchecked("web", "api", "web-1")));
}

#[test]
fn test_matcher_invalid_pattern_matches_nothing() {
    let matcher = TopicMatcher::new("(unclosed", "", "");
    assert!(!matcher.is_match_all());

    assert!(!matcher.matches(&Topic::default()));
    assert!(!matcher.matches(&Topic::unchecked("(unclosed", "x", "y")));
}

#[test]
fn test_matcher_bare_star_regex_is_invalid() {
    // A bare `*` is not a valid regex; SUB converts globs before compiling
    let matcher = TopicMatcher::new("*", "", "");
    assert!(!matcher.matches(&Topic::unchecked("web", "api", "h1")));
}

#[test]
fn test_matcher_pattern_accessors() {
    let matcher = TopicMatcher::new("a", "b", "c");
    assert_eq!(matcher.app_pattern(), "a");
    assert_eq!(matcher.proc_pattern(), "b");
    assert_eq!(matcher.host_pattern(), "c");
}

// =============================================================================
// Glob tests
// =============================================================================

#[test]
fn test_glob_to_regex_translation() {
    assert_eq!(glob_to_regex(""), "");
    assert_eq!(glob_to_regex("*"), "^.*$");
    assert_eq!(glob_to_regex("web"), "^web$");
    assert_eq!(glob_to_regex("host?"), "^host.$");
    assert_eq!(glob_to_regex("a.b*"), r"^a\.b.*$");
}

#[test]
fn test_from_globs_star_matches_anything() {
    let matcher = TopicMatcher::from_globs("web", "api", "*");
    assert!(matcher.matches(&Topic::unchecked("web", "api", "host1")));
    assert!(matcher.matches(&Topic::unchecked("web", "api", "")));
    assert!(!matcher.matches(&Topic::unchecked("web2", "api", "host1")));
}

#[test]
fn test_from_globs_is_anchored() {
    let matcher = TopicMatcher::from_globs("web", "*", "*");
    assert!(!matcher.matches(&Topic::unchecked("my-web", "api", "h")));
    assert!(!matcher.matches(&Topic::unchecked("webapp", "api", "h")));
}

#[test]
fn test_from_globs_escapes_regex_metacharacters() {
    let matcher = TopicMatcher::from_globs("a+b", "(x)", "*");
    assert!(matcher.matches(&Topic::unchecked("a+b", "(x)", "h")));
    assert!(!matcher.matches(&Topic::unchecked("aab", "x", "h")));
}

#[test]
fn test_from_globs_question_mark() {
    let matcher = TopicMatcher::from_globs("*", "*", "host?");
    assert!(matcher.matches(&Topic::unchecked("a", "b", "host1")));
    assert!(!matcher.matches(&Topic::unchecked("a", "b", "host")));
    assert!(!matcher.matches(&Topic::unchecked("a", "b", "host12")));
}
