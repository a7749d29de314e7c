//! Topic addressing
//!
//! A `Topic` names the origin of a log line: the application, the process
//! within it, and the host it runs on. A `TopicMatcher` holds one regex per
//! field and decides whether a topic is of interest to a subscriber.
//!
//! # Matching Rules
//!
//! - Each field pattern is a regex with search semantics (`bar$` matches
//!   `"open bar"`); anchor the pattern to require a full match
//! - An empty pattern matches any value, so the default matcher is a firehose
//! - A pattern that fails to compile matches nothing for its field
//! - All three fields must match
//!
//! # Example
//!
//! ```
//! use logwire_protocol::{Topic, TopicMatcher};
//!
//! let topic = Topic::new("web", "api", "host1").unwrap();
//! let matcher = TopicMatcher::from_globs("web", "*", "host?");
//! assert!(matcher.matches(&topic));
//! ```

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{FORBIDDEN_TOPIC_CHARS, ProtocolError, Result};

/// Origin of a log record: (app, proc, host)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Topic {
    app: String,
    #[serde(rename = "proc")]
    process: String,
    host: String,
}

impl Topic {
    /// Create a validated topic
    ///
    /// # Errors
    ///
    /// Returns `ForbiddenCharacter` if any field contains `:` or a line break.
    pub fn new(
        app: impl Into<String>,
        process: impl Into<String>,
        host: impl Into<String>,
    ) -> Result<Self> {
        let topic = Self::unchecked(app, process, host);
        validate_field("app", &topic.app)?;
        validate_field("proc", &topic.process)?;
        validate_field("host", &topic.host)?;
        Ok(topic)
    }

    /// Create a topic without validating field contents
    ///
    /// Only use for topics that are matched but never rendered into a key.
    pub fn unchecked(
        app: impl Into<String>,
        process: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        Self {
            app: app.into(),
            process: process.into(),
            host: host.into(),
        }
    }

    #[inline]
    pub fn app(&self) -> &str {
        &self.app
    }

    #[inline]
    pub fn process(&self) -> &str {
        &self.process
    }

    #[inline]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Render the external substrate key `username:app:proc:host`
    pub fn key(&self, username: &str) -> String {
        format!("{}:{}:{}:{}", username, self.app, self.process, self.host)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]@{}", self.app, self.process, self.host)
    }
}

fn validate_field(field: &'static str, value: &str) -> Result<()> {
    if value.contains(FORBIDDEN_TOPIC_CHARS) {
        return Err(ProtocolError::ForbiddenCharacter { field });
    }
    Ok(())
}

/// A single field pattern, compiled once
#[derive(Debug, Clone)]
struct FieldPattern {
    source: String,
    /// None when the source failed to compile; such a field never matches
    compiled: Option<Regex>,
}

impl FieldPattern {
    fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let compiled = Regex::new(&source).ok();
        Self { source, compiled }
    }

    #[inline]
    fn matches(&self, value: &str) -> bool {
        self.compiled.as_ref().is_some_and(|re| re.is_match(value))
    }
}

/// Per-field regex patterns deciding whether a topic is of interest
#[derive(Debug, Clone)]
pub struct TopicMatcher {
    app: FieldPattern,
    process: FieldPattern,
    host: FieldPattern,
}

impl TopicMatcher {
    /// Create a matcher from three regex patterns
    ///
    /// Invalid patterns are accepted and make the matcher match nothing.
    pub fn new(
        app_pattern: impl Into<String>,
        proc_pattern: impl Into<String>,
        host_pattern: impl Into<String>,
    ) -> Self {
        Self {
            app: FieldPattern::new(app_pattern),
            process: FieldPattern::new(proc_pattern),
            host: FieldPattern::new(host_pattern),
        }
    }

    /// Create a matcher from glob patterns (`*` and `?`), anchored per field
    pub fn from_globs(app_glob: &str, proc_glob: &str, host_glob: &str) -> Self {
        Self::new(
            glob_to_regex(app_glob),
            glob_to_regex(proc_glob),
            glob_to_regex(host_glob),
        )
    }

    /// Check if a topic matches every field pattern
    #[inline]
    pub fn matches(&self, topic: &Topic) -> bool {
        self.app.matches(&topic.app)
            && self.process.matches(&topic.process)
            && self.host.matches(&topic.host)
    }

    /// True when all three patterns are empty (matches every topic)
    pub fn is_match_all(&self) -> bool {
        self.app.source.is_empty() && self.process.source.is_empty() && self.host.source.is_empty()
    }

    pub fn app_pattern(&self) -> &str {
        &self.app.source
    }

    pub fn proc_pattern(&self) -> &str {
        &self.process.source
    }

    pub fn host_pattern(&self) -> &str {
        &self.host.source
    }
}

impl Default for TopicMatcher {
    fn default() -> Self {
        Self::new("", "", "")
    }
}

/// Translate a glob into an anchored regex
///
/// - `*` matches any sequence of characters (including empty)
/// - `?` matches exactly one character
/// - everything else is literal
///
/// An empty glob becomes the empty (match-all) pattern.
pub fn glob_to_regex(glob: &str) -> String {
    if glob.is_empty() {
        return String::new();
    }

    let mut out = String::with_capacity(glob.len() + 8);
    out.push('^');
    let mut literal = String::new();
    for c in glob.chars() {
        match c {
            '*' | '?' => {
                out.push_str(&regex::escape(&literal));
                literal.clear();
                out.push_str(if c == '*' { ".*" } else { "." });
            }
            _ => literal.push(c),
        }
    }
    out.push_str(&regex::escape(&literal));
    out.push('$');
    out
}
