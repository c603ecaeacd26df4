//! Structured error context
//!
//! A [`Description`] is an optional summary plus an ordered list of key/value
//! pairs. It travels with every [`ApiError`](crate::api_error::ApiError) and is
//! used to render the internal reason of a declared error contract.
//!
//! ```rust
//! use orz_web::description::Description;
//!
//! let desc = Description::summary("order rejected")
//!     .with("order_id", 42)
//!     .with("state", "closed");
//! assert_eq!(desc.to_string(), "order rejected (order_id=42, state=closed)");
//! ```

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::LazyLock;

/// Matches `{name}` and `%s` placeholders in reason templates
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Za-z0-9_.\-]+)\}|%s").expect("placeholder regex is valid")
});

/// Ordered, structured context attached to an error
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Description {
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    values: Vec<(String, Value)>,
}

impl Description {
    /// Empty description
    pub fn new() -> Self {
        Self::default()
    }

    /// Description with a summary line
    pub fn summary(summary: impl Into<String>) -> Self {
        let summary = summary.into();
        Self {
            summary: (!summary.trim().is_empty()).then_some(summary),
            values: Vec::new(),
        }
    }

    /// Append a key/value pair
    ///
    /// Values are stored as JSON. A value that cannot be represented as JSON
    /// is kept as its serialization error message.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value)
            .unwrap_or_else(|e| Value::String(format!("<unserializable: {e}>")));
        self.values.push((key.into(), value));
        self
    }

    /// Append all values of `other`, adopting its summary if this one has none
    #[must_use]
    pub fn merge(mut self, other: &Description) -> Self {
        if self.summary.is_none() {
            self.summary = other.summary.clone();
        }
        self.values.extend(other.values.iter().cloned());
        self
    }

    /// The summary line, if any
    pub fn summary_text(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// First value stored under `key`
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// All key/value pairs in insertion order
    pub fn values(&self) -> &[(String, Value)] {
        &self.values
    }

    /// True when there is neither a summary nor any value
    pub fn is_empty(&self) -> bool {
        self.summary.is_none() && self.values.is_empty()
    }

    /// Render a reason template against this description
    ///
    /// `{key}` placeholders are replaced by the value stored under `key`.
    /// Each `%s` takes the next value not consumed by a named placeholder.
    /// Values left over are appended in brackets, so no context is lost.
    ///
    /// ```rust
    /// use orz_web::description::Description;
    ///
    /// let desc = Description::new().with("user", "u1").with("limit", 3);
    /// assert_eq!(desc.render("{user} exceeded %s"), "u1 exceeded 3");
    /// assert_eq!(desc.render("quota exceeded"), "quota exceeded [user=u1, limit=3]");
    /// ```
    pub fn render(&self, template: &str) -> String {
        let position = |key: &str| self.values.iter().position(|(k, _)| k == key);

        // Named values are reserved before any `%s` takes one
        let mut used = vec![false; self.values.len()];
        for caps in PLACEHOLDER.captures_iter(template) {
            if let Some(index) = caps.get(1).and_then(|key| position(key.as_str())) {
                used[index] = true;
            }
        }

        let mut rendered = PLACEHOLDER
            .replace_all(template, |caps: &regex::Captures<'_>| match caps.get(1) {
                Some(key) => match position(key.as_str()) {
                    Some(index) => display_value(&self.values[index].1),
                    None => caps[0].to_string(),
                },
                None => match used.iter().position(|u| !u) {
                    Some(index) => {
                        used[index] = true;
                        display_value(&self.values[index].1)
                    }
                    None => caps[0].to_string(),
                },
            })
            .into_owned();

        let leftover: Vec<String> = self
            .values
            .iter()
            .zip(used)
            .filter(|(_, used)| !used)
            .map(|((k, v), _)| format!("{k}={}", display_value(v)))
            .collect();
        if !leftover.is_empty() {
            rendered.push_str(" [");
            rendered.push_str(&leftover.join(", "));
            rendered.push(']');
        }

        rendered
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values = self
            .values
            .iter()
            .map(|(k, v)| format!("{k}={}", display_value(v)))
            .collect::<Vec<_>>()
            .join(", ");

        match (&self.summary, values.is_empty()) {
            (Some(summary), true) => write!(f, "{summary}"),
            (Some(summary), false) => write!(f, "{summary} ({values})"),
            (None, _) => write!(f, "{values}"),
        }
    }
}
