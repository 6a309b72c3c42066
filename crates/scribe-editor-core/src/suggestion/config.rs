//! Per-trigger suggestion configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::TriggerKind;

/// Settings for one suggestion controller.
///
/// Field names are camelCase on the wire and `debounceDelay` is milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SuggestionConfig {
    /// Trigger character; `None` uses the kind's default (`@` or `#`).
    pub trigger: Option<char>,
    /// Minimum query length before fetching.
    pub min_characters: usize,
    /// Maximum number of rows shown and navigable.
    pub max_suggestions: usize,
    #[serde(with = "millis")]
    pub debounce_delay: Duration,
    /// Fetch for an empty query (just the trigger typed).
    pub show_on_empty: bool,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            trigger: None,
            min_characters: 0,
            max_suggestions: 10,
            debounce_delay: Duration::from_millis(300),
            show_on_empty: false,
        }
    }
}

impl SuggestionConfig {
    pub fn trigger_char(&self, kind: TriggerKind) -> char {
        self.trigger.unwrap_or(kind.default_char())
    }

    /// Whether a query qualifies for a fetch.
    pub fn should_fetch(&self, query: &str) -> bool {
        if query.is_empty() {
            self.show_on_empty
        } else {
            query.chars().count() >= self.min_characters
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
