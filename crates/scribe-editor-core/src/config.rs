//! Editor configuration.
//!
//! Loaded from JSON (or a JS object on the wasm side) with camelCase keys.
//! Every field has a default, so `{}` is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::scanner::is_identifier_char;
use crate::suggestion::SuggestionConfig;
use crate::types::TriggerKind;

/// Placement of the suggestion overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OverlayConfig {
    /// Gap in px between the caret line and the top of the list.
    pub offset_y: f64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self { offset_y: 4.0 }
    }
}

/// Top-level configuration for one editor instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    pub mention: SuggestionConfig,
    pub hashtag: SuggestionConfig,
    pub overlay: OverlayConfig,
}

impl EditorConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn suggestion(&self, kind: TriggerKind) -> &SuggestionConfig {
        match kind {
            TriggerKind::Mention => &self.mention,
            TriggerKind::Hashtag => &self.hashtag,
        }
    }

    pub fn trigger_char(&self, kind: TriggerKind) -> char {
        self.suggestion(kind).trigger_char(kind)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for kind in TriggerKind::ALL {
            let trigger = self.trigger_char(kind);
            if trigger.is_whitespace() || is_identifier_char(trigger) {
                return Err(ConfigError::Invalid(format!(
                    "{kind} trigger {trigger:?} cannot be whitespace or an identifier character"
                )));
            }
            if self.suggestion(kind).max_suggestions == 0 {
                return Err(ConfigError::Invalid(format!(
                    "{kind} maxSuggestions must be at least 1"
                )));
            }
        }

        let mention = self.trigger_char(TriggerKind::Mention);
        if mention == self.trigger_char(TriggerKind::Hashtag) {
            return Err(ConfigError::Invalid(format!(
                "mention and hashtag share the trigger {mention:?}"
            )));
        }
        if !self.overlay.offset_y.is_finite() {
            return Err(ConfigError::Invalid("overlay offsetY must be finite".into()));
        }
        Ok(())
    }
}
