//! Suggestion list state shared with observers.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::types::CaretRange;

/// One suggestion supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Handle (mentions) or tag (hashtags), without the trigger character.
    pub handle_or_tag: SmolStr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl Item {
    pub fn new(handle_or_tag: impl Into<SmolStr>) -> Self {
        Self {
            handle_or_tag: handle_or_tag.into(),
            label: None,
            avatar_url: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<SmolStr>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_avatar(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }

    /// Label if present, else the handle.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.handle_or_tag)
    }
}

/// Observable state of one suggestion controller.
///
/// `selected_index` is in bounds whenever `visible`; a hidden state has no
/// items and an empty query.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionState {
    pub visible: bool,
    pub query: SmolStr,
    pub items: Vec<Item>,
    pub selected_index: usize,
    pub caret_range: Option<CaretRange>,
}

impl SuggestionState {
    pub fn selected_item(&self) -> Option<&Item> {
        if self.visible {
            self.items.get(self.selected_index)
        } else {
            None
        }
    }
}

/// Where a controller is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SuggestionPhase {
    /// Caret is not in a trigger context.
    #[default]
    Idle,
    /// In a trigger context with nothing shown.
    ActiveNoQuery,
    /// A fetch is scheduled or in flight and nothing is shown yet.
    Fetching,
    /// Items are visible.
    Showing,
}

impl SuggestionPhase {
    pub fn is_active(self) -> bool {
        self != SuggestionPhase::Idle
    }
}
