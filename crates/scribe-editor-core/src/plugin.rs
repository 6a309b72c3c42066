//! Plugin registry.
//!
//! A plugin is a named bag of capabilities: the trigger kinds it suggests for
//! and the mark kinds it highlights. The registry is an ordinary value owned by
//! the orchestrator; disabling a plugin turns its kinds off for that editor
//! only.

use smol_str::SmolStr;

use crate::error::PluginError;
use crate::types::{MarkKind, TriggerKind};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub triggers: Vec<TriggerKind>,
    pub marks: Vec<MarkKind>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plugin {
    pub name: SmolStr,
    pub description: SmolStr,
    pub enabled: bool,
    pub capabilities: Capabilities,
}

impl Plugin {
    pub fn new(name: impl Into<SmolStr>, capabilities: Capabilities) -> Self {
        Self {
            name: name.into(),
            description: SmolStr::default(),
            enabled: true,
            capabilities,
        }
    }

    pub fn with_description(mut self, description: impl Into<SmolStr>) -> Self {
        self.description = description.into();
        self
    }

    /// Built-in plugin for one trigger kind and its mark.
    pub fn builtin(kind: TriggerKind) -> Self {
        let description = match kind {
            TriggerKind::Mention => "Highlight @handles and suggest people",
            TriggerKind::Hashtag => "Highlight #tags and suggest topics",
        };
        Self::new(
            kind.mark_kind().name(),
            Capabilities {
                triggers: vec![kind],
                marks: vec![kind.mark_kind()],
            },
        )
        .with_description(description)
    }
}

/// Ordered set of plugins, unique by name.
#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    plugins: Vec<Plugin>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the `mention` and `hashtag` plugins, both enabled.
    pub fn with_builtins() -> Self {
        Self {
            plugins: TriggerKind::ALL.into_iter().map(Plugin::builtin).collect(),
        }
    }

    pub fn register(&mut self, plugin: Plugin) -> Result<(), PluginError> {
        if self.get(&plugin.name).is_some() {
            return Err(PluginError::Duplicate(plugin.name));
        }
        tracing::debug!(target: "scribe::plugin", name = %plugin.name, "registered plugin");
        self.plugins.push(plugin);
        Ok(())
    }

    pub fn unregister(&mut self, name: &str) -> Result<Plugin, PluginError> {
        let index = self.position(name)?;
        Ok(self.plugins.remove(index))
    }

    pub fn enable(&mut self, name: &str) -> Result<(), PluginError> {
        self.set_enabled(name, true)
    }

    pub fn disable(&mut self, name: &str) -> Result<(), PluginError> {
        self.set_enabled(name, false)
    }

    pub fn get(&self, name: &str) -> Option<&Plugin> {
        self.plugins.iter().find(|p| p.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Plugin> {
        self.plugins.iter()
    }

    pub fn enabled(&self) -> impl Iterator<Item = &Plugin> {
        self.plugins.iter().filter(|p| p.enabled)
    }

    pub fn is_trigger_enabled(&self, kind: TriggerKind) -> bool {
        self.enabled().any(|p| p.capabilities.triggers.contains(&kind))
    }

    pub fn is_mark_enabled(&self, kind: MarkKind) -> bool {
        self.enabled().any(|p| p.capabilities.marks.contains(&kind))
    }

    fn position(&self, name: &str) -> Result<usize, PluginError> {
        self.plugins
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| PluginError::NotFound(name.into()))
    }

    fn set_enabled(&mut self, name: &str, enabled: bool) -> Result<(), PluginError> {
        let index = self.position(name)?;
        self.plugins[index].enabled = enabled;
        tracing::debug!(target: "scribe::plugin", name, enabled, "plugin toggled");
        Ok(())
    }
}
