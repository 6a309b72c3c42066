//! Suggestion popups for mentions and hashtags.
//!
//! - `SuggestionController` - per-trigger state machine with debounced fetches
//! - `find_trigger_context` - caret context detection
//! - `SuggestionSource` / `Scheduler` - host seams for data and time

pub mod config;
pub mod context;
pub mod controller;
pub mod scheduler;
pub mod source;
pub mod state;

pub use config::SuggestionConfig;
pub use context::{TriggerMatch, find_trigger_context};
pub use controller::{ListenerId, SuggestionController, WeakSuggestionController};
pub use scheduler::{Scheduler, TimerId};
pub use source::{StaticSource, SuggestionFuture, SuggestionSource};
pub use state::{Item, SuggestionPhase, SuggestionState};
