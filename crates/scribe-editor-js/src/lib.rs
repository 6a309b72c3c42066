//! WASM bindings for scribe mention and hashtag support.
//!
//! The host implements `ScribeDocumentEngine` over its rich-text editor and
//! drives a `JsMentionEditor` with its change, selection, blur and key events.

mod editor;
mod engine;
mod scheduler;
mod source;
mod types;

pub use editor::*;
pub use engine::JsDocumentEngine;
pub use types::*;

use wasm_bindgen::prelude::*;

/// Install the panic hook and route `tracing` output to the console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();

    use tracing::Level;
    use tracing::subscriber::set_global_default;
    use tracing_subscriber::Registry;
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::layer::SubscriberExt;

    let console_level = if cfg!(debug_assertions) {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let wasm_layer = tracing_wasm::WASMLayer::new(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(console_level)
            .build(),
    );

    let filter = EnvFilter::new("info,scribe::reconcile=debug,scribe::suggest=debug");

    let reg = Registry::default().with(filter).with(wasm_layer);

    let _ = set_global_default(reg);
}
