//! An embeddable chat widget that talks to a chat backend over HTTP.
//!
//! The crate includes a CLI tool for chatting in the terminal. And you can
//! also use it as a library (or through its C API) to bring the widget into
//! your own host apps, which render the [`core::view::ViewEvent`]s it emits.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

#[cfg(feature = "ffi")]
pub mod ffi;
mod settings;
mod widget;

pub use settings::{Language, Settings, Variant};
pub use widget::{Widget, WidgetBuilder, WidgetClosedError, WidgetHandle};

/// Re-exports of [`bubble_chat_core`] crate.
pub mod core {
    pub use bubble_chat_core::*;
}

/// Re-exports of [`bubble_chat_protocol`] crate.
pub mod protocol {
    pub use bubble_chat_protocol::*;
}
