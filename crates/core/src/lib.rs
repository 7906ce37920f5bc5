//! Core logic of the chat widget, including reply interpretation, the
//! conversation view, and the controller driving them.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod controller;
pub mod interpreter;
mod phrases;
pub mod render;
mod transport_client;
pub mod view;

pub use controller::{Controller, ControllerBuilder, Intent, Stage};
pub use phrases::Phrases;
