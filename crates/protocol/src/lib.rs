//! The shared vocabulary between the chat widget and its backends.
//!
//! This crate establishes the contract a transport has to fulfil for the
//! widget core to drive it: the session identity, the message types, the
//! two reply modes (an open byte stream or a single JSON envelope), and
//! the error taxonomy.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod message;
mod session;
mod stream;
mod transport;

pub use error::*;
pub use message::*;
pub use session::*;
pub use stream::*;
pub use transport::*;
