use crate::message::History;
use crate::session::Session;
use crate::stream::ChatStream;
use crate::Error;

/// A single, fully received JSON reply to a chat message.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Envelope {
    /// The server answered successfully; holds the complete bot text.
    Success(String),
    /// The server reported an application-level failure; holds the reason.
    Failure(String),
}

/// The reply to a chat message, in whichever mode the server chose.
#[derive(Debug)]
pub enum ChatResult {
    /// The body is an open byte stream the caller must consume.
    Streamed(ChatStream),
    /// The body was a single JSON envelope.
    Enveloped(Envelope),
}

/// The outcome of a delete request that didn't fail outright.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeleteOutcome {
    /// The history was deleted.
    Deleted,
    /// The server answered with a status that is neither a success nor an
    /// error (e.g. `202`). Not treated as a failure.
    Unexpected(u16),
}

/// A type that carries widget operations to a chat backend.
///
/// Once created, a transport should behave like a stateless object: all
/// per-user data travels in the [`Session`] passed to each call, and the
/// returned futures must not borrow from `self`.
pub trait ChatTransport: Send + Sync {
    /// Fetches the stored conversation of the session's user.
    fn fetch_history(
        &self,
        session: &Session,
    ) -> impl Future<Output = Result<History, Error>> + Send + 'static;

    /// Sends a user message and returns the reply.
    fn send_chat_message(
        &self,
        session: &Session,
        text: &str,
    ) -> impl Future<Output = Result<ChatResult, Error>> + Send + 'static;

    /// Deletes the stored conversation of the session's user.
    fn delete_history(
        &self,
        session: &Session,
    ) -> impl Future<Output = Result<DeleteOutcome, Error>> + Send + 'static;
}
