use bubble_chat_protocol::Message;
use serde::{Deserialize, Serialize};

/// A failure returned instead of a response.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetFailure {
    /// The HTTP status, or `None` to simulate a connection failure.
    pub status: Option<u16>,
    /// The extracted reason.
    pub message: String,
}

impl PresetFailure {
    /// Creates a failure the server answered with `status`.
    #[inline]
    pub fn with_status<S: Into<String>>(status: u16, message: S) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Creates a connection-level failure.
    #[inline]
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }
}

/// The preset answer to a history fetch.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum PresetHistory {
    /// Stored messages (an empty list means no history).
    Messages(Vec<Message>),
    /// The fetch fails.
    Failure(PresetFailure),
}

/// The preset answer to a chat message.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum PresetChat {
    /// A streamed body made of these text chunks.
    Stream(Vec<String>),
    /// A streamed body made of these raw byte chunks.
    RawStream(Vec<Vec<u8>>),
    /// A streamed body that fails after yielding `chunks`.
    BrokenStream {
        /// Chunks delivered before the failure.
        chunks: Vec<String>,
        /// The failure that ends the stream.
        failure: PresetFailure,
    },
    /// A single JSON envelope.
    Envelope {
        /// Whether the envelope reports success.
        success: bool,
        /// The bot text on success, the reason otherwise.
        text: String,
    },
    /// The request fails before any body is read.
    Failure(PresetFailure),
}

impl PresetChat {
    /// Creates a streamed preset from text chunks.
    #[inline]
    pub fn stream<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PresetChat::Stream(chunks.into_iter().map(Into::into).collect())
    }

    /// Creates a successful envelope preset.
    #[inline]
    pub fn success<S: Into<String>>(text: S) -> Self {
        PresetChat::Envelope {
            success: true,
            text: text.into(),
        }
    }

    /// Creates a failed envelope preset.
    #[inline]
    pub fn envelope_failure<S: Into<String>>(reason: S) -> Self {
        PresetChat::Envelope {
            success: false,
            text: reason.into(),
        }
    }
}

/// The preset answer to a delete request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum PresetDelete {
    /// The history is deleted.
    Deleted,
    /// The server answers with a status that is neither success nor error.
    Unexpected(u16),
    /// The request fails.
    Failure(PresetFailure),
}
