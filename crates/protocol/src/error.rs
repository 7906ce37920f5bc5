use std::error::Error as StdError;
use std::fmt::{self, Display};

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The widget configuration is missing or invalid.
    Config,
    /// Loading the conversation history failed.
    HistoryFetch,
    /// Sending a chat message (or reading its reply) failed.
    ChatSend,
    /// Deleting the conversation history failed.
    HistoryDelete,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Config => write!(f, "Configuration error"),
            ErrorKind::HistoryFetch => write!(f, "History fetch error"),
            ErrorKind::ChatSend => write!(f, "Chat send error"),
            ErrorKind::HistoryDelete => write!(f, "History delete error"),
        }
    }
}

/// Describes a failed widget operation.
///
/// Errors raised by the transport carry the HTTP status when the server
/// answered, and `None` when the request never got a response.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Error {
    kind: ErrorKind,
    status: Option<u16>,
    message: String,
}

impl Error {
    /// Creates an error of the given kind.
    #[inline]
    pub fn new<S: Into<String>>(
        kind: ErrorKind,
        status: Option<u16>,
        message: S,
    ) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
        }
    }

    /// Creates a `Config` error.
    #[inline]
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorKind::Config, None, message)
    }

    /// Creates a `HistoryFetch` error.
    #[inline]
    pub fn history_fetch<S: Into<String>>(
        status: Option<u16>,
        message: S,
    ) -> Self {
        Self::new(ErrorKind::HistoryFetch, status, message)
    }

    /// Creates a `ChatSend` error.
    #[inline]
    pub fn chat_send<S: Into<String>>(status: Option<u16>, message: S) -> Self {
        Self::new(ErrorKind::ChatSend, status, message)
    }

    /// Creates a `HistoryDelete` error.
    #[inline]
    pub fn history_delete<S: Into<String>>(
        status: Option<u16>,
        message: S,
    ) -> Self {
        Self::new(ErrorKind::HistoryDelete, status, message)
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the HTTP status, if the server answered at all.
    #[inline]
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Returns the extracted, human-readable reason.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => {
                write!(f, "{} ({status}): {}", self.kind, self.message)
            }
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl StdError for Error {}
