use std::fmt::{self, Debug};

use url::Url;

use crate::Error;

/// The API base used when the host doesn't configure one.
pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

/// Builder for [`Session`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionBuilder {
    user_id: String,
    user_key: String,
    api_base: Option<String>,
}

impl SessionBuilder {
    /// Creates a builder with the given user identity.
    #[inline]
    pub fn with_identity<S1: Into<String>, S2: Into<String>>(
        user_id: S1,
        user_key: S2,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            user_key: user_key.into(),
            api_base: None,
        }
    }

    /// Sets a custom API base URL.
    #[inline]
    pub fn with_api_base<S: Into<String>>(mut self, api_base: S) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    /// Validates the identity and builds the session.
    ///
    /// Fails with a `Config` error if the user id or key is blank, or if the
    /// API base is not an absolute `http`/`https` URL.
    pub fn build(self) -> Result<Session, Error> {
        let user_id = self.user_id.trim();
        let user_key = self.user_key.trim();
        if user_id.is_empty() || user_key.is_empty() {
            return Err(Error::config("userId or userKey is missing"));
        }

        let api_base = self.api_base.as_deref().unwrap_or(DEFAULT_API_BASE);
        let api_base = Url::parse(api_base.trim()).map_err(|err| {
            Error::config(format!("invalid apiBase {api_base:?}: {err}"))
        })?;
        if !matches!(api_base.scheme(), "http" | "https")
            || api_base.cannot_be_a_base()
        {
            return Err(Error::config(format!(
                "apiBase must be an http(s) URL, got {api_base}"
            )));
        }

        Ok(Session {
            api_base,
            user_id: user_id.to_owned(),
            user_key: user_key.to_owned(),
        })
    }
}

impl Debug for SessionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionBuilder")
            .field("user_id", &self.user_id)
            .field("user_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// The resolved identity of a widget and the backend it talks to.
///
/// A session is validated once by [`SessionBuilder`] and never changes
/// afterwards. Every transport call receives it explicitly.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Session {
    api_base: Url,
    user_id: String,
    user_key: String,
}

impl Session {
    /// Returns the API base URL.
    #[inline]
    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// Returns the user id.
    #[inline]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Returns the user key (customer key or price list, depending on the
    /// deployment).
    #[inline]
    pub fn user_key(&self) -> &str {
        &self.user_key
    }
}

impl Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("api_base", &self.api_base.as_str())
            .field("user_id", &self.user_id)
            .field("user_key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_build_session() {
        let session = SessionBuilder::with_identity("u-1", "k-1")
            .with_api_base("https://chat.example.com/api/")
            .build()
            .unwrap();
        assert_eq!(session.user_id(), "u-1");
        assert_eq!(session.user_key(), "k-1");
        assert_eq!(session.api_base().as_str(), "https://chat.example.com/api/");

        let session = SessionBuilder::with_identity("u-1", "k-1").build().unwrap();
        assert_eq!(session.api_base().as_str(), "http://localhost:8000/");
    }

    #[test]
    fn test_missing_identity() {
        let err = SessionBuilder::with_identity("", "k-1").build().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);

        let err = SessionBuilder::with_identity("u-1", "  ").build().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_invalid_api_base() {
        for api_base in ["not a url", "mailto:someone@example.com", "ftp://x"] {
            let err = SessionBuilder::with_identity("u-1", "k-1")
                .with_api_base(api_base)
                .build()
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Config, "{api_base}");
        }
    }

    #[test]
    fn test_debug_redacts_key() {
        let session = SessionBuilder::with_identity("u-1", "secret-key")
            .build()
            .unwrap();
        let debug = format!("{session:?}");
        assert!(debug.contains("u-1"));
        assert!(!debug.contains("secret-key"));
    }
}
