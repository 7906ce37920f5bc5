use url::Url;

/// Where the user id goes in an endpoint URL.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum UserLocator {
    /// The endpoint doesn't identify the user in its URL.
    None,
    /// The user id is appended as the last path segment.
    PathSegment,
    /// The user id is passed as a query parameter with this name.
    Query(String),
}

/// An endpoint path relative to the session's API base.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Endpoint {
    path: String,
    user: UserLocator,
}

impl Endpoint {
    /// Creates an endpoint that doesn't carry the user id.
    #[inline]
    pub fn new<S: Into<String>>(path: S) -> Self {
        Self {
            path: path.into(),
            user: UserLocator::None,
        }
    }

    /// Appends the user id as the last path segment.
    #[inline]
    pub fn with_user_segment(mut self) -> Self {
        self.user = UserLocator::PathSegment;
        self
    }

    /// Passes the user id as the named query parameter.
    #[inline]
    pub fn with_user_query<S: Into<String>>(mut self, name: S) -> Self {
        self.user = UserLocator::Query(name.into());
        self
    }

    /// Resolves the endpoint against `api_base`.
    ///
    /// Path segments are appended to whatever path the base already has, so
    /// `https://host/api` and `https://host/api/` both resolve `chat` to
    /// `https://host/api/chat`. The user id is percent-encoded.
    pub(crate) fn resolve(&self, api_base: &Url, user_id: &str) -> Url {
        let mut url = api_base.clone();
        // Only cannot-be-a-base URLs fail here, and sessions reject those.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
            segments.extend(self.path.split('/').filter(|s| !s.is_empty()));
            if self.user == UserLocator::PathSegment {
                segments.push(user_id);
            }
        }
        if let UserLocator::Query(name) = &self.user {
            url.query_pairs_mut().append_pair(name, user_id);
        }
        url
    }
}

/// Key names of the JSON envelope used by chat replies and history.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EnvelopeFields {
    /// The status discriminator, whose success value is `"success"`.
    pub status: String,
    /// The payload field.
    pub data: String,
    /// The field carrying a failure reason.
    pub message: String,
}

impl Default for EnvelopeFields {
    fn default() -> Self {
        Self {
            status: "status".to_owned(),
            data: "data".to_owned(),
            message: "mensaje".to_owned(),
        }
    }
}

impl EnvelopeFields {
    /// The Spanish key names (`estatus`, `datos`, `mensaje`).
    #[inline]
    pub fn spanish() -> Self {
        Self {
            status: "estatus".to_owned(),
            data: "datos".to_owned(),
            message: "mensaje".to_owned(),
        }
    }
}

/// Builder for [`HttpConfig`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HttpConfigBuilder {
    history: Option<Endpoint>,
    chat: Option<Endpoint>,
    delete: Option<Endpoint>,
    user_key_field: Option<String>,
    envelope: Option<EnvelopeFields>,
}

impl HttpConfigBuilder {
    /// Creates a builder for the streaming deployment: history at
    /// `history/{user_id}`, the key sent as `cliente_clave`, and
    /// `status`/`data` envelopes.
    #[inline]
    pub fn streaming_deployment() -> Self {
        Self {
            history: None,
            chat: None,
            delete: None,
            user_key_field: None,
            envelope: None,
        }
    }

    /// Creates a builder for the enveloped deployment: history at
    /// `history?usuario={user_id}`, the key sent as `listaPrecio`, and
    /// `estatus`/`datos` envelopes.
    #[inline]
    pub fn enveloped_deployment() -> Self {
        Self::streaming_deployment()
            .with_history_endpoint(
                Endpoint::new("history").with_user_query("usuario"),
            )
            .with_user_key_field("listaPrecio")
            .with_envelope_fields(EnvelopeFields::spanish())
    }

    /// Sets the history endpoint (used for `GET`).
    #[inline]
    pub fn with_history_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.history = Some(endpoint);
        self
    }

    /// Sets the chat endpoint (used for `POST`).
    #[inline]
    pub fn with_chat_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.chat = Some(endpoint);
        self
    }

    /// Sets the delete endpoint (used for `DELETE`).
    #[inline]
    pub fn with_delete_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.delete = Some(endpoint);
        self
    }

    /// Sets the body field that carries the user key.
    #[inline]
    pub fn with_user_key_field<S: Into<String>>(mut self, field: S) -> Self {
        self.user_key_field = Some(field.into());
        self
    }

    /// Sets the envelope key names.
    #[inline]
    pub fn with_envelope_fields(mut self, fields: EnvelopeFields) -> Self {
        self.envelope = Some(fields);
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> HttpConfig {
        HttpConfig {
            history: self
                .history
                .unwrap_or_else(|| Endpoint::new("history").with_user_segment()),
            chat: self.chat.unwrap_or_else(|| Endpoint::new("chat")),
            delete: self.delete.unwrap_or_else(|| {
                Endpoint::new("delete-history").with_user_query("usuario")
            }),
            user_key_field: self
                .user_key_field
                .unwrap_or_else(|| "cliente_clave".to_owned()),
            envelope: self.envelope.unwrap_or_default(),
        }
    }
}

impl Default for HttpConfigBuilder {
    #[inline]
    fn default() -> Self {
        Self::streaming_deployment()
    }
}

/// Configuration for [`crate::HttpTransport`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HttpConfig {
    pub(crate) history: Endpoint,
    pub(crate) chat: Endpoint,
    pub(crate) delete: Endpoint,
    pub(crate) user_key_field: String,
    pub(crate) envelope: EnvelopeFields,
}

impl Default for HttpConfig {
    #[inline]
    fn default() -> Self {
        HttpConfigBuilder::default().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_endpoints() {
        let config = HttpConfig::default();
        let base = Url::parse("https://chat.example.com/api").unwrap();
        assert_eq!(
            config.history.resolve(&base, "u 1").as_str(),
            "https://chat.example.com/api/history/u%201"
        );
        assert_eq!(
            config.chat.resolve(&base, "u 1").as_str(),
            "https://chat.example.com/api/chat"
        );
        assert_eq!(
            config.delete.resolve(&base, "u&1").as_str(),
            "https://chat.example.com/api/delete-history?usuario=u%261"
        );

        let base = Url::parse("http://10.0.0.1:8000/").unwrap();
        assert_eq!(
            config.chat.resolve(&base, "u").as_str(),
            "http://10.0.0.1:8000/chat"
        );
    }

    #[test]
    fn test_enveloped_deployment() {
        let config = HttpConfigBuilder::enveloped_deployment()
            .with_delete_endpoint(Endpoint::new("history").with_user_segment())
            .build();
        let base = Url::parse("http://localhost:8000").unwrap();
        assert_eq!(
            config.history.resolve(&base, "42").as_str(),
            "http://localhost:8000/history?usuario=42"
        );
        assert_eq!(
            config.delete.resolve(&base, "42").as_str(),
            "http://localhost:8000/history/42"
        );
        assert_eq!(config.user_key_field, "listaPrecio");
        assert_eq!(config.envelope, EnvelopeFields::spanish());
    }
}
