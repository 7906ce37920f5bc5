use std::env;
use std::fmt::{self, Debug};
use std::str::FromStr;

use bubble_chat_core::Phrases;
use bubble_chat_http::{HttpConfig, HttpConfigBuilder};
use bubble_chat_protocol::{DEFAULT_API_BASE, Error, Session, SessionBuilder};
use serde::{Deserialize, Serialize};

const ENV_PREFIX: &str = "BUBBLE_CHAT_";

/// Which backend deployment the widget talks to.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// History at `history/{userId}`, replies usually streamed.
    #[default]
    Streaming,
    /// History at `history?usuario={userId}`, replies in Spanish-keyed
    /// envelopes.
    Enveloped,
}

impl FromStr for Variant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "streaming" => Ok(Variant::Streaming),
            "enveloped" => Ok(Variant::Enveloped),
            other => Err(Error::config(format!("unknown variant {other:?}"))),
        }
    }
}

/// The language of user-visible text.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum Language {
    /// English.
    #[default]
    #[serde(rename = "en")]
    English,
    /// Spanish.
    #[serde(rename = "es")]
    Spanish,
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "en" => Ok(Language::English),
            "es" => Ok(Language::Spanish),
            other => Err(Error::config(format!("unknown language {other:?}"))),
        }
    }
}

/// Widget settings, as provided by the host page or the environment.
///
/// Identity fields default to empty so that a missing one is reported as a
/// configuration error by [`Settings::session`] rather than as a parse
/// error.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Base URL of the chat backend.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// The user the conversation belongs to.
    #[serde(default)]
    pub user_id: String,
    /// The key sent along with every chat message.
    #[serde(default)]
    pub user_key: String,
    /// Id of the element hosts mount the widget into.
    #[serde(default = "default_container_id")]
    pub container_id: String,
    /// Icon of the floating chat button.
    #[serde(default = "default_chat_icon_url")]
    pub chat_icon_url: String,
    /// The backend deployment.
    #[serde(default)]
    pub variant: Variant,
    /// Overrides the body field carrying the user key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_key_field: Option<String>,
    /// The language of user-visible text.
    #[serde(default)]
    pub language: Language,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_owned()
}

fn default_container_id() -> String {
    "bubble-chat-root".to_owned()
}

fn default_chat_icon_url() -> String {
    "chat.png".to_owned()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            user_id: String::new(),
            user_key: String::new(),
            container_id: default_container_id(),
            chat_icon_url: default_chat_icon_url(),
            variant: Variant::default(),
            user_key_field: None,
            language: Language::default(),
        }
    }
}

impl Settings {
    /// Parses settings from a JSON object with camelCase keys.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json)
            .map_err(|err| Error::config(format!("invalid settings: {err}")))
    }

    /// Reads settings from `BUBBLE_CHAT_*` environment variables, e.g.
    /// `BUBBLE_CHAT_USER_ID` or `BUBBLE_CHAT_API_BASE`.
    #[inline]
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads settings through `lookup`, which maps a full variable name
    /// (`BUBBLE_CHAT_USER_ID`) to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}"))
                .filter(|value| !value.trim().is_empty())
        };

        let mut settings = Settings::default();
        if let Some(api_base) = var("API_BASE") {
            settings.api_base = api_base;
        }
        if let Some(user_id) = var("USER_ID") {
            settings.user_id = user_id;
        }
        if let Some(user_key) = var("USER_KEY") {
            settings.user_key = user_key;
        }
        if let Some(container_id) = var("CONTAINER_ID") {
            settings.container_id = container_id;
        }
        if let Some(chat_icon_url) = var("CHAT_ICON_URL") {
            settings.chat_icon_url = chat_icon_url;
        }
        if let Some(variant) = var("VARIANT") {
            settings.variant = variant.parse()?;
        }
        settings.user_key_field = var("USER_KEY_FIELD");
        if let Some(language) = var("LANGUAGE") {
            settings.language = language.parse()?;
        }
        Ok(settings)
    }

    /// Validates the identity and API base into a session.
    #[inline]
    pub fn session(&self) -> Result<Session, Error> {
        SessionBuilder::with_identity(&self.user_id, &self.user_key)
            .with_api_base(&self.api_base)
            .build()
    }

    /// Returns the HTTP transport configuration for the chosen variant.
    pub fn http_config(&self) -> HttpConfig {
        let mut builder = match self.variant {
            Variant::Streaming => HttpConfigBuilder::streaming_deployment(),
            Variant::Enveloped => HttpConfigBuilder::enveloped_deployment(),
        };
        if let Some(field) = &self.user_key_field {
            builder = builder.with_user_key_field(field);
        }
        builder.build()
    }

    /// Returns the phrases for the chosen language.
    #[inline]
    pub fn phrases(&self) -> Phrases {
        match self.language {
            Language::English => Phrases::english(),
            Language::Spanish => Phrases::spanish(),
        }
    }
}

impl Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_base", &self.api_base)
            .field("user_id", &self.user_id)
            .field("user_key", &"<redacted>")
            .field("container_id", &self.container_id)
            .field("chat_icon_url", &self.chat_icon_url)
            .field("variant", &self.variant)
            .field("user_key_field", &self.user_key_field)
            .field("language", &self.language)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use bubble_chat_protocol::ErrorKind;

    use super::*;

    #[test]
    fn test_from_json() {
        let settings = Settings::from_json(
            r#"{
                "apiBase": "https://chat.example.com/api",
                "userId": "42",
                "userKey": "lp-7",
                "variant": "enveloped",
                "language": "es"
            }"#,
        )
        .unwrap();
        assert_eq!(settings.container_id, "bubble-chat-root");
        assert_eq!(settings.chat_icon_url, "chat.png");
        assert_eq!(settings.phrases(), Phrases::spanish());
        assert_eq!(
            settings.http_config(),
            HttpConfigBuilder::enveloped_deployment().build()
        );

        let session = settings.session().unwrap();
        assert_eq!(session.user_id(), "42");
        assert_eq!(session.api_base().as_str(), "https://chat.example.com/api");
        assert!(!format!("{settings:?}").contains("lp-7"));
    }

    #[test]
    fn test_missing_identity() {
        let settings = Settings::from_json(r#"{"userId": "42"}"#).unwrap();
        assert_eq!(settings.api_base, DEFAULT_API_BASE);
        let err = settings.session().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);

        let err = Settings::from_json(r#"{"variant": "carrier-pigeon"}"#)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_from_lookup() {
        let vars = HashMap::from([
            ("BUBBLE_CHAT_USER_ID", "7"),
            ("BUBBLE_CHAT_USER_KEY", "k"),
            ("BUBBLE_CHAT_USER_KEY_FIELD", "listaPrecio"),
            ("BUBBLE_CHAT_LANGUAGE", " "),
        ]);
        let settings =
            Settings::from_lookup(|name| vars.get(name).map(|v| v.to_string()))
                .unwrap();
        assert_eq!(settings.variant, Variant::Streaming);
        assert_eq!(settings.language, Language::English);
        assert_eq!(
            settings.http_config(),
            HttpConfigBuilder::streaming_deployment()
                .with_user_key_field("listaPrecio")
                .build()
        );
        assert!(settings.session().is_ok());

        let err = Settings::from_lookup(|name| {
            (name == "BUBBLE_CHAT_LANGUAGE").then(|| "fr".to_owned())
        })
        .unwrap_err();
        assert_eq!(err.message(), "unknown language \"fr\"");
    }
}
