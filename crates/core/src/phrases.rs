use bubble_chat_protocol::{Error, ErrorKind};

/// User-visible text shown by the widget.
///
/// Error phrases are prefixes; the failure detail (and the HTTP status, when
/// there is one) is appended to them.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Phrases {
    /// The canned greeting shown when there is no history.
    pub greeting: String,
    /// The label of the loading indicator.
    pub loading_history: String,
    /// Prefix of a failed history fetch.
    pub history_failed: String,
    /// Prefix of a chat message the server rejected.
    pub send_failed: String,
    /// Prefix of a failure reported inside a reply envelope.
    pub reply_failed: String,
    /// Prefix of a chat message that never got a response.
    pub connection_failed: String,
    /// Prefix of a delete request the server rejected.
    pub delete_failed: String,
    /// Shown when a delete request ends with an unexpected status.
    pub delete_unexpected: String,
    /// Prefix of a delete request that never got a response.
    pub delete_connection_failed: String,
    /// The question asked before deleting the history.
    pub delete_prompt: String,
    /// Prefix of an invalid configuration.
    pub config_failed: String,
    /// Used when a failure carries no detail.
    pub unknown_error: String,
}

impl Default for Phrases {
    #[inline]
    fn default() -> Self {
        Self::english()
    }
}

impl Phrases {
    /// English phrases.
    pub fn english() -> Self {
        Self {
            greeting: "Hi! How can I help you today?".to_owned(),
            loading_history: "Loading history...".to_owned(),
            history_failed: "Failed to load history".to_owned(),
            send_failed: "Failed to send message".to_owned(),
            reply_failed: "Error in the server response".to_owned(),
            connection_failed: "Failed to get a response".to_owned(),
            delete_failed: "Failed to delete the conversation".to_owned(),
            delete_unexpected: "The delete request had an unexpected result."
                .to_owned(),
            delete_connection_failed:
                "Connection error while deleting the conversation".to_owned(),
            delete_prompt: "Are you sure you want to delete the whole \
                conversation history? This action cannot be undone."
                .to_owned(),
            config_failed: "Critical error".to_owned(),
            unknown_error: "Unknown error".to_owned(),
        }
    }

    /// Spanish phrases.
    pub fn spanish() -> Self {
        Self {
            greeting: "¡Hola! ¿En qué puedo ayudarte hoy?".to_owned(),
            loading_history: "Cargando historial...".to_owned(),
            history_failed: "Error al cargar historial".to_owned(),
            send_failed: "Error al enviar mensaje".to_owned(),
            reply_failed: "Error en la respuesta del servidor".to_owned(),
            connection_failed: "Error al obtener respuesta".to_owned(),
            delete_failed: "Error al intentar eliminar la conversación"
                .to_owned(),
            delete_unexpected:
                "La solicitud de eliminación tuvo un resultado inesperado."
                    .to_owned(),
            delete_connection_failed:
                "Error de conexión al intentar eliminar la conversación"
                    .to_owned(),
            delete_prompt: "¿Estás seguro de que quieres eliminar todo el \
                historial de conversación? Esta acción no se puede deshacer."
                .to_owned(),
            config_failed: "Error crítico".to_owned(),
            unknown_error: "Error desconocido".to_owned(),
        }
    }

    /// Describes `err` for the end user.
    pub fn describe(&self, err: &Error) -> String {
        let prefix = match (err.kind(), err.status()) {
            (ErrorKind::Config, _) => &self.config_failed,
            (ErrorKind::HistoryFetch, _) => &self.history_failed,
            (ErrorKind::ChatSend, Some(_)) => &self.send_failed,
            (ErrorKind::ChatSend, None) => &self.connection_failed,
            (ErrorKind::HistoryDelete, Some(_)) => &self.delete_failed,
            (ErrorKind::HistoryDelete, None) => &self.delete_connection_failed,
        };
        let detail = self.detail_or_unknown(err.message());
        match err.status() {
            Some(status) => format!("{prefix} ({status}): {detail}"),
            None => format!("{prefix}: {detail}"),
        }
    }

    /// Describes a failure reported inside a reply envelope.
    pub fn describe_reply_failure(&self, reason: &str) -> String {
        format!("{}: {}", self.reply_failed, self.detail_or_unknown(reason))
    }

    #[inline]
    fn detail_or_unknown<'a>(&'a self, detail: &'a str) -> &'a str {
        if detail.trim().is_empty() {
            self.unknown_error.as_str()
        } else {
            detail
        }
    }
}
