//! A chat transport that talks to the widget backend over HTTP.

#[macro_use]
extern crate tracing;

mod config;
mod io;
mod proto;

use std::sync::Arc;

use bubble_chat_protocol::{
    ChatResult, ChatTransport, DeleteOutcome, Error, ErrorKind, History,
    Session,
};
use mime::Mime;
use reqwest::{Client, Response, header};

pub use config::{
    Endpoint, EnvelopeFields, HttpConfig, HttpConfigBuilder, UserLocator,
};

/// HTTP chat transport.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
    config: Arc<HttpConfig>,
}

impl HttpTransport {
    /// Creates a new `HttpTransport` with the given configuration.
    #[inline]
    pub fn new(config: HttpConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    /// Creates a new `HttpTransport` that sends requests with `client`.
    #[inline]
    pub fn with_client(client: Client, config: HttpConfig) -> Self {
        Self {
            client,
            config: Arc::new(config),
        }
    }
}

impl ChatTransport for HttpTransport {
    fn fetch_history(
        &self,
        session: &Session,
    ) -> impl Future<Output = Result<History, Error>> + Send + 'static {
        let url = self
            .config
            .history
            .resolve(session.api_base(), session.user_id());
        debug!("fetching history from {url}");
        let resp_fut = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .send();
        let config = Arc::clone(&self.config);

        async move {
            let resp = resp_fut.await.map_err(|err| {
                Error::history_fetch(None, format!("{err}"))
            })?;
            let resp = check_status(resp, ErrorKind::HistoryFetch).await?;
            let body = resp.bytes().await.map_err(|err| {
                Error::history_fetch(None, format!("{err}"))
            })?;
            Ok(proto::decode_history(&body, &config.envelope))
        }
    }

    fn send_chat_message(
        &self,
        session: &Session,
        text: &str,
    ) -> impl Future<Output = Result<ChatResult, Error>> + Send + 'static {
        let url = self
            .config
            .chat
            .resolve(session.api_base(), session.user_id());
        let body =
            proto::create_chat_body(session, text, &self.config.user_key_field);
        debug!("sending chat message to {url}");
        let resp_fut = self.client.post(url).json(&body).send();
        let config = Arc::clone(&self.config);

        async move {
            let resp = resp_fut
                .await
                .map_err(|err| Error::chat_send(None, format!("{err}")))?;
            let resp = check_status(resp, ErrorKind::ChatSend).await?;

            if !is_json_content_type(&resp) {
                debug!("reply is a stream");
                return Ok(ChatResult::Streamed(io::into_chat_stream(resp)));
            }

            debug!("reply is an envelope");
            let status = resp.status().as_u16();
            let body = resp
                .bytes()
                .await
                .map_err(|err| Error::chat_send(Some(status), format!("{err}")))?;
            Ok(ChatResult::Enveloped(proto::decode_envelope(
                &body,
                &config.envelope,
            )))
        }
    }

    fn delete_history(
        &self,
        session: &Session,
    ) -> impl Future<Output = Result<DeleteOutcome, Error>> + Send + 'static {
        let url = self
            .config
            .delete
            .resolve(session.api_base(), session.user_id());
        debug!("deleting history at {url}");
        let resp_fut = self.client.delete(url).send();

        async move {
            let resp = resp_fut.await.map_err(|err| {
                Error::history_delete(None, format!("{err}"))
            })?;
            match resp.status().as_u16() {
                200 | 204 => Ok(DeleteOutcome::Deleted),
                400..=599 => {
                    Err(error_from_response(resp, ErrorKind::HistoryDelete).await)
                }
                status => {
                    warn!("delete request returned an unexpected status {status}");
                    Ok(DeleteOutcome::Unexpected(status))
                }
            }
        }
    }
}

/// Passes successful responses through, and turns the others into errors
/// carrying the extracted reason.
async fn check_status(resp: Response, kind: ErrorKind) -> Result<Response, Error> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    Err(error_from_response(resp, kind).await)
}

async fn error_from_response(resp: Response, kind: ErrorKind) -> Error {
    let status = resp.status();
    let body = match resp.text().await {
        Ok(body) => body,
        Err(err) => {
            warn!("failed to read error body: {err}");
            String::new()
        }
    };
    let message = proto::extract_error_message(&body);
    error!("request failed with {status}: {message}");
    Error::new(kind, Some(status.as_u16()), message)
}

fn is_json_content_type(resp: &Response) -> bool {
    resp.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<Mime>().ok())
        .map(|m| {
            m.type_() == mime::APPLICATION
                && (m.subtype() == mime::JSON || m.suffix() == Some(mime::JSON))
        })
        .unwrap_or(false)
}
