use std::pin::Pin;
use std::sync::Arc;

use bubble_chat_protocol::{
    ChatResult, ChatTransport, DeleteOutcome, Error, History, Session,
};
use tracing::Instrument;

type BoxedFuture<T> = Pin<Box<dyn Future<Output = Result<T, Error>> + Send>>;

trait TransportObject: Send + Sync + 'static {
    fn fetch_history(&self, session: &Session) -> BoxedFuture<History>;

    fn send_chat_message(
        &self,
        session: &Session,
        text: &str,
    ) -> BoxedFuture<ChatResult>;

    fn delete_history(&self, session: &Session) -> BoxedFuture<DeleteOutcome>;
}

struct TransportObjectImpl<T: ChatTransport>(T);

impl<T: ChatTransport + 'static> TransportObject for TransportObjectImpl<T> {
    #[inline]
    fn fetch_history(&self, session: &Session) -> BoxedFuture<History> {
        let fut = self.0.fetch_history(session);
        Box::pin(
            async move {
                let res = fut.await;
                trace!("history fetched: {res:?}");
                res
            }
            .instrument(trace_span!("fetch history")),
        )
    }

    #[inline]
    fn send_chat_message(
        &self,
        session: &Session,
        text: &str,
    ) -> BoxedFuture<ChatResult> {
        let fut = self.0.send_chat_message(session, text);
        Box::pin(
            async move {
                let res = fut.await;
                trace!("chat message sent: {res:?}");
                res
            }
            .instrument(trace_span!("send chat message")),
        )
    }

    #[inline]
    fn delete_history(&self, session: &Session) -> BoxedFuture<DeleteOutcome> {
        let fut = self.0.delete_history(session);
        Box::pin(
            async move {
                let res = fut.await;
                trace!("history deleted: {res:?}");
                res
            }
            .instrument(trace_span!("delete history")),
        )
    }
}

/// A type-erased wrapper around a chat transport, so the controller
/// doesn't need a generic parameter.
#[derive(Clone)]
pub(crate) struct TransportClient {
    inner: Arc<dyn TransportObject>,
}

impl TransportClient {
    #[inline]
    pub fn new<T: ChatTransport + 'static>(transport: T) -> Self {
        Self {
            inner: Arc::new(TransportObjectImpl(transport)),
        }
    }

    #[inline]
    pub async fn fetch_history(
        &self,
        session: &Session,
    ) -> Result<History, Error> {
        self.inner.fetch_history(session).await
    }

    #[inline]
    pub async fn send_chat_message(
        &self,
        session: &Session,
        text: &str,
    ) -> Result<ChatResult, Error> {
        self.inner.send_chat_message(session, text).await
    }

    #[inline]
    pub async fn delete_history(
        &self,
        session: &Session,
    ) -> Result<DeleteOutcome, Error> {
        self.inner.delete_history(session).await
    }
}

#[cfg(test)]
mod tests {
    use bubble_chat_protocol::{Message, SessionBuilder};
    use bubble_chat_test_transport::{
        Call, PresetChat, PresetDelete, PresetHistory, TestTransport,
    };

    use super::*;

    #[tokio::test]
    async fn test_forwarding() {
        let transport = TestTransport::default();
        transport.add_history_response(PresetHistory::Messages(vec![
            Message::bot("Welcome back"),
        ]));
        transport.add_chat_response(PresetChat::success("Hi there"));
        transport.add_delete_response(PresetDelete::Deleted);

        let client = TransportClient::new(transport.clone());
        let session = SessionBuilder::with_identity("u-1", "k").build().unwrap();

        let history = client.clone().fetch_history(&session).await.unwrap();
        assert_eq!(history.messages(), &[Message::bot("Welcome back")]);
        // The script is exhausted now, and the error passes through as is.
        let err = client.fetch_history(&session).await.unwrap_err();
        assert_eq!(err.message(), "no preset history response left");

        let reply = client.send_chat_message(&session, "Hello").await.unwrap();
        assert!(matches!(reply, ChatResult::Enveloped(_)));
        let outcome = client.delete_history(&session).await.unwrap();
        assert_eq!(outcome, DeleteOutcome::Deleted);

        assert_eq!(
            transport.calls()[2],
            Call::SendChatMessage {
                user_id: "u-1".to_owned(),
                text: "Hello".to_owned(),
            }
        );
    }
}
