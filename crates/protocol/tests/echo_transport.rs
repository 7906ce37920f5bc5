use std::collections::VecDeque;
use std::future::ready;
use std::time::Duration;

use bubble_chat_protocol::{
    ChatResult, ChatStream, ChatTransport, DeleteOutcome, Envelope, Error,
    ErrorKind, History, Message, Session, SessionBuilder,
};
use bytes::Bytes;
use futures_util::stream;
use tokio::time::sleep;

/// Echoes every message back word by word, and keeps no history.
struct EchoTransport;

impl ChatTransport for EchoTransport {
    fn fetch_history(
        &self,
        session: &Session,
    ) -> impl Future<Output = Result<History, Error>> + Send + 'static {
        let greeting = format!("Welcome back, {}", session.user_id());
        ready(Ok(History::from_messages(vec![Message::bot(greeting)])))
    }

    fn send_chat_message(
        &self,
        _session: &Session,
        text: &str,
    ) -> impl Future<Output = Result<ChatResult, Error>> + Send + 'static {
        let result = 'blk: {
            if text.is_empty() {
                break 'blk Err(Error::chat_send(Some(422), "empty query"));
            }
            if text == "ping" {
                break 'blk Ok(ChatResult::Enveloped(Envelope::Success(
                    "pong".to_owned(),
                )));
            }

            let words: VecDeque<String> = format!("You said {text}")
                .split(' ')
                .map(ToString::to_string)
                .collect();
            let chunks = stream::unfold(words, |mut words| async move {
                sleep(Duration::from_millis(1)).await;
                let mut word = words.pop_front()?;
                if !words.is_empty() {
                    word.push(' ');
                }
                Some((Ok(Bytes::from(word)), words))
            });
            Ok(ChatResult::Streamed(ChatStream::new(chunks)))
        };
        ready(result)
    }

    fn delete_history(
        &self,
        _session: &Session,
    ) -> impl Future<Output = Result<DeleteOutcome, Error>> + Send + 'static {
        ready(Ok(DeleteOutcome::Unexpected(202)))
    }
}

mod tests {
    use super::*;

    fn session() -> Session {
        SessionBuilder::with_identity("u-42", "k-42").build().unwrap()
    }

    #[tokio::test]
    async fn test_streamed_reply() {
        let transport = EchoTransport;
        let result = transport
            .send_chat_message(&session(), "Good morning")
            .await
            .unwrap();
        let mut stream = match result {
            ChatResult::Streamed(stream) => stream,
            other => unreachable!("unexpected result: {other:?}"),
        };

        let mut reply = String::new();
        while let Some(chunk) = stream.next_chunk().await.unwrap() {
            reply.push_str(std::str::from_utf8(&chunk).unwrap());
        }
        assert_eq!(reply, "You said Good morning");
    }

    #[tokio::test]
    async fn test_enveloped_reply() {
        let transport = EchoTransport;
        let result = transport.send_chat_message(&session(), "ping").await;
        assert!(matches!(
            result,
            Ok(ChatResult::Enveloped(Envelope::Success(ref text))) if text == "pong"
        ));
    }

    #[tokio::test]
    async fn test_error() {
        let transport = EchoTransport;
        let err = transport
            .send_chat_message(&session(), "")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ChatSend);
        assert_eq!(err.status(), Some(422));
    }

    #[tokio::test]
    async fn test_history_and_delete() {
        let transport = EchoTransport;
        let history = transport.fetch_history(&session()).await.unwrap();
        assert_eq!(history.messages(), &[Message::bot("Welcome back, u-42")]);

        let outcome = transport.delete_history(&session()).await.unwrap();
        assert_eq!(outcome, DeleteOutcome::Unexpected(202));
    }
}
