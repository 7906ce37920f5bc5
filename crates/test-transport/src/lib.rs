//! A scripted in-memory chat transport for testing purpose.

mod preset;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bubble_chat_protocol::{
    ChatResult, ChatStream, ChatTransport, DeleteOutcome, Envelope, Error,
    History, Session,
};
use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use tokio::time::sleep;

pub use preset::*;

/// A call received by [`TestTransport`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Call {
    /// `fetch_history` for this user.
    FetchHistory {
        /// The user id of the session.
        user_id: String,
    },
    /// `send_chat_message` for this user and text.
    SendChatMessage {
        /// The user id of the session.
        user_id: String,
        /// The message text.
        text: String,
    },
    /// `delete_history` for this user.
    DeleteHistory {
        /// The user id of the session.
        user_id: String,
    },
}

#[derive(Default)]
struct Script {
    history: VecDeque<PresetHistory>,
    chat: VecDeque<PresetChat>,
    delete: VecDeque<PresetDelete>,
    calls: Vec<Call>,
}

/// A local fake transport for testing purpose.
///
/// Before sending requests, you need to queue the responses for each
/// operation. Every call pops the next preset of its kind; when none is
/// left, the call fails. Clones share the same script, so a test can keep
/// one clone to inspect [`TestTransport::calls`] after handing the other to
/// the code under test.
#[derive(Clone, Default)]
pub struct TestTransport {
    script: Arc<Mutex<Script>>,
    delay: Option<Duration>,
}

impl TestTransport {
    /// Queues a history response.
    #[inline]
    pub fn add_history_response(&self, preset: PresetHistory) {
        self.lock().history.push_back(preset);
    }

    /// Queues a chat response.
    #[inline]
    pub fn add_chat_response(&self, preset: PresetChat) {
        self.lock().chat.push_back(preset);
    }

    /// Queues a delete response.
    #[inline]
    pub fn add_delete_response(&self, preset: PresetDelete) {
        self.lock().delete.push_back(preset);
    }

    /// Sleeps for `duration` before each response and each stream chunk.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns all calls received so far, in order.
    #[inline]
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    #[inline]
    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn pause(delay: Option<Duration>) {
    if let Some(delay) = delay {
        sleep(delay).await;
    }
}

fn make_stream(
    chunks: Vec<Bytes>,
    failure: Option<Error>,
    delay: Option<Duration>,
) -> ChatStream {
    let items = chunks
        .into_iter()
        .map(Ok)
        .chain(failure.map(Err))
        .collect::<Vec<_>>();
    ChatStream::new(stream::iter(items).then(move |item| async move {
        pause(delay).await;
        item
    }))
}

impl ChatTransport for TestTransport {
    fn fetch_history(
        &self,
        session: &Session,
    ) -> impl Future<Output = Result<History, Error>> + Send + 'static {
        let preset = {
            let mut script = self.lock();
            script.calls.push(Call::FetchHistory {
                user_id: session.user_id().to_owned(),
            });
            script.history.pop_front()
        };
        let delay = self.delay;

        async move {
            pause(delay).await;
            match preset {
                Some(PresetHistory::Messages(messages)) => {
                    Ok(History::from_messages(messages))
                }
                Some(PresetHistory::Failure(failure)) => {
                    Err(Error::history_fetch(failure.status, failure.message))
                }
                None => Err(Error::history_fetch(
                    None,
                    "no preset history response left",
                )),
            }
        }
    }

    fn send_chat_message(
        &self,
        session: &Session,
        text: &str,
    ) -> impl Future<Output = Result<ChatResult, Error>> + Send + 'static {
        let preset = {
            let mut script = self.lock();
            script.calls.push(Call::SendChatMessage {
                user_id: session.user_id().to_owned(),
                text: text.to_owned(),
            });
            script.chat.pop_front()
        };
        let delay = self.delay;

        async move {
            pause(delay).await;
            let preset = preset.ok_or_else(|| {
                Error::chat_send(None, "no preset chat response left")
            })?;
            let result = match preset {
                PresetChat::Stream(chunks) => {
                    let chunks = chunks.into_iter().map(Bytes::from).collect();
                    ChatResult::Streamed(make_stream(chunks, None, delay))
                }
                PresetChat::RawStream(chunks) => {
                    let chunks = chunks.into_iter().map(Bytes::from).collect();
                    ChatResult::Streamed(make_stream(chunks, None, delay))
                }
                PresetChat::BrokenStream { chunks, failure } => {
                    let chunks = chunks.into_iter().map(Bytes::from).collect();
                    let failure =
                        Error::chat_send(failure.status, failure.message);
                    ChatResult::Streamed(make_stream(
                        chunks,
                        Some(failure),
                        delay,
                    ))
                }
                PresetChat::Envelope { success, text } => {
                    ChatResult::Enveloped(if success {
                        Envelope::Success(text)
                    } else {
                        Envelope::Failure(text)
                    })
                }
                PresetChat::Failure(failure) => {
                    return Err(Error::chat_send(
                        failure.status,
                        failure.message,
                    ));
                }
            };
            Ok(result)
        }
    }

    fn delete_history(
        &self,
        session: &Session,
    ) -> impl Future<Output = Result<DeleteOutcome, Error>> + Send + 'static {
        let preset = {
            let mut script = self.lock();
            script.calls.push(Call::DeleteHistory {
                user_id: session.user_id().to_owned(),
            });
            script.delete.pop_front()
        };
        let delay = self.delay;

        async move {
            pause(delay).await;
            match preset {
                Some(PresetDelete::Deleted) => Ok(DeleteOutcome::Deleted),
                Some(PresetDelete::Unexpected(status)) => {
                    Ok(DeleteOutcome::Unexpected(status))
                }
                Some(PresetDelete::Failure(failure)) => {
                    Err(Error::history_delete(failure.status, failure.message))
                }
                None => Err(Error::history_delete(
                    None,
                    "no preset delete response left",
                )),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bubble_chat_protocol::{ErrorKind, Message, SessionBuilder};

    use super::*;

    async fn collect_stream(mut stream: ChatStream) -> (String, Option<Error>) {
        let mut text = String::new();
        loop {
            match stream.next_chunk().await {
                Ok(Some(chunk)) => {
                    text.push_str(std::str::from_utf8(&chunk).unwrap())
                }
                Ok(None) => return (text, None),
                Err(err) => return (text, Some(err)),
            }
        }
    }

    #[tokio::test]
    async fn test_scripted_responses() {
        let mut transport = TestTransport::default();
        transport.set_delay(Duration::from_millis(1));
        transport.add_history_response(PresetHistory::Messages(vec![
            Message::user("Hi"),
        ]));
        transport.add_chat_response(PresetChat::stream(["How ", "are ", "you?"]));
        transport.add_chat_response(PresetChat::BrokenStream {
            chunks: vec!["Par".to_owned()],
            failure: PresetFailure::network("reset by peer"),
        });
        transport.add_delete_response(PresetDelete::Unexpected(202));

        let session = SessionBuilder::with_identity("u-7", "k").build().unwrap();
        let history = transport.fetch_history(&session).await.unwrap();
        assert_eq!(history.messages(), &[Message::user("Hi")]);

        let ChatResult::Streamed(stream) =
            transport.send_chat_message(&session, "Hey").await.unwrap()
        else {
            panic!("expected a stream");
        };
        assert_eq!(collect_stream(stream).await, ("How are you?".to_owned(), None));

        let ChatResult::Streamed(stream) =
            transport.send_chat_message(&session, "Again").await.unwrap()
        else {
            panic!("expected a stream");
        };
        let (text, err) = collect_stream(stream).await;
        assert_eq!(text, "Par");
        assert_eq!(err.unwrap().message(), "reset by peer");

        let outcome = transport.delete_history(&session).await.unwrap();
        assert_eq!(outcome, DeleteOutcome::Unexpected(202));

        assert_eq!(
            transport.calls(),
            vec![
                Call::FetchHistory {
                    user_id: "u-7".to_owned()
                },
                Call::SendChatMessage {
                    user_id: "u-7".to_owned(),
                    text: "Hey".to_owned()
                },
                Call::SendChatMessage {
                    user_id: "u-7".to_owned(),
                    text: "Again".to_owned()
                },
                Call::DeleteHistory {
                    user_id: "u-7".to_owned()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_script_exhausted() {
        let transport = TestTransport::default();
        let session = SessionBuilder::with_identity("u-7", "k").build().unwrap();

        let err = transport.fetch_history(&session).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::HistoryFetch);
        let err = transport.send_chat_message(&session, "x").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ChatSend);
        let err = transport.delete_history(&session).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::HistoryDelete);
        assert_eq!(transport.calls().len(), 3);
    }
}
