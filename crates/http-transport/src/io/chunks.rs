use bubble_chat_protocol::{ChatStream, Error};
use futures_util::stream;
use reqwest::Response;

/// Adapts an open response body into a [`ChatStream`].
///
/// The body is pulled one chunk at a time. A read failure ends the stream
/// after yielding the error.
pub fn into_chat_stream(response: Response) -> ChatStream {
    let chunks = stream::unfold(Some(response), |response| async move {
        let mut response = response?;
        match response.chunk().await {
            Ok(Some(chunk)) => {
                trace!("got a chunk of {} bytes", chunk.len());
                Some((Ok(chunk), Some(response)))
            }
            Ok(None) => None,
            Err(err) => {
                let err = Error::chat_send(None, format!("{err}"));
                Some((Err(err), None))
            }
        }
    });
    ChatStream::new(chunks)
}
