//! Interpretation of chat replies, in both response modes.
//!
//! A streamed reply is a sequence of raw byte chunks with no framing and no
//! in-band completion marker; the end of the stream is the end of the reply.
//! An enveloped reply is a single, already decoded [`Envelope`].

use std::mem;

use bubble_chat_protocol::{Envelope, Message};

use crate::Phrases;

/// An incremental UTF-8 decoder.
///
/// Multi-byte sequences split across chunks are held back until the rest
/// arrives. Invalid sequences decode to U+FFFD.
#[derive(Clone, Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    /// Decodes as much of `chunk` (after any held-back bytes) as possible.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut bytes = mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut decoded = String::with_capacity(bytes.len());
        let mut rest = bytes.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    decoded.push_str(valid);
                    break;
                }
                Err(err) => {
                    let (valid, invalid) = rest.split_at(err.valid_up_to());
                    decoded.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        Some(len) => {
                            decoded.push(char::REPLACEMENT_CHARACTER);
                            rest = &invalid[len..];
                        }
                        None => {
                            // Incomplete sequence at the end of the input.
                            self.pending = invalid.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        decoded
    }

    /// Flushes bytes still held back, lossily.
    pub fn finish(&mut self) -> String {
        let pending = mem::take(&mut self.pending);
        String::from_utf8_lossy(&pending).into_owned()
    }
}

/// What changed after feeding a chunk to a [`StreamInterpreter`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Progress {
    /// The content grew and should be rendered again.
    pub changed: bool,
    /// This is the first visible content; the pending indicator should be
    /// retired now.
    pub retire_indicator: bool,
}

/// Accumulates a streamed reply.
#[derive(Clone, Debug, Default)]
pub struct StreamInterpreter {
    decoder: Utf8Decoder,
    content: String,
    saw_visible: bool,
}

impl StreamInterpreter {
    /// Creates an empty interpreter.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds the next chunk of the body.
    #[inline]
    pub fn feed(&mut self, chunk: &[u8]) -> Progress {
        let piece = self.decoder.decode(chunk);
        self.push(&piece)
    }

    /// Signals the end of the body.
    #[inline]
    pub fn finish(&mut self) -> Progress {
        let piece = self.decoder.finish();
        self.push(&piece)
    }

    /// Returns the text received so far.
    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns `true` if nothing but whitespace has been received.
    #[inline]
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }

    fn push(&mut self, piece: &str) -> Progress {
        if piece.is_empty() {
            return Progress::default();
        }
        self.content.push_str(piece);

        let retire_indicator = !self.saw_visible && !piece.trim().is_empty();
        self.saw_visible |= retire_indicator;
        Progress {
            changed: true,
            retire_indicator,
        }
    }
}

/// The bot message an enveloped reply turns into.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EnvelopeReply {
    /// The reply text, to be rendered like any bot message.
    Answer(Message),
    /// A bot-authored error message. It carries server-supplied text and is
    /// only ever shown as plain text.
    Failure(Message),
}

impl EnvelopeReply {
    /// Returns the message to show.
    #[inline]
    pub fn message(&self) -> &Message {
        match self {
            EnvelopeReply::Answer(message) | EnvelopeReply::Failure(message) => {
                message
            }
        }
    }
}

/// Turns an enveloped reply into the bot message to show.
///
/// A failure becomes a bot-authored error message rather than an error.
pub fn interpret_envelope(
    envelope: Envelope,
    phrases: &Phrases,
) -> EnvelopeReply {
    match envelope {
        Envelope::Success(text) => EnvelopeReply::Answer(Message::bot(text)),
        Envelope::Failure(reason) => EnvelopeReply::Failure(Message::bot(
            phrases.describe_reply_failure(&reason),
        )),
    }
}
