use bubble_chat_protocol::{
    ChatResult, ChatStream, DeleteOutcome, Error, History, Message,
};
use serde::Serialize;

use super::Controller;
use crate::interpreter::{
    self, EnvelopeReply, Progress, StreamInterpreter,
};
use crate::render::{self, Rendered};
use crate::view::{Indicator, ViewEvent};

/// The stage a [`Controller`] is in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Waiting for input. No indicator is shown.
    #[default]
    Idle,
    /// A chat message was sent and no reply has arrived yet.
    Sending,
    /// A streamed reply is being consumed.
    Streaming,
    /// An enveloped reply arrived and is being rendered.
    AwaitingEnvelope,
    /// The history is being (re)loaded.
    ShowingHistory,
    /// A delete request waits for the user's confirmation.
    ConfirmingDelete,
    /// A confirmed delete request is in flight.
    Deleting,
}

impl Controller {
    /// Sends `text` as a chat message and renders the reply.
    ///
    /// Blank input is ignored. The trimmed text is echoed before any network
    /// call is made.
    pub async fn submit(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            debug!("ignoring blank input");
            return;
        }
        if self.stage != Stage::Idle {
            warn!("ignoring input submitted in stage {:?}", self.stage);
            return;
        }

        self.append(Message::user(text));
        self.view.emit(ViewEvent::InputCleared);
        self.enter_busy(Stage::Sending);
        self.view.show_indicator(Indicator::Typing);

        let result =
            self.transport.send_chat_message(&self.session, text).await;
        match result {
            Ok(ChatResult::Streamed(stream)) => {
                self.consume_stream(stream).await;
            }
            Ok(ChatResult::Enveloped(envelope)) => {
                self.set_stage(Stage::AwaitingEnvelope);
                self.view.retire_indicator();
                match interpreter::interpret_envelope(envelope, &self.phrases)
                {
                    EnvelopeReply::Answer(reply) => {
                        self.append(reply);
                    }
                    EnvelopeReply::Failure(reply) => {
                        self.append_plain(reply);
                    }
                }
            }
            Err(err) => {
                error!("failed to send chat message: {err}");
                self.view.retire_indicator();
                self.append_error(&err);
            }
        }

        self.return_to_idle();
    }

    /// Clears the view and shows the stored history, or the greeting if
    /// there is none.
    pub async fn load_history(&mut self) {
        if self.stage != Stage::Idle {
            warn!("not loading history in stage {:?}", self.stage);
            return;
        }

        self.enter_busy(Stage::ShowingHistory);
        self.view.clear();
        self.view.show_indicator(Indicator::Loading {
            label: self.phrases.loading_history.clone(),
        });

        let result = self.transport.fetch_history(&self.session).await;
        self.view.retire_indicator();
        match result {
            Ok(History::Messages(messages)) => {
                debug!("showing {} messages from history", messages.len());
                for message in messages {
                    self.append(message);
                }
            }
            Ok(History::Empty) => self.append_greeting(),
            Err(err) => {
                error!("failed to load history: {err}");
                self.append_error(&err);
                self.append_greeting();
            }
        }

        self.return_to_idle();
    }

    /// Asks the user to confirm deleting the history. Nothing is sent until
    /// [`Controller::confirm_delete`].
    pub fn request_delete(&mut self) {
        if self.stage != Stage::Idle {
            warn!("not requesting delete in stage {:?}", self.stage);
            return;
        }
        self.set_stage(Stage::ConfirmingDelete);
        self.view.emit(ViewEvent::ConfirmationRequested {
            prompt: self.phrases.delete_prompt.clone(),
        });
    }

    /// Deletes the history after the user confirmed it.
    pub async fn confirm_delete(&mut self) {
        if self.stage != Stage::ConfirmingDelete {
            warn!("no pending delete request to confirm");
            return;
        }

        self.enter_busy(Stage::Deleting);
        match self.transport.delete_history(&self.session).await {
            Ok(DeleteOutcome::Deleted) => {
                info!("history deleted");
                self.view.clear();
                self.append_greeting();
            }
            Ok(DeleteOutcome::Unexpected(status)) => {
                warn!("history delete ended with status {status}");
                let text = self.phrases.delete_unexpected.clone();
                self.append_plain(Message::bot(text));
            }
            Err(err) => {
                error!("failed to delete history: {err}");
                self.append_error(&err);
            }
        }

        self.return_to_idle();
    }

    /// Drops a pending delete request. The view is left untouched.
    pub fn cancel_delete(&mut self) {
        if self.stage != Stage::ConfirmingDelete {
            debug!("no pending delete request to cancel");
            return;
        }
        self.set_stage(Stage::Idle);
    }

    /// Opens or closes the chat window. Opening reloads the history.
    pub async fn toggle_open(&mut self) {
        self.visible = !self.visible;
        self.view.emit(ViewEvent::VisibilityChanged {
            visible: self.visible,
        });
        if self.visible {
            self.load_history().await;
        }
    }

    async fn consume_stream(&mut self, mut stream: ChatStream) {
        self.set_stage(Stage::Streaming);
        let index = self.append(Message::bot(""));
        let mut interpreter = StreamInterpreter::new();

        let failure = loop {
            match stream.next_chunk().await {
                Ok(Some(chunk)) => {
                    trace!("got a chunk of {} bytes", chunk.len());
                    let progress = interpreter.feed(&chunk);
                    self.apply_progress(index, progress, &interpreter);
                }
                Ok(None) => break None,
                Err(err) => break Some(err),
            }
        };
        let progress = interpreter.finish();
        self.apply_progress(index, progress, &interpreter);

        if interpreter.is_blank() {
            debug!("stream ended without content");
            self.view.remove(index);
        }
        self.view.retire_indicator();
        if let Some(err) = failure {
            error!("stream broke off: {err}");
            self.append_error(&err);
        }
    }

    fn apply_progress(
        &mut self,
        index: usize,
        progress: Progress,
        interpreter: &StreamInterpreter,
    ) {
        if progress.retire_indicator {
            self.view.retire_indicator();
        }
        if progress.changed {
            let content = interpreter.content();
            let rendered = render::render_message(
                self.renderer.as_deref(),
                &Message::bot(content),
            );
            self.view.update(index, content, rendered);
        }
    }

    fn append(&mut self, message: Message) -> usize {
        let rendered =
            render::render_message(self.renderer.as_deref(), &message);
        self.view.append(message, rendered)
    }

    fn append_plain(&mut self, message: Message) -> usize {
        let rendered = Rendered::Plain(message.content.clone());
        self.view.append(message, rendered)
    }

    #[inline]
    fn append_error(&mut self, err: &Error) {
        let text = self.phrases.describe(err);
        self.append_plain(Message::bot(text));
    }

    #[inline]
    fn append_greeting(&mut self) {
        let greeting = self.phrases.greeting.clone();
        self.append(Message::bot(greeting));
    }

    fn enter_busy(&mut self, stage: Stage) {
        self.set_stage(stage);
        self.view.emit(ViewEvent::InputEnabled { enabled: false });
    }

    fn return_to_idle(&mut self) {
        self.view.retire_indicator();
        self.set_stage(Stage::Idle);
        self.view.emit(ViewEvent::InputEnabled { enabled: true });
    }

    fn set_stage(&mut self, stage: Stage) {
        if self.stage == stage {
            return;
        }
        trace!("stage {:?} -> {stage:?}", self.stage);
        self.stage = stage;
        self.view.emit(ViewEvent::StageChanged { stage });
    }
}
