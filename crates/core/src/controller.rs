mod builder;
mod state;

use std::sync::Arc;

use bubble_chat_protocol::Session;

use crate::Phrases;
use crate::render::MarkdownRenderer;
use crate::transport_client::TransportClient;
use crate::view::ConversationView;
pub use builder::ControllerBuilder;
pub use state::Stage;

/// A user intent the controller reacts to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Intent {
    /// Sends the text as a chat message.
    Submit(String),
    /// Opens or closes the chat window. Opening reloads the history.
    ToggleOpen,
    /// Reloads the history.
    LoadHistory,
    /// Asks for confirmation before deleting the history.
    RequestDelete,
    /// Confirms a pending delete request.
    ConfirmDelete,
    /// Cancels a pending delete request.
    CancelDelete,
}

/// The state machine behind a chat widget.
///
/// A controller owns the conversation view and talks to the backend through
/// a transport. Every operation takes `&mut self` and runs to completion, so
/// operations never interleave; while one is in progress, the view reports
/// input as disabled.
pub struct Controller {
    transport: TransportClient,
    session: Session,
    renderer: Option<Arc<dyn MarkdownRenderer>>,
    phrases: Phrases,
    view: ConversationView,
    stage: Stage,
    visible: bool,
}

impl Controller {
    /// Handles an intent.
    pub async fn dispatch(&mut self, intent: Intent) {
        debug!("dispatching {intent:?} in stage {:?}", self.stage);
        match intent {
            Intent::Submit(text) => self.submit(&text).await,
            Intent::ToggleOpen => self.toggle_open().await,
            Intent::LoadHistory => self.load_history().await,
            Intent::RequestDelete => self.request_delete(),
            Intent::ConfirmDelete => self.confirm_delete().await,
            Intent::CancelDelete => self.cancel_delete(),
        }
    }

    /// Returns the conversation view.
    #[inline]
    pub fn view(&self) -> &ConversationView {
        &self.view
    }

    /// Returns the current stage.
    #[inline]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Returns `true` if the chat window is open.
    #[inline]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Returns the phrases used for user-visible text.
    #[inline]
    pub fn phrases(&self) -> &Phrases {
        &self.phrases
    }
}
