use std::sync::Arc;

use bubble_chat_protocol::{ChatTransport, Session};

use super::{Controller, Stage};
use crate::Phrases;
use crate::render::{self, MarkdownRenderer};
use crate::transport_client::TransportClient;
use crate::view::{ConversationView, EventSink, ViewEvent};

/// [`Controller`] builder.
pub struct ControllerBuilder {
    transport: TransportClient,
    session: Session,
    renderer: Option<Arc<dyn MarkdownRenderer>>,
    phrases: Phrases,
    on_view_event: Option<EventSink>,
}

impl ControllerBuilder {
    /// Creates a new builder with the specified transport and session.
    ///
    /// Bot messages are rendered as CommonMark when the `markdown` feature
    /// is enabled, and as plain text otherwise.
    #[inline]
    pub fn with_transport<T: ChatTransport + 'static>(
        transport: T,
        session: Session,
    ) -> Self {
        Self {
            transport: TransportClient::new(transport),
            session,
            renderer: render::default_renderer(),
            phrases: Phrases::default(),
            on_view_event: None,
        }
    }

    /// Renders bot messages with `renderer`.
    #[inline]
    pub fn with_renderer<R: MarkdownRenderer + 'static>(
        mut self,
        renderer: R,
    ) -> Self {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    /// Shows all messages as plain text.
    #[inline]
    pub fn without_markdown(mut self) -> Self {
        self.renderer = None;
        self
    }

    /// Sets the user-visible phrases.
    #[inline]
    pub fn with_phrases(mut self, phrases: Phrases) -> Self {
        self.phrases = phrases;
        self
    }

    /// Attaches a callback receiving every view event.
    #[inline]
    pub fn on_view_event(
        mut self,
        on_view_event: impl Fn(ViewEvent) + Send + Sync + 'static,
    ) -> Self {
        self.on_view_event = Some(Box::new(on_view_event));
        self
    }

    /// Builds the controller. It starts idle, closed, and with an empty
    /// view; nothing is fetched until the first intent.
    #[inline]
    pub fn build(self) -> Controller {
        let ControllerBuilder {
            transport,
            session,
            renderer,
            phrases,
            on_view_event,
        } = self;

        Controller {
            transport,
            session,
            renderer,
            phrases,
            view: ConversationView::from_sink(on_view_event),
            stage: Stage::Idle,
            visible: false,
        }
    }
}
