use std::error::Error as StdError;
use std::fmt::{self, Display};

use bubble_chat_core::render::Rendered;
use bubble_chat_core::view::{ConversationView, ViewEvent};
use bubble_chat_core::{Controller, ControllerBuilder, Intent, Phrases};
use bubble_chat_http::HttpTransport;
use bubble_chat_protocol::{ChatTransport, Error, Message};
use tokio::sync::mpsc;
use tracing::Instrument;

use crate::Settings;

type EventSink = Box<dyn Fn(ViewEvent) + Send + Sync>;

/// [`Widget`] builder.
pub struct WidgetBuilder {
    settings: Settings,
    on_view_event: Option<EventSink>,
    markdown: bool,
}

impl WidgetBuilder {
    /// Creates a new builder with the specified settings.
    #[inline]
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings,
            on_view_event: None,
            markdown: true,
        }
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

    /// Shows bot messages as plain text instead of rendered markdown.
    #[inline]
    pub fn without_markdown(mut self) -> Self {
        self.markdown = false;
        self
    }

    /// Starts a widget talking to the backend over HTTP.
    ///
    /// Must be called within a tokio runtime.
    #[inline]
    pub fn build(self) -> Result<WidgetHandle, Error> {
        let transport = HttpTransport::new(self.settings.http_config());
        self.build_with_transport(transport)
    }

    /// Starts a widget using `transport`.
    ///
    /// The settings are validated first; a configuration error is shown to
    /// the user and returned, and nothing is started. Otherwise the history
    /// is loaded right away.
    ///
    /// Must be called within a tokio runtime.
    pub fn build_with_transport<T: ChatTransport + 'static>(
        self,
        transport: T,
    ) -> Result<WidgetHandle, Error> {
        let WidgetBuilder {
            settings,
            on_view_event,
            markdown,
        } = self;
        let phrases = settings.phrases();

        let session = match settings.session() {
            Ok(session) => session,
            Err(err) => {
                error!("invalid widget settings: {err}");
                if let Some(on_view_event) = on_view_event {
                    show_config_error(on_view_event, &phrases, &err);
                }
                return Err(err);
            }
        };

        let mut builder = ControllerBuilder::with_transport(transport, session)
            .with_phrases(phrases);
        if !markdown {
            builder = builder.without_markdown();
        }
        if let Some(on_view_event) = on_view_event {
            builder = builder.on_view_event(on_view_event);
        }

        let handle = WidgetHandle::spawn(builder.build());
        // The task holds the receiver, so this can't fail yet.
        handle.load_history().ok();
        Ok(handle)
    }
}

/// Shows a configuration error as the only message of an otherwise empty
/// view. No widget is started afterwards.
pub(crate) fn show_config_error(
    on_view_event: impl Fn(ViewEvent) + Send + Sync + 'static,
    phrases: &Phrases,
    err: &Error,
) {
    let mut view = ConversationView::with_event_sink(on_view_event);
    let text = phrases.describe(err);
    let rendered = Rendered::Plain(text.clone());
    view.append(Message::bot(text), rendered);
}

/// Error returned when the widget task has stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WidgetClosedError;

impl Display for WidgetClosedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "widget task has stopped")
    }
}

impl StdError for WidgetClosedError {}

/// Handle to a running widget.
///
/// Intents are queued and handled one at a time, in order. The widget task
/// ends when the last handle is dropped.
#[derive(Clone, Debug)]
pub struct WidgetHandle {
    intent_tx: mpsc::UnboundedSender<Intent>,
}

impl WidgetHandle {
    fn spawn(controller: Controller) -> Self {
        let (intent_tx, intent_rx) = mpsc::unbounded_channel();
        tokio::spawn(
            run_widget(controller, intent_rx)
                .instrument(trace_span!("widget")),
        );
        Self { intent_tx }
    }

    /// Queues an intent.
    #[inline]
    pub fn dispatch(&self, intent: Intent) -> Result<(), WidgetClosedError> {
        self.intent_tx.send(intent).map_err(|_| WidgetClosedError)
    }

    /// Sends `text` as a chat message.
    #[inline]
    pub fn submit<S: Into<String>>(
        &self,
        text: S,
    ) -> Result<(), WidgetClosedError> {
        self.dispatch(Intent::Submit(text.into()))
    }

    /// Opens or closes the chat window.
    #[inline]
    pub fn toggle_open(&self) -> Result<(), WidgetClosedError> {
        self.dispatch(Intent::ToggleOpen)
    }

    /// Reloads the history.
    #[inline]
    pub fn load_history(&self) -> Result<(), WidgetClosedError> {
        self.dispatch(Intent::LoadHistory)
    }

    /// Asks for confirmation before deleting the history.
    #[inline]
    pub fn request_delete(&self) -> Result<(), WidgetClosedError> {
        self.dispatch(Intent::RequestDelete)
    }

    /// Confirms a pending delete request.
    #[inline]
    pub fn confirm_delete(&self) -> Result<(), WidgetClosedError> {
        self.dispatch(Intent::ConfirmDelete)
    }

    /// Cancels a pending delete request.
    #[inline]
    pub fn cancel_delete(&self) -> Result<(), WidgetClosedError> {
        self.dispatch(Intent::CancelDelete)
    }
}

async fn run_widget(
    mut controller: Controller,
    mut intent_rx: mpsc::UnboundedReceiver<Intent>,
) {
    debug!("started");
    while let Some(intent) = intent_rx.recv().await {
        trace!("received intent: {intent:?}");
        controller
            .dispatch(intent)
            .instrument(trace_span!("handle intent"))
            .await;
        trace!("finished");
    }
    debug!("will terminate");
}

enum WidgetState {
    Uninitialized,
    Ready(WidgetHandle),
}

/// The widget entry point a host keeps around.
///
/// Initialization happens at most once; later calls are no-ops.
pub struct Widget {
    state: WidgetState,
}

impl Default for Widget {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Widget {
    /// Creates an uninitialized widget.
    #[inline]
    pub fn new() -> Self {
        Self {
            state: WidgetState::Uninitialized,
        }
    }

    /// Initializes the widget with an HTTP transport.
    ///
    /// Must be called within a tokio runtime.
    #[inline]
    pub fn init(&mut self, builder: WidgetBuilder) -> Result<(), Error> {
        self.init_with(|| builder.build())
    }

    /// Initializes the widget with `transport`.
    ///
    /// Must be called within a tokio runtime.
    #[inline]
    pub fn init_with_transport<T: ChatTransport + 'static>(
        &mut self,
        builder: WidgetBuilder,
        transport: T,
    ) -> Result<(), Error> {
        self.init_with(|| builder.build_with_transport(transport))
    }

    fn init_with<F>(&mut self, start: F) -> Result<(), Error>
    where
        F: FnOnce() -> Result<WidgetHandle, Error>,
    {
        if let WidgetState::Ready(_) = self.state {
            debug!("widget is already initialized");
            return Ok(());
        }
        self.state = WidgetState::Ready(start()?);
        info!("widget initialized");
        Ok(())
    }

    /// Returns the handle of an initialized widget.
    #[inline]
    pub fn handle(&self) -> Option<&WidgetHandle> {
        match &self.state {
            WidgetState::Ready(handle) => Some(handle),
            WidgetState::Uninitialized => None,
        }
    }

    /// Returns `true` if the widget has been initialized.
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.handle().is_some()
    }
}
