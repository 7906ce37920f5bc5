//! The conversation as presented to the user, and the events that keep a
//! display surface in sync with it.

use std::fmt::{self, Debug};

use bubble_chat_protocol::{Message, Role};
use serde::Serialize;

use crate::Stage;
use crate::render::Rendered;

/// The transient pending indicator.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Indicator {
    /// The bot is preparing a reply.
    Typing,
    /// History is being loaded.
    Loading {
        /// Text shown next to the indicator.
        label: String,
    },
}

/// A message together with its displayable form.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ViewItem {
    /// The message.
    pub message: Message,
    /// How the message is displayed.
    pub rendered: Rendered,
}

/// A change the display surface has to apply.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ViewEvent {
    /// The controller moved to another stage.
    StageChanged {
        /// The new stage.
        stage: Stage,
    },
    /// The input box should be emptied.
    InputCleared,
    /// The input affordance should be enabled or disabled.
    InputEnabled {
        /// Whether input is accepted.
        enabled: bool,
    },
    /// The pending indicator appeared below the last message.
    IndicatorShown {
        /// The indicator to show.
        indicator: Indicator,
    },
    /// The pending indicator went away.
    IndicatorRetired,
    /// A message was appended at `index`.
    MessageAppended {
        /// Position of the message.
        index: usize,
        /// The message.
        item: ViewItem,
    },
    /// The message at `index` changed.
    MessageUpdated {
        /// Position of the message.
        index: usize,
        /// The message.
        item: ViewItem,
    },
    /// The message at `index` was removed.
    MessageRemoved {
        /// Position of the message.
        index: usize,
    },
    /// All messages were removed.
    Cleared,
    /// The surface should scroll to the newest content on its next paint.
    ScrollToBottom,
    /// The user has to confirm a destructive action.
    ConfirmationRequested {
        /// The question to ask.
        prompt: String,
    },
    /// The chat window was opened or closed.
    VisibilityChanged {
        /// Whether the window is open.
        visible: bool,
    },
}

pub(crate) type EventSink = Box<dyn Fn(ViewEvent) + Send + Sync>;

/// Ordered messages plus at most one pending indicator.
///
/// Every mutation is published to the attached event sink, followed by
/// [`ViewEvent::ScrollToBottom`] when content changed.
#[derive(Default)]
pub struct ConversationView {
    items: Vec<ViewItem>,
    indicator: Option<Indicator>,
    on_event: Option<EventSink>,
}

impl ConversationView {
    /// Creates an empty view with no event sink.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty view publishing its events to `on_event`.
    #[inline]
    pub fn with_event_sink(
        on_event: impl Fn(ViewEvent) + Send + Sync + 'static,
    ) -> Self {
        Self {
            items: vec![],
            indicator: None,
            on_event: Some(Box::new(on_event)),
        }
    }

    pub(crate) fn from_sink(on_event: Option<EventSink>) -> Self {
        Self {
            items: vec![],
            indicator: None,
            on_event,
        }
    }

    /// Returns the items in display order.
    #[inline]
    pub fn items(&self) -> &[ViewItem] {
        &self.items
    }

    /// Returns the messages in display order.
    #[inline]
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.items.iter().map(|item| &item.message)
    }

    /// Returns the pending indicator, if one is shown.
    #[inline]
    pub fn indicator(&self) -> Option<&Indicator> {
        self.indicator.as_ref()
    }

    /// Appends a message and returns its index.
    pub fn append(&mut self, message: Message, rendered: Rendered) -> usize {
        let index = self.items.len();
        let item = ViewItem { message, rendered };
        self.items.push(item.clone());
        self.emit(ViewEvent::MessageAppended { index, item });
        self.emit(ViewEvent::ScrollToBottom);
        index
    }

    /// Replaces the content of the message at `index`. The role is kept.
    pub fn update(&mut self, index: usize, content: &str, rendered: Rendered) {
        let Some(item) = self.items.get_mut(index) else {
            warn!("no message at index {index} to update");
            return;
        };
        item.message.content.clear();
        item.message.content.push_str(content);
        item.rendered = rendered;
        let item = item.clone();
        self.emit(ViewEvent::MessageUpdated { index, item });
        self.emit(ViewEvent::ScrollToBottom);
    }

    /// Removes the message at `index`.
    pub fn remove(&mut self, index: usize) -> Option<ViewItem> {
        if index >= self.items.len() {
            return None;
        }
        let item = self.items.remove(index);
        self.emit(ViewEvent::MessageRemoved { index });
        Some(item)
    }

    /// Removes all messages. The indicator is left alone.
    pub fn clear(&mut self) {
        self.items.clear();
        self.emit(ViewEvent::Cleared);
    }

    /// Shows `indicator`, replacing the current one if any.
    pub fn show_indicator(&mut self, indicator: Indicator) {
        self.retire_indicator();
        self.indicator = Some(indicator.clone());
        self.emit(ViewEvent::IndicatorShown { indicator });
        self.emit(ViewEvent::ScrollToBottom);
    }

    /// Retires the indicator. Returns `false` if none was shown.
    pub fn retire_indicator(&mut self) -> bool {
        if self.indicator.take().is_none() {
            return false;
        }
        self.emit(ViewEvent::IndicatorRetired);
        true
    }

    /// Returns `true` if any message has no content.
    #[inline]
    pub fn has_empty_message(&self) -> bool {
        self.items.iter().any(|item| item.message.content.is_empty())
    }

    /// Counts the messages authored by `role`.
    #[inline]
    pub fn count(&self, role: Role) -> usize {
        self.messages().filter(|m| m.role == role).count()
    }

    #[inline]
    pub(crate) fn emit(&self, event: ViewEvent) {
        trace!("view event: {event:?}");
        if let Some(on_event) = &self.on_event {
            on_event(event);
        }
    }
}

impl Debug for ConversationView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversationView")
            .field("items", &self.items)
            .field("indicator", &self.indicator)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use serde_json::json;

    use super::*;

    fn recording_view() -> (ConversationView, Arc<Mutex<Vec<ViewEvent>>>) {
        let events = Arc::new(Mutex::new(vec![]));
        let view = ConversationView::with_event_sink({
            let events = Arc::clone(&events);
            move |event| events.lock().unwrap().push(event)
        });
        (view, events)
    }

    #[test]
    fn test_indicator_never_stacks() {
        let (mut view, events) = recording_view();
        view.show_indicator(Indicator::Typing);
        view.show_indicator(Indicator::Loading {
            label: "Loading".to_owned(),
        });
        assert_eq!(
            view.indicator(),
            Some(&Indicator::Loading {
                label: "Loading".to_owned()
            })
        );
        assert!(view.retire_indicator());
        assert!(!view.retire_indicator());

        let events = events.lock().unwrap();
        let shown = events
            .iter()
            .filter(|e| matches!(e, ViewEvent::IndicatorShown { .. }))
            .count();
        let retired = events
            .iter()
            .filter(|e| matches!(e, ViewEvent::IndicatorRetired))
            .count();
        assert_eq!((shown, retired), (2, 2));
    }

    #[test]
    fn test_mutations() {
        let (mut view, events) = recording_view();
        let index =
            view.append(Message::bot(""), Rendered::Plain(String::new()));
        assert!(view.has_empty_message());
        view.update(index, "Hello", Rendered::Plain("Hello".to_owned()));
        assert_eq!(view.messages().next(), Some(&Message::bot("Hello")));
        assert_eq!(view.count(Role::Bot), 1);

        view.update(7, "nope", Rendered::Plain("nope".to_owned()));
        assert!(view.remove(7).is_none());
        assert!(view.remove(index).is_some());
        assert!(view.items().is_empty());

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 5);
        assert_eq!(events[1], ViewEvent::ScrollToBottom);
        assert_eq!(events[4], ViewEvent::MessageRemoved { index: 0 });
    }

    #[test]
    fn test_serialize_events() {
        let event = ViewEvent::MessageAppended {
            index: 0,
            item: ViewItem {
                message: Message::user("Hi"),
                rendered: Rendered::Plain("Hi".to_owned()),
            },
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "event": "message_appended",
                "index": 0,
                "item": {
                    "message": { "role": "user", "content": "Hi" },
                    "rendered": { "format": "plain", "text": "Hi" },
                },
            })
        );
        assert_eq!(
            serde_json::to_value(ViewEvent::IndicatorShown {
                indicator: Indicator::Typing
            })
            .unwrap(),
            json!({ "event": "indicator_shown", "indicator": { "kind": "typing" } })
        );
        assert_eq!(
            serde_json::to_value(ViewEvent::StageChanged {
                stage: Stage::AwaitingEnvelope
            })
            .unwrap(),
            json!({ "event": "stage_changed", "stage": "awaiting_envelope" })
        );
    }
}
