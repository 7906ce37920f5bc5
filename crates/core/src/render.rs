//! Rendering of message text for display.

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use bubble_chat_protocol::{Message, Role};
use serde::Serialize;

/// The displayable form of a message.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "format", content = "text", rename_all = "snake_case")]
pub enum Rendered {
    /// Text to be shown verbatim.
    Plain(String),
    /// Markup produced by a [`MarkdownRenderer`].
    Markup(String),
}

impl Rendered {
    /// Returns the rendered text, whatever its format.
    #[inline]
    pub fn as_str(&self) -> &str {
        match self {
            Rendered::Plain(text) | Rendered::Markup(text) => text,
        }
    }
}

/// Error returned by a [`MarkdownRenderer`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RenderError {
    reason: String,
}

impl RenderError {
    /// Creates a new error with the given reason.
    #[inline]
    pub fn new<S: Into<String>>(reason: S) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Returns the reason of this error.
    #[inline]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to render markdown: {}", self.reason)
    }
}

impl StdError for RenderError {}

/// Converts markdown source to display markup.
pub trait MarkdownRenderer: Send + Sync {
    /// Renders `source`. Called again with the whole text every time a
    /// streamed message grows.
    fn render(&self, source: &str) -> Result<String, RenderError>;
}

/// A CommonMark renderer producing HTML.
#[cfg(feature = "markdown")]
#[derive(Clone, Copy, Debug, Default)]
pub struct CommonMarkRenderer;

#[cfg(feature = "markdown")]
impl MarkdownRenderer for CommonMarkRenderer {
    fn render(&self, source: &str) -> Result<String, RenderError> {
        use pulldown_cmark::{Options, Parser, html};

        let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
        let parser = Parser::new_ext(source, options);
        let mut markup = String::with_capacity(source.len() * 3 / 2);
        html::push_html(&mut markup, parser);
        Ok(markup)
    }
}

pub(crate) fn default_renderer() -> Option<Arc<dyn MarkdownRenderer>> {
    #[cfg(feature = "markdown")]
    {
        Some(Arc::new(CommonMarkRenderer))
    }
    #[cfg(not(feature = "markdown"))]
    {
        None
    }
}

/// Renders a message for display.
///
/// User text is never interpreted. Bot text goes through `renderer` when
/// there is one, and falls back to plain text if rendering fails.
pub fn render_message(
    renderer: Option<&dyn MarkdownRenderer>,
    message: &Message,
) -> Rendered {
    let renderer = match (message.role, renderer) {
        (Role::Bot, Some(renderer)) => renderer,
        _ => return Rendered::Plain(message.content.clone()),
    };
    match renderer.render(&message.content) {
        Ok(markup) => Rendered::Markup(markup),
        Err(err) => {
            warn!("{err}, showing plain text instead");
            Rendered::Plain(message.content.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingRenderer;

    impl MarkdownRenderer for FailingRenderer {
        fn render(&self, _source: &str) -> Result<String, RenderError> {
            Err(RenderError::new("broken"))
        }
    }

    #[test]
    fn test_render_without_renderer() {
        let rendered = render_message(None, &Message::bot("**hi**"));
        assert_eq!(rendered, Rendered::Plain("**hi**".to_owned()));
    }

    #[test]
    fn test_render_failure_falls_back() {
        let rendered =
            render_message(Some(&FailingRenderer), &Message::bot("**hi**"));
        assert_eq!(rendered, Rendered::Plain("**hi**".to_owned()));
    }

    #[cfg(feature = "markdown")]
    #[test]
    fn test_common_mark() {
        let renderer = CommonMarkRenderer;
        assert_eq!(
            render_message(Some(&renderer), &Message::bot("**hi**")),
            Rendered::Markup("<p><strong>hi</strong></p>\n".to_owned())
        );
        // User input is shown as typed.
        assert_eq!(
            render_message(Some(&renderer), &Message::user("**hi**")),
            Rendered::Plain("**hi**".to_owned())
        );
    }

    #[test]
    fn test_serialize() {
        let value = serde_json::to_value(Rendered::Markup("<p>x</p>".to_owned()))
            .unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "format": "markup", "text": "<p>x</p>" })
        );
    }
}
