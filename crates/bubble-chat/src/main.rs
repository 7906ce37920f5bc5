//! A terminal front end for the widget, talking to a real backend.
//!
//! Settings come from `BUBBLE_CHAT_*` environment variables.

#[macro_use]
extern crate tracing;

use std::collections::HashMap;
use std::io::Write as _;
use std::time::Duration;

use bubble_chat::core::Stage;
use bubble_chat::core::view::{Indicator, ViewEvent, ViewItem};
use bubble_chat::protocol::Role;
use bubble_chat::{Settings, Widget, WidgetBuilder, WidgetHandle};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio::io::{
    self, AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin,
};
use tokio::sync::mpsc::{self, UnboundedReceiver};

const BAR_CHAR: &str = "▎";

/// Stdin stays buffered across prompts, so piped lines aren't lost.
type Input = Lines<BufReader<Stdin>>;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("{err}");
            return;
        }
    };
    debug!("settings: {settings:?}");

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let builder = WidgetBuilder::with_settings(settings)
        .without_markdown()
        .on_view_event(move |event| {
            event_tx.send(event).ok();
        });

    let mut widget = Widget::new();
    if widget.init(builder).is_err() {
        let mut printer = Printer::default();
        while let Ok(event) = event_rx.try_recv() {
            printer.print(event);
        }
        return;
    }
    let Some(handle) = widget.handle().cloned() else {
        return;
    };

    let mut input = BufReader::new(io::stdin()).lines();
    let mut printer = Printer::default();
    // The history is loaded right after initialization.
    let idle = printer.run_until_idle(&mut event_rx, &handle, &mut input);
    if !idle.await {
        return;
    }

    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = read_line(&mut input).await else {
            break;
        };
        let result = match line.trim() {
            "" => continue,
            "/quit" => break,
            "/delete" => handle.request_delete(),
            "/reload" => handle.load_history(),
            text => handle.submit(text),
        };
        if let Err(err) = result {
            eprintln!("{err}");
            break;
        }

        let idle = printer.run_until_idle(&mut event_rx, &handle, &mut input);
        if !idle.await {
            break;
        }
    }
}

#[derive(Default)]
struct Printer {
    spinner: Option<ProgressBar>,
    /// Bytes of each message already written to the terminal.
    printed: HashMap<usize, usize>,
    line_open: bool,
}

impl Printer {
    /// Prints events until the widget becomes idle. Returns `false` if the
    /// widget or the input went away.
    async fn run_until_idle(
        &mut self,
        event_rx: &mut UnboundedReceiver<ViewEvent>,
        handle: &WidgetHandle,
        input: &mut Input,
    ) -> bool {
        loop {
            let Some(event) = event_rx.recv().await else {
                return false;
            };
            match event {
                ViewEvent::StageChanged { stage: Stage::Idle } => {
                    self.close_line();
                    return true;
                }
                ViewEvent::ConfirmationRequested { prompt } => {
                    self.close_line();
                    print!("{}{prompt} [y/N]: ", BAR_CHAR.bright_yellow());
                    std::io::stdout().flush().ok();

                    let Some(line) = read_line(input).await else {
                        return false;
                    };
                    let result = if line.trim().eq_ignore_ascii_case("y") {
                        handle.confirm_delete()
                    } else {
                        handle.cancel_delete()
                    };
                    if result.is_err() {
                        return false;
                    }
                }
                event => self.print(event),
            }
        }
    }

    fn print(&mut self, event: ViewEvent) {
        match event {
            ViewEvent::IndicatorShown { indicator } => {
                self.close_line();
                self.show_spinner(indicator);
            }
            ViewEvent::IndicatorRetired => self.clear_spinner(),
            ViewEvent::MessageAppended { index, item } => {
                self.close_line();
                self.printed.insert(index, 0);
                self.print_item(index, &item);
            }
            ViewEvent::MessageUpdated { index, item } => {
                self.print_item(index, &item);
            }
            ViewEvent::MessageRemoved { index } => {
                self.printed.remove(&index);
            }
            ViewEvent::Cleared => {
                self.close_line();
                self.printed.clear();
                println!("{}", "────".dimmed());
            }
            _ => {}
        }
    }

    fn print_item(&mut self, index: usize, item: &ViewItem) {
        let content = &item.message.content;
        let printed = self.printed.get(&index).copied().unwrap_or_default();
        let Some(delta) = content.get(printed..) else {
            return;
        };
        if delta.is_empty() {
            return;
        }

        self.clear_spinner();
        if printed == 0 {
            match item.message.role {
                Role::User => print!("{}🙂 ", BAR_CHAR.bright_green()),
                Role::Bot => print!("{}🤖 ", BAR_CHAR.bright_cyan()),
            }
        }
        print!("{}", delta.bright_white());
        std::io::stdout().flush().ok();
        self.printed.insert(index, content.len());
        self.line_open = true;
    }

    fn show_spinner(&mut self, indicator: Indicator) {
        self.clear_spinner();
        let message = match indicator {
            Indicator::Typing => "🤔 Typing...".to_owned(),
            Indicator::Loading { label } => label,
        };
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {wide_msg}")
        {
            spinner.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
        }
        spinner.set_message(message);
        spinner.enable_steady_tick(Duration::from_millis(100));
        self.spinner = Some(spinner);
    }

    fn clear_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    fn close_line(&mut self) {
        if self.line_open {
            println!();
            self.line_open = false;
        }
    }
}

async fn read_line<R>(input: &mut Lines<R>) -> Option<String>
where
    R: AsyncBufRead + Unpin,
{
    match input.next_line().await {
        Ok(line) => line,
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
