//! FFI bindings for the library.

use std::ffi::{CStr, c_char, c_void};
use std::ops::Deref;
use std::sync::LazyLock;

use bubble_chat_core::view::ViewEvent;
use bubble_chat_core::{Intent, Phrases};
use tokio::runtime::{Builder as RuntimeBuilder, Runtime};

use crate::widget::show_config_error;
use crate::{Settings, Widget, WidgetBuilder};

static TOKIO_RUNTIME: LazyLock<Runtime> = LazyLock::new(|| {
    RuntimeBuilder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .build()
        .expect("failed to start the tokio runtime")
});

/// Error codes returned by the C APIs.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    /// No error occurred.
    Ok = 0,
    /// Invalid parameters or strings.
    Invalid = 1,
    /// The settings can't be parsed or are incomplete. The reason has been
    /// shown to the user through the view event callback.
    Config = 2,
    /// The widget is not initialized, or its task has stopped.
    NotReady = 3,
}

/// Callbacks for the events from the widget.
///
/// Note that callback functions and `user_info` are assumed to be thread-safe
/// and able to send across the thread boundaries.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct WidgetCallbacks {
    /// User-defined data to be passed to the callbacks.
    pub user_info: *mut c_void,
    /// Callback to handle a view event.
    ///
    /// Parameters:
    /// - `user_info`: The user-defined data.
    /// - `event`: The event as a JSON object (not nul-terminated), e.g.
    ///   `{"event":"indicator_shown","indicator":{"kind":"typing"}}`.
    /// - `event_len`: Length of the event string.
    pub on_view_event:
        Option<unsafe extern "C" fn(*mut c_void, *const c_char, usize)>,
    /// Callback to free the user-defined data.
    pub free: Option<unsafe extern "C" fn(*mut c_void)>,
}

// SAFETY: `WidgetCallbacks` is guaranteed to be thread-safe by users.
unsafe impl Send for WidgetCallbacks {}
unsafe impl Sync for WidgetCallbacks {}

/// Creates an uninitialized widget.
///
/// The caller must free the widget with `bc_widget_free`, or the resources
/// will be leaked.
#[unsafe(no_mangle)]
pub extern "C" fn bc_widget_new() -> *mut c_void {
    Box::into_raw(Box::new(Widget::new())) as _
}

/// Initializes the widget and loads the history.
///
/// `settings_json` is a JSON object such as
/// `{"apiBase":"http://localhost:8000","userId":"42","userKey":"k"}`.
/// `callbacks` may be null. Calling this on an initialized widget does
/// nothing and returns `Ok`; the callbacks passed in are released then.
///
/// # Safety
///
/// `widget` must be a valid pointer returned from `bc_widget_new`. Strings
/// passed to this function must contain a valid nul terminator at the end of
/// the string. `callbacks` must be null or a valid pointer to a
/// `WidgetCallbacks` value, whose fields are either valid pointers or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn bc_widget_init(
    widget: *mut c_void,
    settings_json: *const c_char,
    callbacks: *const WidgetCallbacks,
) -> ErrorCode {
    /// Frees the user info once the event callback is dropped.
    struct Wrapper {
        callbacks: WidgetCallbacks,
    }

    impl Deref for Wrapper {
        type Target = WidgetCallbacks;

        fn deref(&self) -> &Self::Target {
            &self.callbacks
        }
    }

    impl Drop for Wrapper {
        fn drop(&mut self) {
            if let Some(free) = self.callbacks.free {
                // SAFETY: Assume the callback is valid.
                unsafe { free(self.callbacks.user_info) };
            }
        }
    }

    // SAFETY: Assume the caller has provided the valid pointer.
    let Ok(settings_json) = unsafe { CStr::from_ptr(settings_json) }.to_str()
    else {
        return ErrorCode::Invalid;
    };

    // SAFETY: Assume the pointer is null or valid.
    let on_view_event = unsafe { callbacks.as_ref() }.map(|callbacks| {
        let wrapper = Wrapper {
            callbacks: *callbacks,
        };
        move |event: ViewEvent| {
            let Some(on_view_event) = wrapper.on_view_event else {
                return;
            };
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(err) => {
                    error!("failed to serialize view event: {err}");
                    return;
                }
            };
            unsafe {
                on_view_event(
                    wrapper.user_info,
                    json.as_ptr() as *const _,
                    json.len(),
                )
            };
        }
    });

    let settings = match Settings::from_json(settings_json) {
        Ok(settings) => settings,
        Err(err) => {
            error!("{err}");
            if let Some(on_view_event) = on_view_event {
                show_config_error(on_view_event, &Phrases::default(), &err);
            }
            return ErrorCode::Config;
        }
    };

    let mut builder = WidgetBuilder::with_settings(settings);
    if let Some(on_view_event) = on_view_event {
        builder = builder.on_view_event(on_view_event);
    }

    // We must enter the runtime before initializing the widget, since it
    // spawns the widget task.
    let runtime = &*TOKIO_RUNTIME;
    let _enter = runtime.enter();

    // SAFETY: Assume the caller has provided the valid pointer.
    let widget = unsafe { &mut *(widget as *mut Widget) };
    match widget.init(builder) {
        Ok(()) => ErrorCode::Ok,
        Err(_) => ErrorCode::Config,
    }
}

/// Sends a chat message. Blank messages are ignored.
///
/// # Safety
///
/// `widget` must be a valid pointer returned from `bc_widget_new`. String
/// pointed by `text` must contain a valid nul terminator at the end of the
/// string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn bc_widget_submit(
    widget: *mut c_void,
    text: *const c_char,
) -> ErrorCode {
    let Ok(text) = unsafe { CStr::from_ptr(text) }.to_str() else {
        return ErrorCode::Invalid;
    };
    unsafe { dispatch(widget, Intent::Submit(text.to_owned())) }
}

/// Opens or closes the chat window. Opening reloads the history.
///
/// # Safety
///
/// `widget` must be a valid pointer returned from `bc_widget_new`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn bc_widget_toggle(widget: *mut c_void) -> ErrorCode {
    unsafe { dispatch(widget, Intent::ToggleOpen) }
}

/// Reloads the history.
///
/// # Safety
///
/// `widget` must be a valid pointer returned from `bc_widget_new`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn bc_widget_load_history(
    widget: *mut c_void,
) -> ErrorCode {
    unsafe { dispatch(widget, Intent::LoadHistory) }
}

/// Asks for confirmation before deleting the history. The host answers the
/// `confirmation_requested` event with `bc_widget_confirm_delete` or
/// `bc_widget_cancel_delete`.
///
/// # Safety
///
/// `widget` must be a valid pointer returned from `bc_widget_new`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn bc_widget_request_delete(
    widget: *mut c_void,
) -> ErrorCode {
    unsafe { dispatch(widget, Intent::RequestDelete) }
}

/// Confirms a pending delete request.
///
/// # Safety
///
/// `widget` must be a valid pointer returned from `bc_widget_new`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn bc_widget_confirm_delete(
    widget: *mut c_void,
) -> ErrorCode {
    unsafe { dispatch(widget, Intent::ConfirmDelete) }
}

/// Cancels a pending delete request.
///
/// # Safety
///
/// `widget` must be a valid pointer returned from `bc_widget_new`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn bc_widget_cancel_delete(
    widget: *mut c_void,
) -> ErrorCode {
    unsafe { dispatch(widget, Intent::CancelDelete) }
}

/// Frees a widget. Its task stops after the intent being handled.
///
/// # Safety
///
/// `widget` must be a valid pointer returned from `bc_widget_new`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn bc_widget_free(widget: *mut c_void) {
    // SAFETY: Assume the caller has provided the valid pointer.
    unsafe {
        let widget_ptr = widget as *mut Widget;
        drop(Box::from_raw(widget_ptr));
    }
}

/// # Safety
///
/// `widget` must be a valid pointer returned from `bc_widget_new`.
unsafe fn dispatch(widget: *mut c_void, intent: Intent) -> ErrorCode {
    // SAFETY: Assume the caller has provided the valid pointer.
    let widget = unsafe { &*(widget as *mut Widget) };
    let Some(handle) = widget.handle() else {
        return ErrorCode::NotReady;
    };
    match handle.dispatch(intent) {
        Ok(()) => ErrorCode::Ok,
        Err(err) => {
            warn!("{err}");
            ErrorCode::NotReady
        }
    }
}
