//! Converts panics raised by user functions into [`Failure`]s.
//!
//! A process-wide panic hook is installed the first time a function is invoked.
//! On threads that are currently running a user function, the hook records the
//! panic location and a backtrace instead of printing to stderr, which would
//! otherwise tear through the progress display. Every other panic is forwarded
//! to whichever hook was installed before.

use super::Failure;
use core::any::Any;
use core::cell::{Cell, RefCell};
use core::panic::AssertUnwindSafe;
use std::backtrace::Backtrace;
use std::panic;
use std::sync::Once;

static INSTALL_HOOK: Once = Once::new();

thread_local! {
    static CAPTURING: Cell<bool> = const { Cell::new(false) };
    static CAPTURED_TRACE: RefCell<Option<String>> = const { RefCell::new(None) };
}

fn install_hook() {
    INSTALL_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if CAPTURING.get() {
                let location = info
                    .location()
                    .map_or_else(|| "<unknown location>".to_string(), ToString::to_string);
                let trace = format!("panicked at {location}\n{}", Backtrace::force_capture());
                CAPTURED_TRACE.set(Some(trace));
            } else {
                previous(info);
            }
        }));
    });
}

/// Run `function`, turning a panic into a [`Failure`] of kind `panic`.
pub fn catch_panic<R>(function: impl FnOnce() -> R) -> Result<R, Failure> {
    install_hook();

    CAPTURING.set(true);
    let result = panic::catch_unwind(AssertUnwindSafe(function));
    CAPTURING.set(false);

    result.map_err(|payload| {
        let trace = CAPTURED_TRACE.take().unwrap_or_default();
        Failure::new(Failure::PANIC_KIND, panic_message(payload.as_ref()), trace)
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_value_is_passed_through() {
        assert_eq!(catch_panic(|| 42).unwrap(), 42);
    }

    #[test]
    #[expect(clippy::panic, reason = "exercising panic capture")]
    fn test_static_str_panic() {
        let failure = catch_panic(|| -> u32 { panic!("boom") }).unwrap_err();
        assert!(failure.is_panic());
        assert_eq!(failure.message, "boom");
        assert!(failure.trace.starts_with("panicked at "), "trace was: {}", failure.trace);
        assert!(failure.trace.contains("panic_capture.rs"));
    }

    #[test]
    #[expect(clippy::panic, reason = "exercising panic capture")]
    fn test_formatted_panic() {
        let n = 5;
        let failure = catch_panic(|| -> u32 { panic!("failed at {n}") }).unwrap_err();
        assert_eq!(failure.message, "failed at 5");
    }

    #[test]
    fn test_non_string_payload() {
        let failure = catch_panic(|| -> u32 { std::panic::panic_any(17_u8) }).unwrap_err();
        assert_eq!(failure.message, "<non-string panic payload>");
    }

    #[test]
    #[expect(clippy::panic, reason = "exercising panic capture")]
    fn test_capture_flag_is_reset() {
        let _ = catch_panic(|| -> u32 { panic!("first") });
        assert!(!CAPTURING.get());
        assert!(CAPTURED_TRACE.take().is_none());
    }
}
