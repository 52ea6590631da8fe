use crate::context::Context;
use serde_json::json;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Catch panics from the rest of the chain, log them, and answer 500.
/// The chain cursor is parked past the end, so the context goes back to
/// the pool in a clean state.
pub fn recovery() -> impl Fn(&mut Context<'_>) + Send + Sync + 'static {
    |c: &mut Context<'_>| {
        if let Err(panic) = catch_unwind(AssertUnwindSafe(|| c.next())) {
            let message = panic_message(panic.as_ref());
            tracing::error!(message = %message, path = %c.path(), "handler panicked");
            c.abort_with_json(
                500,
                &json!({
                    "error": "Internal Server Error",
                    "message": message,
                }),
            );
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        String::from("unknown panic")
    }
}
