use crate::context::Context;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Propagate `X-Request-ID`, generating one when the client sent none.
/// The id is also attached under the `request_id` key.
pub fn request_id() -> impl Fn(&mut Context<'_>) + Send + Sync + 'static {
    |c: &mut Context<'_>| {
        let id = match c.header("X-Request-ID") {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => generate(),
        };
        c.set_header("X-Request-ID", &id);
        c.set("request_id", id);
        c.next();
    }
}

fn generate() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64;
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{nanos:x}-{seq:x}")
}
