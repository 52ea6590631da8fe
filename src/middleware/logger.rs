use crate::context::Context;
use std::time::Instant;

/// Request log line emitted once the rest of the chain has finished, so
/// the status observed is the one the handler actually wrote.
pub fn logger() -> impl Fn(&mut Context<'_>) + Send + Sync + 'static {
    |c: &mut Context<'_>| {
        let start = Instant::now();
        let method = c.method();
        let path = c.path().to_string();

        c.next();

        tracing::info!(
            method = %method,
            path = %path,
            status = c.status_code(),
            latency_ms = start.elapsed().as_millis() as u64,
            client_ip = %c.client_ip(),
            "request"
        );
    }
}
