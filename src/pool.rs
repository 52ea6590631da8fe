//! Free-list of reusable per-request allocations.

use crate::context::{Attachments, Handler, Params, QueryCache};
use parking_lot::Mutex;
use smallvec::SmallVec;

const MAX_POOLED: usize = 128;

/// The context allocations worth keeping across requests: the parameter
/// list, the handler chain vector, the query cache, and the attachment map.
#[derive(Default)]
pub(crate) struct PooledParts {
    pub(crate) params: Params,
    pub(crate) handlers: Vec<Handler>,
    pub(crate) query: QueryCache,
    pub(crate) values: Attachments,
}

impl PooledParts {
    fn reset(&mut self) {
        self.params.clear();
        self.handlers.clear();
        self.query.clear();
        self.values.clear();
    }
}

/// Multi-producer/multi-consumer free-list. Acquire and release are O(1);
/// acquired parts are always reset.
#[derive(Default)]
pub(crate) struct ContextPool {
    free: Mutex<SmallVec<[PooledParts; 8]>>,
}

impl ContextPool {
    pub(crate) fn acquire(&self) -> PooledParts {
        let popped = self.free.lock().pop();
        match popped {
            Some(mut parts) => {
                parts.reset();
                parts
            }
            None => PooledParts::default(),
        }
    }

    pub(crate) fn release(&self, parts: PooledParts) {
        let mut free = self.free.lock();
        if free.len() < MAX_POOLED {
            free.push(parts);
        }
    }
}
