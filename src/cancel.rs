//! Cancellation and deadline propagation for request handlers.
//!
//! Every request carries a [`CancelHandle`]. Handlers derive child handles
//! with [`CancelHandle::with_timeout`], [`CancelHandle::with_deadline`] or
//! [`CancelHandle::with_cancel`]; each derivation returns a [`CancelGuard`]
//! that releases the derivation when invoked or dropped. The router never
//! force-aborts a handler; blocking handlers are expected to poll
//! [`CancelHandle::is_done`] or park on [`CancelHandle::wait`].

use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

/// Why a handle fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The handle (or an ancestor) was cancelled explicitly.
    Cancelled,
    /// The handle's deadline passed.
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Cancelled => f.write_str("cancelled"),
            CancelReason::DeadlineExceeded => f.write_str("deadline exceeded"),
        }
    }
}

impl std::error::Error for CancelReason {}

struct State {
    reason: Option<CancelReason>,
    children: Vec<Weak<Shared>>,
}

struct Shared {
    state: Mutex<State>,
    fired: Condvar,
    deadline: Option<Instant>,
}

fn fire(shared: &Arc<Shared>, reason: CancelReason) {
    let children = {
        let mut state = shared.state.lock();
        if state.reason.is_some() {
            return;
        }
        state.reason = Some(reason);
        shared.fired.notify_all();
        std::mem::take(&mut state.children)
    };
    for child in children {
        if let Some(child) = child.upgrade() {
            fire(&child, reason);
        }
    }
}

/// Observable cancellation/deadline carrier, cheaply clonable.
///
/// Deadlines are realized lazily: no timer thread runs; the deadline is
/// checked whenever the handle is observed or waited on.
#[derive(Clone)]
pub struct CancelHandle {
    shared: Arc<Shared>,
}

impl CancelHandle {
    /// A handle that never fires on its own.
    pub fn root() -> Self {
        CancelHandle {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    reason: None,
                    children: Vec::new(),
                }),
                fired: Condvar::new(),
                deadline: None,
            }),
        }
    }

    /// The instant after which this handle reports `DeadlineExceeded`,
    /// if one was set (directly or inherited).
    pub fn deadline(&self) -> Option<Instant> {
        self.shared.deadline
    }

    /// The reason this handle fired, or `None` while it is still live.
    pub fn err(&self) -> Option<CancelReason> {
        {
            let state = self.shared.state.lock();
            if let Some(reason) = state.reason {
                return Some(reason);
            }
        }
        if let Some(deadline) = self.shared.deadline {
            if Instant::now() >= deadline {
                fire(&self.shared, CancelReason::DeadlineExceeded);
                return Some(CancelReason::DeadlineExceeded);
            }
        }
        None
    }

    /// Whether the handle has fired.
    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Block until the handle fires.
    pub fn wait(&self) -> CancelReason {
        let mut state = self.shared.state.lock();
        loop {
            if let Some(reason) = state.reason {
                return reason;
            }
            match self.shared.deadline {
                Some(deadline) => {
                    if self.shared.fired.wait_until(&mut state, deadline).timed_out() {
                        drop(state);
                        fire(&self.shared, CancelReason::DeadlineExceeded);
                        let state = self.shared.state.lock();
                        return state.reason.unwrap_or(CancelReason::DeadlineExceeded);
                    }
                }
                None => self.shared.fired.wait(&mut state),
            }
        }
    }

    /// Block until the handle fires or `timeout` elapses. Returns `None`
    /// when the wait timed out with the handle still live.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<CancelReason> {
        let limit = Instant::now() + timeout;
        let wake = match self.shared.deadline {
            Some(deadline) if deadline < limit => deadline,
            _ => limit,
        };
        let mut state = self.shared.state.lock();
        loop {
            if let Some(reason) = state.reason {
                return Some(reason);
            }
            if self.shared.fired.wait_until(&mut state, wake).timed_out() {
                if self.shared.deadline == Some(wake) {
                    drop(state);
                    fire(&self.shared, CancelReason::DeadlineExceeded);
                    let state = self.shared.state.lock();
                    return Some(state.reason.unwrap_or(CancelReason::DeadlineExceeded));
                }
                return None;
            }
        }
    }

    /// Derive a child handle cancelled by the returned guard.
    pub fn with_cancel(&self) -> (CancelHandle, CancelGuard) {
        self.derive(None)
    }

    /// Derive a child handle that fires at `deadline`.
    pub fn with_deadline(&self, deadline: Instant) -> (CancelHandle, CancelGuard) {
        self.derive(Some(deadline))
    }

    /// Derive a child handle that fires after `timeout`.
    pub fn with_timeout(&self, timeout: Duration) -> (CancelHandle, CancelGuard) {
        self.derive(Some(Instant::now() + timeout))
    }

    fn derive(&self, deadline: Option<Instant>) -> (CancelHandle, CancelGuard) {
        // a child never outlives its parent's deadline
        let effective = match (self.shared.deadline, deadline) {
            (Some(parent), Some(own)) => Some(parent.min(own)),
            (Some(parent), None) => Some(parent),
            (None, own) => own,
        };
        let child = Arc::new(Shared {
            state: Mutex::new(State {
                reason: None,
                children: Vec::new(),
            }),
            fired: Condvar::new(),
            deadline: effective,
        });
        {
            let mut state = self.shared.state.lock();
            match state.reason {
                Some(reason) => child.state.lock().reason = Some(reason),
                None => state.children.push(Arc::downgrade(&child)),
            }
        }
        (
            CancelHandle {
                shared: child.clone(),
            },
            CancelGuard { shared: child },
        )
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelHandle")
            .field("fired", &self.shared.state.lock().reason)
            .field("deadline", &self.shared.deadline)
            .finish()
    }
}

/// Releases a derived handle. Handlers must invoke it on every exit path;
/// dropping the guard counts as invoking it.
#[must_use = "dropping the guard cancels the derived handle"]
pub struct CancelGuard {
    shared: Arc<Shared>,
}

impl CancelGuard {
    /// Cancel the derived handle now.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        fire(&self.shared, CancelReason::Cancelled);
    }
}

impl fmt::Debug for CancelGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CancelGuard")
    }
}
