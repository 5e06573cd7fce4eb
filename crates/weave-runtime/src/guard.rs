//! Exclusive access to the node's runtime
//!
//! Tuple-space execution is single-writer, so every engine operation holds
//! the one [`Runtime`] for its whole batch. A [`RuntimeLease`] is an owned
//! mutex guard: dropping it releases the runtime, which happens on every exit
//! path of the holder, including `?` returns and cancelled tasks. Waiters are
//! queued FIFO without timeout.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;
use weave_core::Runtime;

/// At-most-one-holder guard over the runtime
#[derive(Debug, Clone)]
pub struct RuntimeGuard {
    runtime: Arc<Mutex<Runtime>>,
}

/// Exclusive hold on the runtime, released on drop
#[derive(Debug)]
pub struct RuntimeLease {
    guard: OwnedMutexGuard<Runtime>,
}

impl RuntimeGuard {
    /// Take ownership of the node's runtime
    pub fn new(runtime: Runtime) -> Self {
        Self {
            runtime: Arc::new(Mutex::new(runtime)),
        }
    }

    /// Wait until the runtime is free and take it
    pub async fn acquire(&self) -> RuntimeLease {
        trace!("acquiring runtime");
        let guard = Arc::clone(&self.runtime).lock_owned().await;
        trace!("runtime acquired");
        RuntimeLease { guard }
    }

    /// Take the runtime only if nobody holds it
    pub fn try_acquire(&self) -> Option<RuntimeLease> {
        Arc::clone(&self.runtime)
            .try_lock_owned()
            .ok()
            .map(|guard| RuntimeLease { guard })
    }

    /// Give the runtime back. Equivalent to dropping the lease.
    pub fn release(lease: RuntimeLease) {
        drop(lease);
        trace!("runtime released");
    }

    /// Whether some operation currently holds the runtime
    pub fn is_held(&self) -> bool {
        self.runtime.try_lock().is_err()
    }
}

impl Deref for RuntimeLease {
    type Target = Runtime;

    fn deref(&self) -> &Runtime {
        &self.guard
    }
}

impl DerefMut for RuntimeLease {
    fn deref_mut(&mut self) -> &mut Runtime {
        &mut self.guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weave_testkit::test_runtime;

    #[tokio::test]
    async fn test_drop_releases() {
        let guard = RuntimeGuard::new(test_runtime().runtime);
        {
            let _lease = guard.acquire().await;
            assert!(guard.is_held());
        }
        assert!(!guard.is_held());
    }

    #[tokio::test]
    async fn test_cancelled_waiter_does_not_leak() {
        let guard = RuntimeGuard::new(test_runtime().runtime);
        let lease = guard.acquire().await;
        let waiter = {
            let guard = guard.clone();
            tokio::spawn(async move {
                let _lease = guard.acquire().await;
            })
        };
        tokio::task::yield_now().await;
        waiter.abort();
        let _ = waiter.await;
        RuntimeGuard::release(lease);
        assert!(guard.try_acquire().is_some());
    }
}
