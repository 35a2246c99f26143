//! Cancellation token shared between threads and async loops.
//!
//! A [`Shutdown`] is triggered once and stays triggered. Blocking threads
//! wait on it with a timeout instead of sleeping; async loops `select!` on
//! [`Shutdown::triggered`].

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    flag: AtomicBool,
    triggered: Mutex<bool>,
    cond: Condvar,
    notify: Notify,
}

/// Cloneable, idempotent cancellation token.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    inner: Arc<Inner>,
}

impl Shutdown {
    /// Create an untriggered token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Trigger the token and wake every waiter.
    ///
    /// Returns `true` only for the call that actually triggered it.
    pub fn trigger(&self) -> bool {
        let mut triggered = self.inner.triggered.lock();
        if *triggered {
            return false;
        }
        *triggered = true;
        self.inner.flag.store(true, Ordering::Release);
        self.inner.cond.notify_all();
        self.inner.notify.notify_waiters();
        true
    }

    /// Non-blocking check.
    #[inline]
    pub fn is_triggered(&self) -> bool {
        self.inner.flag.load(Ordering::Acquire)
    }

    /// Block until triggered or `timeout` elapses; returns the trigger state.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        self.wait_until(Instant::now() + timeout)
    }

    /// Block until triggered or `deadline` passes; returns the trigger state.
    pub fn wait_until(&self, deadline: Instant) -> bool {
        let mut triggered = self.inner.triggered.lock();
        while !*triggered {
            if self.inner.cond.wait_until(&mut triggered, deadline).timed_out() {
                break;
            }
        }
        *triggered
    }

    /// Block until triggered.
    pub fn wait(&self) {
        let mut triggered = self.inner.triggered.lock();
        while !*triggered {
            self.inner.cond.wait(&mut triggered);
        }
    }

    /// Resolve once the token is triggered.
    pub async fn triggered(&self) {
        loop {
            let notified = self.inner.notify.notified();
            let mut notified = std::pin::pin!(notified);
            // Register before checking the flag so a concurrent trigger is not missed.
            notified.as_mut().enable();
            if self.is_triggered() {
                return;
            }
            notified.await;
        }
    }
}
