//! Debouncing for bursts of page events.
//!
//! A [`Debouncer`] owns its pending timer and the token that cancels it, so
//! any number of them can run side by side without sharing state. Calls must
//! be made from inside a tokio runtime; the delay is a spawned timer task, never
//! a blocking wait.

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Run once, `wait` after the last call of a burst, with that call's arguments.
    Trailing,
    /// Run the first call of a burst immediately and swallow the rest until
    /// `wait` has passed without a call.
    Leading,
}

#[derive(Default)]
struct Pending {
    token: Option<CancellationToken>,
    generation: u64,
}

type Callback<A> = Arc<dyn Fn(A) + Send + Sync>;

pub struct Debouncer<A> {
    wait: Duration,
    edge: Edge,
    callback: Callback<A>,
    pending: Arc<Mutex<Pending>>,
}

impl<A> fmt::Debug for Debouncer<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debouncer")
            .field("wait", &self.wait)
            .field("edge", &self.edge)
            .field(
                "pending",
                &self
                    .pending
                    .lock()
                    .map(|pending| pending.token.is_some())
                    .unwrap_or(false),
            )
            .finish()
    }
}

impl<A: Send + 'static> Debouncer<A> {
    pub fn new<F>(wait: Duration, edge: Edge, callback: F) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        Self {
            wait,
            edge,
            callback: Arc::new(callback),
            pending: Arc::new(Mutex::new(Pending::default())),
        }
    }

    pub fn trailing<F>(wait: Duration, callback: F) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        Self::new(wait, Edge::Trailing, callback)
    }

    pub fn call(&self, args: A) {
        match self.edge {
            Edge::Trailing => self.call_trailing(args),
            Edge::Leading => self.call_leading(args),
        }
    }

    /// Drops any scheduled call without running it. Returns whether one was pending.
    pub fn cancel(&self) -> bool {
        let mut pending = self.lock();
        match pending.token.take() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.lock().token.is_some()
    }

    fn call_trailing(&self, args: A) {
        let (token, generation) = self.restart_window();
        let deadline = Instant::now() + self.wait;
        let pending = self.pending.clone();
        let callback = self.callback.clone();

        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {}
                _ = time::sleep_until(deadline) => {
                    let fire = {
                        let mut guard = pending.lock().unwrap_or_else(PoisonError::into_inner);
                        let current = guard.generation == generation && !token.is_cancelled();
                        if current {
                            guard.token = None;
                        }
                        current
                    };
                    if fire {
                        callback(args);
                    }
                }
            }
        });
    }

    fn call_leading(&self, args: A) {
        let idle = !self.is_pending();
        let (token, generation) = self.restart_window();
        let deadline = Instant::now() + self.wait;
        let pending = self.pending.clone();

        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {}
                _ = time::sleep_until(deadline) => {
                    let mut guard = pending.lock().unwrap_or_else(PoisonError::into_inner);
                    if guard.generation == generation {
                        guard.token = None;
                    }
                }
            }
        });

        if idle {
            (self.callback)(args);
        }
    }

    /// Cancels the previous window and opens a new one.
    fn restart_window(&self) -> (CancellationToken, u64) {
        let mut pending = self.lock();
        if let Some(previous) = pending.token.take() {
            previous.cancel();
        }
        let token = CancellationToken::new();
        pending.generation = pending.generation.wrapping_add(1);
        pending.token = Some(token.clone());
        (token, pending.generation)
    }

    fn lock(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
