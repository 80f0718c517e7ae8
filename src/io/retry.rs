//! Single-shot, re-armable retry timer
//!
//! The communicator keeps exactly one of these. Arming replaces any pending
//! shot instead of stacking a second one, and every shot carries a token so a
//! callback that lost a race with `cancel`/`arm` can tell it is stale.

use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Token identifying one armed shot
pub(crate) type RetryToken = u64;

#[derive(Debug)]
pub(crate) struct RetryTimer {
    delay: Duration,
    token: RetryToken,
    pending: Option<JoinHandle<()>>,
}

impl RetryTimer {
    pub(crate) fn new(delay: Duration) -> Self {
        Self {
            delay,
            token: 0,
            pending: None,
        }
    }

    pub(crate) fn delay(&self) -> Duration {
        self.delay
    }

    pub(crate) fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// Schedule `on_fire` after the fixed delay, replacing any pending shot
    ///
    /// `on_fire` receives the shot's token and must confirm it with
    /// [`RetryTimer::fired`] before acting.
    pub(crate) fn arm<F>(&mut self, runtime: &Handle, on_fire: F) -> RetryToken
    where
        F: FnOnce(RetryToken) + Send + 'static,
    {
        self.cancel();
        self.token = self.token.wrapping_add(1);
        let token = self.token;
        let delay = self.delay;
        self.pending = Some(runtime.spawn(async move {
            sleep(delay).await;
            on_fire(token);
        }));
        token
    }

    /// Cancel the pending shot, if any
    pub(crate) fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// Claim a shot from inside its callback
    ///
    /// Returns `false` when the shot was cancelled or superseded after its
    /// sleep completed.
    pub(crate) fn fired(&mut self, token: RetryToken) -> bool {
        if self.pending.is_some() && token == self.token {
            // Detach rather than abort: the handle belongs to the running callback.
            self.pending = None;
            true
        } else {
            false
        }
    }
}

impl Drop for RetryTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
