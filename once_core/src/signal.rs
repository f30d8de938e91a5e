//! One-shot completion signal
//!
//! Fires at most once. Every later trigger is a no-op, and any number of
//! tasks can wait for it.

use std::fmt;
use std::sync::{Arc, OnceLock};
use tokio_util::sync::CancellationToken;

/// What ended the serving session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionReason {
    /// The download route finished streaming (or the client went away mid-stream)
    Downloaded,
    /// The deadline elapsed before anyone downloaded the file
    TimedOut,
    /// Ctrl+C or SIGTERM
    Interrupted,
}

impl fmt::Display for CompletionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionReason::Downloaded => f.write_str("download completed"),
            CompletionReason::TimedOut => f.write_str("timeout elapsed"),
            CompletionReason::Interrupted => f.write_str("interrupted"),
        }
    }
}

struct Inner {
    reason: OnceLock<CompletionReason>,
    token: CancellationToken,
}

#[derive(Clone)]
pub struct CompletionSignal {
    inner: Arc<Inner>,
}

impl Default for CompletionSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionSignal {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                reason: OnceLock::new(),
                token: CancellationToken::new(),
            }),
        }
    }

    /// Fire the signal. Returns true only for the call that actually fired it.
    pub fn fire(&self, reason: CompletionReason) -> bool {
        if self.inner.reason.set(reason).is_err() {
            return false;
        }
        self.inner.token.cancel();
        true
    }

    pub fn is_fired(&self) -> bool {
        self.inner.reason.get().is_some()
    }

    /// The reason recorded by the winning trigger
    pub fn reason(&self) -> Option<CompletionReason> {
        self.inner.reason.get().copied()
    }

    /// Wait until the signal fires and return the winning reason
    pub async fn fired(&self) -> CompletionReason {
        self.inner.token.cancelled().await;
        // The reason is always set before the token is cancelled
        self.reason().unwrap_or(CompletionReason::Interrupted)
    }
}

impl fmt::Debug for CompletionSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionSignal")
            .field("reason", &self.reason())
            .finish()
    }
}
