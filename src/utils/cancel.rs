//! Cancellation utilities
//!
//! Provides first-class cancellation handles for inference requests.

use tokio_util::sync::CancellationToken;

/// A handle that can be used to request cancellation.
///
/// Clones share the same underlying signal. Cancelling aborts the network call
/// if it is still in flight, or stops the read loop at the next chunk boundary.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Any stream observing this handle stops as soon
    /// as possible; the dropped response body closes the HTTP connection so
    /// the backend stops generating tokens.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Check if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// A future that resolves when cancellation is requested.
    pub fn cancelled(&self) -> tokio_util::sync::WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }
}
