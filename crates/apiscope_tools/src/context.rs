//! Per-call context handed to every tool handler.

use apiscope_protocol::RequestId;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Cancellation and deadline information for one tool call.
///
/// The adapter passes the context to the handler unmodified. It never acts on
/// cancellation or deadlines itself; handlers that do I/O decide how to honor
/// them.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    request_id: Option<RequestId>,
    cancellation: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// Creates a context with a fresh cancellation token and no deadline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the protocol request this call answers.
    #[must_use]
    pub fn with_request_id(mut self, id: RequestId) -> Self {
        self.request_id = Some(id);
        self
    }

    /// Uses the given cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Sets an absolute deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets a deadline relative to now.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Returns the protocol request id, if any.
    #[must_use]
    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    /// Returns the cancellation token.
    #[must_use]
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Returns `true` once the caller has cancelled the call.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Completes when the caller cancels the call.
    pub async fn cancelled(&self) {
        self.cancellation.cancelled().await;
    }

    /// Returns the deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the time left before the deadline; zero once it has passed.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }
}
