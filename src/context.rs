//! Per-request identity, cancellation, and deadline.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Identity and lifecycle of a single orchestrated request.
///
/// Clones share the same cancellation token and deadline, so any holder can
/// cancel the request for all of them. The orchestrator and the streaming
/// bridge only ever read this state; nothing in the engine cancels a request
/// on its own.
#[derive(Debug, Clone)]
pub struct RequestContext {
    id: String,
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// Fresh context with a random request id and no deadline.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Attach a deadline this long from now.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Attach an absolute deadline.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// The request id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Request cancellation. Idempotent; observed by all clones.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether `cancel` has been called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The deadline, if one is set.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True once the request is cancelled or its deadline has passed.
    pub fn is_done(&self) -> bool {
        self.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Time left before the deadline. `None` when no deadline is set, zero
    /// once it has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Resolve when the request is cancelled or the deadline passes.
    /// Intended for `tokio::select!` in stream consumers.
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_context_is_live() {
        let ctx = RequestContext::new();
        assert!(!ctx.is_cancelled());
        assert!(!ctx.is_done());
        assert!(ctx.remaining().is_none());
        assert!(!ctx.id().is_empty());
    }

    #[test]
    fn cancel_propagates_to_clones() {
        let ctx = RequestContext::new();
        let clone = ctx.clone();
        clone.cancel();
        assert!(ctx.is_cancelled());
        assert!(ctx.is_done());
        assert_eq!(ctx.id(), clone.id());
    }

    #[tokio::test]
    async fn deadline_marks_done() {
        let ctx = RequestContext::new().with_timeout(Duration::from_millis(10));
        assert!(!ctx.is_done());
        assert!(ctx.remaining().unwrap() <= Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(25)).await;
        assert!(ctx.is_done());
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
        // The deadline does not cancel the token.
        assert!(!ctx.is_cancelled());
    }

    #[tokio::test]
    async fn done_resolves_on_cancel() {
        let ctx = RequestContext::new();
        let waiter = ctx.clone();
        let task = tokio::spawn(async move { waiter.done().await });
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(!task.is_finished());
        ctx.cancel();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("done() should resolve after cancel")
            .unwrap();
    }

    #[tokio::test]
    async fn done_resolves_on_deadline() {
        let ctx = RequestContext::new().with_timeout(Duration::from_millis(10));
        tokio::time::timeout(Duration::from_secs(1), ctx.done())
            .await
            .expect("done() should resolve at the deadline");
    }
}
