use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("server responded with status {0}")]
    Status(u16),
}

/// Body of a settled fetch: the response XML on success.
pub type FetchResult = Result<String, FetchError>;

/// Identifies one issued request for logging and supersession.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Shared flag telling a pending response handler its result is unwanted.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

/// Hands out request ids and keeps at most one request live.
///
/// Beginning a request cancels the one before it, so only the newest
/// response is ever acted on.
#[derive(Debug, Default)]
pub struct RequestTracker {
    next: Cell<u64>,
    in_flight: RefCell<Option<(RequestId, CancelToken)>>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> (RequestId, CancelToken) {
        let id = RequestId(self.next.get());
        self.next.set(id.0 + 1);
        let token = CancelToken::new();
        if let Some((_, previous)) = self.in_flight.replace(Some((id, token.clone()))) {
            previous.cancel();
        }
        (id, token)
    }

    /// Mark `id` as settled and report whether it was still the live
    /// request. Settling a superseded or cancelled request is a no-op.
    pub fn settle(&self, id: RequestId) -> bool {
        let mut in_flight = self.in_flight.borrow_mut();
        if in_flight.as_ref().is_some_and(|(current, _)| *current == id) {
            *in_flight = None;
            return true;
        }
        false
    }

    /// Cancel whatever is in flight.
    pub fn cancel(&self) {
        if let Some((_, token)) = self.in_flight.take() {
            token.cancel();
        }
    }

    pub fn in_flight(&self) -> Option<RequestId> {
        self.in_flight.borrow().as_ref().map(|(id, _)| *id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_request_cancels_older() {
        let tracker = RequestTracker::new();
        let (first, first_token) = tracker.begin();
        let (second, second_token) = tracker.begin();
        assert_eq!(first, RequestId(0));
        assert_eq!(second, RequestId(1));
        assert!(first_token.is_cancelled());
        assert!(!second_token.is_cancelled());
        assert_eq!(tracker.in_flight(), Some(second));
    }

    #[test]
    fn settling_stale_request_keeps_current() {
        let tracker = RequestTracker::new();
        let (first, _) = tracker.begin();
        let (second, _) = tracker.begin();
        assert!(!tracker.settle(first));
        assert_eq!(tracker.in_flight(), Some(second));
        assert!(tracker.settle(second));
        assert_eq!(tracker.in_flight(), None);
        assert!(!tracker.settle(second));
    }

    #[test]
    fn explicit_cancel() {
        let tracker = RequestTracker::new();
        let (_, token) = tracker.begin();
        tracker.cancel();
        assert!(token.is_cancelled());
        assert_eq!(tracker.in_flight(), None);
        assert_eq!(RequestId(7).to_string(), "#7");
    }
}
