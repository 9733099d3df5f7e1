//! Teleport request handshake: one pending request per target player,
//! resolved by accept or deny, expired lazily on access.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::clock::{Clock, MonotonicClock};
use crate::error::TeleportRequestError;
use crate::location::PlayerId;

/// How long a request stays acceptable.
pub const REQUEST_TTL: Duration = Duration::from_millis(60_000);

/// A request waiting for the target's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub requester: PlayerId,
    pub target: PlayerId,
    /// Requester's name when the request was made.
    pub requester_name: String,
    pub created_at: Instant,
}

impl PendingRequest {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) > REQUEST_TTL
    }
}

/// Returned by a successful accept; the caller performs the teleport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedRequest {
    pub requester: PlayerId,
    pub requester_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeniedRequest {
    pub requester: PlayerId,
    pub requester_name: String,
}

/// Pending requests keyed by target.
pub struct TeleportRequestBroker {
    pending: Mutex<HashMap<PlayerId, PendingRequest>>,
    clock: Arc<dyn Clock>,
}

impl TeleportRequestBroker {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(MonotonicClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            clock,
        }
    }

    fn pending(&self) -> MutexGuard<'_, HashMap<PlayerId, PendingRequest>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a request from `requester` to `target`.
    ///
    /// Any request already pending for `target` is dropped and returned; its
    /// requester is not told.
    pub fn request(
        &self,
        requester: &PlayerId,
        requester_name: &str,
        target: &PlayerId,
    ) -> Result<Option<PendingRequest>, TeleportRequestError> {
        if requester == target {
            return Err(TeleportRequestError::SelfRequest);
        }
        let request = PendingRequest {
            requester: requester.clone(),
            target: target.clone(),
            requester_name: requester_name.to_string(),
            created_at: self.clock.now(),
        };
        let replaced = self.pending().insert(target.clone(), request);
        if let Some(old) = &replaced {
            debug!(
                "teleport request {} -> {target} replaced request from {}",
                requester, old.requester
            );
        }
        Ok(replaced)
    }

    /// Take the pending request for `target`. Expired requests are removed
    /// and reported as `Expired`.
    pub fn accept(&self, target: &PlayerId) -> Result<AcceptedRequest, TeleportRequestError> {
        let request = self
            .pending()
            .remove(target)
            .ok_or(TeleportRequestError::NoPendingRequest)?;
        if request.is_expired(self.clock.now()) {
            debug!("teleport request {} -> {target} expired", request.requester);
            return Err(TeleportRequestError::Expired);
        }
        Ok(AcceptedRequest {
            requester: request.requester,
            requester_name: request.requester_name,
        })
    }

    /// Drop the pending request for `target`, expired or not.
    pub fn deny(&self, target: &PlayerId) -> Result<DeniedRequest, TeleportRequestError> {
        let request = self
            .pending()
            .remove(target)
            .ok_or(TeleportRequestError::NoPendingRequest)?;
        Ok(DeniedRequest {
            requester: request.requester,
            requester_name: request.requester_name,
        })
    }

    /// Remove every expired request. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut pending = self.pending();
        let before = pending.len();
        pending.retain(|_, request| !request.is_expired(now));
        before - pending.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending().len()
    }
}

impl Default for TeleportRequestBroker {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
