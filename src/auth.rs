//! Single-tenant sender allow-list.

/// Outcome of checking an inbound message's sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthDecision {
    /// Sender is the provisioned peer.
    Accept,
    /// No peer is provisioned; everything is dropped.
    Unprovisioned,
    /// Sender is not the provisioned peer.
    Rejected,
}

impl AuthDecision {
    /// Returns true if the message should be forwarded.
    #[must_use]
    pub const fn is_accepted(self) -> bool {
        matches!(self, Self::Accept)
    }
}

/// Checks `sender` against the provisioned `peer_id` and logs drops.
///
/// A `peer_id` of `0` fails closed: there is no default peer.
#[must_use]
pub fn authorize(peer_id: i64, sender: i64) -> AuthDecision {
    if peer_id == 0 {
        tracing::warn!("no peer id configured - ignoring message from {}", sender);
        return AuthDecision::Unprovisioned;
    }

    if sender != peer_id {
        tracing::warn!("rejected message from unauthorized chat: {}", sender);
        return AuthDecision::Rejected;
    }

    AuthDecision::Accept
}
