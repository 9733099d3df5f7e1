use thiserror::Error;

/// Why a teleport request operation did not go through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TeleportRequestError {
    #[error("a player cannot send a teleport request to themselves")]
    SelfRequest,

    #[error("no pending teleport request")]
    NoPendingRequest,

    #[error("the teleport request has expired")]
    Expired,
}

/// `set_home_within` refused a new home because the player is at the limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("home limit of {0} reached")]
pub struct HomeLimitReached(pub usize);
