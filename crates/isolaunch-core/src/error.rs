//! Launch error taxonomy.
//!
//! Every failure the coordinator can report maps onto one of these
//! variants. All variants except [`LaunchError::ProtocolViolation`] are
//! delivered to the requester as the single failure reply;
//! `ProtocolViolation` additionally forces teardown of the instance.
//! The coordinator never retries on its own — retry, if any, is the
//! requester's responsibility via a fresh launch request.

/// Errors produced while driving a launch request to a terminal state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LaunchError {
    /// The request was malformed before any collaborator was invoked
    /// (bad manifest locator, contradictory permission bits).
    #[error("invalid launch request: {0}")]
    RequestInvalid(String),

    /// An asynchronous precondition could not be gathered (manifest file
    /// missing, debug endpoint could not be bound).
    #[error("resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// The process launcher could not create the isolated process.
    #[error("failed to launch isolated process: {0}")]
    LaunchFailed(String),

    /// The isolated process violated the launch protocol (duplicate
    /// handshake, malformed inbound message). Fatal to the instance.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// One of the four required channel pairs could not be created; any
    /// partially created endpoints are discarded.
    #[error("channel creation failed: {0}")]
    ChannelCreationFailed(String),

    /// A file-token resolution failed. Scoped to the individual token
    /// request; does not affect the coordinator's own state.
    #[error("file token resolution failed: {0}")]
    TokenResolutionFailed(String),
}

impl LaunchError {
    /// Returns true when this error must tear the instance down rather
    /// than merely fail the request.
    #[must_use]
    pub const fn is_fatal_to_instance(&self) -> bool {
        matches!(self, Self::ProtocolViolation(_))
    }

    /// Returns true when this error is scoped to a single inbound message
    /// and leaves the coordinator's launch state untouched.
    #[must_use]
    pub const fn is_per_request(&self) -> bool {
        matches!(self, Self::TokenResolutionFailed(_))
    }
}
