//! Launch state machine states.
//!
//! ```text
//! Created ──► ResourcesPending ──► Launching ──► Connected ──► ChannelsReady
//!    │               │                 │             │               │
//!    │               │                 │             │               ▼
//!    │               │                 │             │        RepliedSuccess
//!    └───────────────┴─────────────────┴─────────────┴──────► RepliedFailure
//! ```
//!
//! Terminal states have no outgoing transitions. Every launch ends in
//! exactly one of the two terminal states.

use std::fmt;

/// The lifecycle states of one launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LaunchState {
    /// Request received, nothing committed yet.
    Created,
    /// Asynchronous preconditions being gathered (manifest file, debug
    /// endpoint).
    ResourcesPending,
    /// Process launcher invoked; awaiting launch and connection
    /// confirmation.
    Launching,
    /// Peer handshake received; peer identity recorded.
    Connected,
    /// All four channel pairs minted.
    ChannelsReady,
    /// Success reply sent with the full channel handle set.
    RepliedSuccess,
    /// Failure reply sent (or suppressed on cancellation).
    RepliedFailure,
}

impl LaunchState {
    /// Whether the launch has reached a terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::RepliedSuccess | Self::RepliedFailure)
    }

    /// Whether inbound plugin messages are accepted in this state.
    ///
    /// Messages are accepted from `ChannelsReady` onward while the
    /// process is live; `RepliedSuccess` still accepts them because the
    /// process keeps running after the success reply.
    #[must_use]
    pub const fn accepts_messages(&self) -> bool {
        matches!(self, Self::ChannelsReady | Self::RepliedSuccess)
    }

    /// Whether `next` is a legal successor of `self`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Created, Self::ResourcesPending)
            | (Self::ResourcesPending, Self::Launching)
            | (Self::Launching, Self::Connected)
            | (Self::Connected, Self::ChannelsReady)
            | (Self::ChannelsReady, Self::RepliedSuccess) => true,
            // Any non-terminal state may fail.
            (from, Self::RepliedFailure) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for LaunchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::ResourcesPending => "resources_pending",
            Self::Launching => "launching",
            Self::Connected => "connected",
            Self::ChannelsReady => "channels_ready",
            Self::RepliedSuccess => "replied_success",
            Self::RepliedFailure => "replied_failure",
        };
        f.write_str(name)
    }
}
