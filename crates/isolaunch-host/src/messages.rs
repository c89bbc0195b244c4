//! Inbound messages from the isolated process.
//!
//! Once the channels are up, the isolated process may ask the coordinator
//! exactly three things: whether a signature is known to validate, to
//! record a signature as validated, and to exchange a file token for an
//! open handle. The transport that carries these is the channel factory's
//! concern; by the time a message reaches the coordinator it has been
//! decoded into this enum, with a oneshot seam wherever the sender is
//! owed exactly one reply.

use std::path::PathBuf;

use isolaunch_core::error::LaunchError;
use isolaunch_core::token::FileToken;
use isolaunch_core::validation_cache::Signature;
use tokio::sync::oneshot;

/// A file handle resolved from a token.
#[derive(Debug)]
pub struct ResolvedFile {
    /// The path the token was issued for.
    pub path: PathBuf,
    /// The opened file.
    pub file: tokio::fs::File,
}

/// The three message categories accepted while the process is live.
#[derive(Debug)]
pub enum PluginMessage {
    /// Is this signature already known to validate?
    QueryKnownToValidate {
        /// Signature to look up.
        signature: Signature,
        /// Exactly one reply is sent.
        reply: oneshot::Sender<bool>,
    },

    /// Record this signature as known to validate. No reply; recording an
    /// already-trusted signature is a no-op.
    SetKnownToValidate {
        /// Signature to record.
        signature: Signature,
    },

    /// Exchange a token for an open file handle.
    ResolveFileToken {
        /// Token to resolve.
        token: FileToken,
        /// Exactly one reply is sent: the handle, or
        /// [`LaunchError::TokenResolutionFailed`].
        reply: oneshot::Sender<Result<ResolvedFile, LaunchError>>,
    },
}

impl PluginMessage {
    /// Message category name for logging.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::QueryKnownToValidate { .. } => "query_known_to_validate",
            Self::SetKnownToValidate { .. } => "set_known_to_validate",
            Self::ResolveFileToken { .. } => "resolve_file_token",
        }
    }
}
