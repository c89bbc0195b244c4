//! Channel factory collaborator seam.
//!
//! A successful launch needs four channel pairs, one per
//! [`ChannelKind`]. The factory mints each pair as a local endpoint the
//! coordinator keeps plus a remote handle that goes to the requester in
//! the success reply. Dropping a local endpoint discards it; the
//! coordinator relies on that to honor the all-or-nothing rule when a
//! later pair fails.

use async_trait::async_trait;
use isolaunch_core::channel::{ChannelHandle, ChannelKind};
use isolaunch_core::error::LaunchError;

/// Coordinator-side endpoint of a minted channel pair.
///
/// The transport behind the endpoint is the factory's business; the
/// coordinator only holds it alive for the process lifetime and drops it
/// on teardown or partial-failure cleanup.
pub trait LocalEndpoint: Send {
    /// The role this endpoint serves.
    fn kind(&self) -> ChannelKind;
}

/// One minted channel pair.
pub struct ChannelPair {
    /// Endpoint retained by the coordinator.
    pub local: Box<dyn LocalEndpoint>,
    /// Handle delivered to the requester.
    pub remote: ChannelHandle,
}

impl std::fmt::Debug for ChannelPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelPair")
            .field("kind", &self.local.kind())
            .field("remote", &self.remote)
            .finish()
    }
}

/// Mints paired communication endpoints.
#[async_trait]
pub trait ChannelFactory: Send + Sync {
    /// Creates one channel pair of the given kind.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError::ChannelCreationFailed`] when the pair
    /// cannot be created; the coordinator then discards every pair minted
    /// so far and fails the launch.
    async fn create_channel_pair(&self, kind: ChannelKind) -> Result<ChannelPair, LaunchError>;
}
