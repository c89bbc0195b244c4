//! Channel kinds and handle sets.
//!
//! A successful launch hands the requester exactly four paired
//! communication endpoints. The handles here are opaque: the transport
//! behind them is owned by the channel factory collaborator, never by
//! this crate.
//!
//! # Invariant
//!
//! A [`ChannelHandleSet`] can only be built from all four handles at
//! once. The failure path never exposes a partial set; partially minted
//! endpoints are discarded by the coordinator before it replies.

use serde::{Deserialize, Serialize};

/// The four channel roles minted for every successful launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// Host-side plugin API channel (privileged host messaging).
    HostApi,
    /// Client-side plugin API channel (requester's plugin proxy).
    ClientApi,
    /// Trusted channel for privileged control messages.
    Trusted,
    /// Manifest service channel (module fetch requests).
    ManifestService,
}

impl ChannelKind {
    /// All four kinds, in the order they are minted.
    pub const ALL: [Self; 4] = [
        Self::HostApi,
        Self::ClientApi,
        Self::Trusted,
        Self::ManifestService,
    ];

    /// Short name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::HostApi => "host_api",
            Self::ClientApi => "client_api",
            Self::Trusted => "trusted",
            Self::ManifestService => "manifest_service",
        }
    }
}

/// An opaque, transferable endpoint handle minted by the channel factory.
///
/// The `id` is meaningful only to the factory that minted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelHandle {
    /// Factory-scoped endpoint identifier.
    pub id: u64,
    /// The role this endpoint serves.
    pub kind: ChannelKind,
}

/// The full set of handles delivered in a success reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelHandleSet {
    host_api: ChannelHandle,
    client_api: ChannelHandle,
    trusted: ChannelHandle,
    manifest_service: ChannelHandle,
}

impl ChannelHandleSet {
    /// Assembles the set from all four handles.
    ///
    /// Returns `None` when any handle's kind does not match its slot,
    /// which would indicate a factory bug rather than a launch failure.
    #[must_use]
    pub fn new(
        host_api: ChannelHandle,
        client_api: ChannelHandle,
        trusted: ChannelHandle,
        manifest_service: ChannelHandle,
    ) -> Option<Self> {
        if host_api.kind != ChannelKind::HostApi
            || client_api.kind != ChannelKind::ClientApi
            || trusted.kind != ChannelKind::Trusted
            || manifest_service.kind != ChannelKind::ManifestService
        {
            return None;
        }
        Some(Self {
            host_api,
            client_api,
            trusted,
            manifest_service,
        })
    }

    /// The host-side plugin API handle.
    #[must_use]
    pub const fn host_api(&self) -> &ChannelHandle {
        &self.host_api
    }

    /// The client-side plugin API handle.
    #[must_use]
    pub const fn client_api(&self) -> &ChannelHandle {
        &self.client_api
    }

    /// The trusted channel handle.
    #[must_use]
    pub const fn trusted(&self) -> &ChannelHandle {
        &self.trusted
    }

    /// The manifest service channel handle.
    #[must_use]
    pub const fn manifest_service(&self) -> &ChannelHandle {
        &self.manifest_service
    }

    /// Iterates the four handles in mint order.
    pub fn iter(&self) -> impl Iterator<Item = &ChannelHandle> {
        [
            &self.host_api,
            &self.client_api,
            &self.trusted,
            &self.manifest_service,
        ]
        .into_iter()
    }
}
