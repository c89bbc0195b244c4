//! isolaunch-host - Sandboxed process launch coordinator.
//!
//! Given a request to execute untrusted code in isolation, the
//! [`coordinator::LaunchCoordinator`] drives an asynchronous sequence:
//! gather resources, launch an isolated process through an injected
//! [`launcher::ProcessLauncher`], establish four multiplexed channels
//! through an injected [`channel_factory::ChannelFactory`], answer
//! validation-cache and file-token messages from the running process, and
//! report success or failure to the requester exactly once.
//!
//! # Architecture
//!
//! ```text
//! requester ──LaunchRequest──► LaunchCoordinator ──► ProcessLauncher
//!     ▲                           │        │
//!     │ exactly-one reply         │        └──────► ChannelFactory
//!     └───ReplyObligation◄────────┘
//!                                 │
//!          PluginMessage ────────►┼──────► ValidationCache / FileTokenMap
//! ```
//!
//! The coordinator never spawns threads and performs no blocking I/O; it
//! suspends on collaborator futures and resumes when they complete.
//! Multiple coordinators may be in flight concurrently, sharing only the
//! validation cache and file-token map.

pub mod channel_factory;
pub mod config;
pub mod coordinator;
pub mod debug_stub;
pub mod events;
pub mod launcher;
pub mod messages;
pub mod reply;
pub mod state;

pub use channel_factory::{ChannelFactory, ChannelPair, LocalEndpoint};
pub use config::HostConfig;
pub use coordinator::{CoordinatorDeps, LaunchCoordinator};
pub use debug_stub::DebugStubServer;
pub use events::CoordinatorEvent;
pub use launcher::{IsolatedProcess, PeerIdentity, ProcessLauncher, ProcessSpec};
pub use messages::{PluginMessage, ResolvedFile};
pub use reply::{LaunchReply, ReplyObligation};
pub use state::LaunchState;
