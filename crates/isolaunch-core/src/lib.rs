//! isolaunch-core - Domain types for the sandboxed process launch coordinator.
//!
//! This crate defines the value types shared between the launch coordinator
//! (`isolaunch-host`) and its injected collaborators: permission sets and
//! launch requests, channel kinds and handle sets, the validation cache,
//! file tokens, and the launch error taxonomy.
//!
//! Nothing in this crate performs I/O. All process creation, channel
//! transport, and persistence live behind collaborator traits in the host
//! crate; these types are the vocabulary those seams speak.

pub mod channel;
pub mod error;
pub mod permissions;
pub mod request;
pub mod token;
pub mod validation_cache;

pub use channel::{ChannelHandle, ChannelHandleSet, ChannelKind};
pub use error::LaunchError;
pub use permissions::PermissionSet;
pub use request::{LaunchRequest, SessionRef};
pub use token::{FileToken, FileTokenMap};
pub use validation_cache::{MemoryValidationCache, Signature, ValidationCache};
