//! Launch request values.
//!
//! A [`LaunchRequest`] is the immutable description of one "run untrusted
//! code in isolation" request. It is created by the requester, validated
//! by the coordinator before any collaborator is touched, and owned by
//! the coordinator for the lifetime of the launch.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::LaunchError;
use crate::permissions::PermissionSet;

/// Opaque reference to the requesting session.
///
/// The coordinator never interprets this value; it exists so the host can
/// route the terminal reply and scope private-interface access to the
/// originating session. A value of zero means the request did not come
/// from an interactive session and gets no client-side plugin proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionRef(pub u64);

impl SessionRef {
    /// A request with no originating session.
    pub const NONE: Self = Self(0);

    /// Whether this reference names a real session.
    #[must_use]
    pub const fn is_session(&self) -> bool {
        self.0 != 0
    }
}

/// Immutable description of one launch of untrusted code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchRequest {
    /// Locator (URI) of the manifest describing the code to load.
    pub manifest_locator: String,

    /// Permissions and execution-mode flags for the isolated process.
    pub permissions: PermissionSet,

    /// The session that issued the request.
    pub requester: SessionRef,

    /// Profile directory of the requesting context.
    pub profile_directory: PathBuf,

    /// Whether the request originated from a private (off-the-record)
    /// context. Passed through to the launcher; the coordinator itself
    /// persists nothing either way.
    pub off_the_record: bool,

    /// Whether a crash of this process counts against the host's crash
    /// budget, and whether an exhausted budget refuses this launch. The
    /// budget itself is host policy, not computed here.
    pub enable_crash_throttling: bool,
}

impl LaunchRequest {
    /// Validates the request before any resources are committed.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError::RequestInvalid`] when the manifest locator
    /// is malformed or the permission set is contradictory.
    pub fn validate(&self) -> Result<(), LaunchError> {
        if self.manifest_locator.is_empty() {
            return Err(LaunchError::RequestInvalid(
                "empty manifest locator".to_string(),
            ));
        }
        if !is_well_formed_locator(&self.manifest_locator) {
            return Err(LaunchError::RequestInvalid(format!(
                "malformed manifest locator: {}",
                self.manifest_locator
            )));
        }
        if let Some(contradiction) = self.permissions.contradiction() {
            return Err(LaunchError::RequestInvalid(format!(
                "contradictory permissions: {contradiction}"
            )));
        }
        Ok(())
    }
}

/// A locator must be `scheme://rest` with a non-empty alphabetic scheme
/// and a non-empty remainder. The coordinator does not resolve locators;
/// it only refuses ones no collaborator could interpret.
fn is_well_formed_locator(locator: &str) -> bool {
    let Some((scheme, rest)) = locator.split_once("://") else {
        return false;
    };
    !scheme.is_empty()
        && scheme.chars().all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-')
        && !rest.is_empty()
}
