//! Permission sets for isolated processes.
//!
//! A [`PermissionSet`] combines a raw capability bitmask (which private
//! interfaces the untrusted code may reach) with execution-mode flags
//! (runtime usage, dynamic code generation, hardware exception handling,
//! non-isolated mode). The set is validated once, before any collaborator
//! is invoked; a contradictory set fails the request immediately.

use serde::{Deserialize, Serialize};

/// Capability bit: access to private host interfaces.
pub const PERM_PRIVATE_API: u32 = 1 << 0;
/// Capability bit: access to developer/testing interfaces.
pub const PERM_DEV_API: u32 = 1 << 1;
/// Capability bit: access to the manifest service.
pub const PERM_MANIFEST_SERVICE: u32 = 1 << 2;
/// Capability bit: access to the validation cache messages.
pub const PERM_VALIDATION_CACHE: u32 = 1 << 3;

/// All bits a well-formed permission mask may carry.
pub const PERM_ALL: u32 =
    PERM_PRIVATE_API | PERM_DEV_API | PERM_MANIFEST_SERVICE | PERM_VALIDATION_CACHE;

/// Permissions and execution-mode flags for one isolated process.
///
/// Immutable once attached to a launch request. Validation is separate
/// from construction so that a request built from untrusted input can be
/// rejected with a descriptive error rather than a panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    /// Raw capability bitmask; must be a subset of [`PERM_ALL`].
    pub permission_bits: u32,

    /// Whether the process loads the integrated runtime before the
    /// untrusted module.
    pub uses_runtime: bool,

    /// Whether the module runs in non-isolated mode. Mutually exclusive
    /// with the runtime, dynamic code, and exception handling.
    pub non_isolated_mode: bool,

    /// Whether the process may generate and execute code at runtime.
    pub allow_dynamic_code: bool,

    /// Whether the process may install hardware exception handlers.
    pub allow_exception_handling: bool,
}

impl Default for PermissionSet {
    fn default() -> Self {
        Self {
            permission_bits: 0,
            uses_runtime: true,
            non_isolated_mode: false,
            allow_dynamic_code: false,
            allow_exception_handling: false,
        }
    }
}

impl PermissionSet {
    /// Creates a permission set with the given capability mask and
    /// default execution-mode flags.
    #[must_use]
    pub fn with_bits(permission_bits: u32) -> Self {
        Self {
            permission_bits,
            ..Self::default()
        }
    }

    /// Checks the set for internal contradictions.
    ///
    /// Returns a human-readable description of the first contradiction
    /// found, or `None` when the set is consistent. Non-isolated mode
    /// runs the module directly and cannot be combined with the runtime,
    /// dynamic code generation, or hardware exception handling.
    #[must_use]
    pub fn contradiction(&self) -> Option<String> {
        if self.permission_bits & !PERM_ALL != 0 {
            return Some(format!(
                "unknown permission bits 0x{:x}",
                self.permission_bits & !PERM_ALL
            ));
        }
        if self.non_isolated_mode {
            if self.uses_runtime {
                return Some("non-isolated mode cannot use the runtime".to_string());
            }
            if self.allow_dynamic_code {
                return Some("non-isolated mode cannot allow dynamic code".to_string());
            }
            if self.allow_exception_handling {
                return Some("non-isolated mode cannot allow exception handling".to_string());
            }
        }
        None
    }

    /// Whether a capability bit (or any of several) is present.
    #[must_use]
    pub const fn has(&self, bits: u32) -> bool {
        self.permission_bits & bits != 0
    }
}
