//! Process launcher collaborator seam.
//!
//! The coordinator never creates OS processes or configures the sandbox
//! itself; it asks an injected [`ProcessLauncher`] to do so and owns the
//! returned [`IsolatedProcess`] handle for the rest of the launch.
//! Connection and crash signals from the launcher arrive as calls on the
//! coordinator, not as overrides of a host base class.

use std::path::PathBuf;

use async_trait::async_trait;
use isolaunch_core::error::LaunchError;
use isolaunch_core::permissions::PermissionSet;

/// The identity the isolated process reports in its handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerIdentity(pub u32);

/// Everything the launcher needs to create one isolated process.
#[derive(Debug, Clone)]
pub struct ProcessSpec {
    /// Manifest locator from the originating request.
    pub manifest_locator: String,
    /// Concrete manifest path resolved during resource gathering.
    pub manifest_path: PathBuf,
    /// Permissions and execution-mode flags.
    pub permissions: PermissionSet,
    /// Profile directory of the requesting context.
    pub profile_directory: PathBuf,
    /// Whether the request came from a private context.
    pub off_the_record: bool,
    /// Whether crashes of this process count against the crash budget.
    pub enable_crash_throttling: bool,
    /// Debug-stub port reserved before launch, when debugging is enabled.
    pub debug_stub_port: Option<u16>,
}

/// Owned handle to a launched isolated process.
///
/// Dropping the handle does not terminate the process; teardown calls
/// [`IsolatedProcess::terminate`] explicitly so tests can observe it.
pub trait IsolatedProcess: Send {
    /// Launcher-scoped process identifier.
    fn id(&self) -> u64;

    /// Requests termination of the process. Idempotent.
    fn terminate(&mut self);
}

/// Creates and monitors isolated processes.
///
/// `launch` may suspend indefinitely; any timeout policy belongs to the
/// launcher. Connection confirmation and crash reports are delivered by
/// the host calling [`crate::LaunchCoordinator::on_process_connected`]
/// and [`crate::LaunchCoordinator::on_process_crashed`].
#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    /// Creates an isolated process for the given spec.
    async fn launch(&self, spec: &ProcessSpec) -> Result<Box<dyn IsolatedProcess>, LaunchError>;
}
