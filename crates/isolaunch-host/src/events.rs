//! Out-of-band coordinator events.
//!
//! Some outcomes must reach the host outside the single terminal reply:
//! the debug-stub port once it is selected, and crashes that happen after
//! the success reply has already been sent. Events are emitted on an
//! unbounded sender the host supplies; a host that does not care may drop
//! the receiver and emission becomes a no-op.

use tokio::sync::mpsc;
use tracing::trace;

/// Notification emitted outside the request/reply pair.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CoordinatorEvent {
    /// The debug-stub endpoint was reserved on this port.
    DebugStubPortSelected {
        /// The locally bound port.
        port: u16,
    },
    /// The isolated process crashed after the launch reply was sent.
    ProcessCrashed {
        /// Exit status reported by the launcher.
        exit_status: i32,
    },
}

impl CoordinatorEvent {
    /// Event type name for logging.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::DebugStubPortSelected { .. } => "launch.debug_stub_port_selected",
            Self::ProcessCrashed { .. } => "launch.process_crashed",
        }
    }
}

/// Sends an event, tolerating a dropped receiver.
pub(crate) fn emit(sender: &mpsc::UnboundedSender<CoordinatorEvent>, event: CoordinatorEvent) {
    trace!(event = event.event_type(), "emitting coordinator event");
    // A closed receiver means the host stopped observing; that is not an
    // error for the launch itself.
    let _ = sender.send(event);
}
