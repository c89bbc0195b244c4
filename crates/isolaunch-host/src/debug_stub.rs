//! Debug-stub endpoint reservation.
//!
//! When isolated-process debugging is enabled, the host binds a local TCP
//! listener *before* launch so a debugger can attach even though the
//! process itself cannot bind sockets from inside the sandbox. The chosen
//! port is published through the coordinator event stream; when debugging
//! is disabled this module is never touched and no port is reported.

use std::io;
use std::net::Ipv4Addr;

use tokio::net::TcpListener;
use tracing::info;

/// A reserved local debug endpoint.
///
/// The listener stays bound for the lifetime of the launch; dropping the
/// server releases the port.
#[derive(Debug)]
pub struct DebugStubServer {
    listener: TcpListener,
    port: u16,
}

impl DebugStubServer {
    /// Binds a loopback listener on `fixed_port`, or an OS-assigned port
    /// when `None`.
    ///
    /// # Errors
    ///
    /// Propagates the bind error; the caller reports it as a resource
    /// failure for the launch.
    pub async fn reserve(fixed_port: Option<u16>) -> io::Result<Self> {
        let listener =
            TcpListener::bind((Ipv4Addr::LOCALHOST, fixed_port.unwrap_or(0))).await?;
        let port = listener.local_addr()?.port();
        info!(port, "debug stub endpoint reserved");
        Ok(Self { listener, port })
    }

    /// The bound port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// The underlying listener, for hosts that hand it to a debugger
    /// transport.
    #[must_use]
    pub const fn listener(&self) -> &TcpListener {
        &self.listener
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reserve_os_assigned_port() {
        let server = DebugStubServer::reserve(None).await.unwrap();
        assert_ne!(server.port(), 0);
    }

    #[tokio::test]
    async fn test_reserve_fixed_port() {
        // Grab a free port first, release it, then ask for it explicitly.
        let probe = DebugStubServer::reserve(None).await.unwrap();
        let port = probe.port();
        drop(probe);

        let server = DebugStubServer::reserve(Some(port)).await.unwrap();
        assert_eq!(server.port(), port);
    }

    #[tokio::test]
    async fn test_reserve_conflict_fails() {
        let first = DebugStubServer::reserve(None).await.unwrap();
        let err = DebugStubServer::reserve(Some(first.port())).await;
        assert!(err.is_err());
    }
}
