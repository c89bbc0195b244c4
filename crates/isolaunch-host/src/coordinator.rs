//! The launch coordinator state machine.
//!
//! One [`LaunchCoordinator`] exists per in-flight launch request. It owns
//! the request, the pending reply obligation, the process handle once
//! launch succeeds, and the local channel endpoints once channels exist.
//!
//! # State machine
//!
//! ```text
//! Created ──► ResourcesPending ──► Launching ──► Connected ──► ChannelsReady
//!                                                                   │
//!                              RepliedFailure ◄── (any failure)     ▼
//!                                                            RepliedSuccess
//! ```
//!
//! # Invariants
//!
//! - Exactly one of success/failure is ever delivered per request, and a
//!   crash before `ChannelsReady` always yields the failure reply.
//! - The peer identity is recorded strictly once; a second handshake is a
//!   protocol violation that tears the instance down.
//! - The four channel pairs are minted all-or-nothing: a partial set is
//!   never exposed, and partially minted endpoints are discarded.
//! - After a terminal state is reached and the instance is torn down,
//!   inbound messages are dropped and logged, never re-dispatched.
//!
//! The coordinator is single-threaded: all methods take `&mut self`, so
//! messages from a given process are handled in arrival order relative to
//! that process. Instances share only the validation cache and the file
//! token map, both of which are internally synchronized.

use std::path::Path;
use std::sync::Arc;

use isolaunch_core::channel::{ChannelHandle, ChannelHandleSet, ChannelKind};
use isolaunch_core::error::LaunchError;
use isolaunch_core::request::LaunchRequest;
use isolaunch_core::token::{FileToken, FileTokenMap};
use isolaunch_core::validation_cache::ValidationCache;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::channel_factory::{ChannelFactory, LocalEndpoint};
use crate::config::HostConfig;
use crate::debug_stub::DebugStubServer;
use crate::events::{emit, CoordinatorEvent};
use crate::launcher::{IsolatedProcess, PeerIdentity, ProcessLauncher, ProcessSpec};
use crate::messages::{PluginMessage, ResolvedFile};
use crate::reply::{LaunchReply, ReplyObligation};
use crate::state::LaunchState;

/// Injected collaborators for a coordinator instance.
///
/// The launcher and channel factory are per-host services; the validation
/// cache and file-token map are shared across all in-flight launches.
pub struct CoordinatorDeps {
    /// Creates and monitors isolated processes.
    pub launcher: Arc<dyn ProcessLauncher>,
    /// Mints paired communication endpoints.
    pub channel_factory: Arc<dyn ChannelFactory>,
    /// Shared signature trust store.
    pub validation_cache: Arc<dyn ValidationCache>,
    /// Shared token → path map.
    pub file_tokens: Arc<FileTokenMap>,
    /// Sink for out-of-band notifications.
    pub events: mpsc::UnboundedSender<CoordinatorEvent>,
}

/// Drives one launch request to exactly one terminal reply.
pub struct LaunchCoordinator {
    request: LaunchRequest,
    config: HostConfig,
    deps: CoordinatorDeps,

    state: LaunchState,
    reply: Option<ReplyObligation>,
    process: Option<Box<dyn IsolatedProcess>>,
    peer: Option<PeerIdentity>,
    debug_stub: Option<DebugStubServer>,
    local_endpoints: Vec<Box<dyn LocalEndpoint>>,
    last_keepalive: Option<Instant>,
    torn_down: bool,
}

impl LaunchCoordinator {
    /// Creates a coordinator for one request, returning the receiver on
    /// which the requester awaits the single terminal reply.
    #[must_use]
    pub fn new(
        request: LaunchRequest,
        config: HostConfig,
        deps: CoordinatorDeps,
    ) -> (Self, oneshot::Receiver<LaunchReply>) {
        let (reply, rx) = ReplyObligation::new();
        let coordinator = Self {
            request,
            config,
            deps,
            state: LaunchState::Created,
            reply: Some(reply),
            process: None,
            peer: None,
            debug_stub: None,
            local_endpoints: Vec::new(),
            last_keepalive: None,
            torn_down: false,
        };
        (coordinator, rx)
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> LaunchState {
        self.state
    }

    /// Peer identity, once the handshake has been received.
    #[must_use]
    pub const fn peer(&self) -> Option<PeerIdentity> {
        self.peer
    }

    /// Debug-stub port, when one was reserved.
    #[must_use]
    pub fn debug_stub_port(&self) -> Option<u16> {
        self.debug_stub.as_ref().map(DebugStubServer::port)
    }

    /// The request this coordinator owns.
    #[must_use]
    pub const fn request(&self) -> &LaunchRequest {
        &self.request
    }

    /// Validates the request, gathers preconditions, and asks the
    /// launcher to create the isolated process.
    ///
    /// `manifest_path` is the concrete file the manifest locator resolved
    /// to; resolving the locator is the requester's side of the contract.
    ///
    /// On success the coordinator is left in `Launching`, awaiting the
    /// connection confirmation via [`Self::on_process_connected`]. On
    /// failure the single failure reply has already been sent when this
    /// returns; the error is also returned for the host's own logging.
    pub async fn launch(&mut self, manifest_path: &Path) -> Result<(), LaunchError> {
        if self.state != LaunchState::Created {
            let err = LaunchError::ProtocolViolation(format!(
                "launch called in state {}",
                self.state
            ));
            self.teardown_with_violation(&err);
            return Err(err);
        }

        if let Err(err) = self.request.validate() {
            self.fail(&err);
            return Err(err);
        }

        // Crash throttling: the budget verdict is computed by the host;
        // requests that opted in are refused before any resource is
        // committed.
        if self.request.enable_crash_throttling && self.config.crash_budget_exhausted {
            let err =
                LaunchError::LaunchFailed("process crashed too many times".to_string());
            self.fail(&err);
            return Err(err);
        }

        self.transition(LaunchState::ResourcesPending);

        if let Err(io_err) = tokio::fs::metadata(manifest_path).await {
            let err = LaunchError::ResourceUnavailable(format!(
                "manifest {} unavailable: {io_err}",
                manifest_path.display()
            ));
            self.fail(&err);
            return Err(err);
        }

        let mut debug_stub_port = None;
        if self.config.enable_debug_stub {
            match DebugStubServer::reserve(self.config.debug_stub_port).await {
                Ok(server) => {
                    debug_stub_port = Some(server.port());
                    emit(
                        &self.deps.events,
                        CoordinatorEvent::DebugStubPortSelected { port: server.port() },
                    );
                    self.debug_stub = Some(server);
                },
                Err(io_err) => {
                    let err = LaunchError::ResourceUnavailable(format!(
                        "debug stub endpoint: {io_err}"
                    ));
                    self.fail(&err);
                    return Err(err);
                },
            }
        }

        self.transition(LaunchState::Launching);

        let spec = ProcessSpec {
            manifest_locator: self.request.manifest_locator.clone(),
            manifest_path: manifest_path.to_path_buf(),
            permissions: self.request.permissions,
            profile_directory: self.request.profile_directory.clone(),
            off_the_record: self.request.off_the_record,
            enable_crash_throttling: self.request.enable_crash_throttling,
            debug_stub_port,
        };

        match self.deps.launcher.launch(&spec).await {
            Ok(process) => {
                info!(
                    process_id = process.id(),
                    manifest = %self.request.manifest_locator,
                    "isolated process launched"
                );
                self.process = Some(process);
                Ok(())
            },
            Err(err) => {
                self.fail(&err);
                Err(err)
            },
        }
    }

    /// Handles the peer handshake: records the identity strictly once,
    /// then mints the four channel pairs and sends the success reply.
    ///
    /// A second handshake for this instance is a protocol violation: the
    /// recorded identity is not overwritten and the instance is torn
    /// down.
    pub async fn on_process_connected(
        &mut self,
        peer: PeerIdentity,
    ) -> Result<(), LaunchError> {
        if self.peer.is_some() || self.state != LaunchState::Launching {
            let err = LaunchError::ProtocolViolation(format!(
                "unexpected handshake from peer {} in state {}",
                peer.0, self.state
            ));
            self.teardown_with_violation(&err);
            return Err(err);
        }

        self.peer = Some(peer);
        self.transition(LaunchState::Connected);
        info!(peer = peer.0, "isolated process connected");

        let channels = match self.create_channels().await {
            Ok(channels) => channels,
            Err(err) => {
                self.fail(&err);
                return Err(err);
            },
        };

        self.transition(LaunchState::ChannelsReady);
        if let Some(reply) = self.reply.take() {
            reply.succeed(channels);
        }
        self.transition(LaunchState::RepliedSuccess);
        Ok(())
    }

    /// Mints all four channel pairs, or none.
    ///
    /// Locals minted before a failure are dropped, which discards them at
    /// the factory.
    async fn create_channels(&mut self) -> Result<ChannelHandleSet, LaunchError> {
        let mut locals: Vec<Box<dyn LocalEndpoint>> = Vec::with_capacity(4);
        let mut remotes: Vec<ChannelHandle> = Vec::with_capacity(4);

        for kind in ChannelKind::ALL {
            let pair = self.deps.channel_factory.create_channel_pair(kind).await?;
            if pair.remote.kind != kind {
                return Err(LaunchError::ChannelCreationFailed(format!(
                    "factory minted {} endpoint for {} request",
                    pair.remote.kind.name(),
                    kind.name()
                )));
            }
            locals.push(pair.local);
            remotes.push(pair.remote);
        }

        let Ok([host_api, client_api, trusted, manifest_service]) =
            <[ChannelHandle; 4]>::try_from(remotes)
        else {
            return Err(LaunchError::ChannelCreationFailed(
                "factory returned wrong number of endpoints".to_string(),
            ));
        };
        let Some(set) =
            ChannelHandleSet::new(host_api, client_api, trusted, manifest_service)
        else {
            return Err(LaunchError::ChannelCreationFailed(
                "factory returned mismatched channel kinds".to_string(),
            ));
        };

        self.local_endpoints = locals;
        Ok(set)
    }

    /// Handles a crash report from the launcher.
    ///
    /// Before the channels are up this fails the launch (the requester is
    /// still waiting). Afterwards the reply has already been sent, so the
    /// crash is reported out-of-band and the instance is torn down; a
    /// second reply is never produced.
    pub fn on_process_crashed(&mut self, exit_status: i32) {
        if self.torn_down {
            debug!(exit_status, "crash report for torn-down instance dropped");
            return;
        }
        if self.state.accepts_messages() {
            warn!(exit_status, "isolated process crashed");
            emit(
                &self.deps.events,
                CoordinatorEvent::ProcessCrashed { exit_status },
            );
            self.teardown();
        } else {
            let err = LaunchError::LaunchFailed(format!(
                "isolated process crashed before launch completed (exit status {exit_status})"
            ));
            self.fail(&err);
        }
    }

    /// Cancels the launch because the requester's session ended.
    ///
    /// The instance is still driven to a terminal state so the process
    /// and channel resources are released, but the reply is suppressed.
    pub fn cancel(&mut self) {
        if self.torn_down {
            return;
        }
        info!(state = %self.state, "launch cancelled");
        if let Some(reply) = self.reply.take() {
            reply.discard();
        }
        if !self.state.is_terminal() {
            self.transition(LaunchState::RepliedFailure);
        }
        self.teardown();
    }

    /// Dispatches one inbound message from the isolated process.
    ///
    /// Messages are accepted only from `ChannelsReady` onward while the
    /// instance is live; anything outside that window is dropped and
    /// logged, never re-dispatched. A malformed message is a protocol
    /// violation.
    pub async fn handle_message(&mut self, message: PluginMessage) {
        if self.torn_down || !self.state.accepts_messages() {
            warn!(
                category = message.category(),
                state = %self.state,
                "dropping message outside dispatch window"
            );
            return;
        }

        match message {
            PluginMessage::QueryKnownToValidate { signature, reply } => {
                if signature.as_bytes().is_empty() {
                    let err = LaunchError::ProtocolViolation(
                        "validation query with empty signature".to_string(),
                    );
                    self.teardown_with_violation(&err);
                    return;
                }
                let known = self.deps.validation_cache.lookup(&signature);
                debug!(?signature, known, "validation query");
                if reply.send(known).is_err() {
                    debug!("validation query reply dropped by peer");
                }
            },
            PluginMessage::SetKnownToValidate { signature } => {
                if signature.as_bytes().is_empty() {
                    let err = LaunchError::ProtocolViolation(
                        "validation update with empty signature".to_string(),
                    );
                    self.teardown_with_violation(&err);
                    return;
                }
                debug!(?signature, "validation update");
                self.deps.validation_cache.record(signature);
            },
            PluginMessage::ResolveFileToken { token, reply } => {
                let result = self.resolve_file_token(token).await;
                if let Err(err) = &result {
                    debug!(%err, "file token resolution failed");
                }
                if reply.send(result).is_err() {
                    debug!("file token reply dropped by peer");
                }
            },
        }
    }

    /// Keepalive from the isolated process. Returns whether the message
    /// should be forwarded to the host, or suppressed by the throttle
    /// interval.
    pub fn on_keepalive(&mut self) -> bool {
        let now = Instant::now();
        match self.last_keepalive {
            Some(last) if now.duration_since(last) < self.config.keepalive_throttle => false,
            _ => {
                self.last_keepalive = Some(now);
                true
            },
        }
    }

    /// Resolves a file token to an open handle. Consume-once: the token
    /// is removed from the shared map whether or not the open succeeds.
    async fn resolve_file_token(
        &self,
        token: FileToken,
    ) -> Result<ResolvedFile, LaunchError> {
        let Some(path) = self.deps.file_tokens.take(token) else {
            return Err(LaunchError::TokenResolutionFailed(format!(
                "unknown file token {:016x}:{:016x}",
                token.hi, token.lo
            )));
        };
        match tokio::fs::File::open(&path).await {
            Ok(file) => Ok(ResolvedFile { path, file }),
            Err(io_err) => Err(LaunchError::TokenResolutionFailed(format!(
                "failed to open {}: {io_err}",
                path.display()
            ))),
        }
    }

    /// Sends the failure reply (when still owed) and releases resources.
    fn fail(&mut self, err: &LaunchError) {
        warn!(%err, state = %self.state, "launch failed");
        if let Some(reply) = self.reply.take() {
            reply.fail(err.to_string());
        }
        if !self.state.is_terminal() {
            self.transition(LaunchState::RepliedFailure);
        }
        self.teardown();
    }

    /// Protocol violations are logged at error level and force teardown
    /// even when the success reply was already sent; the exactly-once
    /// invariant wins over re-reporting.
    fn teardown_with_violation(&mut self, err: &LaunchError) {
        error!(%err, state = %self.state, "protocol violation, tearing down instance");
        if let Some(reply) = self.reply.take() {
            reply.fail(err.to_string());
            if !self.state.is_terminal() {
                self.transition(LaunchState::RepliedFailure);
            }
        }
        self.teardown();
    }

    /// Releases the process, channel endpoints, and debug stub. Idempotent.
    fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        if let Some(process) = self.process.as_mut() {
            process.terminate();
        }
        self.local_endpoints.clear();
        self.debug_stub = None;
        debug!(state = %self.state, "launch instance torn down");
    }

    fn transition(&mut self, next: LaunchState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {next}",
            self.state
        );
        debug!(from = %self.state, to = %next, "launch state transition");
        self.state = next;
    }
}
