//! Shared fakes and harness for coordinator integration tests.
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use isolaunch_core::channel::{ChannelHandle, ChannelKind};
use isolaunch_core::error::LaunchError;
use isolaunch_core::permissions::PermissionSet;
use isolaunch_core::request::{LaunchRequest, SessionRef};
use isolaunch_core::token::FileTokenMap;
use isolaunch_core::validation_cache::{MemoryValidationCache, ValidationCache};
use isolaunch_host::{
    ChannelFactory, ChannelPair, CoordinatorDeps, CoordinatorEvent, HostConfig,
    IsolatedProcess, LaunchCoordinator, LaunchReply, LocalEndpoint, PeerIdentity,
    ProcessLauncher, ProcessSpec,
};
use tempfile::TempDir;
use tokio::sync::{mpsc, oneshot};

/// Process handle that records termination.
pub struct FakeProcess {
    id: u64,
    terminated: Arc<AtomicBool>,
}

impl IsolatedProcess for FakeProcess {
    fn id(&self) -> u64 {
        self.id
    }

    fn terminate(&mut self) {
        self.terminated.store(true, Ordering::SeqCst);
    }
}

/// Launcher that records every spec it is asked to launch.
pub struct FakeLauncher {
    pub specs: Mutex<Vec<ProcessSpec>>,
    pub fail_with: Option<String>,
    pub terminated: Arc<AtomicBool>,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self {
            specs: Mutex::new(Vec::new()),
            fail_with: None,
            terminated: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::new()
        }
    }

    pub fn launch_count(&self) -> usize {
        self.specs.lock().unwrap().len()
    }

    pub fn process_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProcessLauncher for FakeLauncher {
    async fn launch(
        &self,
        spec: &ProcessSpec,
    ) -> Result<Box<dyn IsolatedProcess>, LaunchError> {
        self.specs.lock().unwrap().push(spec.clone());
        if let Some(message) = &self.fail_with {
            return Err(LaunchError::LaunchFailed(message.clone()));
        }
        Ok(Box::new(FakeProcess {
            id: 42,
            terminated: Arc::clone(&self.terminated),
        }))
    }
}

/// Local endpoint counting its own discard.
pub struct FakeEndpoint {
    kind: ChannelKind,
    discarded: Arc<AtomicUsize>,
}

impl LocalEndpoint for FakeEndpoint {
    fn kind(&self) -> ChannelKind {
        self.kind
    }
}

impl Drop for FakeEndpoint {
    fn drop(&mut self) {
        self.discarded.fetch_add(1, Ordering::SeqCst);
    }
}

/// Channel factory that can fail on a chosen kind and counts mints and
/// discards.
pub struct FakeChannelFactory {
    next_id: AtomicU64,
    pub fail_on: Option<ChannelKind>,
    pub minted: AtomicUsize,
    pub discarded: Arc<AtomicUsize>,
}

impl FakeChannelFactory {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            fail_on: None,
            minted: AtomicUsize::new(0),
            discarded: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing_on(kind: ChannelKind) -> Self {
        Self {
            fail_on: Some(kind),
            ..Self::new()
        }
    }

    pub fn minted_count(&self) -> usize {
        self.minted.load(Ordering::SeqCst)
    }

    pub fn discarded_count(&self) -> usize {
        self.discarded.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChannelFactory for FakeChannelFactory {
    async fn create_channel_pair(
        &self,
        kind: ChannelKind,
    ) -> Result<ChannelPair, LaunchError> {
        if self.fail_on == Some(kind) {
            return Err(LaunchError::ChannelCreationFailed(format!(
                "{} channel unavailable",
                kind.name()
            )));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.minted.fetch_add(1, Ordering::SeqCst);
        Ok(ChannelPair {
            local: Box::new(FakeEndpoint {
                kind,
                discarded: Arc::clone(&self.discarded),
            }),
            remote: ChannelHandle { id, kind },
        })
    }
}

/// One coordinator wired to fakes, with a manifest file on disk.
pub struct Harness {
    pub coordinator: LaunchCoordinator,
    pub reply_rx: oneshot::Receiver<LaunchReply>,
    pub events_rx: mpsc::UnboundedReceiver<CoordinatorEvent>,
    pub launcher: Arc<FakeLauncher>,
    pub factory: Arc<FakeChannelFactory>,
    pub cache: Arc<MemoryValidationCache>,
    pub tokens: Arc<FileTokenMap>,
    pub manifest_path: PathBuf,
    manifest_dir: TempDir,
}

impl Harness {
    pub fn new(config: HostConfig, launcher: FakeLauncher, factory: FakeChannelFactory) -> Self {
        Self::with_request(
            config,
            launcher,
            factory,
            request("https://example.com/app.manifest"),
        )
    }

    pub fn with_request(
        config: HostConfig,
        launcher: FakeLauncher,
        factory: FakeChannelFactory,
        request: LaunchRequest,
    ) -> Self {
        init_tracing();
        let manifest_dir = TempDir::new().unwrap();
        let manifest_path = manifest_dir.path().join("app.manifest");
        std::fs::write(&manifest_path, b"{\"program\":{}}").unwrap();

        let launcher = Arc::new(launcher);
        let factory = Arc::new(factory);
        let cache = Arc::new(MemoryValidationCache::new());
        let tokens = Arc::new(FileTokenMap::new());
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let deps = CoordinatorDeps {
            launcher: Arc::clone(&launcher) as Arc<dyn ProcessLauncher>,
            channel_factory: Arc::clone(&factory) as Arc<dyn ChannelFactory>,
            validation_cache: Arc::clone(&cache) as Arc<dyn ValidationCache>,
            file_tokens: Arc::clone(&tokens),
            events: events_tx,
        };
        let (coordinator, reply_rx) = LaunchCoordinator::new(request, config, deps);

        Self {
            coordinator,
            reply_rx,
            events_rx,
            launcher,
            factory,
            cache,
            tokens,
            manifest_path,
            manifest_dir,
        }
    }

    /// Drives the coordinator to the success reply: launch + handshake.
    pub async fn launch_to_success(&mut self) -> LaunchReply {
        let manifest_path = self.manifest_path.clone();
        self.coordinator.launch(&manifest_path).await.unwrap();
        self.coordinator
            .on_process_connected(PeerIdentity(1234))
            .await
            .unwrap();
        (&mut self.reply_rx).await.unwrap()
    }
}

/// Installs a test subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn request(locator: &str) -> LaunchRequest {
    LaunchRequest {
        manifest_locator: locator.to_string(),
        permissions: PermissionSet::default(),
        requester: SessionRef(7),
        profile_directory: PathBuf::from("/tmp/profile"),
        off_the_record: false,
        enable_crash_throttling: true,
    }
}
