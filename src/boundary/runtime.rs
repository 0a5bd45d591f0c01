//! The embedding surface: lifecycle plus the credentials namespace.

use std::sync::{Arc, OnceLock};

use tokio::runtime::Handle;

use crate::boundary::wrapper::CredentialsWrapper;
use crate::config::RuntimeConfig;
use crate::credentials::{CredentialBackend, CredentialFactory, DefaultBackend};
use crate::lifecycle::{IoManager, LifecycleResult, ProcessLifecycle, SubsystemRegistry};
use crate::observability::{StatsCollector, StatsSnapshot, Telemetry, TraceFlags};

/// Everything the foreign caller reaches through the boundary.
#[derive(Debug)]
pub struct Runtime {
    lifecycle: ProcessLifecycle,
    credentials: CredentialsWrapper,
    io: Arc<IoManager>,
    telemetry: Telemetry,
}

impl Runtime {
    /// Wire the subsystems. Start order is trace flags, io, stats; stop is
    /// the reverse.
    pub fn new(config: &RuntimeConfig, backend: Arc<dyn CredentialBackend>) -> Self {
        let trace = Arc::new(TraceFlags::new(config.trace.flags.clone()));
        let io = Arc::new(IoManager::new(config.io.clone()));
        let stats = Arc::new(StatsCollector::new());

        let registry = SubsystemRegistry::new()
            .register(trace.clone())
            .register(io.clone())
            .register(stats.clone());

        let telemetry = Telemetry::new(stats, trace);
        let factory = CredentialFactory::new(backend).with_telemetry(telemetry.clone());

        Self {
            lifecycle: ProcessLifecycle::new(registry),
            credentials: CredentialsWrapper::new(factory, telemetry.clone()),
            io,
            telemetry,
        }
    }

    /// Runtime backed by the default credential backend.
    pub fn from_config(config: &RuntimeConfig) -> Self {
        let backend = DefaultBackend::new(config.transport_security.clone());
        Self::new(config, Arc::new(backend))
    }

    /// Take one reference on the process lifecycle.
    pub fn init(&self) -> LifecycleResult<()> {
        self.lifecycle.acquire()
    }

    /// Give back one reference. Releasing more than was acquired panics.
    pub fn shutdown(&self) {
        self.lifecycle.release()
    }

    pub fn try_shutdown(&self) -> LifecycleResult<()> {
        self.lifecycle.try_release()
    }

    pub fn credentials(&self) -> &CredentialsWrapper {
        &self.credentials
    }

    pub fn lifecycle(&self) -> &ProcessLifecycle {
        &self.lifecycle
    }

    /// Handle to the io runtime; `None` while the lifecycle is stopped.
    pub fn io_handle(&self) -> Option<Handle> {
        self.io.handle()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.telemetry.stats.snapshot()
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }
}

static GLOBAL: OnceLock<Runtime> = OnceLock::new();

/// The process-wide runtime, built from default configuration unless
/// [`install_global`] ran first.
pub fn global() -> &'static Runtime {
    GLOBAL.get_or_init(|| Runtime::from_config(&RuntimeConfig::default()))
}

/// Build the process-wide runtime from `config`. Returns `false` when it
/// already exists, in which case `config` is ignored.
pub fn install_global(config: &RuntimeConfig) -> bool {
    let mut installed = false;
    GLOBAL.get_or_init(|| {
        installed = true;
        Runtime::from_config(config)
    });
    installed
}
