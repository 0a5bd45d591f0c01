//! Shared utilities for integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rpc_embed::credentials::{
    BackendError, BackendRequest, CredentialBackend, CredentialFactory, CredentialKind, SecurityMechanism,
};
use rpc_embed::lifecycle::{Subsystem, SubsystemError};

/// Mechanism that counts how often it is dropped.
#[derive(Debug)]
pub struct CountedMechanism {
    kind: CredentialKind,
    drops: Arc<AtomicUsize>,
}

impl SecurityMechanism for CountedMechanism {
    fn kind(&self) -> CredentialKind {
        self.kind
    }
}

impl Drop for CountedMechanism {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

/// Backend that accepts every request and tracks construction and drops.
#[derive(Default)]
pub struct CountingBackend {
    pub created: AtomicUsize,
    pub drops: Arc<AtomicUsize>,
}

impl CountingBackend {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn drops(&self) -> usize {
        self.drops.load(Ordering::SeqCst)
    }
}

impl CredentialBackend for CountingBackend {
    fn create(&self, request: BackendRequest<'_>) -> Result<Box<dyn SecurityMechanism>, BackendError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(CountedMechanism {
            kind: request.kind(),
            drops: self.drops.clone(),
        }))
    }
}

pub fn counting_factory() -> (CredentialFactory, Arc<CountingBackend>) {
    let backend = Arc::new(CountingBackend::default());
    (CredentialFactory::new(backend.clone()), backend)
}

/// Subsystem that appends `"<name>:start"` / `"<name>:stop"` to a shared log.
pub struct RecordingSubsystem {
    name: &'static str,
    log: Arc<Mutex<Vec<String>>>,
    fail_start: bool,
}

impl RecordingSubsystem {
    pub fn new(name: &'static str, log: Arc<Mutex<Vec<String>>>) -> Arc<Self> {
        Arc::new(Self {
            name,
            log,
            fail_start: false,
        })
    }

    #[allow(dead_code)]
    pub fn failing(name: &'static str, log: Arc<Mutex<Vec<String>>>) -> Arc<Self> {
        Arc::new(Self {
            name,
            log,
            fail_start: true,
        })
    }

    fn record(&self, event: &str) {
        self.log.lock().unwrap().push(format!("{}:{}", self.name, event));
    }
}

impl Subsystem for RecordingSubsystem {
    fn name(&self) -> &'static str {
        self.name
    }

    fn start(&self) -> Result<(), SubsystemError> {
        if self.fail_start {
            return Err(SubsystemError::new("refusing to start"));
        }
        self.record("start");
        Ok(())
    }

    fn stop(&self) {
        self.record("stop");
    }
}
