//! Background subsystems and the ordered registry that owns them.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Error reported by a subsystem that could not start.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct SubsystemError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl SubsystemError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an underlying error (e.g. an `io::Error` from building a runtime).
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// A background service owned by the lifecycle manager.
///
/// `start` and `stop` are only ever called by [`ProcessLifecycle`] under its
/// count lock, so implementations do not need to guard against overlapping
/// calls themselves.
///
/// [`ProcessLifecycle`]: crate::lifecycle::ProcessLifecycle
pub trait Subsystem: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Bring the subsystem up. Must complete before returning.
    fn start(&self) -> Result<(), SubsystemError>;

    /// Tear the subsystem down. Must complete before returning.
    fn stop(&self);
}

/// Subsystems in start order.
#[derive(Clone, Default)]
pub struct SubsystemRegistry {
    subsystems: Vec<Arc<dyn Subsystem>>,
}

impl SubsystemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a subsystem; it starts after every subsystem registered before it.
    pub fn register(mut self, subsystem: Arc<dyn Subsystem>) -> Self {
        self.subsystems.push(subsystem);
        self
    }

    pub fn len(&self) -> usize {
        self.subsystems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subsystems.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.subsystems.iter().map(|s| s.name()).collect()
    }

    /// Start every subsystem in order.
    ///
    /// On failure the subsystems that already started are stopped in reverse
    /// order and the failing subsystem's name is returned with its error.
    pub(crate) fn start_all(&self) -> Result<(), (&'static str, SubsystemError)> {
        for (index, subsystem) in self.subsystems.iter().enumerate() {
            tracing::debug!(subsystem = subsystem.name(), "Starting subsystem");
            if let Err(e) = subsystem.start() {
                tracing::error!(subsystem = subsystem.name(), error = %e, "Subsystem failed to start");
                for started in self.subsystems[..index].iter().rev() {
                    tracing::debug!(subsystem = started.name(), "Rolling back subsystem");
                    started.stop();
                }
                return Err((subsystem.name(), e));
            }
        }
        Ok(())
    }

    /// Stop every subsystem in reverse start order.
    pub(crate) fn stop_all(&self) {
        for subsystem in self.subsystems.iter().rev() {
            tracing::debug!(subsystem = subsystem.name(), "Stopping subsystem");
            subsystem.stop();
        }
    }
}

impl fmt::Debug for SubsystemRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubsystemRegistry")
            .field("subsystems", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        name: &'static str,
        fail: bool,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Subsystem for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn start(&self) -> Result<(), SubsystemError> {
            if self.fail {
                return Err(SubsystemError::new("refused"));
            }
            self.log.lock().unwrap().push(format!("start:{}", self.name));
            Ok(())
        }

        fn stop(&self) {
            self.log.lock().unwrap().push(format!("stop:{}", self.name));
        }
    }

    fn recorder(name: &'static str, fail: bool, log: &Arc<Mutex<Vec<String>>>) -> Arc<dyn Subsystem> {
        Arc::new(Recorder {
            name,
            fail,
            log: log.clone(),
        })
    }

    #[test]
    fn test_start_and_stop_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = SubsystemRegistry::new()
            .register(recorder("a", false, &log))
            .register(recorder("b", false, &log))
            .register(recorder("c", false, &log));

        assert_eq!(registry.names(), vec!["a", "b", "c"]);
        registry.start_all().unwrap();
        registry.stop_all();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["start:a", "start:b", "start:c", "stop:c", "stop:b", "stop:a"]
        );
    }

    #[test]
    fn test_failed_start_rolls_back() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = SubsystemRegistry::new()
            .register(recorder("a", false, &log))
            .register(recorder("b", false, &log))
            .register(recorder("c", true, &log));

        let (name, err) = registry.start_all().unwrap_err();
        assert_eq!(name, "c");
        assert_eq!(err.to_string(), "refused");
        assert_eq!(
            *log.lock().unwrap(),
            vec!["start:a", "start:b", "stop:b", "stop:a"]
        );
    }

    #[test]
    fn test_subsystem_error_with_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let err = SubsystemError::with_source("failed to build runtime", io);
        assert_eq!(err.to_string(), "failed to build runtime");
        let source = std::error::Error::source(&err).expect("source should be kept");
        assert_eq!(source.to_string(), "boom");
        assert!(std::error::Error::source(&err).is_some());
    }
}
