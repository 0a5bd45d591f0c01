//! Per-area trace switches.
//!
//! # Responsibilities
//! - Parse configured flags plus `RPC_EMBED_TRACE` (comma separated, `all` allowed)
//! - Expose cheap `is_enabled` checks to hot paths
//!
//! # Design Decisions
//! - A lifecycle subsystem: flags are parsed on start and cleared on stop
//! - Unknown names are logged and skipped at runtime; config validation rejects them earlier

use std::sync::atomic::{AtomicU32, Ordering};

use crate::lifecycle::{Subsystem, SubsystemError};

/// Environment variable read on start.
pub const TRACE_ENV_VAR: &str = "RPC_EMBED_TRACE";

/// A traceable area of the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceFlag {
    Lifecycle,
    Credentials,
    Handles,
}

impl TraceFlag {
    pub const ALL: [TraceFlag; 3] = [TraceFlag::Lifecycle, TraceFlag::Credentials, TraceFlag::Handles];

    fn bit(self) -> u32 {
        match self {
            TraceFlag::Lifecycle => 1 << 0,
            TraceFlag::Credentials => 1 << 1,
            TraceFlag::Handles => 1 << 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TraceFlag::Lifecycle => "lifecycle",
            TraceFlag::Credentials => "credentials",
            TraceFlag::Handles => "handles",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|flag| flag.as_str() == name)
    }
}

/// Whether `name` is a valid entry in a trace flag list.
pub fn is_known_flag(name: &str) -> bool {
    name == "all" || TraceFlag::parse(name).is_some()
}

/// Parse a flag list into a bitset, returning the names that were not recognised.
fn parse_flags<'a>(names: impl IntoIterator<Item = &'a str>) -> (u32, Vec<&'a str>) {
    let mut bits = 0;
    let mut unknown = Vec::new();
    for name in names.into_iter().map(str::trim).filter(|n| !n.is_empty()) {
        if name == "all" {
            bits = TraceFlag::ALL.iter().fold(bits, |acc, f| acc | f.bit());
        } else if let Some(flag) = TraceFlag::parse(name) {
            bits |= flag.bit();
        } else {
            unknown.push(name);
        }
    }
    (bits, unknown)
}

/// Trace switches, live between start and stop.
#[derive(Debug)]
pub struct TraceFlags {
    configured: Vec<String>,
    bits: AtomicU32,
}

impl TraceFlags {
    pub fn new(configured: Vec<String>) -> Self {
        Self {
            configured,
            bits: AtomicU32::new(0),
        }
    }

    pub fn is_enabled(&self, flag: TraceFlag) -> bool {
        self.bits.load(Ordering::Relaxed) & flag.bit() != 0
    }

    pub fn enabled(&self) -> Vec<TraceFlag> {
        TraceFlag::ALL.into_iter().filter(|f| self.is_enabled(*f)).collect()
    }

    fn apply(&self, env: Option<&str>) {
        let names = self
            .configured
            .iter()
            .map(String::as_str)
            .chain(env.into_iter().flat_map(|v| v.split(',')));
        let (bits, unknown) = parse_flags(names);
        for name in unknown {
            tracing::warn!(flag = name, "Unknown trace flag ignored");
        }
        self.bits.store(bits, Ordering::Relaxed);
    }
}

impl Subsystem for TraceFlags {
    fn name(&self) -> &'static str {
        "trace_flags"
    }

    fn start(&self) -> Result<(), SubsystemError> {
        let env = std::env::var(TRACE_ENV_VAR).ok();
        self.apply(env.as_deref());
        tracing::debug!(enabled = ?self.enabled(), "Trace flags applied");
        Ok(())
    }

    fn stop(&self) {
        self.bits.store(0, Ordering::Relaxed);
    }
}
