//! Typed, capability-checked handle table.
//!
//! # Responsibilities
//! - Hand out opaque handles for values crossing the boundary
//! - Resolve handles only when tag, slot id and nonce all match
//! - Hold exactly one reference per live handle
//!
//! # Design Decisions
//! - Slot ids are allocated monotonically and never reused, so a released
//!   handle can never resolve to a newer value
//! - Each entry carries a random nonce; guessing a live slot id is not enough
//!   to forge a handle
//! - The tag is compared before the table is consulted

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

/// Identifies the type of value a handle refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeTag(u32);

impl TypeTag {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// Slot id plus nonce of a non-null handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct HandleSlot {
    id: u64,
    nonce: u64,
}

/// Opaque reference handed to the foreign caller.
///
/// A handle with no slot is the null handle: it stands for "no value" and is
/// accepted by every table regardless of tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundaryHandle {
    tag: TypeTag,
    slot: Option<HandleSlot>,
}

impl BoundaryHandle {
    pub const fn null(tag: TypeTag) -> Self {
        Self { tag, slot: None }
    }

    /// Rebuild a handle from its raw parts. A zero id is the null handle.
    ///
    /// Any bit pattern is accepted here; validity is decided at lookup.
    pub fn from_raw_parts(tag: u32, id: u64, nonce: u64) -> Self {
        let slot = (id != 0).then_some(HandleSlot { id, nonce });
        Self {
            tag: TypeTag(tag),
            slot,
        }
    }

    /// `(tag, id, nonce)`; id and nonce are zero for the null handle.
    pub fn into_raw_parts(self) -> (u32, u64, u64) {
        match self.slot {
            Some(slot) => (self.tag.0, slot.id, slot.nonce),
            None => (self.tag.0, 0, 0),
        }
    }

    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    pub fn is_null(&self) -> bool {
        self.slot.is_none()
    }
}

/// Why a handle could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleError {
    TypeConfusion { expected: TypeTag, found: TypeTag },
    Stale,
}

struct Entry<T> {
    nonce: u64,
    value: T,
}

/// Handles for one value type, bound to one tag.
pub struct HandleTable<T> {
    tag: TypeTag,
    type_name: &'static str,
    entries: DashMap<u64, Entry<T>>,
    next_id: AtomicU64,
}

impl<T: Clone> HandleTable<T> {
    pub fn new(tag: TypeTag, type_name: &'static str) -> Self {
        Self {
            tag,
            type_name,
            entries: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn null_handle(&self) -> BoundaryHandle {
        BoundaryHandle::null(self.tag)
    }

    /// Store `value` and return a fresh handle owning it.
    pub fn insert(&self, value: T) -> BoundaryHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let nonce = fastrand::u64(..);
        self.entries.insert(id, Entry { nonce, value });
        BoundaryHandle {
            tag: self.tag,
            slot: Some(HandleSlot { id, nonce }),
        }
    }

    fn check_tag(&self, handle: &BoundaryHandle) -> Result<Option<HandleSlot>, HandleError> {
        match handle.slot {
            None => Ok(None),
            Some(_) if handle.tag != self.tag => Err(HandleError::TypeConfusion {
                expected: self.tag,
                found: handle.tag,
            }),
            Some(slot) => Ok(Some(slot)),
        }
    }

    /// Clone the value behind `handle`; the handle keeps its own reference.
    pub fn get(&self, handle: &BoundaryHandle) -> Result<Option<T>, HandleError> {
        let Some(slot) = self.check_tag(handle)? else {
            return Ok(None);
        };
        self.entries
            .get(&slot.id)
            .filter(|entry| entry.nonce == slot.nonce)
            .map(|entry| Some(entry.value.clone()))
            .ok_or(HandleError::Stale)
    }

    /// Remove the value behind `handle`, returning the reference it held.
    pub fn remove(&self, handle: &BoundaryHandle) -> Result<Option<T>, HandleError> {
        let Some(slot) = self.check_tag(handle)? else {
            return Ok(None);
        };
        self.entries
            .remove_if(&slot.id, |_, entry| entry.nonce == slot.nonce)
            .map(|(_, entry)| Some(entry.value))
            .ok_or(HandleError::Stale)
    }

    pub fn contains(&self, handle: &BoundaryHandle) -> bool {
        matches!(self.get(handle), Ok(Some(_)))
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> fmt::Debug for HandleTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleTable")
            .field("tag", &self.tag)
            .field("type_name", &self.type_name)
            .field("live", &self.entries.len())
            .finish()
    }
}
