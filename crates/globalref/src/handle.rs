//! Durable reference handles

use std::fmt;
use std::num::NonZeroI64;

/// Which class of durable reference a handle holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefKind {
    /// Keeps the referent reachable until released
    Strong,

    /// Observes the referent without keeping it alive
    Weak,
}

impl fmt::Display for RefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefKind::Strong => f.write_str("strong"),
            RefKind::Weak => f.write_str("weak"),
        }
    }
}

/// A durable, scope-independent handle to a host-owned object.
///
/// The raw value is whatever the host's reference table produced, widened
/// to 64 bits. It is opaque and only meaningful inside the current process.
///
/// A handle is not `Clone`: [`release`](crate::bridge::release) consumes
/// it, so each handle is released at most once through the typed API.
/// Dropping a handle without releasing it leaks the host table entry.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct RefHandle {
    kind: RefKind,
    raw: NonZeroI64,
}

impl RefHandle {
    pub(crate) fn new(kind: RefKind, raw: NonZeroI64) -> Self {
        Self { kind, raw }
    }

    /// Re-adopt a raw value previously produced by [`RefHandle::into_raw`].
    ///
    /// Returns `None` for `0`, the "no handle" sentinel.
    ///
    /// # Safety
    ///
    /// `raw` must be a live durable reference of class `kind`, created in
    /// this process and not yet released. Ownership moves into the returned
    /// handle.
    pub unsafe fn from_raw(raw: i64, kind: RefKind) -> Option<Self> {
        NonZeroI64::new(raw).map(|raw| Self::new(kind, raw))
    }

    /// Hand the raw value to the managed caller without releasing it.
    #[must_use = "the host reference leaks unless the raw value is released later"]
    pub fn into_raw(self) -> i64 {
        self.raw.get()
    }

    /// The raw value, still owned by this handle.
    pub fn raw(&self) -> i64 {
        self.raw.get()
    }

    /// Reference class of this handle.
    pub fn kind(&self) -> RefKind {
        self.kind
    }

    /// Whether this is a strong handle.
    pub fn is_strong(&self) -> bool {
        self.kind == RefKind::Strong
    }

    /// Whether this is a weak handle.
    pub fn is_weak(&self) -> bool {
        self.kind == RefKind::Weak
    }
}

impl fmt::Display for RefHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{:#x}", self.kind, self.raw.get())
    }
}
