//! Typed reference operations
//!
//! Every operation is a single delegation to the host. The environment is
//! passed explicitly so it is always clear which attachment a returned
//! local belongs to.
//!
//! # Example
//!
//! ```
//! use globalref::bridge::{create_strong_ref, release, resolve};
//! use globalref::sim::SimHeap;
//!
//! let heap = SimHeap::new();
//! let env = heap.attach();
//!
//! let obj = env.alloc("a");
//! let handle = create_strong_ref(&env, &obj).unwrap();
//!
//! let local = resolve(&env, &handle);
//! assert!(env.is_same_object(local, obj));
//!
//! release(&env, handle);
//! assert_eq!(heap.global_ref_count(), 0);
//! ```

use std::num::NonZeroI64;

use crate::handle::{RefHandle, RefKind};
use crate::host::HostEnv;

/// Create a durable strong reference to `target`.
///
/// Returns `None` only when `target` is the null local. A host that cannot
/// allocate the reference is a fatal condition.
pub fn create_strong_ref<H: HostEnv>(env: &H, target: &H::Local) -> Option<RefHandle> {
    if env.is_null(target) {
        return None;
    }
    let raw = env.new_global_ref(target);
    Some(adopt(env, RefKind::Strong, raw))
}

/// Create a durable weak reference to `target`.
///
/// The handle stays a valid identifier after the referent is collected;
/// [`resolve_weak`] then reports it gone.
pub fn create_weak_ref<H: HostEnv>(env: &H, target: &H::Local) -> Option<RefHandle> {
    if env.is_null(target) {
        return None;
    }
    let raw = env.new_weak_global_ref(target);
    Some(adopt(env, RefKind::Weak, raw))
}

/// Release a durable handle, letting the host reclaim its table entry.
pub fn release<H: HostEnv>(env: &H, handle: RefHandle) {
    let kind = handle.kind();
    let raw = handle.into_raw();
    tracing::trace!(raw, %kind, "releasing reference");
    // SAFETY: a RefHandle is live until consumed, and this consumes it
    unsafe {
        match kind {
            RefKind::Strong => env.delete_global_ref(raw),
            RefKind::Weak => env.delete_weak_global_ref(raw),
        }
    }
}

/// Resolve a strong handle to a local in the current frame.
pub fn resolve<H: HostEnv>(env: &H, handle: &RefHandle) -> H::Local {
    debug_assert!(handle.is_strong(), "resolve called with {handle}");
    // SAFETY: the handle is live while borrowed
    let local = unsafe { env.new_local_ref(handle.raw()) };
    if env.is_null(&local) {
        tracing::error!(raw = handle.raw(), "host returned null for a strong reference");
        env.fatal_error("globalref: could not create a local reference from a strong global");
    }
    local
}

/// Resolve a weak handle, or `None` if the referent has been collected.
pub fn resolve_weak<H: HostEnv>(env: &H, handle: &RefHandle) -> Option<H::Local> {
    debug_assert!(handle.is_weak(), "resolve_weak called with {handle}");
    // SAFETY: the handle is live while borrowed
    let local = unsafe { env.new_local_ref(handle.raw()) };
    if env.is_null(&local) {
        tracing::trace!(raw = handle.raw(), "weak referent is gone");
        None
    } else {
        Some(local)
    }
}

fn adopt<H: HostEnv>(env: &H, kind: RefKind, raw: i64) -> RefHandle {
    match NonZeroI64::new(raw) {
        Some(raw) => {
            tracing::trace!(raw = raw.get(), %kind, "created reference");
            RefHandle::new(kind, raw)
        }
        None => {
            tracing::error!(%kind, "host reference table exhausted");
            env.fatal_error("globalref: reference table exhausted")
        }
    }
}
