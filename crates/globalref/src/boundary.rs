//! The int64 calling convention used by the exported entry points
//!
//! Managed callers hold durable handles as plain `long`s, with `0` for
//! "no handle". These functions translate between that and [`RefHandle`].

use crate::bridge;
use crate::handle::{RefHandle, RefKind};
use crate::host::HostEnv;

/// `newref`: strong handle to `target`, or `0` for a null target.
pub fn newref<H: HostEnv>(env: &H, target: &H::Local) -> i64 {
    bridge::create_strong_ref(env, target).map_or(0, RefHandle::into_raw)
}

/// `newweakref`: weak handle to `target`, or `0` for a null target.
pub fn newweakref<H: HostEnv>(env: &H, target: &H::Local) -> i64 {
    bridge::create_weak_ref(env, target).map_or(0, RefHandle::into_raw)
}

/// `unref`: release a strong or weak handle. `0` is ignored.
///
/// # Safety
///
/// `raw` must be `0` or a live value returned by [`newref`] or
/// [`newweakref`] that is not used again afterwards.
pub unsafe fn unref<H: HostEnv>(env: &H, raw: i64) {
    if raw == 0 {
        return;
    }
    let kind = match env.ref_kind(raw) {
        Some(kind) => kind,
        None => {
            tracing::debug!(raw, "unrecognised reference type, deleting as strong");
            RefKind::Strong
        }
    };
    if let Some(handle) = RefHandle::from_raw(raw, kind) {
        bridge::release(env, handle);
    }
}

/// `get`: local for a strong handle, or the null local for `0`.
///
/// # Safety
///
/// `raw` must be `0` or a live value returned by [`newref`].
pub unsafe fn get<H: HostEnv>(env: &H, raw: i64) -> H::Local {
    match borrow(raw, RefKind::Strong) {
        Some(handle) => bridge::resolve(env, &handle),
        None => env.null_local(),
    }
}

/// `getweak`: local for a weak handle, or the null local if the referent is
/// gone or `raw` is `0`.
///
/// # Safety
///
/// `raw` must be `0` or a live value returned by [`newweakref`].
pub unsafe fn getweak<H: HostEnv>(env: &H, raw: i64) -> H::Local {
    borrow(raw, RefKind::Weak)
        .and_then(|handle| bridge::resolve_weak(env, &handle))
        .unwrap_or_else(|| env.null_local())
}

// The managed caller keeps ownership; the temporary handle is never released.
unsafe fn borrow(raw: i64, kind: RefKind) -> Option<RefHandle> {
    RefHandle::from_raw(raw, kind)
}
