//! The host runtime's reference-table primitives

use crate::handle::RefKind;

/// An attached host environment.
///
/// A value implementing this trait is the explicit context every bridge
/// operation runs in: the thread attachment that local handles belong to.
/// Implementations forward straight to the host. The host's reference
/// table is synchronized by the host, so implementations must not add
/// locking of their own.
///
/// Raw durable values are the host's reference pointers widened to `i64`,
/// with `0` meaning "none". Primitives that accept a raw value are `unsafe`
/// because the host cannot tell a live value from a dead or foreign one.
pub trait HostEnv {
    /// A scope-local object handle, valid only inside this attachment.
    type Local;

    /// The null local.
    fn null_local(&self) -> Self::Local;

    /// Whether `obj` is the null local.
    fn is_null(&self, obj: &Self::Local) -> bool;

    /// Create a strong global reference to `obj`. Returns `0` if the host
    /// could not allocate one.
    fn new_global_ref(&self, obj: &Self::Local) -> i64;

    /// Create a weak global reference to `obj`. Returns `0` if the host
    /// could not allocate one.
    fn new_weak_global_ref(&self, obj: &Self::Local) -> i64;

    /// Delete a strong global reference.
    ///
    /// # Safety
    ///
    /// `raw` must be `0` or a live strong global reference.
    unsafe fn delete_global_ref(&self, raw: i64);

    /// Delete a weak global reference.
    ///
    /// # Safety
    ///
    /// `raw` must be `0` or a live weak global reference.
    unsafe fn delete_weak_global_ref(&self, raw: i64);

    /// Create a local reference in the current frame from a durable one.
    ///
    /// Returns the null local when a weak referent has been collected.
    ///
    /// # Safety
    ///
    /// `raw` must be a live durable reference.
    unsafe fn new_local_ref(&self, raw: i64) -> Self::Local;

    /// Ask the host which class of durable reference `raw` is.
    ///
    /// Returns `None` for anything that is not a durable reference.
    ///
    /// # Safety
    ///
    /// `raw` must be `0` or a value the host handed out as a reference.
    unsafe fn ref_kind(&self, raw: i64) -> Option<RefKind>;

    /// Open a local frame with room for at least `capacity` locals.
    /// Returns `false` if the host could not reserve the frame.
    fn push_local_frame(&self, capacity: i32) -> bool;

    /// Close the innermost local frame, freeing its locals. `result` is
    /// carried into the enclosing frame and its new local returned.
    ///
    /// # Safety
    ///
    /// There must be a frame opened by [`HostEnv::push_local_frame`] that
    /// has not been popped.
    unsafe fn pop_local_frame(&self, result: Self::Local) -> Self::Local;

    /// Report an unrecoverable host failure. Never returns.
    fn fatal_error(&self, msg: &str) -> !;
}

/// A host that checks every local it is given.
///
/// [`LocalFrame::push`](crate::frame::LocalFrame::push) is safe on these
/// hosts: a local that outlived its frame is caught by the host instead of
/// being undefined behaviour.
///
/// # Safety
///
/// Passing a deleted local, or one from a popped frame, to any
/// [`HostEnv`] method must either work or panic. It must never touch freed
/// memory.
pub unsafe trait CheckedLocals: HostEnv {}
