//! RAII guard for host local frames

use crate::host::{CheckedLocals, HostEnv};

/// Default number of locals reserved by [`LocalFrame::push_default`].
pub const DEFAULT_FRAME_CAPACITY: i32 = 16;

/// RAII guard that pops a host local frame when dropped.
///
/// Locals created while the guard is alive, including those returned by
/// [`resolve`](crate::bridge::resolve), are freed when it goes away. The
/// guard cannot stop such a local from being used afterwards, so pushing one
/// is only safe on a [`CheckedLocals`] host. On a JNI environment use
/// [`jvm::with_local_frame`](crate::jvm::with_local_frame), which scopes
/// the locals with a closure:
///
/// ```compile_fail
/// use globalref::frame::LocalFrame;
///
/// fn scoped(env: &jni::JNIEnv<'_>) {
///     let _frame = LocalFrame::push(env, 4);
/// }
/// ```
///
/// # Example
///
/// ```
/// use globalref::bridge::{create_strong_ref, release, resolve};
/// use globalref::frame::LocalFrame;
/// use globalref::sim::SimHeap;
///
/// let heap = SimHeap::new();
/// let env = heap.attach();
/// let handle = create_strong_ref(&env, &env.alloc("x")).unwrap();
/// let before = env.local_count();
///
/// {
///     let _frame = LocalFrame::push(&env, 4);
///     for _ in 0..100 {
///         resolve(&env, &handle);
///     }
/// }
/// // frame popped, the 100 locals are gone
/// assert_eq!(env.local_count(), before);
/// release(&env, handle);
/// ```
pub struct LocalFrame<'e, H: HostEnv> {
    env: &'e H,
    popped: bool,
}

impl<'e, H: CheckedLocals> LocalFrame<'e, H> {
    /// Push a frame with room for `capacity` locals.
    ///
    /// A host that cannot reserve the frame is a fatal condition.
    pub fn push(env: &'e H, capacity: i32) -> Self {
        // SAFETY: the host checks every local it is handed
        unsafe { Self::push_unchecked(env, capacity) }
    }

    /// Push a frame with [`DEFAULT_FRAME_CAPACITY`].
    pub fn push_default(env: &'e H) -> Self {
        Self::push(env, DEFAULT_FRAME_CAPACITY)
    }
}

impl<'e, H: HostEnv> LocalFrame<'e, H> {
    /// Push a frame on any host.
    ///
    /// # Safety
    ///
    /// No local created while the frame is open may be used after it is
    /// popped, except the one returned by [`LocalFrame::pop_with`].
    pub unsafe fn push_unchecked(env: &'e H, capacity: i32) -> Self {
        if !env.push_local_frame(capacity) {
            tracing::error!(capacity, "host could not push a local frame");
            env.fatal_error("globalref: could not push a local frame");
        }
        Self { env, popped: false }
    }

    /// Pop the frame now, keeping `result` alive in the enclosing frame.
    ///
    /// Returns the new local for `result` (null if `result` was null).
    pub fn pop_with(mut self, result: H::Local) -> H::Local {
        self.popped = true;
        // SAFETY: this guard pushed the frame and has not popped it
        unsafe { self.env.pop_local_frame(result) }
    }

    /// The environment this frame belongs to.
    pub fn env(&self) -> &'e H {
        self.env
    }
}

impl<H: HostEnv> Drop for LocalFrame<'_, H> {
    fn drop(&mut self) {
        if !self.popped {
            // SAFETY: this guard pushed the frame and has not popped it
            unsafe {
                self.env.pop_local_frame(self.env.null_local());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimHeap;

    #[test]
    fn test_frame_frees_locals_on_drop() {
        let heap = SimHeap::new();
        let env = heap.attach();
        env.alloc("outer");

        {
            let frame = LocalFrame::push_default(&env);
            frame.env().alloc("inner");
            assert_eq!(env.local_count(), 2);
        }

        assert_eq!(env.local_count(), 1);
    }

    #[test]
    fn test_pop_with_carries_result_out() {
        let heap = SimHeap::new();
        let env = heap.attach();

        let kept = {
            let frame = LocalFrame::push(&env, 2);
            let a = env.alloc("a");
            env.alloc("b");
            frame.pop_with(a)
        };

        assert_eq!(env.local_count(), 1);
        assert_eq!(env.label(kept).as_deref(), Some("a"));
    }

    #[test]
    fn test_pop_with_null_result() {
        let heap = SimHeap::new();
        let env = heap.attach();
        let frame = LocalFrame::push_default(&env);
        env.alloc("temp");
        let out = frame.pop_with(env.null_local());
        assert!(env.is_null(&out));
        assert_eq!(env.local_count(), 0);
    }

    #[test]
    fn test_nested_frames() {
        let heap = SimHeap::new();
        let env = heap.attach();

        let _outer = LocalFrame::push_default(&env);
        env.alloc("one");
        {
            let _inner = LocalFrame::push_default(&env);
            env.alloc("two");
            env.alloc("three");
            assert_eq!(env.local_count(), 3);
        }
        assert_eq!(env.local_count(), 1);
    }
}
