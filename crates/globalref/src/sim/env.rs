//! Attached environments of a [`SimHeap`]

use std::marker::PhantomData;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use super::SimHeap;
use crate::handle::RefKind;
use crate::host::{CheckedLocals, HostEnv};

/// A scope-local object handle in the sim. `SimLocal::NULL` is null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SimLocal(Option<u32>);

impl SimLocal {
    /// The null local.
    pub const NULL: Self = Self(None);

    /// Whether this is the null local.
    pub fn is_null(self) -> bool {
        self.0.is_none()
    }
}

/// One thread's attachment to a [`SimHeap`].
///
/// Like a JNI environment it is tied to the thread that attached and
/// cannot be sent elsewhere.
pub struct SimEnv<'h> {
    pub(super) heap: &'h SimHeap,
    pub(super) id: u64,
    pub(super) _not_send: PhantomData<*const ()>,
}

impl<'h> SimEnv<'h> {
    /// The heap this environment is attached to.
    pub fn heap(&self) -> &'h SimHeap {
        self.heap
    }

    /// Allocate a new object and return a local to it in the current frame.
    pub fn alloc(&self, label: impl Into<String>) -> SimLocal {
        let _guard = self.heap.safepoint.read();
        let id = self.heap.next_object.fetch_add(1, Ordering::Relaxed);
        let label: String = label.into();
        self.heap.objects.insert(id, Arc::from(label));
        self.push_local(id);
        SimLocal(Some(id))
    }

    /// Delete one local. Deleting null is a no-op.
    pub fn delete_local(&self, obj: SimLocal) {
        let Some(id) = obj.0 else {
            return;
        };
        let _guard = self.heap.safepoint.read();
        let mut frames = self.frames_mut();
        for frame in frames.iter_mut().rev() {
            if let Some(i) = frame.iter().rposition(|&l| l == id) {
                frame.remove(i);
                return;
            }
        }
        panic!("sim: delete of unknown local {id}");
    }

    /// Number of locals across all of this environment's frames.
    pub fn local_count(&self) -> usize {
        self.frames_mut().iter().map(Vec::len).sum()
    }

    /// Number of open local frames, counting the base frame.
    pub fn frame_depth(&self) -> usize {
        self.frames_mut().len()
    }

    /// Identity comparison. Two nulls are the same object.
    pub fn is_same_object(&self, a: SimLocal, b: SimLocal) -> bool {
        a == b
    }

    /// Label the object was allocated with, if it is still alive.
    pub fn label(&self, obj: SimLocal) -> Option<String> {
        let id = obj.0?;
        self.heap.objects.get(&id).map(|label| label.value().to_string())
    }

    fn frames_mut(&self) -> dashmap::mapref::one::RefMut<'_, u64, Vec<Vec<u32>>> {
        match self.heap.frames.get_mut(&self.id) {
            Some(frames) => frames,
            None => panic!("sim: environment {} is not attached", self.id),
        }
    }

    fn push_local(&self, id: u32) {
        if let Some(frame) = self.frames_mut().last_mut() {
            frame.push(id);
        }
    }

    fn live_target(&self, obj: SimLocal) -> u32 {
        match obj.0 {
            Some(id) if self.heap.is_live(id) => id,
            Some(id) => panic!("sim: dangling local {id}"),
            None => panic!("sim: null local passed where an object is required"),
        }
    }

    fn new_ref(&self, obj: SimLocal, kind: RefKind) -> i64 {
        let _guard = self.heap.safepoint.read();
        let target = self.live_target(obj);
        self.heap.insert_ref(kind, target)
    }
}

impl Drop for SimEnv<'_> {
    fn drop(&mut self) {
        let _guard = self.heap.safepoint.read();
        self.heap.frames.remove(&self.id);
    }
}

impl HostEnv for SimEnv<'_> {
    type Local = SimLocal;

    fn null_local(&self) -> SimLocal {
        SimLocal::NULL
    }

    fn is_null(&self, obj: &SimLocal) -> bool {
        obj.is_null()
    }

    fn new_global_ref(&self, obj: &SimLocal) -> i64 {
        self.new_ref(*obj, RefKind::Strong)
    }

    fn new_weak_global_ref(&self, obj: &SimLocal) -> i64 {
        self.new_ref(*obj, RefKind::Weak)
    }

    unsafe fn delete_global_ref(&self, raw: i64) {
        if raw != 0 {
            let _guard = self.heap.safepoint.read();
            self.heap.remove_ref(raw, RefKind::Strong);
        }
    }

    unsafe fn delete_weak_global_ref(&self, raw: i64) {
        if raw != 0 {
            let _guard = self.heap.safepoint.read();
            self.heap.remove_ref(raw, RefKind::Weak);
        }
    }

    unsafe fn new_local_ref(&self, raw: i64) -> SimLocal {
        let _guard = self.heap.safepoint.read();
        let entry = self.heap.lookup_ref(raw);
        if self.heap.is_live(entry.target) {
            self.push_local(entry.target);
            SimLocal(Some(entry.target))
        } else {
            SimLocal::NULL
        }
    }

    unsafe fn ref_kind(&self, raw: i64) -> Option<RefKind> {
        self.heap.refs.get(&raw).map(|entry| entry.kind)
    }

    fn push_local_frame(&self, capacity: i32) -> bool {
        if capacity < 0 {
            return false;
        }
        self.frames_mut().push(Vec::with_capacity(capacity as usize));
        true
    }

    unsafe fn pop_local_frame(&self, result: SimLocal) -> SimLocal {
        let _guard = self.heap.safepoint.read();
        let mut frames = self.frames_mut();
        if frames.len() <= 1 {
            panic!("sim: local frame underflow");
        }
        frames.pop();
        match result.0 {
            Some(id) if self.heap.is_live(id) => {
                if let Some(frame) = frames.last_mut() {
                    frame.push(id);
                }
                result
            }
            _ => SimLocal::NULL,
        }
    }

    fn fatal_error(&self, msg: &str) -> ! {
        tracing::error!(env = self.id, msg, "sim host aborting");
        panic!("host runtime fatal error: {msg}")
    }
}

// SAFETY: locals are object ids checked against the heap on every use, and
// the sim holds no raw pointers
unsafe impl CheckedLocals for SimEnv<'_> {}
