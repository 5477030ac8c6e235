//! An in-process host runtime for exercising the bridge without a VM
//!
//! [`SimHeap`] plays the part of a garbage-collected host: it owns objects,
//! keeps a durable reference table, and tracks the local frames of every
//! attached environment. [`SimEnv`] is one attachment and implements
//! [`HostEnv`](crate::host::HostEnv).
//!
//! The sim is stricter than a production host. Anything a real runtime
//! would treat as undefined (a dangling local, a released or foreign
//! durable value, deleting a weak reference as strong, popping the base
//! frame) panics with a description of the misuse.
//!
//! # Example
//!
//! ```
//! use globalref::bridge::{create_weak_ref, release, resolve_weak};
//! use globalref::sim::SimHeap;
//!
//! let heap = SimHeap::new();
//! let env = heap.attach();
//!
//! let obj = env.alloc("short-lived");
//! let weak = create_weak_ref(&env, &obj).unwrap();
//! env.delete_local(obj);
//!
//! assert_eq!(heap.collect(), 1);
//! assert!(resolve_weak(&env, &weak).is_none());
//! release(&env, weak);
//! ```

mod env;

pub use env::{SimEnv, SimLocal};

use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicI64, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;

use crate::handle::RefKind;

/// One row of the durable reference table.
#[derive(Debug, Clone, Copy)]
struct RefEntry {
    kind: RefKind,
    target: u32,
}

/// A simulated garbage-collected heap with a durable reference table.
#[derive(Debug)]
pub struct SimHeap {
    /// Live objects by id, with a label for identifying them in tests
    objects: DashMap<u32, Arc<str>>,

    /// Durable reference table
    refs: DashMap<i64, RefEntry>,

    /// Local frames per attached environment (innermost last)
    frames: DashMap<u64, Vec<Vec<u32>>>,

    /// Mutators hold it shared; `collect` holds it exclusively
    safepoint: RwLock<()>,

    /// Maximum number of durable references, if limited
    ref_capacity: Option<usize>,

    /// Table slots in use, reserved before an entry is inserted
    ref_slots: AtomicUsize,

    next_object: AtomicU32,
    next_ref: AtomicI64,
    next_env: AtomicU64,
    collections: AtomicU64,
}

impl Default for SimHeap {
    fn default() -> Self {
        Self::new()
    }
}

impl SimHeap {
    /// Create an empty heap with an unbounded reference table.
    pub fn new() -> Self {
        Self {
            objects: DashMap::new(),
            refs: DashMap::new(),
            frames: DashMap::new(),
            safepoint: RwLock::new(()),
            ref_capacity: None,
            ref_slots: AtomicUsize::new(0),
            next_object: AtomicU32::new(1),
            next_ref: AtomicI64::new(1),
            next_env: AtomicU64::new(1),
            collections: AtomicU64::new(0),
        }
    }

    /// Create a heap whose reference table holds at most `max` entries.
    pub fn with_ref_capacity(max: usize) -> Self {
        Self {
            ref_capacity: Some(max),
            ..Self::new()
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Attachment
    // ═══════════════════════════════════════════════════════════════════

    /// Attach the calling thread, returning its environment.
    ///
    /// The environment starts with one base local frame and detaches when
    /// dropped, freeing its locals.
    pub fn attach(&self) -> SimEnv<'_> {
        let _guard = self.safepoint.read();
        let id = self.next_env.fetch_add(1, Ordering::Relaxed);
        self.frames.insert(id, vec![Vec::new()]);
        SimEnv {
            heap: self,
            id,
            _not_send: PhantomData,
        }
    }

    /// Number of currently attached environments.
    pub fn attached_envs(&self) -> usize {
        self.frames.len()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Collection
    // ═══════════════════════════════════════════════════════════════════

    /// Run a full stop-the-world collection.
    ///
    /// Roots are every local in every attached environment plus every
    /// strong durable reference. Returns the number of objects freed.
    pub fn collect(&self) -> usize {
        let _guard = self.safepoint.write();

        let mut marked: HashSet<u32> = HashSet::new();
        for frames in self.frames.iter() {
            marked.extend(frames.value().iter().flatten().copied());
        }
        for entry in self.refs.iter() {
            if entry.kind == RefKind::Strong {
                marked.insert(entry.target);
            }
        }

        let before = self.objects.len();
        self.objects.retain(|id, _| marked.contains(id));
        self.collections.fetch_add(1, Ordering::Relaxed);

        let freed = before - self.objects.len();
        tracing::debug!(freed, live = self.objects.len(), "sim collection finished");
        freed
    }

    /// Number of collections run so far.
    pub fn collections(&self) -> u64 {
        self.collections.load(Ordering::Relaxed)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Inspection
    // ═══════════════════════════════════════════════════════════════════

    /// Number of objects not yet collected.
    pub fn live_objects(&self) -> usize {
        self.objects.len()
    }

    /// Number of strong durable references in the table.
    pub fn global_ref_count(&self) -> usize {
        self.count_refs(RefKind::Strong)
    }

    /// Number of weak durable references in the table.
    pub fn weak_ref_count(&self) -> usize {
        self.count_refs(RefKind::Weak)
    }

    fn count_refs(&self, kind: RefKind) -> usize {
        self.refs.iter().filter(|entry| entry.kind == kind).count()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Table primitives (callers hold the safepoint shared)
    // ═══════════════════════════════════════════════════════════════════

    fn insert_ref(&self, kind: RefKind, target: u32) -> i64 {
        let reserved = self
            .ref_slots
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                match self.ref_capacity {
                    Some(max) if used >= max => None,
                    _ => Some(used + 1),
                }
            });
        if reserved.is_err() {
            return 0;
        }
        let raw = self.next_ref.fetch_add(1, Ordering::Relaxed);
        self.refs.insert(raw, RefEntry { kind, target });
        raw
    }

    fn remove_ref(&self, raw: i64, kind: RefKind) {
        let removed = self.refs.remove(&raw);
        if removed.is_some() {
            self.ref_slots.fetch_sub(1, Ordering::AcqRel);
        }
        match removed {
            Some((_, entry)) if entry.kind == kind => {}
            Some((_, entry)) => panic!(
                "sim: {} reference {raw:#x} deleted as {kind}",
                entry.kind
            ),
            None => panic!("sim: use of released or foreign reference {raw:#x}"),
        }
    }

    fn lookup_ref(&self, raw: i64) -> RefEntry {
        match self.refs.get(&raw) {
            Some(entry) => *entry,
            None => panic!("sim: use of released or foreign reference {raw:#x}"),
        }
    }

    fn is_live(&self, id: u32) -> bool {
        self.objects.contains_key(&id)
    }
}
