// ── Generic revisioned entity collection ──
//
// Concurrent storage with O(1) lookups, push-based change notification
// via `watch` channels, and per-entity revision tracking so a stale poll
// result cannot clobber a newer local write.

use std::cmp::Ordering;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use dashmap::DashMap;
use tokio::sync::watch;

/// Entry metadata: the entity plus the local revision it was written at.
struct Entry<T> {
    value: Arc<T>,
    rev: u64,
}

/// A reactive collection for a single entity type.
///
/// Every *local* write (mutation, push event, static-mode change) is
/// stamped with a fresh revision from a monotonic counter. Bulk refresh
/// results carry the counter value read when the poll was issued
/// (`baseline`); applying them skips any entity whose revision is newer
/// than that baseline, so "whichever arrives last" can no longer discard
/// a legitimate local edit.
pub(crate) struct EntityCollection<T: Send + Sync + 'static> {
    by_id: DashMap<String, Entry<T>>,

    /// Monotonic local revision counter.
    clock: AtomicU64,

    /// Snapshot ordering, so subscribers see a stable sequence.
    order: fn(&T, &T) -> Ordering,

    /// Full snapshot, rebuilt on mutation for efficient subscription.
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<T: Send + Sync + 'static> EntityCollection<T> {
    pub(crate) fn new(order: fn(&T, &T) -> Ordering) -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            by_id: DashMap::new(),
            clock: AtomicU64::new(0),
            order,
            snapshot,
        }
    }

    /// Current revision counter; record this before issuing a bulk read.
    pub(crate) fn baseline(&self) -> u64 {
        self.clock.load(AtomicOrdering::SeqCst)
    }

    fn next_rev(&self) -> u64 {
        self.clock.fetch_add(1, AtomicOrdering::SeqCst) + 1
    }

    // ── Local writes (fresh revision) ────────────────────────────────

    /// Insert or replace an entity. Returns `true` if the id was new.
    pub(crate) fn upsert(&self, id: String, entity: T) -> bool {
        let rev = self.next_rev();
        let is_new = self
            .by_id
            .insert(id, Entry {
                value: Arc::new(entity),
                rev,
            })
            .is_none();
        self.rebuild_snapshot();
        is_new
    }

    /// Replace an entity only if it is already present. Returns `true`
    /// if a replacement happened; an unknown id is dropped.
    pub(crate) fn replace(&self, id: &str, entity: T) -> bool {
        let rev = self.next_rev();
        let replaced = match self.by_id.get_mut(id) {
            Some(mut entry) => {
                *entry = Entry {
                    value: Arc::new(entity),
                    rev,
                };
                true
            }
            None => false,
        };
        if replaced {
            self.rebuild_snapshot();
        }
        replaced
    }

    /// Mutate an entity in place via a closure. Returns `true` if the
    /// id was present.
    pub(crate) fn mutate(&self, id: &str, f: impl FnOnce(&mut T)) -> bool
    where
        T: Clone,
    {
        let rev = self.next_rev();
        let mutated = match self.by_id.get_mut(id) {
            Some(mut entry) => {
                let mut value = (*entry.value).clone();
                f(&mut value);
                *entry = Entry {
                    value: Arc::new(value),
                    rev,
                };
                true
            }
            None => false,
        };
        if mutated {
            self.rebuild_snapshot();
        }
        mutated
    }

    /// Remove an entity by id. Returns the removed entity if it existed.
    pub(crate) fn remove(&self, id: &str) -> Option<Arc<T>> {
        let removed = self.by_id.remove(id).map(|(_, entry)| entry.value);
        if removed.is_some() {
            self.next_rev();
            self.rebuild_snapshot();
        }
        removed
    }

    /// Replace the entire contents unconditionally (static-mode load and
    /// the total-unavailability overwrite).
    pub(crate) fn replace_all(&self, items: impl IntoIterator<Item = (String, T)>) {
        self.by_id.clear();
        for (id, entity) in items {
            let rev = self.next_rev();
            self.by_id.insert(id, Entry {
                value: Arc::new(entity),
                rev,
            });
        }
        self.rebuild_snapshot();
    }

    // ── Refresh application (revision-guarded) ───────────────────────

    /// Apply a bulk read issued at `baseline`.
    ///
    /// Entities written locally after the baseline win over the incoming
    /// copy and survive even if the incoming set no longer lists them.
    /// Everything else is replaced wholesale.
    pub(crate) fn apply_refresh(
        &self,
        items: impl IntoIterator<Item = (String, T)>,
        baseline: u64,
    ) {
        let mut incoming_ids = std::collections::HashSet::new();

        for (id, entity) in items {
            incoming_ids.insert(id.clone());
            let newer_local = self.by_id.get(&id).is_some_and(|entry| entry.rev > baseline);
            if newer_local {
                continue;
            }
            self.by_id.insert(id, Entry {
                value: Arc::new(entity),
                rev: baseline,
            });
        }

        // Drop entities the remote no longer reports, unless a local
        // write landed after the poll was issued.
        self.by_id
            .retain(|id, entry| incoming_ids.contains(id) || entry.rev > baseline);

        self.rebuild_snapshot();
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub(crate) fn get(&self, id: &str) -> Option<Arc<T>> {
        self.by_id.get(id).map(|entry| Arc::clone(&entry.value))
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    #[allow(dead_code)]
    pub(crate) fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes via a `watch::Receiver`.
    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.snapshot.subscribe()
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Collect all values into an ordered snapshot vec and broadcast.
    fn rebuild_snapshot(&self) {
        let mut values: Vec<Arc<T>> = self
            .by_id
            .iter()
            .map(|entry| Arc::clone(&entry.value))
            .collect();
        values.sort_by(|a, b| (self.order)(a.as_ref(), b.as_ref()));
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }
}
