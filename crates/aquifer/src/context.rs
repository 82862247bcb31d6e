//! Per-pass hydration state.
//!
//! Every `hydrate_all` / `iterate` call owns one `HydrationContext`. It
//! holds the identity map and the bookkeeping that makes collection
//! building idempotent across fan-out rows. Nothing survives the pass.

use crate::entity::{AssociationValue, EntityRef};
use aquifer_core::{Value, hash_values};
use std::collections::{HashMap, HashSet};

/// Outcome of probing an identifier tuple against the identity map.
pub(crate) enum Resolution {
    /// The identifier was entirely NULL; no entity exists for this row.
    Absent,
    /// An entity with this identity was already hydrated this pass.
    Existing(EntityRef, u64),
    /// No entity yet; the caller builds one and registers it.
    Vacant(u64),
}

#[derive(Default)]
pub(crate) struct HydrationContext {
    /// (alias, id-hash) -> shared instance.
    identity: HashMap<(String, u64), EntityRef>,
    /// (parent alias, parent hash, child alias, child hash) pairs already
    /// attached, so join fan-out never duplicates a collection entry.
    attached: HashSet<(String, u64, String, u64)>,
    /// (root alias, id-hash) -> position of the root's top-level result.
    slots: HashMap<(String, u64), usize>,
    /// Collections touched this pass, marked complete when the pass ends.
    collections: Vec<(EntityRef, String)>,
}

impl HydrationContext {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Probe an identifier tuple. `Vacant` hands back the hash so the
    /// caller can build the entity and [`register`](Self::register) it.
    pub(crate) fn probe_identity(&mut self, alias: &str, id_values: &[Value]) -> Resolution {
        if id_values.is_empty() || id_values.iter().all(Value::is_null) {
            return Resolution::Absent;
        }
        let hash = hash_values(id_values);
        match self.identity.get(&(alias.to_string(), hash)) {
            Some(existing) => Resolution::Existing(existing.clone(), hash),
            None => Resolution::Vacant(hash),
        }
    }

    pub(crate) fn register(&mut self, alias: &str, hash: u64, entity: EntityRef) {
        self.identity.insert((alias.to_string(), hash), entity);
    }

    /// Record a (parent, child) attachment; `true` if it is the first one.
    pub(crate) fn mark_attached(
        &mut self,
        parent_alias: &str,
        parent_hash: u64,
        child_alias: &str,
        child_hash: u64,
    ) -> bool {
        self.attached.insert((
            parent_alias.to_string(),
            parent_hash,
            child_alias.to_string(),
            child_hash,
        ))
    }

    /// The top-level slot already assigned to a root identity, if any.
    pub(crate) fn slot_for(&self, root_alias: &str, hash: u64) -> Option<usize> {
        self.slots.get(&(root_alias.to_string(), hash)).copied()
    }

    pub(crate) fn assign_slot(&mut self, root_alias: &str, hash: u64, slot: usize) {
        self.slots.insert((root_alias.to_string(), hash), slot);
    }

    /// Track a collection for end-of-pass completion marking.
    pub(crate) fn track_collection(&mut self, parent: EntityRef, relation: &str) {
        self.collections.push((parent, relation.to_string()));
    }

    /// Mark every tracked collection as fully loaded.
    ///
    /// Only the eager driver calls this; a lazy pass can be dropped before
    /// the source is exhausted.
    pub(crate) fn complete_collections(&mut self) {
        for (parent, relation) in self.collections.drain(..) {
            if let Ok(mut data) = parent.write() {
                if let Some(AssociationValue::Many(collection)) =
                    data.associations.get_mut(&relation)
                {
                    collection.mark_complete();
                }
            }
        }
    }
}
