//! In-memory entity representation.
//!
//! Hydrated entities are dynamically-shaped records behind shared handles.
//! Sharing matters: when several rows (or several aliases) resolve to the
//! same identity, they must observe the same instance, and callers can
//! verify that with `Arc::ptr_eq`.

use aquifer_core::{Value, ValueKey};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Shared handle to a hydrated entity.
pub type EntityRef = Arc<RwLock<EntityData>>;

/// The state of one hydrated entity instance.
#[derive(Debug, Default)]
pub struct EntityData {
    /// Concrete entity type (post discriminator resolution).
    pub entity_type: String,
    /// Mapped field values, coerced to their semantic types.
    pub fields: HashMap<String, Value>,
    /// Association slots keyed by relation name.
    pub associations: HashMap<String, AssociationValue>,
    /// True for uninitialized placeholders created from a foreign key.
    pub proxy: bool,
}

impl EntityData {
    /// Create an empty entity of a concrete type.
    #[must_use]
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            ..Self::default()
        }
    }

    /// Wrap into a shared handle.
    #[must_use]
    pub fn into_ref(self) -> EntityRef {
        Arc::new(RwLock::new(self))
    }

    /// Read a field value.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Read an association slot.
    #[must_use]
    pub fn association(&self, relation: &str) -> Option<&AssociationValue> {
        self.associations.get(relation)
    }
}

/// The value held in an association slot.
#[derive(Debug)]
pub enum AssociationValue {
    /// To-one target; `None` is an explicit absent target.
    One(Option<EntityRef>),
    /// To-many collection.
    Many(Collection),
}

impl AssociationValue {
    /// The to-one target, if this slot holds one.
    #[must_use]
    pub fn as_one(&self) -> Option<&EntityRef> {
        match self {
            AssociationValue::One(target) => target.as_ref(),
            AssociationValue::Many(_) => None,
        }
    }

    /// The collection, if this slot holds one.
    #[must_use]
    pub fn as_many(&self) -> Option<&Collection> {
        match self {
            AssociationValue::Many(collection) => Some(collection),
            AssociationValue::One(_) => None,
        }
    }
}

/// A hydrated to-many collection.
///
/// Ordered collections preserve row order; keyed collections are built when
/// the shape configures an index-by field for the child alias. Insertion
/// order is preserved either way.
#[derive(Debug)]
pub struct Collection {
    items: CollectionItems,
    complete: bool,
}

#[derive(Debug)]
enum CollectionItems {
    Ordered(Vec<EntityRef>),
    Keyed(IndexMap<ValueKey, EntityRef>),
}

impl Collection {
    /// Create an empty ordered collection.
    #[must_use]
    pub fn ordered() -> Self {
        Self {
            items: CollectionItems::Ordered(Vec::new()),
            complete: false,
        }
    }

    /// Create an empty keyed collection.
    #[must_use]
    pub fn keyed() -> Self {
        Self {
            items: CollectionItems::Keyed(IndexMap::new()),
            complete: false,
        }
    }

    /// Append an entity to an ordered collection.
    ///
    /// No-op on a keyed collection; keyed placement needs a key.
    pub fn push(&mut self, entity: EntityRef) {
        if let CollectionItems::Ordered(items) = &mut self.items {
            items.push(entity);
        }
    }

    /// Place an entity under a key. The first placement wins the position;
    /// a later placement under the same key replaces the value.
    pub fn insert_keyed(&mut self, key: ValueKey, entity: EntityRef) {
        if let CollectionItems::Keyed(items) = &mut self.items {
            items.insert(key, entity);
        }
    }

    /// Number of entities held.
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.items {
            CollectionItems::Ordered(items) => items.len(),
            CollectionItems::Keyed(items) => items.len(),
        }
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entities in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &EntityRef> {
        match &self.items {
            CollectionItems::Ordered(items) => ItemIter::Ordered(items.iter()),
            CollectionItems::Keyed(items) => ItemIter::Keyed(items.values()),
        }
    }

    /// Entity at a position, in insertion order.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&EntityRef> {
        match &self.items {
            CollectionItems::Ordered(items) => items.get(index),
            CollectionItems::Keyed(items) => items.get_index(index).map(|(_, v)| v),
        }
    }

    /// Entity under a key, for keyed collections.
    #[must_use]
    pub fn get_keyed(&self, key: &ValueKey) -> Option<&EntityRef> {
        match &self.items {
            CollectionItems::Keyed(items) => items.get(key),
            CollectionItems::Ordered(_) => None,
        }
    }

    /// Whether a keyed collection holds this key.
    #[must_use]
    pub fn contains_key(&self, key: &ValueKey) -> bool {
        matches!(&self.items, CollectionItems::Keyed(items) if items.contains_key(key))
    }

    /// Whether an eager pass saw every row for this collection.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub(crate) fn mark_complete(&mut self) {
        self.complete = true;
    }
}

enum ItemIter<'a> {
    Ordered(std::slice::Iter<'a, EntityRef>),
    Keyed(indexmap::map::Values<'a, ValueKey, EntityRef>),
}

impl<'a> Iterator for ItemIter<'a> {
    type Item = &'a EntityRef;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            ItemIter::Ordered(iter) => iter.next(),
            ItemIter::Keyed(iter) => iter.next(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordered_collection_preserves_order() {
        let mut collection = Collection::ordered();
        let a = EntityData::new("Phone").into_ref();
        let b = EntityData::new("Phone").into_ref();
        collection.push(a.clone());
        collection.push(b.clone());

        assert_eq!(collection.len(), 2);
        assert!(Arc::ptr_eq(collection.get(0).unwrap(), &a));
        assert!(Arc::ptr_eq(collection.get(1).unwrap(), &b));
    }

    #[test]
    fn test_keyed_collection_lookup() {
        let mut collection = Collection::keyed();
        let a = EntityData::new("Phone").into_ref();
        let key = ValueKey::from(Value::Text("home".into()));
        collection.insert_keyed(key.clone(), a.clone());

        assert!(collection.contains_key(&key));
        assert!(Arc::ptr_eq(collection.get_keyed(&key).unwrap(), &a));
    }

    #[test]
    fn test_keyed_replace_keeps_position() {
        let mut collection = Collection::keyed();
        let first = EntityData::new("Article").into_ref();
        let second = EntityData::new("Article").into_ref();
        let other = EntityData::new("Article").into_ref();

        collection.insert_keyed(ValueKey::from(Value::Int(1)), first);
        collection.insert_keyed(ValueKey::from(Value::Int(2)), other);
        collection.insert_keyed(ValueKey::from(Value::Int(1)), second.clone());

        assert_eq!(collection.len(), 2);
        assert!(Arc::ptr_eq(collection.get(0).unwrap(), &second));
    }

    #[test]
    fn test_association_slot_accessors() {
        let target = EntityData::new("Address").into_ref();
        let one = AssociationValue::One(Some(target.clone()));
        assert!(Arc::ptr_eq(one.as_one().unwrap(), &target));
        assert!(one.as_many().is_none());

        let many = AssociationValue::Many(Collection::ordered());
        assert!(many.as_one().is_none());
        assert!(many.as_many().unwrap().is_empty());
    }
}
