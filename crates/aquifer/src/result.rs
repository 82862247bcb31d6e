//! Hydrated result shapes.
//!
//! A pass produces either bare entities (single unaliased root, no scalar
//! projections) or records that mix entities and scalars under positional
//! or named labels. The top-level set is ordered by default and keyed when
//! the shape configures a root or scalar index-by.

use crate::entity::EntityRef;
use aquifer_core::{Value, ValueKey};
use indexmap::IndexMap;
use std::fmt;

/// Label of one slot in a result record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResultLabel {
    /// Positional slot, used for unaliased entity results in mixed shapes.
    Position(usize),
    /// Named slot, from a result alias or a scalar output name.
    Name(String),
}

impl fmt::Display for ResultLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultLabel::Position(n) => write!(f, "{n}"),
            ResultLabel::Name(s) => write!(f, "{s}"),
        }
    }
}

/// One slot of a result record.
#[derive(Debug)]
pub enum ResultItem {
    /// An entity root; `None` when the root identity was entirely NULL.
    Entity(Option<EntityRef>),
    /// A scalar projection value.
    Scalar(Value),
}

impl ResultItem {
    /// The entity, if this slot holds a present one.
    #[must_use]
    pub fn as_entity(&self) -> Option<&EntityRef> {
        match self {
            ResultItem::Entity(e) => e.as_ref(),
            ResultItem::Scalar(_) => None,
        }
    }

    /// The scalar value, if this slot holds one.
    #[must_use]
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            ResultItem::Scalar(v) => Some(v),
            ResultItem::Entity(_) => None,
        }
    }
}

/// A record mixing entity and scalar slots, in label insertion order.
#[derive(Debug, Default)]
pub struct ResultRecord {
    items: IndexMap<ResultLabel, ResultItem>,
}

impl ResultRecord {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, label: ResultLabel, item: ResultItem) {
        self.items.insert(label, item);
    }

    /// Look up a slot by label.
    #[must_use]
    pub fn get(&self, label: &ResultLabel) -> Option<&ResultItem> {
        self.items.get(label)
    }

    /// Look up a named slot.
    #[must_use]
    pub fn get_named(&self, name: &str) -> Option<&ResultItem> {
        self.items.get(&ResultLabel::Name(name.to_string()))
    }

    /// Look up a positional slot.
    #[must_use]
    pub fn get_position(&self, position: usize) -> Option<&ResultItem> {
        self.items.get(&ResultLabel::Position(position))
    }

    /// Number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the record has no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Slots in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&ResultLabel, &ResultItem)> {
        self.items.iter()
    }
}

/// One top-level hydrated result.
#[derive(Debug)]
pub enum HydratedRow {
    /// A bare entity, for single unaliased non-mixed roots.
    Entity(Option<EntityRef>),
    /// A record, for mixed or aliased shapes.
    Record(ResultRecord),
}

impl HydratedRow {
    /// The bare entity, if present.
    #[must_use]
    pub fn as_entity(&self) -> Option<&EntityRef> {
        match self {
            HydratedRow::Entity(e) => e.as_ref(),
            HydratedRow::Record(_) => None,
        }
    }

    /// The record, if this result is one.
    #[must_use]
    pub fn as_record(&self) -> Option<&ResultRecord> {
        match self {
            HydratedRow::Record(r) => Some(r),
            HydratedRow::Entity(_) => None,
        }
    }
}

/// The complete output of an eager pass.
#[derive(Debug)]
pub enum HydratedSet {
    /// Results in first-seen root order.
    Ordered(Vec<HydratedRow>),
    /// Results keyed by a root field or scalar column.
    Keyed(IndexMap<ValueKey, HydratedRow>),
}

impl HydratedSet {
    /// Number of top-level results.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            HydratedSet::Ordered(rows) => rows.len(),
            HydratedSet::Keyed(rows) => rows.len(),
        }
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Result at a position, in insertion order.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&HydratedRow> {
        match self {
            HydratedSet::Ordered(rows) => rows.get(index),
            HydratedSet::Keyed(rows) => rows.get_index(index).map(|(_, v)| v),
        }
    }

    /// Result under a key, for keyed sets.
    #[must_use]
    pub fn get_keyed(&self, key: &ValueKey) -> Option<&HydratedRow> {
        match self {
            HydratedSet::Keyed(rows) => rows.get(key),
            HydratedSet::Ordered(_) => None,
        }
    }

    /// The keys of a keyed set, in insertion order.
    #[must_use]
    pub fn keys(&self) -> Vec<&ValueKey> {
        match self {
            HydratedSet::Keyed(rows) => rows.keys().collect(),
            HydratedSet::Ordered(_) => Vec::new(),
        }
    }

    /// Results in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &HydratedRow> {
        match self {
            HydratedSet::Ordered(rows) => SetIter::Ordered(rows.iter()),
            HydratedSet::Keyed(rows) => SetIter::Keyed(rows.values()),
        }
    }
}

enum SetIter<'a> {
    Ordered(std::slice::Iter<'a, HydratedRow>),
    Keyed(indexmap::map::Values<'a, ValueKey, HydratedRow>),
}

impl<'a> Iterator for SetIter<'a> {
    type Item = &'a HydratedRow;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            SetIter::Ordered(iter) => iter.next(),
            SetIter::Keyed(iter) => iter.next(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityData;

    #[test]
    fn test_record_slots() {
        let mut record = ResultRecord::new();
        record.insert(
            ResultLabel::Position(0),
            ResultItem::Entity(Some(EntityData::new("CmsUser").into_ref())),
        );
        record.insert(
            ResultLabel::Name("nameUpper".into()),
            ResultItem::Scalar(Value::Text("ROMANB".into())),
        );

        assert_eq!(record.len(), 2);
        assert!(record.get_position(0).unwrap().as_entity().is_some());
        assert_eq!(
            record.get_named("nameUpper").unwrap().as_scalar(),
            Some(&Value::Text("ROMANB".into()))
        );
        assert!(record.get_named("missing").is_none());
    }

    #[test]
    fn test_keyed_set_access() {
        let mut rows = IndexMap::new();
        rows.insert(
            ValueKey::from(Value::Int(1)),
            HydratedRow::Entity(Some(EntityData::new("CmsUser").into_ref())),
        );
        let set = HydratedSet::Keyed(rows);

        assert_eq!(set.len(), 1);
        assert!(set.get_keyed(&ValueKey::from(Value::Int(1))).is_some());
        assert!(set.get_keyed(&ValueKey::from(Value::Int(2))).is_none());
        assert!(set.get(0).is_some());
    }
}
