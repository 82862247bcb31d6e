//! Entity metadata for hydration.
//!
//! Metadata is built by the caller (the query/metadata layer) and handed
//! to the hydrator read-only. It answers three questions per entity type:
//! which fields form the identifier, what semantic type each field has,
//! and (for polymorphic hierarchies) how discriminator values map to
//! concrete subtypes.

use aquifer_core::{FieldType, MappingError, Result};
use std::collections::HashMap;

/// The type of association between two entities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AssociationKind {
    /// One-to-one: `User` has one `Address`.
    OneToOne,
    /// Many-to-one: many `Product`s reference one `Shipping`.
    #[default]
    ManyToOne,
    /// One-to-many: one `User` has many `Phonenumber`s.
    OneToMany,
    /// Many-to-many: `User`s belong to many `Group`s.
    ManyToMany,
}

impl AssociationKind {
    /// Check whether this association holds a collection on the owning side.
    #[must_use]
    pub const fn is_to_many(&self) -> bool {
        matches!(self, AssociationKind::OneToMany | AssociationKind::ManyToMany)
    }
}

/// Fetch strategy for an association.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchMode {
    /// Loaded by the join that produced the rows.
    #[default]
    Eager,
    /// Deferred; a to-one target becomes a proxy built from its foreign key.
    Lazy,
}

/// An association declared on an entity.
#[derive(Debug, Clone)]
pub struct AssociationInfo {
    /// Relation name on the owning entity.
    pub name: String,
    /// Target entity type.
    pub target: String,
    /// The association kind.
    pub kind: AssociationKind,
    /// Fetch strategy.
    pub fetch: FetchMode,
    /// Meta field carrying the target's foreign key, for lazy to-one loads.
    pub fk_field: Option<String>,
}

impl AssociationInfo {
    /// Create a new association.
    #[must_use]
    pub fn new(name: impl Into<String>, target: impl Into<String>, kind: AssociationKind) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            kind,
            fetch: FetchMode::default(),
            fk_field: None,
        }
    }

    /// Set the fetch strategy.
    #[must_use]
    pub fn fetch(mut self, fetch: FetchMode) -> Self {
        self.fetch = fetch;
        self
    }

    /// Set the foreign key field used for lazy to-one loads.
    #[must_use]
    pub fn fk_field(mut self, field: impl Into<String>) -> Self {
        self.fk_field = Some(field.into());
        self
    }
}

/// A closed map from discriminator value to concrete entity type.
///
/// Declaration order is preserved so error messages list the valid values
/// the way the hierarchy declared them.
#[derive(Debug, Clone, Default)]
pub struct DiscriminatorMap {
    entries: Vec<(String, String)>,
}

impl DiscriminatorMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a discriminator value -> concrete type pair.
    #[must_use]
    pub fn case(mut self, value: impl Into<String>, entity: impl Into<String>) -> Self {
        self.entries.push((value.into(), entity.into()));
        self
    }

    /// Resolve a raw discriminator value to its concrete type.
    #[must_use]
    pub fn resolve(&self, value: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(v, _)| v == value)
            .map(|(_, e)| e.as_str())
    }

    /// The declared discriminator values, in declaration order.
    #[must_use]
    pub fn values(&self) -> Vec<&str> {
        self.entries.iter().map(|(v, _)| v.as_str()).collect()
    }
}

/// Static metadata for one entity type.
#[derive(Debug, Clone)]
pub struct EntityMetadata {
    name: String,
    id_fields: Vec<String>,
    fields: HashMap<String, FieldType>,
    associations: Vec<AssociationInfo>,
    discriminator: Option<DiscriminatorMap>,
    parent: Option<String>,
}

impl EntityMetadata {
    /// Create metadata for an entity type.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id_fields: Vec::new(),
            fields: HashMap::new(),
            associations: Vec::new(),
            discriminator: None,
            parent: None,
        }
    }

    /// Declare an identifier field (repeat for composite identifiers).
    #[must_use]
    pub fn id_field(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        let name = name.into();
        self.id_fields.push(name.clone());
        self.fields.insert(name, ty);
        self
    }

    /// Declare a regular mapped field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        self.fields.insert(name.into(), ty);
        self
    }

    /// Declare an association.
    #[must_use]
    pub fn association(mut self, info: AssociationInfo) -> Self {
        self.associations.push(info);
        self
    }

    /// Declare the discriminator map for a polymorphic hierarchy root.
    #[must_use]
    pub fn discriminator(mut self, map: DiscriminatorMap) -> Self {
        self.discriminator = Some(map);
        self
    }

    /// Declare the parent type in a hierarchy.
    #[must_use]
    pub fn parent(mut self, name: impl Into<String>) -> Self {
        self.parent = Some(name.into());
        self
    }

    /// The entity type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The identifier field names, in declaration order.
    #[must_use]
    pub fn id_fields(&self) -> &[String] {
        &self.id_fields
    }

    /// Look up the semantic type of a field.
    #[must_use]
    pub fn field_type(&self, name: &str) -> Option<&FieldType> {
        self.fields.get(name)
    }

    /// Look up an association declared directly on this entity.
    #[must_use]
    pub fn association_info(&self, relation: &str) -> Option<&AssociationInfo> {
        self.associations.iter().find(|a| a.name == relation)
    }

    /// All associations declared directly on this entity.
    #[must_use]
    pub fn associations(&self) -> &[AssociationInfo] {
        &self.associations
    }

    /// The discriminator map, if this entity roots a polymorphic hierarchy.
    #[must_use]
    pub fn discriminator_map(&self) -> Option<&DiscriminatorMap> {
        self.discriminator.as_ref()
    }

    /// The parent type name, if any.
    #[must_use]
    pub fn parent_name(&self) -> Option<&str> {
        self.parent.as_deref()
    }
}

/// Registry of entity metadata, keyed by type name.
///
/// This is the hydrator's metadata/identity resolver collaborator; it is
/// built once and shared read-only across hydration passes.
#[derive(Debug, Default)]
pub struct MetadataRegistry {
    entities: HashMap<String, EntityMetadata>,
}

impl MetadataRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register entity metadata, replacing any previous entry.
    pub fn register(&mut self, metadata: EntityMetadata) {
        self.entities.insert(metadata.name().to_string(), metadata);
    }

    /// Get metadata for an entity type.
    pub fn get(&self, name: &str) -> Result<&EntityMetadata> {
        self.entities
            .get(name)
            .ok_or_else(|| MappingError::unknown_entity(name).into())
    }

    /// Check whether `sub` is `ancestor` or descends from it.
    #[must_use]
    pub fn is_subtype_of(&self, sub: &str, ancestor: &str) -> bool {
        let mut current = Some(sub);
        while let Some(name) = current {
            if name == ancestor {
                return true;
            }
            current = self
                .entities
                .get(name)
                .and_then(EntityMetadata::parent_name);
        }
        false
    }

    /// Find an association on an entity, walking up the hierarchy.
    #[must_use]
    pub fn find_association(&self, entity: &str, relation: &str) -> Option<&AssociationInfo> {
        let mut current = Some(entity);
        while let Some(name) = current {
            let meta = self.entities.get(name)?;
            if let Some(info) = meta.association_info(relation) {
                return Some(info);
            }
            current = meta.parent_name();
        }
        None
    }

    /// Find the type of a field on an entity, walking up the hierarchy.
    #[must_use]
    pub fn find_field_type(&self, entity: &str, field: &str) -> Option<&FieldType> {
        let mut current = Some(entity);
        while let Some(name) = current {
            let meta = self.entities.get(name)?;
            if let Some(ty) = meta.field_type(field) {
                return Some(ty);
            }
            current = meta.parent_name();
        }
        None
    }

    /// Find the lazy to-one association carried by a foreign key field,
    /// walking up the hierarchy.
    #[must_use]
    pub fn find_association_by_fk(&self, entity: &str, fk_field: &str) -> Option<&AssociationInfo> {
        let mut current = Some(entity);
        while let Some(name) = current {
            let meta = self.entities.get(name)?;
            if let Some(info) = meta.associations().iter().find(|a| {
                a.fk_field.as_deref() == Some(fk_field)
                    && a.fetch == FetchMode::Lazy
                    && !a.kind.is_to_many()
            }) {
                return Some(info);
            }
            current = meta.parent_name();
        }
        None
    }
}
