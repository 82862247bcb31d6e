//! Result-shape descriptors.
//!
//! A `ResultSetMapping` describes how the columns of a flat result set map
//! onto entity aliases, scalar projections and internal meta columns. It is
//! built once per query through `ResultSetMappingBuilder`, validated at
//! `build()` time, and consumed read-only by the hydration driver.

use aquifer_core::{EnumType, FieldType, MappingError, Result};
use std::collections::HashMap;

/// One declared entity result (a root or a joined child).
#[derive(Debug, Clone)]
pub struct EntityResult {
    /// Alias the query assigned to this entity.
    pub alias: String,
    /// The mapped entity type.
    pub entity: String,
    /// `(parent_alias, relation)` for joined results; `None` for roots.
    pub parent: Option<(String, String)>,
    /// Explicit output label for aliased root results.
    pub result_name: Option<String>,
}

impl EntityResult {
    /// Check whether this result is a root of the shape.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

#[derive(Debug, Clone)]
struct FieldResult {
    alias: String,
    column: String,
    field: String,
    declared_on: Option<String>,
}

/// A scalar projection column.
#[derive(Debug, Clone)]
pub struct ScalarResult {
    /// Result-set column carrying the value.
    pub column: String,
    /// Output name in the result record.
    pub name: String,
    /// Semantic type the raw value is coerced to.
    pub ty: FieldType,
}

/// A meta column (foreign key or discriminator), internal to hydration.
#[derive(Debug, Clone)]
pub struct MetaResult {
    /// Entity alias the column belongs to.
    pub alias: String,
    /// Result-set column carrying the value.
    pub column: String,
    /// Field name on the entity side.
    pub field: String,
    /// Semantic type of the value.
    pub ty: FieldType,
}

/// The role a result-set column plays during hydration.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnRole<'a> {
    /// A mapped entity field.
    Field {
        alias: &'a str,
        field: &'a str,
        declared_on: Option<&'a str>,
    },
    /// A scalar projection.
    Scalar { name: &'a str, ty: &'a FieldType },
    /// A meta column; never surfaced in results.
    Meta {
        alias: &'a str,
        field: &'a str,
        ty: &'a FieldType,
        is_discriminator: bool,
    },
    /// Not declared in the shape; skipped without error.
    Unmapped,
}

/// Builder for [`ResultSetMapping`].
#[derive(Debug, Default)]
pub struct ResultSetMappingBuilder {
    entity_results: Vec<EntityResult>,
    field_results: Vec<FieldResult>,
    scalar_results: Vec<ScalarResult>,
    meta_results: Vec<MetaResult>,
    discriminator_columns: HashMap<String, String>,
    index_by: HashMap<String, String>,
    scalar_index_by: Option<String>,
    enum_overrides: HashMap<String, EnumType>,
}

impl ResultSetMappingBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a root entity result.
    pub fn add_entity_result(
        &mut self,
        entity: impl Into<String>,
        alias: impl Into<String>,
    ) -> &mut Self {
        self.entity_results.push(EntityResult {
            alias: alias.into(),
            entity: entity.into(),
            parent: None,
            result_name: None,
        });
        self
    }

    /// Declare a root entity result with an explicit output label.
    pub fn add_aliased_entity_result(
        &mut self,
        entity: impl Into<String>,
        alias: impl Into<String>,
        result_name: impl Into<String>,
    ) -> &mut Self {
        self.entity_results.push(EntityResult {
            alias: alias.into(),
            entity: entity.into(),
            parent: None,
            result_name: Some(result_name.into()),
        });
        self
    }

    /// Declare an entity joined to a previously declared alias.
    pub fn add_joined_entity_result(
        &mut self,
        entity: impl Into<String>,
        alias: impl Into<String>,
        parent_alias: impl Into<String>,
        relation: impl Into<String>,
    ) -> &mut Self {
        self.entity_results.push(EntityResult {
            alias: alias.into(),
            entity: entity.into(),
            parent: Some((parent_alias.into(), relation.into())),
            result_name: None,
        });
        self
    }

    /// Map a column to an entity field.
    pub fn add_field_result(
        &mut self,
        alias: impl Into<String>,
        column: impl Into<String>,
        field: impl Into<String>,
    ) -> &mut Self {
        self.field_results.push(FieldResult {
            alias: alias.into(),
            column: column.into(),
            field: field.into(),
            declared_on: None,
        });
        self
    }

    /// Map a column to a field declared on a specific subtype.
    ///
    /// Under joined-table inheritance a column may only apply to rows whose
    /// concrete type is (or descends from) the declaring subtype.
    pub fn add_inherited_field_result(
        &mut self,
        alias: impl Into<String>,
        column: impl Into<String>,
        field: impl Into<String>,
        declared_on: impl Into<String>,
    ) -> &mut Self {
        self.field_results.push(FieldResult {
            alias: alias.into(),
            column: column.into(),
            field: field.into(),
            declared_on: Some(declared_on.into()),
        });
        self
    }

    /// Declare a scalar projection.
    pub fn add_scalar_result(
        &mut self,
        column: impl Into<String>,
        name: impl Into<String>,
        ty: FieldType,
    ) -> &mut Self {
        self.scalar_results.push(ScalarResult {
            column: column.into(),
            name: name.into(),
            ty,
        });
        self
    }

    /// Declare a meta column (foreign key or discriminator value).
    pub fn add_meta_result(
        &mut self,
        alias: impl Into<String>,
        column: impl Into<String>,
        field: impl Into<String>,
        ty: FieldType,
    ) -> &mut Self {
        self.meta_results.push(MetaResult {
            alias: alias.into(),
            column: column.into(),
            field: field.into(),
            ty,
        });
        self
    }

    /// Name the column carrying the discriminator value for an alias.
    pub fn set_discriminator_column(
        &mut self,
        alias: impl Into<String>,
        column: impl Into<String>,
    ) -> &mut Self {
        self.discriminator_columns.insert(alias.into(), column.into());
        self
    }

    /// Key the collection (or root set) for an alias by an entity field.
    pub fn add_index_by(
        &mut self,
        alias: impl Into<String>,
        field: impl Into<String>,
    ) -> &mut Self {
        self.index_by.insert(alias.into(), field.into());
        self
    }

    /// Key the top-level result set by a scalar column.
    pub fn add_index_by_scalar(&mut self, column: impl Into<String>) -> &mut Self {
        self.scalar_index_by = Some(column.into());
        self
    }

    /// Override the enum type used when coercing a column.
    pub fn add_enum_result(&mut self, column: impl Into<String>, ty: EnumType) -> &mut Self {
        self.enum_overrides.insert(column.into(), ty);
        self
    }

    /// Validate and freeze the shape.
    pub fn build(self) -> Result<ResultSetMapping> {
        let mut declared: Vec<&str> = Vec::new();
        for result in &self.entity_results {
            if let Some((parent, _)) = &result.parent {
                if !declared.contains(&parent.as_str()) {
                    return Err(MappingError::unknown_alias(parent).into());
                }
            }
            declared.push(&result.alias);
        }

        for field in &self.field_results {
            if !declared.contains(&field.alias.as_str()) {
                return Err(MappingError::unknown_alias(&field.alias).into());
            }
        }
        for meta in &self.meta_results {
            if !declared.contains(&meta.alias.as_str()) {
                return Err(MappingError::unknown_alias(&meta.alias).into());
            }
        }
        for alias in self.discriminator_columns.keys().chain(self.index_by.keys()) {
            if !declared.contains(&alias.as_str()) {
                return Err(MappingError::unknown_alias(alias).into());
            }
        }

        // One output name per record slot.
        let mut seen_names: Vec<&str> = Vec::new();
        for scalar in &self.scalar_results {
            if seen_names.contains(&scalar.name.as_str()) {
                return Err(MappingError::duplicate_field_name(&scalar.name).into());
            }
            seen_names.push(&scalar.name);
        }
        let mut seen_fields: Vec<(&str, &str)> = Vec::new();
        for field in &self.field_results {
            let key = (field.alias.as_str(), field.field.as_str());
            if seen_fields.contains(&key) {
                return Err(MappingError::duplicate_field_name(&field.field).into());
            }
            seen_fields.push(key);
        }

        let mut columns = HashMap::new();
        for (i, field) in self.field_results.iter().enumerate() {
            columns.insert(field.column.clone(), ColumnSlot::Field(i));
        }
        for (i, scalar) in self.scalar_results.iter().enumerate() {
            columns.insert(scalar.column.clone(), ColumnSlot::Scalar(i));
        }
        for (i, meta) in self.meta_results.iter().enumerate() {
            columns.insert(meta.column.clone(), ColumnSlot::Meta(i));
        }

        Ok(ResultSetMapping {
            entity_results: self.entity_results,
            field_results: self.field_results,
            scalar_results: self.scalar_results,
            meta_results: self.meta_results,
            discriminator_columns: self.discriminator_columns,
            index_by: self.index_by,
            scalar_index_by: self.scalar_index_by,
            enum_overrides: self.enum_overrides,
            columns,
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum ColumnSlot {
    Field(usize),
    Scalar(usize),
    Meta(usize),
}

/// Immutable result-shape descriptor produced by [`ResultSetMappingBuilder`].
#[derive(Debug)]
pub struct ResultSetMapping {
    entity_results: Vec<EntityResult>,
    field_results: Vec<FieldResult>,
    scalar_results: Vec<ScalarResult>,
    meta_results: Vec<MetaResult>,
    discriminator_columns: HashMap<String, String>,
    index_by: HashMap<String, String>,
    scalar_index_by: Option<String>,
    enum_overrides: HashMap<String, EnumType>,
    columns: HashMap<String, ColumnSlot>,
}

impl ResultSetMapping {
    /// Resolve the role a result-set column plays in this shape.
    #[must_use]
    pub fn resolve_column(&self, column: &str) -> ColumnRole<'_> {
        match self.columns.get(column) {
            Some(ColumnSlot::Field(i)) => {
                let f = &self.field_results[*i];
                ColumnRole::Field {
                    alias: &f.alias,
                    field: &f.field,
                    declared_on: f.declared_on.as_deref(),
                }
            }
            Some(ColumnSlot::Scalar(i)) => {
                let s = &self.scalar_results[*i];
                ColumnRole::Scalar {
                    name: &s.name,
                    ty: &s.ty,
                }
            }
            Some(ColumnSlot::Meta(i)) => {
                let m = &self.meta_results[*i];
                let is_discriminator = self
                    .discriminator_columns
                    .get(&m.alias)
                    .is_some_and(|c| c == &m.column);
                ColumnRole::Meta {
                    alias: &m.alias,
                    field: &m.field,
                    ty: &m.ty,
                    is_discriminator,
                }
            }
            None => ColumnRole::Unmapped,
        }
    }

    /// Entity results in dependency order: parents before their children.
    ///
    /// Declaration order already satisfies this because `build()` rejects a
    /// joined result whose parent is not yet declared.
    #[must_use]
    pub fn entity_results(&self) -> &[EntityResult] {
        &self.entity_results
    }

    /// The root entity results, in declaration order.
    pub fn root_results(&self) -> impl Iterator<Item = &EntityResult> {
        self.entity_results.iter().filter(|r| r.is_root())
    }

    /// Look up a declared entity result by alias.
    #[must_use]
    pub fn entity_result(&self, alias: &str) -> Option<&EntityResult> {
        self.entity_results.iter().find(|r| r.alias == alias)
    }

    /// Field mappings for one alias: `(column, field, declared_on)`.
    pub fn fields_for<'a>(
        &'a self,
        alias: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a str, Option<&'a str>)> {
        self.field_results
            .iter()
            .filter(move |f| f.alias == alias)
            .map(|f| (f.column.as_str(), f.field.as_str(), f.declared_on.as_deref()))
    }

    /// Meta mappings for one alias.
    pub fn metas_for<'a>(&'a self, alias: &'a str) -> impl Iterator<Item = &'a MetaResult> {
        self.meta_results.iter().filter(move |m| m.alias == alias)
    }

    /// Scalar projections, in declaration order.
    #[must_use]
    pub fn scalars(&self) -> &[ScalarResult] {
        &self.scalar_results
    }

    /// The discriminator column configured for an alias, if any.
    #[must_use]
    pub fn discriminator_column(&self, alias: &str) -> Option<&str> {
        self.discriminator_columns.get(alias).map(String::as_str)
    }

    /// The index-by field configured for an alias, if any.
    #[must_use]
    pub fn index_by(&self, alias: &str) -> Option<&str> {
        self.index_by.get(alias).map(String::as_str)
    }

    /// The scalar column keying the top-level result set, if any.
    #[must_use]
    pub fn scalar_index_by(&self) -> Option<&str> {
        self.scalar_index_by.as_deref()
    }

    /// The enum override for a column, if any.
    #[must_use]
    pub fn enum_override(&self, column: &str) -> Option<&EnumType> {
        self.enum_overrides.get(column)
    }

    /// Whether any field results are declared for an alias.
    #[must_use]
    pub fn has_fields(&self, alias: &str) -> bool {
        self.field_results.iter().any(|f| f.alias == alias)
    }

    /// Whether results are mixed: scalar projections present, or any root
    /// carries an explicit output label. Mixed shapes hydrate to records
    /// instead of bare entities.
    #[must_use]
    pub fn is_mixed(&self) -> bool {
        !self.scalar_results.is_empty()
            || self
                .entity_results
                .iter()
                .any(|r| r.is_root() && r.result_name.is_some())
    }
}
