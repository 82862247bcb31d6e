//! Streaming row-to-object-graph hydration for SQL result sets.
//!
//! Aquifer turns the flat, duplicated rows a JOIN query produces back into
//! a deduplicated object graph. Callers describe entities once in a
//! [`MetadataRegistry`], describe each query's shape with a
//! [`ResultSetMappingBuilder`], then run rows through a [`Hydrator`]:
//!
//! ```
//! use aquifer::{
//!     ArrayRowSource, EntityMetadata, FieldType, Hydrator, MetadataRegistry,
//!     ResultSetMappingBuilder, Value,
//! };
//!
//! let mut registry = MetadataRegistry::new();
//! registry.register(
//!     EntityMetadata::new("CmsUser")
//!         .id_field("id", FieldType::Int)
//!         .field("name", FieldType::Text),
//! );
//!
//! let mut builder = ResultSetMappingBuilder::new();
//! builder
//!     .add_entity_result("CmsUser", "u")
//!     .add_field_result("u", "u__id", "id")
//!     .add_field_result("u", "u__name", "name");
//! let rsm = builder.build().unwrap();
//!
//! let source = ArrayRowSource::new(
//!     &["u__id", "u__name"],
//!     vec![vec![Value::Int(1), Value::Text("romanb".into())]],
//! );
//! let result = Hydrator::new(&registry).hydrate_all(source, &rsm).unwrap();
//! assert_eq!(result.len(), 1);
//! ```

pub mod coerce;
mod context;
mod discriminator;
pub mod entity;
pub mod hydrator;
pub mod proxy;
pub mod result;
pub mod source;

pub use aquifer_core::{
    ColumnList, EnumType, Error, FieldType, FromValue, HydrationError, HydrationErrorKind,
    MappingError, MappingErrorKind, Result, Row, SourceError, TypeError, Value, ValueKey,
};
pub use aquifer_mapping::{
    AssociationInfo, AssociationKind, ColumnRole, DiscriminatorMap, EntityMetadata, EntityResult,
    FetchMode, MetadataRegistry, ResultSetMapping, ResultSetMappingBuilder,
};

pub use coerce::coerce;
pub use entity::{AssociationValue, Collection, EntityData, EntityRef};
pub use hydrator::{Hydrator, ResultIterator};
pub use proxy::{ProxyFactory, UninitializedProxyFactory};
pub use result::{HydratedRow, HydratedSet, ResultItem, ResultLabel, ResultRecord};
pub use source::{ArrayRowSource, RowSource};
