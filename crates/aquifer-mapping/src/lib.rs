//! Entity metadata and result-shape descriptors for Aquifer.
//!
//! The mapping layer is the static half of hydration: callers register
//! [`EntityMetadata`] once per entity type, then describe each query's
//! result shape with a [`ResultSetMappingBuilder`]. The hydration engine
//! consumes both read-only.

pub mod metadata;
pub mod rsm;

pub use metadata::{
    AssociationInfo, AssociationKind, DiscriminatorMap, EntityMetadata, FetchMode,
    MetadataRegistry,
};
pub use rsm::{
    ColumnRole, EntityResult, MetaResult, ResultSetMapping, ResultSetMappingBuilder, ScalarResult,
};
