//! Core types for Aquifer.
//!
//! This crate provides the foundational data model shared by the mapping
//! layer and the hydration engine:
//!
//! - `Value` for dynamically-typed column values
//! - `Row` / `ColumnList` for flat result-set rows
//! - `FieldType` / `EnumType` for semantic field types
//! - the error taxonomy (`MappingError`, `HydrationError`, `TypeError`)

pub mod error;
pub mod row;
pub mod types;
pub mod value;

pub use error::{
    Error, HydrationError, HydrationErrorKind, MappingError, MappingErrorKind, Result,
    SourceError, TypeError,
};
pub use row::{ColumnList, FromValue, Row};
pub use types::{EnumType, FieldType};
pub use value::{Value, ValueKey, hash_values};
