//! Error types for hydration.

use std::fmt;

/// The primary error type for all hydration operations.
#[derive(Debug)]
pub enum Error {
    /// Result-shape or metadata errors (construction-time or data mapping)
    Mapping(MappingError),
    /// Errors raised while reconstructing objects from rows
    Hydration(HydrationError),
    /// Type conversion errors
    Type(TypeError),
    /// Row source errors (I/O, driver failures)
    Source(SourceError),
    /// Custom error with message
    Custom(String),
}

/// A problem with the result-shape descriptor or entity metadata.
///
/// Configuration variants are raised when the descriptor is built, before
/// a single row is read; data variants (enum cases) abort the pass.
#[derive(Debug)]
pub struct MappingError {
    pub kind: MappingErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingErrorKind {
    /// Two result items share one output name
    DuplicateFieldName,
    /// A column or joined result references an undeclared alias
    UnknownAlias,
    /// An entity type is not registered in the metadata registry
    UnknownEntity,
    /// A relation is not declared on the parent entity (or its ancestors)
    UnknownAssociation,
    /// A raw value does not match any declared enum case
    EnumCaseNotListed,
}

impl MappingError {
    pub fn duplicate_field_name(name: &str) -> Self {
        Self {
            kind: MappingErrorKind::DuplicateFieldName,
            message: format!("field \"{name}\" is declared more than once in the result"),
        }
    }

    pub fn unknown_alias(alias: &str) -> Self {
        Self {
            kind: MappingErrorKind::UnknownAlias,
            message: format!("alias \"{alias}\" does not refer to a declared entity result"),
        }
    }

    pub fn unknown_entity(name: &str) -> Self {
        Self {
            kind: MappingErrorKind::UnknownEntity,
            message: format!("entity \"{name}\" is not registered"),
        }
    }

    pub fn unknown_association(entity: &str, relation: &str) -> Self {
        Self {
            kind: MappingErrorKind::UnknownAssociation,
            message: format!("association \"{relation}\" is not declared on entity \"{entity}\""),
        }
    }

    pub fn enum_case_not_listed(case: &str, enum_name: &str) -> Self {
        Self {
            kind: MappingErrorKind::EnumCaseNotListed,
            message: format!("case \"{case}\" is not listed in enum \"{enum_name}\""),
        }
    }
}

/// A fatal error detected while reconstructing objects from rows.
#[derive(Debug)]
pub struct HydrationError {
    pub kind: HydrationErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrationErrorKind {
    /// The discriminator value is absent from the row
    MissingDiscriminatorColumn,
    /// No meta result carries the configured discriminator column
    MissingDiscriminatorMeta,
    /// The discriminator value is outside the declared map
    InvalidDiscriminatorValue,
    /// The requested result shape is not supported by this mode
    UnsupportedResultShape,
}

impl HydrationError {
    pub fn missing_discriminator_column(entity: &str, alias: &str, column: &str) -> Self {
        Self {
            kind: HydrationErrorKind::MissingDiscriminatorColumn,
            message: format!(
                "the discriminator column \"{column}\" is missing for entity \"{entity}\" using alias \"{alias}\""
            ),
        }
    }

    pub fn missing_discriminator_meta(entity: &str, alias: &str, column: &str) -> Self {
        Self {
            kind: HydrationErrorKind::MissingDiscriminatorMeta,
            message: format!(
                "the meta mapping for the discriminator column \"{column}\" is missing for entity \"{entity}\" using alias \"{alias}\""
            ),
        }
    }

    pub fn invalid_discriminator_value(value: &str, valid: &[&str]) -> Self {
        let listed = valid
            .iter()
            .map(|v| format!("\"{v}\""))
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            kind: HydrationErrorKind::InvalidDiscriminatorValue,
            message: format!(
                "the discriminator value \"{value}\" is invalid, it must be one of {listed}"
            ),
        }
    }

    pub fn unsupported_result_shape(message: impl Into<String>) -> Self {
        Self {
            kind: HydrationErrorKind::UnsupportedResultShape,
            message: message.into(),
        }
    }
}

/// A type conversion failure.
#[derive(Debug)]
pub struct TypeError {
    pub expected: &'static str,
    pub actual: String,
    pub column: Option<String>,
}

/// A failure reported by the row source.
#[derive(Debug)]
pub struct SourceError {
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl SourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Mapping(e) => write!(f, "Mapping error: {}", e.message),
            Error::Hydration(e) => write!(f, "Hydration error: {}", e.message),
            Error::Type(e) => {
                if let Some(col) = &e.column {
                    write!(
                        f,
                        "Type error in column '{}': expected {}, found {}",
                        col, e.expected, e.actual
                    )
                } else {
                    write!(f, "Type error: expected {}, found {}", e.expected, e.actual)
                }
            }
            Error::Source(e) => write!(f, "Row source error: {}", e.message),
            Error::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Source(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

impl fmt::Display for MappingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for HydrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(col) = &self.column {
            write!(
                f,
                "expected {} for column '{}', found {}",
                self.expected, col, self.actual
            )
        } else {
            write!(f, "expected {}, found {}", self.expected, self.actual)
        }
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<MappingError> for Error {
    fn from(err: MappingError) -> Self {
        Error::Mapping(err)
    }
}

impl From<HydrationError> for Error {
    fn from(err: HydrationError) -> Self {
        Error::Hydration(err)
    }
}

impl From<TypeError> for Error {
    fn from(err: TypeError) -> Self {
        Error::Type(err)
    }
}

impl From<SourceError> for Error {
    fn from(err: SourceError) -> Self {
        Error::Source(err)
    }
}

/// Result type alias for hydration operations.
pub type Result<T> = std::result::Result<T, Error>;
