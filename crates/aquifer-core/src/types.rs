//! Semantic field type definitions.

/// A closed enumeration type backing a mapped field.
///
/// `cases` holds the stored backing values; a raw column value must match
/// one of them exactly or coercion fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    /// Logical enum name, used in error messages.
    pub name: String,
    /// The declared backing values, in declaration order.
    pub cases: Vec<String>,
}

impl EnumType {
    /// Create a new enum type from its name and backing values.
    pub fn new(name: impl Into<String>, cases: &[&str]) -> Self {
        Self {
            name: name.into(),
            cases: cases.iter().map(|c| (*c).to_string()).collect(),
        }
    }

    /// Check whether a raw value matches a declared case.
    #[must_use]
    pub fn contains_case(&self, raw: &str) -> bool {
        self.cases.iter().any(|c| c == raw)
    }
}

/// The semantic type of a mapped field or scalar result.
///
/// The coercion layer uses this to turn raw wire values (usually text)
/// into their typed `Value` form.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Bool,
    SmallInt,
    Int,
    BigInt,
    Float,
    Double,
    Decimal,
    Text,
    Bytes,
    Date,
    Timestamp,
    Json,
    /// Single enum-backed value.
    Enum(EnumType),
    /// Comma-joined set of enum-backed values.
    EnumSet(EnumType),
}

impl FieldType {
    /// Check if this type is numeric.
    pub const fn is_numeric(&self) -> bool {
        matches!(
            self,
            FieldType::SmallInt
                | FieldType::Int
                | FieldType::BigInt
                | FieldType::Float
                | FieldType::Double
                | FieldType::Decimal
        )
    }

    /// Check if this type is enum-backed.
    pub const fn is_enum(&self) -> bool {
        matches!(self, FieldType::Enum(_) | FieldType::EnumSet(_))
    }
}
