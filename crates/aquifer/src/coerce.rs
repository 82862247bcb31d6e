//! Raw-to-semantic value coercion.
//!
//! Row sources hand back loosely typed values (drivers commonly return
//! everything as text). Coercion normalizes each raw value to the variant
//! its declared `FieldType` calls for. NULL always stays NULL; it never
//! collapses to a zero value.

use aquifer_core::{Error, FieldType, MappingError, Result, TypeError, Value};

/// Coerce a raw column value to its declared semantic type.
pub fn coerce(raw: &Value, ty: &FieldType) -> Result<Value> {
    if raw.is_null() {
        return Ok(Value::Null);
    }

    match ty {
        FieldType::Bool => raw
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| mismatch("BOOL", raw)),
        FieldType::SmallInt => match raw {
            Value::SmallInt(v) => Ok(Value::SmallInt(*v)),
            Value::Int(v) => i16::try_from(*v)
                .map(Value::SmallInt)
                .map_err(|_| mismatch("SMALLINT", raw)),
            Value::BigInt(v) => i16::try_from(*v)
                .map(Value::SmallInt)
                .map_err(|_| mismatch("SMALLINT", raw)),
            Value::Text(s) => s
                .parse::<i16>()
                .map(Value::SmallInt)
                .map_err(|_| mismatch("SMALLINT", raw)),
            _ => Err(mismatch("SMALLINT", raw)),
        },
        FieldType::Int => match raw {
            Value::SmallInt(v) => Ok(Value::Int(i32::from(*v))),
            Value::Int(v) => Ok(Value::Int(*v)),
            Value::BigInt(v) => i32::try_from(*v)
                .map(Value::Int)
                .map_err(|_| mismatch("INT", raw)),
            Value::Text(s) => s
                .parse::<i32>()
                .map(Value::Int)
                .map_err(|_| mismatch("INT", raw)),
            _ => Err(mismatch("INT", raw)),
        },
        FieldType::BigInt => match raw {
            Value::Text(s) => s
                .parse::<i64>()
                .map(Value::BigInt)
                .map_err(|_| mismatch("BIGINT", raw)),
            _ => raw.as_i64().map(Value::BigInt).ok_or_else(|| mismatch("BIGINT", raw)),
        },
        FieldType::Float => match raw {
            Value::Float(v) => Ok(Value::Float(*v)),
            Value::Text(s) => s
                .parse::<f32>()
                .map(Value::Float)
                .map_err(|_| mismatch("FLOAT", raw)),
            _ => raw
                .as_f64()
                .map(|v| Value::Float(v as f32))
                .ok_or_else(|| mismatch("FLOAT", raw)),
        },
        FieldType::Double => match raw {
            Value::Text(s) => s
                .parse::<f64>()
                .map(Value::Double)
                .map_err(|_| mismatch("DOUBLE", raw)),
            _ => raw.as_f64().map(Value::Double).ok_or_else(|| mismatch("DOUBLE", raw)),
        },
        FieldType::Decimal => match raw {
            Value::Decimal(s) => Ok(Value::Decimal(s.clone())),
            Value::Text(s) => Ok(Value::Decimal(s.clone())),
            Value::Int(v) => Ok(Value::Decimal(v.to_string())),
            Value::BigInt(v) => Ok(Value::Decimal(v.to_string())),
            Value::Double(v) => Ok(Value::Decimal(v.to_string())),
            _ => Err(mismatch("DECIMAL", raw)),
        },
        FieldType::Text => match raw {
            Value::Text(s) => Ok(Value::Text(s.clone())),
            Value::Int(v) => Ok(Value::Text(v.to_string())),
            Value::BigInt(v) => Ok(Value::Text(v.to_string())),
            Value::SmallInt(v) => Ok(Value::Text(v.to_string())),
            Value::Double(v) => Ok(Value::Text(v.to_string())),
            Value::Decimal(s) => Ok(Value::Text(s.clone())),
            _ => Err(mismatch("TEXT", raw)),
        },
        FieldType::Bytes => match raw {
            Value::Bytes(b) => Ok(Value::Bytes(b.clone())),
            Value::Text(s) => Ok(Value::Bytes(s.clone().into_bytes())),
            _ => Err(mismatch("BYTES", raw)),
        },
        FieldType::Date => match raw {
            Value::Date(d) => Ok(Value::Date(*d)),
            Value::Int(v) => Ok(Value::Date(*v)),
            _ => Err(mismatch("DATE", raw)),
        },
        FieldType::Timestamp => match raw {
            Value::Timestamp(t) => Ok(Value::Timestamp(*t)),
            _ => raw
                .as_i64()
                .map(Value::Timestamp)
                .ok_or_else(|| mismatch("TIMESTAMP", raw)),
        },
        FieldType::Json => match raw {
            Value::Json(v) => Ok(Value::Json(v.clone())),
            Value::Text(s) => serde_json::from_str(s)
                .map(Value::Json)
                .map_err(|_| mismatch("JSON", raw)),
            _ => Err(mismatch("JSON", raw)),
        },
        FieldType::Enum(en) => {
            let case = case_text(raw).ok_or_else(|| mismatch("ENUM", raw))?;
            if en.contains_case(case) {
                Ok(Value::Text(case.to_string()))
            } else {
                Err(MappingError::enum_case_not_listed(case, &en.name).into())
            }
        }
        FieldType::EnumSet(en) => {
            let text = case_text(raw).ok_or_else(|| mismatch("ENUM", raw))?;
            let mut cases = Vec::new();
            for case in text.split(',').map(str::trim).filter(|c| !c.is_empty()) {
                if !en.contains_case(case) {
                    return Err(MappingError::enum_case_not_listed(case, &en.name).into());
                }
                cases.push(Value::Text(case.to_string()));
            }
            Ok(Value::Array(cases))
        }
    }
}

fn case_text(raw: &Value) -> Option<&str> {
    match raw {
        Value::Text(s) => Some(s),
        _ => None,
    }
}

fn mismatch(expected: &'static str, actual: &Value) -> Error {
    Error::Type(TypeError {
        expected,
        actual: format!("{} value", actual.type_name()),
        column: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aquifer_core::EnumType;

    #[test]
    fn test_null_stays_null() {
        assert_eq!(coerce(&Value::Null, &FieldType::Int).unwrap(), Value::Null);
        assert_eq!(coerce(&Value::Null, &FieldType::Text).unwrap(), Value::Null);
    }

    #[test]
    fn test_numeric_strings_parse() {
        assert_eq!(
            coerce(&Value::Text("42".into()), &FieldType::Int).unwrap(),
            Value::Int(42)
        );
        assert_eq!(
            coerce(&Value::Text("9000000000".into()), &FieldType::BigInt).unwrap(),
            Value::BigInt(9_000_000_000)
        );
        assert_eq!(
            coerce(&Value::Text("1.5".into()), &FieldType::Double).unwrap(),
            Value::Double(1.5)
        );
        assert!(coerce(&Value::Text("romanb".into()), &FieldType::Int).is_err());
    }

    #[test]
    fn test_integers_stringify_for_text() {
        assert_eq!(
            coerce(&Value::Int(1), &FieldType::Text).unwrap(),
            Value::Text("1".into())
        );
    }

    #[test]
    fn test_enum_validates_case() {
        let unit = FieldType::Enum(EnumType::new("Unit", &["g", "kg"]));
        assert_eq!(
            coerce(&Value::Text("g".into()), &unit).unwrap(),
            Value::Text("g".into())
        );

        let err = coerce(&Value::Text("pound".into()), &unit).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Mapping error: case \"pound\" is not listed in enum \"Unit\""
        );
    }

    #[test]
    fn test_enum_set_splits_and_validates() {
        let ty = FieldType::EnumSet(EnumType::new("Unit", &["g", "m"]));
        assert_eq!(
            coerce(&Value::Text("g,m".into()), &ty).unwrap(),
            Value::Array(vec![Value::Text("g".into()), Value::Text("m".into())])
        );

        let err = coerce(&Value::Text("g,m,unknown_case".into()), &ty).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Mapping error: case \"unknown_case\" is not listed in enum \"Unit\""
        );
    }

    #[test]
    fn test_decimal_preserves_text() {
        assert_eq!(
            coerce(&Value::Text("1337.1337".into()), &FieldType::Decimal).unwrap(),
            Value::Decimal("1337.1337".into())
        );
    }
}
