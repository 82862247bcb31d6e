//! Concrete-type resolution for polymorphic aliases.

use aquifer_core::{HydrationError, Result, Row, Value};
use aquifer_mapping::{EntityMetadata, ResultSetMapping};

/// Resolve the concrete entity type for one row of a polymorphic alias.
///
/// Non-polymorphic aliases (no discriminator column configured for them)
/// resolve to the declared entity type unchanged.
pub(crate) fn resolve_concrete_type<'a>(
    rsm: &ResultSetMapping,
    meta: &'a EntityMetadata,
    alias: &str,
    row: &Row,
) -> Result<String> {
    let Some(column) = rsm.discriminator_column(alias) else {
        return Ok(meta.name().to_string());
    };

    // The discriminator must be declared as a meta result; a bare column
    // name is not enough to locate the value reliably.
    let declared = rsm.metas_for(alias).any(|m| m.column == column);
    if !declared {
        return Err(
            HydrationError::missing_discriminator_meta(meta.name(), alias, column).into(),
        );
    }

    let value = row.get_by_name(column);
    let raw = match value {
        Some(Value::Text(s)) => s.clone(),
        Some(v) if !v.is_null() => match v.as_i64() {
            Some(n) => n.to_string(),
            None => {
                return Err(HydrationError::missing_discriminator_column(
                    meta.name(),
                    alias,
                    column,
                )
                .into());
            }
        },
        _ => {
            return Err(HydrationError::missing_discriminator_column(
                meta.name(),
                alias,
                column,
            )
            .into());
        }
    };

    let map = meta.discriminator_map().ok_or_else(|| {
        HydrationError::missing_discriminator_meta(meta.name(), alias, column)
    })?;
    map.resolve(&raw).map(ToString::to_string).ok_or_else(|| {
        HydrationError::invalid_discriminator_value(&raw, &map.values()).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aquifer_core::FieldType;
    use aquifer_mapping::{DiscriminatorMap, EntityMetadata, ResultSetMappingBuilder};

    fn person_meta() -> EntityMetadata {
        EntityMetadata::new("CompanyPerson")
            .id_field("id", FieldType::Int)
            .discriminator(
                DiscriminatorMap::new()
                    .case("person", "CompanyPerson")
                    .case("manager", "CompanyManager"),
            )
    }

    fn row(columns: &[&str], values: Vec<Value>) -> Row {
        Row::new(columns.iter().map(ToString::to_string).collect(), values)
    }

    #[test]
    fn test_resolves_mapped_value() {
        let mut builder = ResultSetMappingBuilder::new();
        builder
            .add_entity_result("CompanyPerson", "p")
            .add_field_result("p", "p__id", "id")
            .add_meta_result("p", "p__discr", "discr", FieldType::Text)
            .set_discriminator_column("p", "p__discr");
        let rsm = builder.build().unwrap();
        let meta = person_meta();

        let row = row(
            &["p__id", "p__discr"],
            vec![Value::Int(1), Value::Text("manager".into())],
        );
        let concrete = resolve_concrete_type(&rsm, &meta, "p", &row).unwrap();
        assert_eq!(concrete, "CompanyManager");
    }

    #[test]
    fn test_missing_meta_mapping() {
        let mut builder = ResultSetMappingBuilder::new();
        builder
            .add_entity_result("CompanyPerson", "p")
            .add_field_result("p", "p__id", "id")
            .set_discriminator_column("p", "p__discr");
        let rsm = builder.build().unwrap();
        let meta = person_meta();

        let row = row(&["p__id"], vec![Value::Int(1)]);
        let err = resolve_concrete_type(&rsm, &meta, "p", &row).unwrap_err();
        assert!(err.to_string().contains("meta mapping"));
    }

    #[test]
    fn test_missing_column_value() {
        let mut builder = ResultSetMappingBuilder::new();
        builder
            .add_entity_result("CompanyPerson", "p")
            .add_field_result("p", "p__id", "id")
            .add_meta_result("p", "p__discr", "discr", FieldType::Text)
            .set_discriminator_column("p", "p__discr");
        let rsm = builder.build().unwrap();
        let meta = person_meta();

        let row = row(&["p__id", "p__discr"], vec![Value::Int(1), Value::Null]);
        let err = resolve_concrete_type(&rsm, &meta, "p", &row).unwrap_err();
        assert!(
            err.to_string()
                .contains("the discriminator column \"p__discr\" is missing")
        );
    }

    #[test]
    fn test_invalid_value_lists_valid_set() {
        let mut builder = ResultSetMappingBuilder::new();
        builder
            .add_entity_result("CompanyPerson", "p")
            .add_field_result("p", "p__id", "id")
            .add_meta_result("p", "p__discr", "discr", FieldType::Text)
            .set_discriminator_column("p", "p__discr");
        let rsm = builder.build().unwrap();
        let meta = person_meta();

        let row = row(
            &["p__id", "p__discr"],
            vec![Value::Int(1), Value::Text("subworker".into())],
        );
        let err = resolve_concrete_type(&rsm, &meta, "p", &row).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Hydration error: the discriminator value \"subworker\" is invalid, it must be one of \"person\", \"manager\""
        );
    }

    #[test]
    fn test_non_polymorphic_alias_bypasses() {
        let mut builder = ResultSetMappingBuilder::new();
        builder
            .add_entity_result("CmsUser", "u")
            .add_field_result("u", "u__id", "id");
        let rsm = builder.build().unwrap();
        let meta = EntityMetadata::new("CmsUser").id_field("id", FieldType::Int);

        let row = row(&["u__id"], vec![Value::Int(1)]);
        assert_eq!(
            resolve_concrete_type(&rsm, &meta, "u", &row).unwrap(),
            "CmsUser"
        );
    }
}
