//! Hydration of polymorphic hierarchies and enum-backed fields.

use aquifer::{
    ArrayRowSource, DiscriminatorMap, EntityMetadata, EntityRef, EnumType, FieldType, Hydrator,
    MetadataRegistry, ResultSetMapping, ResultSetMappingBuilder, Value,
};

fn company_registry() -> MetadataRegistry {
    let mut registry = MetadataRegistry::new();
    registry.register(
        EntityMetadata::new("CompanyPerson")
            .id_field("id", FieldType::Int)
            .field("name", FieldType::Text)
            .discriminator(
                DiscriminatorMap::new()
                    .case("person", "CompanyPerson")
                    .case("manager", "CompanyManager")
                    .case("employee", "CompanyEmployee"),
            ),
    );
    registry.register(
        EntityMetadata::new("CompanyEmployee")
            .parent("CompanyPerson")
            .field("salary", FieldType::Int)
            .field("department", FieldType::Text),
    );
    registry.register(
        EntityMetadata::new("CompanyManager")
            .parent("CompanyEmployee")
            .field("title", FieldType::Text),
    );
    registry
}

fn company_shape() -> ResultSetMapping {
    let mut builder = ResultSetMappingBuilder::new();
    builder
        .add_entity_result("CompanyPerson", "p")
        .add_field_result("p", "p__id", "id")
        .add_field_result("p", "p__name", "name")
        .add_inherited_field_result("p", "p__salary", "salary", "CompanyEmployee")
        .add_inherited_field_result("p", "p__title", "title", "CompanyManager")
        .add_meta_result("p", "p__discr", "discr", FieldType::Text)
        .set_discriminator_column("p", "p__discr");
    builder.build().unwrap()
}

fn field(entity: &EntityRef, name: &str) -> Value {
    entity
        .read()
        .unwrap()
        .field(name)
        .cloned()
        .unwrap_or(Value::Null)
}

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

#[test]
fn test_discriminator_resolves_concrete_types() {
    let registry = company_registry();
    let rsm = company_shape();

    let source = ArrayRowSource::new(
        &["p__id", "p__name", "p__salary", "p__title", "p__discr"],
        vec![
            vec![text("1"), text("Fabio"), Value::Null, Value::Null, text("person")],
            vec![text("2"), text("Guilherme"), text("100000"), text("CTO"), text("manager")],
            vec![text("3"), text("Benjamin"), text("90000"), Value::Null, text("employee")],
        ],
    );
    let result = Hydrator::new(&registry).hydrate_all(source, &rsm).unwrap();

    assert_eq!(result.len(), 3);
    let person = result.get(0).unwrap().as_entity().unwrap();
    assert_eq!(person.read().unwrap().entity_type, "CompanyPerson");

    let manager = result.get(1).unwrap().as_entity().unwrap();
    assert_eq!(manager.read().unwrap().entity_type, "CompanyManager");
    assert_eq!(field(manager, "title"), text("CTO"));
    assert_eq!(field(manager, "salary"), Value::Int(100_000));

    let employee = result.get(2).unwrap().as_entity().unwrap();
    assert_eq!(employee.read().unwrap().entity_type, "CompanyEmployee");
    assert_eq!(field(employee, "salary"), Value::Int(90_000));
}

#[test]
fn test_sibling_subtype_fields_do_not_bleed() {
    let registry = company_registry();
    let rsm = company_shape();

    // an employee row carrying a stray value in the manager-only column
    let source = ArrayRowSource::new(
        &["p__id", "p__name", "p__salary", "p__title", "p__discr"],
        vec![vec![
            text("1"),
            text("Benjamin"),
            text("90000"),
            text("Imposter"),
            text("employee"),
        ]],
    );
    let result = Hydrator::new(&registry).hydrate_all(source, &rsm).unwrap();

    let employee = result.get(0).unwrap().as_entity().unwrap();
    assert_eq!(field(employee, "salary"), Value::Int(90_000));
    assert!(employee.read().unwrap().field("title").is_none());
}

#[test]
fn test_missing_discriminator_meta_mapping() {
    let registry = company_registry();
    let mut builder = ResultSetMappingBuilder::new();
    builder
        .add_entity_result("CompanyPerson", "p")
        .add_field_result("p", "p__id", "id")
        .set_discriminator_column("p", "p__discr");
    let rsm = builder.build().unwrap();

    let source = ArrayRowSource::new(&["p__id"], vec![vec![text("1")]]);
    let err = Hydrator::new(&registry)
        .hydrate_all(source, &rsm)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Hydration error: the meta mapping for the discriminator column \"p__discr\" is missing for entity \"CompanyPerson\" using alias \"p\""
    );
}

#[test]
fn test_missing_discriminator_column_value() {
    let registry = company_registry();
    let rsm = company_shape();

    let source = ArrayRowSource::new(
        &["p__id", "p__name", "p__salary", "p__title", "p__discr"],
        vec![vec![text("1"), text("Fabio"), Value::Null, Value::Null, Value::Null]],
    );
    let err = Hydrator::new(&registry)
        .hydrate_all(source, &rsm)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Hydration error: the discriminator column \"p__discr\" is missing for entity \"CompanyPerson\" using alias \"p\""
    );
}

#[test]
fn test_invalid_discriminator_value_lists_valid_set() {
    let registry = company_registry();
    let rsm = company_shape();

    let source = ArrayRowSource::new(
        &["p__id", "p__name", "p__salary", "p__title", "p__discr"],
        vec![vec![text("1"), text("Fabio"), Value::Null, Value::Null, text("subworker")]],
    );
    let err = Hydrator::new(&registry)
        .hydrate_all(source, &rsm)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Hydration error: the discriminator value \"subworker\" is invalid, it must be one of \"person\", \"manager\", \"employee\""
    );
}

#[test]
fn test_enum_backed_field() {
    let mut registry = MetadataRegistry::new();
    registry.register(
        EntityMetadata::new("Scale")
            .id_field("id", FieldType::Int)
            .field("unit", FieldType::Enum(EnumType::new("Unit", &["g", "kg"]))),
    );
    let mut builder = ResultSetMappingBuilder::new();
    builder
        .add_entity_result("Scale", "s")
        .add_field_result("s", "s__id", "id")
        .add_field_result("s", "s__unit", "unit");
    let rsm = builder.build().unwrap();

    let source = ArrayRowSource::new(
        &["s__id", "s__unit"],
        vec![vec![text("1"), text("kg")]],
    );
    let result = Hydrator::new(&registry).hydrate_all(source, &rsm).unwrap();
    let scale = result.get(0).unwrap().as_entity().unwrap();
    assert_eq!(field(scale, "unit"), text("kg"));

    let source = ArrayRowSource::new(
        &["s__id", "s__unit"],
        vec![vec![text("2"), text("unknown_case")]],
    );
    let err = Hydrator::new(&registry)
        .hydrate_all(source, &rsm)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Mapping error: case \"unknown_case\" is not listed in enum \"Unit\""
    );
}

#[test]
fn test_enum_set_field_splits_cases() {
    let mut registry = MetadataRegistry::new();
    registry.register(
        EntityMetadata::new("Card")
            .id_field("id", FieldType::Int)
            .field(
                "suits",
                FieldType::EnumSet(EnumType::new("Suit", &["clubs", "hearts", "spades"])),
            ),
    );
    let mut builder = ResultSetMappingBuilder::new();
    builder
        .add_entity_result("Card", "c")
        .add_field_result("c", "c__id", "id")
        .add_field_result("c", "c__suits", "suits");
    let rsm = builder.build().unwrap();

    let source = ArrayRowSource::new(
        &["c__id", "c__suits"],
        vec![vec![text("1"), text("clubs,hearts")]],
    );
    let result = Hydrator::new(&registry).hydrate_all(source, &rsm).unwrap();
    let card = result.get(0).unwrap().as_entity().unwrap();
    assert_eq!(
        field(card, "suits"),
        Value::Array(vec![text("clubs"), text("hearts")])
    );

    let source = ArrayRowSource::new(
        &["c__id", "c__suits"],
        vec![vec![text("2"), text("clubs,diamonds")]],
    );
    let err = Hydrator::new(&registry)
        .hydrate_all(source, &rsm)
        .unwrap_err();
    assert!(
        err.to_string()
            .contains("case \"diamonds\" is not listed in enum \"Suit\"")
    );
}
