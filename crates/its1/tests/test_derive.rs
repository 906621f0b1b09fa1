use helios_its1::{
    ConflictKind, Graphable, IntoPropertyValue, NullFlavor, PropertyRole, PropertyValue,
    StructureKind, classify, describe,
};

#[derive(Graphable)]
#[structure(kind = "entity")]
struct Patient {
    #[property(role = "traversable_association", sort_key = 1)]
    contains: Vec<Organization>,
    #[property(role = "non_structural", sort_key = 1)]
    address: Option<String>,
    #[property(role = "structural", sort_key = 2)]
    name: Option<String>,
    #[property(role = "structural", sort_key = 1)]
    id: Option<String>,
}

#[derive(Graphable)]
#[structure(name = "organization", kind = "entity")]
struct Organization {
    #[property(role = "non_structural", sort_key = 1)]
    name: Option<String>,
}

#[derive(Graphable)]
#[structure(name = "MCCI_IN000002UV01", kind = "interaction")]
struct Message {
    #[property(role = "non_structural", sort_key = 1)]
    id: Option<String>,
}

#[derive(Graphable)]
#[structure(name = "II", kind = "data_type")]
struct InstanceIdentifier {
    #[null_flavor]
    null_flavor: Option<NullFlavor>,
    #[property(role = "structural", sort_key = 1)]
    root: Option<String>,
    #[property(skip)]
    #[allow(dead_code)]
    cached_display: String,
}

#[derive(Graphable)]
struct Tied {
    #[property(role = "structural", sort_key = 5)]
    a: String,
    #[property(role = "structural", sort_key = 5)]
    b: String,
}

#[derive(Graphable)]
struct TiedReversed {
    #[property(role = "structural", sort_key = 5)]
    b: String,
    #[property(role = "structural", sort_key = 5)]
    a: String,
}

#[derive(Graphable)]
struct Observation {
    #[property(role = "structural", sort_key = 2)]
    #[property(role = "traversable_association", sort_key = 2)]
    c: Option<String>,
    #[property(role = "non_structural", sort_key = -1)]
    effective_time: Option<String>,
    mood_code: String,
}

#[derive(Graphable)]
#[structure(name = "wrapper")]
struct Wrapper<T: IntoPropertyValue> {
    #[property(role = "non_structural", sort_key = 1)]
    value: T,
}

#[test]
fn test_patient_order() {
    let descriptor = describe::<Patient>();
    let names: Vec<_> = descriptor.properties().iter().map(|p| p.name).collect();
    assert_eq!(names, vec!["id", "name", "address", "contains"]);
    assert_eq!(descriptor.element_name, "Patient");
    assert_eq!(descriptor.structure_kind, StructureKind::Entity);
    assert!(descriptor.conflicts().is_empty());
}

#[test]
fn test_slots_follow_field_declaration() {
    let descriptor = describe::<Patient>();
    assert_eq!(descriptor.property("contains").unwrap().accessor.slot(), 0);
    assert_eq!(descriptor.property("id").unwrap().accessor.slot(), 3);

    let patient = Patient {
        contains: vec![],
        address: None,
        name: Some("Doe".to_string()),
        id: Some("p1".to_string()),
    };
    let slot = descriptor.property("name").unwrap().accessor.slot();
    assert_eq!(patient.read_property(slot).unwrap().as_text(), Some("Doe"));
    assert!(patient.read_property(4).is_none());
}

#[test]
fn test_type_name_is_module_qualified() {
    let metadata = Patient::type_metadata();
    assert!(metadata.type_name.ends_with("::Patient"));
    assert_ne!(metadata.type_name, Organization::type_metadata().type_name);
}

#[test]
fn test_equal_sort_keys_keep_declaration_order() {
    let descriptor = describe::<Tied>();
    let names: Vec<_> = descriptor.properties().iter().map(|p| p.name).collect();
    assert_eq!(names, vec!["a", "b"]);

    let descriptor = describe::<TiedReversed>();
    let names: Vec<_> = descriptor.properties().iter().map(|p| p.name).collect();
    assert_eq!(names, vec!["b", "a"]);
}

#[test]
fn test_conflicting_roles_resolve_to_first_declaration() {
    let descriptor = describe::<Observation>();
    let c = descriptor.property("c").unwrap();
    assert_eq!(c.role, PropertyRole::Structural);
    assert_eq!(c.sort_key, 2);

    assert_eq!(descriptor.conflicts().len(), 1);
    let conflict = &descriptor.conflicts()[0];
    assert_eq!(conflict.property, "c");
    match &conflict.kind {
        ConflictKind::Declarations { chosen, discarded } => {
            assert_eq!(chosen.role, PropertyRole::Structural);
            assert_eq!(discarded.len(), 1);
            assert_eq!(discarded[0].role, PropertyRole::TraversableAssociation);
        }
        other => panic!("unexpected conflict: {other:?}"),
    }
}

#[derive(Graphable)]
#[allow(dead_code)]
struct Coding {
    #[property(name = "code", role = "structural", sort_key = 1)]
    primary: String,
    #[property(name = "code", role = "structural", sort_key = 2)]
    secondary: String,
}

#[test]
fn test_shared_wire_name_is_a_conflict() {
    let descriptor = describe::<Coding>();
    assert_eq!(descriptor.properties().len(), 1);
    assert_eq!(descriptor.property("code").unwrap().accessor.slot(), 0);

    let conflict = &descriptor.conflicts()[0];
    assert_eq!(conflict.property, "code");
    assert_eq!(
        conflict.kind,
        ConflictKind::DuplicateName {
            kept: 0,
            dropped: vec![1],
        }
    );
}

#[test]
fn test_unannotated_field_is_structural_key_zero() {
    let descriptor = describe::<Observation>();
    let names: Vec<_> = descriptor.properties().iter().map(|p| p.name).collect();
    // moodCode (0) sorts before c (2); effectiveTime is the only NonStructural
    assert_eq!(names, vec!["moodCode", "c", "effectiveTime"]);

    let mood = descriptor.property("moodCode").unwrap();
    assert_eq!(mood.role, PropertyRole::Structural);
    assert_eq!(mood.sort_key, 0);
    assert_eq!(descriptor.property("effectiveTime").unwrap().sort_key, -1);
}

#[test]
fn test_skipped_field_is_not_described() {
    let descriptor = describe::<InstanceIdentifier>();
    let names: Vec<_> = descriptor.properties().iter().map(|p| p.name).collect();
    assert_eq!(names, vec!["nullFlavor", "root"]);
}

#[test]
fn test_null_flavor_capability() {
    let unknown = InstanceIdentifier {
        null_flavor: Some(NullFlavor::UNK),
        root: None,
        cached_display: String::new(),
    };
    let known = InstanceIdentifier {
        null_flavor: None,
        root: Some("2.16.840.1.113883.19".to_string()),
        cached_display: String::new(),
    };

    assert!(classify(&unknown).is_null);
    assert!(!classify(&known).is_null);
    assert_eq!(
        unknown
            .as_null_flavored()
            .and_then(|flavored| flavored.null_flavor()),
        Some(NullFlavor::UNK)
    );

    // Types without a #[null_flavor] field never classify as null
    let patient = Patient {
        contains: vec![],
        address: None,
        name: None,
        id: None,
    };
    assert!(patient.as_null_flavored().is_none());
    assert!(!classify(&patient).is_null);
}

#[test]
fn test_root_detection() {
    assert!(classify(&Message { id: None }).is_root);
    assert!(
        !classify(&InstanceIdentifier {
            null_flavor: None,
            root: None,
            cached_display: String::new(),
        })
        .is_root
    );
    assert!(!classify(&Organization { name: None }).is_root);
}

#[test]
fn test_derived_type_is_a_node_value() {
    let organization = Organization {
        name: Some("Acme".to_string()),
    };
    match organization.to_property_value() {
        PropertyValue::Node(node) => assert_eq!(node.metadata().element_name, "organization"),
        other => panic!("expected a node, got {other:?}"),
    }
}

#[test]
fn test_generic_struct() {
    let wrapper = Wrapper {
        value: "text".to_string(),
    };
    assert_eq!(wrapper.metadata().element_name, "wrapper");
    assert_eq!(wrapper.read_property(0).unwrap().as_text(), Some("text"));
}
