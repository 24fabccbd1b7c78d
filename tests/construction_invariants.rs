//! Construction Protocol Tests
//!
//! Construction is a strictly ordered single pass:
//! assign → configure → default → validate, with unrecognized arguments
//! forwarded to a base step first. Failures surface immediately; the
//! validation step aggregates every still-missing required property.

use propkit::{AttributeMap, Model, PropertyError, PropertySpec, Value};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn attrs(entries: &[(&str, Value)]) -> AttributeMap {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

// =============================================================================
// Missing Required Properties
// =============================================================================

/// Constructing without a required, defaultless property raises an
/// InitializationError whose map contains exactly that property.
#[test]
fn test_missing_required_property_named_exactly() {
    let model = Model::define("Article");
    model.property("title", PropertySpec::new().required(true)).unwrap();
    model.property("subtitle", PropertySpec::new()).unwrap();

    let err = model.create(AttributeMap::new()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Article requires the following properties to be set: title"
    );
    let map = err.to_map();
    assert_eq!(map.len(), 1);
    assert_eq!(map.get("title").unwrap(), "must be set");
}

/// The error aggregates every missing property, not just the first.
#[test]
fn test_all_missing_properties_aggregated() {
    let model = Model::define("Article");
    model.property("title", PropertySpec::new().required(true)).unwrap();
    model.property("body", PropertySpec::new().required(true)).unwrap();
    model.property("author", PropertySpec::new().required(true)).unwrap();

    let err = model
        .create(attrs(&[("body", json!("text"))]))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Article requires the following properties to be set: author, title"
    );
    assert_eq!(err.to_map().len(), 2);
}

// =============================================================================
// Defaults
// =============================================================================

/// Defaults apply in definition enumeration order, so a generator can read a
/// sibling whose own default was applied earlier in the order.
#[test]
fn test_default_generators_see_earlier_defaults() {
    let model = Model::define("Greeting");
    model
        .property("salutation", PropertySpec::new().default(json!("Hello")))
        .unwrap();
    model
        .property(
            "message",
            PropertySpec::new().default_with(|instance| {
                match instance.get("salutation") {
                    Value::String(s) => json!(format!("{}, world", s)),
                    _ => Value::Null,
                }
            }),
        )
        .unwrap();

    let instance = model.create(AttributeMap::new()).unwrap();
    assert_eq!(instance.get("message"), json!("Hello, world"));
}

/// Explicit values win over defaults, including for sibling-reading
/// generators.
#[test]
fn test_explicit_values_preempt_defaults() {
    let model = Model::define("Greeting");
    model
        .property("salutation", PropertySpec::new().default(json!("Hello")))
        .unwrap();

    let instance = model
        .create(attrs(&[("salutation", json!("Servus"))]))
        .unwrap();
    assert_eq!(instance.get("salutation"), json!("Servus"));
}

/// Generator defaults are evaluated per instance: no two instances observe
/// the identical mutable object.
#[test]
fn test_generator_defaults_not_shared_between_instances() {
    let model = Model::define("Post");
    model
        .property("tags", PropertySpec::new().default_with(|_| json!([])))
        .unwrap();

    let mut first = model.create(AttributeMap::new()).unwrap();
    let second = model.create(AttributeMap::new()).unwrap();

    let mut tags = first.get("tags");
    tags.as_array_mut().unwrap().push(json!("rust"));
    first.set("tags", tags).unwrap();

    assert_eq!(first.get("tags"), json!(["rust"]));
    assert_eq!(second.get("tags"), json!([]));
}

/// Mutable literal defaults are rejected at declaration time.
#[test]
fn test_mutable_literal_defaults_rejected_at_declaration() {
    let model = Model::define("Post");
    let err = model
        .property("tags", PropertySpec::new().default(json!([])))
        .unwrap_err();
    assert!(matches!(err, PropertyError::Configuration { .. }));
    assert!(!model.registry().contains("tags"));
}

/// A default value is itself subject to conversion and acceptance.
#[test]
fn test_default_runs_through_the_pipeline() {
    let model = Model::define("Post");
    model
        .property(
            "code",
            PropertySpec::new()
                .converts("upcase")
                .default(json!("abc")),
        )
        .unwrap();

    let instance = model.create(AttributeMap::new()).unwrap();
    assert_eq!(instance.get("code"), json!("ABC"));
}

// =============================================================================
// Dynamic Required-ness
// =============================================================================

/// name is required unless anonymous; anonymous defaults to true.
#[test]
fn test_required_unless_sibling_property() {
    let model = Model::define("Person");
    model
        .property("anonymous", PropertySpec::new().default(json!(true)))
        .unwrap();
    model
        .property(
            "name",
            PropertySpec::new()
                .required_when(|instance| instance.get("anonymous") != json!(true)),
        )
        .unwrap();

    // anonymous defaults to true: no name needed
    assert!(model.create(AttributeMap::new()).is_ok());

    // anonymous: false without a name fails, naming name
    let err = model
        .create(attrs(&[("anonymous", json!(false))]))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Person requires the following properties to be set: name"
    );

    // anonymous: false with a name succeeds
    let instance = model
        .create(attrs(&[("anonymous", json!(false)), ("name", json!("Ada"))]))
        .unwrap();
    assert_eq!(instance.get("name"), json!("Ada"));
}

// =============================================================================
// Argument Forwarding
// =============================================================================

/// Unrecognized attributes with no base step fail construction instead of
/// being silently dropped.
#[test]
fn test_unrecognized_attributes_never_silently_dropped() {
    let model = Model::define("Article");
    model.property("title", PropertySpec::new()).unwrap();

    let err = model
        .create(attrs(&[("title", json!("Lorem")), ("titel", json!("x"))]))
        .unwrap_err();
    match err {
        PropertyError::ConstructorArgumentForwarding { attrs, .. } => {
            assert_eq!(attrs, vec!["titel"]);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

/// A base step installed on an ancestor model receives the leftovers.
#[test]
fn test_base_step_consumes_leftovers() {
    let base = Model::define("Record");
    base.set_base_constructor(|_, positional, leftovers| {
        if positional.len() > 1 || leftovers.len() > 1 {
            return Err(PropertyError::forwarding(
                "Record",
                positional.len(),
                leftovers.keys().cloned().collect(),
            ));
        }
        Ok(())
    });
    let model = base.extend("Article");
    model.property("title", PropertySpec::new()).unwrap();

    assert!(model
        .create(attrs(&[("title", json!("a")), ("extra", json!(1))]))
        .is_ok());

    let err = model
        .create(attrs(&[("x", json!(1)), ("y", json!(2))]))
        .unwrap_err();
    assert!(matches!(
        err,
        PropertyError::ConstructorArgumentForwarding { .. }
    ));
}

// =============================================================================
// Configure Callback
// =============================================================================

/// The configure callback runs after assignment and before defaults, so it
/// can steer interdependent defaults imperatively.
#[test]
fn test_configure_callback_steers_defaults() {
    let model = Model::define("Person");
    model
        .property("anonymous", PropertySpec::new().default(json!(true)))
        .unwrap();
    model
        .property(
            "display_name",
            PropertySpec::new().default_with(|instance| {
                if instance.get("anonymous") == json!(true) {
                    json!("anonymous")
                } else {
                    Value::Null
                }
            }),
        )
        .unwrap();

    let instance = model
        .create_with(Vec::new(), AttributeMap::new(), |instance| {
            instance.set("anonymous", json!(true))
        })
        .unwrap();
    assert_eq!(instance.get("display_name"), json!("anonymous"));
}

/// Construction order is assign → configure → default → validate: a value
/// assigned by configure satisfies a required property.
#[test]
fn test_configure_assignment_satisfies_required() {
    let model = Model::define("Article");
    model.property("title", PropertySpec::new().required(true)).unwrap();

    let instance = model
        .create_with(Vec::new(), AttributeMap::new(), |instance| {
            instance.set("title", json!("Lorem"))
        })
        .unwrap();
    assert_eq!(instance.get("title"), json!("Lorem"));
}

// =============================================================================
// Error Context
// =============================================================================

/// Errors carry the owning model's name for interpolation and inspection.
#[test]
fn test_errors_carry_sender_and_properties() {
    let model = Model::define("Article");
    model.property("title", PropertySpec::new().required(true)).unwrap();

    let err = model.create(AttributeMap::new()).unwrap_err();
    assert_eq!(err.sender(), "Article");
    assert_eq!(err.properties(), vec!["title"]);
}
