//! propkit - a strict, declarative property engine
//!
//! Declare named properties with optional validation, conversion, default,
//! and required-ness rules against a [`Model`]; every write and every
//! construction routes through the resulting rule pipeline. Sub-models get a
//! live, push-propagated view of inherited schema, so a base model can gain
//! properties after sub-models already exist.
//!
//! ```
//! use propkit::{AttributeMap, Kind, Model, PropertySpec};
//! use serde_json::json;
//!
//! let post = Model::define("Post");
//! post.property(
//!     "title",
//!     PropertySpec::new()
//!         .accepts_kind(Kind::String)
//!         .converts("to_title")
//!         .required(true)
//!         .default_with(|_| json!("chunky")),
//! )
//! .unwrap();
//!
//! let instance = post.create(AttributeMap::new()).unwrap();
//! assert_eq!(instance.get("title"), json!("chunky"));
//! ```

pub mod errors;
pub mod instance;
pub mod model;
pub mod property;
pub mod registry;
pub mod rule;
pub mod value;

pub use errors::{PropertyError, PropertyResult};
pub use instance::{Accessor, Instance};
pub use model::{AttributeMap, BaseConstructor, Model};
pub use property::{DefaultSource, Definition, PropertySpec};
pub use registry::Registry;
pub use rule::{AcceptSpec, Converter, Matcher, RequiredSpec, RuleStage};
pub use value::{is_absent, is_present, json_type_name, Kind, Value};
