//! Common mapping code shared by the CGML formats
//!
//!     - actions.rs and parameters.rs: the payload micro-grammars
//!     - nested_to_flat.rs: attributed tree → document model (import)
//!     - flat_to_nested.rs: document model → attributed tree (export)

pub mod actions;
pub mod flat_to_nested;
pub mod nested_to_flat;
pub mod parameters;

pub use actions::{
    convert_mode, parse_actions, parse_transition_actions, parse_trigger, serialize_actions,
    serialize_transition_actions,
};
pub use flat_to_nested::{export_document, DEFAULT_META_ID};
pub use nested_to_flat::import_document;
pub use parameters::{parse_parameters, serialize_parameters};
