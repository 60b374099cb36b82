//! Error types for CGML import, export and format operations

use thiserror::Error;

/// Errors that can occur while converting CGML documents.
///
/// Every variant is fatal: the whole import or export call is aborted and no
/// partial document is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CgmlError {
    /// Format not found in registry
    #[error("Format '{0}' not found")]
    FormatNotFound(String),
    /// Format does not support the requested operation
    #[error("Operation not supported: {0}")]
    NotSupported(String),

    /// The source text is not well-formed XML
    #[error("XML parsing error: {0}")]
    Xml(String),
    /// The root element is not `<graphml>`
    #[error("Root element is <{0}>, expected <graphml>")]
    UnexpectedRoot(String),
    /// A required XML attribute is absent
    #[error("<{element}> is missing the '{attribute}' attribute")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
    /// A numeric attribute could not be parsed
    #[error("Attribute '{attribute}' has a non-numeric value '{value}'")]
    InvalidNumber { attribute: String, value: String },
    /// Geometry data without the coordinates it needs
    #[error("Geometry of '{element}' is missing coordinate(s) {coordinate}")]
    MissingCoordinate {
        element: String,
        coordinate: &'static str,
    },

    /// `gFormat` declared twice with different values
    #[error("Format declared twice: old value '{old}', new value '{new}'")]
    DuplicateFormat { old: String, new: String },
    /// `gFormat` missing or naming an unknown dialect
    #[error("Unknown format '{0}'")]
    UnknownFormat(String),
    /// The same key declared twice for the same element kind
    #[error("Key '{id}' declared twice for '{scope}'")]
    DuplicateKey { id: String, scope: String },
    /// A data key that is not declared for the element kind (strict mode only)
    #[error("Key '{key}' is not declared for '{scope}'")]
    UndeclaredKey { key: String, scope: String },
    /// A known key used on an element kind it can never belong to
    #[error("Key '{key}' is not allowed on '{element}'")]
    MisplacedKey { key: String, element: String },

    /// Two top-level graphs with the same id
    #[error("State machine '{0}' declared twice")]
    DuplicateStateMachine(String),
    /// A second CGML_META note in the same state machine
    #[error("Duplicate meta node '{node}' in state machine '{state_machine}'")]
    DuplicateMeta { state_machine: String, node: String },
    /// A component node id or component `id` parameter used twice
    #[error("Component '{0}' already exists")]
    DuplicateComponent(String),
    /// A component record without its `id` or `type` parameter
    #[error("Component node '{node}' has no '{field}' parameter")]
    MissingComponentField { node: String, field: &'static str },
    /// A note carrying `dName` twice
    #[error("Note '{0}' has more than one name")]
    DuplicateNoteName(String),
    /// A `dNote` marker that is neither `formal` nor `informal`
    #[error("Note '{node}' has type '{value}', expected formal or informal")]
    InvalidNoteType { node: String, value: String },
    /// A formal note whose name is neither CGML_META nor CGML_COMPONENT
    #[error("Formal note '{node}' has unknown name '{name}', expected CGML_META or CGML_COMPONENT")]
    UnknownFormalNote { node: String, name: String },
    /// An action record whose trigger matches none of the grammars
    #[error("No trigger in action record '{record}' of '{element}', but it is required")]
    MissingTrigger { element: String, record: String },
    /// A parameter record without the `/` separator
    #[error("Malformed parameter record '{0}', expected 'name/ value'")]
    MalformedParameter(String),

    /// An element whose parent is not part of the state machine
    #[error("Parent '{parent}' of '{element}' does not exist")]
    UnknownParent { element: String, parent: String },
    /// A parent chain that loops back on itself
    #[error("Parent chain of '{0}' is cyclic")]
    CyclicParent(String),
    /// Action fields shaped for another mode than the one requested
    #[error("Actions of '{element}' do not match the {mode} mode")]
    ModeMismatch { element: String, mode: &'static str },
    /// Error while writing XML or JSON
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error while reading JSON
    #[error("Parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, CgmlError>;
