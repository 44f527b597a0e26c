//! Error types for the EasyLua toolkit

use thiserror::Error;

/// Result type for EasyLua operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while parsing, resolving, linking or hosting scripts
#[derive(Error, Debug)]
pub enum Error {
    /// Source text was empty or whitespace only
    #[error("Empty script source")]
    EmptySource,

    /// The first retained line is not a `---@class Name[: Base]` declaration.
    /// Callers treat this as "not an annotated script".
    #[error("Malformed class declaration: {line:?}")]
    MalformedClassDeclaration { line: String },

    /// A class inherits from itself, directly or through its bases
    #[error("Base class cycle: {}", chain.join(" -> "))]
    BaseClassCycle { chain: Vec<String> },

    /// No source could be found for a base class
    #[error("Base class not found: {0}")]
    BaseClassNotFound(String),

    /// A parameter has no active value to hand to the script host
    #[error("Cannot cast field '{field}' of type '{type_name}': no value set")]
    UnknownFieldCast { field: String, type_name: String },

    /// Type conversion error
    #[error("Type error: expected {expected}, got {actual}")]
    TypeError { expected: String, actual: String },

    /// Script file name and declared class name disagree
    #[error("Class name mismatch: file '{file}' declares class '{declared}'")]
    ClassNameMismatch { file: String, declared: String },

    /// Script file not found
    #[error("Script not found: {0}")]
    ScriptNotFound(String),

    /// Script instance handle is unknown to the host
    #[error("Instance not found: {0}")]
    InstanceNotFound(u64),

    /// KDL parsing error
    #[error("KDL parse error: {0}")]
    KdlParse(#[from] kdl::KdlError),

    /// Invalid configuration value
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Lua error
    #[cfg(feature = "lua")]
    #[error("Lua error: {0}")]
    Lua(#[from] mlua::Error),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for the error kind that marks a source as plain Lua
    pub fn is_not_annotated(&self) -> bool {
        matches!(self, Error::MalformedClassDeclaration { .. })
    }
}
