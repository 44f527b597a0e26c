//! Field tokens extracted from `---@field` declarations

use serde::{Deserialize, Serialize};

/// Modifier that makes a field visible to the editor and host
pub const PUBLIC_MODIFIER: &str = "public";

/// A single `---@field <modifier> <name> <type>` declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldToken {
    name: String,
    declared_type: String,
    modifier: String,
}

impl FieldToken {
    pub fn new(
        name: impl Into<String>,
        declared_type: impl Into<String>,
        modifier: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            modifier: modifier.into(),
        }
    }

    /// Field name as written in the declaration
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw type annotation, including any `[]` suffix
    pub fn declared_type(&self) -> &str {
        &self.declared_type
    }

    pub fn modifier(&self) -> &str {
        &self.modifier
    }

    pub fn is_public(&self) -> bool {
        self.modifier == PUBLIC_MODIFIER
    }

    /// True when the declared type ends in `[]`
    pub fn is_array(&self) -> bool {
        self.declared_type.ends_with("[]")
    }
}

impl std::fmt::Display for FieldToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.modifier, self.name, self.declared_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_token_accessors() {
        let token = FieldToken::new("targets", "Unit[]", "public");
        assert_eq!(token.name(), "targets");
        assert_eq!(token.declared_type(), "Unit[]");
        assert!(token.is_public());
        assert!(token.is_array());
        assert_eq!(token.to_string(), "public targets Unit[]");
    }

    #[test]
    fn test_private_field() {
        let token = FieldToken::new("secret", "string", "private");
        assert!(!token.is_public());
        assert!(!token.is_array());
    }
}
