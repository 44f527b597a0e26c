//! KDL project configuration
//!
//! # Example
//!
//! ```kdl
//! scripts extension=".lua.txt" {
//!     root "Assets/Lua"
//!     root "Assets/Shared"
//! }
//! enum "Team" Red=0 Blue=1
//! ```
//!
//! Relative roots are resolved against the directory of the config file.

use crate::{Error, PainterRegistry, Result, ScriptDirectory, DEFAULT_EXTENSION};
use std::path::{Path, PathBuf};
use tracing::warn;

/// An enum type exposed to the parameter editor
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDecl {
    pub name: String,
    /// Named values in declaration order
    pub values: Vec<(String, i32)>,
}

/// Script roots, file extension and editor enums for a project
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectConfig {
    pub extension: String,
    pub roots: Vec<PathBuf>,
    pub enums: Vec<EnumDecl>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            extension: DEFAULT_EXTENSION.to_string(),
            roots: Vec::new(),
            enums: Vec::new(),
        }
    }
}

impl ProjectConfig {
    /// Parse a KDL file; relative roots resolve against its directory
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_string(&content)?;

        if let Some(base) = path.parent() {
            for root in &mut config.roots {
                if root.is_relative() {
                    *root = base.join(&*root);
                }
            }
        }
        Ok(config)
    }

    /// Parse a KDL string; roots are kept as written
    pub fn from_string(content: &str) -> Result<Self> {
        let doc: kdl::KdlDocument = content.parse()?;
        let mut config = Self::default();

        for node in doc.nodes() {
            match node.name().value() {
                "scripts" => config.parse_scripts(node)?,
                "enum" => config.enums.push(Self::parse_enum(node)?),
                other => warn!("Ignoring unknown config node '{}'", other),
            }
        }

        Ok(config)
    }

    fn parse_scripts(&mut self, node: &kdl::KdlNode) -> Result<()> {
        for entry in node.entries() {
            match entry.name().map(|n| n.value()) {
                Some("extension") => {
                    self.extension = Self::string_value(entry.value(), "scripts extension")?;
                }
                Some(other) => warn!("Ignoring unknown scripts property '{}'", other),
                None => {
                    // Positional roots: scripts "Assets/Lua"
                    let root = Self::string_value(entry.value(), "scripts root")?;
                    self.roots.push(PathBuf::from(root));
                }
            }
        }

        if let Some(children) = node.children() {
            for child in children.nodes() {
                if child.name().value() != "root" {
                    warn!("Ignoring unknown scripts child '{}'", child.name().value());
                    continue;
                }
                for entry in child.entries().iter().filter(|e| e.name().is_none()) {
                    let root = Self::string_value(entry.value(), "root")?;
                    self.roots.push(PathBuf::from(root));
                }
            }
        }
        Ok(())
    }

    fn parse_enum(node: &kdl::KdlNode) -> Result<EnumDecl> {
        let name = node
            .entries()
            .iter()
            .find(|e| e.name().is_none())
            .ok_or_else(|| Error::InvalidConfig("enum without a type name".to_string()))
            .and_then(|e| Self::string_value(e.value(), "enum name"))?;

        let mut values = Vec::new();
        for entry in node.entries() {
            let Some(key) = entry.name() else {
                continue;
            };
            let value = match entry.value() {
                kdl::KdlValue::Integer(i) => i32::try_from(*i).map_err(|_| {
                    Error::InvalidConfig(format!("enum {}.{} out of range", name, key.value()))
                })?,
                other => {
                    return Err(Error::InvalidConfig(format!(
                        "enum {}.{} must be an integer, got {}",
                        name,
                        key.value(),
                        other
                    )))
                }
            };
            values.push((key.value().to_string(), value));
        }

        Ok(EnumDecl { name, values })
    }

    fn string_value(value: &kdl::KdlValue, what: &str) -> Result<String> {
        match value {
            kdl::KdlValue::String(s) => Ok(s.clone()),
            other => Err(Error::InvalidConfig(format!(
                "{} must be a string, got {}",
                what, other
            ))),
        }
    }

    /// Painter registry with the built-in painters and the declared enums
    pub fn painters(&self) -> PainterRegistry {
        let mut registry = PainterRegistry::with_defaults();
        for decl in &self.enums {
            registry.register_enum(decl.name.clone(), decl.values.clone());
        }
        registry
    }

    /// Scan the configured roots
    pub fn script_directory(&self) -> Result<ScriptDirectory> {
        ScriptDirectory::scan(&self.roots, &self.extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Control, LuaParam, ParamValue};

    #[test]
    fn test_parse_full() {
        let kdl = r#"
            scripts extension=".lua" {
                root "Assets/Lua"
                root "Assets/Shared"
            }
            enum "Team" Red=0 Blue=1
        "#;

        let config = ProjectConfig::from_string(kdl).unwrap();
        assert_eq!(config.extension, ".lua");
        assert_eq!(
            config.roots,
            vec![PathBuf::from("Assets/Lua"), PathBuf::from("Assets/Shared")]
        );
        assert_eq!(
            config.enums,
            vec![EnumDecl {
                name: "Team".to_string(),
                values: vec![("Red".to_string(), 0), ("Blue".to_string(), 1)],
            }]
        );
    }

    #[test]
    fn test_defaults() {
        let config = ProjectConfig::from_string("").unwrap();
        assert_eq!(config.extension, DEFAULT_EXTENSION);
        assert!(config.roots.is_empty());
        assert!(config.enums.is_empty());
    }

    #[test]
    fn test_invalid_enum_value() {
        let result = ProjectConfig::from_string(r#"enum "Team" Red="red""#);
        assert!(matches!(result, Err(Error::InvalidConfig(_))));

        let result = ProjectConfig::from_string("enum Red=0");
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_kdl_syntax_error() {
        let result = ProjectConfig::from_string("scripts {");
        assert!(matches!(result, Err(Error::KdlParse(_))));
    }

    #[test]
    fn test_from_file_resolves_relative_roots() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("easylua.kdl");
        std::fs::write(&path, "scripts {\n    root \"Lua\"\n}\n").unwrap();

        let config = ProjectConfig::from_file(&path).unwrap();
        assert_eq!(config.roots, vec![dir.path().join("Lua")]);
    }

    #[test]
    fn test_painters_include_enums() {
        let config = ProjectConfig::from_string(r#"enum "Team" Red=0 Blue=1"#).unwrap();
        let painters = config.painters();
        let param = LuaParam::new("team", "Team").with_value(ParamValue::Enum(1));
        assert!(matches!(painters.paint(&param), Control::Enum { value: 1, .. }));
        assert!(painters.enum_options("Team").is_some());
    }
}
