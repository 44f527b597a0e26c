//! Named script parameters and the editor round-trip

use crate::{CastValue, Error, FieldToken, InstanceResolver, ParamValue, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Editor-facing kind of a declared type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Int,
    Float,
    Bool,
    String,
    Color,
    Vector3,
    Array,
    /// Anything else: enums, host objects, other scripted classes
    Object,
}

impl ParamKind {
    /// Kind of a single (non-array) type name, matched case-insensitively
    pub fn from_type_name(type_name: &str) -> Self {
        match type_name.to_ascii_lowercase().as_str() {
            "number" | "system.int32" => ParamKind::Int,
            "float" | "system.single" => ParamKind::Float,
            "bool" | "system.boolean" => ParamKind::Bool,
            "string" | "system.string" => ParamKind::String,
            "color" | "unityengine.color" => ParamKind::Color,
            "vector3" | "unityengine.vector3" => ParamKind::Vector3,
            _ => ParamKind::Object,
        }
    }
}

/// A script field together with its editable value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LuaParam {
    pub name: String,
    /// Declared type as written, `[]` suffix included
    #[serde(default)]
    type_name: String,
    #[serde(default)]
    pub value: ParamValue,
}

impl LuaParam {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            value: ParamValue::None,
        }
    }

    pub fn from_field(field: &FieldToken) -> Self {
        Self::new(field.name(), field.declared_type())
    }

    pub fn with_value(mut self, value: impl Into<ParamValue>) -> Self {
        self.value = value.into();
        self
    }

    /// Declared type including any `[]` suffix
    pub fn raw_type_name(&self) -> &str {
        &self.type_name
    }

    /// Declared type with the array suffix removed
    pub fn type_name(&self) -> &str {
        self.type_name.strip_suffix("[]").unwrap_or(&self.type_name)
    }

    pub fn set_type_name(&mut self, type_name: impl Into<String>) {
        self.type_name = type_name.into();
    }

    pub fn is_array(&self) -> bool {
        self.type_name.ends_with("[]")
    }

    /// Editor kind from the declared type; never used to pick the cast path
    pub fn kind(&self) -> ParamKind {
        if self.is_array() {
            ParamKind::Array
        } else {
            ParamKind::from_type_name(self.type_name())
        }
    }

    /// Value to push into the script host.
    ///
    /// `Ok(None)` means there is nothing to push (empty array, unresolved
    /// behaviour). A parameter that was never given a value fails with
    /// [`Error::UnknownFieldCast`].
    pub fn cast<R: InstanceResolver + ?Sized>(&self, resolver: &R) -> Result<Option<CastValue>> {
        if self.value.is_none() {
            return Err(Error::UnknownFieldCast {
                field: self.name.clone(),
                type_name: self.type_name.clone(),
            });
        }
        Ok(self.value.cast(resolver))
    }
}

/// One empty parameter per field, first declaration of a name wins
pub fn params_from_fields(fields: &[FieldToken]) -> Vec<LuaParam> {
    let mut seen = HashSet::new();
    fields
        .iter()
        .filter(|f| seen.insert(f.name()))
        .map(LuaParam::from_field)
        .collect()
}

/// Rebuild parameters for a freshly resolved field list, keeping prior values.
///
/// Values are matched by field name; the first previous entry with a name wins.
/// Fields no longer declared are dropped, new fields start empty, and declared
/// types always come from `fields`.
pub fn merge_params(previous: &[LuaParam], fields: &[FieldToken]) -> Vec<LuaParam> {
    let mut prior: HashMap<&str, &LuaParam> = HashMap::new();
    for param in previous {
        prior.entry(param.name.as_str()).or_insert(param);
    }

    let mut params = params_from_fields(fields);
    for param in &mut params {
        if let Some(old) = prior.get(param.name.as_str()) {
            param.value = old.value.clone();
        }
    }
    params
}
