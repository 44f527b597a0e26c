//! Typed parameter values
//!
//! A [`ParamValue`] holds exactly one active representation. Setting a new one
//! replaces the old, and [`ParamValue::cast`] turns the active representation
//! into the [`CastValue`] handed to the script host.

use crate::{Error, Result};
use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Handle to an object owned by the host engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

/// Handle to a script-level instance table owned by the script host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(pub u64);

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "instance#{}", self.0)
    }
}

/// Reference to an external object stored in a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectRef {
    /// Plain host object, passed through as-is
    Native(ObjectId),
    /// Scripted behaviour; unwrapped to its script instance before injection
    Behaviour(ObjectId),
}

/// Built-in value types stored by value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoxedValue {
    Vec3(Vec3),
    /// RGBA
    Color(Vec4),
}

/// Maps scripted behaviours to their script instances
pub trait InstanceResolver {
    fn script_instance(&self, behaviour: ObjectId) -> Option<InstanceId>;
}

impl InstanceResolver for HashMap<ObjectId, InstanceId> {
    fn script_instance(&self, behaviour: ObjectId) -> Option<InstanceId> {
        self.get(&behaviour).copied()
    }
}

/// Resolver for hosts without scripted behaviours
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInstances;

impl InstanceResolver for NoInstances {
    fn script_instance(&self, _behaviour: ObjectId) -> Option<InstanceId> {
        None
    }
}

/// A parameter value with one active representation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ParamValue {
    /// No value set
    #[default]
    None,
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f32),
    /// Boolean value
    Bool(bool),
    /// String value
    String(String),
    /// Enum value by its integer representation
    Enum(i32),
    /// Element values; elements may themselves be `None`
    Array(Vec<ParamValue>),
    /// Reference to a host object or scripted behaviour
    Object(ObjectRef),
    /// Vector or colour stored by value
    Boxed(BoxedValue),
}

/// Value form handed to the script host
#[derive(Debug, Clone, PartialEq)]
pub enum CastValue {
    /// Hole inside an array
    Nil,
    /// Lua integer; enums cast to this too
    Int(i64),
    /// Lua number
    Float(f32),
    /// Lua boolean
    Bool(bool),
    /// Lua string
    String(String),
    /// 1-based sequence table
    Array(Vec<CastValue>),
    /// Host object handle, passed through
    Object(ObjectId),
    /// Script instance table of a resolved behaviour
    Instance(InstanceId),
    /// `{x, y, z}` sequence
    Vec3(Vec3),
    /// `{r, g, b, a}` sequence
    Color(Vec4),
}

impl ParamValue {
    /// Name of the active representation
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::None => "none",
            ParamValue::Int(_) => "int",
            ParamValue::Float(_) => "float",
            ParamValue::Bool(_) => "bool",
            ParamValue::String(_) => "string",
            ParamValue::Enum(_) => "enum",
            ParamValue::Array(_) => "array",
            ParamValue::Object(_) => "object",
            ParamValue::Boxed(BoxedValue::Vec3(_)) => "vec3",
            ParamValue::Boxed(BoxedValue::Color(_)) => "color",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, ParamValue::None)
    }

    pub fn clear(&mut self) {
        *self = ParamValue::None;
    }

    pub fn set_int(&mut self, value: i64) {
        *self = ParamValue::Int(value);
    }

    pub fn set_float(&mut self, value: f32) {
        *self = ParamValue::Float(value);
    }

    pub fn set_bool(&mut self, value: bool) {
        *self = ParamValue::Bool(value);
    }

    pub fn set_string(&mut self, value: impl Into<String>) {
        *self = ParamValue::String(value.into());
    }

    pub fn set_enum(&mut self, value: i32) {
        *self = ParamValue::Enum(value);
    }

    pub fn set_array(&mut self, values: Vec<ParamValue>) {
        *self = ParamValue::Array(values);
    }

    pub fn set_object(&mut self, object: ObjectRef) {
        *self = ParamValue::Object(object);
    }

    pub fn set_boxed(&mut self, value: BoxedValue) {
        *self = ParamValue::Boxed(value);
    }

    fn type_error(&self, expected: &str) -> Error {
        Error::TypeError {
            expected: expected.to_string(),
            actual: self.type_name().to_string(),
        }
    }

    pub fn as_int(&self) -> Result<i64> {
        match self {
            ParamValue::Int(i) => Ok(*i),
            _ => Err(self.type_error("int")),
        }
    }

    pub fn as_float(&self) -> Result<f32> {
        match self {
            ParamValue::Float(f) => Ok(*f),
            _ => Err(self.type_error("float")),
        }
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            ParamValue::Bool(b) => Ok(*b),
            _ => Err(self.type_error("bool")),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self {
            ParamValue::String(s) => Ok(s.as_str()),
            _ => Err(self.type_error("string")),
        }
    }

    pub fn as_enum(&self) -> Result<i32> {
        match self {
            ParamValue::Enum(e) => Ok(*e),
            _ => Err(self.type_error("enum")),
        }
    }

    pub fn as_array(&self) -> Result<&[ParamValue]> {
        match self {
            ParamValue::Array(arr) => Ok(arr.as_slice()),
            _ => Err(self.type_error("array")),
        }
    }

    /// Mutable array elements, turning the value into an empty array first if needed
    pub fn array_mut(&mut self) -> &mut Vec<ParamValue> {
        if !matches!(self, ParamValue::Array(_)) {
            *self = ParamValue::Array(Vec::new());
        }
        match self {
            ParamValue::Array(arr) => arr,
            _ => unreachable!("value was just set to an array"),
        }
    }

    pub fn as_object(&self) -> Result<ObjectRef> {
        match self {
            ParamValue::Object(o) => Ok(*o),
            _ => Err(self.type_error("object")),
        }
    }

    pub fn as_vec3(&self) -> Result<Vec3> {
        match self {
            ParamValue::Boxed(BoxedValue::Vec3(v)) => Ok(*v),
            _ => Err(self.type_error("vec3")),
        }
    }

    pub fn as_color(&self) -> Result<Vec4> {
        match self {
            ParamValue::Boxed(BoxedValue::Color(c)) => Ok(*c),
            _ => Err(self.type_error("color")),
        }
    }

    /// Host representation of the active value.
    ///
    /// Returns `None` when there is nothing to hand over: no value set, an empty
    /// array, or a behaviour reference the resolver cannot map to an instance.
    /// Array elements without a value become [`CastValue::Nil`].
    pub fn cast<R: InstanceResolver + ?Sized>(&self, resolver: &R) -> Option<CastValue> {
        match self {
            ParamValue::None => None,
            ParamValue::Int(i) => Some(CastValue::Int(*i)),
            ParamValue::Float(f) => Some(CastValue::Float(*f)),
            ParamValue::Bool(b) => Some(CastValue::Bool(*b)),
            ParamValue::String(s) => Some(CastValue::String(s.clone())),
            ParamValue::Enum(e) => Some(CastValue::Int(*e as i64)),
            ParamValue::Array(arr) if arr.is_empty() => None,
            ParamValue::Array(arr) => Some(CastValue::Array(
                arr.iter()
                    .map(|v| v.cast(resolver).unwrap_or(CastValue::Nil))
                    .collect(),
            )),
            ParamValue::Object(ObjectRef::Native(id)) => Some(CastValue::Object(*id)),
            ParamValue::Object(ObjectRef::Behaviour(id)) => {
                resolver.script_instance(*id).map(CastValue::Instance)
            }
            ParamValue::Boxed(BoxedValue::Vec3(v)) => Some(CastValue::Vec3(*v)),
            ParamValue::Boxed(BoxedValue::Color(c)) => Some(CastValue::Color(*c)),
        }
    }
}

// Conversion from common types

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

impl From<i32> for ParamValue {
    fn from(i: i32) -> Self {
        ParamValue::Int(i as i64)
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        ParamValue::Int(i)
    }
}

impl From<f32> for ParamValue {
    fn from(f: f32) -> Self {
        ParamValue::Float(f)
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::String(s)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::String(s.to_string())
    }
}

impl From<Vec3> for ParamValue {
    fn from(v: Vec3) -> Self {
        ParamValue::Boxed(BoxedValue::Vec3(v))
    }
}

impl From<ObjectRef> for ParamValue {
    fn from(o: ObjectRef) -> Self {
        ParamValue::Object(o)
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(v: Vec<T>) -> Self {
        ParamValue::Array(v.into_iter().map(Into::into).collect())
    }
}
