//! Editor controls for script parameters
//!
//! A [`PainterRegistry`] maps raw declared type names to painter functions.
//! Types without a registered painter fall back to the default painter, which
//! picks a control from the parameter's [`ParamKind`].

use crate::{LuaParam, ObjectRef, ParamKind, ParamValue};
use glam::{Vec3, Vec4};
use std::collections::HashMap;

/// Builds the control for one parameter
pub type Painter = fn(&LuaParam, &PainterRegistry) -> Control;

/// Editable control with its current value
#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    Integer { label: String, value: i64 },
    Float { label: String, value: f32 },
    Bool { label: String, value: bool },
    Text { label: String, value: String },
    Enum {
        label: String,
        value: i32,
        options: Vec<(String, i32)>,
    },
    Array { label: String, elements: Vec<Control> },
    Object {
        label: String,
        type_name: String,
        value: Option<ObjectRef>,
    },
    Vector3 { label: String, value: Vec3 },
    Color { label: String, value: Vec4 },
}

impl Control {
    pub fn label(&self) -> &str {
        match self {
            Control::Integer { label, .. }
            | Control::Float { label, .. }
            | Control::Bool { label, .. }
            | Control::Text { label, .. }
            | Control::Enum { label, .. }
            | Control::Array { label, .. }
            | Control::Object { label, .. }
            | Control::Vector3 { label, .. }
            | Control::Color { label, .. } => label,
        }
    }

    /// Value the control currently shows, for writing an edit back
    pub fn to_value(&self) -> ParamValue {
        match self {
            Control::Integer { value, .. } => ParamValue::Int(*value),
            Control::Float { value, .. } => ParamValue::Float(*value),
            Control::Bool { value, .. } => ParamValue::Bool(*value),
            Control::Text { value, .. } => ParamValue::String(value.clone()),
            Control::Enum { value, .. } => ParamValue::Enum(*value),
            Control::Array { elements, .. } => {
                ParamValue::Array(elements.iter().map(Control::to_value).collect())
            }
            Control::Object { value, .. } => value.map(ParamValue::Object).unwrap_or_default(),
            Control::Vector3 { value, .. } => ParamValue::from(*value),
            Control::Color { value, .. } => ParamValue::Boxed(crate::BoxedValue::Color(*value)),
        }
    }
}

/// Registry of painters keyed by raw declared type name
#[derive(Debug, Clone, Default)]
pub struct PainterRegistry {
    painters: HashMap<String, Painter>,
    enums: HashMap<String, Vec<(String, i32)>>,
}

impl PainterRegistry {
    /// Empty registry; every type uses the default painter
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in vector and colour painters
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("UnityEngine.Vector3", paint_vector3);
        registry.register("UnityEngine.Color", paint_color);
        registry
    }

    pub fn register(&mut self, type_name: impl Into<String>, painter: Painter) {
        self.painters.insert(type_name.into(), painter);
    }

    /// Register an enum type with its named values
    pub fn register_enum(&mut self, type_name: impl Into<String>, options: Vec<(String, i32)>) {
        let type_name = type_name.into();
        self.painters.insert(type_name.clone(), paint_enum);
        self.enums.insert(type_name, options);
    }

    pub fn enum_options(&self, type_name: &str) -> Option<&[(String, i32)]> {
        self.enums.get(type_name).map(Vec::as_slice)
    }

    pub fn painter_for(&self, raw_type_name: &str) -> Painter {
        self.painters
            .get(raw_type_name)
            .copied()
            .unwrap_or(paint_default)
    }

    pub fn paint(&self, param: &LuaParam) -> Control {
        (self.painter_for(param.raw_type_name()))(param, self)
    }

    pub fn paint_all(&self, params: &[LuaParam]) -> Vec<Control> {
        params.iter().map(|p| self.paint(p)).collect()
    }
}

/// Grow or shrink an array parameter; new slots start empty
pub fn resize_array(param: &mut LuaParam, len: usize) {
    param.value.array_mut().resize(len, ParamValue::None);
}

fn paint_default(param: &LuaParam, registry: &PainterRegistry) -> Control {
    let label = param.name.clone();
    let value = &param.value;
    match param.kind() {
        ParamKind::Int => Control::Integer {
            label,
            value: value.as_int().unwrap_or_default(),
        },
        ParamKind::Float => Control::Float {
            label,
            value: value.as_float().unwrap_or_default(),
        },
        ParamKind::Bool => Control::Bool {
            label,
            value: value.as_bool().unwrap_or_default(),
        },
        ParamKind::String => Control::Text {
            label,
            value: value.as_str().unwrap_or_default().to_string(),
        },
        ParamKind::Color => paint_color(param, registry),
        ParamKind::Vector3 => paint_vector3(param, registry),
        ParamKind::Array => paint_array(param, registry),
        ParamKind::Object => Control::Object {
            label,
            type_name: param.type_name().to_string(),
            value: value.as_object().ok(),
        },
    }
}

fn paint_array(param: &LuaParam, registry: &PainterRegistry) -> Control {
    let elements = param
        .value
        .as_array()
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let element = LuaParam::new(format!("element{}", i), param.type_name())
                .with_value(value.clone());
            registry.paint(&element)
        })
        .collect();

    Control::Array {
        label: param.name.clone(),
        elements,
    }
}

fn paint_enum(param: &LuaParam, registry: &PainterRegistry) -> Control {
    let options = registry
        .enum_options(param.type_name())
        .map(<[_]>::to_vec)
        .unwrap_or_default();
    let value = param
        .value
        .as_enum()
        .ok()
        .or_else(|| options.first().map(|(_, v)| *v))
        .unwrap_or_default();

    Control::Enum {
        label: param.name.clone(),
        value,
        options,
    }
}

fn paint_vector3(param: &LuaParam, _registry: &PainterRegistry) -> Control {
    Control::Vector3 {
        label: param.name.clone(),
        value: param.value.as_vec3().unwrap_or(Vec3::ZERO),
    }
}

fn paint_color(param: &LuaParam, _registry: &PainterRegistry) -> Control {
    Control::Color {
        label: param.name.clone(),
        value: param.value.as_color().unwrap_or(Vec4::ONE),
    }
}
