//! Lua host for linked class scripts
//!
//! Provides a caller-owned Lua VM with:
//! - A class prelude (`RegClass`, `NewClass`) with lazy base lookup
//! - Class and bundle loading
//! - Instance tables addressed by [`InstanceId`]
//! - Parameter injection and cached method calls

use crate::{
    CastValue, ClassMetadata, Error, InstanceId, InstanceResolver, LinkedScriptBundle, LuaParam,
    Result,
};
use mlua::prelude::*;
use std::collections::HashMap;
use tracing::{debug, warn};

const PRELUDE: &str = include_str!("prelude.lua");

/// What [`LuaHost::load_class`] did with a source
#[derive(Debug, Clone, PartialEq)]
pub enum Loaded {
    /// Annotated script, executed and registered
    Class(ClassMetadata),
    /// Plain Lua, executed as-is
    Plain,
}

/// Lua VM holding registered classes and their instances
pub struct LuaHost {
    lua: Lua,
    instances: HashMap<InstanceId, LuaTable>,
    methods: HashMap<(InstanceId, String), Option<LuaFunction>>,
    next_id: u64,
}

impl LuaHost {
    /// Create a new host with the class prelude loaded
    pub fn new() -> Result<Self> {
        let lua = Lua::new();
        lua.load(PRELUDE).set_name("=easylua_prelude").exec()?;

        Ok(Self {
            lua,
            instances: HashMap::new(),
            methods: HashMap::new(),
            next_id: 1,
        })
    }

    /// Get the underlying Lua state
    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    /// Execute a Lua string
    pub fn exec_string(&mut self, code: &str) -> Result<()> {
        self.lua.load(code).exec()?;
        // New code may define methods that were cached as missing
        self.methods.clear();
        Ok(())
    }

    /// Get a global value from Lua
    pub fn get_global<T: FromLua>(&self, name: &str) -> Result<T> {
        let value = self.lua.globals().get(name)?;
        Ok(value)
    }

    /// Load one source: annotated scripts are executed then registered,
    /// anything without a class declaration runs as plain Lua
    pub fn load_class(&mut self, source: &str) -> Result<Loaded> {
        match ClassMetadata::parse(source) {
            Ok(meta) => {
                self.lua
                    .load(meta.normalized_script())
                    .set_name(format!("={}", meta.class_name()))
                    .exec()?;
                self.exec_string(&meta.registration_command())?;
                debug!("Registered class {}", meta.class_name());
                Ok(Loaded::Class(meta))
            }
            Err(e) if e.is_not_annotated() => {
                self.exec_string(source)?;
                debug!("Executed plain script ({} bytes)", source.len());
                Ok(Loaded::Plain)
            }
            Err(e) => Err(e),
        }
    }

    /// Load sources in order until the first blank one
    pub fn load_scripts<I, S>(&mut self, sources: I) -> Result<Vec<Loaded>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut loaded = Vec::new();
        for source in sources {
            let source = source.as_ref();
            if source.trim().is_empty() {
                debug!("Blank script, stopping after {} loads", loaded.len());
                break;
            }
            loaded.push(self.load_class(source)?);
        }
        Ok(loaded)
    }

    /// Run the plain scripts of a bundle, then the bundle itself
    pub fn load_bundle(&mut self, linked: &LinkedScriptBundle) -> Result<()> {
        for (i, chunk) in linked.chunks().enumerate() {
            if chunk.trim().is_empty() {
                continue;
            }
            self.lua
                .load(chunk)
                .set_name(format!("=bundle[{}]", i))
                .exec()?;
        }
        self.methods.clear();
        Ok(())
    }

    pub fn is_class_registered(&self, class: &str) -> Result<bool> {
        let check: LuaFunction = self.lua.globals().get("IsClassRegistered")?;
        Ok(check.call(class)?)
    }

    /// Create an instance of a registered class, passing `args` to its `ctor`
    pub fn new_instance(&mut self, class: &str, args: &[CastValue]) -> Result<InstanceId> {
        if !self.is_class_registered(class)? {
            return Err(Error::ScriptNotFound(class.to_string()));
        }

        let mut values = Vec::with_capacity(args.len() + 1);
        values.push(LuaValue::String(self.lua.create_string(class)?));
        for arg in args {
            values.push(self.to_lua(arg)?);
        }

        let new_class: LuaFunction = self.lua.globals().get("NewClass")?;
        let table: LuaTable = new_class.call(LuaMultiValue::from_vec(values))?;

        let id = InstanceId(self.next_id);
        self.next_id += 1;
        self.instances.insert(id, table);
        debug!("Created {} of class {}", id, class);
        Ok(id)
    }

    /// Drop an instance; returns false if it was unknown
    pub fn release_instance(&mut self, instance: InstanceId) -> bool {
        self.methods.retain(|(id, _), _| *id != instance);
        self.instances.remove(&instance).is_some()
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Lua table backing an instance
    pub fn instance(&self, instance: InstanceId) -> Result<&LuaTable> {
        self.instances
            .get(&instance)
            .ok_or(Error::InstanceNotFound(instance.0))
    }

    pub fn set_field(&mut self, instance: InstanceId, name: &str, value: &CastValue) -> Result<()> {
        let value = self.to_lua(value)?;
        self.instance(instance)?.set(name, value)?;
        // A field may shadow a method
        self.methods.remove(&(instance, name.to_string()));
        Ok(())
    }

    pub fn get_field<T: FromLua>(&self, instance: InstanceId, name: &str) -> Result<T> {
        Ok(self.instance(instance)?.get(name)?)
    }

    /// Cast and set every parameter; returns how many fields were pushed
    pub fn push_params<R>(
        &mut self,
        instance: InstanceId,
        params: &[LuaParam],
        resolver: &R,
    ) -> Result<usize>
    where
        R: InstanceResolver + ?Sized,
    {
        let mut pushed = 0;
        for param in params {
            match param.cast(resolver) {
                Ok(Some(value)) => {
                    self.set_field(instance, &param.name, &value)?;
                    pushed += 1;
                }
                Ok(None) => warn!("Skipping field '{}': nothing to push", param.name),
                Err(e) => warn!("Skipping field '{}': {}", param.name, e),
            }
        }
        debug!("Pushed {}/{} params to {}", pushed, params.len(), instance);
        Ok(pushed)
    }

    /// Call `instance:name(args...)` if such a function exists
    pub fn call_method(
        &mut self,
        instance: InstanceId,
        name: &str,
        args: &[CastValue],
    ) -> Result<bool> {
        let table = self.instance(instance)?.clone();
        let key = (instance, name.to_string());
        let func = match self.methods.get(&key) {
            Some(cached) => cached.clone(),
            None => {
                let func = match table.get::<LuaValue>(name)? {
                    LuaValue::Function(f) => Some(f),
                    _ => None,
                };
                self.methods.insert(key, func.clone());
                func
            }
        };

        let Some(func) = func else {
            return Ok(false);
        };

        let mut values = Vec::with_capacity(args.len() + 1);
        values.push(LuaValue::Table(table));
        for arg in args {
            values.push(self.to_lua(arg)?);
        }
        func.call::<()>(LuaMultiValue::from_vec(values))?;
        Ok(true)
    }

    /// Convert a cast value into a Lua value
    fn to_lua(&self, value: &CastValue) -> Result<LuaValue> {
        let value = match value {
            CastValue::Nil => LuaValue::Nil,
            CastValue::Int(i) => LuaValue::Integer(*i),
            CastValue::Float(f) => LuaValue::Number(*f as f64),
            CastValue::Bool(b) => LuaValue::Boolean(*b),
            CastValue::String(s) => LuaValue::String(self.lua.create_string(s)?),
            CastValue::Array(elements) => {
                let table = self.lua.create_table()?;
                for (i, element) in elements.iter().enumerate() {
                    table.raw_set(i + 1, self.to_lua(element)?)?;
                }
                LuaValue::Table(table)
            }
            CastValue::Object(id) => {
                LuaValue::Integer(i64::try_from(id.0).map_err(|_| Error::TypeError {
                    expected: "object id within Lua integer range".to_string(),
                    actual: id.0.to_string(),
                })?)
            }
            CastValue::Instance(id) => LuaValue::Table(self.instance(*id)?.clone()),
            CastValue::Vec3(v) => LuaValue::Table(self.lua.create_sequence_from([v.x, v.y, v.z])?),
            CastValue::Color(c) => {
                LuaValue::Table(self.lua.create_sequence_from([c.x, c.y, c.z, c.w])?)
            }
        };
        Ok(value)
    }
}
