//! Class metadata, field resolution and linking for annotated Lua scripts
//!
//! This crate provides:
//! - **Lexer**: Parse `---@class` / `---@field` headers into [`ClassMetadata`]
//! - **Resolver**: Flatten inherited fields through a [`SourceLookup`]
//! - **Params**: Typed [`ParamValue`]s, the editor round-trip and painters
//! - **Linker**: Bundle many scripts with their `RegClass` directives
//! - **Lua Host**: Load classes, create instances and push params (feature `lua`)
//!
//! # Example
//!
//! ```rust,ignore
//! use easylua::{ProjectConfig, FieldResolver, merge_params};
//!
//! // Index scripts from the project config
//! let config = ProjectConfig::from_file("easylua.kdl")?;
//! let scripts = config.script_directory()?;
//!
//! // Flattened public fields of a class, bases first
//! let resolved = FieldResolver::new(&scripts).resolve("Enemy")?;
//! let params = merge_params(&saved_params, &resolved.fields);
//!
//! // Hand them to a Lua instance
//! let mut host = LuaHost::new()?;
//! host.load_scripts(scripts.sources()?)?;
//! let enemy = host.new_instance("Enemy", &[])?;
//! host.push_params(enemy, &params, &NoInstances)?;
//! host.call_method(enemy, "start", &[])?;
//! ```

mod config;
mod error;
mod lexer;
mod library;
mod linker;
#[cfg(feature = "lua")]
mod lua_host;
mod painter;
mod param;
mod resolver;
mod token;
mod value;

pub use config::{EnumDecl, ProjectConfig};
pub use error::{Error, Result};
pub use lexer::{class_name_from_file, class_template, is_metadata_comment, ClassMetadata};
pub use library::{ScriptDirectory, DEFAULT_EXTENSION};
pub use linker::{LinkedScriptBundle, ScriptLinker};
#[cfg(feature = "lua")]
pub use lua_host::{Loaded, LuaHost};
pub use painter::{resize_array, Control, Painter, PainterRegistry};
pub use param::{merge_params, params_from_fields, LuaParam, ParamKind};
pub use resolver::{resolve, FieldResolver, ResolvedFields, SourceLookup};
pub use token::{FieldToken, PUBLIC_MODIFIER};
pub use value::{
    BoxedValue, CastValue, InstanceId, InstanceResolver, NoInstances, ObjectId, ObjectRef,
    ParamValue,
};

// Re-export mlua for downstream crates
#[cfg(feature = "lua")]
pub use mlua;
