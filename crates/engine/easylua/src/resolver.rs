//! Inherited field resolution
//!
//! Walks a class's base chain through a [`SourceLookup`] and flattens the
//! public fields root-first. A base whose source cannot be found ends the walk
//! without failing; a chain that revisits a class is reported as
//! [`Error::BaseClassCycle`].

use crate::{ClassMetadata, Error, FieldToken, Result};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Name-based source lookup for class scripts
pub trait SourceLookup {
    /// Source text of the script declaring `class_name`, if any
    fn find_source(&self, class_name: &str) -> Option<String>;
}

impl<F> SourceLookup for F
where
    F: Fn(&str) -> Option<String>,
{
    fn find_source(&self, class_name: &str) -> Option<String> {
        self(class_name)
    }
}

impl SourceLookup for HashMap<String, String> {
    fn find_source(&self, class_name: &str) -> Option<String> {
        self.get(class_name).cloned()
    }
}

/// Flattened field list for a class
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedFields {
    /// Fields root class first, duplicates collapsed to the first occurrence
    pub fields: Vec<FieldToken>,
    /// Classes visited, root first
    pub chain: Vec<String>,
    /// Class whose source the lookup could not find, if the walk stopped early
    pub missing: Option<String>,
}

impl ResolvedFields {
    /// Field names in resolution order
    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name()).collect()
    }

    /// Fail with [`Error::BaseClassNotFound`] if the walk stopped early
    pub fn require_complete(self) -> Result<Self> {
        match self.missing {
            Some(name) => Err(Error::BaseClassNotFound(name)),
            None => Ok(self),
        }
    }
}

/// Resolve the flattened fields of `class_name`
pub fn resolve<L: SourceLookup + ?Sized>(class_name: &str, lookup: &L) -> Result<ResolvedFields> {
    FieldResolver::new(lookup).resolve(class_name)
}

/// Field resolver over a source lookup
pub struct FieldResolver<'a, L: SourceLookup + ?Sized> {
    lookup: &'a L,
}

impl<'a, L: SourceLookup + ?Sized> FieldResolver<'a, L> {
    pub fn new(lookup: &'a L) -> Self {
        Self { lookup }
    }

    /// Resolve a class by name. An empty name resolves to no fields.
    pub fn resolve(&self, class_name: &str) -> Result<ResolvedFields> {
        let mut chain = Vec::new();
        let mut visited = Vec::new();
        let missing = self.walk(Some(class_name.to_string()), &mut visited, &mut chain)?;
        Ok(flatten(chain, missing))
    }

    /// Resolve a script already parsed by the caller; only its bases go through the lookup
    pub fn resolve_script(&self, meta: &ClassMetadata) -> Result<ResolvedFields> {
        let mut chain = vec![meta.clone()];
        let mut visited = vec![meta.class_name().to_string()];
        let base = meta.base_class_name().map(str::to_string);
        let missing = self.walk(base, &mut visited, &mut chain)?;
        Ok(flatten(chain, missing))
    }

    /// True if `ancestor` appears among the bases of `class_name`.
    /// A class is not a subclass of itself; an unknown class is a subclass of nothing.
    pub fn is_subclass_of(&self, class_name: &str, ancestor: &str) -> Result<bool> {
        let mut visited: Vec<String> = Vec::new();
        let mut current = class_name.to_string();

        loop {
            if visited.contains(&current) {
                visited.push(current);
                return Err(Error::BaseClassCycle { chain: visited });
            }
            let Some(source) = self.lookup.find_source(&current) else {
                return Ok(false);
            };
            let meta = ClassMetadata::parse(&source)?;
            visited.push(current);

            match meta.base_class_name() {
                Some(base) if base == ancestor => return Ok(true),
                Some(base) => current = base.to_string(),
                None => return Ok(false),
            }
        }
    }

    // Collects metadata leaf-first; returns the class the lookup missed, if any
    fn walk(
        &self,
        mut next: Option<String>,
        visited: &mut Vec<String>,
        chain: &mut Vec<ClassMetadata>,
    ) -> Result<Option<String>> {
        while let Some(name) = next.take().filter(|n| !n.trim().is_empty()) {
            if visited.contains(&name) {
                let mut cycle = visited.clone();
                cycle.push(name);
                return Err(Error::BaseClassCycle { chain: cycle });
            }

            let Some(source) = self.lookup.find_source(&name) else {
                warn!("Source for class '{}' not found, stopping field resolution", name);
                return Ok(Some(name));
            };

            let meta = ClassMetadata::parse(&source)?;
            if meta.class_name() != name {
                warn!(
                    "Lookup for '{}' returned a script declaring '{}'",
                    name,
                    meta.class_name()
                );
            }

            next = meta.base_class_name().map(str::to_string);
            visited.push(name);
            chain.push(meta);
        }
        Ok(None)
    }
}

fn flatten(chain: Vec<ClassMetadata>, missing: Option<String>) -> ResolvedFields {
    let mut seen = HashSet::new();
    let mut fields = Vec::new();
    let mut names = Vec::with_capacity(chain.len());

    for meta in chain.iter().rev() {
        names.push(meta.class_name().to_string());
        for field in meta.fields() {
            if seen.insert(field.name().to_string()) {
                fields.push(field.clone());
            } else {
                debug!(
                    "Field '{}' of '{}' shadowed by an earlier declaration",
                    field.name(),
                    meta.class_name()
                );
            }
        }
    }

    ResolvedFields {
        fields,
        chain: names,
        missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(name, source)| (name.to_string(), source.to_string()))
            .collect()
    }

    #[test]
    fn test_base_fields_first() {
        let lib = library(&[
            ("Unit", "---@class Unit\n---@field public speed number\nUnit={}"),
            (
                "Enemy",
                "---@class Enemy: Unit\n---@field public hp number\n---@field public name string\nEnemy = {}",
            ),
        ]);
        let resolved = resolve("Enemy", &lib).unwrap();
        assert_eq!(resolved.names(), vec!["speed", "hp", "name"]);
        assert_eq!(resolved.chain, vec!["Unit", "Enemy"]);
        assert_eq!(resolved.missing, None);
    }

    #[test]
    fn test_empty_class_name() {
        let lib = library(&[]);
        let resolved = resolve("", &lib).unwrap();
        assert!(resolved.fields.is_empty());
        assert!(resolved.chain.is_empty());
    }

    #[test]
    fn test_missing_base_degrades() {
        let lib = library(&[(
            "Enemy",
            "---@class Enemy: Unit\n---@field public hp number\nEnemy = {}",
        )]);
        let resolved = resolve("Enemy", &lib).unwrap();
        assert_eq!(resolved.names(), vec!["hp"]);
        assert_eq!(resolved.missing.as_deref(), Some("Unit"));
        assert!(matches!(
            resolved.require_complete(),
            Err(Error::BaseClassNotFound(name)) if name == "Unit"
        ));
    }

    #[test]
    fn test_two_class_cycle() {
        let lib = library(&[
            ("A", "---@class A: B\nA = {}"),
            ("B", "---@class B: A\nB = {}"),
        ]);
        match resolve("A", &lib).unwrap_err() {
            Error::BaseClassCycle { chain } => assert_eq!(chain, vec!["A", "B", "A"]),
            other => panic!("Expected BaseClassCycle, got {:?}", other),
        }
    }

    #[test]
    fn test_self_base_reports_cycle() {
        let lib = library(&[("Loop", "---@class Loop: Loop\nLoop = {}")]);
        assert!(matches!(
            resolve("Loop", &lib),
            Err(Error::BaseClassCycle { .. })
        ));
    }

    #[test]
    fn test_duplicates_keep_first() {
        let lib = library(&[
            ("Base", "---@class Base\n---@field public hp number\nBase = {}"),
            (
                "Child",
                "---@class Child: Base\n---@field public hp float\n---@field public mp number\n---@field public mp string\nChild = {}",
            ),
        ]);
        let resolved = resolve("Child", &lib).unwrap();
        assert_eq!(resolved.names(), vec!["hp", "mp"]);
        assert_eq!(resolved.fields[0].declared_type(), "number");
        assert_eq!(resolved.fields[1].declared_type(), "number");
    }

    #[test]
    fn test_resolve_script_uses_lookup_for_bases_only() {
        let lookup = |name: &str| match name {
            "Unit" => Some("---@class Unit\n---@field public speed number\nUnit={}".to_string()),
            _ => None,
        };
        let meta = ClassMetadata::parse("---@class Hero: Unit\n---@field public level number\nHero = {}")
            .unwrap();
        let resolved = FieldResolver::new(&lookup).resolve_script(&meta).unwrap();
        assert_eq!(resolved.names(), vec!["speed", "level"]);
    }

    #[test]
    fn test_is_subclass_of() {
        let lib = library(&[
            ("Unit", "---@class Unit\nUnit = {}"),
            ("Enemy", "---@class Enemy: Unit\nEnemy = {}"),
            ("Boss", "---@class Boss: Enemy\nBoss = {}"),
        ]);
        let resolver = FieldResolver::new(&lib);
        assert!(resolver.is_subclass_of("Boss", "Unit").unwrap());
        assert!(resolver.is_subclass_of("Boss", "Enemy").unwrap());
        assert!(!resolver.is_subclass_of("Unit", "Boss").unwrap());
        assert!(!resolver.is_subclass_of("Unit", "Unit").unwrap());
        assert!(!resolver.is_subclass_of("Ghost", "Unit").unwrap());
    }

    #[test]
    fn test_is_subclass_of_cycle() {
        let lib = library(&[
            ("A", "---@class A: B\nA = {}"),
            ("B", "---@class B: A\nB = {}"),
        ]);
        let resolver = FieldResolver::new(&lib);

        match resolver.is_subclass_of("A", "Missing").unwrap_err() {
            Error::BaseClassCycle { chain } => assert_eq!(chain, vec!["A", "B", "A"]),
            other => panic!("Expected BaseClassCycle, got {:?}", other),
        }
        // The ancestor is found before the cycle closes
        assert!(resolver.is_subclass_of("A", "B").unwrap());
    }
}
