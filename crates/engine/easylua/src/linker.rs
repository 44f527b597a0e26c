//! Links many scripts into a single host load
//!
//! Annotated scripts are concatenated into one bundle, each body followed by
//! its `RegClass` directive. Plain Lua sources are kept aside, untouched, for
//! direct execution.

use crate::{ClassMetadata, Result};
use tracing::{debug, error};

/// Output of a [`ScriptLinker`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkedScriptBundle {
    /// Normalized class bodies and registration directives in append order
    pub bundle: String,
    /// Sources that carry no class declaration
    pub plain_scripts: Vec<String>,
}

impl LinkedScriptBundle {
    /// Chunks in execution order: plain scripts first, then the bundle
    pub fn chunks(&self) -> impl Iterator<Item = &str> {
        self.plain_scripts
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.bundle.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.bundle.is_empty() && self.plain_scripts.is_empty()
    }
}

/// Accumulates scripts into a [`LinkedScriptBundle`]
#[derive(Debug, Default)]
pub struct ScriptLinker {
    linked: LinkedScriptBundle,
    classes: Vec<String>,
}

impl ScriptLinker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one source.
    ///
    /// Sources without a class declaration go to the plain list. Every other
    /// failure, such as an empty source or a self-inheriting class, is returned.
    pub fn add_script(&mut self, source: &str) -> Result<()> {
        match ClassMetadata::parse(source) {
            Ok(meta) => {
                debug!("Linking class {}", meta.class_name());
                self.append(&meta);
                Ok(())
            }
            Err(e) if e.is_not_annotated() => {
                debug!("Queueing plain script ({} bytes)", source.len());
                self.linked.plain_scripts.push(source.to_string());
                Ok(())
            }
            Err(e) => {
                error!("Failed to link script: {}", e);
                Err(e)
            }
        }
    }

    /// Add many sources, stopping at the first error
    pub fn add_scripts<I, S>(&mut self, sources: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for source in sources {
            self.add_script(source.as_ref())?;
        }
        Ok(())
    }

    fn append(&mut self, meta: &ClassMetadata) {
        let bundle = &mut self.linked.bundle;
        bundle.push('\n');
        bundle.push_str(meta.normalized_script());
        if !bundle.ends_with('\n') {
            bundle.push('\n');
        }
        // The directive takes the class table defined by the body above
        bundle.push_str(&meta.registration_command());
        bundle.push('\n');
        self.classes.push(meta.class_name().to_string());
    }

    /// Snapshot of everything linked so far
    pub fn linked_bundle(&self) -> LinkedScriptBundle {
        self.linked.clone()
    }

    /// Names of linked classes in append order
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Drop the bundle, the plain scripts and the class list
    pub fn clear(&mut self) {
        self.linked = LinkedScriptBundle::default();
        self.classes.clear();
    }
}
