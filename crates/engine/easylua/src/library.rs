//! Filesystem-backed script lookup
//!
//! A [`ScriptDirectory`] indexes script files under one or more roots by the
//! class name encoded in their file name, and serves them to the resolver.

use crate::{class_name_from_file, ClassMetadata, Error, Result, SourceLookup};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Extension of script files when none is configured
pub const DEFAULT_EXTENSION: &str = ".lua.txt";

/// Index of script files keyed by class name
#[derive(Debug, Clone, Default)]
pub struct ScriptDirectory {
    extension: String,
    scripts: HashMap<String, PathBuf>,
    /// Class names in scan order
    order: Vec<String>,
}

impl ScriptDirectory {
    /// Index every file under `roots` whose name ends in `extension`.
    ///
    /// Roots are scanned in order and directory entries sorted by name, so the
    /// winner among files sharing a class name is stable. Missing roots are
    /// skipped with a warning.
    pub fn scan<I, P>(roots: I, extension: &str) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut dir = Self {
            extension: extension.to_string(),
            ..Default::default()
        };

        for root in roots {
            let root = root.as_ref();
            if !root.is_dir() {
                warn!("Script root {} is not a directory", root.display());
                continue;
            }
            dir.traverse(root)?;
        }

        debug!("Indexed {} scripts", dir.order.len());
        Ok(dir)
    }

    fn traverse(&mut self, dir: &Path) -> Result<()> {
        let mut entries = fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        entries.sort();

        for path in entries {
            if path.is_dir() {
                self.traverse(&path)?;
            } else if path.is_file() {
                self.index_file(path);
            }
        }
        Ok(())
    }

    fn index_file(&mut self, path: PathBuf) {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            return;
        };
        if !file_name.ends_with(&self.extension) {
            return;
        }

        let class_name = class_name_from_file(file_name).to_string();
        if let Some(existing) = self.scripts.get(&class_name) {
            warn!(
                "Duplicate script for class {}: keeping {}, ignoring {}",
                class_name,
                existing.display(),
                path.display()
            );
            return;
        }

        self.order.push(class_name.clone());
        self.scripts.insert(class_name, path);
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Indexed class names in scan order
    pub fn class_names(&self) -> &[String] {
        &self.order
    }

    pub fn path_of(&self, class_name: &str) -> Option<&Path> {
        self.scripts.get(class_name).map(PathBuf::as_path)
    }

    pub fn read_source(&self, class_name: &str) -> Result<String> {
        let path = self
            .path_of(class_name)
            .ok_or_else(|| Error::ScriptNotFound(class_name.to_string()))?;
        Ok(fs::read_to_string(path)?)
    }

    /// Every indexed source in scan order
    pub fn sources(&self) -> Result<Vec<String>> {
        self.order.iter().map(|name| self.read_source(name)).collect()
    }

    /// Parse a class script, checking the declared name against the file name
    pub fn load_class(&self, class_name: &str) -> Result<ClassMetadata> {
        let meta = ClassMetadata::parse(&self.read_source(class_name)?)?;
        if meta.class_name() != class_name {
            return Err(Error::ClassNameMismatch {
                file: class_name.to_string(),
                declared: meta.class_name().to_string(),
            });
        }
        Ok(meta)
    }
}

impl SourceLookup for ScriptDirectory {
    fn find_source(&self, class_name: &str) -> Option<String> {
        match self.read_source(class_name) {
            Ok(source) => Some(source),
            Err(Error::ScriptNotFound(_)) => None,
            Err(e) => {
                warn!("Failed to read script {}: {}", class_name, e);
                None
            }
        }
    }
}
