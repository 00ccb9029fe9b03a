//! The process registry: every declaration of one configuration, in order.

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::core::error::ConfigError;
use crate::core::invariants::{check_process, unknown_selected_paths};
use crate::core::module::{ModuleDescriptor, ModuleRole, PathDef, PathKind};
use crate::core::path::ensure_valid_name;
use crate::core::pset::ParameterSet;

/// Label under which the (single) source is registered.
pub const SOURCE_LABEL: &str = "source";

/// A process under construction.
///
/// Modules, top-level parameter sets and path definitions share a single
/// label namespace. A process with an empty name is a fragment: it can be
/// loaded into another process but not finalized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Process {
    name: String,
    source: Option<ModuleDescriptor>,
    modules: IndexMap<String, ModuleDescriptor>,
    psets: IndexMap<String, ParameterSet>,
    paths: IndexMap<String, PathDef>,
}

impl Process {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn fragment() -> Self {
        Self::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_fragment(&self) -> bool {
        self.name.is_empty()
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), ConfigError> {
        let name = name.into();
        ensure_valid_name(&name)?;
        self.name = name;
        Ok(())
    }

    pub fn source(&self) -> Option<&ModuleDescriptor> {
        self.source.as_ref()
    }

    pub fn source_mut(&mut self) -> Option<&mut ModuleDescriptor> {
        self.source.as_mut()
    }

    pub fn set_source(&mut self, source: ModuleDescriptor) -> Result<(), ConfigError> {
        if source.role != ModuleRole::Source {
            return Err(ConfigError::RoleMismatch {
                label: SOURCE_LABEL.to_string(),
                expected: "source",
                found: source.role,
            });
        }
        ensure_valid_name(&source.type_name)?;
        if self.source.is_some() {
            return Err(ConfigError::DuplicateName {
                path: SOURCE_LABEL.to_string(),
            });
        }
        debug!(type_name = %source.type_name, "registered source");
        self.source = Some(source);
        Ok(())
    }

    pub fn add_module(
        &mut self,
        label: impl Into<String>,
        module: ModuleDescriptor,
    ) -> Result<(), ConfigError> {
        let label = label.into();
        self.ensure_free(&label)?;
        if module.role == ModuleRole::Source {
            return Err(ConfigError::RoleMismatch {
                label,
                expected: "producer, filter, analyzer or output",
                found: module.role,
            });
        }
        ensure_valid_name(&module.type_name)?;
        debug!(%label, role = %module.role, type_name = %module.type_name, "registered module");
        self.modules.insert(label, module);
        Ok(())
    }

    /// Register a named top-level parameter set (`options`, shared templates).
    pub fn add_pset(
        &mut self,
        name: impl Into<String>,
        set: ParameterSet,
    ) -> Result<(), ConfigError> {
        let name = name.into();
        self.ensure_free(&name)?;
        debug!(%name, entries = set.len(), "registered parameter set");
        self.psets.insert(name, set);
        Ok(())
    }

    pub fn add_path(&mut self, path: PathDef) -> Result<(), ConfigError> {
        self.ensure_free(&path.name)?;
        for entry in &path.entries {
            ensure_valid_name(entry)?;
        }
        debug!(name = %path.name, kind = %path.kind, entries = path.entries.len(), "registered path");
        self.paths.insert(path.name.clone(), path);
        Ok(())
    }

    pub fn module(&self, label: &str) -> Option<&ModuleDescriptor> {
        self.modules.get(label)
    }

    pub fn module_mut(&mut self, label: &str) -> Option<&mut ModuleDescriptor> {
        self.modules.get_mut(label)
    }

    pub fn modules(&self) -> impl Iterator<Item = (&str, &ModuleDescriptor)> {
        self.modules.iter().map(|(label, module)| (label.as_str(), module))
    }

    pub fn pset(&self, name: &str) -> Option<&ParameterSet> {
        self.psets.get(name)
    }

    pub fn pset_mut(&mut self, name: &str) -> Option<&mut ParameterSet> {
        self.psets.get_mut(name)
    }

    pub fn psets(&self) -> impl Iterator<Item = (&str, &ParameterSet)> {
        self.psets.iter().map(|(name, set)| (name.as_str(), set))
    }

    pub fn path(&self, name: &str) -> Option<&PathDef> {
        self.paths.get(name)
    }

    pub fn path_mut(&mut self, name: &str) -> Option<&mut PathDef> {
        self.paths.get_mut(name)
    }

    pub fn paths(&self) -> impl Iterator<Item = &PathDef> {
        self.paths.values()
    }

    /// Merge a fragment's declarations into this process.
    ///
    /// All-or-nothing: on a clash nothing from the fragment is kept. The
    /// fragment's own name, if any, is ignored.
    pub fn load(&mut self, fragment: Process) -> Result<(), ConfigError> {
        let mut merged = self.clone();
        for (name, set) in fragment.psets {
            merged.add_pset(name, set)?;
        }
        if let Some(source) = fragment.source {
            merged.set_source(source)?;
        }
        for (label, module) in fragment.modules {
            merged.add_module(label, module)?;
        }
        for (_, path) in fragment.paths {
            merged.add_path(path)?;
        }
        *self = merged;
        Ok(())
    }

    /// All finalization problems, in declaration order.
    pub fn check(&self) -> Vec<ConfigError> {
        check_process(self)
    }

    /// Freeze the process for hand-off to the engine.
    ///
    /// Fails with the first problem [`Process::check`] reports.
    pub fn finalize(self) -> Result<FinalizedProcess, ConfigError> {
        if let Some(first) = self.check().into_iter().next() {
            return Err(first);
        }
        for (label, path) in unknown_selected_paths(&self) {
            warn!(module = %label, path = %path, "SelectEvents refers to a path this process does not define");
        }
        debug!(
            process = %self.name,
            modules = self.modules.len(),
            paths = self.paths.len(),
            "process finalized"
        );
        Ok(FinalizedProcess { process: self })
    }

    fn ensure_free(&self, label: &str) -> Result<(), ConfigError> {
        ensure_valid_name(label)?;
        let taken = label == SOURCE_LABEL
            || self.modules.contains_key(label)
            || self.psets.contains_key(label)
            || self.paths.contains_key(label);
        if taken {
            return Err(ConfigError::DuplicateName {
                path: label.to_string(),
            });
        }
        Ok(())
    }
}

/// A read-only process whose references are known to resolve.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizedProcess {
    process: Process,
}

impl FinalizedProcess {
    pub fn process(&self) -> &Process {
        &self.process
    }

    pub fn name(&self) -> &str {
        self.process.name()
    }

    /// Module labels a path runs, with sequences expanded in place.
    pub fn schedule(&self, name: &str) -> Option<Vec<&str>> {
        let def = self.process.path(name)?;
        let mut labels = Vec::new();
        self.expand(def, &mut labels);
        Some(labels)
    }

    /// Every path and endpath (not sequences) with its expanded schedule.
    pub fn schedules(&self) -> Vec<(&PathDef, Vec<&str>)> {
        self.process
            .paths()
            .filter(|def| def.kind != PathKind::Sequence)
            .map(|def| {
                let mut labels = Vec::new();
                self.expand(def, &mut labels);
                (def, labels)
            })
            .collect()
    }

    fn expand<'a>(&'a self, def: &'a PathDef, labels: &mut Vec<&'a str>) {
        for entry in &def.entries {
            match self.process.path(entry) {
                Some(inner) if inner.kind == PathKind::Sequence => self.expand(inner, labels),
                _ => labels.push(entry.as_str()),
            }
        }
    }
}
