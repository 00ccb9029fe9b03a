//! Module descriptors and path definitions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::error::ConfigError;
use crate::core::pset::ParameterSet;

/// What the engine does with a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleRole {
    Source,
    Producer,
    Filter,
    Analyzer,
    Output,
}

impl ModuleRole {
    pub const ALL: [ModuleRole; 5] = [
        ModuleRole::Source,
        ModuleRole::Producer,
        ModuleRole::Filter,
        ModuleRole::Analyzer,
        ModuleRole::Output,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            ModuleRole::Source => "source",
            ModuleRole::Producer => "producer",
            ModuleRole::Filter => "filter",
            ModuleRole::Analyzer => "analyzer",
            ModuleRole::Output => "output",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<ModuleRole> {
        ModuleRole::ALL
            .into_iter()
            .find(|role| role.keyword() == keyword)
    }
}

impl fmt::Display for ModuleRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A configured processing step: engine-side type name, role, and its
/// exclusively owned parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    pub role: ModuleRole,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub params: ParameterSet,
}

impl ModuleDescriptor {
    pub fn new(role: ModuleRole, type_name: impl Into<String>, params: ParameterSet) -> Self {
        Self {
            role,
            type_name: type_name.into(),
            params,
        }
    }

    pub fn source(type_name: impl Into<String>, params: ParameterSet) -> Self {
        Self::new(ModuleRole::Source, type_name, params)
    }

    pub fn producer(type_name: impl Into<String>, params: ParameterSet) -> Self {
        Self::new(ModuleRole::Producer, type_name, params)
    }

    pub fn filter(type_name: impl Into<String>, params: ParameterSet) -> Self {
        Self::new(ModuleRole::Filter, type_name, params)
    }

    pub fn analyzer(type_name: impl Into<String>, params: ParameterSet) -> Self {
        Self::new(ModuleRole::Analyzer, type_name, params)
    }

    pub fn output(type_name: impl Into<String>, params: ParameterSet) -> Self {
        Self::new(ModuleRole::Output, type_name, params)
    }

    /// Copy this descriptor and overlay `overrides` on the copy's parameters.
    pub fn clone_with(&self, overrides: ParameterSet) -> Self {
        let mut copy = self.clone();
        copy.params.apply_overrides(overrides);
        copy
    }

    /// Names of the paths an output module's `SelectEvents` gate refers to.
    ///
    /// Empty for other roles or when no gate is configured.
    pub fn selected_paths(&self) -> Vec<&str> {
        if self.role != ModuleRole::Output {
            return Vec::new();
        }
        self.params
            .vstring_at("SelectEvents.SelectEvents")
            .map(|paths| paths.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathKind {
    Path,
    EndPath,
    Sequence,
}

impl PathKind {
    pub fn keyword(self) -> &'static str {
        match self {
            PathKind::Path => "path",
            PathKind::EndPath => "endpath",
            PathKind::Sequence => "sequence",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<PathKind> {
        [PathKind::Path, PathKind::EndPath, PathKind::Sequence]
            .into_iter()
            .find(|kind| kind.keyword() == keyword)
    }
}

impl fmt::Display for PathKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Ordered, non-owning references (by label) to modules or sequences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathDef {
    pub name: String,
    pub kind: PathKind,
    #[serde(default)]
    pub entries: Vec<String>,
}

impl PathDef {
    pub fn new<I, S>(kind: PathKind, name: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            kind,
            entries: entries.into_iter().map(Into::into).collect(),
        }
    }

    /// Insert a label before `index` (`0` prepends, `len` appends).
    pub fn insert(&mut self, index: usize, label: impl Into<String>) -> Result<(), ConfigError> {
        if index > self.entries.len() {
            return Err(ConfigError::IndexOutOfRange {
                path: self.name.clone(),
                index,
                len: self.entries.len(),
            });
        }
        self.entries.insert(index, label.into());
        Ok(())
    }

    /// How diagnostics refer to this definition, e.g. `endpath 'end'`.
    pub fn describe(&self) -> String {
        format!("{} '{}'", self.kind, self.name)
    }
}
