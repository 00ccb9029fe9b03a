//! Parameter sets: ordered, uniquely named, typed configuration trees.

use std::fmt;

use indexmap::IndexMap;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::error::ConfigError;
use crate::core::input_tag::InputTag;
use crate::core::path::{EntryPath, Segment, ensure_valid_name, join};
use crate::core::value::{Entry, Kind, Value};

/// A mapping from unique names to entries.
///
/// Insertion order is preserved for serialization and is part of equality,
/// so a set that round-trips through the text form compares equal to the
/// original only if nothing was reordered.
#[derive(Debug, Clone, Default)]
pub struct ParameterSet {
    entries: IndexMap<String, Entry>,
}

impl PartialEq for ParameterSet {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len() && self.entries.iter().eq(other.entries.iter())
    }
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from `(name, entry)` pairs.
    ///
    /// Fails on the first duplicate or invalid name; no partial set escapes.
    pub fn from_entries<I, N>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (N, Entry)>,
        N: Into<String>,
    {
        let mut set = Self::new();
        for (name, entry) in entries {
            set.insert(name, entry)?;
        }
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Direct child by name (no path syntax).
    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    /// Add a new entry at the end. Existing names are never overwritten.
    pub fn insert(&mut self, name: impl Into<String>, entry: Entry) -> Result<(), ConfigError> {
        let name = name.into();
        ensure_valid_name(&name)?;
        if self.entries.contains_key(&name) {
            return Err(ConfigError::DuplicateName { path: name });
        }
        self.entries.insert(name, entry);
        Ok(())
    }

    /// Remove a direct child, keeping the order of the remaining entries.
    pub fn remove(&mut self, name: &str) -> Option<Entry> {
        self.entries.shift_remove(name)
    }

    /// Fully independent structural copy.
    ///
    /// The baseline-then-variant pattern relies on this: mutating the copy
    /// must never show through to the set it was copied from.
    pub fn deep_copy(&self) -> Self {
        self.clone()
    }

    /// Entry at a dotted path such as `navigator.name` or `producers[0].src`.
    pub fn lookup(&self, raw: &str) -> Result<&Entry, ConfigError> {
        let path = EntryPath::parse(raw)?;
        let (last, parents) = split_last(&path, raw)?;
        let mut set = self;
        for (depth, segment) in parents.iter().enumerate() {
            set = set.step(segment, &path, depth)?;
        }
        set.entries
            .get(&last.name)
            .ok_or_else(|| ConfigError::MissingEntry {
                path: path.to_string(),
            })
    }

    pub fn lookup_mut(&mut self, raw: &str) -> Result<&mut Entry, ConfigError> {
        let path = EntryPath::parse(raw)?;
        let (last, parents) = split_last(&path, raw)?;
        let mut set = self;
        for (depth, segment) in parents.iter().enumerate() {
            set = set.step_mut(segment, &path, depth)?;
        }
        set.entries
            .get_mut(&last.name)
            .ok_or_else(|| ConfigError::MissingEntry {
                path: path.to_string(),
            })
    }

    /// Nested set at `raw`: either a `PSet` entry or a `VPSet` element.
    pub fn set_at(&self, raw: &str) -> Result<&ParameterSet, ConfigError> {
        let path = EntryPath::parse(raw)?;
        let mut set = self;
        for (depth, segment) in path.segments().iter().enumerate() {
            set = set.step(segment, &path, depth)?;
        }
        Ok(set)
    }

    pub fn set_at_mut(&mut self, raw: &str) -> Result<&mut ParameterSet, ConfigError> {
        let path = EntryPath::parse(raw)?;
        let mut set = self;
        for (depth, segment) in path.segments().iter().enumerate() {
            set = set.step_mut(segment, &path, depth)?;
        }
        Ok(set)
    }

    /// Replace the value at `raw`, keeping its tracked flag. The new value
    /// must have the same kind as the old one. Returns the old value.
    pub fn replace(&mut self, raw: &str, value: Value) -> Result<Value, ConfigError> {
        let entry = self.lookup_mut(raw)?;
        if entry.kind() != value.kind() {
            return Err(ConfigError::TypeMismatch {
                path: raw.to_string(),
                expected: entry.kind(),
                found: value.kind(),
            });
        }
        Ok(std::mem::replace(&mut entry.value, value))
    }

    /// Insert `value` into the `vstring` at `raw` before position `index`
    /// (`0` prepends, `len` appends). On error the set is left untouched.
    pub fn insert_sequence_element(
        &mut self,
        raw: &str,
        index: usize,
        value: impl Into<String>,
    ) -> Result<(), ConfigError> {
        let entry = self.lookup_mut(raw)?;
        let found = entry.kind();
        let Value::VString(values) = &mut entry.value else {
            return Err(ConfigError::NotASequence {
                path: raw.to_string(),
                found,
            });
        };
        if index > values.len() {
            return Err(ConfigError::IndexOutOfRange {
                path: raw.to_string(),
                index,
                len: values.len(),
            });
        }
        values.insert(index, value.into());
        Ok(())
    }

    /// Overlay `overrides` on top of this set: entries with an existing name
    /// are replaced in place (nested sets wholesale), new names are appended.
    pub fn apply_overrides(&mut self, overrides: ParameterSet) {
        for (name, entry) in overrides.entries {
            self.entries.insert(name, entry);
        }
    }

    pub fn bool_at(&self, raw: &str) -> Result<bool, ConfigError> {
        let entry = self.lookup(raw)?;
        entry
            .value
            .as_bool()
            .ok_or_else(|| mismatch(raw, Kind::Bool, entry))
    }

    pub fn double_at(&self, raw: &str) -> Result<f64, ConfigError> {
        let entry = self.lookup(raw)?;
        entry
            .value
            .as_double()
            .ok_or_else(|| mismatch(raw, Kind::Double, entry))
    }

    pub fn str_at(&self, raw: &str) -> Result<&str, ConfigError> {
        let entry = self.lookup(raw)?;
        entry
            .value
            .as_str()
            .ok_or_else(|| mismatch(raw, Kind::String, entry))
    }

    pub fn vstring_at(&self, raw: &str) -> Result<&[String], ConfigError> {
        let entry = self.lookup(raw)?;
        entry
            .value
            .as_vstring()
            .ok_or_else(|| mismatch(raw, Kind::VString, entry))
    }

    pub fn input_tag_at(&self, raw: &str) -> Result<&InputTag, ConfigError> {
        let entry = self.lookup(raw)?;
        entry
            .value
            .as_input_tag()
            .ok_or_else(|| mismatch(raw, Kind::InputTag, entry))
    }

    pub fn has_non_finite(&self) -> bool {
        self.entries.values().any(|entry| entry.value.has_non_finite())
    }

    fn step(
        &self,
        segment: &Segment,
        path: &EntryPath,
        depth: usize,
    ) -> Result<&ParameterSet, ConfigError> {
        let at = join(&path.prefix(depth), &segment.name);
        let entry = self
            .entries
            .get(&segment.name)
            .ok_or_else(|| ConfigError::MissingEntry { path: at.clone() })?;
        match (segment.index, &entry.value) {
            (None, Value::PSet(inner)) => Ok(inner),
            (Some(index), Value::VPSet(sets)) => {
                let len = sets.len();
                sets.get(index).ok_or(ConfigError::IndexOutOfRange {
                    path: at,
                    index,
                    len,
                })
            }
            (None, other) => Err(ConfigError::TypeMismatch {
                path: at,
                expected: Kind::PSet,
                found: other.kind(),
            }),
            (Some(_), other) => Err(ConfigError::TypeMismatch {
                path: at,
                expected: Kind::VPSet,
                found: other.kind(),
            }),
        }
    }

    fn step_mut(
        &mut self,
        segment: &Segment,
        path: &EntryPath,
        depth: usize,
    ) -> Result<&mut ParameterSet, ConfigError> {
        let at = join(&path.prefix(depth), &segment.name);
        let entry = self
            .entries
            .get_mut(&segment.name)
            .ok_or_else(|| ConfigError::MissingEntry { path: at.clone() })?;
        match (segment.index, &mut entry.value) {
            (None, Value::PSet(inner)) => Ok(inner),
            (Some(index), Value::VPSet(sets)) => {
                let len = sets.len();
                sets.get_mut(index).ok_or(ConfigError::IndexOutOfRange {
                    path: at,
                    index,
                    len,
                })
            }
            (None, other) => Err(ConfigError::TypeMismatch {
                path: at,
                expected: Kind::PSet,
                found: other.kind(),
            }),
            (Some(_), other) => Err(ConfigError::TypeMismatch {
                path: at,
                expected: Kind::VPSet,
                found: other.kind(),
            }),
        }
    }
}

/// Split off the final segment, which must name an entry (not a VPSet element).
fn split_last<'a>(
    path: &'a EntryPath,
    raw: &str,
) -> Result<(&'a Segment, &'a [Segment]), ConfigError> {
    match path.segments().split_last() {
        Some((last, parents)) if last.index.is_none() => Ok((last, parents)),
        _ => Err(ConfigError::InvalidPath {
            path: raw.to_string(),
        }),
    }
}

fn mismatch(raw: &str, expected: Kind, entry: &Entry) -> ConfigError {
    ConfigError::TypeMismatch {
        path: raw.to_string(),
        expected,
        found: entry.kind(),
    }
}

impl Serialize for ParameterSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter())
    }
}

impl<'de> Deserialize<'de> for ParameterSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ParameterSetVisitor)
    }
}

/// Builds through [`ParameterSet::insert`] so that duplicate and invalid
/// names in a document are errors rather than silent overwrites.
struct ParameterSetVisitor;

impl<'de> Visitor<'de> for ParameterSetVisitor {
    type Value = ParameterSet;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of parameter names to typed entries")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut set = ParameterSet::new();
        while let Some((name, entry)) = map.next_entry::<String, Entry>()? {
            set.insert(name, entry).map_err(serde::de::Error::custom)?;
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{alcareco_baseline, pf_rechit_ecal_params};

    fn commands(set: &ParameterSet) -> Vec<String> {
        set.vstring_at("outputCommands").expect("vstring").to_vec()
    }

    #[test]
    fn from_entries_rejects_duplicate_names() {
        let err = ParameterSet::from_entries([
            ("x", Entry::from(Value::Bool(true))),
            ("x", Entry::from(Value::Bool(false))),
        ])
        .expect_err("duplicate");
        assert_eq!(
            err,
            ConfigError::DuplicateName {
                path: "x".to_string()
            }
        );
    }

    #[test]
    fn names_are_case_sensitive() {
        let set = ParameterSet::from_entries([
            ("x", Entry::from(Value::Bool(true))),
            ("X", Entry::from(Value::Bool(false))),
        ])
        .expect("distinct names");
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn insert_rejects_invalid_names() {
        let mut set = ParameterSet::new();
        let err = set
            .insert("a.b", Entry::from(Value::Bool(true)))
            .expect_err("dotted name");
        assert!(matches!(err, ConfigError::InvalidName { .. }));
        assert!(set.is_empty());
    }

    #[test]
    fn deep_copy_is_isolated_from_the_source() {
        let baseline = pf_rechit_ecal_params();
        let snapshot = baseline.clone();

        let mut variant = baseline.deep_copy();
        variant
            .replace(
                "producers[0].qualityTests[1].cleaningThreshold",
                Value::Double(4.0),
            )
            .expect("replace");
        variant
            .set_at_mut("navigator")
            .expect("navigator")
            .remove("barrel");

        assert_eq!(baseline, snapshot);
        assert_eq!(
            baseline
                .double_at("producers[0].qualityTests[1].cleaningThreshold")
                .expect("double"),
            2.0
        );
        assert_eq!(
            variant
                .double_at("producers[0].qualityTests[1].cleaningThreshold")
                .expect("double"),
            4.0
        );
    }

    #[test]
    fn prepend_shifts_existing_elements() {
        let mut set = alcareco_baseline();
        let before = commands(&set);

        set.insert_sequence_element("outputCommands", 0, "drop *")
            .expect("insert");

        let after = commands(&set);
        assert_eq!(after.len(), before.len() + 1);
        assert_eq!(after[0], "drop *");
        assert_eq!(&after[1..], &before[..]);
    }

    #[test]
    fn append_at_len_is_allowed() {
        let mut set = alcareco_baseline();
        let len = commands(&set).len();
        set.insert_sequence_element("outputCommands", len, "drop *_junk_*_*")
            .expect("append");
        assert_eq!(commands(&set).last().map(String::as_str), Some("drop *_junk_*_*"));
    }

    #[test]
    fn insert_past_end_fails_and_leaves_set_unchanged() {
        let mut set = alcareco_baseline();
        let snapshot = set.clone();
        let len = commands(&set).len();

        let err = set
            .insert_sequence_element("outputCommands", len + 1, "drop *")
            .expect_err("out of range");

        assert_eq!(
            err,
            ConfigError::IndexOutOfRange {
                path: "outputCommands".to_string(),
                index: len + 1,
                len,
            }
        );
        assert_eq!(set, snapshot);
    }

    #[test]
    fn insert_into_non_sequence_fails() {
        let mut set = alcareco_baseline();
        let err = set
            .insert_sequence_element("SelectEvents", 0, "x")
            .expect_err("pset");
        assert_eq!(
            err,
            ConfigError::NotASequence {
                path: "SelectEvents".to_string(),
                found: Kind::PSet,
            }
        );

        let err = set
            .insert_sequence_element("missing", 0, "x")
            .expect_err("missing");
        assert!(matches!(err, ConfigError::MissingEntry { .. }));
    }

    #[test]
    fn nested_sequence_insert_uses_paths() {
        let mut set = alcareco_baseline();
        set.insert_sequence_element("SelectEvents.SelectEvents", 1, "pathOther")
            .expect("insert");
        assert_eq!(
            set.vstring_at("SelectEvents.SelectEvents").expect("vstring"),
            &["pathALCARECOTkAlZMuMuHI".to_string(), "pathOther".to_string()]
        );
    }

    #[test]
    fn lookup_reports_the_failing_segment() {
        let set = pf_rechit_ecal_params();
        assert_eq!(
            set.lookup("producers[5].name").expect_err("oob"),
            ConfigError::IndexOutOfRange {
                path: "producers".to_string(),
                index: 5,
                len: 2,
            }
        );
        assert_eq!(
            set.lookup("navigator.name.x").expect_err("leaf step"),
            ConfigError::TypeMismatch {
                path: "navigator.name".to_string(),
                expected: Kind::PSet,
                found: Kind::String,
            }
        );
        assert_eq!(
            set.lookup("navigator.missing").expect_err("missing"),
            ConfigError::MissingEntry {
                path: "navigator.missing".to_string()
            }
        );
        assert!(matches!(
            set.lookup("producers[0]"),
            Err(ConfigError::InvalidPath { .. })
        ));
        assert_eq!(
            set.set_at("producers[1]")
                .expect("element")
                .str_at("name")
                .expect("name"),
            "PFEERecHitCreator"
        );
    }

    #[test]
    fn replace_keeps_kind_and_tracking() {
        let mut set = alcareco_baseline();
        let err = set
            .replace("outputCommands", Value::Bool(true))
            .expect_err("kind change");
        assert!(matches!(err, ConfigError::TypeMismatch { .. }));

        let old = set
            .replace("outputCommands", Value::vstring(["keep *"]))
            .expect("replace");
        assert_eq!(old.as_vstring().map(<[String]>::len), Some(6));
        let entry = set.get("outputCommands").expect("entry");
        assert!(!entry.tracked);
        assert_eq!(entry.value, Value::vstring(["keep *"]));
    }

    #[test]
    fn apply_overrides_replaces_in_place_and_appends() {
        let mut set = ParameterSet::from_entries([
            ("a", Entry::from(Value::Int32(1))),
            ("b", Entry::from(Value::Int32(2))),
        ])
        .expect("set");
        let overrides = ParameterSet::from_entries([
            ("a", Entry::from(Value::Int32(10))),
            ("c", Entry::from(Value::Int32(3))),
        ])
        .expect("overrides");

        set.apply_overrides(overrides);

        let names: Vec<&str> = set.names().collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(set.get("a").map(|e| &e.value), Some(&Value::Int32(10)));
    }

    #[test]
    fn equality_is_order_sensitive() {
        let ab = ParameterSet::from_entries([
            ("a", Entry::from(Value::Bool(true))),
            ("b", Entry::from(Value::Bool(true))),
        ])
        .expect("set");
        let ba = ParameterSet::from_entries([
            ("b", Entry::from(Value::Bool(true))),
            ("a", Entry::from(Value::Bool(true))),
        ])
        .expect("set");
        assert_ne!(ab, ba);
    }

    #[test]
    fn json_rejects_duplicate_keys() {
        let err = serde_json::from_str::<ParameterSet>(r#"{"x":{"bool":true},"x":{"bool":false}}"#)
            .expect_err("duplicate");
        assert!(err.to_string().contains("duplicate name 'x'"));
    }

    #[test]
    fn json_keeps_order_and_nesting() {
        let set = pf_rechit_ecal_params();
        let json = serde_json::to_string(&set).expect("json");
        assert!(json.starts_with(r#"{"navigator":{"PSet":{"name":{"string":"PFRecHitECALNavigator"}"#));
        let back: ParameterSet = serde_json::from_str(&json).expect("parse");
        assert_eq!(back, set);
    }
}
