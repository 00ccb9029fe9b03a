//! Typed entry values: the closed set of leaf kinds plus nested sets.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::error::ConfigError;
use crate::core::input_tag::InputTag;
use crate::core::pset::ParameterSet;

/// Kind tag of a [`Value`], spelled the way the text form spells types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Bool,
    Int32,
    UInt32,
    Double,
    String,
    InputTag,
    VString,
    PSet,
    VPSet,
}

impl Kind {
    pub const ALL: [Kind; 9] = [
        Kind::Bool,
        Kind::Int32,
        Kind::UInt32,
        Kind::Double,
        Kind::String,
        Kind::InputTag,
        Kind::VString,
        Kind::PSet,
        Kind::VPSet,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            Kind::Bool => "bool",
            Kind::Int32 => "int32",
            Kind::UInt32 => "uint32",
            Kind::Double => "double",
            Kind::String => "string",
            Kind::InputTag => "InputTag",
            Kind::VString => "vstring",
            Kind::PSet => "PSet",
            Kind::VPSet => "VPSet",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Kind> {
        Kind::ALL.into_iter().find(|kind| kind.keyword() == keyword)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A parameter value. Leaf variants are the "parameters"; `PSet` and `VPSet`
/// nest further sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    #[serde(rename = "bool")]
    Bool(bool),
    #[serde(rename = "int32")]
    Int32(i32),
    #[serde(rename = "uint32")]
    UInt32(u32),
    #[serde(rename = "double")]
    Double(f64),
    #[serde(rename = "string")]
    String(String),
    InputTag(InputTag),
    #[serde(rename = "vstring")]
    VString(Vec<String>),
    PSet(ParameterSet),
    VPSet(Vec<ParameterSet>),
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Bool(_) => Kind::Bool,
            Value::Int32(_) => Kind::Int32,
            Value::UInt32(_) => Kind::UInt32,
            Value::Double(_) => Kind::Double,
            Value::String(_) => Kind::String,
            Value::InputTag(_) => Kind::InputTag,
            Value::VString(_) => Kind::VString,
            Value::PSet(_) => Kind::PSet,
            Value::VPSet(_) => Kind::VPSet,
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Value::String(value.into())
    }

    pub fn vstring<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::VString(values.into_iter().map(Into::into).collect())
    }

    pub fn input_tag(tag: InputTag) -> Self {
        Value::InputTag(tag)
    }

    /// Build a leaf of `kind` from its textual components.
    ///
    /// Scalars take exactly one component, `InputTag` takes one to three
    /// (label, instance, process) and `vstring` takes any number. Nested kinds
    /// are not leaves and are rejected.
    pub fn leaf(kind: Kind, components: &[&str]) -> Result<Value, ConfigError> {
        let invalid = |value: &str, reason: &str| ConfigError::InvalidLiteral {
            kind,
            value: value.to_string(),
            reason: reason.to_string(),
        };
        let single = || match components {
            [one] => Ok(*one),
            _ => Err(invalid(
                &components.join(","),
                "expected exactly one component",
            )),
        };

        match kind {
            Kind::Bool => match single()? {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                other => Err(invalid(other, "expected true or false")),
            },
            Kind::Int32 => {
                let raw = single()?;
                raw.parse()
                    .map(Value::Int32)
                    .map_err(|err| invalid(raw, &err.to_string()))
            }
            Kind::UInt32 => {
                let raw = single()?;
                raw.parse()
                    .map(Value::UInt32)
                    .map_err(|err| invalid(raw, &err.to_string()))
            }
            Kind::Double => {
                let raw = single()?;
                raw.parse()
                    .map(Value::Double)
                    .map_err(|err| invalid(raw, &err.to_string()))
            }
            Kind::String => Ok(Value::string(single()?)),
            Kind::InputTag => InputTag::from_components(components).map(Value::InputTag),
            Kind::VString => Ok(Value::vstring(components.iter().copied())),
            Kind::PSet | Kind::VPSet => Err(invalid(
                &components.join(","),
                "nested sets are not leaf values",
            )),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_input_tag(&self) -> Option<&InputTag> {
        match self {
            Value::InputTag(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn as_vstring(&self) -> Option<&[String]> {
        match self {
            Value::VString(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_pset(&self) -> Option<&ParameterSet> {
        match self {
            Value::PSet(set) => Some(set),
            _ => None,
        }
    }

    pub fn as_vpset(&self) -> Option<&[ParameterSet]> {
        match self {
            Value::VPSet(sets) => Some(sets),
            _ => None,
        }
    }

    /// True if any double in this value (recursively) is NaN or infinite.
    pub fn has_non_finite(&self) -> bool {
        match self {
            Value::Double(value) => !value.is_finite(),
            Value::PSet(set) => set.has_non_finite(),
            Value::VPSet(sets) => sets.iter().any(ParameterSet::has_non_finite),
            _ => false,
        }
    }
}

/// A named slot's content: a value plus its tracked flag.
///
/// Untracked parameters do not take part in provenance; the flag is carried
/// through copies and serialization unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(default = "tracked_default", skip_serializing_if = "is_tracked")]
    pub tracked: bool,
    #[serde(flatten)]
    pub value: Value,
}

fn tracked_default() -> bool {
    true
}

fn is_tracked(tracked: &bool) -> bool {
    *tracked
}

impl Entry {
    pub fn tracked(value: Value) -> Self {
        Self {
            tracked: true,
            value,
        }
    }

    pub fn untracked(value: Value) -> Self {
        Self {
            tracked: false,
            value,
        }
    }

    pub fn kind(&self) -> Kind {
        self.value.kind()
    }
}

impl From<Value> for Entry {
    fn from(value: Value) -> Self {
        Entry::tracked(value)
    }
}

impl From<ParameterSet> for Entry {
    fn from(set: ParameterSet) -> Self {
        Entry::tracked(Value::PSet(set))
    }
}
