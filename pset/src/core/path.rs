//! Entry names and dotted entry paths (`navigator.name`, `producers[1].src`).

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::error::ConfigError;

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid name regex")
});

static SEGMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)(?:\[([0-9]+)\])?$").expect("valid segment regex")
});

/// True if `name` can be used as a parameter name or process label.
pub fn is_valid_name(name: &str) -> bool {
    NAME_RE.is_match(name)
}

pub fn ensure_valid_name(name: &str) -> Result<(), ConfigError> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(ConfigError::InvalidName {
            name: name.to_string(),
        })
    }
}

/// Join a parent path and a child name; the root has an empty path.
pub fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

/// Path of the `index`-th element of a VPSet at `path`.
pub fn element(path: &str, index: usize) -> String {
    format!("{path}[{index}]")
}

/// One step of an entry path: an entry name, optionally indexing into a VPSet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub name: String,
    pub index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPath {
    segments: Vec<Segment>,
}

impl EntryPath {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidPath {
            path: raw.to_string(),
        };
        if raw.is_empty() {
            return Err(invalid());
        }
        let mut segments = Vec::new();
        for part in raw.split('.') {
            let caps = SEGMENT_RE.captures(part).ok_or_else(invalid)?;
            let index = match caps.get(2) {
                Some(idx) => Some(idx.as_str().parse::<usize>().map_err(|_| invalid())?),
                None => None,
            };
            segments.push(Segment {
                name: caps[1].to_string(),
                index,
            });
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Path text of the first `len` segments, for error reporting.
    pub fn prefix(&self, len: usize) -> String {
        self.segments[..len.min(self.segments.len())]
            .iter()
            .map(Segment::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "{}[{}]", self.name, index),
            None => f.write_str(&self.name),
        }
    }
}

impl fmt::Display for EntryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prefix(self.segments.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_segments_and_indices() {
        let path = EntryPath::parse("producers[1].qualityTests[0].name").expect("parse");
        assert_eq!(
            path.segments(),
            &[
                Segment {
                    name: "producers".to_string(),
                    index: Some(1)
                },
                Segment {
                    name: "qualityTests".to_string(),
                    index: Some(0)
                },
                Segment {
                    name: "name".to_string(),
                    index: None
                },
            ]
        );
        assert_eq!(path.to_string(), "producers[1].qualityTests[0].name");
        assert_eq!(path.prefix(1), "producers[1]");
    }

    #[test]
    fn parse_rejects_malformed_paths() {
        for raw in ["", "a..b", "a[", "a[x]", "1abc", "a.b[-1]", "a b"] {
            assert!(
                matches!(EntryPath::parse(raw), Err(ConfigError::InvalidPath { .. })),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn names_follow_identifier_rules() {
        assert!(is_valid_name("outputCommands"));
        assert!(is_valid_name("_x1"));
        assert!(!is_valid_name("1x"));
        assert!(!is_valid_name("a.b"));
        assert!(!is_valid_name(""));
    }

    #[test]
    fn join_handles_root() {
        assert_eq!(join("", "a"), "a");
        assert_eq!(join("a", "b"), "a.b");
        assert_eq!(element("a.b", 2), "a.b[2]");
    }
}
