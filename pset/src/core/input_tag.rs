//! Tagged references to data products produced elsewhere.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::error::ConfigError;

/// `(label, instance, process)` triple naming a data product.
///
/// Empty components mean "unspecified": the consumer resolves them with its
/// own default rules. Components never contain `:`, which keeps the encoded
/// `label:instance:process` form unambiguous. Every constructor, including
/// deserialization, enforces this.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "TagParts")]
pub struct InputTag {
    label: String,
    instance: String,
    process: String,
}

#[derive(Deserialize)]
struct TagParts {
    label: String,
    #[serde(default)]
    instance: String,
    #[serde(default)]
    process: String,
}

impl TryFrom<TagParts> for InputTag {
    type Error = ConfigError;

    fn try_from(parts: TagParts) -> Result<Self, Self::Error> {
        Self::from_components(&[&parts.label, &parts.instance, &parts.process])
    }
}

impl InputTag {
    pub fn new(label: &str) -> Result<Self, ConfigError> {
        Self::from_components(&[label])
    }

    pub fn with_instance(label: &str, instance: &str) -> Result<Self, ConfigError> {
        Self::from_components(&[label, instance])
    }

    /// Build from one to three components; missing trailing ones are empty.
    pub fn from_components(components: &[&str]) -> Result<Self, ConfigError> {
        let invalid = |reason| ConfigError::InvalidInputTag {
            value: components.join(":"),
            reason,
        };
        if components.is_empty() || components.len() > 3 {
            return Err(invalid("expected 1 to 3 components"));
        }
        if components.iter().any(|part| part.contains(':')) {
            return Err(invalid("components may not contain ':'"));
        }
        let part = |idx: usize| components.get(idx).copied().unwrap_or_default().to_string();
        Ok(Self {
            label: part(0),
            instance: part(1),
            process: part(2),
        })
    }

    /// Parse the `label[:instance[:process]]` encoding.
    pub fn parse(encoded: &str) -> Result<Self, ConfigError> {
        let parts: Vec<&str> = encoded.split(':').collect();
        Self::from_components(&parts)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    pub fn process(&self) -> &str {
        &self.process
    }

    /// Always emits all three components so empty ones survive a round trip.
    pub fn encode(&self) -> String {
        format!("{}:{}:{}", self.label, self.instance, self.process)
    }

    pub fn components(&self) -> [&str; 3] {
        [&self.label, &self.instance, &self.process]
    }
}

impl fmt::Display for InputTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_partial_encodings() {
        let tag = InputTag::parse("ecalRecHit:EcalRecHitsEB").expect("parse");
        assert_eq!(
            tag,
            InputTag::with_instance("ecalRecHit", "EcalRecHitsEB").expect("tag")
        );
        assert_eq!(tag.instance(), "EcalRecHitsEB");

        let empty = InputTag::parse("").expect("parse");
        assert_eq!(empty, InputTag::default());
    }

    #[test]
    fn encode_keeps_empty_components() {
        let tag = InputTag::new("ecalRecHit").expect("tag");
        assert_eq!(tag.encode(), "ecalRecHit::");
        assert_eq!(InputTag::parse(&tag.encode()).expect("parse"), tag);
        assert_eq!(tag.components(), ["ecalRecHit", "", ""]);
    }

    #[test]
    fn rejects_too_many_components() {
        let err = InputTag::parse("a:b:c:d").expect_err("four components");
        assert!(err.to_string().contains("1 to 3"));
    }

    #[test]
    fn every_constructor_rejects_separator_inside_component() {
        let results = [
            InputTag::new("a:b"),
            InputTag::with_instance("a", "b:c"),
            InputTag::from_components(&["a", "", "p:q"]),
        ];
        for result in results {
            assert!(matches!(result, Err(ConfigError::InvalidInputTag { .. })));
        }

        let json = r#"{"label":"a","instance":"","process":"p:q"}"#;
        let err = serde_json::from_str::<InputTag>(json).expect_err("colon");
        assert!(err.to_string().contains("may not contain ':'"));
    }

    #[test]
    fn deserialize_fills_missing_components() {
        let tag: InputTag = serde_json::from_str(r#"{"label":"ecalRecHit"}"#).expect("tag");
        assert_eq!(tag.components(), ["ecalRecHit", "", ""]);
    }
}
