//! JSON process documents with schema validation.
//!
//! The document keeps declarations as arrays so their order survives, and
//! parameter sets as objects whose key order is the entry order.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result, anyhow};
use jsonschema::{Draft, Validator};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::module::{ModuleDescriptor, ModuleRole, PathDef};
use crate::core::process::{Process, SOURCE_LABEL};
use crate::core::pset::ParameterSet;

const PROCESS_SCHEMA: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../schemas/process/v1.schema.json"
));

static VALIDATOR: LazyLock<Result<Validator, String>> = LazyLock::new(|| {
    let schema: serde_json::Value =
        serde_json::from_str(PROCESS_SCHEMA).map_err(|err| format!("parse schema: {err}"))?;
    jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(&schema)
        .map_err(|err| format!("compile process schema: {err}"))
});

#[derive(Debug, Serialize, Deserialize)]
struct ProcessDoc {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source: Option<ModuleDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    psets: Vec<NamedSet>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    modules: Vec<LabeledModule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    paths: Vec<PathDef>,
}

#[derive(Debug, Serialize, Deserialize)]
struct NamedSet {
    name: String,
    params: ParameterSet,
}

#[derive(Debug, Serialize, Deserialize)]
struct LabeledModule {
    label: String,
    role: ModuleRole,
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    params: ParameterSet,
}

impl ProcessDoc {
    fn from_process(process: &Process) -> Self {
        Self {
            name: process.name().to_string(),
            source: process.source().cloned(),
            psets: process
                .psets()
                .map(|(name, params)| NamedSet {
                    name: name.to_string(),
                    params: params.clone(),
                })
                .collect(),
            modules: process
                .modules()
                .map(|(label, module)| LabeledModule {
                    label: label.to_string(),
                    role: module.role,
                    type_name: module.type_name.clone(),
                    params: module.params.clone(),
                })
                .collect(),
            paths: process.paths().cloned().collect(),
        }
    }

    /// Register everything through the normal builder so the same
    /// namespace rules apply as for the text form.
    fn into_process(self) -> Result<Process> {
        let mut process = Process::fragment();
        if !self.name.is_empty() {
            process.set_name(self.name)?;
        }
        for set in self.psets {
            process.add_pset(set.name, set.params)?;
        }
        if let Some(source) = self.source {
            process.set_source(source)?;
        }
        for module in self.modules {
            process.add_module(
                module.label,
                ModuleDescriptor::new(module.role, module.type_name, module.params),
            )?;
        }
        for path in self.paths {
            process.add_path(path)?;
        }
        Ok(process)
    }
}

/// Parse and validate a JSON process document.
pub fn process_from_json(contents: &str) -> Result<Process> {
    let value: serde_json::Value = serde_json::from_str(contents).context("parse json")?;
    validate_schema(&value)?;
    // Deserialize from the text, not `value`: `Value` would already have
    // collapsed duplicate keys.
    let doc: ProcessDoc = serde_json::from_str(contents).context("deserialize process")?;
    doc.into_process()
}

/// Serialize `process` as a pretty-printed JSON document.
pub fn process_to_json(process: &Process) -> Result<String> {
    if let Some(label) = non_finite_owner(process) {
        return Err(anyhow!(
            "'{label}' holds a non-finite double, which JSON cannot represent"
        ));
    }
    let mut buf = serde_json::to_string_pretty(&ProcessDoc::from_process(process))
        .context("serialize process json")?;
    buf.push('\n');
    Ok(buf)
}

pub fn load_process_json(path: &Path) -> Result<Process> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let process =
        process_from_json(&contents).with_context(|| format!("load {}", path.display()))?;
    debug!(path = %path.display(), process = %process.name(), "loaded json process");
    Ok(process)
}

pub fn write_process_json(path: &Path, process: &Process) -> Result<()> {
    let buf = process_to_json(process).with_context(|| format!("write {}", path.display()))?;
    fs::write(path, buf).with_context(|| format!("write {}", path.display()))
}

fn validate_schema(document: &serde_json::Value) -> Result<()> {
    let compiled = VALIDATOR.as_ref().map_err(|err| anyhow!("{err}"))?;
    if !compiled.is_valid(document) {
        let messages = compiled
            .iter_errors(document)
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        return Err(anyhow!(
            "process schema validation failed: {}",
            messages.join("; ")
        ));
    }
    Ok(())
}

fn non_finite_owner(process: &Process) -> Option<String> {
    let source = process
        .source()
        .map(|source| (SOURCE_LABEL, &source.params));
    source
        .into_iter()
        .chain(process.psets())
        .chain(process.modules().map(|(label, module)| (label, &module.params)))
        .find(|(_, set)| set.has_non_finite())
        .map(|(name, _)| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ConfigError;
    use crate::core::value::{Entry, Value};
    use crate::test_support::{alcareco_process, message_logger_fragment, stream_transfer_process};

    #[test]
    fn round_trips_full_process() {
        let process = stream_transfer_process();
        let json = process_to_json(&process).expect("json");
        let back = process_from_json(&json).expect("parse");
        assert_eq!(back, process);
        let modules: Vec<&str> = back.modules().map(|(label, _)| label).collect();
        assert_eq!(modules, vec!["a1", "out"]);
    }

    #[test]
    fn round_trips_fragments_and_gates() {
        for process in [message_logger_fragment(), alcareco_process()] {
            let json = process_to_json(&process).expect("json");
            assert_eq!(process_from_json(&json).expect("parse"), process);
        }
    }

    #[test]
    fn document_shape() {
        let json = process_to_json(&stream_transfer_process()).expect("json");
        let value: serde_json::Value = serde_json::from_str(&json).expect("value");
        assert_eq!(value["name"], "TRANSFER");
        assert_eq!(value["source"]["role"], "source");
        assert_eq!(value["modules"][0]["label"], "a1");
        assert_eq!(
            value["modules"][0]["params"]["product_to_get"]["string"],
            "m1"
        );
        assert_eq!(value["source"]["params"]["fileNames"]["tracked"], false);
        assert_eq!(value["paths"][0]["kind"], "endpath");
    }

    #[test]
    fn schema_rejects_malformed_entries() {
        let doc = r#"{"name":"P","psets":[{"name":"o","params":{"x":{"bool":true,"string":"y"}}}]}"#;
        let err = process_from_json(doc).expect_err("two kinds");
        assert!(err.to_string().contains("schema validation failed"));

        let doc = r#"{"name":"P","modules":[{"label":"s","role":"source","type":"S"}]}"#;
        assert!(process_from_json(doc).is_err());

        let doc = r#"{"name":"P","psets":[{"name":"o","params":{"t":{"InputTag":{"label":"a:b"}}}}]}"#;
        assert!(process_from_json(doc).is_err());
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let doc = r#"{"name":"P","psets":[{"name":"o","params":{"x":{"bool":true},"x":{"bool":false}}}]}"#;
        let err = process_from_json(doc).expect_err("duplicate");
        assert!(format!("{err:#}").contains("duplicate name 'x'"));
    }

    #[test]
    fn duplicate_labels_keep_their_type() {
        let doc = r#"{"name":"P","modules":[
            {"label":"a","role":"producer","type":"A"},
            {"label":"a","role":"analyzer","type":"B"}]}"#;
        let err = process_from_json(doc).expect_err("duplicate label");
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::DuplicateName {
                path: "a".to_string()
            })
        );
    }

    #[test]
    fn non_finite_doubles_cannot_be_written() {
        let mut process = stream_transfer_process();
        process
            .module_mut("a1")
            .expect("a1")
            .params
            .insert("cut", Entry::from(Value::Double(f64::INFINITY)))
            .expect("insert");
        let err = process_to_json(&process).expect_err("inf");
        assert!(err.to_string().contains("'a1'"));
    }

    #[test]
    fn files_round_trip() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("process.json");
        write_process_json(&path, &stream_transfer_process()).expect("write");
        let loaded = load_process_json(&path).expect("load");
        assert_eq!(loaded, stream_transfer_process());
    }
}
