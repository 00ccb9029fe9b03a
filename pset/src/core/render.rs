//! Rendering parameter sets and processes into the nested key/value text
//! form that [`crate::core::parse`] reads back.

use std::fmt;

use crate::core::process::Process;
use crate::core::pset::ParameterSet;
use crate::core::value::{Entry, Value};

/// Text handed to the engine (or written to a `.cfg` file).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedForm(String);

impl SerializedForm {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SerializedForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Spaces per nesting level.
    pub indent: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { indent: 2 }
    }
}

/// Flatten `set` into text, one entry per line at the top level.
pub fn resolve(set: &ParameterSet) -> SerializedForm {
    resolve_with(set, &RenderOptions::default())
}

pub fn resolve_with(set: &ParameterSet, options: &RenderOptions) -> SerializedForm {
    let mut writer = Writer::new(options);
    writer.entries(set, 0);
    SerializedForm(writer.out)
}

/// Render every declaration of `process` in registration order: the header,
/// top-level sets, the source, modules, then paths and sequences.
pub fn render_process(process: &Process, options: &RenderOptions) -> SerializedForm {
    let mut blocks: Vec<String> = Vec::new();

    if !process.is_fragment() {
        blocks.push(format!("process {}\n", process.name()));
    }
    for (name, set) in process.psets() {
        let mut writer = Writer::new(options);
        writer.out.push_str(&format!("pset {name} = "));
        writer.pset_block(set, 0);
        writer.out.push('\n');
        blocks.push(writer.out);
    }
    if let Some(source) = process.source() {
        let mut writer = Writer::new(options);
        writer.out.push_str(&format!("source = {} ", source.type_name));
        writer.pset_block(&source.params, 0);
        writer.out.push('\n');
        blocks.push(writer.out);
    }
    for (label, module) in process.modules() {
        let mut writer = Writer::new(options);
        writer
            .out
            .push_str(&format!("{} {} = {} ", module.role, label, module.type_name));
        writer.pset_block(&module.params, 0);
        writer.out.push('\n');
        blocks.push(writer.out);
    }
    for path in process.paths() {
        let body = if path.entries.is_empty() {
            "{}".to_string()
        } else {
            format!("{{ {} }}", path.entries.join(", "))
        };
        blocks.push(format!("{} {} = {}\n", path.kind, path.name, body));
    }

    SerializedForm(blocks.join("\n"))
}

struct Writer {
    out: String,
    unit: String,
}

impl Writer {
    fn new(options: &RenderOptions) -> Self {
        Self {
            out: String::new(),
            unit: " ".repeat(options.indent),
        }
    }

    fn pad(&mut self, depth: usize) {
        for _ in 0..depth {
            self.out.push_str(&self.unit);
        }
    }

    fn entries(&mut self, set: &ParameterSet, depth: usize) {
        for (name, entry) in set.iter() {
            self.entry(name, entry, depth);
        }
    }

    fn entry(&mut self, name: &str, entry: &Entry, depth: usize) {
        self.pad(depth);
        if !entry.tracked {
            self.out.push_str("untracked ");
        }
        self.out.push_str(&format!("{} {} = ", entry.kind(), name));
        self.value(&entry.value, depth);
        self.out.push('\n');
    }

    fn value(&mut self, value: &Value, depth: usize) {
        match value {
            Value::Bool(v) => self.out.push_str(if *v { "true" } else { "false" }),
            Value::Int32(v) => self.out.push_str(&v.to_string()),
            Value::UInt32(v) => self.out.push_str(&v.to_string()),
            Value::Double(v) => self.out.push_str(&format_double(*v)),
            Value::String(v) => self.out.push_str(&quote(v)),
            Value::InputTag(tag) => self.out.push_str(&quote(&tag.encode())),
            Value::VString(values) => {
                if values.is_empty() {
                    self.out.push_str("{}");
                    return;
                }
                self.out.push_str("{\n");
                for (idx, item) in values.iter().enumerate() {
                    if idx > 0 {
                        self.out.push_str(",\n");
                    }
                    self.pad(depth + 1);
                    self.out.push_str(&quote(item));
                }
                self.out.push('\n');
                self.pad(depth);
                self.out.push('}');
            }
            Value::PSet(set) => self.pset_block(set, depth),
            Value::VPSet(sets) => {
                if sets.is_empty() {
                    self.out.push_str("{}");
                    return;
                }
                self.out.push_str("{\n");
                for (idx, set) in sets.iter().enumerate() {
                    if idx > 0 {
                        self.out.push_str(",\n");
                    }
                    self.pad(depth + 1);
                    self.pset_block(set, depth + 1);
                }
                self.out.push('\n');
                self.pad(depth);
                self.out.push('}');
            }
        }
    }

    /// `{ ... }` with entries one level deeper; the closing brace is left
    /// at `depth` without a trailing newline.
    fn pset_block(&mut self, set: &ParameterSet, depth: usize) {
        if set.is_empty() {
            self.out.push_str("{}");
            return;
        }
        self.out.push_str("{\n");
        self.entries(set, depth + 1);
        self.pad(depth);
        self.out.push('}');
    }
}

/// Shortest text that parses back to the same `f64`.
pub fn format_double(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value == f64::INFINITY {
        "inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        format!("{value:?}")
    }
}

fn quote(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('"');
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}
