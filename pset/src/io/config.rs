//! Tool configuration stored in `pset.toml`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::render::RenderOptions;

/// Default file name looked up in the working directory.
pub const CONFIG_FILE: &str = "pset.toml";

/// Tool configuration (TOML).
///
/// Edited by hand; every field is optional and defaults to the values below.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ToolConfig {
    pub render: RenderConfig,
    pub check: CheckConfig,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RenderConfig {
    /// Spaces per nesting level in the text form.
    pub indent: usize,
    /// Format `dump` and `fmt` write when none is given on the command line.
    pub format: OutputFormat,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            indent: RenderOptions::default().indent,
            format: OutputFormat::Text,
        }
    }
}

impl RenderConfig {
    pub fn options(&self) -> RenderOptions {
        RenderOptions {
            indent: self.indent,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CheckConfig {
    /// Report `SelectEvents` entries naming paths the process lacks.
    pub warn_unknown_select_events: bool,
    /// Fragments loaded (in order) into every checked process, relative to
    /// the config file.
    pub fragments: Vec<String>,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            warn_unknown_select_events: true,
            fragments: Vec::new(),
        }
    }
}

impl ToolConfig {
    pub fn validate(&self) -> Result<()> {
        if self.render.indent == 0 || self.render.indent > 16 {
            return Err(anyhow!("render.indent must be between 1 and 16"));
        }
        if self.check.fragments.iter().any(|f| f.trim().is_empty()) {
            return Err(anyhow!("check.fragments must not contain empty paths"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `ToolConfig::default()`.
pub fn load_config(path: &Path) -> Result<ToolConfig> {
    if !path.exists() {
        let cfg = ToolConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: ToolConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &ToolConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = Path::new(&tmp_name);
    fs::write(tmp_path, contents).with_context(|| format!("write {}", tmp_path.display()))?;
    fs::rename(tmp_path, path).with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}
