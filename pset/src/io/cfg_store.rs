//! Process files on disk: the text form (`.cfg`, `.cfi`, `.cff`, anything
//! else) and JSON documents (`.json`).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::core::parse::parse_process;
use crate::core::process::Process;
use crate::core::render::{RenderOptions, render_process};
use crate::io::config::{OutputFormat, write_atomic};
use crate::io::json_store::{load_process_json, process_to_json};

/// Format implied by a file's extension.
pub fn format_for(path: &Path) -> OutputFormat {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => OutputFormat::Json,
        _ => OutputFormat::Text,
    }
}

/// Load a process or fragment, picking the reader by extension.
pub fn load_process_file(path: &Path) -> Result<Process> {
    if format_for(path) == OutputFormat::Json {
        return load_process_json(path);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let process = parse_process(&contents).with_context(|| format!("parse {}", path.display()))?;
    debug!(
        path = %path.display(),
        process = %process.name(),
        modules = process.modules().count(),
        "loaded process file"
    );
    Ok(process)
}

/// Render `process` in `format`.
pub fn render(process: &Process, format: OutputFormat, options: &RenderOptions) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_process(process, options).into_string()),
        OutputFormat::Json => process_to_json(process),
    }
}

/// Write `process` to `path` in `format`, replacing any existing file.
pub fn write_process_file(
    path: &Path,
    process: &Process,
    format: OutputFormat,
    options: &RenderOptions,
) -> Result<()> {
    let contents = render(process, format, options)
        .with_context(|| format!("render {}", path.display()))?;
    write_atomic(path, &contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ConfigError;
    use crate::test_support::stream_transfer_process;

    #[test]
    fn text_and_json_files_round_trip() {
        let temp = tempfile::tempdir().expect("tempdir");
        let process = stream_transfer_process();
        for name in ["transfer.cfg", "transfer.json"] {
            let path = temp.path().join(name);
            let format = format_for(&path);
            write_process_file(&path, &process, format, &RenderOptions::default())
                .expect("write");
            assert_eq!(load_process_file(&path).expect("load"), process);
        }
    }

    #[test]
    fn parse_errors_keep_their_type_under_context() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("broken.cff");
        fs::write(&path, "process P\nproducer a = A { bool x = yes }\n").expect("write");

        let err = load_process_file(&path).expect_err("broken");
        assert!(format!("{err:#}").contains("broken.cff"));
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::Parse { line: 2, .. })
        ));
    }

    #[test]
    fn extension_picks_format() {
        assert_eq!(format_for(Path::new("a/b.json")), OutputFormat::Json);
        assert_eq!(format_for(Path::new("a/b_cff.cff")), OutputFormat::Text);
        assert_eq!(format_for(Path::new("noext")), OutputFormat::Text);
    }
}
