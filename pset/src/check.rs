//! Assemble a process from files and judge whether it can be finalized.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::core::error::ConfigError;
use crate::core::invariants::unknown_selected_paths;
use crate::core::process::{FinalizedProcess, Process};
use crate::io::cfg_store::load_process_file;
use crate::io::config::CheckConfig;

/// Result of checking one assembled process.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    pub process: Process,
    /// Finalization problems in declaration order; empty when finalizable.
    pub problems: Vec<ConfigError>,
    /// `(output module, path)` pairs whose event gate names an unknown path.
    pub unknown_gates: Vec<(String, String)>,
}

impl CheckOutcome {
    pub fn is_ok(&self) -> bool {
        self.problems.is_empty()
    }

    /// Finalize the checked process, failing with the first problem.
    pub fn finalize(self) -> Result<FinalizedProcess, ConfigError> {
        self.process.finalize()
    }
}

/// Fragment paths listed in the tool config, resolved against the
/// directory holding the config file.
pub fn config_fragments(check: &CheckConfig, config_path: &Path) -> Vec<PathBuf> {
    let base = config_path.parent().unwrap_or_else(|| Path::new(""));
    check
        .fragments
        .iter()
        .map(|fragment| base.join(fragment))
        .collect()
}

/// Load `main`, then each fragment in order, into one process.
pub fn assemble(main: &Path, fragments: &[PathBuf]) -> Result<Process> {
    let mut process = load_process_file(main)?;
    for path in fragments {
        let fragment = load_process_file(path)?;
        if !fragment.is_fragment() {
            debug!(path = %path.display(), name = %fragment.name(), "ignoring process name of loaded file");
        }
        process
            .load(fragment)
            .with_context(|| format!("load {}", path.display()))?;
    }
    Ok(process)
}

/// Assemble and collect every finalization problem without stopping at
/// the first.
pub fn check_files(main: &Path, fragments: &[PathBuf], check: &CheckConfig) -> Result<CheckOutcome> {
    let process = assemble(main, fragments)?;
    let problems = process.check();
    let unknown_gates = if check.warn_unknown_select_events {
        unknown_selected_paths(&process)
    } else {
        Vec::new()
    };
    for (module, path) in &unknown_gates {
        warn!(%module, %path, "SelectEvents refers to a path this process does not define");
    }
    debug!(
        path = %main.display(),
        problems = problems.len(),
        "checked process"
    );
    Ok(CheckOutcome {
        process,
        problems,
        unknown_gates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::render::{RenderOptions, render_process};
    use crate::test_support::{message_logger_fragment, stream_transfer_process};

    fn write(dir: &Path, name: &str, process: &Process) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, render_process(process, &RenderOptions::default()).as_str())
            .expect("write");
        path
    }

    #[test]
    fn assembles_main_and_fragments_in_order() {
        let temp = tempfile::tempdir().expect("tempdir");
        let main = write(temp.path(), "main.cfg", &stream_transfer_process());
        let logger = write(temp.path(), "logger.cfi", &message_logger_fragment());

        let outcome =
            check_files(&main, &[logger], &CheckConfig::default()).expect("check");
        assert!(outcome.is_ok());
        assert!(outcome.unknown_gates.is_empty());
        assert!(outcome.process.pset("MessageLogger").is_some());
        let finalized = outcome.finalize().expect("finalize");
        assert_eq!(finalized.name(), "TRANSFER");
    }

    #[test]
    fn collects_all_problems() {
        let temp = tempfile::tempdir().expect("tempdir");
        let main = temp.path().join("main.cfg");
        std::fs::write(
            &main,
            "process P\nproducer a = A {}\npath p = { a, missingModule, alsoMissing }\n",
        )
        .expect("write");

        let outcome = check_files(&main, &[], &CheckConfig::default()).expect("check");
        assert_eq!(outcome.problems.len(), 2);
        assert!(outcome.problems.iter().all(ConfigError::is_finalization_error));
        assert!(matches!(
            outcome.finalize(),
            Err(ConfigError::UnresolvedReference { name, .. }) if name == "missingModule"
        ));
    }

    #[test]
    fn fragment_clash_names_the_fragment() {
        let temp = tempfile::tempdir().expect("tempdir");
        let main = write(temp.path(), "main.cfg", &stream_transfer_process());
        let clash = temp.path().join("clash.cfi");
        std::fs::write(&clash, "analyzer a1 = Other {}\n").expect("write");

        let err = assemble(&main, &[clash]).expect_err("clash");
        assert!(format!("{err:#}").contains("clash.cfi"));
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::DuplicateName {
                path: "a1".to_string()
            })
        );
    }

    #[test]
    fn unknown_gates_follow_config() {
        let temp = tempfile::tempdir().expect("tempdir");
        let main = temp.path().join("main.cfg");
        std::fs::write(
            &main,
            "process P\n\
             output out = PoolOutputModule {\n\
               untracked PSet SelectEvents = { vstring SelectEvents = { 'pathElsewhere' } }\n\
             }\n\
             endpath e = { out }\n",
        )
        .expect("write");

        let outcome = check_files(&main, &[], &CheckConfig::default()).expect("check");
        assert!(outcome.is_ok());
        assert_eq!(
            outcome.unknown_gates,
            vec![("out".to_string(), "pathElsewhere".to_string())]
        );

        let quiet = CheckConfig {
            warn_unknown_select_events: false,
            ..CheckConfig::default()
        };
        let outcome = check_files(&main, &[], &quiet).expect("check");
        assert!(outcome.unknown_gates.is_empty());
    }

    #[test]
    fn config_fragments_are_relative_to_config() {
        let check = CheckConfig {
            fragments: vec!["frag/logger.cfi".to_string()],
            ..CheckConfig::default()
        };
        assert_eq!(
            config_fragments(&check, Path::new("/work/pset.toml")),
            vec![PathBuf::from("/work/frag/logger.cfi")]
        );
    }
}
