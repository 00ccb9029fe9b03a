//! Process-level invariants checked at finalization.

use std::collections::BTreeMap;

use crate::core::error::ConfigError;
use crate::core::module::PathKind;
use crate::core::process::Process;

/// Check everything that can only be judged on the assembled process:
/// - the process has a name
/// - every path/sequence entry names a module or a sequence
/// - sequences do not contain themselves, directly or indirectly
///
/// Problems are returned in declaration order.
pub fn check_process(process: &Process) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    if process.is_fragment() {
        errors.push(ConfigError::MissingProcessName);
    }

    for path in process.paths() {
        for entry in &path.entries {
            if !resolves(process, entry) {
                errors.push(ConfigError::UnresolvedReference {
                    name: entry.clone(),
                    referenced_by: path.describe(),
                });
            }
        }
    }

    if let Some(chain) = find_sequence_cycle(process) {
        errors.push(ConfigError::SequenceCycle { chain });
    }

    errors
}

/// A label resolves if it names a module or a sequence (paths cannot nest).
pub fn resolves(process: &Process, label: &str) -> bool {
    process.module(label).is_some()
        || process
            .path(label)
            .is_some_and(|def| def.kind == PathKind::Sequence)
}

/// Output modules whose `SelectEvents` gate names a path this process does
/// not define, as `(module label, path name)` pairs.
///
/// Not an error: gates may refer to paths of a process this one is merged
/// into, and how the engine treats them is its own business.
pub fn unknown_selected_paths(process: &Process) -> Vec<(String, String)> {
    let mut unknown = Vec::new();
    for (label, module) in process.modules() {
        for selected in module.selected_paths() {
            let known = process
                .path(selected)
                .is_some_and(|def| def.kind != PathKind::Sequence);
            if !known {
                unknown.push((label.to_string(), selected.to_string()));
            }
        }
    }
    unknown
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Mark {
    Temp,
    Perm,
}

/// First sequence cycle found by DFS colouring, as a closed chain
/// (`a -> b -> a`), searching roots in declaration order.
fn find_sequence_cycle(process: &Process) -> Option<Vec<String>> {
    let sequences: Vec<&str> = process
        .paths()
        .filter(|def| def.kind == PathKind::Sequence)
        .map(|def| def.name.as_str())
        .collect();

    let mut marks = BTreeMap::<&str, Mark>::new();
    let mut stack = Vec::<&str>::new();
    for root in sequences {
        stack.clear();
        if let Some(chain) = visit(process, root, &mut marks, &mut stack) {
            return Some(chain);
        }
    }
    None
}

fn visit<'a>(
    process: &'a Process,
    name: &'a str,
    marks: &mut BTreeMap<&'a str, Mark>,
    stack: &mut Vec<&'a str>,
) -> Option<Vec<String>> {
    match marks.get(name) {
        Some(Mark::Perm) => return None,
        Some(Mark::Temp) => {
            // `name` is on the current stack: close the loop from its first occurrence.
            let start = stack.iter().position(|entry| *entry == name).unwrap_or(0);
            let mut chain: Vec<String> = stack[start..].iter().map(|s| s.to_string()).collect();
            chain.push(name.to_string());
            return Some(chain);
        }
        None => {}
    }

    marks.insert(name, Mark::Temp);
    stack.push(name);

    if let Some(def) = process.path(name) {
        for child in &def.entries {
            let is_sequence = process
                .path(child)
                .is_some_and(|child_def| child_def.kind == PathKind::Sequence);
            if is_sequence {
                if let Some(chain) = visit(process, child, marks, stack) {
                    return Some(chain);
                }
            }
        }
    }

    stack.pop();
    marks.insert(name, Mark::Perm);
    None
}
