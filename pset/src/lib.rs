//! Typed, hierarchical configuration trees for event-processing jobs.
//!
//! A job is described by a [`core::process::Process`]: named parameter sets,
//! module descriptors that own their parameters, and paths that order
//! modules by label. The crate keeps a strict split:
//!
//! - **[`core`]**: Pure, deterministic logic (parameter sets, the process
//!   registry, rendering and parsing of the text form). No I/O.
//! - **[`io`]**: Side-effecting operations (tool config, process files).
//!
//! [`check`] combines the two to implement the CLI's `check` command.

pub mod check;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
