//! Stable exit codes for `pset` CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Unreadable or malformed input, bad config, or any other error.
pub const INVALID: i32 = 1;
/// The process parsed but cannot be finalized (unresolved reference,
/// sequence cycle, missing process name).
pub const UNRESOLVED: i32 = 2;
