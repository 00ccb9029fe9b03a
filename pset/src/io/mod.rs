//! File-backed I/O: tool configuration and process documents.

pub mod cfg_store;
pub mod config;
pub mod json_store;
