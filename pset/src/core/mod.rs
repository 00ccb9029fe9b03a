//! Pure configuration model: values, parameter sets, the process registry,
//! and the text form.
//!
//! Nothing in here touches the filesystem. File formats and the CLI live in
//! [`crate::io`] and [`crate::check`].

pub mod error;
pub mod input_tag;
pub mod invariants;
pub mod lexer;
pub mod module;
pub mod parse;
pub mod path;
pub mod process;
pub mod pset;
pub mod render;
pub mod value;
