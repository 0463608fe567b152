//! Rudder Engine - release name templates
//!
//! This crate provides a MiniJinja-based renderer for release name templates:
//! - Go-template call style (`{{ randAlphaNum 4 }}`) rewritten to call syntax
//! - Deterministic random helpers seeded by the template text
//! - String filters for trimming and truncating names

pub mod error;
pub mod filters;
pub mod functions;
pub mod name;

pub use error::{EngineError, Result, TemplateError, TemplateErrorKind};
pub use name::{NameGenerator, to_call_syntax};
