#![deny(missing_docs)]

//! # Routes Module
//!
//! Entry point for describing OpenAPI `paths`.
//! Orchestrates Document Shims -> Builder -> IR Models.

pub mod builder;

pub use builder::{generate_type_defs_for_operation, sort_params_by_path};
