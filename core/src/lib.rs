#![deny(missing_docs)]

//! # oapigen Core
//!
//! Core library of the OpenAPI 3 to Rust generator.
//!
//! A document is loaded into [`OpenApiDocument`], reduced by tag filtering and pruning,
//! resolved into a [`GeneratedModel`] and rendered through the template set in [`emit`].

/// Shared error types.
pub mod error;

/// OpenAPI document shims, identifier rules and the resolution engine.
pub mod oas;

/// Generation orchestration.
pub mod codegen;

/// Template-driven source emission.
pub mod emit;

pub use codegen::{build_model, generate, GeneratedModel, Options};
pub use error::{AppError, AppResult, ResultExt};
pub use oas::{
    Constants, EnumDefinition, ImportMapping, Naming, OpenApiDocument, OperationDefinition,
    ResolveContext, Schema, TypeDefinition,
};
