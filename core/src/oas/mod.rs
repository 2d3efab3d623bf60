#![deny(missing_docs)]

//! # OpenAPI Module
//!
//! - **document**: Deserialization shims for the input document.
//! - **extensions**: Recognized vendor extensions.
//! - **filter** / **prune**: Working-document reductions applied before resolution.
//! - **models**: Intermediate Representation definitions.
//! - **naming**: Identifier sanitizing.
//! - **ref_utils**: `$ref` → type name resolution and import mapping.
//! - **resolver**: Schema, parameter, body and response resolution.
//! - **routes**: Operation description.

pub mod document;
pub mod extensions;
pub mod filter;
pub mod models;
pub mod naming;
pub mod prune;
pub mod ref_utils;
pub mod resolver;
pub mod routes;

pub use document::{OpenApiDocument, ParameterLocation};
pub use models::{
    CompositionMember, Constants, EnumDefinition, OperationDefinition, ParameterDefinition,
    Property, RequestBodyDefinition, ResponseTypeDefinition, Schema, SecurityDefinition,
    TypeDefinition,
};
pub use naming::Naming;
pub use ref_utils::{ExternalImport, ImportMapping};
pub use resolver::ResolveContext;
