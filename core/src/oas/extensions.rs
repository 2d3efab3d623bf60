#![deny(missing_docs)]

//! # Vendor Extensions
//!
//! Recognized `x-` keys and their decoders. A key that is present but holds a value of the
//! wrong shape is an `Extension` error, never silently ignored.

use crate::error::{AppError, AppResult};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;

/// Replaces the resolved type of a schema with a literal Rust type.
pub const EXT_RUST_TYPE: &str = "x-rust-type";
/// Extra `#[serde(...)]` entries for a struct field.
pub const EXT_EXTRA_TAGS: &str = "x-rust-extra-tags";
/// Overrides the default "skip when absent" serialization of a field.
pub const EXT_OMIT_EMPTY: &str = "x-omitempty";
/// Middleware identifiers attached to a path item or operation.
pub const EXT_MIDDLEWARES: &str = "x-rust-middlewares";

fn decode<T: DeserializeOwned>(key: &str, value: &Value) -> AppResult<T> {
    serde_json::from_value(value.clone())
        .map_err(|e| AppError::Extension(format!("failed to decode '{}': {}", key, e)))
}

/// Decodes `x-rust-type`.
pub fn rust_type_override(value: &Value) -> AppResult<String> {
    let name: String = decode(EXT_RUST_TYPE, value)?;
    if name.trim().is_empty() {
        return Err(AppError::Extension(format!(
            "'{}' must not be empty",
            EXT_RUST_TYPE
        )));
    }
    Ok(name)
}

/// Decodes `x-omitempty`.
pub fn omit_empty(value: &Value) -> AppResult<bool> {
    decode(EXT_OMIT_EMPTY, value)
}

/// Decodes `x-rust-extra-tags` (string map).
pub fn extra_tags(value: &Value) -> AppResult<BTreeMap<String, String>> {
    decode(EXT_EXTRA_TAGS, value)
}

/// Decodes `x-rust-middlewares` (ordered list of identifiers).
pub fn middlewares(value: &Value) -> AppResult<Vec<String>> {
    decode(EXT_MIDDLEWARES, value)
}
