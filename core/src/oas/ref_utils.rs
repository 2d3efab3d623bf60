#![deny(missing_docs)]

//! # Reference Utilities
//!
//! Turns `$ref` strings into canonical Rust type names.
//!
//! * Local references must have the exact shape `#/components/{kind}/{name}`.
//! * Cross-document references (`other.yaml#/components/schemas/Foo`) are only accepted when
//!   the document is listed in the [`ImportMapping`]; they resolve to
//!   `{alias}::{TypeName}` where the alias is stable for a given mapping.
//!
//! Nothing here fetches documents.

use crate::error::{AppError, AppResult};
use crate::oas::naming::Naming;
use percent_encoding::percent_decode_str;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// A Rust module that external documents map onto, with its generated alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalImport {
    /// Alias used in generated code (`external_ref0`, ...).
    pub alias: String,
    /// Module path the alias refers to (e.g. `crate::common`).
    pub module_path: String,
}

/// Mapping of external document paths to Rust modules.
///
/// Distinct module paths are sorted and numbered, so the same input mapping always yields
/// the same aliases, and documents mapped to one module share its alias.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportMapping {
    by_document: BTreeMap<String, ExternalImport>,
}

impl ImportMapping {
    /// Builds the mapping from `document path → module path` pairs.
    pub fn new(mapping: &BTreeMap<String, String>) -> Self {
        let modules: BTreeSet<&str> = mapping.values().map(String::as_str).collect();
        let aliases: BTreeMap<&str, String> = modules
            .into_iter()
            .enumerate()
            .map(|(i, module)| (module, format!("external_ref{}", i)))
            .collect();

        let by_document = mapping
            .iter()
            .map(|(doc, module)| {
                let import = ExternalImport {
                    alias: aliases[module.as_str()].clone(),
                    module_path: module.clone(),
                };
                (doc.clone(), import)
            })
            .collect();

        Self { by_document }
    }

    /// Import entry for an external document.
    pub fn get(&self, document: &str) -> Option<&ExternalImport> {
        self.by_document.get(document)
    }

    /// Distinct imports ordered by alias.
    pub fn imports(&self) -> Vec<ExternalImport> {
        let mut seen = BTreeMap::new();
        for import in self.by_document.values() {
            seen.entry(import.alias.clone())
                .or_insert_with(|| import.clone());
        }
        seen.into_values().collect()
    }
}

/// True when `reference` names a type (contains a fragment). Whole-document references do not.
pub fn is_type_reference(reference: &str) -> bool {
    !reference.is_empty() && reference.contains('#')
}

/// True when `reference` points into the current document.
pub fn is_local_reference(reference: &str) -> bool {
    reference.starts_with('#')
}

/// Resolves a `$ref` to the Rust type it denotes.
///
/// # Arguments
///
/// * `reference` - The raw `$ref` value.
/// * `naming` - Identifier rules used for the component name.
/// * `imports` - External document mapping.
pub fn ref_path_to_type(
    reference: &str,
    naming: &Naming,
    imports: &ImportMapping,
) -> AppResult<String> {
    resolve_ref(reference, naming, imports, true)
}

fn resolve_ref(
    reference: &str,
    naming: &Naming,
    imports: &ImportMapping,
    local: bool,
) -> AppResult<String> {
    if is_local_reference(reference) {
        let segments: Vec<&str> = reference.split('/').collect();
        let valid_depth = if local {
            segments.len() == 4
        } else {
            segments.len() == 4 || segments.len() == 2
        };
        if !valid_depth || segments[0] != "#" {
            return Err(AppError::Reference(format!(
                "unexpected reference depth: '{}' (expected #/components/{{kind}}/{{name}})",
                reference
            )));
        }
        let name = decode_pointer_segment(segments[segments.len() - 1]);
        return Ok(naming.type_name(&name));
    }

    let parts: Vec<&str> = reference.split('#').collect();
    if parts.len() != 2 {
        return Err(AppError::Reference(format!(
            "unsupported reference: '{}'",
            reference
        )));
    }
    let document = parts[0];
    let import = imports.get(document).ok_or_else(|| {
        AppError::Reference(format!(
            "unrecognized external reference '{}'; please provide the known import for this reference",
            reference
        ))
    })?;
    let inner = resolve_ref(&format!("#{}", parts[1]), naming, imports, false)?;
    Ok(format!("{}::{}", import.alias, inner))
}

/// Extracts a component name from a local `$ref` of the shape `#/components/{section}/{name}`.
///
/// Returns `None` for external references, other sections or malformed pointers.
pub fn extract_component_name(reference: &str, section: &str) -> Option<String> {
    let pointer = reference.strip_prefix("#/")?;
    let segments: Vec<&str> = pointer.split('/').collect();

    if segments.len() != 3 || segments[0] != "components" || segments[1] != section {
        return None;
    }

    let name = decode_pointer_segment(segments[2]);
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Decodes a JSON Pointer segment (handles `~1` and `~0`).
pub fn decode_pointer_segment(segment: &str) -> String {
    let decoded = segment.replace("~1", "/").replace("~0", "~");
    percent_decode_str(&decoded)
        .decode_utf8_lossy()
        .into_owned()
}
