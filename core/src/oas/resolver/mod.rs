#![deny(missing_docs)]

//! # Resolver Module
//!
//! Logic for resolving OpenAPI Schema definitions into Rust types.
//!
//! Handles:
//! - Recursive schema resolution with auxiliary type synthesis (`types`).
//! - `allOf` merging and conflict detection (`compose`).
//! - Parameter resolution, inline and by reference (`params`).
//! - Request body and response payload typing (`body`, `responses`).
//!
//! Everything hangs off [`ResolveContext`], which carries the identifier rules, the import
//! mapping and (optionally) the document used to follow component references.

pub mod body;
pub mod compose;
pub mod params;
pub mod responses;
pub mod types;

use crate::error::{AppError, AppResult};
use crate::oas::document::{
    OpenApiDocument, ParameterObject, RequestBodyObject, ResponseObject, SchemaRef,
};
use crate::oas::naming::Naming;
use crate::oas::ref_utils::{extract_component_name, ref_path_to_type, ImportMapping};
use std::cell::RefCell;
use utoipa::openapi::RefOr;

/// Upper bound on `$ref → $ref` chains followed when dereferencing components.
const MAX_REFERENCE_HOPS: usize = 32;

/// Shared state of one resolution run.
#[derive(Debug)]
pub struct ResolveContext<'a> {
    naming: &'a Naming,
    imports: &'a ImportMapping,
    document: Option<&'a OpenApiDocument>,
    expanding: RefCell<Vec<String>>,
}

impl<'a> ResolveContext<'a> {
    /// Creates a context without a backing document (component lookups fail).
    pub fn new(naming: &'a Naming, imports: &'a ImportMapping) -> Self {
        Self {
            naming,
            imports,
            document: None,
            expanding: RefCell::new(Vec::new()),
        }
    }

    /// Attaches the document whose `components` are used to follow local references.
    pub fn with_document(mut self, document: &'a OpenApiDocument) -> Self {
        self.document = Some(document);
        self
    }

    /// Identifier rules.
    pub fn naming(&self) -> &'a Naming {
        self.naming
    }

    /// External document mapping.
    pub fn imports(&self) -> &'a ImportMapping {
        self.imports
    }

    /// Resolves a `$ref` to its Rust type name.
    pub fn ref_type(&self, reference: &str) -> AppResult<String> {
        ref_path_to_type(reference, self.naming, self.imports)
    }

    /// Local schema component targeted by `reference`, with its component name.
    pub(crate) fn local_schema(&self, reference: &str) -> Option<(String, &'a SchemaRef)> {
        let name = extract_component_name(reference, "schemas")?;
        let schema = self.document?.schema(&name)?;
        Some((name, schema))
    }

    /// Runs `f` unless `name` is already being expanded further up the stack.
    pub(crate) fn expand_once<T>(
        &self,
        name: &str,
        f: impl FnOnce() -> AppResult<T>,
    ) -> Option<AppResult<T>> {
        if self.expanding.borrow().iter().any(|n| n == name) {
            return None;
        }
        self.expanding.borrow_mut().push(name.to_string());
        let result = f();
        self.expanding.borrow_mut().pop();
        Some(result)
    }

    /// Follows a parameter reference into `components.parameters`.
    pub fn deref_parameter(
        &self,
        node: &'a RefOr<ParameterObject>,
    ) -> AppResult<&'a ParameterObject> {
        self.follow(node, "parameters", |doc, name| doc.parameter(name))
    }

    /// Follows a request body reference into `components.requestBodies`.
    pub fn deref_request_body(
        &self,
        node: &'a RefOr<RequestBodyObject>,
    ) -> AppResult<&'a RequestBodyObject> {
        self.follow(node, "requestBodies", |doc, name| doc.request_body(name))
    }

    /// Follows a response reference into `components.responses`.
    pub fn deref_response(&self, node: &'a RefOr<ResponseObject>) -> AppResult<&'a ResponseObject> {
        self.follow(node, "responses", |doc, name| doc.response(name))
    }

    fn follow<T>(
        &self,
        node: &'a RefOr<T>,
        section: &str,
        lookup: impl Fn(&'a OpenApiDocument, &str) -> Option<&'a RefOr<T>>,
    ) -> AppResult<&'a T> {
        let mut current = node;
        for _ in 0..MAX_REFERENCE_HOPS {
            match current {
                RefOr::T(value) => return Ok(value),
                RefOr::Ref(r) => {
                    let name = extract_component_name(&r.ref_location, section).ok_or_else(|| {
                        AppError::Reference(format!(
                            "cannot follow reference '{}': only local #/components/{}/ references are supported here",
                            r.ref_location, section
                        ))
                    })?;
                    current = self
                        .document
                        .and_then(|doc| lookup(doc, &name))
                        .ok_or_else(|| {
                            AppError::Reference(format!(
                                "reference '{}' does not resolve to a component",
                                r.ref_location
                            ))
                        })?;
                }
            }
        }
        Err(AppError::Reference(format!(
            "reference chain in components.{} is too deep or cyclic",
            section
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
openapi: 3.0.3
paths: {}
components:
  parameters:
    Limit:
      name: limit
      in: query
      schema:
        type: integer
    Alias:
      $ref: '#/components/parameters/Limit'
    Loop:
      $ref: '#/components/parameters/Loop'
"#;

    #[test]
    fn test_deref_parameter_chain() {
        let doc = OpenApiDocument::from_yaml_str(YAML).unwrap();
        let naming = Naming::default();
        let imports = ImportMapping::default();
        let ctx = ResolveContext::new(&naming, &imports).with_document(&doc);

        let alias = doc.parameter("Alias").unwrap();
        assert_eq!(ctx.deref_parameter(alias).unwrap().name, "limit");

        let looping = doc.parameter("Loop").unwrap();
        assert!(matches!(
            ctx.deref_parameter(looping),
            Err(AppError::Reference(_))
        ));
    }

    #[test]
    fn test_deref_without_document_fails() {
        let naming = Naming::default();
        let imports = ImportMapping::default();
        let ctx = ResolveContext::new(&naming, &imports);
        let node: RefOr<ParameterObject> =
            RefOr::Ref(utoipa::openapi::Ref::new("#/components/parameters/Limit"));
        assert!(ctx.deref_parameter(&node).is_err());
    }

    #[test]
    fn test_expand_once_guards_reentry() {
        let naming = Naming::default();
        let imports = ImportMapping::default();
        let ctx = ResolveContext::new(&naming, &imports);

        let outer = ctx.expand_once("Pet", || {
            let inner = ctx.expand_once("Pet", || Ok(1));
            assert!(inner.is_none());
            Ok(2)
        });
        assert_eq!(outer.unwrap().unwrap(), 2);
        assert!(ctx.expand_once("Pet", || Ok(3)).is_some());
    }
}
