#![deny(missing_docs)]

//! # Request Body Resolution
//!
//! Only `application/json` bodies are typed. A body whose schema is not a reference gets a
//! synthesized `{OperationId}JSONBody` type; a body given by `$ref` to
//! `components/requestBodies` uses that component's type.

use crate::error::{AppResult, ResultExt};
use crate::oas::document::RequestBodyObject;
use crate::oas::models::{RequestBodyDefinition, Schema, TypeDefinition};
use crate::oas::ref_utils::is_type_reference;
use crate::oas::resolver::ResolveContext;
use utoipa::openapi::RefOr;

/// Media type of the typed body.
pub const JSON_CONTENT_TYPE: &str = "application/json";

impl<'a> ResolveContext<'a> {
    /// Builds the body definitions of an operation and the types they introduce.
    ///
    /// The returned type list holds the synthesized body types only; auxiliary types of the
    /// body schemas stay attached to each definition's schema.
    pub fn generate_body_definitions(
        &self,
        operation_id: &str,
        body: Option<&'a RefOr<RequestBodyObject>>,
    ) -> AppResult<(Vec<RequestBodyDefinition>, Vec<TypeDefinition>)> {
        let Some(node) = body else {
            return Ok((Vec::new(), Vec::new()));
        };
        let request_body = self.deref_request_body(node)?;

        let mut definitions = Vec::new();
        let mut types = Vec::new();

        for (content_type, media) in &request_body.content {
            if content_type != JSON_CONTENT_TYPE {
                continue;
            }
            let tag = "JSON";
            let body_type_name = format!("{}{}Body", operation_id, tag);

            let mut schema = self
                .resolve_schema(media.schema.as_ref(), &[body_type_name.clone()])
                .with_context(|| format!("error generating request body definition ({})", content_type))?;

            if let RefOr::Ref(r) = node {
                if is_type_reference(&r.ref_location) {
                    schema = Schema {
                        ref_type: self.ref_type(&r.ref_location)?,
                        description: schema.description,
                        ..Default::default()
                    };
                }
            }

            if !schema.is_ref() {
                let nested = schema.additional_type_defs();
                let description = schema.description.clone();
                types.push(TypeDefinition {
                    type_name: body_type_name.clone(),
                    json_name: body_type_name.clone(),
                    schema: Schema {
                        additional_types: Vec::new(),
                        ..schema
                    },
                });
                schema = Schema {
                    ref_type: body_type_name,
                    additional_types: nested,
                    description,
                    ..Default::default()
                };
            }

            definitions.push(RequestBodyDefinition {
                content_type: content_type.clone(),
                name_tag: tag.to_string(),
                schema,
                required: request_body.required,
                is_default: true,
            });
        }

        Ok((definitions, types))
    }
}
