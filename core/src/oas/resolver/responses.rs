#![deny(missing_docs)]

//! # Response Resolution
//!
//! Types the payloads of an operation's responses. Status codes and media types are visited
//! in sorted order; only JSON, YAML and XML media types with a schema produce a definition.

use crate::error::{AppResult, ResultExt};
use crate::oas::document::ResponseObject;
use crate::oas::models::{ResponseTypeDefinition, TypeDefinition};
use crate::oas::resolver::ResolveContext;
use std::collections::BTreeMap;
use utoipa::openapi::RefOr;

/// Short tag of a response media type, if it is one the generator types.
pub fn media_type_tag(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "application/json" | "text/x-json" => Some("JSON"),
        "application/yaml" | "application/x-yaml" | "text/yaml" | "text/x-yaml" => Some("YAML"),
        "application/xml" | "text/xml" => Some("XML"),
        other if other.ends_with("+json") => Some("JSON"),
        _ => None,
    }
}

impl<'a> ResolveContext<'a> {
    /// Builds typed response definitions for one operation.
    pub fn response_type_definitions(
        &self,
        operation_id: &str,
        responses: &'a BTreeMap<String, RefOr<ResponseObject>>,
    ) -> AppResult<Vec<ResponseTypeDefinition>> {
        let mut out = Vec::new();

        for (code, node) in responses {
            let response = self
                .deref_response(node)
                .with_context(|| format!("error resolving response '{}'", code))?;

            let mut seen_tags = Vec::new();
            for (content_type, media) in &response.content {
                let Some(tag) = media_type_tag(content_type) else {
                    continue;
                };
                let Some(schema_node) = media.schema.as_ref() else {
                    continue;
                };
                // First media type per tag wins (e.g. application/json over text/x-json).
                if seen_tags.contains(&tag) {
                    continue;
                }
                seen_tags.push(tag);

                let type_name = format!(
                    "{}{}{}Response",
                    operation_id,
                    tag,
                    self.naming().to_camel_case(code)
                );
                let schema = self
                    .resolve_schema(Some(schema_node), &[type_name.clone()])
                    .with_context(|| {
                        format!("error generating type for response '{}' ({})", code, content_type)
                    })?;

                out.push(ResponseTypeDefinition {
                    type_definition: TypeDefinition {
                        type_name,
                        json_name: code.clone(),
                        schema,
                    },
                    content_type: content_type.clone(),
                    response_name: code.clone(),
                    name_tag: tag.to_string(),
                });
            }
        }
        Ok(out)
    }
}
