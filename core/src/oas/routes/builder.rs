#![deny(missing_docs)]

//! # Operation Builder
//!
//! Logic that transforms every (path, method) pair of the document into an
//! [`OperationDefinition`].
//!
//! Paths are visited in sorted order and methods in sorted upper-case order, so the output
//! is independent of how the document was written.

use crate::error::{AppError, AppResult, ResultExt};
use crate::oas::document::{Extensible, OpenApiDocument, Operation, ParameterLocation};
use crate::oas::extensions::{self, EXT_MIDDLEWARES};
use crate::oas::models::{
    OperationDefinition, ParameterDefinition, Property, Schema, TypeDefinition,
};
use crate::oas::naming::{generate_default_operation_id, ordered_params_from_uri};
use crate::oas::resolver::params::describe_security;
use crate::oas::resolver::ResolveContext;

impl<'a> ResolveContext<'a> {
    /// Describes every operation of `document`.
    pub fn operation_definitions(
        &self,
        document: &'a OpenApiDocument,
    ) -> AppResult<Vec<OperationDefinition>> {
        let mut operations = Vec::new();

        for (path, item) in &document.paths {
            let global_params = self
                .describe_parameters(&item.parameters, &[])
                .with_context(|| format!("error describing global parameters for {}", path))?;

            let path_middlewares = match item.extension(EXT_MIDDLEWARES) {
                Some(value) => extensions::middlewares(value)
                    .with_context(|| format!("error reading middlewares of path {}", path))?,
                None => Vec::new(),
            };

            for (method, operation) in item.operations() {
                let definition = self
                    .build_operation(
                        document,
                        path,
                        method,
                        operation,
                        &global_params,
                        &path_middlewares,
                    )
                    .with_context(|| format!("error describing operation {} {}", method, path))?;
                operations.push(definition);
            }
        }
        Ok(operations)
    }

    fn build_operation(
        &self,
        document: &'a OpenApiDocument,
        path: &str,
        method: &str,
        operation: &'a Operation,
        global_params: &[ParameterDefinition],
        path_middlewares: &[String],
    ) -> AppResult<OperationDefinition> {
        let operation_id = match operation.operation_id.as_deref().filter(|id| !id.is_empty()) {
            Some(id) => self.naming().to_camel_case(id),
            None => self
                .naming()
                .to_camel_case(&generate_default_operation_id(method, path)?),
        };

        let local_params = self
            .describe_parameters(&operation.parameters, &[format!("{}Params", operation_id)])
            .with_context(|| format!("error describing parameters of {}", operation_id))?;

        let mut path_params = Vec::new();
        let mut header_params = Vec::new();
        let mut query_params = Vec::new();
        let mut cookie_params = Vec::new();
        for param in merge_parameters(global_params, local_params) {
            match param.location {
                ParameterLocation::Path => path_params.push(param),
                ParameterLocation::Header => header_params.push(param),
                ParameterLocation::Query => query_params.push(param),
                ParameterLocation::Cookie => cookie_params.push(param),
            }
        }
        let path_params = sort_params_by_path(path, path_params)?;

        let mut middlewares = path_middlewares.to_vec();
        if let Some(value) = operation.extension(EXT_MIDDLEWARES) {
            middlewares.extend(extensions::middlewares(value)?);
        }

        let (bodies, body_types) = self
            .generate_body_definitions(&operation_id, operation.request_body.as_ref())
            .with_context(|| format!("error generating body definitions for {}", operation_id))?;
        let body_required = match operation.request_body.as_ref() {
            Some(node) => self.deref_request_body(node)?.required,
            None => false,
        };

        let security_definitions = operation
            .security
            .as_ref()
            .or(document.security.as_ref())
            .map(|requirements| describe_security(requirements))
            .unwrap_or_default();

        let responses = self
            .response_type_definitions(&operation_id, &operation.responses)
            .with_context(|| format!("error generating response types for {}", operation_id))?;

        let mut definition = OperationDefinition {
            operation_id,
            method: method.to_string(),
            path: path.to_string(),
            path_params,
            header_params,
            query_params,
            cookie_params,
            bodies,
            type_definitions: Vec::new(),
            security_definitions,
            middlewares,
            body_required,
            summary: operation.summary.clone().unwrap_or_default(),
            description: operation.description.clone().unwrap_or_default(),
            tags: operation.tags.clone(),
            responses,
        };

        let mut type_definitions = body_types;
        type_definitions.extend(generate_type_defs_for_operation(&definition));
        definition.type_definitions = type_definitions;
        Ok(definition)
    }
}

/// Path-level parameters not overridden by the operation, then the operation's own.
fn merge_parameters(
    global: &[ParameterDefinition],
    local: Vec<ParameterDefinition>,
) -> Vec<ParameterDefinition> {
    let mut merged: Vec<ParameterDefinition> = global
        .iter()
        .filter(|g| {
            !local
                .iter()
                .any(|l| l.param_name == g.param_name && l.location == g.location)
        })
        .cloned()
        .collect();
    merged.extend(local);
    merged
}

/// Reorders path parameters to match the order of `{name}` tokens in `path`.
pub fn sort_params_by_path(
    path: &str,
    params: Vec<ParameterDefinition>,
) -> AppResult<Vec<ParameterDefinition>> {
    let names = ordered_params_from_uri(path);
    if names.len() != params.len() {
        return Err(AppError::PathMismatch(format!(
            "path '{}' has {} positional parameters, but {} are declared",
            path,
            names.len(),
            params.len()
        )));
    }

    let mut sorted: Vec<ParameterDefinition> = Vec::with_capacity(params.len());
    for name in names {
        if sorted.iter().any(|p| p.param_name == name) {
            return Err(AppError::PathMismatch(format!(
                "path '{}' uses parameter '{}' more than once",
                path, name
            )));
        }
        let param = params
            .iter()
            .find(|p| p.param_name == name)
            .ok_or_else(|| {
                AppError::PathMismatch(format!(
                    "path '{}' refers to parameter '{}', which is not declared",
                    path, name
                ))
            })?;
        sorted.push(param.clone());
    }
    Ok(sorted)
}

/// Types an operation introduces besides its body types.
///
/// The `{OperationId}Params` struct (when query, header or cookie parameters exist), the
/// typed responses, then every auxiliary type of parameters, bodies and responses.
pub fn generate_type_defs_for_operation(op: &OperationDefinition) -> Vec<TypeDefinition> {
    let mut out = Vec::new();

    if op.requires_param_object() {
        let properties = op
            .params()
            .into_iter()
            .map(|param| Property {
                description: param.description.clone(),
                json_field_name: param.param_name.clone(),
                schema: Schema {
                    additional_types: Vec::new(),
                    ..param.schema.clone()
                },
                required: param.required,
                nullable: false,
                extensions: param.extensions.clone(),
                omit_empty: !param.required,
                extra_tags: Default::default(),
            })
            .collect();
        let type_name = format!("{}Params", op.operation_id);
        out.push(TypeDefinition {
            type_name: type_name.clone(),
            json_name: type_name,
            schema: Schema {
                properties,
                description: format!("Parameters for {}.", op.operation_id),
                ..Default::default()
            },
        });
    }

    for response in &op.responses {
        out.push(TypeDefinition {
            schema: Schema {
                additional_types: Vec::new(),
                ..response.type_definition.schema.clone()
            },
            ..response.type_definition.clone()
        });
    }

    for param in op.all_params() {
        out.extend(param.schema.additional_type_defs());
    }
    for body in &op.bodies {
        out.extend(body.schema.additional_type_defs());
    }
    for response in &op.responses {
        out.extend(response.type_definition.schema.additional_type_defs());
    }
    out
}
