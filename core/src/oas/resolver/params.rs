#![deny(missing_docs)]

//! # Parameter Resolution
//!
//! Logic for resolving OpenAPI Parameters into [`ParameterDefinition`]s.
//!
//! A parameter is typed from its `schema`, or from its `content` when the single media type
//! is `application/json`; any other `content` is passed through as a string. Style and
//! explode default per location.

use crate::error::{AppError, AppResult, ResultExt};
use crate::oas::document::{ParameterObject, SecurityRequirement};
use crate::oas::models::{ParamEncoding, ParameterDefinition, Schema, SecurityDefinition};
use crate::oas::ref_utils::is_type_reference;
use crate::oas::resolver::ResolveContext;
use utoipa::openapi::RefOr;

impl<'a> ResolveContext<'a> {
    /// Describes a list of parameters.
    ///
    /// # Arguments
    ///
    /// * `params` - Parameters as declared (inline or `$ref`).
    /// * `path` - Name path prefix; each parameter is resolved at `path + [name]`.
    pub fn describe_parameters(
        &self,
        params: &'a [RefOr<ParameterObject>],
        path: &[String],
    ) -> AppResult<Vec<ParameterDefinition>> {
        let mut out = Vec::with_capacity(params.len());

        for node in params {
            let param = self.deref_parameter(node)?;
            let mut param_path = path.to_vec();
            param_path.push(param.name.clone());

            let (schema, encoding) = self
                .param_schema(param, &param_path)
                .with_context(|| format!("error generating type for param ({})", param.name))?;

            let schema = match node {
                RefOr::Ref(r) if is_type_reference(&r.ref_location) => Schema {
                    ref_type: self.ref_type(&r.ref_location)?,
                    skip_optional: schema.skip_optional,
                    description: schema.description,
                    ..Default::default()
                },
                _ => self.hoist_if_struct(schema, &param_path),
            };

            out.push(ParameterDefinition {
                param_name: param.name.clone(),
                location: param.location,
                required: param.required,
                style: param
                    .style
                    .clone()
                    .unwrap_or_else(|| ParameterDefinition::default_style(param.location).to_string()),
                explode: param
                    .explode
                    .unwrap_or_else(|| ParameterDefinition::default_explode(param.location)),
                encoding,
                description: param.description.clone().unwrap_or_default(),
                schema,
                extensions: param
                    .extra
                    .iter()
                    .filter(|(k, _)| k.starts_with("x-"))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            });
        }
        Ok(out)
    }

    /// Resolves the schema of a single parameter.
    pub fn param_schema(
        &self,
        param: &ParameterObject,
        path: &[String],
    ) -> AppResult<(Schema, ParamEncoding)> {
        if let Some(schema) = &param.schema {
            return Ok((self.resolve_schema(Some(schema), path)?, ParamEncoding::Styled));
        }
        if param.content.is_empty() {
            return Err(AppError::Parameter(format!(
                "parameter '{}' has no schema or content",
                param.name
            )));
        }
        if param.content.len() == 1 {
            if let Some(media) = param.content.get("application/json") {
                let schema = self.resolve_schema(media.schema.as_ref(), path)?;
                return Ok((schema, ParamEncoding::Json));
            }
        }
        Ok((Schema::of_type("String"), ParamEncoding::PassThrough))
    }
}

/// Flattens security requirements into definitions, scheme names sorted within a requirement.
pub fn describe_security(requirements: &[SecurityRequirement]) -> Vec<SecurityDefinition> {
    requirements
        .iter()
        .flat_map(|requirement| {
            requirement
                .iter()
                .map(|(provider, scopes)| SecurityDefinition {
                    provider_name: provider.clone(),
                    scopes: scopes.clone(),
                })
        })
        .collect()
}
