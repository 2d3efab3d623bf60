#![deny(missing_docs)]

//! # Code Generation
//!
//! The generation orchestrator. Applies tag filtering and pruning to a working copy of the
//! document, resolves every component and operation, and aggregates the results into a
//! [`GeneratedModel`] that the emitter renders.
//!
//! Ordering guarantees: component sections are visited as schemas, parameters, responses,
//! request bodies (each sorted by name), then operation types in operation order. The first
//! definition of a type name wins.

use crate::emit;
use crate::error::{AppResult, ResultExt};
use crate::oas::document::OpenApiDocument;
use crate::oas::filter::filter_operations_by_tag;
use crate::oas::models::{Constants, EnumDefinition, OperationDefinition, Schema, TypeDefinition};
use crate::oas::naming::Naming;
use crate::oas::prune::prune_unused_components;
use crate::oas::ref_utils::{ExternalImport, ImportMapping};
use crate::oas::resolver::responses::media_type_tag;
use crate::oas::resolver::ResolveContext;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;
use utoipa::openapi::RefOr;

/// Generator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Options {
    /// Emit type declarations, enums and constants.
    pub generate_types: bool,
    /// Emit the route table, server trait and response enums.
    pub generate_server: bool,
    /// Embed the (filtered, pruned) document as a JSON string constant.
    pub embed_spec: bool,
    /// Do not pretty-print the output.
    pub skip_fmt: bool,
    /// Keep unreferenced components.
    pub skip_prune: bool,
    /// Emit `type X = Y` for references instead of newtypes.
    pub alias_types: bool,
    /// Keep only operations carrying one of these tags.
    pub include_tags: Vec<String>,
    /// Drop operations carrying any of these tags.
    pub exclude_tags: Vec<String>,
    /// Component schemas not to emit.
    pub exclude_schemas: Vec<String>,
    /// External document path → Rust module path.
    pub import_mapping: BTreeMap<String, String>,
    /// Template name → replacement template text.
    pub user_templates: BTreeMap<String, String>,
    /// Words upper-cased when camel-casing (e.g. `id` → `ID`).
    pub initialisms: Vec<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            generate_types: true,
            generate_server: false,
            embed_spec: false,
            skip_fmt: false,
            skip_prune: false,
            alias_types: false,
            include_tags: Vec::new(),
            exclude_tags: Vec::new(),
            exclude_schemas: Vec::new(),
            import_mapping: BTreeMap::new(),
            user_templates: BTreeMap::new(),
            initialisms: Vec::new(),
        }
    }
}

/// Everything the emitter needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedModel {
    /// Operation descriptors in path/method order.
    pub operations: Vec<OperationDefinition>,
    /// Component types, deduplicated by name.
    pub types: Vec<TypeDefinition>,
    /// Enum types across components and operations.
    pub enums: Vec<EnumDefinition>,
    /// Aggregated constants.
    pub constants: Constants,
    /// External module imports.
    pub imports: Vec<ExternalImport>,
    /// The working document after filtering and pruning.
    #[serde(skip)]
    pub document: OpenApiDocument,
}

impl GeneratedModel {
    /// Component types followed by operation types, deduplicated by name.
    pub fn all_types(&self) -> Vec<TypeDefinition> {
        let operation_types = self
            .operations
            .iter()
            .flat_map(|op| op.type_definitions.iter().cloned());
        dedupe_types(self.types.iter().cloned().chain(operation_types))
    }
}

/// Resolves `document` into a [`GeneratedModel`].
pub fn build_model(document: OpenApiDocument, options: &Options) -> AppResult<GeneratedModel> {
    let mut document = document;

    let removed = filter_operations_by_tag(
        &mut document,
        &options.include_tags,
        &options.exclude_tags,
    );
    debug!(removed, "Filtered operations by tag.");

    if !options.skip_prune {
        let pruned = prune_unused_components(&mut document)?;
        debug!(pruned, "Pruned unreferenced components.");
    }

    let naming = Naming::new(&options.initialisms);
    let imports = ImportMapping::new(&options.import_mapping);
    let ctx = ResolveContext::new(&naming, &imports).with_document(&document);

    let operations = ctx.operation_definitions(&document)?;

    let mut types = types_for_schemas(&ctx, &document, &options.exclude_schemas)?;
    types.extend(types_for_parameters(&ctx, &document)?);
    types.extend(types_for_responses(&ctx, &document)?);
    types.extend(types_for_request_bodies(&ctx, &document)?);
    let types = dedupe_types(types);

    let mut model = GeneratedModel {
        operations,
        types,
        enums: Vec::new(),
        constants: Constants::default(),
        imports: imports.imports(),
        document: OpenApiDocument::default(),
    };

    model.enums = enum_definitions(&model.all_types());
    model.constants = build_constants(&naming, &model.operations, &model.enums);
    debug!(
        operations = model.operations.len(),
        types = model.types.len(),
        enums = model.enums.len(),
        "Resolved OpenAPI document."
    );

    model.document = document;
    Ok(model)
}

/// Resolves `document` and renders it as the Rust module `module_name`.
pub fn generate(
    document: OpenApiDocument,
    module_name: &str,
    options: &Options,
) -> AppResult<String> {
    let model = build_model(document, options)?;
    emit::render(&model, module_name, options)
}

fn named_type(type_name: String, json_name: &str, schema: Schema) -> Vec<TypeDefinition> {
    let mut out = vec![TypeDefinition {
        type_name,
        json_name: json_name.to_string(),
        schema: Schema {
            additional_types: Vec::new(),
            ..schema.clone()
        },
    }];
    out.extend(schema.additional_type_defs());
    out
}

fn types_for_schemas(
    ctx: &ResolveContext<'_>,
    document: &OpenApiDocument,
    exclude: &[String],
) -> AppResult<Vec<TypeDefinition>> {
    let Some(components) = document.components.as_ref() else {
        return Ok(Vec::new());
    };

    let mut out = Vec::new();
    for (name, node) in &components.schemas {
        if exclude.contains(name) {
            continue;
        }
        let schema = ctx
            .resolve_schema(Some(node), &[name.clone()])
            .with_context(|| format!("error generating type definition for schema '{}'", name))?;
        out.extend(named_type(ctx.naming().type_name(name), name, schema));
    }
    Ok(out)
}

fn types_for_parameters(
    ctx: &ResolveContext<'_>,
    document: &OpenApiDocument,
) -> AppResult<Vec<TypeDefinition>> {
    let Some(components) = document.components.as_ref() else {
        return Ok(Vec::new());
    };

    let mut out = Vec::new();
    for (name, node) in &components.parameters {
        // Aliases of other components are emitted under the target's name.
        let RefOr::T(param) = node else {
            continue;
        };
        let (schema, _) = ctx
            .param_schema(param, &[name.clone()])
            .with_context(|| format!("error generating type definition for parameter '{}'", name))?;
        out.extend(named_type(ctx.naming().type_name(name), name, schema));
    }
    Ok(out)
}

fn types_for_responses(
    ctx: &ResolveContext<'_>,
    document: &OpenApiDocument,
) -> AppResult<Vec<TypeDefinition>> {
    let Some(components) = document.components.as_ref() else {
        return Ok(Vec::new());
    };

    let mut out = Vec::new();
    for (name, node) in &components.responses {
        let RefOr::T(response) = node else {
            continue;
        };
        let json = response
            .content
            .iter()
            .find(|(content_type, media)| {
                media_type_tag(content_type) == Some("JSON") && media.schema.is_some()
            });
        if let Some((_, media)) = json {
            let schema = ctx
                .resolve_schema(media.schema.as_ref(), &[name.clone()])
                .with_context(|| format!("error generating type definition for response '{}'", name))?;
            out.extend(named_type(ctx.naming().type_name(name), name, schema));
        }
    }
    Ok(out)
}

fn types_for_request_bodies(
    ctx: &ResolveContext<'_>,
    document: &OpenApiDocument,
) -> AppResult<Vec<TypeDefinition>> {
    let Some(components) = document.components.as_ref() else {
        return Ok(Vec::new());
    };

    let mut out = Vec::new();
    for (name, node) in &components.request_bodies {
        let RefOr::T(body) = node else {
            continue;
        };
        let json = body
            .content
            .iter()
            .find(|(content_type, media)| {
                media_type_tag(content_type) == Some("JSON") && media.schema.is_some()
            });
        if let Some((_, media)) = json {
            let schema = ctx
                .resolve_schema(media.schema.as_ref(), &[name.clone()])
                .with_context(|| {
                    format!("error generating type definition for request body '{}'", name)
                })?;
            out.extend(named_type(ctx.naming().type_name(name), name, schema));
        }
    }
    Ok(out)
}

/// Keeps the first definition of every type name.
pub fn dedupe_types(types: impl IntoIterator<Item = TypeDefinition>) -> Vec<TypeDefinition> {
    let mut seen = BTreeSet::new();
    types
        .into_iter()
        .filter(|td| seen.insert(td.type_name.clone()))
        .collect()
}

fn enum_definitions(types: &[TypeDefinition]) -> Vec<EnumDefinition> {
    types
        .iter()
        .filter(|td| td.schema.is_enum())
        .map(|td| EnumDefinition {
            type_name: td.type_name.clone(),
            schema: td.schema.clone(),
            value_wrapper: if td.schema.rust_type == "String" {
                "\"".to_string()
            } else {
                String::new()
            },
        })
        .collect()
}

fn build_constants(
    naming: &Naming,
    operations: &[OperationDefinition],
    enums: &[EnumDefinition],
) -> Constants {
    let providers: BTreeSet<String> = operations
        .iter()
        .flat_map(|op| op.security_definitions.iter())
        .map(|def| naming.type_name(&def.provider_name))
        .collect();
    let middlewares: BTreeSet<String> = operations
        .iter()
        .flat_map(|op| op.middlewares.iter().cloned())
        .collect();

    Constants {
        security_scheme_provider_names: providers.into_iter().collect(),
        middlewares: middlewares.into_iter().collect(),
        enum_definitions: enums.to_vec(),
    }
}
