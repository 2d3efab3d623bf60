#![deny(missing_docs)]

//! # Emitter
//!
//! Renders a [`GeneratedModel`] to Rust source through a named `tera` template set.
//!
//! Sections are rendered in a fixed order (imports, constants, enums, typedefs, params,
//! server, inline-spec) and concatenated. Unless formatting is skipped, the result is parsed
//! with `syn` and printed with `prettyplease`.

pub mod views;

use crate::codegen::{GeneratedModel, Options};
use crate::error::{AppError, AppResult};
use crate::oas::naming::{string_to_doc_comment, Naming};
use std::collections::{BTreeMap, HashMap};
use tera::{Context, Tera, Value};
use tracing::{debug, warn};
use views::{string_literal, ModuleView};

/// Template names, in emission order.
pub const TEMPLATE_NAMES: [&str; 7] = [
    "imports",
    "constants",
    "enums",
    "typedefs",
    "params",
    "server",
    "inline-spec",
];

fn builtin_template(name: &str) -> Option<&'static str> {
    match name {
        "imports" => Some(include_str!("../../templates/imports.tera")),
        "constants" => Some(include_str!("../../templates/constants.tera")),
        "enums" => Some(include_str!("../../templates/enums.tera")),
        "typedefs" => Some(include_str!("../../templates/typedefs.tera")),
        "params" => Some(include_str!("../../templates/params.tera")),
        "server" => Some(include_str!("../../templates/server.tera")),
        "inline-spec" => Some(include_str!("../../templates/inline-spec.tera")),
        _ => None,
    }
}

/// Flattens a tera error and its causes into one message.
fn describe_tera_error(error: &tera::Error) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = std::error::Error::source(cause);
    }
    message
}

/// Builds the template registry, applying user overrides by name.
///
/// Overrides for names that are not part of the template set are ignored with a warning.
pub fn load_templates(overrides: &BTreeMap<String, String>) -> AppResult<Tera> {
    let mut tera = Tera::default();
    tera.register_filter("doc", doc_filter);
    tera.register_filter("literal", literal_filter);

    for name in overrides.keys() {
        if builtin_template(name).is_none() {
            warn!(template = %name, "Ignoring override for unknown template.");
        }
    }

    for name in TEMPLATE_NAMES {
        let text = match overrides.get(name) {
            Some(text) => {
                debug!(template = name, "Using user template.");
                text.as_str()
            }
            None => builtin_template(name).unwrap_or_default(),
        };
        tera.add_raw_template(name, text).map_err(|e| {
            AppError::Template(format!(
                "Failed to load {} template: {}",
                name,
                describe_tera_error(&e)
            ))
        })?;
    }
    Ok(tera)
}

/// `{{ text | doc }}`: free text as `///` lines.
fn doc_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("doc filter expects a string"))?;
    Ok(Value::String(string_to_doc_comment(text)))
}

/// `{{ text | literal }}`: a quoted Rust string literal.
fn literal_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("literal filter expects a string"))?;
    Ok(Value::String(string_literal(text)))
}

/// Names of the sections to render for `options`.
fn sections(options: &Options) -> Vec<&'static str> {
    let mut out = vec!["imports"];
    if options.generate_types {
        out.extend(["constants", "enums", "typedefs", "params"]);
    }
    if options.generate_server {
        out.push("server");
    }
    if options.embed_spec {
        out.push("inline-spec");
    }
    out
}

/// Parses and pretty-prints generated source.
pub fn format_source(code: &str) -> AppResult<String> {
    let file = syn::parse_file(code)
        .map_err(|e| AppError::Template(format!("Generated code does not parse: {}", e)))?;
    Ok(prettyplease::unparse(&file))
}

/// Renders `model` as the Rust module `module_name`.
pub fn render(model: &GeneratedModel, module_name: &str, options: &Options) -> AppResult<String> {
    let tera = load_templates(&options.user_templates)?;
    let naming = Naming::new(&options.initialisms);
    let view = ModuleView::build(model, module_name, &naming, options)?;

    let context = Context::from_serialize(&view).map_err(|e| {
        AppError::Template(format!("Failed to build template context: {}", describe_tera_error(&e)))
    })?;

    let mut code = String::new();
    for name in sections(options) {
        let rendered = tera.render(name, &context).map_err(|e| {
            AppError::Template(format!("Template error in {}: {}", name, describe_tera_error(&e)))
        })?;
        code.push_str(&rendered);
        code.push('\n');
    }
    let code = code.replace('\u{feff}', "");

    if options.skip_fmt {
        return Ok(code);
    }
    format_source(&code)
}
