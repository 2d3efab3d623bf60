//! Template contexts.
//!
//! Everything that needs identifier rules or type decisions is computed here, so the
//! templates only loop and print. Doc text and string literals are left raw and go through
//! the `doc` and `literal` filters.

use crate::codegen::{GeneratedModel, Options};
use crate::error::AppResult;
use crate::oas::models::{
    CompositionMember, EnumDefinition, OperationDefinition, Property, Schema, TypeDefinition,
    ANY_TYPE,
};
use crate::oas::naming::Naming;
use crate::oas::ref_utils::ExternalImport;
use heck::ToShoutySnakeCase;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Items the server and params templates always declare.
const FIXED_ITEM_NAMES: [&str; 5] = [
    "BindError",
    "ParamSpec",
    "RawRequest",
    "Route",
    "ServerInterface",
];

/// A struct field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldView {
    /// Raw description.
    pub doc: String,
    /// Inner part of `#[serde(...)]`, empty when no attribute is needed.
    pub serde: String,
    /// Field identifier.
    pub name: String,
    /// Declared type.
    pub type_decl: String,
}

/// A non-enum type declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeView {
    /// Raw description.
    pub doc: String,
    /// Type identifier.
    pub name: String,
    /// `struct`, `alias` or `newtype`.
    pub kind: &'static str,
    /// Struct fields (empty for aliases and newtypes).
    pub fields: Vec<FieldView>,
    /// Aliased or wrapped type.
    pub target: String,
}

/// One enum value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantView {
    /// Variant or constant identifier.
    pub symbol: String,
    /// Wire literal for string enums, Rust literal otherwise.
    pub literal: String,
}

/// An enum declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumView {
    /// Raw description.
    pub doc: String,
    /// Type identifier.
    pub name: String,
    /// True for `enum` output, false for a newtype with associated constants.
    pub is_string: bool,
    /// Wrapped type of non-string enums.
    pub rust_type: String,
    /// Values in declaration order.
    pub variants: Vec<VariantView>,
}

/// A `pub const NAME: &str = value;` item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstantView {
    /// Raw description.
    pub doc: String,
    /// Constant identifier.
    pub name: String,
    /// Raw string value.
    pub value: String,
}

/// Wire metadata for one member of a params struct.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamSpecView {
    /// Name on the wire.
    pub name: String,
    /// `query`, `header` or `cookie`.
    pub location: String,
    /// Serialization style.
    pub style: String,
    /// Explode flag.
    pub explode: bool,
    /// Mandatory parameter.
    pub required: bool,
}

/// An `{OperationId}Params` struct.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamsView {
    /// Struct declaration.
    pub declaration: TypeView,
    /// Members in declaration order.
    pub specs: Vec<ParamSpecView>,
}

/// A params struct member bound from a request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldBindingView {
    /// Field identifier.
    pub field: String,
    /// Name on the wire.
    pub name: String,
    /// `query`, `header` or `cookie`.
    pub location: String,
    /// `RawRequest` member holding the values.
    pub source: &'static str,
    /// Header names compare case-insensitively.
    pub case_insensitive: bool,
    /// Mandatory parameter.
    pub required: bool,
}

/// A handler argument.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArgView {
    /// Argument identifier.
    pub name: String,
    /// Declared type.
    pub type_decl: String,
    /// `path`, `params` or `body`.
    pub source: &'static str,
    /// Wire name of a path parameter.
    pub wire_name: String,
    /// Members of the params struct.
    pub fields: Vec<FieldBindingView>,
    /// Mandatory body.
    pub required: bool,
}

/// A variant of an operation's response enum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseVariantView {
    /// Variant identifier.
    pub name: String,
    /// Payload type.
    pub payload: String,
    /// Status code when the response key is a concrete code.
    pub status: Option<u16>,
    /// Media type.
    pub content_type: String,
}

/// One operation, as seen by the server template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationView {
    /// Raw summary and description.
    pub doc: String,
    /// Trait method identifier.
    pub function: String,
    /// Operation id.
    pub operation_id: String,
    /// Upper-case method.
    pub method: String,
    /// URI template.
    pub path: String,
    /// Handler arguments after `&self`.
    pub args: Vec<ArgView>,
    /// Name of the response enum.
    pub response_enum: String,
    /// Typed response variants.
    pub variants: Vec<ResponseVariantView>,
    /// Middleware identifiers.
    pub middlewares: Vec<String>,
    /// Security provider names.
    pub security: Vec<String>,
    /// Whether a request dispatcher is emitted.
    pub bindable: bool,
}

/// The whole template context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleView {
    /// Module name shown in the header.
    pub module_name: String,
    /// External module imports.
    pub imports: Vec<ExternalImport>,
    /// Security scope and middleware constants.
    pub constants: Vec<ConstantView>,
    /// Enums.
    pub enums: Vec<EnumView>,
    /// Component and operation types, without params structs.
    pub types: Vec<TypeView>,
    /// Params structs.
    pub params: Vec<ParamsView>,
    /// Operations.
    pub operations: Vec<OperationView>,
    /// Raw string literal holding the document as JSON, empty unless embedding.
    pub spec_literal: String,
}

impl ModuleView {
    /// Builds the context for `model`.
    pub fn build(
        model: &GeneratedModel,
        module_name: &str,
        naming: &Naming,
        options: &Options,
    ) -> AppResult<Self> {
        let all_types = model.all_types();
        let component_names: BTreeSet<&str> =
            model.types.iter().map(|t| t.type_name.as_str()).collect();

        let params_types: Vec<(&OperationDefinition, &TypeDefinition)> = model
            .operations
            .iter()
            .filter(|op| op.requires_param_object())
            .filter_map(|op| {
                let name = format!("{}Params", op.operation_id);
                if component_names.contains(name.as_str()) {
                    return None;
                }
                all_types
                    .iter()
                    .find(|td| td.type_name == name)
                    .map(|td| (op, td))
            })
            .collect();
        let params_names: BTreeSet<&str> = params_types
            .iter()
            .map(|(_, td)| td.type_name.as_str())
            .collect();

        let types = all_types
            .iter()
            .filter(|td| !td.schema.is_enum() && !params_names.contains(td.type_name.as_str()))
            .map(|td| type_view(td, naming, options.alias_types))
            .collect();

        let params: Vec<ParamsView> = params_types
            .iter()
            .map(|(op, td)| ParamsView {
                declaration: type_view(td, naming, false),
                specs: op
                    .params()
                    .into_iter()
                    .map(|p| ParamSpecView {
                        name: p.param_name.clone(),
                        location: p.location.to_string(),
                        style: p.style.clone(),
                        explode: p.explode,
                        required: p.required,
                    })
                    .collect(),
            })
            .collect();

        let params_fields: BTreeMap<&str, &[FieldView]> = params
            .iter()
            .zip(&params_types)
            .map(|(view, (op, _))| (op.operation_id.as_str(), view.declaration.fields.as_slice()))
            .collect();

        let mut taken: BTreeSet<String> = all_types
            .iter()
            .map(|td| td.type_name.clone())
            .chain(FIXED_ITEM_NAMES.iter().map(|name| name.to_string()))
            .collect();
        let operations = model
            .operations
            .iter()
            .map(|op| {
                let response_enum =
                    unique_ident(format!("{}Response", op.operation_id), &mut taken);
                let fields = params_fields.get(op.operation_id.as_str()).copied();
                operation_view(op, naming, response_enum, fields)
            })
            .collect();

        let spec_literal = if options.embed_spec {
            raw_string_literal(&model.document.to_json_string()?)
        } else {
            String::new()
        };

        Ok(Self {
            module_name: module_name.to_string(),
            imports: model.imports.clone(),
            constants: constant_views(model),
            enums: model.enums.iter().map(enum_view).collect(),
            types,
            params,
            operations,
            spec_literal,
        })
    }
}

/// Appends the smallest free numeric suffix to repeated identifiers.
fn dedupe_idents(names: Vec<String>) -> Vec<String> {
    let mut taken = BTreeSet::new();
    names
        .into_iter()
        .map(|name| unique_ident(name, &mut taken))
        .collect()
}

/// Claims `name`, or `name` with the smallest free numeric suffix.
fn unique_ident(name: String, taken: &mut BTreeSet<String>) -> String {
    if taken.insert(name.clone()) {
        return name;
    }
    let mut n = 1;
    loop {
        let candidate = format!("{}{}", name, n);
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// Quotes `s` as a Rust string literal.
pub fn string_literal(s: &str) -> String {
    format!("{:?}", s)
}

/// Quotes `s` as a raw string literal with enough `#`s to contain it.
pub fn raw_string_literal(s: &str) -> String {
    let mut longest = 0;
    let mut run: Option<usize> = None;
    for c in s.chars() {
        run = match (c, run) {
            ('"', _) => Some(0),
            ('#', Some(n)) => Some(n + 1),
            _ => None,
        };
        if let Some(n) = run {
            longest = longest.max(n);
        }
    }
    let hashes = "#".repeat(longest + 1);
    format!("r{hashes}\"{s}\"{hashes}")
}

fn skip_serializing_check(type_decl: &str) -> Option<&'static str> {
    if type_decl.starts_with("Vec<") {
        Some("Vec::is_empty")
    } else if type_decl == ANY_TYPE {
        Some("serde_json::Value::is_null")
    } else {
        None
    }
}

fn field_view(property: &Property, name: String) -> FieldView {
    let mut serde = Vec::new();
    if name != property.json_field_name {
        serde.push(format!("rename = {}", string_literal(&property.json_field_name)));
    }

    let type_decl = property.type_decl();
    if property.is_optional() {
        serde.push("default".to_string());
        if property.omit_empty {
            serde.push("skip_serializing_if = \"Option::is_none\"".to_string());
        }
    } else if !property.required {
        if let Some(check) = skip_serializing_check(&type_decl) {
            serde.push("default".to_string());
            if property.omit_empty {
                serde.push(format!("skip_serializing_if = {}", string_literal(check)));
            }
        }
    }
    for (key, value) in &property.extra_tags {
        serde.push(format!("{} = {}", key, string_literal(value)));
    }

    FieldView {
        doc: property.description.clone(),
        serde: serde.join(", "),
        name,
        type_decl,
    }
}

fn flatten_field(name: String, type_decl: String) -> FieldView {
    FieldView {
        doc: String::new(),
        serde: "flatten".to_string(),
        name,
        type_decl,
    }
}

fn additional_properties_type(value: Option<&Schema>) -> String {
    let inner = value
        .map(Schema::type_decl)
        .unwrap_or_else(|| ANY_TYPE.to_string());
    format!("std::collections::HashMap<String, {}>", inner)
}

/// Fields of a struct-shaped schema, embedded members flattened in declaration order.
fn struct_fields(schema: &Schema, naming: &Naming) -> Vec<FieldView> {
    enum Slot<'a> {
        Property(&'a Property),
        Flatten(String, String),
    }

    let mut slots = Vec::new();
    if schema.composition.is_empty() {
        slots.extend(schema.properties.iter().map(Slot::Property));
        if schema.has_additional_properties {
            slots.push(Slot::Flatten(
                "additional_properties".to_string(),
                additional_properties_type(schema.additional_properties_type.as_deref()),
            ));
        }
    } else {
        let mut extra_map = None;
        for member in &schema.composition {
            match member {
                CompositionMember::Embedded { type_name, .. } => {
                    let short = type_name.rsplit("::").next().unwrap_or(type_name.as_str());
                    slots.push(Slot::Flatten(naming.field_name(short), type_name.clone()));
                }
                CompositionMember::Inline {
                    properties,
                    has_additional_properties,
                    additional_properties_type: value,
                } => {
                    slots.extend(properties.iter().map(Slot::Property));
                    if *has_additional_properties && extra_map.is_none() {
                        extra_map = Some(additional_properties_type(value.as_deref()));
                    }
                }
            }
        }
        if let Some(map) = extra_map {
            slots.push(Slot::Flatten("additional_properties".to_string(), map));
        }
    }

    let names = dedupe_idents(
        slots
            .iter()
            .map(|slot| match slot {
                Slot::Property(p) => naming.field_name(&p.json_field_name),
                Slot::Flatten(name, _) => name.clone(),
            })
            .collect(),
    );

    slots
        .into_iter()
        .zip(names)
        .map(|(slot, name)| match slot {
            Slot::Property(p) => field_view(p, name),
            Slot::Flatten(_, type_decl) => flatten_field(name, type_decl),
        })
        .collect()
}

/// Chooses the declaration shape of a type definition.
pub fn type_view(td: &TypeDefinition, naming: &Naming, alias_types: bool) -> TypeView {
    let (kind, fields, target) = if td.schema.is_struct() {
        ("struct", struct_fields(&td.schema, naming), String::new())
    } else if alias_types && td.can_alias() {
        ("alias", Vec::new(), td.schema.type_decl())
    } else {
        ("newtype", Vec::new(), td.schema.type_decl())
    };
    TypeView {
        doc: td.schema.description.clone(),
        name: td.type_name.clone(),
        kind,
        fields,
        target,
    }
}

fn is_literal_type(rust_type: &str) -> bool {
    matches!(
        rust_type,
        "bool" | "i8" | "i16" | "i32" | "i64" | "u8" | "u16" | "u32" | "u64" | "f32" | "f64"
    )
}

fn numeric_literal(rust_type: &str, literal: &str) -> String {
    let is_float = rust_type.starts_with('f');
    if is_float && !literal.contains(['.', 'e', 'E']) {
        format!("{}.0", literal)
    } else {
        literal.to_string()
    }
}

/// String enums become Rust enums; number and boolean enums become newtypes with constants.
pub fn enum_view(definition: &EnumDefinition) -> EnumView {
    let rust_type = definition.schema.rust_type.clone();
    let is_string = !definition.value_wrapper.is_empty() || !is_literal_type(&rust_type);
    let variants = definition
        .schema
        .enum_values
        .iter()
        .map(|(symbol, literal)| VariantView {
            symbol: symbol.clone(),
            literal: if is_string {
                literal.clone()
            } else {
                numeric_literal(&rust_type, literal)
            },
        })
        .collect();
    EnumView {
        doc: definition.schema.description.clone(),
        name: definition.type_name.clone(),
        is_string,
        rust_type,
        variants,
    }
}

fn constant_views(model: &GeneratedModel) -> Vec<ConstantView> {
    let providers = model
        .constants
        .security_scheme_provider_names
        .iter()
        .map(|name| ConstantView {
            doc: format!("Context key for the scopes required by `{}`.", name),
            name: format!("{}_SCOPES", name.to_shouty_snake_case()),
            value: format!("{}.Scopes", name),
        });
    let middlewares = model.constants.middlewares.iter().map(|name| ConstantView {
        doc: String::new(),
        name: format!("MIDDLEWARE_{}", name.to_shouty_snake_case()),
        value: name.clone(),
    });

    let mut constants: Vec<ConstantView> = providers.chain(middlewares).collect();
    let names = dedupe_idents(constants.iter().map(|c| c.name.clone()).collect());
    for (constant, name) in constants.iter_mut().zip(names) {
        constant.name = name;
    }
    constants
}

fn operation_doc(op: &OperationDefinition) -> String {
    [op.summary.trim(), op.description.trim()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn field_bindings(op: &OperationDefinition, fields: &[FieldView]) -> Vec<FieldBindingView> {
    op.params()
        .into_iter()
        .zip(fields)
        .map(|(param, field)| {
            let location = param.location.to_string();
            let source = match location.as_str() {
                "header" => "headers",
                "cookie" => "cookies",
                _ => "query",
            };
            FieldBindingView {
                field: field.name.clone(),
                name: param.param_name.clone(),
                case_insensitive: source == "headers",
                location,
                source,
                required: param.required,
            }
        })
        .collect()
}

/// `params_fields` are the members of the emitted params struct, when there is one.
fn operation_view(
    op: &OperationDefinition,
    naming: &Naming,
    response_enum: String,
    params_fields: Option<&[FieldView]>,
) -> OperationView {
    let mut args: Vec<ArgView> = op
        .path_params
        .iter()
        .map(|p| ArgView {
            name: naming.variable_name(&p.param_name),
            type_decl: p.type_decl(),
            source: "path",
            wire_name: p.param_name.clone(),
            fields: Vec::new(),
            required: true,
        })
        .collect();
    if op.requires_param_object() {
        args.push(ArgView {
            name: "params".to_string(),
            type_decl: format!("{}Params", op.operation_id),
            source: "params",
            wire_name: String::new(),
            fields: params_fields
                .map(|fields| field_bindings(op, fields))
                .unwrap_or_default(),
            required: true,
        });
    }
    if let Some(body) = op.default_body() {
        let body_type = body.schema.type_decl();
        let type_decl = if op.body_required {
            body_type
        } else {
            format!("Option<{}>", body_type)
        };
        args.push(ArgView {
            name: "body".to_string(),
            type_decl,
            source: "body",
            wire_name: String::new(),
            fields: Vec::new(),
            required: op.body_required,
        });
    }
    let names = dedupe_idents(args.iter().map(|a| a.name.clone()).collect());
    for (arg, name) in args.iter_mut().zip(names) {
        arg.name = name;
    }
    let bindable = !op.requires_param_object() || params_fields.is_some();

    let variant_names = dedupe_idents(
        op.responses
            .iter()
            .map(|r| {
                naming.type_name(&format!("{} {}", r.name_tag.to_lowercase(), r.response_name))
            })
            .collect(),
    );
    let variants = op
        .responses
        .iter()
        .zip(variant_names)
        .map(|(response, name)| ResponseVariantView {
            name,
            payload: response.type_definition.type_name.clone(),
            status: response.response_name.parse().ok(),
            content_type: response.content_type.clone(),
        })
        .collect();

    let security: BTreeSet<String> = op
        .security_definitions
        .iter()
        .map(|s| s.provider_name.clone())
        .collect();

    OperationView {
        doc: operation_doc(op),
        function: naming.function_name(&op.operation_id),
        operation_id: op.operation_id.clone(),
        method: op.method.clone(),
        path: op.path.clone(),
        args,
        response_enum,
        variants,
        middlewares: op.middlewares.clone(),
        security: security.into_iter().collect(),
        bindable,
    }
}
