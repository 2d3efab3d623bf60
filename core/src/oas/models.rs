#![deny(missing_docs)]

//! # OpenAPI Models
//!
//! Intermediate Representation (IR) produced by the resolver.
//!
//! These structs are created once during a single traversal of the document and are not
//! mutated afterwards; the emitter serializes them into template contexts.

use crate::oas::document::ParameterLocation;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Type used when nothing is known about a value.
pub const ANY_TYPE: &str = "serde_json::Value";
/// Type of an object without declared properties.
pub const GENERIC_OBJECT_TYPE: &str = "std::collections::HashMap<String, serde_json::Value>";

/// A resolved schema node.
///
/// Either a reference (`ref_type` set, structural fields ignored for code generation) or an
/// inline description.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Schema {
    /// Rust type expression for inline primitives, arrays and maps.
    pub rust_type: String,
    /// Name of the aliased type, when this schema is a reference.
    pub ref_type: String,
    /// Element schema of an array.
    pub array_type: Option<Box<Schema>>,
    /// Enum symbol → literal, in declaration order.
    pub enum_values: IndexMap<String, String>,
    /// Object properties, sorted by JSON name.
    pub properties: Vec<Property>,
    /// True when additional properties are allowed.
    pub has_additional_properties: bool,
    /// Type of additional values.
    pub additional_properties_type: Option<Box<Schema>>,
    /// Types synthesized while resolving this node.
    pub additional_types: Vec<TypeDefinition>,
    /// `allOf` members, in declaration order.
    pub composition: Vec<CompositionMember>,
    /// Never wrap in `Option` (slices, byte strings, raw JSON).
    pub skip_optional: bool,
    /// Description copied from the source.
    pub description: String,
}

impl Schema {
    /// Inline schema of the given type.
    pub fn of_type(rust_type: impl Into<String>) -> Self {
        Self {
            rust_type: rust_type.into(),
            ..Default::default()
        }
    }

    /// Reference to a named type.
    pub fn reference(ref_type: impl Into<String>) -> Self {
        Self {
            ref_type: ref_type.into(),
            ..Default::default()
        }
    }

    /// True when this schema aliases a named type.
    pub fn is_ref(&self) -> bool {
        !self.ref_type.is_empty()
    }

    /// The type expression used at use sites.
    pub fn type_decl(&self) -> String {
        if self.is_ref() {
            self.ref_type.clone()
        } else {
            self.rust_type.clone()
        }
    }

    /// True when this inline schema can only be expressed as a struct.
    pub fn is_struct(&self) -> bool {
        !self.is_ref()
            && (!self.properties.is_empty()
                || self.has_additional_properties
                || !self.composition.is_empty())
    }

    /// True when this inline schema is an enum.
    pub fn is_enum(&self) -> bool {
        !self.is_ref() && !self.enum_values.is_empty()
    }

    /// Every synthesized type reachable from this schema, flattened.
    ///
    /// Properties are visited first (recursively), then the schema's own list.
    pub fn additional_type_defs(&self) -> Vec<TypeDefinition> {
        let mut out: Vec<TypeDefinition> = self
            .properties
            .iter()
            .flat_map(|p| p.schema.additional_type_defs())
            .collect();
        out.extend(self.additional_types.iter().cloned());
        out
    }
}

/// One member of an `allOf` composition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompositionMember {
    /// A referenced schema, embedded as a whole.
    Embedded {
        /// Resolved type name.
        type_name: String,
        /// Original `$ref`.
        reference: String,
    },
    /// An anonymous schema whose fields are inlined.
    Inline {
        /// Fields contributed by this member.
        properties: Vec<Property>,
        /// True when this member allows additional properties.
        has_additional_properties: bool,
        /// Type of additional values.
        additional_properties_type: Option<Box<Schema>>,
    },
}

/// A resolved object property.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Property {
    /// Description copied from the source.
    pub description: String,
    /// Property name on the wire.
    pub json_field_name: String,
    /// Resolved schema.
    pub schema: Schema,
    /// Listed in the parent's `required`.
    pub required: bool,
    /// Declared `nullable`.
    pub nullable: bool,
    /// Raw vendor extensions of the property schema.
    pub extensions: BTreeMap<String, Value>,
    /// Skip serialization when absent (decoded `x-omitempty`, defaulting to `!required`).
    pub omit_empty: bool,
    /// Extra serde attribute entries (decoded `x-rust-extra-tags`).
    pub extra_tags: BTreeMap<String, String>,
}

impl Property {
    /// True when the field is wrapped in `Option`.
    pub fn is_optional(&self) -> bool {
        !self.schema.skip_optional && (!self.required || self.nullable)
    }

    /// Field type at the declaration site.
    pub fn type_decl(&self) -> String {
        let inner = self.schema.type_decl();
        if self.is_optional() {
            format!("Option<{}>", inner)
        } else {
            inner
        }
    }

    /// Same JSON name, same type and same required-ness.
    pub fn equivalent(&self, other: &Property) -> bool {
        self.json_field_name == other.json_field_name
            && self.schema.type_decl() == other.schema.type_decl()
            && self.required == other.required
    }
}

/// A named type to be emitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TypeDefinition {
    /// Rust type name, unique in the emitted set.
    pub type_name: String,
    /// Name in the source document (`.`-joined path for synthesized types).
    pub json_name: String,
    /// Resolved schema.
    pub schema: Schema,
}

impl TypeDefinition {
    /// True for references and arrays of references.
    pub fn can_alias(&self) -> bool {
        self.schema.is_ref()
            || self
                .schema
                .array_type
                .as_ref()
                .map(|item| item.is_ref())
                .unwrap_or(false)
    }
}

/// How a parameter value is encoded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamEncoding {
    /// Described by `schema`, encoded with `style`/`explode`.
    #[default]
    Styled,
    /// `content: application/json`.
    Json,
    /// Any other content: passed through as a string.
    PassThrough,
}

/// A resolved operation parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterDefinition {
    /// Name on the wire.
    pub param_name: String,
    /// Location of the parameter.
    pub location: ParameterLocation,
    /// Mandatory parameter.
    pub required: bool,
    /// Serialization style.
    pub style: String,
    /// Explode flag.
    pub explode: bool,
    /// Wire encoding.
    pub encoding: ParamEncoding,
    /// Description copied from the source.
    pub description: String,
    /// Resolved schema.
    pub schema: Schema,
    /// Raw vendor extensions of the parameter.
    pub extensions: BTreeMap<String, Value>,
}

impl ParameterDefinition {
    /// Default style for a location: `simple` for path/header, `form` otherwise.
    pub fn default_style(location: ParameterLocation) -> &'static str {
        match location {
            ParameterLocation::Path | ParameterLocation::Header => "simple",
            ParameterLocation::Query | ParameterLocation::Cookie => "form",
        }
    }

    /// Default explode flag: `false` for path/header, `true` otherwise.
    pub fn default_explode(location: ParameterLocation) -> bool {
        matches!(
            location,
            ParameterLocation::Query | ParameterLocation::Cookie
        )
    }

    /// True when the parameter is never wrapped in `Option`.
    pub fn indirect_optional(&self) -> bool {
        !self.required && !self.schema.skip_optional
    }

    /// Type at the declaration site.
    pub fn type_decl(&self) -> String {
        if self.indirect_optional() {
            format!("Option<{}>", self.schema.type_decl())
        } else {
            self.schema.type_decl()
        }
    }
}

/// One security requirement of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityDefinition {
    /// Security scheme name.
    pub provider_name: String,
    /// Required scopes.
    pub scopes: Vec<String>,
}

/// One accepted request body encoding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestBodyDefinition {
    /// Media type.
    pub content_type: String,
    /// Short tag (`JSON`).
    pub name_tag: String,
    /// Resolved body schema.
    pub schema: Schema,
    /// Mandatory body.
    pub required: bool,
    /// The body used by the default handler signature.
    pub is_default: bool,
}

impl RequestBodyDefinition {
    /// Name suffix for non-default variants (`WithJSONBody`), empty for the default one.
    pub fn suffix(&self) -> String {
        if self.is_default {
            String::new()
        } else {
            format!("With{}Body", self.name_tag)
        }
    }

    /// True when the body schema is not a plain reference or struct.
    pub fn custom_type(&self) -> bool {
        !self.schema.is_ref() && !self.schema.is_struct()
    }
}

/// A typed response payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseTypeDefinition {
    /// Type emitted for the payload.
    pub type_definition: TypeDefinition,
    /// Media type.
    pub content_type: String,
    /// Status code or `default`.
    pub response_name: String,
    /// Short tag (`JSON`, `YAML`, `XML`).
    pub name_tag: String,
}

/// A fully resolved (path, method) pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OperationDefinition {
    /// Camel-cased operation id.
    pub operation_id: String,
    /// Upper-case HTTP method.
    pub method: String,
    /// URI template.
    pub path: String,
    /// Path parameters in template order.
    pub path_params: Vec<ParameterDefinition>,
    /// Header parameters.
    pub header_params: Vec<ParameterDefinition>,
    /// Query parameters.
    pub query_params: Vec<ParameterDefinition>,
    /// Cookie parameters.
    pub cookie_params: Vec<ParameterDefinition>,
    /// Accepted request bodies.
    pub bodies: Vec<RequestBodyDefinition>,
    /// Types this operation needs (bodies, params object, auxiliary types).
    pub type_definitions: Vec<TypeDefinition>,
    /// Effective security requirements.
    pub security_definitions: Vec<SecurityDefinition>,
    /// Middleware identifiers (path level, then operation level).
    pub middlewares: Vec<String>,
    /// The request body is mandatory.
    pub body_required: bool,
    /// Summary copied from the source.
    pub summary: String,
    /// Description copied from the source.
    pub description: String,
    /// Operation tags.
    pub tags: Vec<String>,
    /// Typed responses.
    pub responses: Vec<ResponseTypeDefinition>,
}

impl OperationDefinition {
    /// Query, header and cookie parameters (the ones carried by the params object).
    pub fn params(&self) -> Vec<&ParameterDefinition> {
        self.query_params
            .iter()
            .chain(&self.header_params)
            .chain(&self.cookie_params)
            .collect()
    }

    /// Every parameter, path parameters first.
    pub fn all_params(&self) -> Vec<&ParameterDefinition> {
        self.path_params.iter().chain(self.params()).collect()
    }

    /// True when a `{OperationId}Params` type is generated.
    pub fn requires_param_object(&self) -> bool {
        !self.params().is_empty()
    }

    /// The default request body, if any.
    pub fn default_body(&self) -> Option<&RequestBodyDefinition> {
        self.bodies.iter().find(|b| b.is_default)
    }
}

/// An enum type collected for the constants section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumDefinition {
    /// Rust type name.
    pub type_name: String,
    /// Resolved schema (with `enum_values`).
    pub schema: Schema,
    /// `"` for string enums, empty otherwise.
    pub value_wrapper: String,
}

/// Aggregated, deduplicated names used by the constants template.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Constants {
    /// Sanitized security provider names, sorted and unique.
    pub security_scheme_provider_names: Vec<String>,
    /// Middleware identifiers, sorted and unique.
    pub middlewares: Vec<String>,
    /// Enum types, deduplicated by name.
    pub enum_definitions: Vec<EnumDefinition>,
}
