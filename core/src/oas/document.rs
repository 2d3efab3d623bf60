#![deny(missing_docs)]

//! # OpenAPI Document Shims
//!
//! Generic structures acting as an Intermediate Deserialization Layer.
//! These structs map directly to OpenAPI YAML/JSON objects.
//!
//! References are never followed while loading: every place where the document may hold a
//! `$ref` is typed as `utoipa::openapi::RefOr`, and the resolver decides later whether a
//! reference names a type or must be looked up in `components`.
//!
//! Keys the shims do not model (including `x-` vendor extensions) are kept in an `extra`
//! bag so that filtered documents can be serialized back without loss.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use utoipa::openapi::RefOr;

/// A schema node as it appears in the document: either a `$ref` or an inline schema.
pub type SchemaRef = RefOr<SchemaObject>;

/// A Security Requirement Object: scheme name to required scopes.
pub type SecurityRequirement = BTreeMap<String, Vec<String>>;

fn is_false(value: &bool) -> bool {
    !*value
}

/// Read access to the vendor extensions (`x-` keys) of a shim.
pub trait Extensible {
    /// All keys of the object that are not modelled explicitly.
    fn extra(&self) -> &BTreeMap<String, Value>;

    /// Returns the value of the vendor extension `key`, if present.
    ///
    /// Keys without the `x-` prefix are never treated as extensions.
    fn extension(&self, key: &str) -> Option<&Value> {
        if key.starts_with("x-") {
            self.extra().get(key)
        } else {
            None
        }
    }
}

macro_rules! impl_extensible {
    ($($ty:ty),*) => {
        $(impl Extensible for $ty {
            fn extra(&self) -> &BTreeMap<String, Value> {
                &self.extra
            }
        })*
    };
}

/// Root OpenAPI 3 document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenApiDocument {
    /// Declared OpenAPI version.
    #[serde(default)]
    pub openapi: String,
    /// Info object, kept verbatim.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub info: Value,
    /// Path items keyed by URI template.
    #[serde(default)]
    pub paths: BTreeMap<String, PathItem>,
    /// Reusable components.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
    /// Global security requirements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,
    /// Unmodelled keys (`servers`, `tags`, extensions, ...).
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl OpenApiDocument {
    /// Parses a YAML (or JSON, which is a YAML subset) document.
    pub fn from_yaml_str(content: &str) -> AppResult<Self> {
        let content = content.trim_start_matches('\u{feff}');
        serde_yaml::from_str(content)
            .map_err(|e| AppError::Document(format!("Failed to parse OpenAPI document: {}", e)))
    }

    /// Parses a JSON document.
    pub fn from_json_str(content: &str) -> AppResult<Self> {
        let content = content.trim_start_matches('\u{feff}');
        serde_json::from_str(content)
            .map_err(|e| AppError::Document(format!("Failed to parse OpenAPI JSON: {}", e)))
    }

    /// Serializes the document as compact JSON.
    pub fn to_json_string(&self) -> AppResult<String> {
        serde_json::to_string(self)
            .map_err(|e| AppError::Document(format!("Failed to serialize OpenAPI document: {}", e)))
    }

    /// Looks up `components.schemas[name]`.
    pub fn schema(&self, name: &str) -> Option<&SchemaRef> {
        self.components.as_ref()?.schemas.get(name)
    }

    /// Looks up `components.parameters[name]`.
    pub fn parameter(&self, name: &str) -> Option<&RefOr<ParameterObject>> {
        self.components.as_ref()?.parameters.get(name)
    }

    /// Looks up `components.requestBodies[name]`.
    pub fn request_body(&self, name: &str) -> Option<&RefOr<RequestBodyObject>> {
        self.components.as_ref()?.request_bodies.get(name)
    }

    /// Looks up `components.responses[name]`.
    pub fn response(&self, name: &str) -> Option<&RefOr<ResponseObject>> {
        self.components.as_ref()?.responses.get(name)
    }
}

/// The Components Object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    /// Named schemas.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub schemas: BTreeMap<String, SchemaRef>,
    /// Named parameters.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, RefOr<ParameterObject>>,
    /// Named responses.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub responses: BTreeMap<String, RefOr<ResponseObject>>,
    /// Named request bodies.
    #[serde(
        default,
        rename = "requestBodies",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub request_bodies: BTreeMap<String, RefOr<RequestBodyObject>>,
    /// Security schemes, kept verbatim.
    #[serde(
        default,
        rename = "securitySchemes",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub security_schemes: BTreeMap<String, Value>,
    /// Unmodelled keys (`headers`, `examples`, `links`, ...).
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A Path Item Object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    /// Optional summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// GET operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    /// PUT operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    /// POST operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    /// DELETE operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    /// OPTIONS operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    /// HEAD operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    /// PATCH operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    /// TRACE operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,
    /// Parameters shared by every operation of this path.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<RefOr<ParameterObject>>,
    /// Unmodelled keys and extensions.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl PathItem {
    /// Operations present on this path, ordered by upper-case method name.
    pub fn operations(&self) -> Vec<(&'static str, &Operation)> {
        [
            ("DELETE", &self.delete),
            ("GET", &self.get),
            ("HEAD", &self.head),
            ("OPTIONS", &self.options),
            ("PATCH", &self.patch),
            ("POST", &self.post),
            ("PUT", &self.put),
            ("TRACE", &self.trace),
        ]
        .into_iter()
        .filter_map(|(method, op)| op.as_ref().map(|op| (method, op)))
        .collect()
    }

    /// Mutable access to every operation slot.
    pub fn operation_slots_mut(&mut self) -> [&mut Option<Operation>; 8] {
        [
            &mut self.delete,
            &mut self.get,
            &mut self.head,
            &mut self.options,
            &mut self.patch,
            &mut self.post,
            &mut self.put,
            &mut self.trace,
        ]
    }

    /// True when no method slot holds an operation.
    pub fn has_operations(&self) -> bool {
        !self.operations().is_empty()
    }
}

/// An Operation Object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Declared operation id.
    #[serde(default, rename = "operationId", skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// Short summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Longer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Tags used for filtering.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Operation-level parameters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<RefOr<ParameterObject>>,
    /// Request body.
    #[serde(default, rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RefOr<RequestBodyObject>>,
    /// Responses keyed by status code or `default`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub responses: BTreeMap<String, RefOr<ResponseObject>>,
    /// Operation security; `Some(vec![])` disables global security.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,
    /// Unmodelled keys and extensions.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Where a parameter is carried in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    /// URI template segment.
    Path,
    /// Query string.
    Query,
    /// Request header.
    Header,
    /// Cookie.
    Cookie,
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
        };
        f.write_str(s)
    }
}

/// A Parameter Object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterObject {
    /// Parameter name.
    pub name: String,
    /// Parameter location.
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the parameter is mandatory.
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    /// Serialization style.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Explode flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explode: Option<bool>,
    /// Schema of the value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaRef>,
    /// Media-type encoded value.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub content: BTreeMap<String, MediaType>,
    /// Unmodelled keys and extensions.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A Request Body Object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestBodyObject {
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Content keyed by media type.
    #[serde(default)]
    pub content: BTreeMap<String, MediaType>,
    /// Whether a body must be sent.
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    /// Unmodelled keys and extensions.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A Response Object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseObject {
    /// Response description.
    #[serde(default)]
    pub description: String,
    /// Content keyed by media type.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub content: BTreeMap<String, MediaType>,
    /// Unmodelled keys (`headers`, `links`, extensions).
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A Media Type Object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    /// Schema of the payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaRef>,
    /// Unmodelled keys (`example`, `encoding`, ...).
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// `additionalProperties`: a boolean switch or a value schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    /// `true` / `false`.
    Allowed(bool),
    /// Schema of every additional value.
    Schema(Box<SchemaRef>),
}

/// A Schema Object (the OpenAPI 3.0 subset the resolver understands).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaObject {
    /// Primitive type name.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    /// Format refinement of the type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Object properties.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, SchemaRef>,
    /// Names of mandatory properties.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    /// Additional properties switch or schema.
    #[serde(
        default,
        rename = "additionalProperties",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<AdditionalProperties>,
    /// Array item schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaRef>>,
    /// Enumerated literal values.
    #[serde(default, rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
    /// Composition by intersection.
    #[serde(default, rename = "allOf", skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<SchemaRef>,
    /// Exclusive union.
    #[serde(default, rename = "oneOf", skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<SchemaRef>,
    /// Inclusive union.
    #[serde(default, rename = "anyOf", skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<SchemaRef>,
    /// OpenAPI 3.0 `nullable`.
    #[serde(default, skip_serializing_if = "is_false")]
    pub nullable: bool,
    /// Unmodelled keys and extensions.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl SchemaObject {
    /// True when additional properties are allowed (`true` or a value schema).
    pub fn has_additional_properties(&self) -> bool {
        match &self.additional_properties {
            Some(AdditionalProperties::Allowed(allowed)) => *allowed,
            Some(AdditionalProperties::Schema(_)) => true,
            None => false,
        }
    }

    /// Schema of additional values, when one is declared.
    pub fn additional_properties_schema(&self) -> Option<&SchemaRef> {
        match &self.additional_properties {
            Some(AdditionalProperties::Schema(schema)) => Some(schema.as_ref()),
            _ => None,
        }
    }
}

impl_extensible!(
    OpenApiDocument,
    PathItem,
    Operation,
    ParameterObject,
    RequestBodyObject,
    ResponseObject,
    SchemaObject
);

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
openapi: 3.0.3
info:
  title: Pets
  version: "1.0"
paths:
  /pets/{id}:
    x-rust-middlewares: [auth]
    parameters:
      - name: id
        in: path
        required: true
        schema:
          type: string
    put:
      operationId: updatePet
      responses: {}
    get:
      operationId: getPet
      tags: [pets]
      responses:
        '200':
          description: ok
          content:
            application/json:
              schema:
                $ref: '#/components/schemas/Pet'
components:
  schemas:
    Pet:
      type: object
      required: [name]
      additionalProperties: false
      properties:
        name:
          type: string
        tags:
          type: array
          items:
            type: string
        extra:
          additionalProperties:
            type: integer
"#;

    #[test]
    fn test_parse_document_shapes() {
        let doc = OpenApiDocument::from_yaml_str(YAML).unwrap();
        let item = &doc.paths["/pets/{id}"];

        let methods: Vec<&str> = item.operations().iter().map(|(m, _)| *m).collect();
        assert_eq!(methods, vec!["GET", "PUT"]);
        assert_eq!(item.parameters.len(), 1);
        assert!(item.extension("x-rust-middlewares").is_some());
        assert!(item.extension("parameters").is_none());

        let RefOr::T(pet) = doc.schema("Pet").unwrap() else {
            panic!("Pet should be inline");
        };
        assert_eq!(pet.required, vec!["name".to_string()]);
        assert!(!pet.has_additional_properties());

        let RefOr::T(extra) = &pet.properties["extra"] else {
            panic!("extra should be inline");
        };
        assert!(extra.has_additional_properties());
        assert!(extra.additional_properties_schema().is_some());
    }

    #[test]
    fn test_response_reference_kept() {
        let doc = OpenApiDocument::from_yaml_str(YAML).unwrap();
        let op = doc.paths["/pets/{id}"].get.as_ref().unwrap();
        let RefOr::T(resp) = &op.responses["200"] else {
            panic!("inline response expected");
        };
        match resp.content["application/json"].schema.as_ref().unwrap() {
            RefOr::Ref(r) => assert_eq!(r.ref_location, "#/components/schemas/Pet"),
            RefOr::T(_) => panic!("reference should not be followed"),
        }
    }

    #[test]
    fn test_json_round_trip_keeps_extensions() {
        let doc = OpenApiDocument::from_yaml_str(YAML).unwrap();
        let json = doc.to_json_string().unwrap();
        let again = OpenApiDocument::from_json_str(&json).unwrap();
        assert_eq!(doc, again);
        assert!(json.contains("x-rust-middlewares"));
    }

    #[test]
    fn test_parse_error_is_document_error() {
        let err = OpenApiDocument::from_yaml_str("paths: [1, 2").unwrap_err();
        assert!(matches!(err, AppError::Document(_)));
    }
}
