#![deny(missing_docs)]

//! # Schema Resolution
//!
//! The recursive algorithm that turns a schema node into a [`Schema`].
//!
//! The `path` argument is the name path of the node (`["Pet", "owner"]`). It is used to name
//! synthesized types: Rust has no anonymous structs, so every inline object found below the
//! top level is hoisted into an auxiliary [`TypeDefinition`] named after its path, and the
//! enclosing schema refers to it by name. Each call returns the types it synthesized in
//! `additional_types`; callers flatten them with [`Schema::additional_type_defs`].

use crate::error::{AppError, AppResult, ResultExt};
use crate::oas::document::{Extensible, SchemaObject, SchemaRef};
use crate::oas::extensions::{self, EXT_EXTRA_TAGS, EXT_OMIT_EMPTY, EXT_RUST_TYPE};
use crate::oas::models::{Property, Schema, TypeDefinition, ANY_TYPE, GENERIC_OBJECT_TYPE};
use crate::oas::ref_utils::is_type_reference;
use crate::oas::resolver::ResolveContext;
use serde_json::Value;
use std::collections::BTreeMap;
use utoipa::openapi::RefOr;

/// Rust type used for `format: date`.
pub const DATE_TYPE: &str = "oapi_types::Date";
/// Rust type used for `format: email`.
pub const EMAIL_TYPE: &str = "oapi_types::Email";
/// Rust type used for `format: date-time`.
pub const DATE_TIME_TYPE: &str = "chrono::DateTime<chrono::Utc>";

impl ResolveContext<'_> {
    /// Resolves a schema node found at `path`.
    ///
    /// # Arguments
    ///
    /// * `node` - The schema (reference or inline); `None` resolves to an opaque value.
    /// * `path` - Name path of the node, used to name synthesized types.
    pub fn resolve_schema(&self, node: Option<&SchemaRef>, path: &[String]) -> AppResult<Schema> {
        let node = match node {
            None => return Ok(Schema::of_type(ANY_TYPE)),
            Some(node) => node,
        };

        let schema = match node {
            RefOr::Ref(r) => {
                if !is_type_reference(&r.ref_location) {
                    return Err(AppError::Reference(format!(
                        "whole-document reference '{}' does not name a type",
                        r.ref_location
                    )));
                }
                let ref_type = self
                    .ref_type(&r.ref_location)
                    .with_context(|| {
                        format!("error turning reference ({}) into a Rust type", r.ref_location)
                    })?;
                let mut out = Schema::reference(ref_type);
                out.description = r.description.clone();
                return Ok(out);
            }
            RefOr::T(schema) => schema,
        };

        let description = schema.description.clone().unwrap_or_default();

        if let Some(value) = schema.extension(EXT_RUST_TYPE) {
            let rust_type = extensions::rust_type_override(value)?;
            let mut out = Schema::of_type(rust_type);
            out.description = description;
            return Ok(out);
        }

        if !schema.one_of.is_empty() || !schema.any_of.is_empty() {
            let mut out = Schema::of_type(ANY_TYPE);
            out.description = description;
            return Ok(out);
        }

        if !schema.all_of.is_empty() {
            let mut merged = self
                .merge_schemas(&schema.all_of, path)
                .context("error merging schemas")?;
            merged.description = description;
            return Ok(merged);
        }

        let schema_type = schema.schema_type.as_deref().unwrap_or("");
        if schema_type.is_empty() || schema_type == "object" {
            let mut out = self.resolve_object(schema, schema_type, path)?;
            out.description = description;
            return Ok(out);
        }

        let mut out = if schema.enum_values.is_empty() {
            self.resolve_primitive(schema, path)?
        } else {
            self.resolve_enum(schema, path)?
        };
        out.description = description;
        Ok(out)
    }

    fn resolve_object(
        &self,
        schema: &SchemaObject,
        schema_type: &str,
        path: &[String],
    ) -> AppResult<Schema> {
        if schema.properties.is_empty() && !schema.has_additional_properties() {
            return Ok(if schema_type == "object" {
                Schema::of_type(GENERIC_OBJECT_TYPE)
            } else {
                Schema::of_type(ANY_TYPE)
            });
        }

        let mut out = Schema::default();
        for (name, node) in &schema.properties {
            let mut property_path = path.to_vec();
            property_path.push(name.clone());

            let resolved = self
                .resolve_schema(Some(node), &property_path)
                .with_context(|| format!("error generating schema for property '{}'", name))?;
            let resolved = self.hoist_if_struct(resolved, &property_path);
            let property = self
                .build_property(name, node, resolved, schema.required.contains(name))
                .with_context(|| format!("error reading extensions of property '{}'", name))?;
            out.properties.push(property);
        }

        out.has_additional_properties = schema.has_additional_properties();
        if out.has_additional_properties {
            let value = match schema.additional_properties_schema() {
                Some(node) => {
                    let mut value_path = path.to_vec();
                    value_path.push("AdditionalProperties".to_string());
                    let resolved = self
                        .resolve_schema(Some(node), &value_path)
                        .context("error generating type for additional properties")?;
                    self.hoist_if_struct(resolved, &value_path)
                }
                None => Schema::of_type(ANY_TYPE),
            };
            out.additional_properties_type = Some(Box::new(value));
        }
        Ok(out)
    }

    pub(crate) fn build_property(
        &self,
        name: &str,
        node: &SchemaRef,
        schema: Schema,
        required: bool,
    ) -> AppResult<Property> {
        let (nullable, bag) = match node {
            RefOr::T(obj) => (
                obj.nullable,
                obj.extra
                    .iter()
                    .filter(|(k, _)| k.starts_with("x-"))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect::<BTreeMap<String, Value>>(),
            ),
            RefOr::Ref(_) => (false, BTreeMap::new()),
        };

        let omit_empty = match bag.get(EXT_OMIT_EMPTY) {
            Some(value) => extensions::omit_empty(value)?,
            None => !required && !nullable,
        };
        let extra_tags = match bag.get(EXT_EXTRA_TAGS) {
            Some(value) => extensions::extra_tags(value)?,
            None => BTreeMap::new(),
        };

        Ok(Property {
            description: schema.description.clone(),
            json_field_name: name.to_string(),
            schema,
            required,
            nullable,
            extensions: bag,
            omit_empty,
            extra_tags,
        })
    }

    fn resolve_enum(&self, schema: &SchemaObject, path: &[String]) -> AppResult<Schema> {
        let mut out = self.resolve_primitive(schema, path)?;
        let literals: Vec<String> = schema
            .enum_values
            .iter()
            .filter_map(|value| match value {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            })
            .collect();
        out.enum_values = self.naming().sanitize_enum_names(&literals);
        out.description = schema.description.clone().unwrap_or_default();

        if path.len() > 1 {
            return Ok(self.hoist(out, path));
        }
        Ok(out)
    }

    /// Resolves arrays and scalar types.
    pub fn resolve_primitive(&self, schema: &SchemaObject, path: &[String]) -> AppResult<Schema> {
        let schema_type = schema.schema_type.as_deref().unwrap_or("");
        let format = schema.format.as_deref().unwrap_or("");

        let rust_type = match schema_type {
            "array" => return self.resolve_array(schema, path),
            "integer" => match format {
                "int8" => "i8",
                "int16" => "i16",
                "int32" => "i32",
                "int64" => "i64",
                "uint8" => "u8",
                "uint16" => "u16",
                "uint32" => "u32",
                "uint64" => "u64",
                "uint" => "u64",
                "int" | "" => "i64",
                other => {
                    return Err(AppError::Format(format!(
                        "invalid integer format: {}",
                        other
                    )))
                }
            },
            "number" => match format {
                "double" => "f64",
                "float" | "" => "f32",
                other => {
                    return Err(AppError::Format(format!(
                        "invalid number format: {}",
                        other
                    )))
                }
            },
            "boolean" => {
                if !format.is_empty() {
                    return Err(AppError::Format(format!(
                        "invalid format ({}) for boolean",
                        format
                    )));
                }
                "bool"
            }
            "string" => match format {
                "byte" => {
                    let mut out = Schema::of_type("Vec<u8>");
                    out.skip_optional = true;
                    return Ok(out);
                }
                "json" => {
                    let mut out = Schema::of_type(ANY_TYPE);
                    out.skip_optional = true;
                    return Ok(out);
                }
                "email" => EMAIL_TYPE,
                "date" => DATE_TYPE,
                "date-time" => DATE_TIME_TYPE,
                _ => "String",
            },
            other => {
                return Err(AppError::Format(format!(
                    "unhandled schema type: {}",
                    other
                )))
            }
        };
        Ok(Schema::of_type(rust_type))
    }

    fn resolve_array(&self, schema: &SchemaObject, path: &[String]) -> AppResult<Schema> {
        let mut item_path = path.to_vec();
        item_path.push("Item".to_string());

        let item = self
            .resolve_schema(schema.items.as_deref(), &item_path)
            .context("error generating type for array")?;
        let item = self.hoist_if_struct(item, &item_path);

        let mut out = Schema::of_type(format!("Vec<{}>", item.type_decl()));
        out.skip_optional = true;
        out.additional_types = item.additional_type_defs();
        out.array_type = Some(Box::new(item));
        Ok(out)
    }

    /// Hoists struct-shaped inline schemas into a named type; returns others unchanged.
    pub(crate) fn hoist_if_struct(&self, schema: Schema, path: &[String]) -> Schema {
        if schema.is_struct() {
            self.hoist(schema, path)
        } else {
            schema
        }
    }

    /// Replaces an inline schema by a reference to a synthesized type named after `path`.
    ///
    /// The returned reference carries the nested synthesized types first, then the new one.
    pub(crate) fn hoist(&self, schema: Schema, path: &[String]) -> Schema {
        let type_name = self.naming().path_to_type_name(path);
        let mut additional_types = schema.additional_type_defs();
        let description = schema.description.clone();
        let skip_optional = schema.skip_optional;

        additional_types.push(TypeDefinition {
            type_name: type_name.clone(),
            json_name: path.join("."),
            schema: Schema {
                additional_types: Vec::new(),
                ..schema
            },
        });

        Schema {
            ref_type: type_name,
            additional_types,
            description,
            skip_optional,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::error::AppError;
    use crate::oas::document::{SchemaObject, SchemaRef};
    use crate::oas::models::{ANY_TYPE, GENERIC_OBJECT_TYPE};
    use crate::oas::naming::Naming;
    use crate::oas::ref_utils::ImportMapping;
    use crate::oas::resolver::ResolveContext;
    use utoipa::openapi::{Ref, RefOr};

    fn node(yaml: &str) -> SchemaRef {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    fn resolve(yaml: &str, segments: &[&str]) -> crate::error::AppResult<crate::oas::models::Schema> {
        let naming = Naming::default();
        let imports = ImportMapping::default();
        let ctx = ResolveContext::new(&naming, &imports);
        ctx.resolve_schema(Some(&node(yaml)), &path(segments))
    }

    #[test]
    fn test_nil_schema_is_any() {
        let naming = Naming::default();
        let imports = ImportMapping::default();
        let ctx = ResolveContext::new(&naming, &imports);
        assert_eq!(ctx.resolve_schema(None, &[]).unwrap().rust_type, ANY_TYPE);
    }

    #[test]
    fn test_reference_resolves_to_name_only() {
        let naming = Naming::default();
        let imports = ImportMapping::default();
        let ctx = ResolveContext::new(&naming, &imports);
        let node: SchemaRef = RefOr::Ref(Ref::new("#/components/schemas/Pet"));

        let first = ctx.resolve_schema(Some(&node), &path(&["X"])).unwrap();
        let second = ctx.resolve_schema(Some(&node), &path(&["Y", "z"])).unwrap();
        assert_eq!(first.ref_type, "Pet");
        assert!(first.properties.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_format_table() {
        let cases = [
            ("type: integer", "i64"),
            ("{type: integer, format: int32}", "i32"),
            ("{type: integer, format: uint}", "u64"),
            ("{type: integer, format: uint16}", "u16"),
            ("type: number", "f32"),
            ("{type: number, format: double}", "f64"),
            ("type: boolean", "bool"),
            ("type: string", "String"),
            ("{type: string, format: uuid}", "String"),
            ("{type: string, format: date}", "oapi_types::Date"),
            ("{type: string, format: email}", "oapi_types::Email"),
            ("{type: string, format: date-time}", "chrono::DateTime<chrono::Utc>"),
        ];
        for (yaml, expected) in cases {
            assert_eq!(resolve(yaml, &["T"]).unwrap().rust_type, expected, "{}", yaml);
        }

        let bytes = resolve("{type: string, format: byte}", &["T"]).unwrap();
        assert_eq!(bytes.rust_type, "Vec<u8>");
        assert!(bytes.skip_optional);

        let raw = resolve("{type: string, format: json}", &["T"]).unwrap();
        assert_eq!(raw.rust_type, ANY_TYPE);
        assert!(raw.skip_optional);
    }

    #[test]
    fn test_invalid_formats_are_errors() {
        for yaml in [
            "{type: integer, format: int128}",
            "{type: number, format: decimal}",
            "{type: boolean, format: flag}",
            "type: file",
        ] {
            let err = resolve(yaml, &["T"]).unwrap_err();
            assert!(matches!(err.root(), AppError::Format(_)), "{}", yaml);
        }
    }

    #[test]
    fn test_objects_without_properties() {
        assert_eq!(
            resolve("type: object", &["T"]).unwrap().rust_type,
            GENERIC_OBJECT_TYPE
        );
        assert_eq!(resolve("description: anything", &["T"]).unwrap().rust_type, ANY_TYPE);
        assert_eq!(
            resolve("oneOf: [{type: string}, {type: integer}]", &["T"]).unwrap().rust_type,
            ANY_TYPE
        );
    }

    #[test]
    fn test_type_override_wins() {
        let schema = resolve(
            "{type: object, x-rust-type: 'uuid::Uuid', properties: {a: {type: string}}}",
            &["T"],
        )
        .unwrap();
        assert_eq!(schema.rust_type, "uuid::Uuid");
        assert!(schema.properties.is_empty());
    }

    #[test]
    fn test_properties_sorted_and_required() {
        let schema = resolve(
            r#"
type: object
required: [name]
properties:
  zeta: {type: integer}
  name: {type: string}
  tags: {type: array, items: {type: string}}
"#,
            &["Pet"],
        )
        .unwrap();

        let names: Vec<&str> = schema
            .properties
            .iter()
            .map(|p| p.json_field_name.as_str())
            .collect();
        assert_eq!(names, vec!["name", "tags", "zeta"]);
        assert!(schema.properties[0].required);
        assert!(!schema.properties[2].required);
        assert_eq!(schema.properties[1].type_decl(), "Vec<String>");
        assert_eq!(schema.properties[2].type_decl(), "Option<i64>");
        assert!(schema.additional_type_defs().is_empty());
    }

    #[test]
    fn test_inline_additional_properties_synthesizes_one_type() {
        let schema = resolve(
            r#"
type: object
properties:
  labels:
    type: object
    additionalProperties:
      type: string
"#,
            &["Pet"],
        )
        .unwrap();

        let labels = &schema.properties[0];
        assert_eq!(labels.schema.ref_type, "Pet_Labels");

        let aux = schema.additional_type_defs();
        assert_eq!(aux.len(), 1);
        assert_eq!(aux[0].type_name, "Pet_Labels");
        assert_eq!(aux[0].json_name, "Pet.labels");
        assert!(aux[0].schema.has_additional_properties);
        assert_eq!(
            aux[0].schema.additional_properties_type.as_ref().unwrap().rust_type,
            "String"
        );
    }

    #[test]
    fn test_nested_objects_are_hoisted_with_path_names() {
        let schema = resolve(
            r#"
type: object
properties:
  owner:
    type: object
    properties:
      address:
        type: object
        properties:
          city: {type: string}
"#,
            &["Pet"],
        )
        .unwrap();

        let names: Vec<String> = schema
            .additional_type_defs()
            .into_iter()
            .map(|t| t.type_name)
            .collect();
        assert_eq!(names, vec!["Pet_Owner_Address", "Pet_Owner"]);
    }

    #[test]
    fn test_array_items_inherit_aux_types() {
        let schema = resolve(
            r#"
type: array
items:
  type: object
  properties:
    id: {type: integer, format: int32}
"#,
            &["Pets"],
        )
        .unwrap();

        assert_eq!(schema.rust_type, "Vec<Pets_Item>");
        assert!(schema.skip_optional);
        let aux = schema.additional_type_defs();
        assert_eq!(aux.len(), 1);
        assert_eq!(aux[0].type_name, "Pets_Item");
    }

    #[test]
    fn test_top_level_enum_not_hoisted() {
        let schema = resolve("{type: string, enum: [available, pending, '', available]}", &["Status"]).unwrap();
        assert_eq!(schema.rust_type, "String");
        let symbols: Vec<&str> = schema.enum_values.keys().map(String::as_str).collect();
        assert_eq!(symbols, vec!["Available", "Pending", "Empty"]);
        assert!(schema.additional_types.is_empty());
    }

    #[test]
    fn test_nested_enum_hoisted() {
        let schema = resolve(
            r#"
type: object
properties:
  status:
    type: integer
    enum: [1, 2]
"#,
            &["Pet"],
        )
        .unwrap();

        let status = &schema.properties[0];
        assert_eq!(status.schema.ref_type, "Pet_Status");
        let aux = schema.additional_type_defs();
        assert_eq!(aux.len(), 1);
        assert_eq!(aux[0].schema.rust_type, "i64");
        let literals: Vec<&str> = aux[0].schema.enum_values.values().map(String::as_str).collect();
        assert_eq!(literals, vec!["1", "2"]);
    }

    #[test]
    fn test_property_extensions() {
        let schema = resolve(
            r#"
type: object
required: [id]
properties:
  id:
    type: string
    x-omitempty: true
    x-rust-extra-tags:
      alias: ident
  note:
    type: string
    nullable: true
"#,
            &["Pet"],
        )
        .unwrap();

        let id = &schema.properties[0];
        assert!(id.omit_empty);
        assert_eq!(id.extra_tags.get("alias").map(String::as_str), Some("ident"));
        let note = &schema.properties[1];
        assert!(note.nullable);
        assert!(!note.omit_empty);
    }

    #[test]
    fn test_bad_extension_is_error() {
        let err = resolve(
            "{type: object, properties: {id: {type: string, x-omitempty: sometimes}}}",
            &["Pet"],
        )
        .unwrap_err();
        assert!(matches!(err.root(), AppError::Extension(_)));
        assert!(err.to_string().contains("property 'id'"));
    }

    #[test]
    fn test_property_error_carries_context() {
        let err = resolve(
            "{type: object, properties: {age: {type: integer, format: int128}}}",
            &["Pet"],
        )
        .unwrap_err();
        assert!(err
            .to_string()
            .starts_with("error generating schema for property 'age'"));
    }

    #[test]
    fn test_schema_object_default_is_any() {
        let naming = Naming::default();
        let imports = ImportMapping::default();
        let ctx = ResolveContext::new(&naming, &imports);
        let node: SchemaRef = RefOr::T(SchemaObject::default());
        assert_eq!(ctx.resolve_schema(Some(&node), &[]).unwrap().rust_type, ANY_TYPE);
    }
}
