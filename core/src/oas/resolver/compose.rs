#![deny(missing_docs)]

//! # allOf Composition
//!
//! Merges the members of an `allOf` into a single struct-shaped [`Schema`].
//!
//! Referenced members are kept as embedded (flattened) members; their properties are still
//! resolved, from the target component, so that conflicts with inline members are detected.
//! Inline members contribute their fields directly.

use crate::error::{AppError, AppResult, ResultExt};
use crate::oas::document::SchemaRef;
use crate::oas::models::{CompositionMember, Property, Schema, ANY_TYPE};
use crate::oas::resolver::ResolveContext;
use utoipa::openapi::RefOr;

impl ResolveContext<'_> {
    /// Merges `all_of` members found at `path`.
    pub fn merge_schemas(&self, all_of: &[SchemaRef], path: &[String]) -> AppResult<Schema> {
        let mut out = Schema::default();

        for member in all_of {
            match member {
                RefOr::Ref(r) => {
                    let type_name = self.resolve_schema(Some(member), path)?.ref_type;
                    if let Some(target) = self.absorb_reference(&r.ref_location)? {
                        for property in target.properties {
                            merge_property(&mut out, property)?;
                        }
                        if target.has_additional_properties {
                            merge_additional(&mut out, target.additional_properties_type)?;
                        }
                    }
                    out.composition.push(CompositionMember::Embedded {
                        type_name,
                        reference: r.ref_location.clone(),
                    });
                }
                RefOr::T(_) => {
                    let resolved = self.resolve_schema(Some(member), path)?;
                    self.merge_inline(&mut out, resolved)?;
                }
            }
        }
        Ok(out)
    }

    /// Resolves the local component behind an `allOf` reference, once per expansion chain.
    fn absorb_reference(&self, reference: &str) -> AppResult<Option<Schema>> {
        let Some((name, target)) = self.local_schema(reference) else {
            return Ok(None);
        };
        let component_path = [name.clone()];
        match self.expand_once(&name, || self.resolve_schema(Some(target), &component_path)) {
            Some(result) => result
                .with_context(|| format!("error resolving allOf reference ({})", reference))
                .map(Some),
            None => Ok(None),
        }
    }

    fn merge_inline(&self, out: &mut Schema, resolved: Schema) -> AppResult<()> {
        out.additional_types.extend(resolved.additional_types.iter().cloned());

        if resolved.is_ref() {
            out.composition.push(CompositionMember::Embedded {
                type_name: resolved.ref_type.clone(),
                reference: String::new(),
            });
            return Ok(());
        }
        if !resolved.is_struct() {
            return Ok(());
        }

        let members = if resolved.composition.is_empty() {
            vec![CompositionMember::Inline {
                properties: resolved.properties.clone(),
                has_additional_properties: resolved.has_additional_properties,
                additional_properties_type: resolved.additional_properties_type.clone(),
            }]
        } else {
            resolved.composition.clone()
        };

        for member in members {
            match member {
                CompositionMember::Embedded { .. } => out.composition.push(member),
                CompositionMember::Inline {
                    properties,
                    has_additional_properties,
                    additional_properties_type,
                } => {
                    let mut contributed = Vec::new();
                    for property in properties {
                        if merge_property(out, property.clone())? {
                            contributed.push(property);
                        }
                    }
                    if has_additional_properties {
                        merge_additional(out, additional_properties_type.clone())?;
                    }
                    out.composition.push(CompositionMember::Inline {
                        properties: contributed,
                        has_additional_properties,
                        additional_properties_type,
                    });
                }
            }
        }

        // Properties absorbed from nested references.
        for property in resolved.properties {
            merge_property(out, property)?;
        }
        Ok(())
    }
}

/// Adds `property` to the merged view. Returns `false` when an identical one exists.
fn merge_property(out: &mut Schema, property: Property) -> AppResult<bool> {
    match out
        .properties
        .iter()
        .find(|p| p.json_field_name == property.json_field_name)
    {
        Some(existing) if existing.equivalent(&property) => Ok(false),
        Some(_) => Err(AppError::Composition(format!(
            "conflicting definitions for property '{}'",
            property.json_field_name
        ))),
        None => {
            out.properties.push(property);
            Ok(true)
        }
    }
}

fn merge_additional(out: &mut Schema, value: Option<Box<Schema>>) -> AppResult<()> {
    let value = value.unwrap_or_else(|| Box::new(Schema::of_type(ANY_TYPE)));
    match &out.additional_properties_type {
        Some(existing) if out.has_additional_properties => {
            if existing.type_decl() != value.type_decl() {
                return Err(AppError::Composition(format!(
                    "additionalProperties are incompatible: '{}' vs '{}'",
                    existing.type_decl(),
                    value.type_decl()
                )));
            }
        }
        _ => {
            out.has_additional_properties = true;
            out.additional_properties_type = Some(value);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::error::AppError;
    use crate::oas::document::OpenApiDocument;
    use crate::oas::models::{CompositionMember, Schema};
    use crate::oas::naming::Naming;
    use crate::oas::ref_utils::ImportMapping;
    use crate::oas::resolver::ResolveContext;

    const YAML: &str = r#"
openapi: 3.0.3
paths: {}
components:
  schemas:
    Pet:
      type: object
      required: [name]
      properties:
        name: {type: string}
        id: {type: integer, format: int64}
    Dog:
      allOf:
        - $ref: '#/components/schemas/Pet'
        - type: object
          properties:
            bark: {type: boolean}
            name: {type: string}
          required: [name]
    Clash:
      allOf:
        - $ref: '#/components/schemas/Pet'
        - type: object
          properties:
            name: {type: integer}
    Required:
      allOf:
        - $ref: '#/components/schemas/Pet'
        - type: object
          properties:
            name: {type: string}
    Loop:
      allOf:
        - $ref: '#/components/schemas/Loop'
        - type: object
          properties:
            next: {type: string}
    Maps:
      allOf:
        - additionalProperties: {type: string}
        - additionalProperties: {type: integer}
"#;

    fn resolve_component(name: &str) -> crate::error::AppResult<Schema> {
        let doc = OpenApiDocument::from_yaml_str(YAML).unwrap();
        let naming = Naming::default();
        let imports = ImportMapping::default();
        let ctx = ResolveContext::new(&naming, &imports).with_document(&doc);
        ctx.resolve_schema(doc.schema(name), &[name.to_string()])
    }

    #[test]
    fn test_ref_member_embedded_and_absorbed() {
        let dog = resolve_component("Dog").unwrap();

        let names: Vec<&str> = dog
            .properties
            .iter()
            .map(|p| p.json_field_name.as_str())
            .collect();
        assert_eq!(names, vec!["id", "name", "bark"]);

        match &dog.composition[..] {
            [CompositionMember::Embedded { type_name, reference }, CompositionMember::Inline { properties, .. }] =>
            {
                assert_eq!(type_name, "Pet");
                assert_eq!(reference, "#/components/schemas/Pet");
                let inline: Vec<&str> = properties
                    .iter()
                    .map(|p| p.json_field_name.as_str())
                    .collect();
                assert_eq!(inline, vec!["bark"]);
            }
            other => panic!("unexpected composition: {:?}", other),
        }
        assert!(dog.is_struct());
    }

    #[test]
    fn test_conflicting_property_is_error() {
        let err = resolve_component("Clash").unwrap_err();
        assert!(matches!(err.root(), AppError::Composition(_)));
        assert!(err
            .to_string()
            .contains("conflicting definitions for property 'name'"));
    }

    #[test]
    fn test_required_and_optional_property_conflict() {
        let err = resolve_component("Required").unwrap_err();
        assert!(matches!(err.root(), AppError::Composition(_)));
        assert!(err
            .to_string()
            .contains("conflicting definitions for property 'name'"));
    }

    #[test]
    fn test_self_reference_terminates() {
        let looped = resolve_component("Loop").unwrap();
        assert_eq!(looped.composition.len(), 2);
        assert_eq!(looped.properties.len(), 1);
    }

    #[test]
    fn test_incompatible_additional_properties() {
        let err = resolve_component("Maps").unwrap_err();
        assert!(matches!(err.root(), AppError::Composition(_)));
    }
}
