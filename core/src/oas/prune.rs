#![deny(missing_docs)]

//! # Component Pruning
//!
//! Removes `schemas`, `parameters`, `responses` and `requestBodies` components that are not
//! reachable from any remaining path item.
//!
//! Reachability is computed on the serialized form of the document: every `$ref` string
//! found under `paths` seeds a work list, and every reached component is scanned in turn
//! until the closure is complete. Security schemes are never pruned.

use crate::error::{AppError, AppResult};
use crate::oas::document::OpenApiDocument;
use crate::oas::ref_utils::decode_pointer_segment;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;

/// Component sections subject to pruning.
const PRUNABLE_SECTIONS: [&str; 4] = ["schemas", "parameters", "responses", "requestBodies"];

type ComponentKey = (String, String);

fn to_value<T: Serialize>(item: &T) -> AppResult<Value> {
    serde_json::to_value(item)
        .map_err(|e| AppError::Document(format!("Failed to serialize for pruning: {}", e)))
}

/// Collects every `$ref` string below `value`.
fn collect_refs(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, v) in map {
                if key == "$ref" {
                    if let Value::String(s) = v {
                        out.push(s.clone());
                    }
                } else {
                    collect_refs(v, out);
                }
            }
        }
        Value::Array(items) => {
            for v in items {
                collect_refs(v, out);
            }
        }
        _ => {}
    }
}

/// `#/components/{section}/{name}` → `(section, name)` for prunable sections.
fn component_key(reference: &str) -> Option<ComponentKey> {
    let pointer = reference.strip_prefix("#/components/")?;
    let mut parts = pointer.splitn(3, '/');
    let section = parts.next()?;
    let name = parts.next()?;
    if !PRUNABLE_SECTIONS.contains(&section) || name.is_empty() {
        return None;
    }
    Some((section.to_string(), decode_pointer_segment(name)))
}

fn component_value(document: &OpenApiDocument, key: &ComponentKey) -> AppResult<Option<Value>> {
    let Some(components) = document.components.as_ref() else {
        return Ok(None);
    };
    let (section, name) = key;
    let value = match section.as_str() {
        "schemas" => components.schemas.get(name).map(to_value),
        "parameters" => components.parameters.get(name).map(to_value),
        "responses" => components.responses.get(name).map(to_value),
        "requestBodies" => components.request_bodies.get(name).map(to_value),
        _ => None,
    };
    value.transpose()
}

/// Prunes unreferenced components in place. Returns the number of removed components.
pub fn prune_unused_components(document: &mut OpenApiDocument) -> AppResult<usize> {
    let mut pending = Vec::new();
    collect_refs(&to_value(&document.paths)?, &mut pending);

    let mut reached: BTreeSet<ComponentKey> = BTreeSet::new();
    while let Some(reference) = pending.pop() {
        let Some(key) = component_key(&reference) else {
            continue;
        };
        if !reached.insert(key.clone()) {
            continue;
        }
        if let Some(value) = component_value(document, &key)? {
            collect_refs(&value, &mut pending);
        }
    }

    let Some(components) = document.components.as_mut() else {
        return Ok(0);
    };
    let before = components.schemas.len()
        + components.parameters.len()
        + components.responses.len()
        + components.request_bodies.len();

    let keep = |section: &str, name: &String| {
        reached.contains(&(section.to_string(), name.clone()))
    };
    components.schemas.retain(|name, _| keep("schemas", name));
    components.parameters.retain(|name, _| keep("parameters", name));
    components.responses.retain(|name, _| keep("responses", name));
    components
        .request_bodies
        .retain(|name, _| keep("requestBodies", name));

    let after = components.schemas.len()
        + components.parameters.len()
        + components.responses.len()
        + components.request_bodies.len();
    Ok(before - after)
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
openapi: 3.0.3
paths:
  /pets:
    get:
      parameters:
        - $ref: '#/components/parameters/Limit'
      responses:
        '200':
          $ref: '#/components/responses/PetList'
components:
  parameters:
    Limit:
      name: limit
      in: query
      schema:
        $ref: '#/components/schemas/Count'
    Unused:
      name: unused
      in: query
      schema: {type: string}
  responses:
    PetList:
      description: ok
      content:
        application/json:
          schema:
            type: array
            items:
              $ref: '#/components/schemas/Pet'
  schemas:
    Count: {type: integer}
    Pet:
      type: object
      properties:
        owner:
          $ref: '#/components/schemas/Owner'
    Owner:
      type: object
      properties:
        name: {type: string}
    Orphan:
      type: object
      properties:
        child:
          $ref: '#/components/schemas/OrphanChild'
    OrphanChild: {type: string}
  securitySchemes:
    api_key: {type: apiKey, in: header, name: X-Key}
"#;

    #[test]
    fn test_prune_keeps_transitive_closure() {
        let mut doc = OpenApiDocument::from_yaml_str(YAML).unwrap();
        let removed = prune_unused_components(&mut doc).unwrap();
        assert_eq!(removed, 3);

        let components = doc.components.as_ref().unwrap();
        let schemas: Vec<&str> = components.schemas.keys().map(String::as_str).collect();
        assert_eq!(schemas, vec!["Count", "Owner", "Pet"]);
        assert!(components.parameters.contains_key("Limit"));
        assert!(!components.parameters.contains_key("Unused"));
        assert!(components.responses.contains_key("PetList"));
        assert!(components.security_schemes.contains_key("api_key"));
    }

    #[test]
    fn test_prune_without_paths_removes_everything_prunable() {
        let mut doc = OpenApiDocument::from_yaml_str(YAML).unwrap();
        doc.paths.clear();
        prune_unused_components(&mut doc).unwrap();
        let components = doc.components.as_ref().unwrap();
        assert!(components.schemas.is_empty());
        assert!(components.parameters.is_empty());
        assert_eq!(components.security_schemes.len(), 1);
    }

    #[test]
    fn test_component_key() {
        assert_eq!(
            component_key("#/components/schemas/a~1b"),
            Some(("schemas".to_string(), "a/b".to_string()))
        );
        assert_eq!(component_key("#/components/securitySchemes/x"), None);
        assert_eq!(component_key("other.yaml#/components/schemas/X"), None);
    }
}
