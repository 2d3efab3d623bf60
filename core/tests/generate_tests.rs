use oapigen_core::codegen::{build_model, generate, Options};
use oapigen_core::{AppError, OpenApiDocument};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;

const PETSTORE: &str = include_str!("fixtures/petstore.yaml");

fn petstore() -> OpenApiDocument {
    OpenApiDocument::from_yaml_str(PETSTORE).unwrap()
}

fn options() -> Options {
    Options {
        import_mapping: BTreeMap::from([("common.yaml".to_string(), "crate::common".to_string())]),
        ..Options::default()
    }
}

#[test]
fn test_model_operations_in_path_and_method_order() {
    let model = build_model(petstore(), &options()).unwrap();
    let ids: Vec<(&str, &str)> = model
        .operations
        .iter()
        .map(|op| (op.method.as_str(), op.operation_id.as_str()))
        .collect();
    assert_eq!(
        ids,
        vec![
            ("GET", "ListPets"),
            ("POST", "CreatePet"),
            ("GET", "GetPhoto"),
            ("GET", "GetInventory"),
        ]
    );

    let photo = &model.operations[2];
    let path_params: Vec<&str> = photo.path_params.iter().map(|p| p.param_name.as_str()).collect();
    assert_eq!(path_params, vec!["petId", "photoId"]);
}

#[test]
fn test_model_security_and_middlewares() {
    let model = build_model(petstore(), &options()).unwrap();

    let providers: Vec<Vec<&str>> = model
        .operations
        .iter()
        .map(|op| {
            op.security_definitions
                .iter()
                .map(|s| s.provider_name.as_str())
                .collect()
        })
        .collect();
    assert_eq!(
        providers,
        vec![vec!["api_key"], vec!["petstore_auth"], vec!["api_key"], vec![]]
    );
    assert_eq!(model.operations[1].middlewares, vec!["logging", "auth"]);

    assert_eq!(
        model.constants.security_scheme_provider_names,
        vec!["ApiKey", "PetstoreAuth"]
    );
    assert_eq!(model.constants.middlewares, vec!["auth", "logging"]);
}

#[test]
fn test_model_types_are_pruned_and_deduplicated() {
    let model = build_model(petstore(), &options()).unwrap();
    let names: Vec<String> = model.all_types().into_iter().map(|t| t.type_name).collect();
    assert_eq!(
        names,
        vec![
            "Error",
            "NewPet",
            "NewPet_Status",
            "Pet",
            "Pets",
            "ListPetsParams",
            "ListPetsJSON200Response",
            "ListPetsJSONDefaultResponse",
            "GetPhotoJSON200Response",
            "GetInventoryJSON200Response",
        ]
    );

    let enums: Vec<&str> = model.enums.iter().map(|e| e.type_name.as_str()).collect();
    assert_eq!(enums, vec!["NewPet_Status"]);
    assert_eq!(model.imports.len(), 1);
    assert_eq!(model.imports[0].alias, "external_ref0");
}

#[test]
fn test_generated_types() {
    let code = generate(petstore(), "petstore", &options()).unwrap();

    assert!(code.contains("use crate::common as external_ref0;"));
    assert!(code.contains("pub const API_KEY_SCOPES: &str = \"ApiKey.Scopes\";"));
    assert!(code.contains("pub const MIDDLEWARE_AUTH: &str = \"auth\";"));

    assert!(code.contains("pub enum NewPet_Status {"));
    assert!(code.contains("#[serde(rename = \"available\")]"));

    assert!(code.contains("pub struct NewPet {"));
    assert!(code.contains("pub name: String,"));
    assert!(code.contains("pub owner: Option<external_ref0::Owner>,"));
    assert!(code.contains("pub born: Option<oapi_types::Date>,"));
    assert!(code.contains("pub uuid: Option<uuid::Uuid>,"));
    assert!(code.contains("pub status: Option<NewPet_Status>,"));

    assert!(code.contains("pub struct Pet {"));
    assert!(code.contains("pub new_pet: NewPet,"));
    assert!(code.contains("pub id: i64,"));
    assert!(code.contains("pub struct Pets(pub Vec<Pet>);"));

    assert!(code.contains("pub struct ListPetsParams {"));
    assert!(code.contains("#[serde(rename = \"X-Request-Id\")]"));
    assert!(code.contains("pub x_request_id: String,"));
    assert!(code.contains("pub limit: Option<i32>,"));

    assert!(code.contains("pub additional_properties: std::collections::HashMap<String, i32>,"));
    assert!(!code.contains("Unused"));
    assert!(!code.contains("ServerInterface"));
}

#[test]
fn test_generated_server() {
    let options = Options {
        generate_server: true,
        ..options()
    };
    let code = generate(petstore(), "petstore", &options).unwrap();

    assert!(code.contains("pub trait ServerInterface {"));
    assert!(code.contains("fn list_pets("));
    assert!(code.contains("params: ListPetsParams"));
    assert!(code.contains("body: NewPet"));
    assert!(code.contains("pet_id: String"));
    assert!(code.contains("photo_id: i64"));
    assert!(code.contains("pub enum GetInventoryResponse {"));
    assert!(code.contains("JsonDefault {"));
    assert!(code.contains("body: ListPetsJSONDefaultResponse"));
    assert!(code.contains("path: \"/pets/{petId}/photos/{photoId}\""));
    assert!(code.contains("pub fn dispatch_list_pets<S: ServerInterface + ?Sized>("));
    assert!(code.contains("pub fn dispatch_get_photo<S: ServerInterface + ?Sized>("));
    assert!(code.contains("pub enum BindError {"));
}

#[test]
fn test_tag_filter_removes_operations_and_their_types() {
    let options = Options {
        include_tags: vec!["store".to_string()],
        ..options()
    };
    let model = build_model(petstore(), &options).unwrap();
    assert_eq!(model.operations.len(), 1);
    assert!(model.types.is_empty());
    assert!(model.constants.security_scheme_provider_names.is_empty());
}

#[test]
fn test_generation_is_deterministic() {
    let first = generate(petstore(), "petstore", &options()).unwrap();
    let second = generate(petstore(), "petstore", &options()).unwrap();
    assert_eq!(first, second);

    let value: serde_json::Value = serde_yaml::from_str(PETSTORE).unwrap();
    let from_json =
        OpenApiDocument::from_json_str(&serde_json::to_string_pretty(&value).unwrap()).unwrap();
    assert_eq!(generate(from_json, "petstore", &options()).unwrap(), first);
}

#[test]
fn test_missing_import_mapping_is_reference_error() {
    let err = build_model(petstore(), &Options::default()).unwrap_err();
    assert!(matches!(err.root(), AppError::Reference(_)));
    assert!(err.to_string().contains("NewPet"));
}

#[test]
fn test_conflicting_all_of_reports_schema() {
    let yaml = r#"
openapi: 3.0.3
paths: {}
components:
  schemas:
    Base:
      type: object
      properties:
        x: {type: string}
    Derived:
      allOf:
        - $ref: '#/components/schemas/Base'
        - type: object
          properties:
            x: {type: integer}
"#;
    let doc = OpenApiDocument::from_yaml_str(yaml).unwrap();
    let options = Options {
        skip_prune: true,
        ..Options::default()
    };
    let err = build_model(doc, &options).unwrap_err();
    assert!(matches!(err.root(), AppError::Composition(_)));
    assert!(err
        .to_string()
        .contains("error generating type definition for schema 'Derived'"));
}

#[test]
fn test_embedded_spec_round_trips() {
    let options = Options {
        embed_spec: true,
        ..options()
    };
    let code = generate(petstore(), "petstore", &options).unwrap();
    // `"#/components/...` inside the document forces a second `#`.
    assert!(code.contains("pub const OPENAPI_SPEC_JSON: &str = r##\"{"));
    assert!(code.contains("pub fn openapi_spec()"));
    assert!(code.contains("\"NewPet\""));
    assert!(!code.contains("\"Unused\""));
}
