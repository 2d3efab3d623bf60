#![deny(missing_docs)]

//! # Naming Utilities
//!
//! Pure string transforms that turn OpenAPI names (schema keys, property names, enum
//! literals, URI templates) into Rust-safe identifiers.
//!
//! Word splitting is delegated to `heck`; the [`Naming`] value adds the configurable
//! initialism set (e.g. `id` → `ID`) on top.

use heck::ToSnakeCase;
use indexmap::IndexMap;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use crate::error::{AppError, AppResult};

/// Strict, reserved and edition keywords.
const RUST_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "crate",
    "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl",
    "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub",
    "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true", "try",
    "type", "typeof", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

/// Prelude names a generated type must not shadow.
const RESERVED_TYPE_NAMES: &[&str] = &[
    "Box", "Err", "None", "Ok", "Option", "Result", "Self", "Some", "String", "Vec",
];

/// Identifier rules parameterised by an initialism set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Naming {
    initialisms: BTreeSet<String>,
}

impl Naming {
    /// Creates a sanitizer that upper-cases the given words when camel-casing.
    pub fn new<I, S>(initialisms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            initialisms: initialisms
                .into_iter()
                .map(|s| s.as_ref().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// Converts any separator-delimited or mixed-case string to `UpperCamelCase`.
    ///
    /// `"get-v1-foo-bar"` → `"GetV1FooBar"`; with initialism `id`, `"user_id"` → `"UserID"`.
    pub fn to_camel_case(&self, s: &str) -> String {
        s.to_snake_case()
            .split('_')
            .filter(|w| !w.is_empty())
            .map(|word| {
                if self.initialisms.contains(word) {
                    word.to_uppercase()
                } else {
                    capitalize(word)
                }
            })
            .collect()
    }

    /// Converts to `snake_case`.
    pub fn to_snake_case(&self, s: &str) -> String {
        s.to_snake_case()
    }

    /// Converts a schema/component name into a Rust type name.
    ///
    /// Names that already are `UpperCamelCase` identifiers (`PetDTO`, `ListPetsJSONBody`) are
    /// kept as written.
    pub fn type_name(&self, name: &str) -> String {
        fix_type_ident(self.type_segment(name), "Unnamed")
    }

    /// Builds the type name of a synthesized type from its name path.
    ///
    /// Segments are converted like [`Naming::type_name`] and joined with `_`, so
    /// `["Pet", "owner_info"]` becomes `"Pet_OwnerInfo"` and `["GetToyJSON200Response", "tags"]`
    /// becomes `"GetToyJSON200Response_Tags"`.
    pub fn path_to_type_name(&self, path: &[String]) -> String {
        let joined = path
            .iter()
            .map(|segment| self.type_segment(segment))
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join("_");
        fix_type_ident(joined, "Unnamed")
    }

    fn type_segment(&self, segment: &str) -> String {
        if is_type_ident(segment) {
            return segment.to_string();
        }
        self.to_camel_case(&segment.replace('$', " DollarSign "))
    }

    /// Struct field name for a JSON property.
    pub fn field_name(&self, json_name: &str) -> String {
        fix_value_ident(self.to_snake_case(&json_name.replace('$', " dollar sign ")))
    }

    /// Local variable / function argument name for a parameter.
    pub fn variable_name(&self, param_name: &str) -> String {
        self.field_name(param_name)
    }

    /// Function name for an operation id.
    pub fn function_name(&self, operation_id: &str) -> String {
        fix_value_ident(self.to_snake_case(operation_id))
    }

    /// Replaces characters that cannot appear in an identifier and avoids reserved words.
    pub fn sanitize_identifier(&self, s: &str) -> String {
        let cleaned: String = s
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
            .collect();
        if cleaned.is_empty() {
            return cleaned;
        }
        fix_type_ident(cleaned, "")
    }

    /// Builds unique enum symbols for `values`, keyed symbol → literal in declaration order.
    ///
    /// Exact duplicate literals are dropped (first occurrence wins). Literals whose sanitized
    /// symbols collide receive the smallest numeric suffix not yet taken, so
    /// `["Foo", "foo", "Foo "]` yields `Foo`, `Foo1`, `Foo2`.
    pub fn sanitize_enum_names(&self, values: &[String]) -> IndexMap<String, String> {
        let mut seen_literals = BTreeSet::new();
        let mut counters: BTreeMap<String, usize> = BTreeMap::new();
        let mut out = IndexMap::new();

        for literal in values {
            if !seen_literals.insert(literal.as_str()) {
                continue;
            }
            let base = if literal.is_empty() {
                "Empty".to_string()
            } else {
                let camel = self.to_camel_case(&literal.replace('$', " DollarSign "));
                let symbol = self.sanitize_identifier(&camel);
                if symbol.is_empty() {
                    "Value".to_string()
                } else {
                    symbol
                }
            };

            let counter = counters.entry(base.clone()).or_insert(0);
            let mut candidate = if *counter == 0 {
                base.clone()
            } else {
                format!("{}{}", base, counter)
            };
            while out.contains_key(&candidate) {
                *counter += 1;
                candidate = format!("{}{}", base, counter);
            }
            *counter += 1;
            out.insert(candidate, literal.clone());
        }
        out
    }
}

/// `UpperCamelCase` ASCII identifier without separators.
fn is_type_ident(s: &str) -> bool {
    s.starts_with(|c: char| c.is_ascii_uppercase()) && s.chars().all(|c| c.is_ascii_alphanumeric())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn fix_type_ident(ident: String, fallback: &str) -> String {
    if ident.is_empty() {
        return fallback.to_string();
    }
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        return format!("N{}", ident);
    }
    if RESERVED_TYPE_NAMES.contains(&ident.as_str()) || RUST_KEYWORDS.contains(&ident.as_str()) {
        return format!("T{}", ident);
    }
    ident
}

fn fix_value_ident(ident: String) -> String {
    if ident.is_empty() {
        return "value".to_string();
    }
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        return format!("n{}", ident);
    }
    if RUST_KEYWORDS.contains(&ident.as_str()) {
        return format!("p_{}", ident);
    }
    ident
}

/// True when `s` is a Rust keyword.
pub fn is_rust_keyword(s: &str) -> bool {
    RUST_KEYWORDS.contains(&s)
}

fn path_param_regex() -> &'static Regex {
    static PATH_PARAM_RE: OnceLock<Regex> = OnceLock::new();
    PATH_PARAM_RE.get_or_init(|| Regex::new(r"\{[.;?]?([^{}*]+)\*?\}").expect("Invalid regex"))
}

/// Names of the `{...}` tokens of a URI template in order of appearance.
///
/// Label (`.`), matrix (`;`) and query (`?`) prefixes and the explode suffix (`*`) are
/// stripped: `/a/{.x}/{y*}` → `["x", "y"]`.
pub fn ordered_params_from_uri(uri: &str) -> Vec<String> {
    path_param_regex()
        .captures_iter(uri)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// Rewrites a URI template to plain `{name}` tokens for routers.
pub fn normalize_path_template(uri: &str) -> String {
    path_param_regex().replace_all(uri, "{$1}").into_owned()
}

/// Derives an operation id from the method and path when none is declared.
///
/// `GET /pets/{id}` → `"get-pets-{id}"`; callers camel-case the result.
pub fn generate_default_operation_id(method: &str, path: &str) -> AppResult<String> {
    if method.is_empty() {
        return Err(AppError::OperationId(
            "method cannot be an empty string".to_string(),
        ));
    }
    if path.is_empty() {
        return Err(AppError::OperationId(
            "path cannot be an empty string".to_string(),
        ));
    }

    let mut id = method.to_lowercase();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        id.push('-');
        id.push_str(segment);
    }
    Ok(id)
}

/// Renders free text as `///` doc-comment lines (no trailing newline).
pub fn string_to_doc_comment(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    trimmed
        .lines()
        .map(|line| {
            let line = line.trim_end();
            if line.is_empty() {
                "///".to_string()
            } else {
                format!("/// {}", line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_camel_case_conversion() {
        let naming = Naming::default();
        assert_eq!(naming.to_camel_case("get-v1-foo-bar"), "GetV1FooBar");
        assert_eq!(naming.to_camel_case("user_id"), "UserId");
        assert_eq!(naming.to_camel_case("findPetsByStatus"), "FindPetsByStatus");
        assert_eq!(naming.to_camel_case("Foo "), "Foo");
    }

    #[test]
    fn test_camel_case_with_initialisms() {
        let naming = Naming::new(["id", "URL"]);
        assert_eq!(naming.to_camel_case("user_id"), "UserID");
        assert_eq!(naming.to_camel_case("userId"), "UserID");
        assert_eq!(naming.to_camel_case("callback-url"), "CallbackURL");
    }

    #[test]
    fn test_type_name_edge_cases() {
        let naming = Naming::default();
        assert_eq!(naming.type_name("$"), "DollarSign");
        assert_eq!(naming.type_name("1foo"), "N1foo");
        assert_eq!(naming.type_name("pet_store"), "PetStore");
        assert_eq!(naming.type_name("String"), "TString");
        assert_eq!(naming.type_name("self"), "TSelf");
    }

    #[test]
    fn test_path_to_type_name() {
        let naming = Naming::default();
        let path = strings(&["Pet", "owner_info", "Item"]);
        assert_eq!(naming.path_to_type_name(&path), "Pet_OwnerInfo_Item");
        assert_eq!(naming.path_to_type_name(&strings(&["404"])), "N404");
    }

    #[test]
    fn test_type_identifiers_keep_their_capitals() {
        let naming = Naming::default();
        assert_eq!(naming.type_name("PetDTO"), "PetDTO");
        assert_eq!(naming.type_name("AddPetJSONBody"), "AddPetJSONBody");
        assert_eq!(naming.type_name("petDTO"), "PetDto");

        let path = strings(&["GetToyJSON200Response", "tags", "Item"]);
        assert_eq!(
            naming.path_to_type_name(&path),
            "GetToyJSON200Response_Tags_Item"
        );
        let parent = naming.type_name("PetDTO");
        let child = naming.path_to_type_name(&strings(&["PetDTO", "owner"]));
        assert!(child.starts_with(&format!("{}_", parent)));
    }

    #[test]
    fn test_field_name_keywords() {
        let naming = Naming::default();
        assert_eq!(naming.field_name("petType"), "pet_type");
        assert_eq!(naming.field_name("type"), "p_type");
        assert_eq!(naming.field_name("2fa"), "n2fa");
        assert_eq!(naming.variable_name("X-Request-ID"), "x_request_id");
    }

    #[test]
    fn test_sanitize_enum_names_disambiguates_in_order() {
        let naming = Naming::default();
        let names = naming.sanitize_enum_names(&strings(&["Foo", "foo", "Foo ", "Foo"]));
        let symbols: Vec<&str> = names.keys().map(String::as_str).collect();
        assert_eq!(symbols, vec!["Foo", "Foo1", "Foo2"]);
        assert_eq!(names["Foo2"], "Foo ");
    }

    #[test]
    fn test_sanitize_enum_names_special_literals() {
        let naming = Naming::default();
        let names = naming.sanitize_enum_names(&strings(&["", "!!", "1", "self"]));
        let symbols: Vec<&str> = names.keys().map(String::as_str).collect();
        assert_eq!(symbols, vec!["Empty", "Value", "N1", "TSelf"]);
    }

    #[test]
    fn test_ordered_params_from_uri() {
        assert_eq!(
            ordered_params_from_uri("/a/{.x}/b/{;y*}/{z}"),
            strings(&["x", "y", "z"])
        );
        assert!(ordered_params_from_uri("/plain").is_empty());
        assert_eq!(normalize_path_template("/a/{.x}/{y*}"), "/a/{x}/{y}");
    }

    #[test]
    fn test_generate_default_operation_id() {
        assert_eq!(
            generate_default_operation_id("GET", "/v1/foo/bar").unwrap(),
            "get-v1-foo-bar"
        );
        let naming = Naming::default();
        let id = generate_default_operation_id("GET", "/v1/foo/bar").unwrap();
        assert_eq!(naming.to_camel_case(&id), "GetV1FooBar");
        assert!(generate_default_operation_id("", "/x").is_err());
        assert!(matches!(
            generate_default_operation_id("GET", ""),
            Err(AppError::OperationId(_))
        ));
    }

    #[test]
    fn test_string_to_doc_comment() {
        assert_eq!(string_to_doc_comment("  "), "");
        assert_eq!(
            string_to_doc_comment("A pet.\n\nWith owner."),
            "/// A pet.\n///\n/// With owner."
        );
    }
}
