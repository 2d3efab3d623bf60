#![deny(missing_docs)]

//! # Generate Command
//!
//! Reads an OpenAPI document, resolves it and writes the generated Rust module.

use std::fs;
use std::path::{Path, PathBuf};

use oapigen_core::codegen::{generate, Options};
use oapigen_core::OpenApiDocument;
use tracing::info;

use crate::config::{load_config, load_template_dir, split_list, CliConfig};
use crate::error::{CliError, CliResult};

/// Arguments for the generate command.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct GenerateArgs {
    /// Path to the OpenAPI document (YAML, or JSON by extension).
    pub input: PathBuf,

    /// Output file. Prints to stdout when omitted.
    #[clap(short, long)]
    pub output: Option<PathBuf>,

    /// YAML or JSON configuration file.
    #[clap(short, long, env = "OAPIGEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Module name shown in the generated header. Defaults to the input file stem.
    #[clap(long)]
    pub module_name: Option<String>,

    /// Directory of `{template}.tera` overrides.
    #[clap(long)]
    pub templates_dir: Option<PathBuf>,

    /// Do not emit types, enums and constants.
    #[clap(long)]
    pub no_types: bool,

    /// Emit the route table, server trait and response enums.
    #[clap(long)]
    pub generate_server: bool,

    /// Embed the document as a JSON string constant.
    #[clap(long)]
    pub embed_spec: bool,

    /// Skip pretty-printing the output.
    #[clap(long)]
    pub skip_fmt: bool,

    /// Keep unreferenced components.
    #[clap(long)]
    pub skip_prune: bool,

    /// Emit type aliases for references instead of newtypes.
    #[clap(long)]
    pub alias_types: bool,

    /// Only keep operations with one of these tags (comma-separated, repeatable).
    #[clap(long)]
    pub include_tags: Vec<String>,

    /// Drop operations with any of these tags (comma-separated, repeatable).
    #[clap(long)]
    pub exclude_tags: Vec<String>,

    /// Component schemas not to emit (comma-separated, repeatable).
    #[clap(long)]
    pub exclude_schemas: Vec<String>,

    /// Words upper-cased in type names (comma-separated, repeatable).
    #[clap(long)]
    pub initialisms: Vec<String>,
}

impl GenerateArgs {
    /// Applies flags on top of `options`. Flags only ever switch features on or add entries.
    pub fn apply(&self, options: &mut Options) {
        if self.no_types {
            options.generate_types = false;
        }
        options.generate_server |= self.generate_server;
        options.embed_spec |= self.embed_spec;
        options.skip_fmt |= self.skip_fmt;
        options.skip_prune |= self.skip_prune;
        options.alias_types |= self.alias_types;
        options.include_tags.extend(split_list(&self.include_tags));
        options.exclude_tags.extend(split_list(&self.exclude_tags));
        options.exclude_schemas.extend(split_list(&self.exclude_schemas));
        options.initialisms.extend(split_list(&self.initialisms));
    }
}

fn read_document(path: &Path) -> CliResult<OpenApiDocument> {
    if !path.exists() {
        return Err(CliError::General(format!(
            "OpenAPI file not found: {:?}",
            path
        )));
    }
    let content = fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let document = if is_json {
        OpenApiDocument::from_json_str(&content)?
    } else {
        OpenApiDocument::from_yaml_str(&content)?
    };
    Ok(document)
}

fn default_module_name(input: &Path) -> String {
    input
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "api".to_string())
}

/// Runs the generator and returns the module text and its destination.
pub fn render(args: &GenerateArgs) -> CliResult<(String, Option<PathBuf>)> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => CliConfig::default(),
    };

    let mut options = config.options;
    if let Some(dir) = args.templates_dir.as_ref().or(config.templates_dir.as_ref()) {
        options.user_templates.extend(load_template_dir(dir)?);
    }
    args.apply(&mut options);

    let module_name = args
        .module_name
        .clone()
        .or(config.module_name)
        .unwrap_or_else(|| default_module_name(&args.input));
    let output = args.output.clone().or(config.output);

    let document = read_document(&args.input)?;
    let code = generate(document, &module_name, &options)?;
    Ok((code, output))
}

/// Executes the generate command.
pub fn execute(args: &GenerateArgs) -> CliResult<()> {
    let (code, output) = render(args)?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, code)?;
            info!(output = %path.display(), "Wrote generated module.");
        }
        None => print!("{}", code),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    const YAML: &str = r#"
openapi: 3.0.3
info: {title: Pets, version: '1.0'}
paths:
  /pets:
    get:
      operationId: listPets
      tags: [pets]
      responses:
        '200':
          description: ok
          content:
            application/json:
              schema:
                type: array
                items: {$ref: '#/components/schemas/Pet'}
  /admin/reset:
    post:
      operationId: reset
      tags: [admin]
      responses:
        '204': {description: done}
components:
  schemas:
    Pet:
      type: object
      properties:
        name: {type: string}
"#;

    fn args_for(input: PathBuf) -> GenerateArgs {
        GenerateArgs {
            input,
            ..Default::default()
        }
    }

    #[test]
    fn test_apply_flags() {
        let args = GenerateArgs {
            no_types: true,
            generate_server: true,
            include_tags: vec!["a,b".to_string()],
            ..Default::default()
        };
        let mut options = Options {
            include_tags: vec!["z".to_string()],
            ..Options::default()
        };
        args.apply(&mut options);
        assert!(!options.generate_types);
        assert!(options.generate_server);
        assert_eq!(options.include_tags, vec!["z", "a", "b"]);
    }

    #[test]
    fn test_execute_writes_module() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("petstore.yaml");
        fs::write(&input, YAML).unwrap();
        let output = dir.path().join("out/petstore.rs");

        let args = GenerateArgs {
            output: Some(output.clone()),
            generate_server: true,
            exclude_tags: vec!["admin".to_string()],
            ..args_for(input)
        };
        execute(&args).unwrap();

        let code = fs::read_to_string(output).unwrap();
        assert!(code.contains("Module `petstore`"));
        assert!(code.contains("pub struct Pet {"));
        assert!(code.contains("fn list_pets("));
        assert!(!code.contains("fn reset("));
    }

    #[test]
    fn test_config_file_and_flags_combine() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("petstore.json");
        let document: serde_json::Value = serde_yaml::from_str(YAML).unwrap();
        fs::write(&input, serde_json::to_string(&document).unwrap()).unwrap();

        let config = dir.path().join("oapigen.yaml");
        fs::write(&config, "module-name: pets_api\nalias-types: true\n").unwrap();

        let args = GenerateArgs {
            config: Some(config),
            embed_spec: true,
            ..args_for(input)
        };
        let (code, output) = render(&args).unwrap();
        assert_eq!(output, None);
        assert!(code.contains("Module `pets_api`"));
        assert!(code.contains("pub type ListPetsJSON200Response = Vec<Pet>;"));
        assert!(code.contains("OPENAPI_SPEC_JSON"));
    }

    #[test]
    fn test_templates_dir_overrides() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("petstore.yaml");
        fs::write(&input, YAML).unwrap();
        let templates = dir.path().join("templates");
        fs::create_dir_all(&templates).unwrap();
        fs::write(templates.join("enums.tera"), "pub const ENUMS_OVERRIDDEN: bool = true;\n")
            .unwrap();

        let args = GenerateArgs {
            templates_dir: Some(templates),
            ..args_for(input)
        };
        let (code, _) = render(&args).unwrap();
        assert!(code.contains("pub const ENUMS_OVERRIDDEN: bool = true;"));
    }

    #[test]
    fn test_missing_input() {
        let dir = tempdir().unwrap();
        let err = render(&args_for(dir.path().join("missing.yaml"))).unwrap_err();
        assert!(err.to_string().contains("OpenAPI file not found"));
    }

    #[test]
    fn test_core_error_propagates() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("bad.yaml");
        fs::write(
            &input,
            r#"
openapi: 3.0.3
paths:
  /pets/{id}:
    get:
      responses: {}
"#,
        )
        .unwrap();
        let err = render(&args_for(input)).unwrap_err();
        assert!(matches!(err, CliError::Core(_)));
    }

    #[test]
    fn test_default_module_name() {
        assert_eq!(default_module_name(Path::new("specs/petstore.yaml")), "petstore");
    }
}
