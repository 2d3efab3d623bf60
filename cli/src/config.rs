#![deny(missing_docs)]

//! # Configuration File
//!
//! Loads the optional YAML (or JSON, by extension) configuration file. Generator options sit
//! at the top level next to the CLI-only keys `module-name`, `output` and `templates-dir`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use oapigen_core::codegen::Options;
use oapigen_core::emit::TEMPLATE_NAMES;
use serde::Deserialize;
use tracing::debug;

use crate::error::{CliError, CliResult};

/// Contents of a configuration file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CliConfig {
    /// Name of the generated module.
    pub module_name: Option<String>,
    /// Output file.
    pub output: Option<PathBuf>,
    /// Directory of `{template}.tera` overrides.
    pub templates_dir: Option<PathBuf>,
    /// Generator options.
    #[serde(flatten)]
    pub options: Options,
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// Reads and parses the configuration file at `path`.
pub fn load_config(path: &Path) -> CliResult<CliConfig> {
    if !path.exists() {
        return Err(CliError::Config(format!(
            "Config file not found: {:?}",
            path
        )));
    }
    let content = fs::read_to_string(path)?;
    let config = if is_json(path) {
        serde_json::from_str(&content)
            .map_err(|e| CliError::Config(format!("Failed to parse {:?}: {}", path, e)))?
    } else {
        serde_yaml::from_str(&content)
            .map_err(|e| CliError::Config(format!("Failed to parse {:?}: {}", path, e)))?
    };
    debug!(path = %path.display(), "Loaded configuration file.");
    Ok(config)
}

/// Reads every `{name}.tera` file in `dir` whose name is a known template.
///
/// Files with other names are skipped.
pub fn load_template_dir(dir: &Path) -> CliResult<BTreeMap<String, String>> {
    let mut templates = BTreeMap::new();
    for name in TEMPLATE_NAMES {
        let path = dir.join(format!("{}.tera", name));
        if path.is_file() {
            templates.insert(name.to_string(), fs::read_to_string(&path)?);
            debug!(template = name, path = %path.display(), "Loaded template override.");
        }
    }
    Ok(templates)
}

/// Splits comma-separated list arguments, dropping empty entries.
pub fn split_list(values: &[String]) -> Vec<String> {
    values
        .iter()
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}
