//! Core domain types for plugin documentation.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::error::{PluginDocError, Result};

// ---------------------------------------------------------------------------
// PluginRef
// ---------------------------------------------------------------------------

/// A plugin package located on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginRef {
    /// Short name used by the docs (`html-keyboard-response`).
    pub name: String,
    /// Package directory (`packages/plugin-html-keyboard-response`).
    pub dir: PathBuf,
    /// Entry source file handed to the extractor.
    pub entry: PathBuf,
    /// tsconfig handed to the extractor.
    pub tsconfig: PathBuf,
    /// Published npm name (`@jspsych/plugin-html-keyboard-response`), used
    /// when `package.json` carries none.
    pub package: String,
}

impl PluginRef {
    /// Resolve a short plugin name to its package layout.
    pub fn resolve(config: &AppConfig, name: &str) -> Result<Self> {
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(PluginDocError::validation(format!(
                "invalid plugin name '{name}'"
            )));
        }

        let dir = config
            .packages_dir()
            .join(format!("{}{name}", config.project.plugin_prefix));
        Ok(Self::from_dir(name, dir, config))
    }

    /// Build a reference for an already-known package directory.
    pub fn from_dir(name: &str, dir: PathBuf, config: &AppConfig) -> Self {
        let scope = config.project.npm_scope.trim_end_matches('/');
        let package = match dir.file_name() {
            Some(dir_name) => format!("{scope}/{}", dir_name.to_string_lossy()),
            None => format!("{scope}/{}{name}", config.project.plugin_prefix),
        };
        Self {
            name: name.to_string(),
            entry: dir.join(&config.typedoc.entry),
            tsconfig: dir.join(&config.typedoc.tsconfig),
            package,
            dir,
        }
    }

    /// Path of the package's `package.json`.
    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join("package.json")
    }
}

// ---------------------------------------------------------------------------
// PackageManifest
// ---------------------------------------------------------------------------

/// The fields of a plugin's `package.json` that the docs use.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageManifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Either a plain string or an `{ "name": ... }` object.
    #[serde(default)]
    pub author: Option<serde_json::Value>,
}

impl PackageManifest {
    /// Read and parse a `package.json`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PluginDocError::io(path, e))?;
        serde_json::from_str(&content).map_err(|e| PluginDocError::json(path, e))
    }

    /// Published name, or `fallback` when the manifest has none.
    pub fn package_name<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(fallback)
    }

    /// Package version, or a lookup error.
    pub fn require_version(&self) -> Result<&str> {
        self.version
            .as_deref()
            .ok_or_else(|| PluginDocError::lookup("package.json has no \"version\""))
    }

    /// Author display name, if present in either supported form.
    pub fn author_name(&self) -> Option<String> {
        match self.author.as_ref()? {
            serde_json::Value::String(s) if !s.trim().is_empty() => {
                // "Name <email> (url)" -> "Name"
                let name = s.split(['<', '(']).next().unwrap_or(s).trim();
                Some(name.to_string())
            }
            serde_json::Value::Object(map) => map
                .get("name")
                .and_then(|v| v.as_str())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ParameterRow
// ---------------------------------------------------------------------------

/// One row of a parameter or data table, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterRow {
    pub name: String,
    /// Human-readable type (already mapped).
    pub type_name: String,
    /// Literal default value; empty for required parameters.
    pub default_value: String,
    /// Whether the default is `undefined`, i.e. the parameter must be set.
    pub required: bool,
    /// Markdown description.
    pub description: String,
}

// ---------------------------------------------------------------------------
// Parameter type names
// ---------------------------------------------------------------------------

/// Map a `ParameterType` enum member to its documented name.
///
/// Unknown names are returned unchanged.
pub fn map_parameter_type(raw: &str) -> String {
    let mapped = match raw {
        "HTML_STRING" => "HTML string",
        "KEYS" => "array of strings",
        "BOOL" => "boolean",
        "INT" | "FLOAT" => "numeric",
        "STRING" | "KEY" | "SELECT" | "IMAGE" | "AUDIO" | "VIDEO" => "string",
        "FUNCTION" => "function",
        "OBJECT" | "COMPLEX" | "TIMELINE" => "object",
        other => other,
    };
    mapped.to_string()
}

/// Turn a mapped type name into its `array of ...` form.
pub fn pluralize_type(type_name: &str) -> String {
    if type_name.starts_with("array of ") {
        return type_name.to_string();
    }
    let plural = match type_name {
        "numeric" => "numbers".to_string(),
        "" => "values".to_string(),
        other if other.ends_with('s') => other.to_string(),
        other => format!("{other}s"),
    };
    format!("array of {plural}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_mapping() {
        assert_eq!(map_parameter_type("HTML_STRING"), "HTML string");
        assert_eq!(map_parameter_type("KEYS"), "array of strings");
        assert_eq!(map_parameter_type("BOOL"), "boolean");
        assert_eq!(map_parameter_type("INT"), "numeric");
        assert_eq!(map_parameter_type("SomethingElse"), "SomethingElse");
    }

    #[test]
    fn pluralization() {
        assert_eq!(pluralize_type("string"), "array of strings");
        assert_eq!(pluralize_type("numeric"), "array of numbers");
        assert_eq!(pluralize_type("HTML string"), "array of HTML strings");
        assert_eq!(pluralize_type("array of strings"), "array of strings");
    }

    #[test]
    fn resolve_plugin_layout() {
        let mut config = AppConfig::default();
        config.project.root = PathBuf::from("/repo");
        let plugin = PluginRef::resolve(&config, "html-keyboard-response").unwrap();
        assert_eq!(
            plugin.dir,
            PathBuf::from("/repo/packages/plugin-html-keyboard-response")
        );
        assert_eq!(
            plugin.entry,
            PathBuf::from("/repo/packages/plugin-html-keyboard-response/src/index.ts")
        );
        assert!(plugin.manifest_path().ends_with("package.json"));
        assert_eq!(plugin.package, "@jspsych/plugin-html-keyboard-response");
    }

    #[test]
    fn package_name_follows_configured_scope() {
        let mut config = AppConfig::default();
        config.project.npm_scope = "@my-lab/".into();
        let plugin = PluginRef::resolve(&config, "survey").unwrap();
        assert_eq!(plugin.package, "@my-lab/plugin-survey");

        let unnamed = PackageManifest::default();
        assert_eq!(unnamed.package_name(&plugin.package), "@my-lab/plugin-survey");
    }

    #[test]
    fn resolve_rejects_path_like_names() {
        let config = AppConfig::default();
        assert!(PluginRef::resolve(&config, "../etc").is_err());
        assert!(PluginRef::resolve(&config, "").is_err());
    }

    #[test]
    fn manifest_fields() {
        let manifest: PackageManifest = serde_json::from_str(
            r#"{"name": "@jspsych/plugin-cloze", "version": "2.0.0", "author": "Philipp Sprengholz <p@example.com>"}"#,
        )
        .unwrap();
        assert_eq!(manifest.package_name("fallback"), "@jspsych/plugin-cloze");
        assert_eq!(manifest.require_version().unwrap(), "2.0.0");
        assert_eq!(manifest.author_name().as_deref(), Some("Philipp Sprengholz"));
    }

    #[test]
    fn manifest_missing_version_is_lookup_error() {
        let manifest: PackageManifest = serde_json::from_str(r#"{"name": "x"}"#).unwrap();
        let err = manifest.require_version().unwrap_err();
        assert!(matches!(err, PluginDocError::Lookup { .. }));
    }

    #[test]
    fn author_object_form() {
        let manifest: PackageManifest =
            serde_json::from_str(r#"{"author": {"name": "Josh de Leeuw"}}"#).unwrap();
        assert_eq!(manifest.author_name().as_deref(), Some("Josh de Leeuw"));
    }
}
