//! Application configuration for plugindoc.
//!
//! Lookup order: an explicit path, then `./plugindoc.toml` in the working
//! directory, then `~/.plugindoc/plugindoc.toml`, then built-in defaults.
//! CLI flags override config file values.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PluginDocError, Result};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "plugindoc.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".plugindoc";

// ---------------------------------------------------------------------------
// Config structs (matching plugindoc.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Project layout.
    #[serde(default)]
    pub project: ProjectConfig,

    /// External extractor invocation.
    #[serde(default)]
    pub typedoc: TypedocConfig,

    /// On-disk cache.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Badge image service.
    #[serde(default)]
    pub badges: BadgesConfig,

    /// Redirect generation.
    #[serde(default)]
    pub redirects: RedirectsConfig,
}

/// `[project]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Repository root; every other relative path is resolved against it.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Directory holding the plugin packages, relative to `root`.
    #[serde(default = "default_packages_dir")]
    pub packages_dir: String,

    /// Package directory prefix (`plugin-html-keyboard-response`).
    #[serde(default = "default_plugin_prefix")]
    pub plugin_prefix: String,

    /// npm scope the plugins are published under; names the package when
    /// its `package.json` has no `name`.
    #[serde(default = "default_npm_scope")]
    pub npm_scope: String,

    /// Shared example pages (`jspsych-<plugin>.html`), relative to `root`.
    #[serde(default = "default_examples_dir")]
    pub examples_dir: String,

    /// Package directory of the jsPsych library, below `packages_dir`. Its
    /// version pins the library build the demo pages load.
    #[serde(default = "default_core_package")]
    pub core_package: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            packages_dir: default_packages_dir(),
            plugin_prefix: default_plugin_prefix(),
            npm_scope: default_npm_scope(),
            examples_dir: default_examples_dir(),
            core_package: default_core_package(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}
fn default_packages_dir() -> String {
    "packages".into()
}
fn default_plugin_prefix() -> String {
    "plugin-".into()
}
fn default_npm_scope() -> String {
    "@jspsych".into()
}
fn default_examples_dir() -> String {
    "examples".into()
}
fn default_core_package() -> String {
    "jspsych".into()
}

/// `[typedoc]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedocConfig {
    /// Extractor executable, relative to the project root or on `PATH`.
    #[serde(default = "default_typedoc_command")]
    pub command: String,

    /// tsconfig file name inside each plugin directory.
    #[serde(default = "default_tsconfig")]
    pub tsconfig: String,

    /// Entry source file inside each plugin directory.
    #[serde(default = "default_entry")]
    pub entry: String,

    /// Value passed to `--sort`.
    #[serde(default = "default_sort")]
    pub sort: String,
}

impl Default for TypedocConfig {
    fn default() -> Self {
        Self {
            command: default_typedoc_command(),
            tsconfig: default_tsconfig(),
            entry: default_entry(),
            sort: default_sort(),
        }
    }
}

fn default_typedoc_command() -> String {
    "node_modules/.bin/typedoc".into()
}
fn default_tsconfig() -> String {
    "tsconfig.json".into()
}
fn default_entry() -> String {
    "src/index.ts".into()
}
fn default_sort() -> String {
    "source-order".into()
}

/// `[cache]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache database path, relative to the project root.
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,

    /// Lifetime of extracted plugin descriptions, in seconds.
    #[serde(default = "default_description_ttl")]
    pub description_ttl_secs: u64,

    /// Lifetime of fetched badge images, in seconds.
    #[serde(default = "default_badge_ttl")]
    pub badge_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
            description_ttl_secs: default_description_ttl(),
            badge_ttl_secs: default_badge_ttl(),
        }
    }
}

fn default_cache_path() -> PathBuf {
    PathBuf::from(".plugindoc/cache.db")
}
fn default_description_ttl() -> u64 {
    60 * 60 * 24 * 30
}
fn default_badge_ttl() -> u64 {
    60 * 60 * 24
}

/// `[badges]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BadgesConfig {
    /// Static badge endpoint.
    #[serde(default = "default_badge_endpoint")]
    pub endpoint: String,

    /// Badge color (hex without `#`, or a named color).
    #[serde(default = "default_badge_color")]
    pub color: String,

    /// Badge style.
    #[serde(default = "default_badge_style")]
    pub style: String,

    /// Request timeout in seconds.
    #[serde(default = "default_badge_timeout")]
    pub timeout_secs: u64,
}

impl Default for BadgesConfig {
    fn default() -> Self {
        Self {
            endpoint: default_badge_endpoint(),
            color: default_badge_color(),
            style: default_badge_style(),
            timeout_secs: default_badge_timeout(),
        }
    }
}

fn default_badge_endpoint() -> String {
    "https://img.shields.io/static/v1".into()
}
fn default_badge_color() -> String {
    "4cae4f".into()
}
fn default_badge_style() -> String {
    "flat-square".into()
}
fn default_badge_timeout() -> u64 {
    10
}

/// `[redirects]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectsConfig {
    /// Previous documentation tree, relative to the project root.
    #[serde(default = "default_old_dir")]
    pub old_dir: PathBuf,

    /// Current documentation tree, relative to the project root.
    #[serde(default = "default_new_dir")]
    pub new_dir: PathBuf,

    /// Where the stubs are written; stub paths mirror the old tree.
    #[serde(default = "default_root")]
    pub output_dir: PathBuf,

    /// Old-tree files that never get a stub.
    #[serde(default = "default_excluded")]
    pub exclude: Vec<String>,
}

impl Default for RedirectsConfig {
    fn default() -> Self {
        Self {
            old_dir: default_old_dir(),
            new_dir: default_new_dir(),
            output_dir: default_root(),
            exclude: default_excluded(),
        }
    }
}

fn default_old_dir() -> PathBuf {
    PathBuf::from("6.3")
}
fn default_new_dir() -> PathBuf {
    PathBuf::from("7.0")
}
fn default_excluded() -> Vec<String> {
    vec!["index.html".into(), "404.html".into()]
}

impl AppConfig {
    /// Resolve a project-relative path against `project.root`.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project.root.join(path)
        }
    }

    /// Absolute (or root-relative) location of the packages directory.
    pub fn packages_dir(&self) -> PathBuf {
        self.resolve(&self.project.packages_dir)
    }

    pub fn examples_dir(&self) -> PathBuf {
        self.resolve(&self.project.examples_dir)
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the user config directory (`~/.plugindoc/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PluginDocError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the user config file (`~/.plugindoc/plugindoc.toml`).
pub fn home_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config.
///
/// An explicit path must exist. Without one, the project-local file is tried
/// first, then the home file; defaults are used when neither exists.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        return load_config_from(path);
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return load_config_from(&local);
    }

    match home_config_path() {
        Ok(path) if path.exists() => load_config_from(&path),
        _ => {
            tracing::debug!("no config file found, using defaults");
            Ok(AppConfig::default())
        }
    }
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| PluginDocError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        PluginDocError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Write a default config file into `dir`. Returns the path to the created file.
pub fn init_config(dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| PluginDocError::io(dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    if path.exists() {
        return Err(PluginDocError::config(format!(
            "{} already exists",
            path.display()
        )));
    }

    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| PluginDocError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| PluginDocError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("node_modules/.bin/typedoc"));
        assert!(toml_str.contains("img.shields.io"));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[project]
root = "/work/jspsych"

[redirects]
old_dir = "6.3"
new_dir = "7.1"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.project.packages_dir, "packages");
        assert_eq!(config.redirects.new_dir, PathBuf::from("7.1"));
        assert_eq!(config.redirects.exclude, vec!["index.html", "404.html"]);
        assert_eq!(config.typedoc.sort, "source-order");
        assert_eq!(config.cache.badge_ttl_secs, 86_400);
    }

    #[test]
    fn resolve_against_root() {
        let mut config = AppConfig::default();
        config.project.root = PathBuf::from("/work/jspsych");
        assert_eq!(
            config.packages_dir(),
            PathBuf::from("/work/jspsych/packages")
        );
        assert_eq!(config.resolve("/abs/cache.db"), PathBuf::from("/abs/cache.db"));
        assert_eq!(config.examples_dir(), PathBuf::from("/work/jspsych/examples"));
    }

    #[test]
    fn init_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = init_config(dir.path()).expect("init");
        let loaded = load_config(Some(&path)).expect("load");
        assert_eq!(loaded.project.plugin_prefix, "plugin-");

        let again = init_config(dir.path());
        assert!(again.is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let result = load_config(Some(Path::new("/definitely/not/here/plugindoc.toml")));
        assert!(matches!(result, Err(PluginDocError::Io { .. })));
    }
}
