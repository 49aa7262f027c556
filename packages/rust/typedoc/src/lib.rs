//! Plugin metadata extraction through the TypeDoc CLI.
//!
//! The extractor is an external program: it is handed a tsconfig and the
//! plugin's entry file, writes a JSON reflection tree to a file we give it,
//! and that tree is then read with [`query`] path expressions.
//!
//! Results are memoized in the on-disk [`Cache`] keyed by a hash of the entry
//! file, so an unchanged plugin never re-runs the extractor.

pub mod jsdoc;
pub mod query;

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use plugindoc_shared::{AppConfig, PluginDocError, PluginRef, Result};
use plugindoc_storage::Cache;

pub use jsdoc::jsdoc_to_markdown;
pub use query::{JsonPath, value_by_path, values_by_path};

/// Cache operation name for extracted descriptions.
pub const DESCRIPTION_OPERATION: &str = "plugin_description";

/// Hex SHA-256 of a file's contents.
pub fn hash_file(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| PluginDocError::io(path, e))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

// ---------------------------------------------------------------------------
// Extractor seam
// ---------------------------------------------------------------------------

/// Produces the documentation tree for a plugin.
pub trait Extractor: Send + Sync {
    /// Run extraction for `plugin` and return the parsed JSON tree.
    fn extract(&self, plugin: &PluginRef) -> Result<Value>;
}

/// Runs the TypeDoc command line tool.
#[derive(Debug, Clone)]
pub struct TypedocExtractor {
    /// Program to run, plus any leading arguments (`npx typedoc`).
    program: PathBuf,
    leading_args: Vec<String>,
    sort: String,
}

impl TypedocExtractor {
    /// Build from the `[typedoc]` config section.
    ///
    /// `command` is split on whitespace; a relative program path containing a
    /// separator is resolved against the project root, a bare name is looked
    /// up on `PATH`. The child inherits our working directory, which is what
    /// every path handed to it is relative to.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let mut words = config.typedoc.command.split_whitespace();
        let program = words
            .next()
            .ok_or_else(|| PluginDocError::config("[typedoc] command is empty"))?;

        let program = if program.contains(std::path::MAIN_SEPARATOR) || program.contains('/') {
            config.resolve(program)
        } else {
            PathBuf::from(program)
        };

        Ok(Self {
            program,
            leading_args: words.map(str::to_string).collect(),
            sort: config.typedoc.sort.clone(),
        })
    }
}

impl Extractor for TypedocExtractor {
    #[instrument(skip_all, fields(plugin = %plugin.name))]
    fn extract(&self, plugin: &PluginRef) -> Result<Value> {
        info!(dir = %plugin.dir.display(), "collecting parameter infos");

        let json_file = tempfile::Builder::new()
            .prefix("plugindoc-")
            .suffix(".json")
            .tempfile()
            .map_err(|e| PluginDocError::io(std::env::temp_dir(), e))?;

        let output = Command::new(&self.program)
            .args(&self.leading_args)
            .arg("--tsconfig")
            .arg(&plugin.tsconfig)
            .arg("--json")
            .arg(json_file.path())
            .arg("--sort")
            .arg(&self.sort)
            .arg(&plugin.entry)
            .output()
            .map_err(|e| {
                PluginDocError::Extractor(format!(
                    "failed to run `{}`: {e}",
                    self.program.display()
                ))
            })?;

        debug!(
            stdout = %String::from_utf8_lossy(&output.stdout),
            stderr = %String::from_utf8_lossy(&output.stderr),
            "extractor output"
        );
        if !output.status.success() {
            // The JSON file decides; a failed run leaves it empty or partial.
            warn!(status = ?output.status, "extractor exited unsuccessfully");
        }

        let content = std::fs::read_to_string(json_file.path())
            .map_err(|e| PluginDocError::io(json_file.path(), e))?;
        serde_json::from_str(&content).map_err(|e| PluginDocError::json(json_file.path(), e))
    }
}

// ---------------------------------------------------------------------------
// Cached extraction
// ---------------------------------------------------------------------------

/// Return the description tree for `plugin`, from cache when its entry file
/// is unchanged and the entry has not expired.
#[instrument(skip_all, fields(plugin = %plugin.name))]
pub async fn cached_description(
    extractor: &dyn Extractor,
    cache: &Cache,
    plugin: &PluginRef,
    ttl: Duration,
) -> Result<Value> {
    let hash = hash_file(&plugin.entry)?;
    let subject = plugin.dir.to_string_lossy();

    if let Some(cached) = cache.get(DESCRIPTION_OPERATION, &subject, &hash).await? {
        debug!("description cache hit");
        return serde_json::from_str(&cached).map_err(|e| PluginDocError::json(&plugin.entry, e));
    }

    let description = extractor.extract(plugin)?;
    cache
        .set(
            DESCRIPTION_OPERATION,
            &subject,
            &hash,
            &description.to_string(),
            ttl,
        )
        .await?;

    Ok(description)
}
