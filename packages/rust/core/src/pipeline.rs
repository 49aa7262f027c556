//! Batch runs: plugin listing, page generation, redirect stubs.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, instrument};

use plugindoc_redirects::{RedirectReport, RedirectSettings, plan_redirects, write_redirects};
use plugindoc_markdown::DemoFile;
use plugindoc_shared::{AppConfig, PluginDocError, Result};

use crate::context::DocsContext;

/// Progress callback for batch runs.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase with the number of items it covers.
    fn phase(&self, name: &str, total: usize);
    /// Called after each item of the current phase.
    fn item_done(&self, item: &str, current: usize, total: usize);
    /// Called once the run has finished.
    fn done(&self, summary: &str);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str, _total: usize) {}
    fn item_done(&self, _item: &str, _current: usize, _total: usize) {}
    fn done(&self, _summary: &str) {}
}

// ---------------------------------------------------------------------------
// Plugin listing
// ---------------------------------------------------------------------------

/// Short names of every plugin package, sorted.
///
/// A package is a directory below `packages_dir` whose name starts with the
/// plugin prefix and that contains a `package.json`.
pub fn list_plugins(config: &AppConfig) -> Result<Vec<String>> {
    let packages = config.packages_dir();
    let entries = std::fs::read_dir(&packages).map_err(|e| PluginDocError::io(&packages, e))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PluginDocError::io(&packages, e))?;
        let path = entry.path();
        if !path.is_dir() || !path.join("package.json").is_file() {
            continue;
        }
        let file_name = entry.file_name();
        let Some(dir_name) = file_name.to_str() else {
            continue;
        };
        match dir_name.strip_prefix(&config.project.plugin_prefix) {
            Some(name) if !name.is_empty() => names.push(name.to_string()),
            _ => {}
        }
    }

    names.sort();
    Ok(names)
}

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

/// Result of a page generation run.
#[derive(Debug)]
pub struct PagesResult {
    pub written: Vec<PathBuf>,
    pub demos: Vec<PathBuf>,
    pub elapsed: std::time::Duration,
}

fn create_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| PluginDocError::io(dir, e))
}

/// Write `<out_dir>/<name>.md` for every plugin in `names`, one after the
/// other, and each page's demos to `demos_dir` when one is given. Stops at
/// the first failure.
#[instrument(skip_all, fields(count = names.len(), out = %out_dir.display()))]
pub async fn generate_pages(
    ctx: &DocsContext,
    names: &[String],
    out_dir: &Path,
    demos_dir: Option<&Path>,
    progress: &dyn ProgressReporter,
) -> Result<PagesResult> {
    let start = Instant::now();
    create_dir(out_dir)?;
    if let Some(dir) = demos_dir {
        create_dir(dir)?;
    }

    progress.phase("Generating plugin pages", names.len());
    let mut written = Vec::with_capacity(names.len());
    let mut demos = Vec::new();
    for (i, name) in names.iter().enumerate() {
        let page = ctx.plugin_page(name).await?;
        let path = out_dir.join(format!("{name}.md"));
        std::fs::write(&path, &page.markdown).map_err(|e| PluginDocError::io(&path, e))?;
        if let Some(dir) = demos_dir {
            demos.extend(write_demos(dir, &page.demos)?);
        }
        progress.item_done(name, i + 1, names.len());
        written.push(path);
    }

    let result = PagesResult {
        written,
        demos,
        elapsed: start.elapsed(),
    };
    info!(
        pages = result.written.len(),
        demos = result.demos.len(),
        elapsed_ms = result.elapsed.as_millis() as u64,
        "pages generated"
    );
    progress.done(&format!(
        "{} pages written, {} demos",
        result.written.len(),
        result.demos.len()
    ));
    Ok(result)
}

/// Write each demo page into `dir`. Returns the files written.
pub fn write_demos(dir: &Path, demos: &[DemoFile]) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(demos.len());
    for demo in demos {
        let path = dir.join(&demo.file_name);
        std::fs::write(&path, &demo.html).map_err(|e| PluginDocError::io(&path, e))?;
        debug!(path = %path.display(), "wrote demo");
        written.push(path);
    }
    Ok(written)
}

// ---------------------------------------------------------------------------
// Redirects
// ---------------------------------------------------------------------------

/// Plan and write every redirect stub described by `settings`.
#[instrument(skip_all)]
pub fn generate_redirects(
    settings: &RedirectSettings,
    progress: &dyn ProgressReporter,
) -> Result<RedirectReport> {
    let plan = plan_redirects(settings)?;

    progress.phase("Writing redirects", plan.len());
    let report = write_redirects(settings, &plan, |current, redirect| {
        progress.item_done(&redirect.source.to_string_lossy(), current, plan.len());
    })?;

    progress.done(&format!(
        "{} redirects written ({} renamed, {} fallback)",
        report.written, report.renamed, report.fallback
    ));
    Ok(report)
}
