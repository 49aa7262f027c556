//! Meta-refresh stubs from an old documentation tree to a renamed new one.
//!
//! Every HTML page of the old tree gets a stub at the same relative path in
//! the output directory. The stub forwards to the renamed page in the new tree
//! when it exists there, otherwise back to the page in the old tree.
//!
//! All paths in a [`Redirect`] are relative to the docs root.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, instrument};
use walkdir::WalkDir;

use plugindoc_shared::{PluginDocError, RedirectsConfig, Result};

/// HTML document written for every redirected page. `{path}` is the target
/// URL relative to the stub's directory.
pub const REDIRECT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Redirecting</title>
    <meta http-equiv="refresh" content="0; url={path}" />
</head>
<body>Redirecting to <a href="{path}">{path}</a>...</body>
</html>
"#;

static PACKAGE_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"jspsych-(ext-)?").expect("package prefix regex"));

/// Render the stub document for a target URL.
pub fn redirect_document(target: &str) -> String {
    REDIRECT_TEMPLATE.replace("{path}", target)
}

// ---------------------------------------------------------------------------
// Path rules
// ---------------------------------------------------------------------------

fn strip_package_prefix(segment: &str) -> String {
    let mut current = segment.to_string();
    loop {
        let next = PACKAGE_PREFIX_RE.replace_all(&current, "").into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}

/// The new-tree location of an old-tree page.
///
/// Plugin and extension pages lost their `jspsych-` / `jspsych-ext-` prefix;
/// `core_library` became `reference`, and its `jspsych-core` page became
/// `jspsych`. Other paths are unchanged. Applying the rule twice gives the
/// same result as applying it once.
pub fn rewrite_moved_path(path: &Path) -> PathBuf {
    let mut parts: Vec<String> = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();

    match parts.first().map(String::as_str) {
        Some("plugins" | "extensions") => {
            if let Some(second) = parts.get_mut(1) {
                *second = strip_package_prefix(second);
            }
        }
        Some("core_library") => {
            parts[0] = "reference".to_string();
            if let Some(second) = parts.get_mut(1).filter(|s| s.as_str() == "jspsych-core") {
                *second = "jspsych".to_string();
            }
        }
        _ => return path.to_path_buf(),
    }

    parts.iter().collect()
}

/// Lexical path components, with `.` dropped and `..` applied.
///
/// A prefix or root component is kept as its own leading part, so absolute
/// paths only share a base with paths on the same root.
fn normalized(path: &Path) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut anchored = 0;
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {
                out.push(component.as_os_str().to_string_lossy().into_owned());
                anchored = out.len();
            }
            Component::Normal(part) => out.push(part.to_string_lossy().into_owned()),
            Component::ParentDir => {
                if out.len() > anchored {
                    out.pop();
                }
            }
            Component::CurDir => {}
        }
    }
    out
}

/// URL of `target` as seen from the directory `from_dir`.
///
/// Both paths are absolute, or both are relative to the same base. The
/// result uses `/` separators and is `.` when the two coincide.
pub fn relative_to(target: &Path, from_dir: &Path) -> String {
    let target = normalized(target);
    let from = normalized(from_dir);

    let common = target
        .iter()
        .zip(from.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = std::iter::repeat_n("..", from.len() - common).collect();
    parts.extend(target[common..].iter().map(String::as_str));

    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

/// Every `*.html` file below `root`, relative to it.
///
/// A missing root yields an empty set.
pub fn relative_html_files(root: &Path) -> Result<BTreeSet<PathBuf>> {
    let mut files = BTreeSet::new();
    if !root.exists() {
        debug!(root = %root.display(), "docs tree does not exist");
        return Ok(files);
    }

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            PluginDocError::io(path, e.into())
        })?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "html") {
            continue;
        }
        if let Ok(relative) = path.strip_prefix(root) {
            files.insert(relative.to_path_buf());
        }
    }

    Ok(files)
}

/// Where a stub points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectKind {
    /// Same relative path in the new tree.
    Unchanged,
    /// Renamed page in the new tree.
    Renamed,
    /// No counterpart in the new tree; back to the old page.
    Fallback,
}

/// One stub to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    /// Old-tree relative path; also the stub's path below the output directory.
    pub source: PathBuf,
    /// Target page, relative to the docs root.
    pub target: PathBuf,
    pub kind: RedirectKind,
}

/// Inputs of a redirect run, relative to `root`.
#[derive(Debug, Clone)]
pub struct RedirectSettings {
    pub root: PathBuf,
    pub old_dir: PathBuf,
    pub new_dir: PathBuf,
    pub output_dir: PathBuf,
    pub exclude: Vec<String>,
}

impl RedirectSettings {
    pub fn from_config(root: &Path, config: &RedirectsConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            old_dir: config.old_dir.clone(),
            new_dir: config.new_dir.clone(),
            output_dir: config.output_dir.clone(),
            exclude: config.exclude.clone(),
        }
    }
}

fn is_excluded(file: &Path, exclude: &[String]) -> bool {
    let key = file.to_string_lossy().replace('\\', "/");
    exclude.iter().any(|e| *e == key)
}

/// Compute the stub for every non-excluded page of the old tree, sorted by
/// source path.
#[instrument(skip_all, fields(old = %settings.old_dir.display(), new = %settings.new_dir.display()))]
pub fn plan_redirects(settings: &RedirectSettings) -> Result<Vec<Redirect>> {
    let old_files = relative_html_files(&settings.root.join(&settings.old_dir))?;
    let new_files = relative_html_files(&settings.root.join(&settings.new_dir))?;
    info!(old = old_files.len(), new = new_files.len(), "scanned docs trees");

    let plan = old_files
        .into_iter()
        .filter(|file| !is_excluded(file, &settings.exclude))
        .map(|file| {
            let rewritten = rewrite_moved_path(&file);
            let (target, kind) = if new_files.contains(&rewritten) {
                let kind = if rewritten == file {
                    RedirectKind::Unchanged
                } else {
                    RedirectKind::Renamed
                };
                (settings.new_dir.join(&rewritten), kind)
            } else {
                (settings.old_dir.join(&file), RedirectKind::Fallback)
            };
            Redirect {
                source: file,
                target,
                kind,
            }
        })
        .collect();

    Ok(plan)
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Counts from a redirect run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RedirectReport {
    pub written: usize,
    pub renamed: usize,
    pub fallback: usize,
}

impl RedirectReport {
    pub fn record(&mut self, redirect: &Redirect) {
        self.written += 1;
        match redirect.kind {
            RedirectKind::Renamed => self.renamed += 1,
            RedirectKind::Fallback => self.fallback += 1,
            RedirectKind::Unchanged => {}
        }
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|e| PluginDocError::io(path, e))
}

/// Write one stub, creating parent directories. Returns the file written.
///
/// The URL is computed between the absolute locations of the stub and the
/// target, so old, new and output directories may each be absolute or
/// climb out of the root.
pub fn write_redirect(settings: &RedirectSettings, redirect: &Redirect) -> Result<PathBuf> {
    let stub = settings
        .root
        .join(&settings.output_dir)
        .join(&redirect.source);
    let stub_abs = absolute(&stub)?;
    let target_abs = absolute(&settings.root.join(&redirect.target))?;
    let stub_dir = stub_abs.parent().unwrap_or(Path::new("/"));
    let url = relative_to(&target_abs, stub_dir);

    if let Some(parent) = stub.parent() {
        std::fs::create_dir_all(parent).map_err(|e| PluginDocError::io(parent, e))?;
    }
    std::fs::write(&stub, redirect_document(&url)).map_err(|e| PluginDocError::io(&stub, e))?;

    debug!(stub = %stub.display(), %url, "wrote redirect");
    Ok(stub)
}

/// Write every stub of `plan`, calling `on_written` with the 1-based index
/// after each one. Stops at the first failure.
pub fn write_redirects(
    settings: &RedirectSettings,
    plan: &[Redirect],
    mut on_written: impl FnMut(usize, &Redirect),
) -> Result<RedirectReport> {
    let mut report = RedirectReport::default();
    for (i, redirect) in plan.iter().enumerate() {
        write_redirect(settings, redirect)?;
        report.record(redirect);
        on_written(i + 1, redirect);
    }
    info!(
        written = report.written,
        renamed = report.renamed,
        fallback = report.fallback,
        "redirects written"
    );
    Ok(report)
}
