//! Everything a macro needs to render a plugin fragment.

use std::path::Path;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, instrument};

use plugindoc_badges::{Badge, BadgeClient, plugin_badges};
use plugindoc_markdown::{
    DemoFile, ExampleFile, PluginPage, data_section, examples_and_demos, parameters_section,
    plugin_author, render_badges, render_install, render_version_line, summary_section,
};
use plugindoc_shared::{AppConfig, PackageManifest, PluginDocError, PluginRef, Result};
use plugindoc_storage::Cache;
use plugindoc_typedoc::{Extractor, TypedocExtractor, cached_description};

/// A rendered plugin page and the demo pages its examples embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub markdown: String,
    pub demos: Vec<DemoFile>,
}

/// Project configuration plus the cache, extractor and badge client.
pub struct DocsContext {
    config: AppConfig,
    cache: Cache,
    extractor: Box<dyn Extractor>,
    badges: BadgeClient,
}

impl DocsContext {
    /// Open the on-disk cache and build the TypeDoc extractor and badge client
    /// from `config`.
    pub async fn open(config: AppConfig) -> Result<Self> {
        let cache_path = config.resolve(&config.cache.path);
        if let Some(parent) = cache_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PluginDocError::io(parent, e))?;
        }
        let cache = Cache::open(&cache_path).await?;
        let extractor = Box::new(TypedocExtractor::from_config(&config)?);
        let badges = BadgeClient::new(&config.badges)?;
        Ok(Self::from_parts(config, cache, extractor, badges))
    }

    /// Assemble a context from already-built parts.
    pub fn from_parts(
        config: AppConfig,
        cache: Cache,
        extractor: Box<dyn Extractor>,
        badges: BadgeClient,
    ) -> Self {
        Self {
            config,
            cache,
            extractor,
            badges,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    fn description_ttl(&self) -> Duration {
        Duration::from_secs(self.config.cache.description_ttl_secs)
    }

    fn badge_ttl(&self) -> Duration {
        Duration::from_secs(self.config.cache.badge_ttl_secs)
    }

    pub fn plugin(&self, name: &str) -> Result<PluginRef> {
        PluginRef::resolve(&self.config, name)
    }

    /// The extractor tree for a plugin, through the cache.
    pub async fn description(&self, plugin: &PluginRef) -> Result<Value> {
        cached_description(
            self.extractor.as_ref(),
            &self.cache,
            plugin,
            self.description_ttl(),
        )
        .await
    }

    fn manifest(&self, plugin: &PluginRef) -> Result<PackageManifest> {
        PackageManifest::load(&plugin.manifest_path())
    }

    /// Version of the jsPsych library package, when its manifest is readable.
    fn library_version(&self) -> Option<String> {
        let path = self
            .config
            .packages_dir()
            .join(&self.config.project.core_package)
            .join("package.json");
        PackageManifest::load(&path).ok()?.version
    }

    /// `<examples_dir>/jspsych-<name>.html`, then the package's own
    /// `examples/*.html` by file name.
    fn example_files(&self, plugin: &PluginRef) -> Result<Vec<ExampleFile>> {
        let mut files = Vec::new();

        let shared = self
            .config
            .examples_dir()
            .join(format!("jspsych-{}.html", plugin.name));
        if shared.is_file() {
            files.push(read_example(&shared)?);
        }

        let own = plugin.dir.join("examples");
        if own.is_dir() {
            let entries = std::fs::read_dir(&own).map_err(|e| PluginDocError::io(&own, e))?;
            let mut paths = Vec::new();
            for entry in entries {
                let path = entry.map_err(|e| PluginDocError::io(&own, e))?.path();
                if path.is_file() && path.extension().is_some_and(|ext| ext == "html") {
                    paths.push(path);
                }
            }
            paths.sort();
            for path in paths {
                files.push(read_example(&path)?);
            }
        }

        debug!(count = files.len(), "example files");
        Ok(files)
    }

    // -----------------------------------------------------------------------
    // Fragments
    // -----------------------------------------------------------------------

    /// `## Parameters` table.
    #[instrument(skip(self))]
    pub async fn plugin_parameters(&self, name: &str) -> Result<String> {
        let plugin = self.plugin(name)?;
        parameters_section(&self.description(&plugin).await?)
    }

    /// `## Data Generated` table.
    #[instrument(skip(self))]
    pub async fn plugin_data(&self, name: &str) -> Result<String> {
        let plugin = self.plugin(name)?;
        data_section(&self.description(&plugin).await?)
    }

    /// Summary paragraph from the plugin class comment.
    #[instrument(skip(self))]
    pub async fn plugin_summary(&self, name: &str) -> Result<String> {
        let plugin = self.plugin(name)?;
        summary_section(&self.description(&plugin).await?)
    }

    /// Version and author badges.
    ///
    /// The author comes from `package.json`, or from the class's `@author`
    /// tag when the manifest has none.
    #[instrument(skip(self))]
    pub async fn plugin_meta(&self, name: &str) -> Result<String> {
        let plugin = self.plugin(name)?;
        let manifest = self.manifest(&plugin)?;
        let mut badges = plugin_badges(&manifest)?;

        if manifest.author_name().is_none() {
            let description = self.description(&plugin).await?;
            if let Some(author) = plugin_author(&description)? {
                badges.push(Badge::new("Author", author));
            }
        }

        let mut svgs = Vec::with_capacity(badges.len());
        for badge in &badges {
            svgs.push(
                self.badges
                    .cached_svg(&self.cache, badge, self.badge_ttl())
                    .await?,
            );
        }
        debug!(count = svgs.len(), "rendered badges");
        Ok(render_badges(&svgs))
    }

    /// `## Install` section.
    ///
    /// The package name falls back to the configured npm scope when the
    /// manifest has none; a missing version is a lookup error.
    #[instrument(skip(self))]
    pub async fn plugin_install(&self, name: &str) -> Result<String> {
        let plugin = self.plugin(name)?;
        let manifest = self.manifest(&plugin)?;
        Ok(render_install(
            manifest.package_name(&plugin.package),
            manifest.require_version()?,
            &plugin.name,
        ))
    }

    /// `Current version: ...` line with the changelog link.
    #[instrument(skip(self))]
    pub fn plugin_version(&self, name: &str) -> Result<String> {
        let plugin = self.plugin(name)?;
        let manifest = self.manifest(&plugin)?;
        let package_dir = plugin
            .dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}{name}", self.config.project.plugin_prefix));
        Ok(render_version_line(&package_dir, manifest.version.as_deref()))
    }

    /// `## Examples` section and the demo pages it links to.
    ///
    /// Empty when the plugin has no example files.
    #[instrument(skip(self))]
    pub fn plugin_examples(&self, name: &str) -> Result<(String, Vec<DemoFile>)> {
        let plugin = self.plugin(name)?;
        let files = self.example_files(&plugin)?;
        if files.is_empty() {
            return Ok((String::new(), Vec::new()));
        }

        let manifest = self.manifest(&plugin)?;
        let library_version = self.library_version();
        Ok(examples_and_demos(
            &files,
            &plugin.name,
            manifest.package_name(&plugin.package),
            library_version.as_deref().unwrap_or("latest"),
            manifest.version.as_deref().unwrap_or("latest"),
        ))
    }

    /// A complete standalone page for one plugin, with its demo pages.
    pub async fn plugin_page(&self, name: &str) -> Result<RenderedPage> {
        let (examples, demos) = self.plugin_examples(name)?;
        let page = PluginPage {
            name: name.to_string(),
            badges: self.plugin_meta(name).await?,
            version: self.plugin_version(name)?,
            summary: self.plugin_summary(name).await?,
            parameters: self.plugin_parameters(name).await?,
            data: self.plugin_data(name).await?,
            install: self.plugin_install(name).await?,
            examples,
        };
        Ok(RenderedPage {
            markdown: page.render(),
            demos,
        })
    }
}

fn read_example(path: &Path) -> Result<ExampleFile> {
    let content = std::fs::read_to_string(path).map_err(|e| PluginDocError::io(path, e))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(ExampleFile { name, content })
}


#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::testing::{context, write_examples, write_project};

    #[tokio::test]
    async fn fragments_share_one_extraction() {
        let dir = tempfile::tempdir().unwrap();
        write_project(dir.path());
        let (ctx, calls) = context(dir.path(), "http://127.0.0.1:9/static/v1").await;

        let params = ctx.plugin_parameters("cloze").await.unwrap();
        assert!(params.contains("text<font color='red'>*</font> | HTML string |  | The cloze text. \n"));
        assert_eq!(ctx.plugin_summary("cloze").await.unwrap(), "Fill in the blanks.\n");
        assert!(ctx.plugin_data("cloze").await.unwrap().contains("does not collect"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn install_reads_manifest() {
        let dir = tempfile::tempdir().unwrap();
        write_project(dir.path());
        let (ctx, calls) = context(dir.path(), "http://127.0.0.1:9/static/v1").await;

        let md = ctx.plugin_install("cloze").await.unwrap();
        assert!(md.contains("https://unpkg.com/@jspsych/plugin-cloze@2.1.0"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn install_names_unnamed_package_from_scope() {
        let dir = tempfile::tempdir().unwrap();
        write_project(dir.path());
        std::fs::write(
            dir.path().join("packages/plugin-cloze/package.json"),
            r#"{"version": "2.1.0"}"#,
        )
        .unwrap();
        let (mut ctx, _) = context(dir.path(), "http://127.0.0.1:9/static/v1").await;
        ctx.config.project.npm_scope = "@my-lab".into();

        let md = ctx.plugin_install("cloze").await.unwrap();
        assert!(md.contains("https://unpkg.com/@my-lab/plugin-cloze@2.1.0"));
        assert!(md.contains("npm install @my-lab/plugin-cloze\n"));
    }

    #[tokio::test]
    async fn version_line_and_examples_with_demos() {
        let dir = tempfile::tempdir().unwrap();
        write_project(dir.path());
        write_examples(dir.path());
        let (ctx, _) = context(dir.path(), "http://127.0.0.1:9/static/v1").await;

        assert!(ctx.plugin_version("cloze").unwrap().starts_with(
            "Current version: 2.1.0. [See version history](https://github.com/jspsych/jsPsych/blob/main/packages/plugin-cloze/CHANGELOG.md)."
        ));

        let (md, demos) = ctx.plugin_examples("cloze").unwrap();
        assert!(md.starts_with("\n## Examples\n\n???+ example \"Fill in\"\n"));
        assert!(md.contains("???+ example \"Example 1\""));
        let names: Vec<&str> = demos.iter().map(|d| d.file_name.as_str()).collect();
        assert_eq!(names, vec!["jspsych-cloze-demo1.html", "jspsych-cloze-demo2.html"]);
        assert!(demos[0].html.contains("https://unpkg.com/jspsych@8.0.3\""));
        assert!(demos[1].html.contains("https://unpkg.com/@jspsych/plugin-cloze@2.1.0\""));
    }

    #[tokio::test]
    async fn no_example_files_no_section() {
        let dir = tempfile::tempdir().unwrap();
        write_project(dir.path());
        let (ctx, _) = context(dir.path(), "http://127.0.0.1:9/static/v1").await;
        let (md, demos) = ctx.plugin_examples("cloze").unwrap();
        assert!(md.is_empty());
        assert!(demos.is_empty());
    }

    #[tokio::test]
    async fn missing_or_invalid_plugin_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, _) = context(dir.path(), "http://127.0.0.1:9/static/v1").await;
        assert!(ctx.plugin_install("nope").await.is_err());
        assert!(ctx.plugin_parameters("nope").await.is_err());
        assert!(ctx.plugin_parameters("../escape").await.is_err());
    }

    #[tokio::test]
    async fn meta_renders_version_and_author_badges() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("label", "Current version"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<svg>version</svg>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("label", "Author"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<svg>author</svg>"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        write_project(dir.path());
        let (ctx, calls) = context(dir.path(), &format!("{}/static/v1", server.uri())).await;

        let html = ctx.plugin_meta("cloze").await.unwrap();
        assert_eq!(
            html,
            "<span class=\"plugin-meta\"><svg>version</svg> <svg>author</svg></span>\n"
        );
        // Manifest has an author, so no extraction was needed.
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
