//! Expansion of `{{ plugin_xxx('name') }}` macros in Markdown sources.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use plugindoc_shared::Result;

use crate::context::DocsContext;

static MACRO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\(\s*(?:'([^']*)'|"([^"]*)")\s*\)\s*\}\}"#)
        .expect("macro regex")
});

/// Fragments a docs page can embed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Macro {
    Parameters,
    Summary,
    Meta,
    Install,
    Data,
}

impl Macro {
    pub const ALL: [Macro; 5] = [
        Self::Parameters,
        Self::Summary,
        Self::Meta,
        Self::Install,
        Self::Data,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Parameters => "plugin_parameters",
            Self::Summary => "plugin_summary",
            Self::Meta => "plugin_meta",
            Self::Install => "plugin_install",
            Self::Data => "plugin_data",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }

    /// Render this macro for a plugin.
    pub async fn render(self, ctx: &DocsContext, plugin: &str) -> Result<String> {
        match self {
            Self::Parameters => ctx.plugin_parameters(plugin).await,
            Self::Summary => ctx.plugin_summary(plugin).await,
            Self::Meta => ctx.plugin_meta(plugin).await,
            Self::Install => ctx.plugin_install(plugin).await,
            Self::Data => ctx.plugin_data(plugin).await,
        }
    }
}

/// Replace every recognized macro call in `markdown` with its fragment.
///
/// Unknown macro names are left in place. The first rendering error aborts
/// the expansion.
pub async fn expand_macros(ctx: &DocsContext, markdown: &str) -> Result<String> {
    let mut output = String::with_capacity(markdown.len());
    let mut last = 0;

    for caps in MACRO_RE.captures_iter(markdown) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let argument = caps
            .get(2)
            .or_else(|| caps.get(3))
            .map(|m| m.as_str())
            .unwrap_or_default();

        let Some(kind) = Macro::from_name(name.as_str()) else {
            warn!(name = name.as_str(), "unknown macro left in place");
            continue;
        };

        debug!(name = kind.name(), plugin = argument, "expanding macro");
        output.push_str(&markdown[last..whole.start()]);
        output.push_str(&kind.render(ctx, argument).await?);
        last = whole.end();
    }

    output.push_str(&markdown[last..]);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::{context, write_project};

    #[test]
    fn macro_names_round_trip() {
        for m in Macro::ALL {
            assert_eq!(Macro::from_name(m.name()), Some(m));
        }
        assert_eq!(Macro::from_name("plugin_demo"), None);
    }

    #[tokio::test]
    async fn expands_known_and_keeps_unknown() {
        let dir = tempfile::tempdir().unwrap();
        write_project(dir.path());
        let (ctx, _) = context(dir.path(), "http://127.0.0.1:9/static/v1").await;

        let source = "# cloze\n\n{{plugin_summary( \"cloze\" )}}\n{{ plugin_demo('cloze') }}\n{{ plugin_install('cloze') }}";
        let expanded = expand_macros(&ctx, source).await.unwrap();

        assert!(expanded.starts_with("# cloze\n\nFill in the blanks.\n\n{{ plugin_demo('cloze') }}\n## Install"));
        assert!(!expanded.contains("plugin_install"));
    }

    #[tokio::test]
    async fn space_before_parenthesis_still_expands() {
        let dir = tempfile::tempdir().unwrap();
        write_project(dir.path());
        let (ctx, _) = context(dir.path(), "http://127.0.0.1:9/static/v1").await;

        let expanded = expand_macros(&ctx, "{{ plugin_summary ('cloze') }}\n{{plugin_summary\t(\"cloze\")}}")
            .await
            .unwrap();
        assert_eq!(expanded, "Fill in the blanks.\n\nFill in the blanks.\n");
    }

    #[tokio::test]
    async fn text_without_macros_is_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, _) = context(dir.path(), "http://127.0.0.1:9/static/v1").await;
        let source = "Plain {{ text }} with {{ braces('x' }}.";
        assert_eq!(expand_macros(&ctx, source).await.unwrap(), source);
    }

    #[tokio::test]
    async fn render_error_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, _) = context(dir.path(), "http://127.0.0.1:9/static/v1").await;
        assert!(expand_macros(&ctx, "{{ plugin_install('missing') }}").await.is_err());
    }
}
