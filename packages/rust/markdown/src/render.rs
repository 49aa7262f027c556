//! Markdown fragments for the documentation site's macros.

use plugindoc_shared::ParameterRow;

/// Marker appended to the name of a parameter that must be specified.
pub const REQUIRED_MARKER: &str = "<font color='red'>*</font>";

const PARAMETERS_INTRO: &str = "
## Parameters

In addition to the [parameters available in all
plugins](../overview/plugins.md#parameters-available-in-all-plugins), this plugin
accepts the following parameters. Parameters with a default value of undefined must be
specified. Other parameters can be left unspecified if the default value is acceptable.

| Parameter | Type | Default Value | Description |
| --------- | ---- | ------------- | ----------- |
";

const NO_PARAMETERS: &str = "
## Parameters

This plugin has no parameters.
";

const DATA_INTRO: &str = "
## Data Generated

In addition to the [default data collected by all
plugins](../overview/plugins.md#data-collected-by-all-plugins), this plugin collects the
following data for each trial.

Name | Type | Value
-----|------|------
";

const NO_DATA: &str = "
## Data Generated

This plugin does not collect any additional data beyond the [default data collected by all
plugins](../overview/plugins.md#data-collected-by-all-plugins).
";

/// The parameter table section.
pub fn render_parameter_table(rows: &[ParameterRow]) -> String {
    if rows.is_empty() {
        return NO_PARAMETERS.to_string();
    }

    let mut output = PARAMETERS_INTRO.to_string();
    for row in rows {
        let marker = if row.required { REQUIRED_MARKER } else { "" };
        output.push_str(&format!(
            "{}{marker} | {} | {} | {} \n",
            row.name, row.type_name, row.default_value, row.description
        ));
    }
    output
}

/// The generated-data table section.
pub fn render_data_table(rows: &[ParameterRow]) -> String {
    if rows.is_empty() {
        return NO_DATA.to_string();
    }

    let mut output = DATA_INTRO.to_string();
    for row in rows {
        output.push_str(&format!(
            "{} | {} | {} \n",
            row.name, row.type_name, row.description
        ));
    }
    output
}

/// The plugin summary paragraph.
pub fn render_summary(summary: Option<&str>) -> String {
    format!("{}\n", summary.unwrap_or("No description available."))
}

/// `html-keyboard-response` -> `htmlKeyboardResponse`.
pub fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (i, part) in name.split('-').filter(|p| !p.is_empty()).enumerate() {
        if i == 0 {
            out.push_str(part);
            continue;
        }
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

/// The `Current version` line linking to the package changelog.
pub fn render_version_line(package_dir: &str, version: Option<&str>) -> String {
    format!(
        "Current version: {}. [See version history](https://github.com/jspsych/jsPsych/blob/main/packages/{package_dir}/CHANGELOG.md).\n",
        version.unwrap_or("current-plugin-version")
    )
}

/// The installation section for a published plugin package.
pub fn render_install(package_name: &str, version: &str, plugin_name: &str) -> String {
    let import_name = camel_case(plugin_name);
    format!(
        r#"## Install

Using the CDN-hosted JavaScript file:

```js
<script src="https://unpkg.com/{package_name}@{version}"></script>
```

Using the JavaScript file downloaded from a GitHub release dist archive:

```js
<script src="jspsych/plugin-{plugin_name}.js"></script>
```

Using NPM:

```
npm install {package_name}
```
```js
import {import_name} from '{package_name}';
```
"#
    )
}

/// Inline badge images for the metadata line.
pub fn render_badges(svgs: &[String]) -> String {
    let inner: Vec<&str> = svgs.iter().map(|s| s.trim()).collect();
    format!("<span class=\"plugin-meta\">{}</span>\n", inner.join(" "))
}

/// All sections of a standalone plugin page.
#[derive(Debug, Clone, Default)]
pub struct PluginPage {
    pub name: String,
    pub badges: String,
    pub version: String,
    pub summary: String,
    pub parameters: String,
    pub data: String,
    pub install: String,
    pub examples: String,
}

impl PluginPage {
    /// Assemble the page Markdown.
    pub fn render(&self) -> String {
        let mut sections = vec![format!("# {}\n", self.name)];
        for part in [
            &self.badges,
            &self.version,
            &self.summary,
            &self.parameters,
            &self.data,
            &self.install,
            &self.examples,
        ] {
            let trimmed = part.trim();
            if !trimmed.is_empty() {
                sections.push(format!("{trimmed}\n"));
            }
        }
        sections.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, type_name: &str, default: &str, required: bool) -> ParameterRow {
        ParameterRow {
            name: name.into(),
            type_name: type_name.into(),
            default_value: default.into(),
            required,
            description: format!("About {name}."),
        }
    }

    #[test]
    fn parameter_table_lines() {
        let table = render_parameter_table(&[
            row("stimulus", "HTML string", "", true),
            row("prompt", "HTML string", "null", false),
        ]);
        assert!(table.starts_with("\n## Parameters\n"));
        assert!(table.contains("| Parameter | Type | Default Value | Description |\n"));
        assert!(table.contains(
            "stimulus<font color='red'>*</font> | HTML string |  | About stimulus. \n"
        ));
        assert!(table.ends_with("prompt | HTML string | null | About prompt. \n"));
    }

    #[test]
    fn empty_tables() {
        assert!(render_parameter_table(&[]).ends_with("This plugin has no parameters.\n"));
        assert!(render_data_table(&[]).contains("does not collect any additional data"));
    }

    #[test]
    fn data_table_lines() {
        let table = render_data_table(&[row("rt", "numeric", "", false)]);
        assert!(table.contains("Name | Type | Value\n-----|------|------\n"));
        assert!(table.ends_with("rt | numeric | About rt. \n"));
    }

    #[test]
    fn summary_fallback() {
        assert_eq!(render_summary(Some("Shows text.")), "Shows text.\n");
        assert_eq!(render_summary(None), "No description available.\n");
    }

    #[test]
    fn camel_case_names() {
        assert_eq!(camel_case("html-keyboard-response"), "htmlKeyboardResponse");
        assert_eq!(camel_case("cloze"), "cloze");
        assert_eq!(camel_case("iat-html"), "iatHtml");
    }

    #[test]
    fn install_snippet() {
        let md = render_install("@jspsych/plugin-cloze", "2.1.0", "cloze");
        assert!(md.contains(r#"<script src="https://unpkg.com/@jspsych/plugin-cloze@2.1.0"></script>"#));
        assert!(md.contains(r#"<script src="jspsych/plugin-cloze.js"></script>"#));
        assert!(md.contains("npm install @jspsych/plugin-cloze\n"));
        assert!(md.contains("import cloze from '@jspsych/plugin-cloze';"));
    }

    #[test]
    fn version_line_links_changelog() {
        assert_eq!(
            render_version_line("plugin-cloze", Some("2.1.0")),
            "Current version: 2.1.0. [See version history](https://github.com/jspsych/jsPsych/blob/main/packages/plugin-cloze/CHANGELOG.md).\n"
        );
        assert!(render_version_line("plugin-cloze", None)
            .starts_with("Current version: current-plugin-version. "));
    }

    #[test]
    fn badges_span() {
        let html = render_badges(&["<svg>a</svg>\n".into(), "<svg>b</svg>".into()]);
        assert_eq!(
            html,
            "<span class=\"plugin-meta\"><svg>a</svg> <svg>b</svg></span>\n"
        );
    }

    #[test]
    fn page_skips_empty_sections() {
        let page = PluginPage {
            name: "cloze".into(),
            version: "Current version: 2.1.0.\n".into(),
            summary: "Fill in the blanks.\n".into(),
            install: "## Install\n".into(),
            examples: "\n## Examples\n\nSee example file.\n".into(),
            ..PluginPage::default()
        };
        assert_eq!(
            page.render(),
            "# cloze\n\nCurrent version: 2.1.0.\n\nFill in the blanks.\n\n## Install\n\n## Examples\n\nSee example file.\n"
        );
    }
}
