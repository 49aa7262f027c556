//! Markdown sections for plugin documentation pages.
//!
//! [`fields`] reads parameter, data and summary information out of the
//! extractor's reflection tree; [`render`] turns it into the Markdown
//! fragments the docs site embeds. The `*_section` helpers below combine the
//! two for a whole description tree. [`examples`] turns example HTML files
//! into the `## Examples` section and its demo pages.

pub mod examples;
pub mod fields;
pub mod render;

use serde_json::Value;
use tracing::instrument;

use plugindoc_shared::Result;

pub use fields::{InfoSection, data_rows, parameter_rows, plugin_author, plugin_summary_text};
pub use examples::{DemoFile, ExampleFile, Trial, examples_and_demos};
pub use render::{
    PluginPage, REQUIRED_MARKER, camel_case, render_badges, render_data_table, render_install,
    render_parameter_table, render_summary, render_version_line,
};

// ---------------------------------------------------------------------------
// Sections from a description tree
// ---------------------------------------------------------------------------

/// The `## Parameters` section for a plugin.
#[instrument(skip_all)]
pub fn parameters_section(description: &Value) -> Result<String> {
    Ok(render_parameter_table(&parameter_rows(description)?))
}

/// The `## Data Generated` section for a plugin.
#[instrument(skip_all)]
pub fn data_section(description: &Value) -> Result<String> {
    Ok(render_data_table(&data_rows(description)?))
}

/// The summary paragraph for a plugin.
pub fn summary_section(description: &Value) -> Result<String> {
    Ok(render_summary(plugin_summary_text(description)?.as_deref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::fixtures::plugin_description;

    #[test]
    fn parameters_section_from_tree() {
        let md = parameters_section(&plugin_description()).unwrap();
        let lines: Vec<&str> = md.lines().collect();
        let header = lines
            .iter()
            .position(|l| *l == "| Parameter | Type | Default Value | Description |")
            .unwrap();
        assert_eq!(
            lines[header + 2],
            "stimulus<font color='red'>*</font> | string |  | The image to be displayed "
        );
        assert_eq!(lines.len(), header + 6);
    }

    #[test]
    fn data_section_from_tree() {
        let md = data_section(&plugin_description()).unwrap();
        assert!(md.contains("rt | numeric | The response time in milliseconds. \n"));
        assert!(md.contains("response | string | Which key was pressed. \n"));
    }

    #[test]
    fn summary_section_from_tree() {
        assert_eq!(
            summary_section(&plugin_description()).unwrap(),
            "This plugin displays an image and records a key press.\n"
        );
        assert_eq!(
            summary_section(&serde_json::json!({})).unwrap(),
            "No description available.\n"
        );
    }
}
