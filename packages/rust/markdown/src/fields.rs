//! Field extraction from a plugin's TypeDoc reflection tree.
//!
//! A plugin module default-exports a class whose static `info` object holds
//! `parameters` and `data` maps; each entry is an object literal with `type`,
//! `array` and `default` members and a JSDoc summary.

use serde_json::Value;
use tracing::debug;

use plugindoc_shared::{ParameterRow, PluginDocError, Result, map_parameter_type, pluralize_type};
use plugindoc_typedoc::{jsdoc_to_markdown, value_by_path, values_by_path};

const INFO_PATH: &str = "$.children[?name = default].children[?name = info].type.declaration";

const TYPE_PATH: &str = "$.type.declaration.children[?name = type].type.name";
const ARRAY_PATH: &str = "$.type.declaration.children[?name = array].type.value";
const DEFAULT_PATH: &str = "$.type.declaration.children[?name = default].defaultValue";
const SUMMARY_PATH: &str = "$.comment.summary[*]";

/// TypeDoc's numeric `ReflectionKind.Property`, used when `kindString` is absent.
const PROPERTY_KIND: u32 = 1024;

/// Which map of the `info` object to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoSection {
    Parameters,
    Data,
}

impl InfoSection {
    fn as_str(self) -> &'static str {
        match self {
            Self::Parameters => "parameters",
            Self::Data => "data",
        }
    }
}

/// Property reflections of `info.parameters` or `info.data`, in source order.
fn section_properties(description: &Value, section: InfoSection) -> Result<Vec<&Value>> {
    let base = format!(
        "{INFO_PATH}.children[?name = {}].type.declaration.children",
        section.as_str()
    );

    let by_kind_string = values_by_path(description, &format!("{base}[?kindString = Property]"))?;
    if !by_kind_string.is_empty() {
        return Ok(by_kind_string);
    }

    // Newer extractor releases only emit the numeric kind.
    values_by_path(description, &format!("{base}[?kind = {PROPERTY_KIND}]"))
}

/// Escape a value for use inside a Markdown table cell.
pub(crate) fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

fn property_row(property: &Value) -> Result<ParameterRow> {
    let name = property
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| PluginDocError::lookup("parameter reflection has no name"))?;

    let raw_type = value_by_path(property, TYPE_PATH)?
        .and_then(Value::as_str)
        .unwrap_or_default();
    let mut type_name = map_parameter_type(raw_type);

    let is_array = match value_by_path(property, ARRAY_PATH)? {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s == "true",
        _ => false,
    };
    if is_array {
        type_name = pluralize_type(&type_name);
    }

    let default_value = value_by_path(property, DEFAULT_PATH)?
        .and_then(Value::as_str)
        .unwrap_or_default();
    let required = default_value == "undefined";

    let description = jsdoc_to_markdown(values_by_path(property, SUMMARY_PATH)?);

    Ok(ParameterRow {
        name: name.to_string(),
        type_name: escape_cell(&type_name),
        default_value: if required {
            String::new()
        } else {
            escape_cell(default_value)
        },
        required,
        description: escape_cell(&description),
    })
}

/// Rows for the plugin's parameter table.
pub fn parameter_rows(description: &Value) -> Result<Vec<ParameterRow>> {
    let rows = section_properties(description, InfoSection::Parameters)?
        .into_iter()
        .map(property_row)
        .collect::<Result<Vec<_>>>()?;
    debug!(count = rows.len(), "collected parameters");
    Ok(rows)
}

/// Rows for the plugin's generated-data table.
///
/// Data fields have no defaults, so `required` is always false.
pub fn data_rows(description: &Value) -> Result<Vec<ParameterRow>> {
    section_properties(description, InfoSection::Data)?
        .into_iter()
        .map(|property| {
            property_row(property).map(|row| ParameterRow {
                required: false,
                default_value: String::new(),
                ..row
            })
        })
        .collect()
}

/// Summary text of the plugin class, if documented.
pub fn plugin_summary_text(description: &Value) -> Result<Option<String>> {
    let parts = values_by_path(description, "$.children[?name = default].comment.summary[*]")?;
    let text = jsdoc_to_markdown(parts);
    let text = text.trim();
    Ok((!text.is_empty()).then(|| text.to_string()))
}

/// The `@author` block tag of the plugin class, if present.
pub fn plugin_author(description: &Value) -> Result<Option<String>> {
    let parts = values_by_path(
        description,
        "$.children[?name = default].comment.blockTags[?tag = @author].content[*]",
    )?;
    let text = jsdoc_to_markdown(parts);
    let text = text.trim();
    Ok((!text.is_empty()).then(|| text.to_string()))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use serde_json::{Value, json};

    pub(crate) fn property(name: &str, ty: &str, array: Option<bool>, default: Option<&str>, summary: Value) -> Value {
        let mut members = vec![json!({"name": "type", "type": {"type": "reference", "name": ty}})];
        if let Some(array) = array {
            members.push(json!({"name": "array", "type": {"type": "literal", "value": array}}));
        }
        if let Some(default) = default {
            members.push(json!({"name": "default", "defaultValue": default}));
        }
        json!({
            "name": name,
            "kindString": "Property",
            "comment": {"summary": summary},
            "type": {"type": "reflection", "declaration": {"children": members}}
        })
    }

    /// A trimmed-down extractor tree for an image-keyboard-response style plugin.
    pub(crate) fn plugin_description() -> Value {
        let parameters = vec![
            property(
                "stimulus",
                "IMAGE",
                None,
                Some("undefined"),
                json!([{"kind": "text", "text": "The image to be displayed"}]),
            ),
            property(
                "choices",
                "KEYS",
                None,
                Some("\"ALL_KEYS\""),
                json!([
                    {"kind": "text", "text": "This array contains the key(s) the participant may press.\n\nSee "},
                    {"kind": "inline-tag", "tag": "@link", "text": "keys", "target": "../overview/keyboard.md"}
                ]),
            ),
            property(
                "stimulus_duration",
                "INT",
                None,
                Some("null"),
                json!([{"kind": "text", "text": "How long to show the stimulus | in ms."}]),
            ),
            property(
                "button_html",
                "HTML_STRING",
                Some(true),
                Some("'<button class=\"jspsych-btn\">%choice%</button>'"),
                json!([]),
            ),
        ];
        let data = vec![
            property("rt", "INT", None, None, json!([{"kind": "text", "text": "The response time in milliseconds."}])),
            property("response", "STRING", None, None, json!([{"kind": "text", "text": "Which key was pressed."}])),
        ];

        json!({
            "name": "@jspsych/plugin-image-keyboard-response",
            "children": [
                {
                    "name": "default",
                    "comment": {
                        "summary": [{"kind": "text", "text": "This plugin displays an image and records a key press."}],
                        "blockTags": [
                            {"tag": "@author", "content": [{"kind": "text", "text": "Josh de Leeuw"}]},
                            {"tag": "@see", "content": [{"kind": "text", "text": "docs"}]}
                        ]
                    },
                    "children": [
                        {"name": "constructor"},
                        {
                            "name": "info",
                            "type": {"type": "reflection", "declaration": {"children": [
                                {"name": "name", "type": {"type": "literal", "value": "image-keyboard-response"}},
                                {"name": "parameters", "type": {"type": "reflection", "declaration": {"children": parameters}}},
                                {"name": "data", "type": {"type": "reflection", "declaration": {"children": data}}}
                            ]}}
                        }
                    ]
                }
            ]
        })
    }
}
