//! Rendering of TypeDoc comment parts as inline Markdown.

use serde_json::Value;

/// Concatenate comment display parts into a single Markdown line.
///
/// Text and code parts keep their text with paragraph breaks turned into `<p>`
/// and line breaks into spaces, so the result fits in a table cell. `{@link}`
/// inline tags become Markdown links; every other part kind is dropped.
pub fn jsdoc_to_markdown<'a>(parts: impl IntoIterator<Item = &'a Value>) -> String {
    let mut output = String::new();

    for part in parts {
        let kind = part.get("kind").and_then(Value::as_str).unwrap_or_default();
        match kind {
            "text" | "code" => {
                let text = part.get("text").and_then(Value::as_str).unwrap_or_default();
                output.push_str(&text.replace("\n\n", "<p>").replace('\n', " "));
            }
            "inline-tag" if part.get("tag").and_then(Value::as_str) == Some("@link") => {
                let target = link_target(part);
                let text = part
                    .get("text")
                    .and_then(Value::as_str)
                    .filter(|t| !t.is_empty())
                    .unwrap_or(&target);
                output.push_str(&format!("[{text}]({target})"));
            }
            _ => {}
        }
    }

    output
}

/// `target` is a URL string for external links and a reflection id otherwise.
fn link_target(part: &Value) -> String {
    match part.get("target") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}
