//! Usage examples: trial snippets pulled from example HTML files, the
//! `## Examples` section that shows them, and the runnable demo pages the
//! section embeds.

use std::sync::LazyLock;

use regex::Regex;

/// Where the examples section points its demo iframes.
pub const DEMO_BASE_PATH: &str = "../../demos/";

const EXAMPLES_FOLDER_URL: &str = "https://github.com/jspsych/jsPsych/tree/main/examples";

static SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script[^>]*>(.*?)</script>").expect("script block regex")
});

static PROMPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"prompt\s*:\s*["'`]([^"'`]+)["'`]"#).expect("prompt regex")
});

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag regex"));

static CLOSING_BRACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\}$").expect("closing brace regex"));

/// An example HTML file found for a plugin.
#[derive(Debug, Clone)]
pub struct ExampleFile {
    pub name: String,
    pub content: String,
}

/// One trial object lifted out of an example.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trial {
    /// Object literal, re-indented.
    pub code: String,
    /// Title for the example block: the prompt text, or `Example <n>`.
    pub description: String,
}

/// A demo page to write next to the docs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoFile {
    pub file_name: String,
    pub html: String,
}

/// `html-button-response` -> `jsPsychHtmlButtonResponse`.
pub fn plugin_var_name(plugin_name: &str) -> String {
    let mut out = String::from("jsPsych");
    for part in plugin_name.split('-') {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

/// The experiment code of an example page: the last inline script with a
/// non-blank body that no `src=` attribute follows.
pub fn extract_example_code(html: &str) -> Option<String> {
    SCRIPT_RE
        .captures_iter(html)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let open_end = whole.start() + whole.as_str().find('>')? + 1;
            if html[open_end..].contains("src=") {
                return None;
            }
            let body = caps.get(1)?.as_str().trim();
            (!body.is_empty()).then(|| body.to_string())
        })
        .last()
}

fn leading_whitespace(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Strip the common indentation of every line after the first.
fn normalize_indentation(code: &str) -> String {
    let lines: Vec<&str> = code.split('\n').collect();
    let min_indent = lines
        .iter()
        .skip(1)
        .filter(|l| !l.trim().is_empty())
        .map(|l| leading_whitespace(l))
        .min()
        .unwrap_or(0);

    let normalized: Vec<&str> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            if line.trim().is_empty() {
                ""
            } else if i == 0 {
                line.trim()
            } else {
                line.get(min_indent..).unwrap_or_else(|| line.trim_start())
            }
        })
        .collect();

    let joined = normalized.join("\n");
    CLOSING_BRACE_RE
        .replace(joined.trim(), "\n}")
        .into_owned()
}

/// Every object literal in `code` whose `type` is this plugin, up to two
/// levels of nested objects.
pub fn extract_trials(code: &str, plugin_name: &str) -> Vec<Trial> {
    let pattern = format!(
        r"(?:(?:const|let|var)\s+(\w+)\s*=\s*)?\{{[^{{}}]*type\s*:\s*{}[^{{}}]*(?:\{{[^{{}}]*(?:\{{[^{{}}]*\}}[^{{}}]*)*\}}[^{{}}]*)*\}}",
        regex::escape(&plugin_var_name(plugin_name))
    );
    let Ok(trial_re) = Regex::new(&pattern) else {
        return Vec::new();
    };

    let mut trials = Vec::new();
    for caps in trial_re.captures_iter(code) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let mut literal = whole.as_str();
        if caps.get(1).is_some() {
            if let Some(start) = literal.find('{') {
                literal = &literal[start..];
            }
        }

        let description = PROMPT_RE
            .captures(literal)
            .and_then(|c| c.get(1))
            .map(|m| TAG_RE.replace_all(m.as_str(), "").trim().to_string())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| format!("Example {}", trials.len() + 1));

        trials.push(Trial {
            code: normalize_indentation(literal),
            description,
        });
    }
    trials
}

/// File name of the `n`th (1-based) demo of a plugin.
pub fn demo_file_name(plugin_name: &str, n: usize) -> String {
    format!("jspsych-{plugin_name}-demo{n}.html")
}

/// A standalone page running one trial from the CDN builds, wrapped by the
/// site's `docs-demo-timeline.js`.
pub fn demo_html(
    trial_code: &str,
    package_name: &str,
    jspsych_version: &str,
    plugin_version: &str,
) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <script src="docs-demo-timeline.js"></script>
    <script src="https://unpkg.com/jspsych@{jspsych_version}"></script>
    <script src="https://unpkg.com/{package_name}@{plugin_version}"></script>
    <link rel="stylesheet" href="https://unpkg.com/jspsych@{jspsych_version}/css/jspsych.css" />
    <link rel="stylesheet" href="docs-demo.css" type="text/css">
  </head>
  <body></body>
  <script>

    const jsPsych = initJsPsych();

    const timeline = [];

    const trial = {trial_code};

    timeline.push(trial);

    if (typeof jsPsych !== "undefined") {{
      jsPsych.run(generateDocsDemoTimeline(timeline));
    }} else {{
      document.body.innerHTML = '<div style="text-align:center; margin-top:50%; transform:translate(0,-50%);">You must be online to view the plugin demo.</div>';
    }}
  </script>
</html>
"#
    )
}

/// `## Examples` with a Code / Demo tab pair per trial.
///
/// With no trials, falls back to a link to the examples folder when example
/// files exist, and to nothing otherwise.
pub fn render_examples_section(trials: &[Trial], plugin_name: &str, example_files: usize) -> String {
    if trials.is_empty() {
        if example_files == 0 {
            return String::new();
        }
        let plural = if example_files > 1 { "s" } else { "" };
        return format!(
            "\n## Examples\n\nSee example file{plural} in the [examples folder]({EXAMPLES_FOLDER_URL}) for usage demonstrations.\n"
        );
    }

    let mut md = String::from("\n## Examples\n\n");
    for (i, trial) in trials.iter().enumerate() {
        let demo = format!("{DEMO_BASE_PATH}{}", demo_file_name(plugin_name, i + 1));
        md.push_str(&format!("???+ example \"{}\"\n", trial.description));
        md.push_str("    === \"Code\"\n");
        md.push_str("        ```javascript\n");
        for line in trial.code.split('\n') {
            md.push_str(&format!("        {line}\n"));
        }
        md.push_str("        ```\n\n");
        md.push_str("    === \"Demo\"\n");
        md.push_str("        <div style=\"text-align:center;\">\n");
        md.push_str(&format!(
            "            <iframe src=\"{demo}\" width=\"90%;\" height=\"600px;\" frameBorder=\"0\"></iframe>\n"
        ));
        md.push_str("        </div>\n\n");
        md.push_str(&format!(
            "    <a target=\"_blank\" rel=\"noopener noreferrer\" href=\"{demo}\">Open demo in new tab</a>\n\n"
        ));
    }
    md
}

/// Examples markdown plus one demo page per extracted trial, numbered in
/// the order the example files are given.
pub fn examples_and_demos(
    files: &[ExampleFile],
    plugin_name: &str,
    package_name: &str,
    jspsych_version: &str,
    plugin_version: &str,
) -> (String, Vec<DemoFile>) {
    let trials: Vec<Trial> = files
        .iter()
        .filter_map(|f| extract_example_code(&f.content))
        .flat_map(|code| extract_trials(&code, plugin_name))
        .collect();

    let demos = trials
        .iter()
        .enumerate()
        .map(|(i, trial)| DemoFile {
            file_name: demo_file_name(plugin_name, i + 1),
            html: demo_html(&trial.code, package_name, jspsych_version, plugin_version),
        })
        .collect();

    (render_examples_section(&trials, plugin_name, files.len()), demos)
}
