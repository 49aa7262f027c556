//! JSONPath-style queries over extractor output.
//!
//! Supports the subset the renderers need:
//!
//! - `$` root
//! - `.field` child access
//! - `[*]` every array element (or object value)
//! - `[N]` array index
//! - `[?key = value]` keep array elements whose `key` equals `value`
//!
//! Filter values compare against strings, numbers and booleans by their text;
//! `key` may itself be dotted (`[?flags.isOptional = true]`).

use serde_json::Value;

use plugindoc_shared::{PluginDocError, Result};

#[derive(Debug, Clone, PartialEq)]
enum Step {
    Field(String),
    Wildcard,
    Index(usize),
    Filter { key: Vec<String>, value: String },
}

/// A compiled path expression.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonPath {
    steps: Vec<Step>,
}

impl JsonPath {
    /// Compile a path expression.
    pub fn parse(expr: &str) -> Result<Self> {
        let invalid = |why: &str| PluginDocError::validation(format!("invalid path '{expr}': {why}"));

        let rest = expr
            .trim()
            .strip_prefix('$')
            .ok_or_else(|| invalid("must start with '$'"))?;

        let mut steps = Vec::new();
        let mut chars = rest.char_indices().peekable();

        while let Some((i, c)) = chars.next() {
            match c {
                '.' => {
                    let start = i + 1;
                    let mut end = start;
                    while let Some(&(j, next)) = chars.peek() {
                        if next == '.' || next == '[' {
                            break;
                        }
                        end = j + next.len_utf8();
                        chars.next();
                    }
                    let name = &rest[start..end.max(start)];
                    match name {
                        "" => return Err(invalid("empty field name")),
                        "*" => steps.push(Step::Wildcard),
                        _ => steps.push(Step::Field(name.to_string())),
                    }
                }
                '[' => {
                    let start = i + 1;
                    let mut end = None;
                    for (j, next) in chars.by_ref() {
                        if next == ']' {
                            end = Some(j);
                            break;
                        }
                    }
                    let end = end.ok_or_else(|| invalid("unclosed '['"))?;
                    steps.push(parse_bracket(rest[start..end].trim()).map_err(|e| invalid(&e))?);
                }
                other => return Err(invalid(&format!("unexpected '{other}'"))),
            }
        }

        Ok(Self { steps })
    }

    /// Every match, in document order.
    pub fn find<'a>(&self, data: &'a Value) -> Vec<&'a Value> {
        let mut current = vec![data];

        for step in &self.steps {
            let mut next = Vec::new();
            for node in current {
                match step {
                    Step::Field(name) => {
                        if let Some(v) = node.get(name.as_str()) {
                            next.push(v);
                        }
                    }
                    Step::Wildcard => match node {
                        Value::Array(items) => next.extend(items.iter()),
                        Value::Object(map) => next.extend(map.values()),
                        _ => {}
                    },
                    Step::Index(idx) => {
                        if let Some(v) = node.as_array().and_then(|a| a.get(*idx)) {
                            next.push(v);
                        }
                    }
                    Step::Filter { key, value } => {
                        if let Value::Array(items) = node {
                            next.extend(items.iter().filter(|item| matches_filter(item, key, value)));
                        }
                    }
                }
            }
            current = next;
        }

        current
    }
}

fn parse_bracket(inner: &str) -> std::result::Result<Step, String> {
    if inner == "*" {
        return Ok(Step::Wildcard);
    }

    if let Some(filter) = inner.strip_prefix('?') {
        let (key, value) = filter
            .split_once('=')
            .ok_or_else(|| "filter needs '='".to_string())?;
        let key = key.trim().trim_start_matches('@').trim_start_matches('.');
        if key.is_empty() {
            return Err("filter key is empty".into());
        }
        let value = unquote(value.trim().trim_start_matches('='));
        return Ok(Step::Filter {
            key: key.split('.').map(str::to_string).collect(),
            value: value.to_string(),
        });
    }

    inner
        .parse::<usize>()
        .map(Step::Index)
        .map_err(|_| format!("unsupported selector '[{inner}]'"))
}

fn unquote(s: &str) -> &str {
    let s = s.trim();
    for quote in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

fn matches_filter(item: &Value, key: &[String], expected: &str) -> bool {
    let mut node = item;
    for part in key {
        match node.get(part.as_str()) {
            Some(v) => node = v,
            None => return false,
        }
    }

    match node {
        Value::String(s) => s == expected,
        Value::Number(n) => n.to_string() == expected,
        Value::Bool(b) => b.to_string() == expected,
        _ => false,
    }
}

/// Every value matching `path`.
pub fn values_by_path<'a>(data: &'a Value, path: &str) -> Result<Vec<&'a Value>> {
    Ok(JsonPath::parse(path)?.find(data))
}

/// The first value matching `path`, if any.
pub fn value_by_path<'a>(data: &'a Value, path: &str) -> Result<Option<&'a Value>> {
    Ok(JsonPath::parse(path)?.find(data).into_iter().next())
}
