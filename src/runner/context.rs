use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::OnceLock;

fn template_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([a-zA-Z0-9_.]+)\}").expect("valid template pattern"))
}

/// Variables threaded between workflow steps: configuration values,
/// generated test data and identifiers captured from responses
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    vars: HashMap<String, String>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a variable, falling back to the process environment
    pub fn get_var(&self, name: &str) -> Option<String> {
        self.vars
            .get(name)
            .cloned()
            .or_else(|| std::env::var(name).ok())
    }

    pub fn has_var(&self, name: &str) -> bool {
        self.vars.get(name).is_some_and(|v| !v.is_empty())
    }

    /// Store a variable exactly as given; `${...}` inside the value is never expanded
    pub fn set_var(&mut self, name: &str, value: &str) {
        self.vars.insert(name.to_string(), value.to_string());
    }

    /// Substitute ${name} or ${name.json.path} patterns in a string.
    /// Unknown placeholders are left in place.
    pub fn substitute_vars(&self, text: &str) -> String {
        template_pattern()
            .replace_all(text, |caps: &Captures| {
                self.resolve(&caps[1])
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .to_string()
    }

    fn resolve(&self, key: &str) -> Option<String> {
        if let Some(val) = self.get_var(key) {
            return Some(val);
        }

        match key {
            "time" => return Some(chrono::Local::now().format("%H:%M:%S").to_string()),
            "date" => return Some(chrono::Local::now().format("%Y-%m-%d").to_string()),
            "timestamp" => return Some(chrono::Utc::now().timestamp().to_string()),
            _ => {}
        }

        // ${var.path} reads into a variable holding JSON
        let (var_name, json_path) = key.split_once('.')?;
        let json_str = self.get_var(var_name)?;
        let value = serde_json::from_str::<serde_json::Value>(&json_str).ok()?;
        let pointer = format!("/{}", json_path.replace('.', "/"));
        value.pointer(&pointer).map(json_to_string)
    }

    /// Substitute every string inside a JSON value, keeping its structure
    pub fn substitute_value(&self, value: &serde_json::Value) -> serde_json::Value {
        use serde_json::Value;
        match value {
            Value::String(s) => Value::String(self.substitute_vars(s)),
            Value::Array(items) => {
                Value::Array(items.iter().map(|v| self.substitute_value(v)).collect())
            }
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.substitute_value(v)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Placeholders in `text` that could not be resolved
    pub fn unresolved(&self, text: &str) -> Vec<String> {
        template_pattern()
            .captures_iter(text)
            .map(|caps| caps[1].to_string())
            .filter(|key| self.resolve(key).is_none())
            .collect()
    }

    /// Unresolvable placeholders in any string inside a JSON value
    pub fn unresolved_in_value(&self, value: &serde_json::Value) -> Vec<String> {
        use serde_json::Value;
        match value {
            Value::String(s) => self.unresolved(s),
            Value::Array(items) => items
                .iter()
                .flat_map(|v| self.unresolved_in_value(v))
                .collect(),
            Value::Object(map) => map
                .values()
                .flat_map(|v| self.unresolved_in_value(v))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Render a JSON value as a plain string: strings unquoted, everything else as JSON
pub fn json_to_string(value: &serde_json::Value) -> String {
    match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    }
}
