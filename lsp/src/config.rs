//! Server configuration: a JSON tree with a fixed default skeleton,
//! deep-merged with whatever the client sends.
//!
//! The merge rule is structural: mappings recurse, everything else —
//! scalars and arrays alike — replaces the default wholesale. Typed
//! views ([`FormatSettings`], [`LintSettings`]) are deserialized from
//! the tree at call sites so the collaborators never touch raw JSON.

use serde::Deserialize;
use serde_json::Value;

/// The merged settings tree for the whole session.
#[derive(Debug, Clone)]
pub struct Settings {
    root: Value,
}

impl Default for Settings {
    fn default() -> Self {
        Self { root: defaults() }
    }
}

impl Settings {
    /// Deep-merge a client update into the tree.
    ///
    /// Non-mapping updates are ignored at the top level; clients that
    /// send `"settings": null` get a no-op, not a wiped config.
    pub fn merge(&mut self, update: &Value) {
        if update.is_object() {
            deep_merge(&mut self.root, update);
        }
    }

    #[must_use]
    pub fn completion_enabled(&self) -> bool {
        self.root["completion"]["enabled"].as_bool().unwrap_or(false)
    }

    /// Typed view of the `formatting` namespace.
    #[must_use]
    pub fn formatting(&self) -> FormatSettings {
        serde_json::from_value(self.root["formatting"].clone()).unwrap_or_default()
    }

    /// Typed view of the `linting` namespace.
    #[must_use]
    pub fn linting(&self) -> LintSettings {
        serde_json::from_value(self.root["linting"].clone()).unwrap_or_default()
    }

    #[cfg(test)]
    pub(crate) fn raw(&self) -> &Value {
        &self.root
    }
}

/// Recursive structural merge: objects recurse, everything else replaces.
fn deep_merge(target: &mut Value, update: &Value) {
    let Some(update) = update.as_object() else {
        return;
    };
    let Some(target) = target.as_object_mut() else {
        return;
    };
    for (key, value) in update {
        match (target.get_mut(key), value) {
            (Some(existing @ Value::Object(_)), Value::Object(_)) => {
                deep_merge(existing, value);
            }
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

/// The default skeleton. Every key a client may override exists here,
/// so typed views never observe a missing namespace.
fn defaults() -> Value {
    serde_json::json!({
        "formatting": {
            "enabled": true,
            "configPath": null,
            "stylesheetPath": null,
            "preserveDuplicates": false,
            "preserveWhitespace": true,
            "toolPath": "node",
        },
        "linting": {
            "enabled": false,
            "command": "slim-lint",
            "useProjectRunner": true,
            "reporter": "json",
            "configPath": null,
            "includeRules": [],
            "excludeRules": [],
            "excludePaths": [],
            "extraArgs": [],
        },
        "completion": {
            "enabled": true,
        },
    })
}

/// Settings for the class-sorting formatter.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormatSettings {
    pub enabled: bool,
    pub config_path: Option<String>,
    pub stylesheet_path: Option<String>,
    pub preserve_duplicates: bool,
    pub preserve_whitespace: bool,
    pub tool_path: String,
}

impl Default for FormatSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            config_path: None,
            stylesheet_path: None,
            preserve_duplicates: false,
            preserve_whitespace: true,
            tool_path: "node".to_string(),
        }
    }
}

/// Settings for the slim-lint collaborator.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LintSettings {
    pub enabled: bool,
    pub command: String,
    pub use_project_runner: bool,
    pub reporter: String,
    pub config_path: Option<String>,
    pub include_rules: Vec<String>,
    pub exclude_rules: Vec<String>,
    pub exclude_paths: Vec<String>,
    pub extra_args: Vec<String>,
}

impl Default for LintSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            command: "slim-lint".to_string(),
            use_project_runner: true,
            reporter: "json".to_string(),
            config_path: None,
            include_rules: Vec::new(),
            exclude_rules: Vec::new(),
            exclude_paths: Vec::new(),
            extra_args: Vec::new(),
        }
    }
}
