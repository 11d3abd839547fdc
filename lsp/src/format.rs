//! Formatting adapter: Tailwind class-list sorting inside `class=`
//! attributes, and nothing else.
//!
//! Formatting never re-indents and never touches text outside the
//! matched attribute values. Sorting is delegated to a Node script
//! (shipped with the crate and materialized to a temp file at runtime);
//! every failure keeps the original class list and degrades with a
//! one-time warning.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::FormatSettings;
use crate::tool;

const SORTER_SCRIPT: &str = include_str!("../../scripts/tailwind_sorter.mjs");

/// `class="…"` / `class='…'` attribute occurrences, quote-insensitive.
static CLASS_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"class\s*=\s*("([^"]*)"|'([^']*)')"#).expect("valid class attribute regex")
});

/// Payload for the sorter script, field spellings fixed by its contract.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SorterPayload<'a> {
    classes: &'a str,
    tailwind_config: Option<String>,
    tailwind_stylesheet: Option<String>,
    base_dir: String,
    tailwind_preserve_duplicates: bool,
    tailwind_preserve_whitespace: bool,
}

#[derive(Debug, Deserialize)]
struct SorterResult {
    #[serde(default)]
    classes: Option<String>,
}

pub(crate) struct Formatter {
    workspace_root: PathBuf,
    script_path: Option<PathBuf>,
    warned: bool,
}

impl Formatter {
    pub fn new(workspace_root: PathBuf) -> Self {
        Self {
            workspace_root,
            script_path: None,
            warned: false,
        }
    }

    /// `format(text) -> text'`. Disabled formatting returns the input
    /// unchanged; otherwise each class attribute value is replaced with
    /// its sorted form, preserving the original quote character.
    pub async fn format(&mut self, settings: &FormatSettings, text: &str) -> String {
        if !settings.enabled {
            return text.to_string();
        }

        // The sorter call is async, so collect match spans up front
        // instead of using a replace callback.
        let occurrences: Vec<(usize, usize, String, char)> = CLASS_ATTR_RE
            .captures_iter(text)
            .map(|caps| {
                let whole = caps.get(0).expect("match group 0 always present");
                let (classes, quote) = match caps.get(2) {
                    Some(inner) => (inner.as_str(), '"'),
                    None => (caps.get(3).map_or("", |inner| inner.as_str()), '\''),
                };
                (whole.start(), whole.end(), classes.to_string(), quote)
            })
            .collect();

        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for (start, end, classes, quote) in occurrences {
            let sorted = self.sort_classes(settings, &classes).await;
            out.push_str(&text[last..start]);
            out.push_str("class=");
            out.push(quote);
            out.push_str(&sorted);
            out.push(quote);
            last = end;
        }
        out.push_str(&text[last..]);
        out
    }

    /// Ask the sorter for a sorted class list; on any failure the
    /// original list comes back unchanged.
    async fn sort_classes(&mut self, settings: &FormatSettings, classes: &str) -> String {
        let script = match self.ensure_script() {
            Ok(path) => path,
            Err(e) => {
                self.warn_disabled(&format!("could not materialize sorter script: {e}"));
                return classes.to_string();
            }
        };

        let payload = SorterPayload {
            classes,
            tailwind_config: self.resolve_path(settings.config_path.as_deref()),
            tailwind_stylesheet: self.resolve_path(settings.stylesheet_path.as_deref()),
            base_dir: self.workspace_root.display().to_string(),
            tailwind_preserve_duplicates: settings.preserve_duplicates,
            tailwind_preserve_whitespace: settings.preserve_whitespace,
        };
        let input = match serde_json::to_string(&payload) {
            Ok(json) => json,
            Err(e) => {
                self.warn_disabled(&format!("could not encode sorter payload: {e}"));
                return classes.to_string();
            }
        };

        let args = vec![script.display().to_string()];
        let workspace_root = self.workspace_root.clone();
        match tool::invoke(&settings.tool_path, &args, &workspace_root, &input).await {
            Ok(output) if output.success() => match serde_json::from_str::<SorterResult>(&output.stdout) {
                Ok(result) => result.classes.unwrap_or_else(|| classes.to_string()),
                Err(e) => {
                    self.warn_disabled(&format!("malformed sorter output: {e}"));
                    classes.to_string()
                }
            },
            Ok(output) => {
                self.warn_disabled(output.stderr.trim());
                classes.to_string()
            }
            Err(e) => {
                self.warn_disabled(&e.to_string());
                classes.to_string()
            }
        }
    }

    /// Write the embedded script to the temp dir once per formatter.
    fn ensure_script(&mut self) -> std::io::Result<PathBuf> {
        if let Some(path) = &self.script_path {
            return Ok(path.clone());
        }
        let path = std::env::temp_dir().join(format!(
            "slim-lsp-tailwind-sorter-{}.mjs",
            std::process::id()
        ));
        std::fs::write(&path, SORTER_SCRIPT)?;
        self.script_path = Some(path.clone());
        Ok(path)
    }

    fn resolve_path(&self, path: Option<&str>) -> Option<String> {
        let path = path?;
        if path.is_empty() {
            return None;
        }
        if Path::new(path).is_absolute() {
            Some(path.to_string())
        } else {
            Some(self.workspace_root.join(path).display().to_string())
        }
    }

    fn warn_disabled(&mut self, detail: &str) {
        if self.warned {
            return;
        }
        self.warned = true;
        tracing::warn!(
            "Tailwind class sorting unavailable; install the sorter's Node dependencies (npm install)"
        );
        if !detail.trim().is_empty() {
            tracing::warn!("Tailwind sorter error: {}", detail.trim());
        }
    }
}
