//! slim-lint collaborator: invocation and output parsing.
//!
//! The linter runs as a subprocess with the document text on stdin.
//! Its output is parsed per the configured reporter — JSON when the
//! reporter is `"json"`, otherwise the line-oriented text format. Any
//! failure degrades to "no lint diagnostics" with a one-time warning.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::config::LintSettings;
use crate::tool;
use crate::types::{Diagnostic, Severity};

/// `path:line[:column] [Linter] message`
static TEXT_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*?):(\d+)(?::(\d+))?\s+\[(.+?)\]\s+(.*)$").expect("valid lint line regex")
});

pub(crate) struct LintRunner {
    workspace_root: PathBuf,
    warned: bool,
}

impl LintRunner {
    pub fn new(workspace_root: PathBuf) -> Self {
        Self {
            workspace_root,
            warned: false,
        }
    }

    /// Lint one document. `path` is the filesystem path the client
    /// claims for the buffer; the text itself goes over stdin.
    pub async fn run(&mut self, settings: &LintSettings, path: &str, text: &str) -> Vec<Diagnostic> {
        if !settings.enabled {
            return Vec::new();
        }

        let argv = self.command(settings, path);
        let workspace_root = self.workspace_root.clone();
        match tool::invoke(&argv[0], &argv[1..], &workspace_root, text).await {
            Ok(output) => {
                // Offenses found exit non-zero too; only an exit with no
                // output at all is the tool's own failure signal.
                if !output.success() && output.stdout.trim().is_empty() {
                    let status = output
                        .status
                        .code()
                        .map_or_else(|| "signal".to_string(), |c| c.to_string());
                    self.warn_once(&format!(
                        "slim-lint exited with status {status}: {}",
                        output.stderr.trim()
                    ));
                }
                parse_output(settings, &output.stdout)
            }
            Err(e) => {
                self.warn_once(&format!("slim-lint failed: {e}"));
                Vec::new()
            }
        }
    }

    /// Build the argv: optional project-runner prefix, the command,
    /// then the stdin path, reporter, config, rule filters and raw
    /// extra args, in that order.
    fn command(&self, settings: &LintSettings, path: &str) -> Vec<String> {
        let mut argv: Vec<String> = Vec::new();

        if settings.use_project_runner {
            argv.push("bundle".to_string());
            argv.push("exec".to_string());
        }

        if settings.command.is_empty() {
            argv.push("slim-lint".to_string());
        } else {
            argv.push(settings.command.clone());
        }

        argv.push("--stdin-file-path".to_string());
        argv.push(path.to_string());

        if !settings.reporter.is_empty() {
            argv.push("--reporter".to_string());
            argv.push(settings.reporter.clone());
        }

        if let Some(config_path) = settings.config_path.as_deref()
            && !config_path.is_empty()
        {
            argv.push("-c".to_string());
            argv.push(self.resolve_path(config_path));
        }

        for rule in &settings.include_rules {
            argv.push("-i".to_string());
            argv.push(rule.clone());
        }
        for rule in &settings.exclude_rules {
            argv.push("-e".to_string());
            argv.push(rule.clone());
        }
        for pattern in &settings.exclude_paths {
            argv.push("-x".to_string());
            argv.push(pattern.clone());
        }
        argv.extend(settings.extra_args.iter().cloned());

        argv
    }

    fn resolve_path(&self, path: &str) -> String {
        if Path::new(path).is_absolute() {
            path.to_string()
        } else {
            self.workspace_root.join(path).display().to_string()
        }
    }

    fn warn_once(&mut self, message: &str) {
        if self.warned {
            return;
        }
        self.warned = true;
        tracing::warn!("{message}");
    }
}

/// Parse linter output according to the configured reporter.
fn parse_output(settings: &LintSettings, output: &str) -> Vec<Diagnostic> {
    let stripped = output.trim();
    if stripped.is_empty() {
        return Vec::new();
    }

    if settings.reporter == "json" {
        parse_json(stripped)
    } else {
        parse_text(stripped)
    }
}

/// JSON reporter: a top-level array of per-file entries, or an object
/// wrapping them under `files`/`results`/`offenses`. Unparseable output
/// falls back to the text parser — some slim-lint wrappers print plain
/// lines even when asked for JSON.
fn parse_json(output: &str) -> Vec<Diagnostic> {
    let Ok(data) = serde_json::from_str::<Value>(output) else {
        return parse_text(output);
    };

    let files: Vec<Value> = match &data {
        Value::Array(entries) => entries.clone(),
        Value::Object(map) => map
            .get("files")
            .or_else(|| map.get("results"))
            .or_else(|| map.get("offenses"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
        _ => Vec::new(),
    };

    let mut diagnostics = Vec::new();
    for entry in &files {
        if let Some(offenses) = entry.get("offenses").and_then(Value::as_array) {
            diagnostics.extend(offenses.iter().filter_map(map_offense));
        } else if let Some(offense) = entry.get("offense") {
            diagnostics.extend(map_offense(offense));
        }
    }
    diagnostics
}

/// One offense object into one diagnostic: 1-based line/column to
/// 0-based, `message`/`reason` text, `linter`/`name` source, textual
/// severity mapped with Warning as the default.
fn map_offense(offense: &Value) -> Option<Diagnostic> {
    if !offense.is_object() {
        return None;
    }

    let line = offense.get("line").and_then(Value::as_i64).unwrap_or(1) - 1;
    let column = offense.get("column").and_then(Value::as_i64).unwrap_or(1) - 1;
    let message = offense
        .get("message")
        .or_else(|| offense.get("reason"))
        .and_then(Value::as_str)
        .unwrap_or("Slim-Lint offense");
    let source = offense
        .get("linter")
        .or_else(|| offense.get("name"))
        .and_then(Value::as_str)
        .unwrap_or("slim-lint");
    let severity = offense
        .get("severity")
        .and_then(Value::as_str)
        .map_or(Severity::Warning, Severity::from_label);

    Some(Diagnostic::point(severity, source, message, line, column))
}

/// Text reporter: one `path:line[:column] [Linter] message` per line,
/// severity fixed at Warning.
fn parse_text(output: &str) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(caps) = TEXT_LINE_RE.captures(line) {
            let line_num = caps[2].parse::<i64>().unwrap_or(1) - 1;
            let column = caps
                .get(3)
                .and_then(|m| m.as_str().parse::<i64>().ok())
                .map_or(0, |n| n - 1);
            diagnostics.push(Diagnostic::point(
                Severity::Warning,
                &caps[4],
                &caps[5],
                line_num,
                column,
            ));
        }
    }
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Position;

    fn runner() -> LintRunner {
        LintRunner::new(PathBuf::from("/workspace"))
    }

    fn json_settings() -> LintSettings {
        LintSettings {
            enabled: true,
            ..LintSettings::default()
        }
    }

    #[test]
    fn test_command_default_shape() {
        let argv = runner().command(&json_settings(), "/workspace/app/views/home.slim");
        assert_eq!(
            argv,
            vec![
                "bundle",
                "exec",
                "slim-lint",
                "--stdin-file-path",
                "/workspace/app/views/home.slim",
                "--reporter",
                "json",
            ]
        );
    }

    #[test]
    fn test_command_without_project_runner() {
        let settings = LintSettings {
            use_project_runner: false,
            ..json_settings()
        };
        let argv = runner().command(&settings, "a.slim");
        assert_eq!(argv[0], "slim-lint");
    }

    #[test]
    fn test_command_filters_and_extra_args() {
        let settings = LintSettings {
            use_project_runner: false,
            config_path: Some(".slim-lint.yml".to_string()),
            include_rules: vec!["LineLength".to_string()],
            exclude_rules: vec!["TagCase".to_string(), "Zwsp".to_string()],
            exclude_paths: vec!["vendor/**".to_string()],
            extra_args: vec!["--no-color".to_string()],
            ..json_settings()
        };
        let argv = runner().command(&settings, "a.slim");
        assert_eq!(
            argv,
            vec![
                "slim-lint",
                "--stdin-file-path",
                "a.slim",
                "--reporter",
                "json",
                "-c",
                "/workspace/.slim-lint.yml",
                "-i",
                "LineLength",
                "-e",
                "TagCase",
                "-e",
                "Zwsp",
                "-x",
                "vendor/**",
                "--no-color",
            ]
        );
    }

    #[test]
    fn test_command_absolute_config_path_passes_through() {
        let settings = LintSettings {
            use_project_runner: false,
            config_path: Some("/etc/slim-lint.yml".to_string()),
            ..json_settings()
        };
        let argv = runner().command(&settings, "a.slim");
        assert!(argv.contains(&"/etc/slim-lint.yml".to_string()));
    }

    #[test]
    fn test_parse_json_array_of_files() {
        let output = r#"[{"path":"a.slim","offenses":[
            {"line":3,"column":5,"message":"too long","linter":"LineLength","severity":"warning"}
        ]}]"#;
        let diags = parse_output(&json_settings(), output);
        assert_eq!(diags.len(), 1);
        let diag = &diags[0];
        assert_eq!(diag.range.start, Position { line: 2, character: 4 });
        assert_eq!(diag.severity, Severity::Warning);
        assert_eq!(diag.source, "LineLength");
        assert_eq!(diag.message, "too long");
    }

    #[test]
    fn test_parse_json_object_with_files_key() {
        let output = r#"{"files":[{"path":"a.slim","offenses":[
            {"line":1,"column":1,"reason":"trailing whitespace","name":"TrailingWhitespace","severity":"error"}
        ]}]}"#;
        let diags = parse_output(&json_settings(), output);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Severity::Error);
        assert_eq!(diags[0].source, "TrailingWhitespace");
        assert_eq!(diags[0].message, "trailing whitespace");
        assert_eq!(diags[0].range.start, Position { line: 0, character: 0 });
    }

    #[test]
    fn test_parse_json_singular_offense_entry() {
        let output = r#"[{"file":"a.slim","offense":
            {"line":2,"message":"bad tag","linter":"TagCase","severity":"hint"}
        }]"#;
        let diags = parse_output(&json_settings(), output);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Severity::Hint);
        // Missing column defaults to the line start.
        assert_eq!(diags[0].range.start, Position { line: 1, character: 0 });
    }

    #[test]
    fn test_parse_json_defaults_for_sparse_offense() {
        let output = r#"[{"offenses":[{}]}]"#;
        let diags = parse_output(&json_settings(), output);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "Slim-Lint offense");
        assert_eq!(diags[0].source, "slim-lint");
        assert_eq!(diags[0].severity, Severity::Warning);
        assert_eq!(diags[0].range.start, Position { line: 0, character: 0 });
    }

    #[test]
    fn test_parse_json_invalid_falls_back_to_text() {
        let output = "app/views/home.slim:4:2 [LineLength] Line is too long";
        let diags = parse_output(&json_settings(), output);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].source, "LineLength");
        assert_eq!(diags[0].range.start, Position { line: 3, character: 1 });
    }

    #[test]
    fn test_parse_text_reporter() {
        let settings = LintSettings {
            reporter: "default".to_string(),
            ..json_settings()
        };
        let output = "a.slim:10 [RuboCop] Style/Foo: avoid this\n\nnot a diagnostic line\n";
        let diags = parse_output(&settings, output);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Severity::Warning);
        assert_eq!(diags[0].source, "RuboCop");
        assert_eq!(diags[0].message, "Style/Foo: avoid this");
        // Missing column defaults to 0.
        assert_eq!(diags[0].range.start, Position { line: 9, character: 0 });
    }

    #[test]
    fn test_parse_empty_output() {
        assert!(parse_output(&json_settings(), "").is_empty());
        assert!(parse_output(&json_settings(), "  \n ").is_empty());
    }

    #[tokio::test]
    async fn test_run_disabled_is_a_no_op() {
        let mut runner = runner();
        let settings = LintSettings::default();
        assert!(!settings.enabled);
        let diags = runner.run(&settings, "a.slim", "div").await;
        assert!(diags.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_exit_failure_with_no_output_warns_once() {
        use std::os::unix::fs::PermissionsExt;

        // Stand-in linter that fails outright: non-zero exit, nothing
        // on stdout. That is the tool's own failure signal, not a
        // report of offenses.
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("broken-lint");
        std::fs::write(
            &fake,
            "#!/bin/sh\ncat > /dev/null\necho 'bundler: command not found' >&2\nexit 127\n",
        )
        .unwrap();
        std::fs::set_permissions(&fake, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mut runner = LintRunner::new(dir.path().to_path_buf());
        let settings = LintSettings {
            enabled: true,
            use_project_runner: false,
            command: fake.display().to_string(),
            ..LintSettings::default()
        };
        assert!(runner.run(&settings, "a.slim", "div").await.is_empty());
        assert!(runner.warned);
        // The warning is one-time; later runs stay quiet but degraded.
        assert!(runner.run(&settings, "a.slim", "div").await.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_exit_failure_with_offenses_still_parses() {
        use std::os::unix::fs::PermissionsExt;

        // slim-lint exits non-zero when it finds offenses; output on
        // stdout means the run itself succeeded.
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("offense-lint");
        std::fs::write(
            &fake,
            "#!/bin/sh\ncat > /dev/null\n\
             printf '[{\"path\":\"a.slim\",\"offenses\":[{\"line\":1,\"column\":1,\"message\":\"m\",\"linter\":\"L\",\"severity\":\"warning\"}]}]'\n\
             exit 1\n",
        )
        .unwrap();
        std::fs::set_permissions(&fake, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mut runner = LintRunner::new(dir.path().to_path_buf());
        let settings = LintSettings {
            enabled: true,
            use_project_runner: false,
            command: fake.display().to_string(),
            ..LintSettings::default()
        };
        let diags = runner.run(&settings, "a.slim", "div").await;
        assert_eq!(diags.len(), 1);
        assert!(!runner.warned);
    }

    #[tokio::test]
    async fn test_run_missing_tool_degrades_and_warns_once() {
        let mut runner = LintRunner::new(PathBuf::from("."));
        let settings = LintSettings {
            enabled: true,
            use_project_runner: false,
            command: "slim-lsp-no-such-lint-7af1".to_string(),
            ..LintSettings::default()
        };
        assert!(runner.run(&settings, "a.slim", "div").await.is_empty());
        assert!(runner.warned);
        assert!(runner.run(&settings, "a.slim", "div").await.is_empty());
    }
}
