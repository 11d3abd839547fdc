//! Boundary to the Slim parsing engine.
//!
//! The engine is consulted for pass/fail plus an error message; its
//! internals are not our business. [`SyntaxEngine`] is the seam — the
//! session owns a boxed engine, and tests substitute stubs.

use std::io::Write;
use std::process::Stdio;

use thiserror::Error;

/// A syntax failure reported by the engine. The message text is all we
/// get; source locations are fished out of it downstream.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct EngineError {
    pub message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Pass/fail syntax check over the full document text.
pub trait SyntaxEngine {
    fn check(&mut self, text: &str) -> Result<(), EngineError>;
}

/// Production engine: shells out to the Slim compiler CLI.
///
/// `slimrb --compile` reads the template on stdin and reports parse
/// failures on stderr with `Line N` / `Column N` in the message. An
/// unavailable compiler degrades to "no syntax diagnostics" with a
/// one-time warning; it must not flag every document as broken.
pub struct SlimCompiler {
    command: String,
    warned: bool,
}

impl SlimCompiler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            command: "slimrb".to_string(),
            warned: false,
        }
    }

    fn warn_once(&mut self, detail: &str) {
        if self.warned {
            return;
        }
        self.warned = true;
        tracing::warn!("syntax checking unavailable: {detail}");
    }
}

impl Default for SlimCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntaxEngine for SlimCompiler {
    fn check(&mut self, text: &str) -> Result<(), EngineError> {
        let Ok(resolved) = which::which(&self.command) else {
            self.warn_once(&format!("{} not found in PATH", self.command));
            return Ok(());
        };

        let spawned = std::process::Command::new(resolved)
            .arg("--compile")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn();
        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                self.warn_once(&format!("failed to spawn {}: {e}", self.command));
                return Ok(());
            }
        };

        // Write stdin from a separate thread so a compiler flooding
        // stderr cannot deadlock against a full stdin pipe. A broken
        // pipe means the compiler bailed early; the exit status below
        // tells the real story.
        let stdin = child.stdin.take();
        let text = text.to_owned();
        let writer = std::thread::spawn(move || {
            if let Some(mut stdin) = stdin {
                let _ = stdin.write_all(text.as_bytes());
            }
        });

        let waited = child.wait_with_output();
        let _ = writer.join();

        match waited {
            Ok(output) if output.status.success() => Ok(()),
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let message = stderr.trim();
                Err(EngineError::new(if message.is_empty() {
                    "Slim template failed to compile"
                } else {
                    message
                }))
            }
            Err(e) => {
                self.warn_once(&format!("{} did not run: {e}", self.command));
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_displays_message() {
        let err = EngineError::new("Slim::Parser::SyntaxError: Unexpected indentation, Line 3");
        assert!(err.to_string().contains("Line 3"));
    }

    #[cfg(unix)]
    #[test]
    fn test_compiler_flooding_stderr_does_not_block() {
        use std::os::unix::fs::PermissionsExt;

        // Stand-in compiler that fills its stderr pipe before reading
        // any stdin, then fails with a locatable message.
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("noisy-compiler");
        std::fs::write(
            &fake,
            "#!/bin/sh\n\
             dd if=/dev/zero bs=1024 count=1024 2>/dev/null >&2\n\
             cat > /dev/null\n\
             echo 'Unexpected indentation, Line 2' >&2\n\
             exit 1\n",
        )
        .unwrap();
        std::fs::set_permissions(&fake, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mut engine = SlimCompiler {
            command: fake.display().to_string(),
            warned: false,
        };
        let text = "x".repeat(1024 * 1024);
        let err = engine.check(&text).unwrap_err();
        assert!(err.message.contains("Line 2"));
    }

    #[test]
    fn test_missing_compiler_degrades_to_pass() {
        let mut engine = SlimCompiler {
            command: "slim-lsp-no-such-compiler-9c2a".to_string(),
            warned: false,
        };
        assert!(engine.check("div\n  = broken").is_ok());
        assert!(engine.warned);
        // Second check stays silent but still passes.
        assert!(engine.check("div").is_ok());
    }
}
