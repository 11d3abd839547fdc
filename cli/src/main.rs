//! slim-lsp binary entry point.
//!
//! Wires the session to stdin/stdout and routes all logging to stderr —
//! stdout carries protocol frames and must stay clean.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use slim_lsp_core::{Session, SlimCompiler};

fn init_tracing() {
    let env_filter = EnvFilter::try_from_env("SLIM_LSP_LOG")
        .or_else(|_| EnvFilter::try_new("warn"))
        .unwrap_or_else(|_| EnvFilter::try_new("error").expect("error filter is valid"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "slim-lsp starting");

    let mut session = Session::new(Box::new(SlimCompiler::new()));
    session.run(tokio::io::stdin(), tokio::io::stdout()).await
}
