//! Protocol engine for the Slim template language server.

pub mod codec;
pub mod config;
pub mod engine;
pub mod types;

pub(crate) mod completion;
pub(crate) mod diagnostics;
pub(crate) mod documents;
pub(crate) mod format;
pub(crate) mod lint;
pub(crate) mod protocol;
pub(crate) mod tool;

mod session;

pub use engine::{EngineError, SlimCompiler, SyntaxEngine};
pub use session::Session;
pub use tool::ToolError;
