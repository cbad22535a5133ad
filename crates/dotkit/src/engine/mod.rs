//! Rendering engines.
//!
//! An [`Engine`] turns DOT source text plus a desired [`Format`] into artifact
//! bytes. All engines expose the same contract and are interchangeable from
//! the dispatcher's point of view; they differ only in how they reach a
//! Graphviz implementation (subprocess, HTTP server, or in-process renderer).

pub mod command;
pub mod inprocess;
pub mod server;

pub use command::{CommandExecutor, CommandLine, CommandLineEngine, SystemCommandExecutor};
pub use inprocess::InProcessEngine;
pub use server::ServerEngine;

use crate::error::{Error, Result};
use crate::format::Format;

/// One rendering request: immutable source text plus target format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub source: String,
    pub format: Format,
}

impl RenderRequest {
    pub fn new(source: impl Into<String>, format: Format) -> Self {
        Self {
            source: source.into(),
            format,
        }
    }
}

/// A rendered artifact: raw bytes tagged with the format that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    format: Format,
    bytes: Vec<u8>,
}

impl Rendered {
    pub fn new(format: Format, bytes: Vec<u8>) -> Self {
        Self { format, bytes }
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Artifact as UTF-8 text. Errors for binary formats or invalid UTF-8.
    pub fn as_str(&self) -> Result<&str> {
        std::str::from_utf8(&self.bytes).map_err(|e| Error::Render {
            message: format!("{} output is not valid UTF-8: {e}", self.format),
        })
    }
}

/// A strategy for turning graph source text into a rendered artifact.
///
/// Implementations must be safe to share across threads; a single render call
/// is synchronous and blocking.
pub trait Engine: Send + Sync {
    fn render(&self, request: &RenderRequest) -> Result<Rendered>;
}
