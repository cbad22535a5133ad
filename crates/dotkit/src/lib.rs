#![forbid(unsafe_code)]

//! `dotkit` renders Graphviz DOT source text through pluggable engines.
//!
//! The crate contains no layout or SVG logic of its own; every engine
//! delegates to an external Graphviz implementation:
//!
//! - [`CommandLineEngine`]: invokes a `dot`-compatible executable found on a
//!   configurable search path (the default engine choice)
//! - [`ServerEngine`]: POSTs the source to a local HTTP rendering service,
//!   optionally spawning and managing the server process
//! - [`InProcessEngine`]: wraps a caller-supplied render function (e.g. a
//!   wasm build of Graphviz)
//!
//! Engines are interchangeable behind the [`Engine`] trait; a [`Graphviz`]
//! dispatcher holds the currently installed one.
//!
//! ```no_run
//! use dotkit::{CommandLineEngine, Format, Graphviz};
//!
//! let gv = Graphviz::with_engine(CommandLineEngine::new());
//! let svg = gv.from_string("graph g {a--b}").render(Format::Svg)?;
//! println!("{}", svg.as_str()?);
//! # Ok::<(), dotkit::Error>(())
//! ```

pub mod engine;
pub mod error;
pub mod format;

pub use engine::{
    CommandExecutor, CommandLine, CommandLineEngine, Engine, InProcessEngine, RenderRequest,
    Rendered, ServerEngine, SystemCommandExecutor,
};
pub use error::{Error, Result};
pub use format::Format;

use std::sync::Arc;

/// Dispatcher holding the currently installed rendering engine.
///
/// Exactly one engine is active per dispatcher; installing a new one replaces
/// the previous one, and clearing the slot makes subsequent renders fail fast
/// with [`Error::NoEngineConfigured`]. The dispatcher is an ordinary owned
/// value, not process-global state; share it behind `Arc` (or a lock, when
/// the engine must be swapped concurrently with in-flight renders — swapping
/// is last-writer-wins and is not synchronized against renders on other
/// threads).
#[derive(Clone, Default)]
pub struct Graphviz {
    engine: Option<Arc<dyn Engine>>,
}

impl Graphviz {
    /// Dispatcher with no engine installed; `render` fails until one is set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatcher with the given engine installed.
    pub fn with_engine(engine: impl Engine + 'static) -> Self {
        Self {
            engine: Some(Arc::new(engine)),
        }
    }

    /// Installs `engine` as the active engine, or clears the slot with
    /// `None`. The instance is not validated.
    pub fn use_engine(&mut self, engine: Option<Arc<dyn Engine>>) {
        self.engine = engine;
    }

    pub fn engine(&self) -> Option<&Arc<dyn Engine>> {
        self.engine.as_ref()
    }

    /// Binds source text to this dispatcher for rendering in one or more
    /// formats.
    pub fn from_string(&self, source: impl Into<String>) -> GraphSource<'_> {
        GraphSource {
            graphviz: self,
            source: source.into(),
        }
    }

    /// Renders `source` with the active engine.
    ///
    /// Engine failures propagate untranslated; format post-processing (e.g.
    /// SVG prologue stripping) is applied to the artifact afterwards.
    pub fn render(&self, source: &str, format: Format) -> Result<Rendered> {
        let Some(engine) = &self.engine else {
            return Err(Error::NoEngineConfigured);
        };
        let request = RenderRequest::new(source, format);
        let rendered = engine.render(&request)?;
        Ok(Rendered::new(format, format.postprocess(rendered.into_bytes())))
    }
}

/// Source text bound to a dispatcher; render it in as many formats as needed.
pub struct GraphSource<'a> {
    graphviz: &'a Graphviz,
    source: String,
}

impl GraphSource<'_> {
    pub fn render(&self, format: Format) -> Result<Rendered> {
        self.graphviz.render(&self.source, format)
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

#[cfg(test)]
mod tests;
