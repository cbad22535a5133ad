//! In-process engine: adapter over a caller-supplied render function.
//!
//! This is the seam for renderers that live inside the host process, such as
//! wasm or JS builds of Graphviz driven through an embedded interpreter. The
//! adapter keeps the engine contract uniform: closure failures come back as
//! ordinary [`Error`] values, and panics are caught at the engine boundary
//! instead of unwinding into the caller.

use std::panic::AssertUnwindSafe;

use crate::engine::{Engine, RenderRequest, Rendered};
use crate::error::{Error, Result};

pub struct InProcessEngine {
    render_fn: Box<dyn Fn(&RenderRequest) -> Result<Rendered> + Send + Sync>,
}

impl InProcessEngine {
    pub fn from_fn<F>(render_fn: F) -> Self
    where
        F: Fn(&RenderRequest) -> Result<Rendered> + Send + Sync + 'static,
    {
        Self {
            render_fn: Box::new(render_fn),
        }
    }
}

impl Engine for InProcessEngine {
    fn render(&self, request: &RenderRequest) -> Result<Rendered> {
        std::panic::catch_unwind(AssertUnwindSafe(|| (self.render_fn)(request))).unwrap_or_else(
            |_| {
                Err(Error::Render {
                    message: "in-process renderer panicked".to_string(),
                })
            },
        )
    }
}
