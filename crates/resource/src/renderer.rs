//! Renderer capability and the type-tag registry.

use crate::error::{Error, Result};
use crate::set::ResourceSet;
use entrypoint::{Entrypoint, EntrypointType};
use runner::CancelToken;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Turns one entrypoint of a checked-out tree into resources.
///
/// `root` is the checkout root; implementations join the entrypoint's
/// directory onto it. A missing entrypoint path yields an empty set. The
/// same renderer is invoked concurrently for both sides of a diff, so
/// implementations must not keep per-call mutable state.
pub trait Renderer: Send + Sync {
    fn render(&self, root: &Path, entrypoint: &Entrypoint, cancel: &CancelToken) -> Result<ResourceSet>;
}

/// Maps entrypoint types to their renderer. Built once at startup.
#[derive(Clone, Default)]
pub struct RendererRegistry {
    renderers: HashMap<EntrypointType, Arc<dyn Renderer>>,
}

impl RendererRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the renderer for a type.
    pub fn register(&mut self, entrypoint_type: EntrypointType, renderer: Arc<dyn Renderer>) {
        self.renderers.insert(entrypoint_type, renderer);
    }

    pub fn with(mut self, entrypoint_type: EntrypointType, renderer: Arc<dyn Renderer>) -> Self {
        self.register(entrypoint_type, renderer);
        self
    }

    pub fn get(&self, entrypoint_type: EntrypointType) -> Result<Arc<dyn Renderer>> {
        self.renderers
            .get(&entrypoint_type)
            .cloned()
            .ok_or(Error::Unsupported(entrypoint_type))
    }

    /// Registered types, in declaration order.
    pub fn types(&self) -> Vec<EntrypointType> {
        EntrypointType::ALL
            .into_iter()
            .filter(|t| self.renderers.contains_key(t))
            .collect()
    }
}

impl std::fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RendererRegistry")
            .field("types", &self.types())
            .finish()
    }
}
