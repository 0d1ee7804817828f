use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use parking_lot::Mutex;
use tracing::{info, instrument};

use crate::engine::Engine;

/// Opaque ticket for one registered engine. Handles are never reused within
/// a registry's lifetime, so a stale handle resolves to nothing instead of a
/// different engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineHandle(u64);

/// Owns a set of engines behind stable handles, for hosts that address
/// engines by value rather than by reference (FFI layers, multi-project
/// shells). Plain caller-owned state: there is no global registry.
#[derive(Default)]
pub struct EngineRegistry {
    engines: Mutex<HashMap<u64, Arc<Engine>>>,
    next_handle: AtomicU64,
}

impl EngineRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[instrument(skip_all)]
    pub fn register(&self, engine: Engine) -> EngineHandle {
        let handle = self.next_handle.fetch_add(1, Ordering::Relaxed) + 1;
        self.engines.lock().insert(handle, Arc::new(engine));
        info!(handle, "engine registered");
        EngineHandle(handle)
    }

    #[must_use]
    pub fn get(&self, handle: EngineHandle) -> Option<Arc<Engine>> {
        self.engines.lock().get(&handle.0).cloned()
    }

    /// Shuts the engine down and drops it. Returns false for a handle that
    /// was never registered or was already destroyed.
    #[instrument(skip(self), fields(handle = handle.0))]
    pub fn destroy(&self, handle: EngineHandle) -> bool {
        let removed = self.engines.lock().remove(&handle.0);
        match removed {
            Some(engine) => {
                engine.shutdown();
                info!("engine destroyed");
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.engines.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.engines.lock().is_empty()
    }
}
