//! Keyed pipeline cache
//!
//! Shares one compiled procedure between call sites. The cache is an ordinary
//! value: create it where the application starts, pass it by reference, drop it
//! at shutdown. Entries are never evicted or replaced.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::pipeline::{IntoProcedure, Pipeline, SharedProcedure, Source};

type Entry = Box<dyn Any + Send + Sync>;

/// Key to procedure registry
#[derive(Default)]
pub struct PipelineCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl PipelineCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the procedure registered under `key`, declaring and compiling it
    /// on first use.
    ///
    /// `declare` receives a fresh builder and runs only on a miss; on a hit the
    /// new declaration is ignored and the original procedure is returned. Lookup
    /// and insertion happen under one lock, so concurrent first calls register
    /// exactly one procedure. `declare` must not call back into this cache.
    ///
    /// A failed compilation registers nothing.
    pub fn obtain<T, C, B, F>(
        &self,
        key: &str,
        declare: F,
    ) -> Result<SharedProcedure<T, C, B::Output>>
    where
        T: 'static,
        C: 'static,
        F: FnOnce(Pipeline<Source<T>, C>) -> B,
        B: IntoProcedure<T, C>,
        B::Output: 'static,
    {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(entry) = entries.get(key) {
            debug!(key, "pipeline cache hit");
            return entry
                .downcast_ref::<SharedProcedure<T, C, B::Output>>()
                .cloned()
                .ok_or_else(|| PipelineError::CacheTypeMismatch { key: key.to_string() });
        }

        let procedure = declare(Pipeline::new()).into_procedure()?;
        debug!(key, stages = %procedure.plan().queue, "pipeline cache registered procedure");
        entries.insert(key.to_string(), Box::new(Arc::clone(&procedure)));
        Ok(procedure)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    /// Number of registered procedures
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
