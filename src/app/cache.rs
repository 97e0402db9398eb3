//! Explicit memoization of built series, for long-lived library consumers.
//!
//! Renderers that draw several charts, maps or tables from the same scope
//! hold one `SeriesCache` for the life of the process and ask it for the
//! series each time. Entries are keyed by scope and remember the config they
//! were built with; asking again with a different config rebuilds. The `covid`
//! binary builds exactly once per invocation and does not use it.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::domain::{PipelineConfig, Scope};
use crate::error::AppError;
use crate::series::BuiltSeries;

struct Entry {
    config: PipelineConfig,
    built: Arc<BuiltSeries>,
}

#[derive(Default)]
pub struct SeriesCache {
    entries: HashMap<Scope, Entry>,
}

impl SeriesCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached series for `config.scope`, building it with `build` on a miss.
    ///
    /// A failed build leaves the cache untouched.
    pub fn get_or_build<F>(&mut self, config: &PipelineConfig, build: F) -> Result<Arc<BuiltSeries>, AppError>
    where
        F: FnOnce(&PipelineConfig) -> Result<BuiltSeries, AppError>,
    {
        if let Some(entry) = self.entries.get(&config.scope) {
            if entry.config == *config {
                debug!(scope = ?config.scope, "series cache hit");
                return Ok(Arc::clone(&entry.built));
            }
            debug!(scope = ?config.scope, "config changed; rebuilding");
        }

        let built = Arc::new(build(config)?);
        self.entries.insert(
            config.scope,
            Entry {
                config: config.clone(),
                built: Arc::clone(&built),
            },
        );
        Ok(built)
    }

    /// Drop the entry for `scope`. Returns whether one was present.
    pub fn invalidate(&mut self, scope: Scope) -> bool {
        self.entries.remove(&scope).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains(&self, scope: Scope) -> bool {
        self.entries.contains_key(&scope)
    }
}
