//! Document persistence and on-demand retrieval.
//!
//! Writing is explicit: only a generate request persists, the parent
//! directory is created on demand, and an existing file is only replaced
//! when the caller forces it. Retrieval serves a TTL-cached document and
//! either triggers generation on a miss (when permitted) or reports that
//! nothing has been generated yet.

use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::errors::GraphError;
use crate::graph::{GraphBuilder, GraphDocument};
use crate::utils::config::GraphConfig;

#[derive(Debug, Default)]
pub struct DocumentStore {
    cache: HashMap<String, (Instant, GraphDocument)>,
}

impl DocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Persist a document as JSON, creating parent directories as needed.
    ///
    /// # Errors
    /// Returns `GraphError::OutputExists` when the file exists and `force`
    /// is not set, and `GraphError::Io` on filesystem failures.
    pub fn write(
        &self,
        document: &GraphDocument,
        path: &Path,
        force: bool,
        pretty: bool,
    ) -> Result<(), GraphError> {
        if path.exists() && !force {
            return Err(GraphError::OutputExists(path.to_path_buf()));
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, document.to_json(pretty)?)?;
        Ok(())
    }

    /// Load a previously persisted document.
    ///
    /// # Errors
    /// Returns `GraphError::Io` when the file is missing or invalid.
    pub fn load(path: &Path) -> Result<GraphDocument, GraphError> {
        let data = std::fs::read_to_string(path)?;
        GraphDocument::from_json(&data)
    }

    /// Retrieve the document: a cache hit within the TTL window returns the
    /// cached copy; a miss generates and caches when `auto_generate` is on.
    ///
    /// # Errors
    /// Returns `GraphError::NotGenerated` on a cache miss with
    /// auto-generation disabled; otherwise propagates generation failures.
    pub fn fetch(
        &mut self,
        config: &GraphConfig,
        builder: &mut GraphBuilder,
    ) -> Result<GraphDocument, GraphError> {
        let ttl = Duration::from_secs(config.result_cache_ttl);
        if let Some((at, doc)) = self.cache.get(&config.result_cache_key) {
            if at.elapsed() < ttl {
                return Ok(doc.clone());
            }
        }
        if !config.auto_generate {
            return Err(GraphError::NotGenerated);
        }
        let document = builder.generate(None, None)?;
        self.cache
            .insert(config.result_cache_key.clone(), (Instant::now(), document.clone()));
        Ok(document)
    }

    /// Drop any cached document under the configured key.
    pub fn invalidate(&mut self, key: &str) {
        self.cache.remove(key);
    }
}
