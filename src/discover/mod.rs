//! Model discovery.
//!
//! Discovery is a pluggable strategy behind `ModelSource`: the preferred
//! `RegistrySource` simply lists registered concrete models, while
//! `DirectoryScanSource` walks source roots and statically extracts
//! declared identifiers, validating each against the registry. The
//! `Discoverer` wraps a source with dedup, deny/allow filtering, a TTL
//! cache, and the "model discovered" notification.

use regex::Regex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::events::GraphEvents;
use crate::model::{ModelIdentifier, ModelRegistry};
use crate::utils::config::GraphConfig;

/// Strategy producing candidate model identifiers.
pub trait ModelSource: Send {
    fn scan(&self, registry: &ModelRegistry) -> Vec<ModelIdentifier>;
}

/// Preferred strategy: every registered non-abstract model.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegistrySource;

impl ModelSource for RegistrySource {
    fn scan(&self, registry: &ModelRegistry) -> Vec<ModelIdentifier> {
        registry.concrete_identifiers()
    }
}

#[derive(Debug)]
struct ScanPatterns {
    namespace: Regex,
    type_decl: Regex,
}

impl ScanPatterns {
    fn compile() -> Self {
        // Accept both `namespace App\Models;` and `namespace app::models;`.
        let namespace =
            Regex::new(r"(?m)^\s*namespace\s+(?P<ns>[A-Za-z_][A-Za-z0-9_\\:]*)\s*;").unwrap();
        let type_decl = Regex::new(
            r"(?m)^\s*(?:abstract\s+)?(?:final\s+)?(?:pub\s+)?(?:class|struct)\s+(?P<name>[A-Za-z_][A-Za-z0-9_]*)",
        )
        .unwrap();
        Self { namespace, type_decl }
    }
}

/// File-walk strategy: extract the declared namespace and the first declared
/// type name from each source file, without loading anything, and keep the
/// identifier only if it resolves to a registered concrete model.
pub struct DirectoryScanSource {
    roots: Vec<PathBuf>,
    patterns: ScanPatterns,
}

impl DirectoryScanSource {
    #[must_use]
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots, patterns: ScanPatterns::compile() }
    }

    #[must_use]
    pub fn from_config(config: &GraphConfig) -> Self {
        Self::new(config.model_paths.clone())
    }

    /// Static extraction of `namespace::TypeName` from file content. Returns
    /// `None` when no namespace or no type declaration is present.
    #[must_use]
    pub fn extract_identifier(&self, content: &str) -> Option<ModelIdentifier> {
        let ns = self.patterns.namespace.captures(content)?["ns"].replace('\\', "::");
        let name = &self.patterns.type_decl.captures(content)?["name"];
        Some(ModelIdentifier::new(format!("{ns}::{name}")))
    }

    fn source_files(root: &std::path::Path) -> Vec<PathBuf> {
        let mut out = Vec::new();
        let mut walker = ignore::WalkBuilder::new(root);
        // Deterministic walk: honor local ignore files, never global excludes.
        walker.follow_links(false).git_ignore(true).git_global(false).git_exclude(false);
        for entry in walker.build().flatten() {
            if entry.file_type().is_some_and(|t| t.is_file()) {
                out.push(entry.path().to_path_buf());
            }
        }
        out.sort();
        out
    }
}

impl ModelSource for DirectoryScanSource {
    fn scan(&self, registry: &ModelRegistry) -> Vec<ModelIdentifier> {
        let mut out = Vec::new();
        for root in &self.roots {
            // A missing root contributes nothing; it is not an error.
            if !root.is_dir() {
                continue;
            }
            for file in Self::source_files(root) {
                let Ok(content) = std::fs::read_to_string(&file) else {
                    continue;
                };
                let Some(id) = self.extract_identifier(&content) else {
                    continue;
                };
                // Identifier must resolve to a registered, concrete model.
                if registry.get(&id).is_some_and(|d| !d.is_abstract) {
                    out.push(id);
                }
            }
        }
        out
    }
}

/// Wraps a `ModelSource` with deny/allow filtering, a TTL cache, and
/// discovery notifications.
pub struct Discoverer {
    source: Box<dyn ModelSource>,
    only: Vec<String>,
    exclude: Vec<String>,
    cache_ttl: Duration,
    cached: Option<(Instant, Vec<ModelIdentifier>)>,
    events: Arc<dyn GraphEvents>,
}

impl Discoverer {
    #[must_use]
    pub fn new(config: &GraphConfig, source: Box<dyn ModelSource>, events: Arc<dyn GraphEvents>) -> Self {
        Self {
            source,
            only: config.only_models.clone(),
            exclude: config.exclude_models.clone(),
            cache_ttl: Duration::from_secs(config.discovery_cache_ttl),
            cached: None,
            events,
        }
    }

    /// Discover model identifiers: deduplicated, deny list applied, then
    /// allow list (when non-empty). Served from cache within the TTL window.
    /// One `model_discovered` notification fires per retained identifier on
    /// every call, cache hits included.
    pub fn scan(&mut self, registry: &ModelRegistry) -> Vec<ModelIdentifier> {
        let models = match &self.cached {
            Some((at, list)) if at.elapsed() < self.cache_ttl => list.clone(),
            _ => {
                let fresh = self.scan_uncached(registry);
                if !self.cache_ttl.is_zero() {
                    self.cached = Some((Instant::now(), fresh.clone()));
                }
                fresh
            }
        };
        for id in &models {
            self.events.model_discovered(id);
        }
        models
    }

    /// Drop any cached scan result.
    pub fn clear_cache(&mut self) {
        self.cached = None;
    }

    fn scan_uncached(&self, registry: &ModelRegistry) -> Vec<ModelIdentifier> {
        let raw = self.source.scan(registry);
        let mut seen = std::collections::HashSet::new();
        raw.into_iter()
            .filter(|id| seen.insert(id.clone()))
            .filter(|id| !self.exclude.iter().any(|e| e == id.as_str()))
            .filter(|id| self.only.is_empty() || self.only.iter().any(|o| o == id.as_str()))
            .collect()
    }
}
