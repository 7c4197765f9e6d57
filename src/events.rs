//! Observer hooks for discovery and generation.
//!
//! The original event surface ("model discovered", "graph generated") is
//! modeled as an explicit trait the embedding application implements and
//! passes in, rather than a global event bus.

use crate::graph::GraphDocument;
use crate::model::ModelIdentifier;

/// Callbacks fired by the discoverer and the graph builder.
///
/// `model_discovered` fires once per retained identifier on every scan,
/// including scans served from cache. `graph_generated` fires exactly once
/// per successful `generate` call, before the document is returned.
pub trait GraphEvents: Send + Sync {
    fn model_discovered(&self, _model: &ModelIdentifier) {}
    fn graph_generated(&self, _document: &GraphDocument) {}
}

/// No-op observer used when the caller does not care about events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEvents;

impl GraphEvents for NullEvents {}
