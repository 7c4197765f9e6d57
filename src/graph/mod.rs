//! Graph model and builder.
//!
//! `GraphBuilder` orchestrates discovery, schema inspection, and
//! relationship resolution over the full model set, then runs bounded-depth
//! cycle detection and emits a versioned `GraphDocument` — the sole
//! exported artifact. Per-model failures degrade to warnings; the run
//! continues.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::discover::{Discoverer, ModelSource};
use crate::errors::GraphError;
use crate::events::GraphEvents;
use crate::model::{ModelIdentifier, ModelRegistry, RelationKind};
use crate::relations::{RelationshipDescriptor, RelationshipMap, RelationshipResolver};
use crate::schema::{ColumnDescriptor, SchemaBackend, SchemaInfo, SchemaInspector};
use crate::utils::config::GraphConfig;

pub mod cycles;

/// Version marker stamped into every generated document.
pub const DOCUMENT_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Incoming,
    Outgoing,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Cardinality {
    #[serde(rename = "one-to-one")]
    OneToOne,
    #[serde(rename = "one-to-many")]
    OneToMany,
    #[serde(rename = "many-to-one")]
    ManyToOne,
    #[serde(rename = "many-to-many")]
    ManyToMany,
    #[serde(rename = "unknown")]
    Unknown,
}

/// Fixed lookup from relationship kind to edge direction and cardinality.
#[must_use]
pub fn edge_shape(kind: RelationKind) -> (Direction, Cardinality) {
    match kind {
        RelationKind::ManyToOne | RelationKind::PolymorphicToOne => {
            (Direction::Incoming, Cardinality::ManyToOne)
        }
        RelationKind::OneToOne
        | RelationKind::PolymorphicOneToOne
        | RelationKind::OneToOneThrough => (Direction::Outgoing, Cardinality::OneToOne),
        RelationKind::OneToMany
        | RelationKind::PolymorphicOneToMany
        | RelationKind::OneToManyThrough => (Direction::Outgoing, Cardinality::OneToMany),
        RelationKind::ManyToMany | RelationKind::PolymorphicManyToMany => {
            (Direction::Outgoing, Cardinality::ManyToMany)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphNode {
    pub id: ModelIdentifier,
    pub short_name: String,
    pub table: String,
    pub columns: Vec<ColumnDescriptor>,
    pub fillable: Vec<String>,
    pub relationship_count: usize,
    pub in_loops: bool,
    pub loop_severity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphEdge {
    pub id: String,
    pub source: ModelIdentifier,
    pub target: ModelIdentifier,
    pub kind: RelationKind,
    pub label: String,
    pub direction: Direction,
    pub cardinality: Cardinality,
    pub metadata: RelationshipDescriptor,
}

/// One relationship cycle, in discovered path order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Loop(pub Vec<ModelIdentifier>);

/// The versioned, immutable artifact a generate run produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphDocument {
    pub version: String,
    pub generated_at: String,
    pub total_models: usize,
    pub total_relationships: usize,
    pub warnings: Vec<String>,
    pub models: Vec<GraphNode>,
    pub relationships: Vec<GraphEdge>,
    pub loops: Vec<Loop>,
}

impl GraphDocument {
    /// Serialize to JSON.
    ///
    /// # Errors
    /// Returns `GraphError::Io` if serialization fails.
    pub fn to_json(&self, pretty: bool) -> Result<String, GraphError> {
        let result = if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };
        result.map_err(|e| GraphError::Io(std::io::Error::other(e.to_string())))
    }

    /// Deserialize from JSON.
    ///
    /// # Errors
    /// Returns `GraphError::Io` if the JSON is invalid.
    pub fn from_json(data: &str) -> Result<Self, GraphError> {
        serde_json::from_str(data).map_err(|e| GraphError::Io(std::io::Error::other(e.to_string())))
    }
}

/// Schema-inspection seam used by the builder. The default implementation is
/// `SchemaInspector`; alternative backends (or tests) may fail, and the
/// builder downgrades those failures to warnings.
pub trait Inspector: Send {
    /// # Errors
    /// Implementation-specific inspection failures.
    fn inspect(
        &self,
        registry: &ModelRegistry,
        model: &ModelIdentifier,
    ) -> Result<SchemaInfo, GraphError>;
}

impl Inspector for SchemaInspector {
    fn inspect(
        &self,
        registry: &ModelRegistry,
        model: &ModelIdentifier,
    ) -> Result<SchemaInfo, GraphError> {
        Ok(SchemaInspector::inspect(self, registry, model))
    }
}

/// Relationship-resolution seam used by the builder.
pub trait Resolver: Send {
    /// # Errors
    /// Implementation-specific resolution failures.
    fn resolve(
        &mut self,
        registry: &ModelRegistry,
        model: &ModelIdentifier,
    ) -> Result<RelationshipMap, GraphError>;
}

impl Resolver for RelationshipResolver {
    fn resolve(
        &mut self,
        registry: &ModelRegistry,
        model: &ModelIdentifier,
    ) -> Result<RelationshipMap, GraphError> {
        Ok(RelationshipResolver::resolve(self, registry, model).clone())
    }
}

/// Progress callback: model just processed, 1-based position, total count.
pub type ProgressFn<'a> = &'a mut dyn FnMut(&ModelIdentifier, usize, usize);

pub struct GraphBuilder {
    config: GraphConfig,
    registry: Arc<ModelRegistry>,
    discoverer: Discoverer,
    inspector: Box<dyn Inspector>,
    resolver: Box<dyn Resolver>,
    events: Arc<dyn GraphEvents>,
}

impl GraphBuilder {
    #[must_use]
    pub fn new(
        config: GraphConfig,
        registry: Arc<ModelRegistry>,
        source: Box<dyn ModelSource>,
        backend: Option<Box<dyn SchemaBackend>>,
        events: Arc<dyn GraphEvents>,
    ) -> Self {
        let discoverer = Discoverer::new(&config, source, Arc::clone(&events));
        let inspector = Box::new(SchemaInspector::new(&config, backend));
        Self {
            config,
            registry,
            discoverer,
            inspector,
            resolver: Box::new(RelationshipResolver::new()),
            events,
        }
    }

    /// Replace the inspection and resolution components. Primarily a test
    /// seam, also the hook for alternative inspector implementations.
    #[must_use]
    pub fn with_components(
        mut self,
        inspector: Box<dyn Inspector>,
        resolver: Box<dyn Resolver>,
    ) -> Self {
        self.inspector = inspector;
        self.resolver = resolver;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Generate the graph document over `models` (or the discoverer's full
    /// list when omitted). Per-model inspection/resolution failures are
    /// recorded as warnings and never abort the run.
    ///
    /// # Errors
    /// Only non-model failure categories propagate (configuration and
    /// environment errors); per-model failures become document warnings.
    pub fn generate(
        &mut self,
        models: Option<&[ModelIdentifier]>,
        mut on_progress: Option<ProgressFn<'_>>,
    ) -> Result<GraphDocument, GraphError> {
        let models: Vec<ModelIdentifier> = match models {
            Some(list) => list.to_vec(),
            None => self.discoverer.scan(&self.registry),
        };

        let total = models.len();
        let mut warnings: Vec<String> = Vec::new();
        let mut nodes: Vec<GraphNode> = Vec::with_capacity(total);
        let mut edges: Vec<GraphEdge> = Vec::new();

        for (position, model) in models.iter().enumerate() {
            let info = self.inspector.inspect(&self.registry, model).unwrap_or_else(|e| {
                warnings.push(format!("Error inspecting {model}: {e}"));
                SchemaInfo::default()
            });
            let relationships = self.resolver.resolve(&self.registry, model).unwrap_or_else(|e| {
                warnings.push(format!("Error resolving {model}: {e}"));
                RelationshipMap::new()
            });

            if let Some(cb) = on_progress.as_deref_mut() {
                cb(model, position + 1, total);
            }

            for (name, descriptor) in &relationships {
                let Some(target) = &descriptor.target_model else {
                    // Unresolvable (polymorphic "to") targets yield no edge.
                    continue;
                };
                let (direction, cardinality) = edge_shape(descriptor.kind);
                edges.push(GraphEdge {
                    id: format!("{model}->{target}:{name}"),
                    source: model.clone(),
                    target: target.clone(),
                    kind: descriptor.kind,
                    label: name.clone(),
                    direction,
                    cardinality,
                    metadata: descriptor.clone(),
                });
            }

            nodes.push(GraphNode {
                id: model.clone(),
                short_name: model.short_name().to_string(),
                table: SchemaInspector::table_for(&self.registry, model),
                columns: info.columns,
                fillable: info.fillable,
                relationship_count: relationships.len(),
                in_loops: false,
                loop_severity: 0,
            });
        }

        let loops = cycles::detect(&nodes, &edges, self.config.max_depth);
        cycles::annotate(&mut nodes, &loops);

        let generated_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or_else(|_| "0".to_string(), |d| d.as_secs().to_string());

        let document = GraphDocument {
            version: DOCUMENT_VERSION.to_string(),
            generated_at,
            total_models: nodes.len(),
            total_relationships: edges.len(),
            warnings,
            models: nodes,
            relationships: edges,
            loops,
        };

        self.events.graph_generated(&document);
        Ok(document)
    }
}
