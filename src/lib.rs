//! model-relations-graph — Model Schema/Relationship Graph Builder
//!
//! Discover an application's model types, inspect their database schema,
//! resolve their declared associations, and assemble a directed graph of
//! models and relationships with bounded-depth cycle detection.
//!
//! # Features
//! - Pluggable model discovery (static registry or directory scan) with a
//!   TTL cache and per-model notifications
//! - Schema inspection over pluggable backends (in-memory, SQL DDL dump),
//!   best-effort by contract
//! - Two-tier relationship resolution: static declarations first, runtime
//!   probes second, memoized per model
//! - Versioned JSON `GraphDocument` with warnings, loop membership, and
//!   per-node loop severity
//!
//! # Quickstart (Library)
//! ```no_run
//! use std::sync::Arc;
//! use model_relations_graph::discover::RegistrySource;
//! use model_relations_graph::events::NullEvents;
//! use model_relations_graph::graph::GraphBuilder;
//! use model_relations_graph::model::{ModelDefinition, ModelRegistry, Relation};
//! use model_relations_graph::utils::config::GraphConfig;
//!
//! let mut registry = ModelRegistry::new();
//! registry.register(
//!     ModelDefinition::new("app::models::User")
//!         .table("users")
//!         .relation("posts", Relation::one_to_many("app::models::Post", "user_id", "id")),
//! );
//! registry.register(
//!     ModelDefinition::new("app::models::Post")
//!         .relation("author", Relation::many_to_one("app::models::User", "user_id", "id")),
//! );
//!
//! let mut builder = GraphBuilder::new(
//!     GraphConfig::default(),
//!     Arc::new(registry),
//!     Box::new(RegistrySource),
//!     None,
//!     Arc::new(NullEvents),
//! );
//! let document = builder.generate(None, None).expect("generate graph");
//! println!("models: {} loops: {}", document.total_models, document.loops.len());
//! ```
//!
//! # Quickstart (CLI)
//! ```text
//! model-relations-graph generate --manifest models.toml --schema schema.sql \
//!     --output graph.json --pretty --force
//! ```
pub mod app;
pub mod cli;
pub mod discover;
pub mod errors;
pub mod events;
pub mod graph;
pub mod model;
pub mod relations;
pub mod schema;
pub mod store;
pub mod utils;
