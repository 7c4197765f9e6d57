//! Schema descriptors and the inspector.
//!
//! The inspector resolves a model's backing table and asks a pluggable
//! `SchemaBackend` for column, index, and foreign-key metadata. Every
//! backend failure is absorbed into an empty result; schema inspection is
//! best-effort by contract.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::GraphError;
use crate::model::{ModelIdentifier, ModelRegistry};
use crate::utils::config::GraphConfig;
use crate::utils::inflect;

pub mod ddl;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexDescriptor {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default)]
    pub indexes: Vec<IndexDescriptor>,
}

impl ColumnDescriptor {
    pub fn new(name: &str, data_type: &str) -> Self {
        Self {
            name: name.to_string(),
            data_type: data_type.to_string(),
            nullable: true,
            default: None,
            indexes: Vec::new(),
        }
    }

    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: &str) -> Self {
        self.default = Some(value.to_string());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ForeignKeyDescriptor {
    pub name: String,
    pub columns: Vec<String>,
    pub foreign_table: String,
    pub foreign_columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_update: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<String>,
}

/// Per-table metadata as a backend stores it. Column descriptors here carry
/// no attached indexes; the inspector attaches them per column.
#[derive(Debug, Clone, Default)]
pub struct TableSchema {
    pub columns: Vec<ColumnDescriptor>,
    pub indexes: Vec<IndexDescriptor>,
    pub foreign_keys: Vec<ForeignKeyDescriptor>,
}

/// Source of table metadata. Implementations may be backed by a live
/// connection, a DDL dump (`ddl::DdlSchema`), or in-memory registration
/// (`StaticSchema`).
pub trait SchemaBackend: Send + Sync {
    /// # Errors
    /// Backend-specific lookup failures.
    fn table_exists(&self, table: &str) -> Result<bool, GraphError>;
    /// # Errors
    /// Backend-specific lookup failures.
    fn columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>, GraphError>;
    /// # Errors
    /// Backend-specific lookup failures.
    fn indexes(&self, table: &str) -> Result<Vec<IndexDescriptor>, GraphError>;
    /// # Errors
    /// Backend-specific lookup failures.
    fn foreign_keys(&self, table: &str) -> Result<Vec<ForeignKeyDescriptor>, GraphError>;
}

/// In-memory backend populated by the embedding application or by tests.
#[derive(Debug, Default)]
pub struct StaticSchema {
    tables: HashMap<String, TableSchema>,
}

impl StaticSchema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table(&mut self, name: &str, schema: TableSchema) {
        self.tables.insert(name.to_string(), schema);
    }
}

impl SchemaBackend for StaticSchema {
    fn table_exists(&self, table: &str) -> Result<bool, GraphError> {
        Ok(self.tables.contains_key(table))
    }

    fn columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>, GraphError> {
        Ok(self.tables.get(table).map(|t| t.columns.clone()).unwrap_or_default())
    }

    fn indexes(&self, table: &str) -> Result<Vec<IndexDescriptor>, GraphError> {
        Ok(self.tables.get(table).map(|t| t.indexes.clone()).unwrap_or_default())
    }

    fn foreign_keys(&self, table: &str) -> Result<Vec<ForeignKeyDescriptor>, GraphError> {
        Ok(self.tables.get(table).map(|t| t.foreign_keys.clone()).unwrap_or_default())
    }
}

/// Result of inspecting one model. `fillable` is populated independently of
/// schema availability.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct SchemaInfo {
    pub columns: Vec<ColumnDescriptor>,
    pub foreign_keys: Vec<ForeignKeyDescriptor>,
    pub fillable: Vec<String>,
}

pub struct SchemaInspector {
    enabled: bool,
    fake: bool,
    backend: Option<Box<dyn SchemaBackend>>,
}

impl SchemaInspector {
    #[must_use]
    pub fn new(config: &GraphConfig, backend: Option<Box<dyn SchemaBackend>>) -> Self {
        Self { enabled: config.schema_inspection, fake: config.fake_schema, backend }
    }

    /// Backing table for a model: the declared table or the conventional
    /// snake-cased, pluralized short name.
    #[must_use]
    pub fn table_for(registry: &ModelRegistry, model: &ModelIdentifier) -> String {
        registry
            .get(model)
            .and_then(|d| d.table.clone())
            .unwrap_or_else(|| inflect::table_name(model.short_name()))
    }

    /// Inspect the model's backing table. Disabled inspection, fake-schema
    /// mode, a missing table, a missing backend, and backend errors all
    /// produce the empty shape; this never fails.
    #[must_use]
    pub fn inspect(&self, registry: &ModelRegistry, model: &ModelIdentifier) -> SchemaInfo {
        let fillable = registry.get(model).map(|d| d.fillable.clone()).unwrap_or_default();
        let mut info = SchemaInfo { fillable, ..SchemaInfo::default() };

        if !self.enabled || self.fake {
            return info;
        }
        let Some(backend) = &self.backend else {
            return info;
        };

        let table = Self::table_for(registry, model);
        match self.inspect_table(backend.as_ref(), &table) {
            Ok(Some((columns, foreign_keys))) => {
                info.columns = columns;
                info.foreign_keys = foreign_keys;
            }
            // Missing table and backend failures both degrade to empty.
            Ok(None) | Err(_) => {}
        }
        info
    }

    #[allow(clippy::type_complexity)]
    fn inspect_table(
        &self,
        backend: &dyn SchemaBackend,
        table: &str,
    ) -> Result<Option<(Vec<ColumnDescriptor>, Vec<ForeignKeyDescriptor>)>, GraphError> {
        if !backend.table_exists(table)? {
            return Ok(None);
        }
        let mut columns = backend.columns(table)?;
        let indexes = backend.indexes(table)?;
        let foreign_keys = backend.foreign_keys(table)?;

        // An index attaches to every column its column list names.
        for col in &mut columns {
            col.indexes =
                indexes.iter().filter(|ix| ix.columns.contains(&col.name)).cloned().collect();
        }
        Ok(Some((columns, foreign_keys)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelDefinition;

    fn users_table() -> TableSchema {
        TableSchema {
            columns: vec![
                ColumnDescriptor::new("id", "bigint").not_null(),
                ColumnDescriptor::new("email", "varchar(255)").not_null(),
                ColumnDescriptor::new("bio", "text"),
            ],
            indexes: vec![
                IndexDescriptor { name: "primary".into(), columns: vec!["id".into()], unique: true },
                IndexDescriptor {
                    name: "users_email_unique".into(),
                    columns: vec!["email".into()],
                    unique: true,
                },
            ],
            foreign_keys: vec![],
        }
    }

    fn registry() -> ModelRegistry {
        let mut reg = ModelRegistry::new();
        reg.register(
            ModelDefinition::new("app::models::User").table("users").fillable(&["email", "bio"]),
        );
        reg.register(ModelDefinition::new("app::models::BlogPost"));
        reg
    }

    fn backend() -> Box<dyn SchemaBackend> {
        let mut schema = StaticSchema::new();
        schema.add_table("users", users_table());
        Box::new(schema)
    }

    #[test]
    fn table_resolution_prefers_declared_then_convention() {
        let reg = registry();
        assert_eq!(
            SchemaInspector::table_for(&reg, &ModelIdentifier::from("app::models::User")),
            "users"
        );
        assert_eq!(
            SchemaInspector::table_for(&reg, &ModelIdentifier::from("app::models::BlogPost")),
            "blog_posts"
        );
    }

    #[test]
    fn inspect_attaches_covering_indexes_per_column() {
        let reg = registry();
        let inspector = SchemaInspector::new(&GraphConfig::default(), Some(backend()));
        let info = inspector.inspect(&reg, &ModelIdentifier::from("app::models::User"));
        assert_eq!(info.columns.len(), 3);
        let id = info.columns.iter().find(|c| c.name == "id").unwrap();
        assert_eq!(id.indexes.len(), 1);
        assert!(id.indexes[0].unique);
        let bio = info.columns.iter().find(|c| c.name == "bio").unwrap();
        assert!(bio.indexes.is_empty());
        assert_eq!(info.fillable, vec!["email", "bio"]);
    }

    #[test]
    fn disabled_and_fake_modes_return_empty_even_when_table_exists() {
        let reg = registry();
        let user = ModelIdentifier::from("app::models::User");

        let mut cfg = GraphConfig::default();
        cfg.schema_inspection = false;
        let inspector = SchemaInspector::new(&cfg, Some(backend()));
        let info = inspector.inspect(&reg, &user);
        assert!(info.columns.is_empty());
        assert!(info.foreign_keys.is_empty());
        // fillable survives regardless
        assert_eq!(info.fillable, vec!["email", "bio"]);

        let mut cfg = GraphConfig::default();
        cfg.fake_schema = true;
        let inspector = SchemaInspector::new(&cfg, Some(backend()));
        assert!(inspector.inspect(&reg, &user).columns.is_empty());
    }

    #[test]
    fn missing_table_and_failing_backend_degrade_to_empty() {
        struct FailingBackend;
        impl SchemaBackend for FailingBackend {
            fn table_exists(&self, _: &str) -> Result<bool, GraphError> {
                Err(GraphError::Schema("connection refused".into()))
            }
            fn columns(&self, _: &str) -> Result<Vec<ColumnDescriptor>, GraphError> {
                Err(GraphError::Schema("connection refused".into()))
            }
            fn indexes(&self, _: &str) -> Result<Vec<IndexDescriptor>, GraphError> {
                Err(GraphError::Schema("connection refused".into()))
            }
            fn foreign_keys(&self, _: &str) -> Result<Vec<ForeignKeyDescriptor>, GraphError> {
                Err(GraphError::Schema("connection refused".into()))
            }
        }

        let reg = registry();
        let cfg = GraphConfig::default();

        // table missing from the backend
        let inspector = SchemaInspector::new(&cfg, Some(backend()));
        let info = inspector.inspect(&reg, &ModelIdentifier::from("app::models::BlogPost"));
        assert!(info.columns.is_empty());

        // backend errors are absorbed, not raised
        let inspector = SchemaInspector::new(&cfg, Some(Box::new(FailingBackend)));
        let info = inspector.inspect(&reg, &ModelIdentifier::from("app::models::User"));
        assert!(info.columns.is_empty());
        assert_eq!(info.fillable, vec!["email", "bio"]);
    }
}
