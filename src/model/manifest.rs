//! TOML manifest loading for the CLI.
//!
//! A manifest is the data-only form of a registry: model names, tables,
//! fillable lists, and statically declared relations. Probe members are a
//! programmatic-registry feature and cannot be expressed here.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::errors::GraphError;
use crate::model::{
    ModelDefinition, ModelIdentifier, ModelRegistry, Relation, RelationKeys, RelationKind,
};

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    models: Vec<ManifestModel>,
}

#[derive(Debug, Deserialize)]
struct ManifestModel {
    name: String,
    table: Option<String>,
    #[serde(default)]
    fillable: Vec<String>,
    #[serde(default, rename = "abstract")]
    is_abstract: bool,
    #[serde(default)]
    relations: Vec<ManifestRelation>,
}

#[derive(Debug, Deserialize)]
struct ManifestRelation {
    name: String,
    kind: RelationKind,
    target: Option<String>,
    foreign_key: Option<String>,
    local_key: Option<String>,
    owner_key: Option<String>,
    pivot_table: Option<String>,
    foreign_pivot_key: Option<String>,
    related_pivot_key: Option<String>,
    #[serde(default)]
    pivot_columns: Vec<String>,
    through: Option<String>,
    first_key: Option<String>,
    second_key: Option<String>,
    second_local_key: Option<String>,
    morph_type_column: Option<String>,
}

fn missing(model: &str, relation: &str, field: &str) -> GraphError {
    GraphError::Manifest(format!(
        "relation `{relation}` on `{model}` is missing required field `{field}`"
    ))
}

fn require(
    value: Option<String>,
    model: &str,
    relation: &str,
    field: &str,
) -> Result<String, GraphError> {
    value.ok_or_else(|| missing(model, relation, field))
}

impl ManifestRelation {
    fn into_relation(self, model: &str) -> Result<Relation, GraphError> {
        let rel = self.name.clone();
        let target = self.target.map(ModelIdentifier::new);
        let keys = match self.kind {
            RelationKind::OneToOne | RelationKind::OneToMany => RelationKeys::Direct {
                foreign_key: require(self.foreign_key, model, &rel, "foreign_key")?,
                local_key: self.local_key.unwrap_or_else(|| "id".to_string()),
            },
            RelationKind::ManyToOne => RelationKeys::Inverse {
                foreign_key: require(self.foreign_key, model, &rel, "foreign_key")?,
                owner_key: self.owner_key.unwrap_or_else(|| "id".to_string()),
            },
            RelationKind::ManyToMany => RelationKeys::ManyToMany {
                pivot_table: require(self.pivot_table, model, &rel, "pivot_table")?,
                foreign_pivot_key: require(self.foreign_pivot_key, model, &rel, "foreign_pivot_key")?,
                related_pivot_key: require(self.related_pivot_key, model, &rel, "related_pivot_key")?,
                pivot_columns: self.pivot_columns,
            },
            RelationKind::OneToOneThrough | RelationKind::OneToManyThrough => RelationKeys::Through {
                through_model: ModelIdentifier::new(require(self.through, model, &rel, "through")?),
                first_key: require(self.first_key, model, &rel, "first_key")?,
                second_key: require(self.second_key, model, &rel, "second_key")?,
                local_key: self.local_key.unwrap_or_else(|| "id".to_string()),
                second_local_key: self.second_local_key.unwrap_or_else(|| "id".to_string()),
            },
            RelationKind::PolymorphicOneToOne | RelationKind::PolymorphicOneToMany => {
                RelationKeys::Morph {
                    morph_type_column: require(self.morph_type_column, model, &rel, "morph_type_column")?,
                    foreign_key: require(self.foreign_key, model, &rel, "foreign_key")?,
                    local_key: self.local_key.unwrap_or_else(|| "id".to_string()),
                }
            }
            RelationKind::PolymorphicToOne => RelationKeys::MorphTo {
                morph_type_column: require(self.morph_type_column, model, &rel, "morph_type_column")?,
                foreign_key: require(self.foreign_key, model, &rel, "foreign_key")?,
            },
            RelationKind::PolymorphicManyToMany => RelationKeys::MorphManyToMany {
                morph_type_column: require(self.morph_type_column, model, &rel, "morph_type_column")?,
                pivot_table: require(self.pivot_table, model, &rel, "pivot_table")?,
                foreign_pivot_key: require(self.foreign_pivot_key, model, &rel, "foreign_pivot_key")?,
                related_pivot_key: require(self.related_pivot_key, model, &rel, "related_pivot_key")?,
            },
        };
        // Polymorphic "to" relations keep target unresolved even if given.
        let target = if matches!(self.kind, RelationKind::PolymorphicToOne) { None } else { target };
        Ok(Relation { kind: self.kind, target, keys })
    }
}

/// Load a registry from a TOML manifest file.
///
/// # Errors
/// Returns `GraphError::Io` when the file cannot be read and
/// `GraphError::Manifest` when the TOML is invalid or a relation is missing
/// a field its kind requires.
pub fn load_manifest(path: &Path) -> Result<ModelRegistry, GraphError> {
    let data = fs::read_to_string(path)?;
    let manifest: Manifest =
        toml::from_str(&data).map_err(|e| GraphError::Manifest(e.to_string()))?;

    let mut registry = ModelRegistry::new();
    for model in manifest.models {
        let mut def = ModelDefinition::new(model.name.as_str());
        if let Some(table) = &model.table {
            def = def.table(table);
        }
        def.fillable = model.fillable;
        def.is_abstract = model.is_abstract;
        for relation in model.relations {
            let name = relation.name.clone();
            let rel = relation.into_relation(&model.name)?;
            def = def.relation(&name, rel);
        }
        registry.register(def);
    }
    Ok(registry)
}
