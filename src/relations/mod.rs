//! Relationship resolution.
//!
//! Candidates are the model's declared members minus the base persistence
//! helpers. Classification is two-tier: a statically declared relation wins;
//! members without one are probed at resolution time, and probe failures
//! (including panics) silently disqualify the member. Results are memoized
//! per identifier for the resolver's lifetime.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::model::{
    is_base_member, ModelIdentifier, ModelRegistry, Relation, RelationKeys, RelationKind,
};

/// Flattened, serializable description of one resolved relationship.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelationshipDescriptor {
    pub name: String,
    pub kind: RelationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_model: Option<ModelIdentifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pivot_table: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreign_pivot_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_pivot_key: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pivot_columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub through_model: Option<ModelIdentifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub second_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub second_local_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub morph_type_column: Option<String>,
}

impl RelationshipDescriptor {
    fn empty(name: &str, kind: RelationKind, target: Option<ModelIdentifier>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            target_model: target,
            foreign_key: None,
            local_key: None,
            owner_key: None,
            pivot_table: None,
            foreign_pivot_key: None,
            related_pivot_key: None,
            pivot_columns: Vec::new(),
            through_model: None,
            first_key: None,
            second_key: None,
            second_local_key: None,
            morph_type_column: None,
        }
    }

    #[must_use]
    pub fn from_relation(name: &str, relation: &Relation) -> Self {
        let mut d = Self::empty(name, relation.kind, relation.target.clone());
        match &relation.keys {
            RelationKeys::Direct { foreign_key, local_key } => {
                d.foreign_key = Some(foreign_key.clone());
                d.local_key = Some(local_key.clone());
            }
            RelationKeys::Inverse { foreign_key, owner_key } => {
                d.foreign_key = Some(foreign_key.clone());
                d.owner_key = Some(owner_key.clone());
            }
            RelationKeys::ManyToMany {
                pivot_table,
                foreign_pivot_key,
                related_pivot_key,
                pivot_columns,
            } => {
                d.pivot_table = Some(pivot_table.clone());
                d.foreign_pivot_key = Some(foreign_pivot_key.clone());
                d.related_pivot_key = Some(related_pivot_key.clone());
                d.pivot_columns = pivot_columns.clone();
            }
            RelationKeys::Through {
                through_model,
                first_key,
                second_key,
                local_key,
                second_local_key,
            } => {
                d.through_model = Some(through_model.clone());
                d.first_key = Some(first_key.clone());
                d.second_key = Some(second_key.clone());
                d.local_key = Some(local_key.clone());
                d.second_local_key = Some(second_local_key.clone());
            }
            RelationKeys::Morph { morph_type_column, foreign_key, local_key } => {
                d.morph_type_column = Some(morph_type_column.clone());
                d.foreign_key = Some(foreign_key.clone());
                d.local_key = Some(local_key.clone());
            }
            RelationKeys::MorphTo { morph_type_column, foreign_key } => {
                d.morph_type_column = Some(morph_type_column.clone());
                d.foreign_key = Some(foreign_key.clone());
            }
            RelationKeys::MorphManyToMany {
                morph_type_column,
                pivot_table,
                foreign_pivot_key,
                related_pivot_key,
            } => {
                d.morph_type_column = Some(morph_type_column.clone());
                d.pivot_table = Some(pivot_table.clone());
                d.foreign_pivot_key = Some(foreign_pivot_key.clone());
                d.related_pivot_key = Some(related_pivot_key.clone());
            }
        }
        d
    }
}

pub type RelationshipMap = BTreeMap<String, RelationshipDescriptor>;

/// Resolves and memoizes the relationship map per model identifier.
#[derive(Default)]
pub struct RelationshipResolver {
    cache: HashMap<ModelIdentifier, RelationshipMap>,
}

impl RelationshipResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Relationship map for a model, keyed by member name. A second call for
    /// the same identifier returns the cached map without recomputation.
    /// Unknown identifiers resolve to an empty map.
    pub fn resolve(
        &mut self,
        registry: &ModelRegistry,
        model: &ModelIdentifier,
    ) -> &RelationshipMap {
        self.cache.entry(model.clone()).or_insert_with(|| Self::compute(registry, model))
    }

    fn compute(registry: &ModelRegistry, model: &ModelIdentifier) -> RelationshipMap {
        let mut out = RelationshipMap::new();
        let Some(definition) = registry.get(model) else {
            return out;
        };
        for member in &definition.members {
            if is_base_member(&member.name) {
                continue;
            }
            let relation = match (&member.declared, &member.probe) {
                // Tier one: statically declared relation type.
                (Some(declared), _) => Some(declared.clone()),
                // Tier two: runtime probe; failures disqualify the member.
                (None, Some(probe)) => catch_unwind(AssertUnwindSafe(|| probe())).ok().flatten(),
                (None, None) => None,
            };
            if let Some(relation) = relation {
                out.insert(
                    member.name.clone(),
                    RelationshipDescriptor::from_relation(&member.name, &relation),
                );
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelDefinition;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn unknown_model_resolves_to_empty_map() {
        let registry = ModelRegistry::new();
        let mut resolver = RelationshipResolver::new();
        let map = resolver.resolve(&registry, &ModelIdentifier::from("app::models::Ghost"));
        assert!(map.is_empty());
    }

    #[test]
    fn base_members_and_plain_members_are_never_relationships() {
        let mut registry = ModelRegistry::new();
        registry.register(
            ModelDefinition::new("app::models::User")
                .member("save")
                .member("slug")
                .relation("posts", Relation::one_to_many("app::models::Post", "user_id", "id")),
        );
        let mut resolver = RelationshipResolver::new();
        let map = resolver.resolve(&registry, &ModelIdentifier::from("app::models::User"));
        assert_eq!(map.len(), 1);
        assert!(map.contains_key("posts"));
    }

    #[test]
    fn probe_tier_runs_once_thanks_to_memoization() {
        let count = Arc::new(AtomicUsize::new(0));
        let probe_count = Arc::clone(&count);
        let mut registry = ModelRegistry::new();
        registry.register(ModelDefinition::new("app::models::Post").probed_member(
            "comments",
            move || {
                probe_count.fetch_add(1, Ordering::SeqCst);
                Some(Relation::one_to_many("app::models::Comment", "post_id", "id"))
            },
        ));

        let mut resolver = RelationshipResolver::new();
        let post = ModelIdentifier::from("app::models::Post");
        let first = resolver.resolve(&registry, &post).clone();
        let second = resolver.resolve(&registry, &post).clone();
        assert_eq!(first, second);
        assert_eq!(count.load(Ordering::SeqCst), 1, "probe must run once");
    }

    #[test]
    fn probe_failures_are_swallowed() {
        let mut registry = ModelRegistry::new();
        registry.register(
            ModelDefinition::new("app::models::User")
                .probed_member("broken", || panic!("constructor blew up"))
                .probed_member("not_a_relation", || None)
                .relation("profile", Relation::one_to_one("app::models::Profile", "user_id", "id")),
        );
        let mut resolver = RelationshipResolver::new();
        let map = resolver.resolve(&registry, &ModelIdentifier::from("app::models::User"));
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["profile"]);
    }

    #[test]
    fn descriptor_flattens_kind_specific_keys() {
        let rel = Relation::many_to_many("app::models::Role", "role_user", "user_id", "role_id")
            .with_pivot_columns(&["granted_at"]);
        let d = RelationshipDescriptor::from_relation("roles", &rel);
        assert_eq!(d.kind, RelationKind::ManyToMany);
        assert_eq!(d.pivot_table.as_deref(), Some("role_user"));
        assert_eq!(d.pivot_columns, vec!["granted_at"]);
        assert!(d.foreign_key.is_none());

        let rel = Relation::morph_to("commentable_type", "commentable_id");
        let d = RelationshipDescriptor::from_relation("commentable", &rel);
        assert!(d.target_model.is_none());
        assert_eq!(d.morph_type_column.as_deref(), Some("commentable_type"));
    }
}
