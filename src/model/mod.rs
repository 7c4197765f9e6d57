//! Static model registry and relation declarations.
//!
//! Models are not discovered by loading application code at runtime; the
//! embedding application registers a `ModelDefinition` per persistent type
//! (or ships a TOML manifest, see `manifest`). Each definition carries the
//! backing table, the mass-assignable field list, and the declared members
//! that may be relationships.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub mod manifest;

/// Fully-qualified model type name, `::`-separated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModelIdentifier(pub String);

impl ModelIdentifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Last path segment, e.g. `app::models::User` -> `User`.
    #[must_use]
    pub fn short_name(&self) -> &str {
        self.0.rsplit("::").next().unwrap_or(&self.0)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelIdentifier {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ModelIdentifier {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Fixed enumeration of association kinds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
    PolymorphicToOne,
    PolymorphicOneToOne,
    PolymorphicOneToMany,
    PolymorphicManyToMany,
    OneToOneThrough,
    OneToManyThrough,
}

impl RelationKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RelationKind::OneToOne => "one_to_one",
            RelationKind::OneToMany => "one_to_many",
            RelationKind::ManyToOne => "many_to_one",
            RelationKind::ManyToMany => "many_to_many",
            RelationKind::PolymorphicToOne => "polymorphic_to_one",
            RelationKind::PolymorphicOneToOne => "polymorphic_one_to_one",
            RelationKind::PolymorphicOneToMany => "polymorphic_one_to_many",
            RelationKind::PolymorphicManyToMany => "polymorphic_many_to_many",
            RelationKind::OneToOneThrough => "one_to_one_through",
            RelationKind::OneToManyThrough => "one_to_many_through",
        }
    }
}

/// Kind-specific key metadata carried by a declared relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationKeys {
    /// OneToOne / OneToMany.
    Direct { foreign_key: String, local_key: String },
    /// ManyToOne.
    Inverse { foreign_key: String, owner_key: String },
    /// ManyToMany.
    ManyToMany {
        pivot_table: String,
        foreign_pivot_key: String,
        related_pivot_key: String,
        pivot_columns: Vec<String>,
    },
    /// OneToOneThrough / OneToManyThrough.
    Through {
        through_model: ModelIdentifier,
        first_key: String,
        second_key: String,
        local_key: String,
        second_local_key: String,
    },
    /// PolymorphicOneToOne / PolymorphicOneToMany.
    Morph { morph_type_column: String, foreign_key: String, local_key: String },
    /// PolymorphicToOne; target is unresolvable statically.
    MorphTo { morph_type_column: String, foreign_key: String },
    /// PolymorphicManyToMany (either direction).
    MorphManyToMany {
        morph_type_column: String,
        pivot_table: String,
        foreign_pivot_key: String,
        related_pivot_key: String,
    },
}

/// A declared association: kind, optional target, and key metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub kind: RelationKind,
    pub target: Option<ModelIdentifier>,
    pub keys: RelationKeys,
}

impl Relation {
    pub fn one_to_one(target: impl Into<ModelIdentifier>, foreign_key: &str, local_key: &str) -> Self {
        Self {
            kind: RelationKind::OneToOne,
            target: Some(target.into()),
            keys: RelationKeys::Direct {
                foreign_key: foreign_key.to_string(),
                local_key: local_key.to_string(),
            },
        }
    }

    pub fn one_to_many(target: impl Into<ModelIdentifier>, foreign_key: &str, local_key: &str) -> Self {
        Self {
            kind: RelationKind::OneToMany,
            target: Some(target.into()),
            keys: RelationKeys::Direct {
                foreign_key: foreign_key.to_string(),
                local_key: local_key.to_string(),
            },
        }
    }

    pub fn many_to_one(target: impl Into<ModelIdentifier>, foreign_key: &str, owner_key: &str) -> Self {
        Self {
            kind: RelationKind::ManyToOne,
            target: Some(target.into()),
            keys: RelationKeys::Inverse {
                foreign_key: foreign_key.to_string(),
                owner_key: owner_key.to_string(),
            },
        }
    }

    pub fn many_to_many(
        target: impl Into<ModelIdentifier>,
        pivot_table: &str,
        foreign_pivot_key: &str,
        related_pivot_key: &str,
    ) -> Self {
        Self {
            kind: RelationKind::ManyToMany,
            target: Some(target.into()),
            keys: RelationKeys::ManyToMany {
                pivot_table: pivot_table.to_string(),
                foreign_pivot_key: foreign_pivot_key.to_string(),
                related_pivot_key: related_pivot_key.to_string(),
                pivot_columns: Vec::new(),
            },
        }
    }

    #[must_use]
    pub fn with_pivot_columns(mut self, columns: &[&str]) -> Self {
        if let RelationKeys::ManyToMany { pivot_columns, .. } = &mut self.keys {
            *pivot_columns = columns.iter().map(|c| (*c).to_string()).collect();
        }
        self
    }

    pub fn through(
        kind: RelationKind,
        target: impl Into<ModelIdentifier>,
        through_model: impl Into<ModelIdentifier>,
        first_key: &str,
        second_key: &str,
        local_key: &str,
        second_local_key: &str,
    ) -> Self {
        Self {
            kind,
            target: Some(target.into()),
            keys: RelationKeys::Through {
                through_model: through_model.into(),
                first_key: first_key.to_string(),
                second_key: second_key.to_string(),
                local_key: local_key.to_string(),
                second_local_key: second_local_key.to_string(),
            },
        }
    }

    pub fn morph_one(
        target: impl Into<ModelIdentifier>,
        morph_type_column: &str,
        foreign_key: &str,
        local_key: &str,
    ) -> Self {
        Self {
            kind: RelationKind::PolymorphicOneToOne,
            target: Some(target.into()),
            keys: RelationKeys::Morph {
                morph_type_column: morph_type_column.to_string(),
                foreign_key: foreign_key.to_string(),
                local_key: local_key.to_string(),
            },
        }
    }

    pub fn morph_many(
        target: impl Into<ModelIdentifier>,
        morph_type_column: &str,
        foreign_key: &str,
        local_key: &str,
    ) -> Self {
        Self {
            kind: RelationKind::PolymorphicOneToMany,
            target: Some(target.into()),
            keys: RelationKeys::Morph {
                morph_type_column: morph_type_column.to_string(),
                foreign_key: foreign_key.to_string(),
                local_key: local_key.to_string(),
            },
        }
    }

    /// Polymorphic "to" relation; the target stays unresolved until runtime
    /// type binding, so none is recorded.
    pub fn morph_to(morph_type_column: &str, foreign_key: &str) -> Self {
        Self {
            kind: RelationKind::PolymorphicToOne,
            target: None,
            keys: RelationKeys::MorphTo {
                morph_type_column: morph_type_column.to_string(),
                foreign_key: foreign_key.to_string(),
            },
        }
    }

    pub fn morph_many_to_many(
        target: impl Into<ModelIdentifier>,
        morph_type_column: &str,
        pivot_table: &str,
        foreign_pivot_key: &str,
        related_pivot_key: &str,
    ) -> Self {
        Self {
            kind: RelationKind::PolymorphicManyToMany,
            target: Some(target.into()),
            keys: RelationKeys::MorphManyToMany {
                morph_type_column: morph_type_column.to_string(),
                pivot_table: pivot_table.to_string(),
                foreign_pivot_key: foreign_pivot_key.to_string(),
                related_pivot_key: related_pivot_key.to_string(),
            },
        }
    }
}

/// Fallback classifier for members without a statically declared relation.
/// Returning `None` (or panicking is not supported; probes must not panic)
/// means "not a relationship".
pub type ProbeFn = Box<dyn Fn() -> Option<Relation> + Send + Sync>;

/// A zero-argument public member that may be a relationship. Static
/// declarations win; the probe is only consulted when `declared` is absent.
pub struct MemberDecl {
    pub name: String,
    pub declared: Option<Relation>,
    pub probe: Option<ProbeFn>,
}

impl fmt::Debug for MemberDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberDecl")
            .field("name", &self.name)
            .field("declared", &self.declared)
            .field("probe", &self.probe.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Registered definition of one persistent model type.
#[derive(Debug)]
pub struct ModelDefinition {
    pub name: ModelIdentifier,
    pub table: Option<String>,
    pub fillable: Vec<String>,
    pub is_abstract: bool,
    pub members: Vec<MemberDecl>,
}

impl ModelDefinition {
    pub fn new(name: impl Into<ModelIdentifier>) -> Self {
        Self {
            name: name.into(),
            table: None,
            fillable: Vec::new(),
            is_abstract: false,
            members: Vec::new(),
        }
    }

    #[must_use]
    pub fn table(mut self, table: &str) -> Self {
        self.table = Some(table.to_string());
        self
    }

    #[must_use]
    pub fn fillable(mut self, fields: &[&str]) -> Self {
        self.fillable = fields.iter().map(|f| (*f).to_string()).collect();
        self
    }

    #[must_use]
    pub fn abstract_model(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Declare a member with a statically known relation.
    #[must_use]
    pub fn relation(mut self, name: &str, relation: Relation) -> Self {
        self.members.push(MemberDecl {
            name: name.to_string(),
            declared: Some(relation),
            probe: None,
        });
        self
    }

    /// Declare a member with no static relation type; the resolver will call
    /// the probe to decide whether it yields a relation.
    #[must_use]
    pub fn probed_member(
        mut self,
        name: &str,
        probe: impl Fn() -> Option<Relation> + Send + Sync + 'static,
    ) -> Self {
        self.members.push(MemberDecl {
            name: name.to_string(),
            declared: None,
            probe: Some(Box::new(probe)),
        });
        self
    }

    /// Declare a plain member (neither typed nor probed); never a relation.
    #[must_use]
    pub fn member(mut self, name: &str) -> Self {
        self.members.push(MemberDecl { name: name.to_string(), declared: None, probe: None });
        self
    }
}

/// Zero-argument helper names inherited from the base persistence layer and
/// its behavioral mixins (attributes, events, scopes, timestamps, query
/// helpers). These are never relationship candidates.
const BASE_MEMBER_NAMES: &[&str] = &[
    "delete",
    "fresh",
    "get_attributes",
    "get_dirty",
    "get_original",
    "new_query",
    "observe",
    "push",
    "refresh",
    "replicate",
    "save",
    "to_array",
    "to_json",
    "touch",
    "update_timestamps",
    "with_global_scopes",
    "without_relations",
];

/// Whether a member name belongs to the base persistence abstraction.
#[must_use]
pub fn is_base_member(name: &str) -> bool {
    BASE_MEMBER_NAMES.binary_search(&name).is_ok()
}

/// In-memory registry of model definitions, keyed and iterated in sorted
/// identifier order for determinism.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: BTreeMap<ModelIdentifier, ModelDefinition>,
}

impl ModelRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, definition: ModelDefinition) {
        self.models.insert(definition.name.clone(), definition);
    }

    #[must_use]
    pub fn get(&self, id: &ModelIdentifier) -> Option<&ModelDefinition> {
        self.models.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &ModelIdentifier) -> bool {
        self.models.contains_key(id)
    }

    /// All registered identifiers, sorted.
    #[must_use]
    pub fn identifiers(&self) -> Vec<ModelIdentifier> {
        self.models.keys().cloned().collect()
    }

    /// Identifiers of concrete (non-abstract) models, sorted.
    #[must_use]
    pub fn concrete_identifiers(&self) -> Vec<ModelIdentifier> {
        self.models.values().filter(|d| !d.is_abstract).map(|d| d.name.clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_name_takes_last_segment() {
        let id = ModelIdentifier::from("app::models::BlogPost");
        assert_eq!(id.short_name(), "BlogPost");
        let bare = ModelIdentifier::from("User");
        assert_eq!(bare.short_name(), "User");
    }

    #[test]
    fn base_member_names_are_sorted_for_binary_search() {
        let mut sorted = BASE_MEMBER_NAMES.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, BASE_MEMBER_NAMES);
        assert!(is_base_member("save"));
        assert!(is_base_member("to_array"));
        assert!(!is_base_member("posts"));
    }

    #[test]
    fn registry_filters_abstract_models() {
        let mut reg = ModelRegistry::new();
        reg.register(ModelDefinition::new("app::models::Base").abstract_model());
        reg.register(ModelDefinition::new("app::models::User").table("users"));
        assert_eq!(reg.len(), 2);
        let concrete = reg.concrete_identifiers();
        assert_eq!(concrete, vec![ModelIdentifier::from("app::models::User")]);
    }

    #[test]
    fn morph_to_has_no_target() {
        let rel = Relation::morph_to("commentable_type", "commentable_id");
        assert_eq!(rel.kind, RelationKind::PolymorphicToOne);
        assert!(rel.target.is_none());
    }

    #[test]
    fn builder_collects_members_in_order() {
        let def = ModelDefinition::new("app::models::Post")
            .relation("author", Relation::many_to_one("app::models::User", "user_id", "id"))
            .member("slug")
            .probed_member("tags", || None);
        let names: Vec<&str> = def.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["author", "slug", "tags"]);
    }
}
