//! End-to-end generation over a registry exercising every relation kind,
//! backed by a parsed SQL schema dump.

use std::sync::Arc;

use model_relations_graph::discover::RegistrySource;
use model_relations_graph::events::NullEvents;
use model_relations_graph::graph::{Cardinality, Direction, GraphBuilder, GraphDocument};
use model_relations_graph::model::{ModelDefinition, ModelRegistry, Relation, RelationKind};
use model_relations_graph::schema::ddl::DdlSchema;
use model_relations_graph::utils::config::GraphConfig;

const SCHEMA: &str = r#"
CREATE TABLE users (
  id bigint NOT NULL,
  name varchar(255) NOT NULL,
  email varchar(255) NOT NULL,
  PRIMARY KEY (id),
  UNIQUE KEY users_email_unique (email)
);
CREATE TABLE posts (
  id bigint NOT NULL,
  user_id bigint NOT NULL,
  title varchar(255) NOT NULL,
  PRIMARY KEY (id),
  KEY posts_user_id_index (user_id),
  CONSTRAINT posts_user_id_foreign FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
);
CREATE TABLE comments (
  id bigint NOT NULL,
  post_id bigint NOT NULL,
  commentable_id bigint,
  commentable_type varchar(255),
  PRIMARY KEY (id)
);
CREATE TABLE tags (
  id bigint NOT NULL,
  name varchar(255) NOT NULL,
  PRIMARY KEY (id)
);
"#;

fn registry() -> ModelRegistry {
    let mut reg = ModelRegistry::new();
    reg.register(
        ModelDefinition::new("app::models::User")
            .table("users")
            .fillable(&["name", "email"])
            .relation("posts", Relation::one_to_many("app::models::Post", "user_id", "id"))
            .relation("profile", Relation::one_to_one("app::models::Profile", "user_id", "id"))
            .relation(
                "comments",
                Relation::through(
                    RelationKind::OneToManyThrough,
                    "app::models::Comment",
                    "app::models::Post",
                    "user_id",
                    "post_id",
                    "id",
                    "id",
                ),
            ),
    );
    reg.register(
        ModelDefinition::new("app::models::Post")
            .table("posts")
            .relation("author", Relation::many_to_one("app::models::User", "user_id", "id"))
            .relation(
                "tags",
                Relation::many_to_many("app::models::Tag", "post_tag", "post_id", "tag_id")
                    .with_pivot_columns(&["tagged_at"]),
            )
            .relation(
                "comments",
                Relation::morph_many(
                    "app::models::Comment",
                    "commentable_type",
                    "commentable_id",
                    "id",
                ),
            ),
    );
    reg.register(
        ModelDefinition::new("app::models::Comment")
            .table("comments")
            .relation("commentable", Relation::morph_to("commentable_type", "commentable_id")),
    );
    reg.register(ModelDefinition::new("app::models::Tag").table("tags"));
    reg.register(ModelDefinition::new("app::models::Profile"));
    reg.register(ModelDefinition::new("app::models::BaseModel").abstract_model());
    reg
}

fn generate() -> GraphDocument {
    let mut builder = GraphBuilder::new(
        GraphConfig::default(),
        Arc::new(registry()),
        Box::new(RegistrySource),
        Some(Box::new(DdlSchema::from_sql(SCHEMA))),
        Arc::new(NullEvents),
    );
    builder.generate(None, None).unwrap()
}

#[test]
fn abstract_models_are_excluded_from_discovery() {
    let doc = generate();
    assert_eq!(doc.total_models, 5);
    assert!(doc.models.iter().all(|n| n.short_name != "BaseModel"));
}

#[test]
fn schema_columns_and_indexes_attach_to_nodes() {
    let doc = generate();

    let user = doc.models.iter().find(|n| n.short_name == "User").unwrap();
    assert_eq!(user.table, "users");
    assert_eq!(user.columns.len(), 3);
    let email = user.columns.iter().find(|c| c.name == "email").unwrap();
    assert!(!email.nullable);
    assert!(email.indexes.iter().any(|ix| ix.name == "users_email_unique" && ix.unique));
    assert_eq!(user.fillable, vec!["name", "email"]);

    // Profile has no declared table and no conventional one in the dump.
    let profile = doc.models.iter().find(|n| n.short_name == "Profile").unwrap();
    assert_eq!(profile.table, "profiles");
    assert!(profile.columns.is_empty());

    let comment = doc.models.iter().find(|n| n.short_name == "Comment").unwrap();
    let morph = comment.columns.iter().find(|c| c.name == "commentable_id").unwrap();
    assert!(morph.nullable);
}

#[test]
fn every_targeted_relation_becomes_an_edge() {
    let doc = generate();
    // 6 targeted relations; morph_to has no target so no edge
    assert_eq!(doc.total_relationships, 6);
    assert!(doc.relationships.iter().all(|e| e.label != "commentable"));

    let tags = doc.relationships.iter().find(|e| e.label == "tags").unwrap();
    assert_eq!(tags.kind, RelationKind::ManyToMany);
    assert_eq!(tags.direction, Direction::Outgoing);
    assert_eq!(tags.cardinality, Cardinality::ManyToMany);
    assert_eq!(tags.metadata.pivot_table.as_deref(), Some("post_tag"));
    assert_eq!(tags.metadata.pivot_columns, vec!["tagged_at"]);

    let author = doc.relationships.iter().find(|e| e.label == "author").unwrap();
    assert_eq!(author.direction, Direction::Incoming);
    assert_eq!(author.cardinality, Cardinality::ManyToOne);
    assert_eq!(author.id, "app::models::Post->app::models::User:author");

    let through = doc.relationships.iter().find(|e| e.label == "comments"
        && e.source.as_str() == "app::models::User").unwrap();
    assert_eq!(through.kind, RelationKind::OneToManyThrough);
    assert_eq!(through.metadata.through_model.as_ref().unwrap().as_str(), "app::models::Post");
}

#[test]
fn loop_membership_and_severity_reflect_unique_cycles() {
    let doc = generate();
    // User <-> Post is the only cycle; morph edges point at Comment which
    // has no outgoing targeted edge.
    assert_eq!(doc.loops.len(), 1);
    let loop_ids: Vec<&str> = doc.loops[0].0.iter().map(|m| m.as_str()).collect();
    assert_eq!(loop_ids.len(), 2);
    assert!(loop_ids.contains(&"app::models::User"));
    assert!(loop_ids.contains(&"app::models::Post"));

    for node in &doc.models {
        let expect_loop = node.short_name == "User" || node.short_name == "Post";
        assert_eq!(node.in_loops, expect_loop, "{}", node.id);
        assert_eq!(node.loop_severity, usize::from(expect_loop));
    }
}

#[test]
fn document_is_versioned_and_round_trips() {
    let doc = generate();
    assert_eq!(doc.version, "1.0");
    assert!(doc.warnings.is_empty());
    let back = GraphDocument::from_json(&doc.to_json(false).unwrap()).unwrap();
    assert_eq!(back.models, doc.models);
    assert_eq!(back.relationships, doc.relationships);
    assert_eq!(back.loops, doc.loops);
}
