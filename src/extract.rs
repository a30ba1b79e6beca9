//! `@model` entity extraction from SDL.

use crate::ast::{Document, FieldDefinition, ObjectTypeDefinition, TypeRef};
use crate::fallback::scan_relationships;
use crate::model::{Entity, Field, Relationship, RelationshipKind, is_junction_table};
use crate::normalize::dedup_relationships;
use crate::parser::{self, ParseError};
use std::collections::HashSet;
use tracing::debug;

const MODEL_DIRECTIVE: &str = "model";

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Failed to parse GraphQL schema: {0}")]
    Syntax(#[from] ParseError),
    #[error("Failed to parse GraphQL schema: type {0} is declared @model more than once")]
    DuplicateEntity(String),
}

/// Parse schema text and extract its `@model` entities in document order.
///
/// Either every entity is returned or an error is; there are no partial results.
pub fn parse_schema(source: &str) -> Result<Vec<Entity>, SchemaError> {
    let document = parser::parse(source)?;
    let models = collect_models(&document)?;

    Ok(models
        .into_iter()
        .map(|def| extract_entity(def, source))
        .collect())
}

/// First pass: `@model` object types in document order, rejecting repeated names.
fn collect_models(document: &Document) -> Result<Vec<&ObjectTypeDefinition>, SchemaError> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut models = Vec::new();

    for def in document.object_types() {
        if !def.has_directive(MODEL_DIRECTIVE) {
            continue;
        }
        if !seen.insert(def.name.as_str()) {
            return Err(SchemaError::DuplicateEntity(def.name.clone()));
        }
        models.push(def);
    }

    Ok(models)
}

/// Second pass: split fields into plain attributes and relationships.
fn extract_entity(def: &ObjectTypeDefinition, source: &str) -> Entity {
    let mut fields = Vec::new();
    let mut from_ast = Vec::new();

    for field in &def.fields {
        match relationship_kind(&def.name, field) {
            Some(kind) => from_ast.push(Relationship {
                kind,
                target_entity: field.ty.named().to_string(),
                field_name: field.name.clone(),
            }),
            None => fields.push(field_info(field)),
        }
    }

    let from_text = scan_relationships(&def.name, source);
    let ast_count = from_ast.len();
    let text_count = from_text.len();
    let relationships = dedup_relationships(from_ast.into_iter().chain(from_text));

    debug!(
        entity = %def.name,
        ast = ast_count,
        text = text_count,
        merged = relationships.len(),
        "merged relationship sources"
    );

    Entity {
        name: def.name.clone(),
        fields,
        relationships,
        is_junction_table: is_junction_table(&def.name),
    }
}

/// Relationship directives win over the plain-field reading of a field.
fn relationship_kind(entity: &str, field: &FieldDefinition) -> Option<RelationshipKind> {
    let has_many = field.directive(RelationshipKind::HasMany.directive()).is_some();
    let belongs_to = field.directive(RelationshipKind::BelongsTo.directive()).is_some();

    match (has_many, belongs_to) {
        (true, true) => {
            debug!(
                entity,
                field = %field.name,
                "field carries both @hasMany and @belongsTo, treating it as @hasMany"
            );
            Some(RelationshipKind::HasMany)
        }
        (true, false) => Some(RelationshipKind::HasMany),
        (false, true) => Some(RelationshipKind::BelongsTo),
        (false, false) => None,
    }
}

fn field_info(field: &FieldDefinition) -> Field {
    let mut required = false;
    let mut is_list = false;
    let mut current = &field.ty;

    let ty = loop {
        match current {
            TypeRef::NonNull(inner) => {
                required = true;
                current = inner;
            }
            TypeRef::List(inner) => {
                is_list = true;
                current = inner;
            }
            TypeRef::Named(name) => break name.clone(),
        }
    };

    Field {
        name: field.name.clone(),
        ty,
        required,
        is_list,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIBRARY: &str = r#"
type Author @model {
  id: ID!
  name: String!
  books: [Book] @hasMany
}

type Book @model {
  id: ID!
  title: String!
  author: Author @belongsTo
}
"#;

    fn rel(kind: RelationshipKind, target: &str, field: &str) -> Relationship {
        Relationship {
            kind,
            target_entity: target.into(),
            field_name: field.into(),
        }
    }

    #[test]
    fn test_author_book_entities() {
        let entities = parse_schema(LIBRARY).unwrap();
        assert_eq!(entities.len(), 2);

        let author = &entities[0];
        assert_eq!(author.name, "Author");
        let names: Vec<_> = author.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name"]);
        assert_eq!(
            author.relationships,
            vec![rel(RelationshipKind::HasMany, "Book", "books")]
        );

        let book = &entities[1];
        assert_eq!(book.name, "Book");
        assert_eq!(
            book.relationships,
            vec![rel(RelationshipKind::BelongsTo, "Author", "author")]
        );
    }

    #[test]
    fn test_single_line_types() {
        let source = "type Author @model { id: ID!, name: String!, books: [Book] @hasMany }\n\
                      type Book @model { id: ID!, title: String!, author: Author @belongsTo }";
        let entities = parse_schema(source).unwrap();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].relationships.len(), 1);
        assert_eq!(entities[1].relationships.len(), 1);
    }

    #[test]
    fn test_field_type_unwrapping() {
        let source = r#"
type Item @model {
  id: ID!
  note: String
  tags: [String]
  codes: [String!]!
  matrix: [[Int]]
}
"#;
        let entities = parse_schema(source).unwrap();
        let fields = &entities[0].fields;

        assert_eq!(
            fields[0],
            Field { name: "id".into(), ty: "ID".into(), required: true, is_list: false }
        );
        assert_eq!(
            fields[1],
            Field { name: "note".into(), ty: "String".into(), required: false, is_list: false }
        );
        assert_eq!(
            fields[2],
            Field { name: "tags".into(), ty: "String".into(), required: false, is_list: true }
        );
        assert_eq!(
            fields[3],
            Field { name: "codes".into(), ty: "String".into(), required: true, is_list: true }
        );
        assert_eq!(fields[4].ty, "Int");
        assert!(fields[4].is_list);
    }

    #[test]
    fn test_only_model_types_selected() {
        let source = r#"
type Query { books: [Book] }
type Book @model { id: ID! }
type Settings { theme: String }
enum Genre { FICTION NONFICTION }
"#;
        let entities = parse_schema(source).unwrap();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].name, "Book");
    }

    #[test]
    fn test_document_order_preserved() {
        let source = "type Zebra @model { id: ID! }\ntype Apple @model { id: ID! }\ntype Mango @model { id: ID! }";
        let names: Vec<_> = parse_schema(source)
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["Zebra", "Apple", "Mango"]);
    }

    #[test]
    fn test_model_without_fields() {
        let entities = parse_schema("type ProductIndustry @model").unwrap();
        assert_eq!(entities.len(), 1);
        assert!(entities[0].fields.is_empty());
        assert!(entities[0].relationships.is_empty());
        assert!(entities[0].is_junction_table);
    }

    #[test]
    fn test_non_null_relationship_targets() {
        let source = r#"
type Blog @model {
  id: ID!
  posts: [Post!]! @hasMany(indexName: "byBlog", fields: ["id"])
}
type Post @model {
  id: ID!
  blogID: ID!
  blog: Blog! @belongsTo(fields: ["blogID"])
}
"#;
        let entities = parse_schema(source).unwrap();
        assert_eq!(
            entities[0].relationships,
            vec![rel(RelationshipKind::HasMany, "Post", "posts")]
        );
        assert_eq!(
            entities[1].relationships,
            vec![rel(RelationshipKind::BelongsTo, "Blog", "blog")]
        );
        // blogID is a plain field, blog is not
        let names: Vec<_> = entities[1].fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "blogID"]);
    }

    #[test]
    fn test_both_directives_prefers_has_many() {
        let source = "type A @model { id: ID!, bs: [B] @hasMany @belongsTo }";
        let entities = parse_schema(source).unwrap();
        assert!(entities[0].fields.iter().all(|f| f.name != "bs"));
        assert_eq!(entities[0].relationships[0].kind, RelationshipKind::HasMany);
    }

    #[test]
    fn test_both_directives_reversed_prefers_has_many() {
        let source = "type A @model { id: ID!, b: B @belongsTo @hasMany }\ntype B @model { id: ID! }";
        let entities = parse_schema(source).unwrap();
        assert_eq!(
            entities[0].relationships,
            vec![rel(RelationshipKind::HasMany, "B", "b")]
        );
    }

    #[test]
    fn test_multiple_relationships_to_same_target() {
        let source = r#"
type Review @model {
  id: ID!
  author: User @belongsTo
  reviewer: User @belongsTo
}
type User @model { id: ID! }
"#;
        let entities = parse_schema(source).unwrap();
        assert_eq!(entities[0].relationships.len(), 2);
    }

    #[test]
    fn test_dangling_target_is_kept_on_entity() {
        let entities = parse_schema("type A @model { ghost: Ghost @belongsTo }").unwrap();
        assert_eq!(
            entities[0].relationships,
            vec![rel(RelationshipKind::BelongsTo, "Ghost", "ghost")]
        );
    }

    #[test]
    fn test_syntax_error() {
        let err = parse_schema("type Foo { ").unwrap_err();
        assert!(matches!(err, SchemaError::Syntax(_)));
        assert!(err.to_string().starts_with("Failed to parse GraphQL schema: "));
    }

    #[test]
    fn test_nesting_limit() {
        for depth in [100, 50_000] {
            let source = format!(
                "type A @model {{ f: {}Int{} }}",
                "[".repeat(depth),
                "]".repeat(depth)
            );
            assert!(matches!(parse_schema(&source), Err(SchemaError::Syntax(_))));
        }
    }

    #[test]
    fn test_duplicate_model_rejected() {
        let source = "type A @model { id: ID! }\ntype A @model { name: String }";
        assert!(matches!(
            parse_schema(source),
            Err(SchemaError::DuplicateEntity(name)) if name == "A"
        ));
    }

    #[test]
    fn test_empty_and_model_free_schemas() {
        assert!(parse_schema("").unwrap().is_empty());
        assert!(parse_schema("type Query { hello: String }").unwrap().is_empty());
    }
}
