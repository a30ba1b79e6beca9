//! Serializer for writing entities back out as SDL.

use crate::model::{Entity, Field, Relationship, RelationshipKind};

/// Serialize entities to an SDL document of `@model` types.
///
/// Plain fields come first, then one directive-tagged field per relationship.
/// Extracting the result again yields the same entities.
pub fn export_schema(entities: &[Entity]) -> String {
    let mut output = String::new();

    for (i, entity) in entities.iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }
        serialize_entity(&mut output, entity);
    }

    output
}

fn serialize_entity(output: &mut String, entity: &Entity) {
    if entity.fields.is_empty() && entity.relationships.is_empty() {
        output.push_str(&format!("type {} @model\n", entity.name));
        return;
    }

    output.push_str(&format!("type {} @model {{\n", entity.name));

    for field in &entity.fields {
        serialize_field(output, field);
    }
    for rel in &entity.relationships {
        serialize_relationship(output, rel);
    }

    output.push_str("}\n");
}

fn serialize_field(output: &mut String, field: &Field) {
    let mut ty = if field.is_list {
        format!("[{}]", field.ty)
    } else {
        field.ty.clone()
    };
    if field.required {
        ty.push('!');
    }

    output.push_str(&format!("  {}: {}\n", field.name, ty));
}

fn serialize_relationship(output: &mut String, rel: &Relationship) {
    let ty = match rel.kind {
        RelationshipKind::HasMany => format!("[{}]", rel.target_entity),
        RelationshipKind::BelongsTo => rel.target_entity.clone(),
    };

    output.push_str(&format!(
        "  {}: {} @{}\n",
        rel.field_name,
        ty,
        rel.kind.directive()
    ));
}
