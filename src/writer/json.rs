//! JSON format output for the ER model.

use crate::model::{Column, ErModel};
use schemars::JsonSchema;
use serde::Serialize;

/// JSON representation of the ER model
#[derive(Debug, Serialize, JsonSchema)]
pub struct ErdJson {
    pub name: String,
    pub entities: Vec<EntityJson>,
    pub relationships: Vec<RelationshipJson>,
    pub stats: ErdStats,
}

/// JSON representation of an entity with its columns in ordinal order
#[derive(Debug, Serialize, JsonSchema)]
pub struct EntityJson {
    pub name: String,
    pub columns: Vec<ColumnJson>,
}

/// JSON representation of a column
#[derive(Debug, Serialize, JsonSchema)]
pub struct ColumnJson {
    pub name: String,
    pub position: i64,
    #[serde(rename = "type")]
    pub col_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precision: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    pub is_nullable: bool,
    pub is_primary_key: bool,
    pub is_unique: bool,
    pub is_foreign_key: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub references: Option<ReferenceJson>,
}

/// Resolved foreign key target
#[derive(Debug, Serialize, JsonSchema)]
pub struct ReferenceJson {
    pub entity: String,
    pub column: String,
}

/// JSON representation of a relationship
#[derive(Debug, Serialize, JsonSchema)]
pub struct RelationshipJson {
    pub name: String,
    pub from_entity: String,
    /// Comma-separated referencing column names
    pub from_label: String,
    pub to_entity: String,
    pub columns: Vec<ColumnPairJson>,
    pub cardinality: String,
}

/// One referencing/referenced column pair of a relationship
#[derive(Debug, Serialize, JsonSchema)]
pub struct ColumnPairJson {
    pub from: String,
    pub to: String,
}

/// Model statistics
#[derive(Debug, Serialize, JsonSchema)]
pub struct ErdStats {
    pub entity_count: usize,
    pub column_count: usize,
    pub relationship_count: usize,
    pub unresolved_reference_count: usize,
}

/// Generate JSON output from a model
pub fn to_json(model: &ErModel) -> String {
    let erd = build_erd_json(model);
    serde_json::to_string_pretty(&erd).unwrap_or_else(|_| "{}".to_string())
}

/// Build the JSON structure
pub fn build_erd_json(model: &ErModel) -> ErdJson {
    let mut unresolved = 0;

    let entities: Vec<EntityJson> = model
        .entities()
        .iter()
        .map(|entity| {
            let columns: Vec<ColumnJson> = entity
                .columns
                .iter()
                .map(|col| {
                    if col.is_foreign_key && col.reference.is_none() {
                        unresolved += 1;
                    }
                    column_json(model, col)
                })
                .collect();

            EntityJson {
                name: entity.name.clone(),
                columns,
            }
        })
        .collect();

    let name_of = |id| {
        model
            .entity(id)
            .map(|e| e.name.clone())
            .unwrap_or_default()
    };
    let column_name = |r| {
        model
            .column(r)
            .map(|c| c.name.clone())
            .unwrap_or_default()
    };

    let relationships: Vec<RelationshipJson> = model
        .relationships()
        .iter()
        .map(|rel| RelationshipJson {
            name: rel.name.clone(),
            from_entity: name_of(rel.from.entity),
            from_label: rel.from.label.clone(),
            to_entity: name_of(rel.to.entity),
            columns: rel
                .columns
                .iter()
                .map(|(from, to)| ColumnPairJson {
                    from: column_name(*from),
                    to: column_name(*to),
                })
                .collect(),
            cardinality: model.cardinality(rel).to_string(),
        })
        .collect();

    ErdJson {
        name: model.name.clone(),
        entities,
        relationships,
        stats: ErdStats {
            entity_count: model.entity_count(),
            column_count: model.column_count(),
            relationship_count: model.relationship_count(),
            unresolved_reference_count: unresolved,
        },
    }
}

fn column_json(model: &ErModel, col: &Column) -> ColumnJson {
    let references = col.reference.and_then(|r| {
        let entity = model.entity(r.entity)?;
        let target = entity.column(r.column)?;
        Some(ReferenceJson {
            entity: entity.name.clone(),
            column: target.name.clone(),
        })
    });

    ColumnJson {
        name: col.name.clone(),
        position: col.position,
        col_type: col.data_type.name.clone(),
        length: col.data_type.length,
        precision: col.data_type.precision,
        default: col.default_value.clone(),
        is_nullable: col.is_nullable,
        is_primary_key: col.is_primary_key,
        is_unique: col.is_unique,
        is_foreign_key: col.is_foreign_key,
        references,
    }
}
