//! Mermaid erDiagram format output.

use crate::model::{Column, ErModel};

/// Generate a Mermaid erDiagram from a model
pub fn to_mermaid(model: &ErModel) -> String {
    let mut output = String::new();

    if !model.name.is_empty() {
        output.push_str(&format!("---\ntitle: {}\n---\n", model.name));
    }
    output.push_str("erDiagram\n");

    for entity in model.entities() {
        let safe_name = escape_mermaid_id(&entity.name);
        output.push_str(&format!("    {} {{\n", safe_name));

        for col in &entity.columns {
            let col_type = escape_mermaid_type(&col.data_type.name);
            let col_name = escape_mermaid_id(&col.name);
            let keys = key_markers(col);

            if keys.is_empty() {
                output.push_str(&format!("        {} {}\n", col_type, col_name));
            } else {
                output.push_str(&format!("        {} {} {}\n", col_type, col_name, keys));
            }
        }

        output.push_str("    }\n");
    }

    if model.relationship_count() > 0 {
        output.push('\n');
    }

    for rel in model.relationships() {
        let (Some(from), Some(to)) = (model.entity(rel.from.entity), model.entity(rel.to.entity))
        else {
            continue;
        };
        output.push_str(&format!(
            "    {} {} {} : \"{}\"\n",
            escape_mermaid_id(&from.name),
            model.cardinality(rel).as_mermaid(),
            escape_mermaid_id(&to.name),
            rel.from.label.replace('"', "'")
        ));
    }

    output
}

/// Mermaid key list, e.g. "PK, FK"
fn key_markers(col: &Column) -> String {
    let mut keys = Vec::new();
    if col.is_primary_key {
        keys.push("PK");
    }
    if col.is_foreign_key {
        keys.push("FK");
    }
    if col.is_unique && !col.is_primary_key {
        keys.push("UK");
    }
    keys.join(", ")
}

/// Escape a string for use as a Mermaid entity ID
fn escape_mermaid_id(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Escape a type string for Mermaid (no spaces, special chars)
fn escape_mermaid_type(s: &str) -> String {
    let base = match s.find('(') {
        Some(paren_pos) => &s[..paren_pos],
        None => s,
    };
    base.trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
