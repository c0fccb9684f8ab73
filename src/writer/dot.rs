//! Graphviz DOT format output for ERD diagrams.

use crate::model::{Column, Entity, ErModel};
use crate::writer::Layout;

/// Generate DOT output with ERD-style tables showing all columns
pub fn to_dot(model: &ErModel, layout: Layout) -> String {
    let mut output = String::new();

    output.push_str("digraph ERD {\n");
    output.push_str("  graph [pad=\"0.5\", nodesep=\"1\", ranksep=\"1.5\"");
    if !model.name.is_empty() {
        output.push_str(&format!(", label=\"{}\", labelloc=t", escape_label(&model.name)));
    }
    output.push_str("];\n");

    let rankdir = match layout {
        Layout::LR => "LR",
        Layout::TB => "TB",
    };
    output.push_str(&format!("  rankdir={};\n", rankdir));

    output.push_str("  node [shape=none, margin=0];\n");
    output.push_str("  edge [arrowhead=crow, arrowtail=none, dir=both];\n\n");

    for entity in model.entities() {
        output.push_str(&format!(
            "  {} [label=<{}>];\n",
            escape_dot_id(&entity.name),
            generate_table_label(entity)
        ));
    }

    if model.relationship_count() > 0 {
        output.push('\n');
    }

    // One edge per column pair, port to port. Ports are named by ordinal so
    // column names never need escaping and never read as compass points.
    for rel in model.relationships() {
        for (from, to) in &rel.columns {
            let (Some(from_entity), Some(to_entity)) =
                (model.entity(from.entity), model.entity(to.entity))
            else {
                continue;
            };
            let (Some(from_col), Some(to_col)) =
                (from_entity.column(from.column), to_entity.column(to.column))
            else {
                continue;
            };
            output.push_str(&format!(
                "  {}:{} -> {}:{} [label=\"{}\"];\n",
                escape_dot_id(&from_entity.name),
                port_id(from_col),
                escape_dot_id(&to_entity.name),
                port_id(to_col),
                escape_label(&rel.name)
            ));
        }
    }

    output.push_str("}\n");
    output
}

/// HTML-like table label for one entity
fn generate_table_label(entity: &Entity) -> String {
    let mut html = String::new();

    html.push_str("<TABLE BORDER=\"0\" CELLBORDER=\"1\" CELLSPACING=\"0\" CELLPADDING=\"4\">");

    html.push_str(&format!(
        "<TR><TD BGCOLOR=\"#4a5568\" COLSPAN=\"3\"><FONT COLOR=\"white\"><B>{}</B></FONT></TD></TR>",
        escape_html(&entity.name)
    ));

    html.push_str("<TR>");
    html.push_str("<TD BGCOLOR=\"#e2e8f0\"><FONT POINT-SIZE=\"10\"><B>Column</B></FONT></TD>");
    html.push_str("<TD BGCOLOR=\"#e2e8f0\"><FONT POINT-SIZE=\"10\"><B>Type</B></FONT></TD>");
    html.push_str("<TD BGCOLOR=\"#e2e8f0\"><FONT POINT-SIZE=\"10\"><B>Key</B></FONT></TD>");
    html.push_str("</TR>");

    for col in &entity.columns {
        let key_marker = match (col.is_primary_key, col.is_foreign_key) {
            (true, true) => "PK FK",
            (true, false) => "PK",
            (false, true) => "FK",
            (false, false) if col.is_unique => "UQ",
            _ => "",
        };

        let null_marker = if col.is_nullable && !col.is_primary_key {
            " <FONT COLOR=\"#888888\">NULL</FONT>"
        } else {
            ""
        };

        html.push_str("<TR>");
        html.push_str(&format!(
            "<TD ALIGN=\"LEFT\" PORT=\"{}\">{}{}</TD>",
            port_id(col),
            escape_html(&col.name),
            null_marker
        ));
        html.push_str(&format!(
            "<TD ALIGN=\"LEFT\"><FONT COLOR=\"#666666\">{}</FONT></TD>",
            escape_html(&col.data_type.to_string())
        ));
        html.push_str(&format!("<TD ALIGN=\"CENTER\">{}</TD>", key_marker));
        html.push_str("</TR>");
    }

    html.push_str("</TABLE>");
    html
}

fn port_id(col: &Column) -> String {
    format!("p{}", col.ordinal.0)
}

/// Escape a string for use in DOT HTML labels
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Escape a string for a quoted DOT attribute
fn escape_label(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Escape a string for use as a DOT node ID
fn escape_dot_id(s: &str) -> String {
    if !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_') {
        s.to_string()
    } else {
        format!("\"{}\"", escape_label(s))
    }
}
