//! Terminal output: the field listing and document differences.

use std::fmt::Write;

use cfgform::{
    Value,
    data::{FieldDescriptor, FieldKind, Projection},
};
use colored::Colorize;

/// Renders the projection as an indented listing.
pub fn projection_listing(projection: &Projection) -> String {
    let mut out = String::new();
    for section in &projection.sections {
        let _ = writeln!(out, "{}", section.title.bold().underline());
        for group in &section.groups {
            let _ = writeln!(out, "  {}", group.title.cyan());
            for field in &group.fields {
                let _ = writeln!(out, "    {}", field_line(field));
            }
        }
    }
    out
}

fn field_line(field: &FieldDescriptor) -> String {
    let mut line = format!(
        "{:<36} {} {}",
        field.path.to_string(),
        display_value(&field.kind, &field.value).green(),
        format!("({})", kind_name(&field.kind)).dimmed()
    );
    if field.read_only {
        line.push_str(&format!(" {}", "read-only".yellow()));
    }
    if !field.choices.is_empty() {
        line.push_str(&format!(" {}", format!("[{}]", field.choices.join("|")).dimmed()));
    }
    line
}

fn kind_name(kind: &FieldKind) -> &'static str {
    match kind {
        FieldKind::Boolean => "boolean",
        FieldKind::Text => "text",
        FieldKind::Integer => "integer",
        FieldKind::Float => "float",
        FieldKind::List { .. } => "list",
        FieldKind::NumberList { .. } => "number list",
        FieldKind::Range => "range",
        FieldKind::TagSet { unique: true } => "unique tags",
        FieldKind::TagSet { unique: false } => "tags",
    }
}

fn display_value(kind: &FieldKind, value: &Value) -> String {
    match (kind, value) {
        (FieldKind::Range, Value::Array(items)) if items.len() == 2 => {
            format!("{} .. {}", items[0], items[1])
        }
        (_, Value::String(s)) if s.is_empty() => "\"\"".to_string(),
        (_, Value::String(s)) => s.clone(),
        (_, other) => other.to_string(),
    }
}

/// One difference between two documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// Present only in the second document.
    Added(String),
    /// Present only in the first document.
    Removed(String),
    /// Present in both with different values.
    Changed(String),
}

/// Leaf-level differences from `before` to `after`, in document order.
pub fn diff(before: &Value, after: &Value) -> Vec<Change> {
    let mut changes = Vec::new();
    diff_at("", before, after, &mut changes);
    changes
}

fn child(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn diff_at(path: &str, before: &Value, after: &Value, out: &mut Vec<Change>) {
    match (before, after) {
        (Value::Object(a), Value::Object(b)) => {
            for (key, value) in a {
                match b.get(key) {
                    Some(other) => diff_at(&child(path, key), value, other, out),
                    None => out.push(Change::Removed(child(path, key))),
                }
            }
            for key in b.keys().filter(|k| !a.contains_key(*k)) {
                out.push(Change::Added(child(path, key)));
            }
        }
        (Value::Array(a), Value::Array(b))
            if a.len() == b.len() && a.iter().chain(b).any(Value::is_object) =>
        {
            for (i, (x, y)) in a.iter().zip(b).enumerate() {
                diff_at(&format!("{path}[{i}]"), x, y, out);
            }
        }
        _ if before == after => {}
        _ => out.push(Change::Changed(path.to_string())),
    }
}

/// Renders `changes` one per line, colored by kind.
pub fn change_listing(changes: &[Change]) -> String {
    let mut out = String::new();
    for change in changes {
        let line = match change {
            Change::Added(path) => format!("+ {path}").green(),
            Change::Removed(path) => format!("- {path}").red(),
            Change::Changed(path) => format!("~ {path}").yellow(),
        };
        let _ = writeln!(out, "  {line}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfgform::data::{Schema, project};
    use serde_json::json;

    #[test]
    fn test_diff_reports_leaf_paths() {
        let before = json!({
            "A": {"x": 1, "gone": true},
            "W": {"items": [{"n": 1}, {"n": 2}]}
        });
        let after = json!({
            "A": {"x": 2, "new": "y"},
            "W": {"items": [{"n": 1}, {"n": 3}]}
        });
        assert_eq!(
            diff(&before, &after),
            vec![
                Change::Changed("A.x".into()),
                Change::Removed("A.gone".into()),
                Change::Added("A.new".into()),
                Change::Changed("W.items[1].n".into()),
            ]
        );
        assert!(diff(&before, &before).is_empty());
    }

    #[test]
    fn test_diff_treats_scalar_lists_as_values() {
        let changes = diff(&json!({"R": [1, 2]}), &json!({"R": [1, 3]}));
        assert_eq!(changes, vec![Change::Changed("R".into())]);
    }

    #[test]
    fn test_listing_mentions_every_field() {
        colored::control::set_override(false);
        let projection = project(
            &json!({"SETTINGS": {"ACCOUNTS_RANGE": [2, 4]}}),
            &Schema::builtin(),
        )
        .unwrap();
        let listing = projection_listing(&projection);
        assert!(listing.contains("Settings"));
        assert!(listing.contains("SETTINGS.ACCOUNTS_RANGE"));
        assert!(listing.contains("2 .. 4"));
        assert!(listing.contains("EXCHANGES.withdrawals[0].currency"));
        assert!(listing.contains("read-only"));
    }
}
