//! Structural comparison of JSON values.
//!
//! Objects are compared by key (order does not matter), arrays by index,
//! everything else by value. Added or removed subtrees are reported leaf
//! by leaf so that every change carries a full path.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Create => "create",
            ChangeKind::Update => "update",
            ChangeKind::Delete => "delete",
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One changed leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    pub path: Vec<String>,
    pub from: Option<Value>,
    pub to: Option<Value>,
}

impl FieldChange {
    /// Path joined with dots, for display.
    pub fn dotted_path(&self) -> String {
        self.path.join(".")
    }
}

/// Compare two values; equal values produce no changes.
pub fn diff_values(from: &Value, to: &Value) -> Vec<FieldChange> {
    let mut changes = Vec::new();
    walk(&mut Vec::new(), Some(from), Some(to), &mut changes);
    changes
}

/// List every leaf of `value` as created (or deleted) from nothing.
pub fn leaves(value: &Value, kind: ChangeKind) -> Vec<FieldChange> {
    let mut changes = Vec::new();
    match kind {
        ChangeKind::Delete => walk(&mut Vec::new(), Some(value), None, &mut changes),
        _ => walk(&mut Vec::new(), None, Some(value), &mut changes),
    }
    changes
}

fn walk(path: &mut Vec<String>, from: Option<&Value>, to: Option<&Value>, out: &mut Vec<FieldChange>) {
    match (from, to) {
        (Some(Value::Object(a)), Some(Value::Object(b))) => {
            let mut keys: Vec<&String> = a.keys().chain(b.keys()).collect();
            keys.sort();
            keys.dedup();
            for key in keys {
                path.push(key.clone());
                walk(path, a.get(key), b.get(key), out);
                path.pop();
            }
        }
        (Some(Value::Array(a)), Some(Value::Array(b))) => {
            for i in 0..a.len().max(b.len()) {
                path.push(i.to_string());
                walk(path, a.get(i), b.get(i), out);
                path.pop();
            }
        }
        (Some(a), Some(b)) => {
            if a != b {
                out.push(FieldChange {
                    kind: ChangeKind::Update,
                    path: path.clone(),
                    from: Some(a.clone()),
                    to: Some(b.clone()),
                });
            }
        }
        (None, Some(b)) => one_sided(path, b, ChangeKind::Create, out),
        (Some(a), None) => one_sided(path, a, ChangeKind::Delete, out),
        (None, None) => {}
    }
}

fn one_sided(path: &mut Vec<String>, value: &Value, kind: ChangeKind, out: &mut Vec<FieldChange>) {
    let children: Vec<(String, &Value)> = match value {
        Value::Object(map) if !map.is_empty() => {
            map.iter().map(|(k, v)| (k.clone(), v)).collect()
        }
        Value::Array(items) if !items.is_empty() => items
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        leaf => {
            let (from, to) = match kind {
                ChangeKind::Delete => (Some(leaf.clone()), None),
                _ => (None, Some(leaf.clone())),
            };
            out.push(FieldChange {
                kind,
                path: path.clone(),
                from,
                to,
            });
            return;
        }
    };
    for (key, child) in children {
        path.push(key);
        one_sided(path, child, kind, out);
        path.pop();
    }
}
