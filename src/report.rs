//! Plain-text rendering of a diff outcome.

use crate::ui::plural;
use colored::Colorize;
use entrypoint::Entrypoint;
use orchestrator::{DiffOutcome, EntrypointDiff};
use resource::{ChangeKind, DiffSummary, FieldChange, ResourceChange};
use serde_json::Value;
use std::fmt::Write;

/// Render the outcome grouped by entrypoint, then resource, then field.
pub fn render(outcome: &DiffOutcome) -> String {
    let mut out = String::new();
    for diff in &outcome.diffs {
        entrypoint_block(&mut out, diff);
    }
    out.push('\n');
    out.push_str(&summary_line(&outcome.summary(), outcome.diffs.len()));
    out.push('\n');
    out
}

pub fn entrypoint_label(entrypoint: &Entrypoint) -> String {
    let directory = if entrypoint.directory.is_empty() {
        "."
    } else {
        entrypoint.directory.as_str()
    };
    format!(
        "{} ({}, {})",
        entrypoint.name, entrypoint.entrypoint_type, directory
    )
}

fn entrypoint_block(out: &mut String, diff: &EntrypointDiff) {
    let _ = writeln!(out, "\n{}", entrypoint_label(&diff.entrypoint).bold());

    if let Some(error) = &diff.error {
        let _ = writeln!(out, "  {} {}", "✗".red(), error);
        return;
    }
    if diff.changes.is_empty() {
        let _ = writeln!(out, "  {}", "no changes".dimmed());
        return;
    }
    for change in &diff.changes {
        resource_block(out, change);
    }
}

fn resource_block(out: &mut String, change: &ResourceChange) {
    let marker = match change.kind {
        ChangeKind::Create => "+".green(),
        ChangeKind::Update => "~".yellow(),
        ChangeKind::Delete => "-".red(),
    };
    let _ = writeln!(
        out,
        "  {} {} {}",
        marker,
        change.identifier(),
        format!("({})", change.name()).dimmed()
    );
    for field in &change.diff {
        let _ = writeln!(out, "      {}", field_line(field));
    }
}

/// One line per changed field.
pub fn field_line(field: &FieldChange) -> String {
    let path = if field.path.is_empty() {
        "(root)".to_string()
    } else {
        field.dotted_path()
    };
    match field.kind {
        ChangeKind::Create => format!(
            "{path}: created with initial value {}",
            format_value(field.to.as_ref())
        ),
        ChangeKind::Update => format!(
            "{path}: {} → {}",
            format_value(field.from.as_ref()),
            format_value(field.to.as_ref())
        ),
        ChangeKind::Delete => format!(
            "{path}: deleted, previous value was {}",
            format_value(field.from.as_ref())
        ),
    }
}

fn format_value(value: Option<&Value>) -> String {
    value.map_or_else(|| "null".to_string(), Value::to_string)
}

pub fn summary_line(summary: &DiffSummary, entrypoints: usize) -> String {
    if !summary.has_changes() {
        return format!(
            "No resource changes across {}",
            plural(entrypoints, "entrypoint", "entrypoints")
        );
    }
    format!(
        "{} across {}: {} to create, {} to update, {} to delete",
        plural(summary.total(), "resource change", "resource changes"),
        plural(entrypoints, "entrypoint", "entrypoints"),
        summary.creates,
        summary.updates,
        summary.deletes
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use entrypoint::EntrypointType;
    use resource::{KubeObject, OriginContext, Resource, ResourceSet, diff};
    use serde_json::json;

    fn plain() {
        colored::control::set_override(false);
    }

    fn field(kind: ChangeKind, path: &[&str], from: Option<Value>, to: Option<Value>) -> FieldChange {
        FieldChange {
            kind,
            path: path.iter().map(|s| s.to_string()).collect(),
            from,
            to,
        }
    }

    fn kube(name: &str, replicas: u64) -> Value {
        json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {"name": name, "namespace": "default"},
            "spec": {"replicas": replicas}
        })
    }

    fn set(docs: Vec<Value>) -> ResourceSet {
        docs.into_iter()
            .map(|doc| Resource::Kubernetes(KubeObject::new(doc)))
            .collect()
    }

    #[test]
    fn test_field_lines() {
        assert_eq!(
            field_line(&field(
                ChangeKind::Update,
                &["spec", "replicas"],
                Some(json!(1)),
                Some(json!(3))
            )),
            "spec.replicas: 1 → 3"
        );
        assert_eq!(
            field_line(&field(
                ChangeKind::Create,
                &["data", "key"],
                None,
                Some(json!("v"))
            )),
            "data.key: created with initial value \"v\""
        );
        assert_eq!(
            field_line(&field(ChangeKind::Delete, &["a", "0"], Some(json!(true)), None)),
            "a.0: deleted, previous value was true"
        );
    }

    #[test]
    fn test_root_entrypoint_label() {
        let ep = Entrypoint::new("", EntrypointType::Terraform);
        assert_eq!(entrypoint_label(&ep), "root (terraform, .)");
    }

    #[test]
    fn test_render_groups_by_entrypoint() {
        plain();
        let pre = set(vec![kube("web", 1)]);
        let post = set(vec![kube("web", 3), kube("api", 1)]);
        let changes = diff(Some(&pre), Some(&post), &OriginContext::default());

        let outcome = DiffOutcome {
            diffs: vec![
                EntrypointDiff {
                    entrypoint: Entrypoint::new("overlays/a", EntrypointType::Kustomize),
                    changes,
                    error: None,
                },
                EntrypointDiff {
                    entrypoint: Entrypoint::new("infra", EntrypointType::Terraform),
                    changes: Vec::new(),
                    error: Some("terraform is not installed or not on PATH".into()),
                },
                EntrypointDiff {
                    entrypoint: Entrypoint::new("raw", EntrypointType::Kubernetes),
                    changes: Vec::new(),
                    error: None,
                },
            ],
            ..Default::default()
        };

        let text = render(&outcome);
        let a = text.find("overlays-a (kustomize, overlays/a)").unwrap();
        let infra = text.find("infra (terraform, infra)").unwrap();
        assert!(a < infra);
        assert!(text.contains("  ~ apps/v1/Deployment[default/web] (default/web)"));
        assert!(text.contains("      spec.replicas: 1 → 3"));
        assert!(text.contains("  + apps/v1/Deployment[default/api] (default/api)"));
        assert!(text.contains("✗ terraform is not installed"));
        assert!(text.contains("no changes"));
        assert!(text.contains(
            "2 resource changes across 3 entrypoints: 1 to create, 1 to update, 0 to delete"
        ));
    }

    #[test]
    fn test_summary_without_changes() {
        assert_eq!(
            summary_line(&DiffSummary::default(), 1),
            "No resource changes across 1 entrypoint"
        );
    }
}
