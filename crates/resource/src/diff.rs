//! Resource-level diff between two renders of one entrypoint.

use crate::model::Resource;
use crate::origin::{Origin, OriginContext, SideContext, resolve_origin};
use crate::set::ResourceSet;
use crate::structural::{ChangeKind, FieldChange, diff_values, leaves};
use serde::Serialize;
use serde::ser::{SerializeStruct, Serializer};

/// A resource as exposed in a diff, with internal annotations removed.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangedResource {
    pub resource: Resource,
    pub origin: Origin,
}

impl ChangedResource {
    fn new(resource: &Resource, directory: &str, side: &SideContext) -> Self {
        Self {
            origin: resolve_origin(directory, side, resource.native_origin()),
            resource: resource.cleaned(),
        }
    }
}

impl Serialize for ChangedResource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ChangedResource", 5)?;
        state.serialize_field("type", self.resource.type_name())?;
        state.serialize_field("identifier", &self.resource.identifier())?;
        state.serialize_field("name", &self.resource.name())?;
        state.serialize_field("resource", &self.resource.canonical())?;
        state.serialize_field("origin", &self.origin)?;
        state.end()
    }
}

/// One created, updated or deleted resource.
///
/// `pre` is absent for creates, `post` for deletes. Updates always carry
/// both sides and a non-empty field list.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceChange {
    pub kind: ChangeKind,
    pub pre: Option<ChangedResource>,
    pub post: Option<ChangedResource>,
    pub diff: Vec<FieldChange>,
}

impl ResourceChange {
    fn present(&self) -> Option<&Resource> {
        self.post.as_ref().or(self.pre.as_ref()).map(|side| &side.resource)
    }

    pub fn identifier(&self) -> String {
        self.present().map(Resource::identifier).unwrap_or_default()
    }

    pub fn name(&self) -> String {
        self.present().map(Resource::name).unwrap_or_default()
    }

    pub fn resource_type(&self) -> &'static str {
        self.present().map_or("", Resource::type_name)
    }
}

impl Serialize for ResourceChange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ResourceChange", 7)?;
        state.serialize_field("type", &self.kind)?;
        state.serialize_field("identifier", &self.identifier())?;
        state.serialize_field("name", &self.name())?;
        state.serialize_field("resourceType", self.resource_type())?;
        state.serialize_field("pre", &self.pre)?;
        state.serialize_field("post", &self.post)?;
        state.serialize_field("diff", &self.diff)?;
        state.end()
    }
}

/// Compare the pre and post renders of one entrypoint.
///
/// A missing set is treated as empty. Creates and updates follow the
/// post set's order, deletes follow the pre set's order. Resources whose
/// canonical forms are equal produce nothing.
pub fn diff(
    pre: Option<&ResourceSet>,
    post: Option<&ResourceSet>,
    ctx: &OriginContext,
) -> Vec<ResourceChange> {
    let empty = ResourceSet::new();
    let pre = pre.unwrap_or(&empty);
    let post = post.unwrap_or(&empty);
    let mut changes = Vec::new();

    for after in post {
        let id = after.identifier();
        match pre.get(&id) {
            None => {
                log::debug!("{id}: created");
                changes.push(ResourceChange {
                    kind: ChangeKind::Create,
                    pre: None,
                    post: Some(ChangedResource::new(after, &ctx.directory, &ctx.post)),
                    diff: leaves(&after.canonical(), ChangeKind::Create),
                });
            }
            Some(before) => {
                let fields = diff_values(&before.canonical(), &after.canonical());
                if fields.is_empty() {
                    continue;
                }
                log::debug!("{id}: {} field(s) changed", fields.len());
                changes.push(ResourceChange {
                    kind: ChangeKind::Update,
                    pre: Some(ChangedResource::new(before, &ctx.directory, &ctx.pre)),
                    post: Some(ChangedResource::new(after, &ctx.directory, &ctx.post)),
                    diff: fields,
                });
            }
        }
    }

    for before in pre {
        if post.contains(&before.identifier()) {
            continue;
        }
        log::debug!("{}: deleted", before.identifier());
        changes.push(ResourceChange {
            kind: ChangeKind::Delete,
            pre: Some(ChangedResource::new(before, &ctx.directory, &ctx.pre)),
            post: None,
            diff: leaves(&before.canonical(), ChangeKind::Delete),
        });
    }

    changes
}

/// Summary counts over a list of changes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffSummary {
    pub creates: usize,
    pub updates: usize,
    pub deletes: usize,
}

impl DiffSummary {
    pub fn from_changes<'a>(changes: impl IntoIterator<Item = &'a ResourceChange>) -> Self {
        let mut summary = Self::default();
        for change in changes {
            match change.kind {
                ChangeKind::Create => summary.creates += 1,
                ChangeKind::Update => summary.updates += 1,
                ChangeKind::Delete => summary.deletes += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.creates + self.updates + self.deletes
    }

    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CfnResource, KubeObject, NativeOrigin};
    use serde_json::{Value, json};

    fn config_map(name: &str, value: &str) -> Resource {
        Resource::Kustomize(
            KubeObject::new(json!({
                "apiVersion": "v1",
                "kind": "ConfigMap",
                "metadata": {
                    "name": name,
                    "annotations": {"config.kubernetes.io/origin": "path: cm.yaml\n"}
                },
                "data": {"key": value}
            }))
            .with_origin(NativeOrigin::path("cm.yaml")),
        )
    }

    fn secret(name: &str) -> Resource {
        Resource::Kustomize(KubeObject::new(json!({
            "apiVersion": "v1",
            "kind": "Secret",
            "metadata": {"name": name},
            "data": {"token": "c2VjcmV0"}
        })))
    }

    fn ctx() -> OriginContext {
        OriginContext {
            directory: "overlays/a".into(),
            pre: SideContext::new("https://git.example.com/infra.git", "v1"),
            post: SideContext::new("https://git.example.com/infra.git", "v2"),
        }
    }

    #[test]
    fn test_update_and_create() {
        let pre: ResourceSet = [config_map("cm-1", "v1")].into_iter().collect();
        let post: ResourceSet = [config_map("cm-1", "v2"), secret("sec-1")]
            .into_iter()
            .collect();

        let changes = diff(Some(&pre), Some(&post), &ctx());
        assert_eq!(changes.len(), 2);

        let update = &changes[0];
        assert_eq!(update.kind, ChangeKind::Update);
        assert_eq!(update.identifier(), "v1/ConfigMap[cm-1]");
        assert_eq!(update.diff.len(), 1);
        assert_eq!(update.diff[0].path, vec!["data", "key"]);
        assert_eq!(update.diff[0].from, Some(json!("v1")));
        assert_eq!(update.diff[0].to, Some(json!("v2")));

        let create = &changes[1];
        assert_eq!(create.kind, ChangeKind::Create);
        assert!(create.pre.is_none());
        assert_eq!(create.name(), "sec-1");
    }

    #[test]
    fn test_identical_sets_produce_nothing() {
        let set: ResourceSet = [config_map("a", "x"), secret("b")].into_iter().collect();
        assert!(diff(Some(&set), Some(&set.clone()), &ctx()).is_empty());
    }

    #[test]
    fn test_missing_post_deletes_everything_in_order() {
        let pre: ResourceSet = [secret("z"), config_map("a", "x")].into_iter().collect();
        let changes = diff(Some(&pre), None, &ctx());
        let summary: Vec<_> = changes.iter().map(|c| (c.kind, c.name())).collect();
        assert_eq!(
            summary,
            vec![
                (ChangeKind::Delete, "z".to_string()),
                (ChangeKind::Delete, "a".to_string()),
            ]
        );
        assert!(changes.iter().all(|c| c.post.is_none()));
        assert!(changes[0].diff.iter().all(|f| f.kind == ChangeKind::Delete));
    }

    #[test]
    fn test_missing_pre_creates_everything() {
        let post: ResourceSet = [secret("s")].into_iter().collect();
        let changes = diff(None, Some(&post), &ctx());
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::Create);
        assert!(changes[0].diff.iter().any(|f| f.dotted_path() == "data.token"));
    }

    #[test]
    fn test_origin_per_side_and_rerooted() {
        let pre: ResourceSet = [config_map("cm-1", "v1")].into_iter().collect();
        let post: ResourceSet = [config_map("cm-1", "v2")].into_iter().collect();
        let change = &diff(Some(&pre), Some(&post), &ctx())[0];

        let pre_origin = &change.pre.as_ref().unwrap().origin;
        let post_origin = &change.post.as_ref().unwrap().origin;
        assert_eq!(pre_origin.reference, "v1");
        assert_eq!(post_origin.reference, "v2");
        assert_eq!(post_origin.path, "overlays/a/cm.yaml");
    }

    #[test]
    fn test_internal_annotations_not_exposed() {
        let post: ResourceSet = [config_map("cm-1", "v1")].into_iter().collect();
        let changes = diff(None, Some(&post), &ctx());
        let json = serde_json::to_value(&changes[0]).unwrap();
        assert_eq!(json["type"], "create");
        assert_eq!(json["resourceType"], "kustomize");
        assert_eq!(json["pre"], Value::Null);
        assert!(json["post"]["resource"]["metadata"].get("annotations").is_none());
        assert_eq!(json["post"]["origin"]["ref"], "v2");
        assert!(changes[0]
            .diff
            .iter()
            .all(|f| !f.dotted_path().contains("config.kubernetes.io")));
    }

    #[test]
    fn test_annotation_only_change_is_ignored() {
        let mut a = config_map("cm", "x");
        if let Resource::Kustomize(obj) = &mut a {
            obj.manifest["metadata"]["annotations"]["config.kubernetes.io/origin"] =
                json!("path: other.yaml\n");
        }
        let pre: ResourceSet = [config_map("cm", "x")].into_iter().collect();
        let post: ResourceSet = [a].into_iter().collect();
        assert!(diff(Some(&pre), Some(&post), &ctx()).is_empty());
    }

    #[test]
    fn test_summary_counts() {
        let pre: ResourceSet = [
            Resource::CloudFormation(CfnResource::new("Gone", json!({"Type": "AWS::SQS::Queue"}))),
            config_map("cm", "1"),
        ]
        .into_iter()
        .collect();
        let post: ResourceSet = [config_map("cm", "2"), secret("new")].into_iter().collect();
        let summary = DiffSummary::from_changes(&diff(Some(&pre), Some(&post), &ctx()));
        assert_eq!(
            summary,
            DiffSummary {
                creates: 1,
                updates: 1,
                deletes: 1
            }
        );
        assert_eq!(summary.total(), 3);
        assert!(summary.has_changes());
    }
}
