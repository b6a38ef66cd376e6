//! CloudFormation templates.

use crate::locate;
use entrypoint::Entrypoint;
use resource::yaml::to_json;
use resource::{CfnResource, Error, Renderer, Resource, ResourceSet, Result};
use runner::CancelToken;
use serde_yaml_ng::Value as Yaml;
use std::fs;
use std::path::Path;

/// Parses the template file named by the entrypoint.
///
/// JSON and YAML templates both go through the YAML parser so that
/// `Resources` keep their document order.
#[derive(Debug, Clone, Copy, Default)]
pub struct CloudFormationRenderer;

impl Renderer for CloudFormationRenderer {
    fn render(&self, root: &Path, entrypoint: &Entrypoint, cancel: &CancelToken) -> Result<ResourceSet> {
        let Some(path) = locate(root, entrypoint) else {
            return Ok(ResourceSet::new());
        };
        cancel.check()?;

        let content = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        let resources = template_resources(&content, &entrypoint.directory)?;
        Ok(resources.into_iter().map(Resource::CloudFormation).collect())
    }
}

/// The entries of a template's `Resources` section, in document order.
pub fn template_resources(content: &str, what: &str) -> Result<Vec<CfnResource>> {
    let doc: Yaml = serde_yaml_ng::from_str(content).map_err(|e| Error::parse(what, e))?;
    if !doc.is_mapping() {
        return Err(Error::parse(what, "template is not a mapping"));
    }

    let Some(Yaml::Mapping(resources)) = doc.get("Resources") else {
        log::debug!("{what}: template has no Resources section");
        return Ok(Vec::new());
    };

    Ok(resources
        .iter()
        .filter_map(|(key, definition)| {
            let logical_id = key.as_str()?;
            Some(CfnResource::new(logical_id, to_json(definition.clone())))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use entrypoint::EntrypointType;
    use serde_json::json;

    #[test]
    fn test_yaml_template_in_document_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("stacks")).unwrap();
        fs::write(
            dir.path().join("stacks/queue.yaml"),
            "AWSTemplateFormatVersion: '2010-09-09'\nResources:\n  Topic:\n    Type: AWS::SNS::Topic\n  Queue:\n    Type: AWS::SQS::Queue\n    Properties:\n      QueueName: !Sub '${AWS::StackName}-jobs'\n",
        )
        .unwrap();

        let ep = Entrypoint::new("stacks/queue.yaml", EntrypointType::Cloudformation);
        let set = CloudFormationRenderer
            .render(dir.path(), &ep, &CancelToken::new())
            .unwrap();

        let ids: Vec<_> = set.iter().map(Resource::identifier).collect();
        assert_eq!(ids, vec!["AWS::SNS::Topic[Topic]", "AWS::SQS::Queue[Queue]"]);
        assert_eq!(
            set.get("AWS::SQS::Queue[Queue]").unwrap().canonical()["Properties"]["QueueName"],
            json!({"Fn::Sub": "${AWS::StackName}-jobs"})
        );
    }

    #[test]
    fn test_json_template() {
        let resources = template_resources(
            r#"{"Resources": {"Bucket": {"Type": "AWS::S3::Bucket", "Properties": {"Tags": []}}}}"#,
            "bucket.json",
        )
        .unwrap();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].identifier(), "AWS::S3::Bucket[Bucket]");
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ep = Entrypoint::new("stacks/gone.yaml", EntrypointType::Cloudformation);
        let set = CloudFormationRenderer
            .render(dir.path(), &ep, &CancelToken::new())
            .unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_non_mapping_is_parse_error() {
        assert!(matches!(
            template_resources("- a\n- b\n", "list.yaml"),
            Err(Error::Parse { .. })
        ));
    }
}
