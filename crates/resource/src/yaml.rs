//! YAML decoding into JSON values.
//!
//! Everything downstream of rendering works on `serde_json::Value`. YAML
//! tags are folded into their long JSON form so that CloudFormation short
//! intrinsics (`!Ref`, `!Sub`, `!GetAtt`) survive the conversion.

use serde::Deserialize;
use serde_json::{Map, Number, Value as Json};
use serde_yaml_ng::Value as Yaml;

/// Convert a YAML value into JSON.
pub fn to_json(value: Yaml) -> Json {
    match value {
        Yaml::Null => Json::Null,
        Yaml::Bool(b) => Json::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Json::from(i)
            } else if let Some(u) = n.as_u64() {
                Json::from(u)
            } else {
                n.as_f64()
                    .and_then(Number::from_f64)
                    .map_or_else(|| Json::String(n.to_string()), Json::Number)
            }
        }
        Yaml::String(s) => Json::String(s),
        Yaml::Sequence(seq) => Json::Array(seq.into_iter().map(to_json).collect()),
        Yaml::Mapping(mapping) => {
            let mut map = Map::new();
            for (k, v) in mapping {
                map.insert(key_to_string(&k), to_json(v));
            }
            Json::Object(map)
        }
        Yaml::Tagged(tagged) => {
            let tag = tagged.tag.to_string();
            let name = tag.trim_start_matches('!');
            let inner = to_json(tagged.value);
            let (key, inner) = match name {
                "Ref" | "Condition" => (name.to_string(), inner),
                "GetAtt" => match inner {
                    Json::String(s) => {
                        let parts: Vec<Json> = s
                            .splitn(2, '.')
                            .map(|p| Json::String(p.to_string()))
                            .collect();
                        ("Fn::GetAtt".to_string(), Json::Array(parts))
                    }
                    other => ("Fn::GetAtt".to_string(), other),
                },
                _ => (format!("Fn::{name}"), inner),
            };
            let mut map = Map::new();
            map.insert(key, inner);
            Json::Object(map)
        }
    }
}

fn key_to_string(key: &Yaml) -> String {
    match key {
        Yaml::String(s) => s.clone(),
        Yaml::Number(n) => n.to_string(),
        Yaml::Bool(b) => b.to_string(),
        Yaml::Null => "null".to_string(),
        other => serde_yaml_ng::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

/// Parse one YAML document into JSON.
pub fn parse_document(content: &str) -> Result<Json, serde_yaml_ng::Error> {
    serde_yaml_ng::from_str::<Yaml>(content).map(to_json)
}

/// Parse a multi-document YAML stream, dropping empty documents.
pub fn parse_documents(content: &str) -> Result<Vec<Json>, serde_yaml_ng::Error> {
    let mut docs = Vec::new();
    for doc in serde_yaml_ng::Deserializer::from_str(content) {
        let value = Yaml::deserialize(doc)?;
        if !value.is_null() {
            docs.push(to_json(value));
        }
    }
    Ok(docs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_documents_skips_empty() {
        let docs = parse_documents("---\na: 1\n---\n---\nb: [x, 2.5]\n").unwrap();
        assert_eq!(docs, vec![json!({"a": 1}), json!({"b": ["x", 2.5]})]);
    }

    #[test]
    fn test_cloudformation_short_tags() {
        let doc = parse_document(
            "Name: !Ref BucketName\nArn: !GetAtt Bucket.Arn\nUrl: !Sub 'https://${Host}'\n",
        )
        .unwrap();
        assert_eq!(
            doc,
            json!({
                "Name": {"Ref": "BucketName"},
                "Arn": {"Fn::GetAtt": ["Bucket", "Arn"]},
                "Url": {"Fn::Sub": "https://${Host}"}
            })
        );
    }

    #[test]
    fn test_non_string_keys() {
        let doc = parse_document("1: one\ntrue: yes\n").unwrap();
        assert_eq!(doc, json!({"1": "one", "true": "yes"}));
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        assert!(parse_documents("a: [unclosed").is_err());
    }
}
