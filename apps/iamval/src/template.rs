//! Extraction of embedded policy documents from CloudFormation templates.
//!
//! Roles (inline policies, then the assume-role document), standalone and
//! managed IAM policies, and S3 bucket policies are extracted. Output follows
//! template order (`serde_json` is built with `preserve_order`).

use crate::models::{ExtractedPolicy, PolicyDocument, PolicyType};
use crate::source::{read_file, InputError};
use serde_json::{Map, Value as Json};
use serde_yaml::Value as Yaml;
use std::path::{Path, PathBuf};

pub const IAM_ROLE: &str = "AWS::IAM::Role";
pub const IAM_POLICY: &str = "AWS::IAM::Policy";
pub const IAM_MANAGED_POLICY: &str = "AWS::IAM::ManagedPolicy";
pub const S3_BUCKET_POLICY: &str = "AWS::S3::BucketPolicy";

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("Template '{}' is not valid JSON: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Template '{}' is not valid YAML: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Load and parse a template; `.yaml`/`.yml` files go through the YAML parser.
pub fn load_template(path: &Path) -> Result<Json, TemplateError> {
    let text = read_file(path)?;
    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
        .unwrap_or(false);
    if is_yaml {
        let value: Yaml = serde_yaml::from_str(&text).map_err(|source| TemplateError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(yaml_to_json(value))
    } else {
        serde_json::from_str(&text).map_err(|source| TemplateError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Convert YAML to JSON, expanding CloudFormation short-form intrinsics
/// (`!Ref x` to `{"Ref": x}`, `!Sub s` to `{"Fn::Sub": s}`).
fn yaml_to_json(value: Yaml) -> Json {
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
                    .and_then(serde_json::Number::from_f64)
                    .map(Json::Number)
                    .unwrap_or(Json::Null)
            }
        }
        Yaml::String(s) => Json::String(s),
        Yaml::Sequence(items) => Json::Array(items.into_iter().map(yaml_to_json).collect()),
        Yaml::Mapping(map) => {
            let mut out = Map::new();
            for (k, v) in map {
                let key = match k {
                    Yaml::String(s) => s,
                    Yaml::Bool(b) => b.to_string(),
                    Yaml::Number(n) => n.to_string(),
                    other => {
                        tracing::debug!(key = ?other, "skipping non-scalar mapping key");
                        continue;
                    }
                };
                out.insert(key, yaml_to_json(v));
            }
            Json::Object(out)
        }
        Yaml::Tagged(tagged) => {
            let serde_yaml::value::TaggedValue { tag, value } = *tagged;
            let tag = tag.to_string();
            let name = tag.trim_start_matches('!');
            let key = match name {
                "Ref" | "Condition" => name.to_string(),
                _ => format!("Fn::{}", name),
            };
            let inner = match (name, value) {
                ("GetAtt", Yaml::String(s)) => match s.split_once('.') {
                    Some((res, attr)) => Json::Array(vec![res.into(), attr.into()]),
                    None => Json::String(s),
                },
                (_, v) => yaml_to_json(v),
            };
            let mut out = Map::new();
            out.insert(key, inner);
            Json::Object(out)
        }
    }
}

/// Read a template file and extract its policies.
pub fn extract_from_file(path: &Path) -> Result<Vec<ExtractedPolicy>, TemplateError> {
    let template = load_template(path)?;
    let policies = extract_policies(&template);
    tracing::debug!(
        template = %path.display(),
        count = policies.len(),
        "extracted policies from template"
    );
    Ok(policies)
}

/// Walk `Resources` and emit one `ExtractedPolicy` per embedded document.
pub fn extract_policies(template: &Json) -> Vec<ExtractedPolicy> {
    let mut out = Vec::new();
    let Some(resources) = template.get("Resources").and_then(Json::as_object) else {
        return out;
    };
    for (name, resource) in resources {
        let kind = resource.get("Type").and_then(Json::as_str).unwrap_or("");
        let props = resource.get("Properties");
        match kind {
            IAM_ROLE => extract_role(name, props, &mut out),
            IAM_POLICY | IAM_MANAGED_POLICY => {
                push_document(&mut out, name.clone(), props, PolicyType::IdentityPolicy)
            }
            S3_BUCKET_POLICY => {
                push_document(&mut out, name.clone(), props, PolicyType::ResourcePolicy)
            }
            _ => {}
        }
    }
    out
}

fn extract_role(name: &str, props: Option<&Json>, out: &mut Vec<ExtractedPolicy>) {
    let Some(props) = props else { return };
    if let Some(inline) = props.get("Policies").and_then(Json::as_array) {
        for policy in inline {
            let policy_name = policy
                .get("PolicyName")
                .and_then(Json::as_str)
                .unwrap_or("inline");
            push_document(
                out,
                format!("{}-{}", name, policy_name),
                Some(policy),
                PolicyType::IdentityPolicy,
            );
        }
    }
    if let Some(doc) = props
        .get("AssumeRolePolicyDocument")
        .and_then(PolicyDocument::from_value)
    {
        out.push(ExtractedPolicy {
            name: format!("{}-AssumeRolePolicy", name),
            document: doc,
            policy_type: PolicyType::IdentityPolicy,
        });
    }
}

fn push_document(
    out: &mut Vec<ExtractedPolicy>,
    name: String,
    holder: Option<&Json>,
    policy_type: PolicyType,
) {
    match holder
        .and_then(|h| h.get("PolicyDocument"))
        .and_then(PolicyDocument::from_value)
    {
        Some(document) => out.push(ExtractedPolicy {
            name,
            document,
            policy_type,
        }),
        None => tracing::debug!(resource = %name, "no usable PolicyDocument; skipped"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    fn allow_all() -> Json {
        json!({"Version": "2012-10-17", "Statement": [{"Effect": "Allow", "Action": "*", "Resource": "*"}]})
    }

    #[test]
    fn test_role_with_two_inline_policies_and_trust_document() {
        let template = json!({
            "Resources": {
                "AppRole": {
                    "Type": "AWS::IAM::Role",
                    "Properties": {
                        "AssumeRolePolicyDocument": allow_all(),
                        "Policies": [
                            {"PolicyName": "Read", "PolicyDocument": allow_all()},
                            {"PolicyName": "Write", "PolicyDocument": allow_all()}
                        ]
                    }
                }
            }
        });
        let got = extract_policies(&template);
        let names: Vec<_> = got.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["AppRole-Read", "AppRole-Write", "AppRole-AssumeRolePolicy"]
        );
        assert!(got
            .iter()
            .all(|p| p.policy_type == PolicyType::IdentityPolicy));
    }

    #[test]
    fn test_bucket_policy_is_resource_policy() {
        let template = json!({
            "Resources": {
                "Bucket": {"Type": "AWS::S3::Bucket", "Properties": {}},
                "BucketPolicy": {
                    "Type": "AWS::S3::BucketPolicy",
                    "Properties": {"Bucket": {"Ref": "Bucket"}, "PolicyDocument": allow_all()}
                }
            }
        });
        let got = extract_policies(&template);
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].name, "BucketPolicy");
        assert_eq!(got[0].policy_type, PolicyType::ResourcePolicy);
    }

    #[test]
    fn test_missing_subfields_are_skipped_not_errors() {
        let template = json!({
            "Resources": {
                "NoProps": {"Type": "AWS::IAM::Role"},
                "NoDoc": {"Type": "AWS::IAM::Policy", "Properties": {"PolicyName": "x"}},
                "Unnamed": {
                    "Type": "AWS::IAM::Role",
                    "Properties": {"Policies": [{"PolicyDocument": allow_all()}, {"PolicyName": "Empty"}]}
                },
                "Managed": {"Type": "AWS::IAM::ManagedPolicy", "Properties": {"PolicyDocument": allow_all()}}
            }
        });
        let got = extract_policies(&template);
        let names: Vec<_> = got.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Unnamed-inline", "Managed"]);
    }

    #[test]
    fn test_template_without_resources_is_empty() {
        assert!(extract_policies(&json!({"AWSTemplateFormatVersion": "2010-09-09"})).is_empty());
    }

    #[test]
    fn test_load_yaml_and_reject_bad_json() {
        let dir = tempdir().unwrap();
        let yml = dir.path().join("stack.yaml");
        fs::write(
            &yml,
            r#"
Resources:
  Pol:
    Type: AWS::IAM::Policy
    Properties:
      PolicyDocument:
        Version: "2012-10-17"
        Statement:
          - Effect: Allow
            Action: "s3:GetObject"
            Resource: "*"
"#,
        )
        .unwrap();
        let got = extract_from_file(&yml).unwrap();
        assert_eq!(got.len(), 1);
        assert!(got[0].document.as_str().contains("s3:GetObject"));

        let short_form = dir.path().join("short.yml");
        fs::write(
            &short_form,
            r#"
Resources:
  BP:
    Type: AWS::S3::BucketPolicy
    Properties:
      Bucket: !Ref Bucket
      PolicyDocument:
        Version: "2012-10-17"
        Statement:
          - Effect: Allow
            Principal: "*"
            Action: s3:GetObject
            Resource: !Sub "arn:aws:s3:::${Bucket}/*"
          - Effect: Deny
            Principal: "*"
            Action: s3:*
            Resource: !GetAtt Bucket.Arn
"#,
        )
        .unwrap();
        let got = extract_from_file(&short_form).unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].policy_type, PolicyType::ResourcePolicy);
        let doc: Json = serde_json::from_str(got[0].document.as_str()).unwrap();
        assert_eq!(
            doc["Statement"][0]["Resource"],
            json!({"Fn::Sub": "arn:aws:s3:::${Bucket}/*"})
        );
        assert_eq!(
            doc["Statement"][1]["Resource"],
            json!({"Fn::GetAtt": ["Bucket", "Arn"]})
        );

        let bad = dir.path().join("stack.json");
        fs::write(&bad, "{ not json").unwrap();
        assert!(matches!(
            extract_from_file(&bad),
            Err(TemplateError::Json { .. })
        ));
    }
}
