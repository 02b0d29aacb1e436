//! Built-in example policies offered by every shell.

use serde_json::{json, Map, Value as Json};

pub const OVERPERMISSIVE: &str = "overpermissive";
pub const WELL_SCOPED_S3: &str = "well_scoped_s3";
pub const RESOURCE_POLICY: &str = "resource_policy";

/// Example name → policy document, in display order.
pub fn example_policies() -> Map<String, Json> {
    let mut m = Map::new();
    m.insert(
        OVERPERMISSIVE.into(),
        json!({
            "Version": "2012-10-17",
            "Statement": [
                {"Effect": "Allow", "Action": "*", "Resource": "*"}
            ]
        }),
    );
    m.insert(
        WELL_SCOPED_S3.into(),
        json!({
            "Version": "2012-10-17",
            "Statement": [
                {
                    "Effect": "Allow",
                    "Action": ["s3:GetObject", "s3:PutObject"],
                    "Resource": "arn:aws:s3:::my-bucket/*"
                }
            ]
        }),
    );
    m.insert(
        RESOURCE_POLICY.into(),
        json!({
            "Version": "2012-10-17",
            "Statement": [
                {
                    "Sid": "AllowPublicRead",
                    "Effect": "Allow",
                    "Principal": "*",
                    "Action": "s3:GetObject",
                    "Resource": "arn:aws:s3:::my-public-bucket/*"
                }
            ]
        }),
    );
    m
}

pub fn example(name: &str) -> Option<Json> {
    example_policies().remove(name)
}

/// Pretty JSON for an example, ready to drop into an input buffer.
pub fn example_text(name: &str) -> Option<String> {
    example(name).and_then(|v| serde_json::to_string_pretty(&v).ok())
}
