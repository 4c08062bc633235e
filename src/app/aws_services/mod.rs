//! AWS service engines.
//!
//! Each module describes one AWS service: a narrow capability trait listing
//! only the operations its resources need, an SDK-backed implementation bound
//! to one region, the static resource table, and an `engine` constructor.
//! SDK model types are converted to PascalCase JSON objects here so the query
//! engine only ever sees opaque `serde_json::Value` records.

pub mod cloudformation;
pub mod cloudwatch;
pub mod configservice;
pub mod ec2;
pub mod ecr;
pub mod ecs;
pub mod efs;
pub mod iam;
pub mod lambda;
pub mod logs;
pub mod route53;
pub mod s3;

use aws_config::SdkConfig;
use aws_smithy_types::date_time::Format;
use aws_smithy_types::DateTime;
use aws_types::region::Region;

/// Copy of `base` with only the region replaced
pub fn regional_config(base: &SdkConfig, region: &str) -> SdkConfig {
    base.to_builder()
        .region(Region::new(region.to_string()))
        .build()
}

/// RFC 3339 rendering of an SDK timestamp
pub(crate) fn datetime_to_json(value: &DateTime) -> serde_json::Value {
    match value.fmt(Format::DateTime) {
        Ok(formatted) => serde_json::Value::String(formatted),
        Err(_) => serde_json::Value::String(value.to_string()),
    }
}

/// `[{"Key": .., "Value": ..}]` from key/value pairs
pub(crate) fn tags_to_json<'a>(
    tags: impl IntoIterator<Item = (Option<&'a str>, Option<&'a str>)>,
) -> serde_json::Value {
    let tags_json: Vec<serde_json::Value> = tags
        .into_iter()
        .map(|(key, value)| {
            let mut tag_json = serde_json::Map::new();
            if let Some(key) = key {
                tag_json.insert("Key".to_string(), serde_json::Value::String(key.to_string()));
            }
            if let Some(value) = value {
                tag_json.insert(
                    "Value".to_string(),
                    serde_json::Value::String(value.to_string()),
                );
            }
            serde_json::Value::Object(tag_json)
        })
        .collect();
    serde_json::Value::Array(tags_json)
}

/// JSON array of strings
pub(crate) fn strings_to_json<'a>(values: impl IntoIterator<Item = &'a str>) -> serde_json::Value {
    serde_json::Value::Array(
        values
            .into_iter()
            .map(|v| serde_json::Value::String(v.to_string()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_datetime_renders_rfc3339() {
        let value = DateTime::from_secs(1_700_000_000);
        assert_eq!(datetime_to_json(&value), json!("2023-11-14T22:13:20Z"));
    }

    #[test]
    fn test_tags_skip_missing_parts() {
        let rendered = tags_to_json(vec![(Some("env"), Some("prod")), (Some("owner"), None)]);
        assert_eq!(
            rendered,
            json!([{"Key": "env", "Value": "prod"}, {"Key": "owner"}])
        );
    }

    #[test]
    fn test_regional_config_overrides_region_only() {
        let base = SdkConfig::builder()
            .region(Region::new("us-east-1"))
            .build();
        let regional = regional_config(&base, "eu-west-3");

        assert_eq!(regional.region().map(|r| r.to_string()), Some("eu-west-3".to_string()));
        assert_eq!(base.region().map(|r| r.to_string()), Some("us-east-1".to_string()));
    }
}
