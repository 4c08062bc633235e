use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_cloudwatchlogs as logs;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;

use super::regional_config;
use crate::app::query::{ClientFactory, EngineSettings, ResourceSpec, ServiceEngine, ServiceSpec};

#[async_trait]
pub trait LogsApi: Send + Sync {
    async fn describe_log_groups(&self) -> Result<Vec<serde_json::Value>>;
}

pub struct LogsClient {
    client: logs::Client,
}

impl LogsClient {
    pub fn new(sdk_config: &SdkConfig, region: &str) -> Self {
        Self {
            client: logs::Client::new(&regional_config(sdk_config, region)),
        }
    }
}

#[async_trait]
impl LogsApi for LogsClient {
    async fn describe_log_groups(&self) -> Result<Vec<serde_json::Value>> {
        let response = self
            .client
            .describe_log_groups()
            .send()
            .await
            .context("DescribeLogGroups failed")?;
        Ok(response.log_groups().iter().map(log_group_to_json).collect())
    }
}

fn log_group_to_json(log_group: &logs::types::LogGroup) -> serde_json::Value {
    let mut json = serde_json::Map::new();

    if let Some(log_group_name) = &log_group.log_group_name {
        json.insert(
            "LogGroupName".to_string(),
            serde_json::Value::String(log_group_name.clone()),
        );
    }

    // Milliseconds since the epoch, as returned by the API
    if let Some(creation_time) = log_group.creation_time {
        json.insert(
            "CreationTime".to_string(),
            serde_json::Value::Number(creation_time.into()),
        );
    }

    if let Some(retention_in_days) = log_group.retention_in_days {
        json.insert(
            "RetentionInDays".to_string(),
            serde_json::Value::Number(retention_in_days.into()),
        );
    }

    if let Some(metric_filter_count) = log_group.metric_filter_count {
        json.insert(
            "MetricFilterCount".to_string(),
            serde_json::Value::Number(metric_filter_count.into()),
        );
    }

    if let Some(arn) = &log_group.arn {
        json.insert("Arn".to_string(), serde_json::Value::String(arn.clone()));
    }

    if let Some(stored_bytes) = log_group.stored_bytes {
        json.insert(
            "StoredBytes".to_string(),
            serde_json::Value::Number(stored_bytes.into()),
        );
    }

    if let Some(kms_key_id) = &log_group.kms_key_id {
        json.insert("KmsKeyId".to_string(), serde_json::Value::String(kms_key_id.clone()));
    }

    if let Some(log_group_class) = &log_group.log_group_class {
        json.insert(
            "LogGroupClass".to_string(),
            serde_json::Value::String(log_group_class.as_str().to_string()),
        );
    }

    serde_json::Value::Object(json)
}

fn query_log_groups(api: Arc<dyn LogsApi>) -> BoxFuture<'static, Result<Vec<serde_json::Value>>> {
    async move { api.describe_log_groups().await }.boxed()
}

pub static LOGS: ServiceSpec<dyn LogsApi> = ServiceSpec {
    name: "logs",
    timeout: Duration::from_secs(10),
    resources: &[ResourceSpec {
        name: "log-group",
        query: query_log_groups,
    }],
};

pub fn engine(
    sdk_config: &SdkConfig,
    regions: &[String],
    settings: &EngineSettings,
) -> ServiceEngine<dyn LogsApi> {
    let sdk_config = sdk_config.clone();
    let factory: ClientFactory<dyn LogsApi> =
        Arc::new(move |region: &str| Arc::new(LogsClient::new(&sdk_config, region)) as Arc<dyn LogsApi>);
    ServiceEngine::new(&LOGS, regions, settings, factory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::query::{FailurePolicy, QueryError, ResourceQuery};
    use serde_json::json;
    use tokio::time::Instant;

    struct MockLogs {
        fail: bool,
    }

    #[async_trait]
    impl LogsApi for MockLogs {
        async fn describe_log_groups(&self) -> Result<Vec<serde_json::Value>> {
            if self.fail {
                anyhow::bail!("AccessDeniedException: User is not authorized to perform logs:DescribeLogGroups");
            }
            Ok(vec![json!({ "LogGroupName": "/aws/lambda/handler" })])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_denied_region_waits_for_ten_second_deadline() {
        let regions = vec!["us-east-1".to_string(), "me-south-1".to_string()];
        let factory: ClientFactory<dyn LogsApi> = Arc::new(|region: &str| {
            Arc::new(MockLogs {
                fail: region == "me-south-1",
            }) as Arc<dyn LogsApi>
        });
        let settings = EngineSettings {
            failure_policy: FailurePolicy::WaitForDeadline,
            ..Default::default()
        };
        let engine = ServiceEngine::new(&LOGS, &regions, &settings, factory);

        assert!(engine.validate("log-group"));
        assert!(!engine.validate("log-stream"));

        let started = Instant::now();
        let err = engine.query("log-group").await.unwrap_err();

        assert!(err.is_deadline());
        assert!(started.elapsed() >= Duration::from_secs(10));
        assert!(matches!(err, QueryError::DeadlineExceeded { pending: 1, .. }));
    }

    #[test]
    fn test_log_group_conversion() {
        let group = logs::types::LogGroup::builder()
            .log_group_name("/aws/lambda/handler")
            .retention_in_days(14)
            .creation_time(1_700_000_000_000)
            .build();

        let json = log_group_to_json(&group);

        assert_eq!(json["LogGroupName"], json!("/aws/lambda/handler"));
        assert_eq!(json["RetentionInDays"], json!(14));
        assert_eq!(json["CreationTime"], json!(1_700_000_000_000i64));
    }
}
