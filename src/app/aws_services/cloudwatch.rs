use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_cloudwatch as cloudwatch;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;

use super::regional_config;
use crate::app::query::{ClientFactory, EngineSettings, ResourceSpec, ServiceEngine, ServiceSpec};

#[async_trait]
pub trait CloudWatchApi: Send + Sync {
    /// First page of ListMetrics
    async fn list_metrics(&self) -> Result<Vec<serde_json::Value>>;
}

pub struct CloudWatchClient {
    client: cloudwatch::Client,
}

impl CloudWatchClient {
    pub fn new(sdk_config: &SdkConfig, region: &str) -> Self {
        Self {
            client: cloudwatch::Client::new(&regional_config(sdk_config, region)),
        }
    }
}

#[async_trait]
impl CloudWatchApi for CloudWatchClient {
    async fn list_metrics(&self) -> Result<Vec<serde_json::Value>> {
        let response = self
            .client
            .list_metrics()
            .send()
            .await
            .context("ListMetrics failed")?;
        Ok(response.metrics().iter().map(metric_to_json).collect())
    }
}

fn metric_to_json(metric: &cloudwatch::types::Metric) -> serde_json::Value {
    let mut json = serde_json::Map::new();

    if let Some(namespace) = metric.namespace() {
        json.insert(
            "Namespace".to_string(),
            serde_json::Value::String(namespace.to_string()),
        );
    }

    if let Some(metric_name) = metric.metric_name() {
        json.insert(
            "MetricName".to_string(),
            serde_json::Value::String(metric_name.to_string()),
        );
    }

    let dimensions: Vec<serde_json::Value> = metric
        .dimensions()
        .iter()
        .map(|dimension| {
            let mut dimension_json = serde_json::Map::new();
            if let Some(name) = dimension.name() {
                dimension_json.insert("Name".to_string(), serde_json::Value::String(name.to_string()));
            }
            if let Some(value) = dimension.value() {
                dimension_json.insert(
                    "Value".to_string(),
                    serde_json::Value::String(value.to_string()),
                );
            }
            serde_json::Value::Object(dimension_json)
        })
        .collect();
    json.insert("Dimensions".to_string(), serde_json::Value::Array(dimensions));

    serde_json::Value::Object(json)
}

fn query_metrics(api: Arc<dyn CloudWatchApi>) -> BoxFuture<'static, Result<Vec<serde_json::Value>>> {
    async move { api.list_metrics().await }.boxed()
}

pub static CLOUDWATCH: ServiceSpec<dyn CloudWatchApi> = ServiceSpec {
    name: "cloudwatch",
    timeout: Duration::from_secs(3),
    resources: &[ResourceSpec {
        name: "metric",
        query: query_metrics,
    }],
};

pub fn engine(
    sdk_config: &SdkConfig,
    regions: &[String],
    settings: &EngineSettings,
) -> ServiceEngine<dyn CloudWatchApi> {
    let sdk_config = sdk_config.clone();
    let factory: ClientFactory<dyn CloudWatchApi> = Arc::new(move |region: &str| {
        Arc::new(CloudWatchClient::new(&sdk_config, region)) as Arc<dyn CloudWatchApi>
    });
    ServiceEngine::new(&CLOUDWATCH, regions, settings, factory)
}
