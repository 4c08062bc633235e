use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_efs as efs;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;

use super::{datetime_to_json, regional_config, tags_to_json};
use crate::app::query::{ClientFactory, EngineSettings, ResourceSpec, ServiceEngine, ServiceSpec};

#[async_trait]
pub trait EfsApi: Send + Sync {
    /// One record per file system
    async fn describe_file_systems(&self) -> Result<Vec<serde_json::Value>>;
}

pub struct EfsClient {
    client: efs::Client,
}

impl EfsClient {
    pub fn new(sdk_config: &SdkConfig, region: &str) -> Self {
        Self {
            client: efs::Client::new(&regional_config(sdk_config, region)),
        }
    }
}

#[async_trait]
impl EfsApi for EfsClient {
    async fn describe_file_systems(&self) -> Result<Vec<serde_json::Value>> {
        let response = self
            .client
            .describe_file_systems()
            .send()
            .await
            .context("DescribeFileSystems failed")?;
        Ok(response.file_systems().iter().map(file_system_to_json).collect())
    }
}

fn file_system_to_json(file_system: &efs::types::FileSystemDescription) -> serde_json::Value {
    let mut json = serde_json::Map::new();

    json.insert(
        "OwnerId".to_string(),
        serde_json::Value::String(file_system.owner_id.clone()),
    );
    json.insert(
        "CreationToken".to_string(),
        serde_json::Value::String(file_system.creation_token.clone()),
    );
    json.insert(
        "FileSystemId".to_string(),
        serde_json::Value::String(file_system.file_system_id.clone()),
    );

    if let Some(file_system_arn) = &file_system.file_system_arn {
        json.insert(
            "FileSystemArn".to_string(),
            serde_json::Value::String(file_system_arn.clone()),
        );
    }

    json.insert(
        "CreationTime".to_string(),
        datetime_to_json(&file_system.creation_time),
    );
    json.insert(
        "LifeCycleState".to_string(),
        serde_json::Value::String(file_system.life_cycle_state.as_str().to_string()),
    );

    if let Some(name) = &file_system.name {
        json.insert("Name".to_string(), serde_json::Value::String(name.clone()));
    }

    json.insert(
        "NumberOfMountTargets".to_string(),
        serde_json::Value::Number(file_system.number_of_mount_targets.into()),
    );

    if let Some(size_in_bytes) = &file_system.size_in_bytes {
        let mut size_json = serde_json::Map::new();
        size_json.insert(
            "Value".to_string(),
            serde_json::Value::Number(size_in_bytes.value.into()),
        );
        if let Some(timestamp) = &size_in_bytes.timestamp {
            size_json.insert("Timestamp".to_string(), datetime_to_json(timestamp));
        }
        json.insert("SizeInBytes".to_string(), serde_json::Value::Object(size_json));
    }

    json.insert(
        "PerformanceMode".to_string(),
        serde_json::Value::String(file_system.performance_mode.as_str().to_string()),
    );

    if let Some(throughput_mode) = &file_system.throughput_mode {
        json.insert(
            "ThroughputMode".to_string(),
            serde_json::Value::String(throughput_mode.as_str().to_string()),
        );
    }

    if let Some(encrypted) = file_system.encrypted {
        json.insert("Encrypted".to_string(), serde_json::Value::Bool(encrypted));
    }

    json.insert(
        "Tags".to_string(),
        tags_to_json(
            file_system
                .tags
                .iter()
                .map(|t| (Some(t.key.as_str()), Some(t.value.as_str()))),
        ),
    );

    serde_json::Value::Object(json)
}

fn query_file_systems(api: Arc<dyn EfsApi>) -> BoxFuture<'static, Result<Vec<serde_json::Value>>> {
    async move { api.describe_file_systems().await }.boxed()
}

pub static EFS: ServiceSpec<dyn EfsApi> = ServiceSpec {
    name: "efs",
    timeout: Duration::from_secs(3),
    resources: &[ResourceSpec {
        name: "file-system",
        query: query_file_systems,
    }],
};

pub fn engine(
    sdk_config: &SdkConfig,
    regions: &[String],
    settings: &EngineSettings,
) -> ServiceEngine<dyn EfsApi> {
    let sdk_config = sdk_config.clone();
    let factory: ClientFactory<dyn EfsApi> =
        Arc::new(move |region: &str| Arc::new(EfsClient::new(&sdk_config, region)) as Arc<dyn EfsApi>);
    ServiceEngine::new(&EFS, regions, settings, factory)
}
