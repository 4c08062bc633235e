use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ecr as ecr;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;

use super::{datetime_to_json, regional_config};
use crate::app::query::{ClientFactory, EngineSettings, ResourceSpec, ServiceEngine, ServiceSpec};

#[async_trait]
pub trait EcrApi: Send + Sync {
    async fn describe_repositories(&self) -> Result<Vec<serde_json::Value>>;
}

pub struct EcrClient {
    client: ecr::Client,
}

impl EcrClient {
    pub fn new(sdk_config: &SdkConfig, region: &str) -> Self {
        Self {
            client: ecr::Client::new(&regional_config(sdk_config, region)),
        }
    }
}

#[async_trait]
impl EcrApi for EcrClient {
    async fn describe_repositories(&self) -> Result<Vec<serde_json::Value>> {
        let response = self
            .client
            .describe_repositories()
            .send()
            .await
            .context("DescribeRepositories failed")?;
        Ok(response.repositories().iter().map(repository_to_json).collect())
    }
}

fn repository_to_json(repository: &ecr::types::Repository) -> serde_json::Value {
    let mut json = serde_json::Map::new();

    if let Some(repository_arn) = &repository.repository_arn {
        json.insert(
            "RepositoryArn".to_string(),
            serde_json::Value::String(repository_arn.clone()),
        );
    }

    if let Some(registry_id) = &repository.registry_id {
        json.insert(
            "RegistryId".to_string(),
            serde_json::Value::String(registry_id.clone()),
        );
    }

    if let Some(repository_name) = &repository.repository_name {
        json.insert(
            "RepositoryName".to_string(),
            serde_json::Value::String(repository_name.clone()),
        );
    }

    if let Some(repository_uri) = &repository.repository_uri {
        json.insert(
            "RepositoryUri".to_string(),
            serde_json::Value::String(repository_uri.clone()),
        );
    }

    if let Some(created_at) = &repository.created_at {
        json.insert("CreatedAt".to_string(), datetime_to_json(created_at));
    }

    if let Some(image_tag_mutability) = &repository.image_tag_mutability {
        json.insert(
            "ImageTagMutability".to_string(),
            serde_json::Value::String(image_tag_mutability.as_str().to_string()),
        );
    }

    if let Some(image_scanning_configuration) = &repository.image_scanning_configuration {
        let mut scanning_json = serde_json::Map::new();
        scanning_json.insert(
            "ScanOnPush".to_string(),
            serde_json::Value::Bool(image_scanning_configuration.scan_on_push),
        );
        json.insert(
            "ImageScanningConfiguration".to_string(),
            serde_json::Value::Object(scanning_json),
        );
    }

    if let Some(encryption_configuration) = &repository.encryption_configuration {
        let mut encryption_json = serde_json::Map::new();
        encryption_json.insert(
            "EncryptionType".to_string(),
            serde_json::Value::String(encryption_configuration.encryption_type.as_str().to_string()),
        );
        if let Some(kms_key) = &encryption_configuration.kms_key {
            encryption_json.insert("KmsKey".to_string(), serde_json::Value::String(kms_key.clone()));
        }
        json.insert(
            "EncryptionConfiguration".to_string(),
            serde_json::Value::Object(encryption_json),
        );
    }

    serde_json::Value::Object(json)
}

fn query_repositories(api: Arc<dyn EcrApi>) -> BoxFuture<'static, Result<Vec<serde_json::Value>>> {
    async move { api.describe_repositories().await }.boxed()
}

pub static ECR: ServiceSpec<dyn EcrApi> = ServiceSpec {
    name: "ecr",
    timeout: Duration::from_secs(3),
    resources: &[ResourceSpec {
        name: "repository",
        query: query_repositories,
    }],
};

pub fn engine(
    sdk_config: &SdkConfig,
    regions: &[String],
    settings: &EngineSettings,
) -> ServiceEngine<dyn EcrApi> {
    let sdk_config = sdk_config.clone();
    let factory: ClientFactory<dyn EcrApi> =
        Arc::new(move |region: &str| Arc::new(EcrClient::new(&sdk_config, region)) as Arc<dyn EcrApi>);
    ServiceEngine::new(&ECR, regions, settings, factory)
}
