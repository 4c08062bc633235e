//! ListBuckets returns the account's buckets from every region, so each
//! queried region reports the same list.

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3 as s3;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;

use super::{datetime_to_json, regional_config};
use crate::app::query::{ClientFactory, EngineSettings, ResourceSpec, ServiceEngine, ServiceSpec};

#[async_trait]
pub trait S3Api: Send + Sync {
    async fn list_buckets(&self) -> Result<Vec<serde_json::Value>>;
}

pub struct S3Client {
    client: s3::Client,
}

impl S3Client {
    pub fn new(sdk_config: &SdkConfig, region: &str) -> Self {
        Self {
            client: s3::Client::new(&regional_config(sdk_config, region)),
        }
    }
}

#[async_trait]
impl S3Api for S3Client {
    async fn list_buckets(&self) -> Result<Vec<serde_json::Value>> {
        let response = self
            .client
            .list_buckets()
            .send()
            .await
            .context("ListBuckets failed")?;
        Ok(response.buckets().iter().map(bucket_to_json).collect())
    }
}

fn bucket_to_json(bucket: &s3::types::Bucket) -> serde_json::Value {
    let mut json = serde_json::Map::new();

    if let Some(name) = &bucket.name {
        json.insert("Name".to_string(), serde_json::Value::String(name.clone()));
    }

    if let Some(creation_date) = &bucket.creation_date {
        json.insert("CreationDate".to_string(), datetime_to_json(creation_date));
    }

    serde_json::Value::Object(json)
}

fn query_buckets(api: Arc<dyn S3Api>) -> BoxFuture<'static, Result<Vec<serde_json::Value>>> {
    async move { api.list_buckets().await }.boxed()
}

pub static S3: ServiceSpec<dyn S3Api> = ServiceSpec {
    name: "s3",
    timeout: Duration::from_secs(3),
    resources: &[ResourceSpec {
        name: "bucket",
        query: query_buckets,
    }],
};

pub fn engine(
    sdk_config: &SdkConfig,
    regions: &[String],
    settings: &EngineSettings,
) -> ServiceEngine<dyn S3Api> {
    let sdk_config = sdk_config.clone();
    let factory: ClientFactory<dyn S3Api> =
        Arc::new(move |region: &str| Arc::new(S3Client::new(&sdk_config, region)) as Arc<dyn S3Api>);
    ServiceEngine::new(&S3, regions, settings, factory)
}
