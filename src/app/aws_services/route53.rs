//! Route53 is not collapsed to one region: every queried region reports
//! the account's hosted zones.

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_route53 as route53;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;

use super::regional_config;
use crate::app::query::{ClientFactory, EngineSettings, ResourceSpec, ServiceEngine, ServiceSpec};

#[async_trait]
pub trait Route53Api: Send + Sync {
    async fn list_hosted_zones(&self) -> Result<Vec<serde_json::Value>>;
}

pub struct Route53Client {
    client: route53::Client,
}

impl Route53Client {
    pub fn new(sdk_config: &SdkConfig, region: &str) -> Self {
        Self {
            client: route53::Client::new(&regional_config(sdk_config, region)),
        }
    }
}

#[async_trait]
impl Route53Api for Route53Client {
    async fn list_hosted_zones(&self) -> Result<Vec<serde_json::Value>> {
        let response = self
            .client
            .list_hosted_zones()
            .send()
            .await
            .context("ListHostedZones failed")?;
        Ok(response.hosted_zones().iter().map(hosted_zone_to_json).collect())
    }
}

fn hosted_zone_to_json(hosted_zone: &route53::types::HostedZone) -> serde_json::Value {
    let mut json = serde_json::Map::new();

    json.insert("Id".to_string(), serde_json::Value::String(hosted_zone.id.clone()));
    json.insert(
        "Name".to_string(),
        serde_json::Value::String(hosted_zone.name.clone()),
    );
    json.insert(
        "CallerReference".to_string(),
        serde_json::Value::String(hosted_zone.caller_reference.clone()),
    );

    if let Some(config) = &hosted_zone.config {
        let mut config_json = serde_json::Map::new();
        if let Some(comment) = &config.comment {
            config_json.insert("Comment".to_string(), serde_json::Value::String(comment.clone()));
        }
        config_json.insert(
            "PrivateZone".to_string(),
            serde_json::Value::Bool(config.private_zone),
        );
        json.insert("Config".to_string(), serde_json::Value::Object(config_json));
    }

    if let Some(resource_record_set_count) = hosted_zone.resource_record_set_count {
        json.insert(
            "ResourceRecordSetCount".to_string(),
            serde_json::Value::Number(resource_record_set_count.into()),
        );
    }

    if let Some(linked_service) = &hosted_zone.linked_service {
        let mut linked_service_json = serde_json::Map::new();
        if let Some(service_principal) = &linked_service.service_principal {
            linked_service_json.insert(
                "ServicePrincipal".to_string(),
                serde_json::Value::String(service_principal.clone()),
            );
        }
        if let Some(description) = &linked_service.description {
            linked_service_json.insert(
                "Description".to_string(),
                serde_json::Value::String(description.clone()),
            );
        }
        json.insert(
            "LinkedService".to_string(),
            serde_json::Value::Object(linked_service_json),
        );
    }

    serde_json::Value::Object(json)
}

fn query_hosted_zones(api: Arc<dyn Route53Api>) -> BoxFuture<'static, Result<Vec<serde_json::Value>>> {
    async move { api.list_hosted_zones().await }.boxed()
}

pub static ROUTE53: ServiceSpec<dyn Route53Api> = ServiceSpec {
    name: "route53",
    timeout: Duration::from_secs(10),
    resources: &[ResourceSpec {
        name: "hosted-zone",
        query: query_hosted_zones,
    }],
};

pub fn engine(
    sdk_config: &SdkConfig,
    regions: &[String],
    settings: &EngineSettings,
) -> ServiceEngine<dyn Route53Api> {
    let sdk_config = sdk_config.clone();
    let factory: ClientFactory<dyn Route53Api> = Arc::new(move |region: &str| {
        Arc::new(Route53Client::new(&sdk_config, region)) as Arc<dyn Route53Api>
    });
    ServiceEngine::new(&ROUTE53, regions, settings, factory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::query::ResourceQuery;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct MockRoute53;

    #[async_trait]
    impl Route53Api for MockRoute53 {
        async fn list_hosted_zones(&self) -> Result<Vec<serde_json::Value>> {
            tokio::time::sleep(Duration::from_secs(6)).await;
            Ok(vec![json!({ "Id": "/hostedzone/Z1", "Name": "example.com." })])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_regions_kept_and_ten_second_budget() {
        let regions = vec!["us-east-1".to_string(), "eu-west-1".to_string()];
        let factory: ClientFactory<dyn Route53Api> =
            Arc::new(|_: &str| Arc::new(MockRoute53) as Arc<dyn Route53Api>);
        let engine = ServiceEngine::new(&ROUTE53, &regions, &EngineSettings::default(), factory);

        assert_eq!(engine.regions(), regions.as_slice());
        assert_eq!(engine.timeout(), Duration::from_secs(10));
        assert!(engine.validate("hosted-zone"));
        assert!(!engine.validate("record-set"));

        let list = engine.query("hosted-zone").await.unwrap();
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_hosted_zone_conversion() {
        let zone = route53::types::HostedZone::builder()
            .id("/hostedzone/Z1")
            .name("example.com.")
            .caller_reference("ref-1")
            .resource_record_set_count(3)
            .build()
            .unwrap();

        assert_eq!(
            hosted_zone_to_json(&zone),
            json!({
                "Id": "/hostedzone/Z1",
                "Name": "example.com.",
                "CallerReference": "ref-1",
                "ResourceRecordSetCount": 3
            })
        );
    }
}
