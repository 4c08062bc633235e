use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_config as configservice;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;

use super::regional_config;
use crate::app::query::{ClientFactory, EngineSettings, ResourceSpec, ServiceEngine, ServiceSpec};

#[async_trait]
pub trait ConfigServiceApi: Send + Sync {
    async fn describe_config_rules(&self) -> Result<Vec<serde_json::Value>>;
}

pub struct ConfigServiceClient {
    client: configservice::Client,
}

impl ConfigServiceClient {
    pub fn new(sdk_config: &SdkConfig, region: &str) -> Self {
        Self {
            client: configservice::Client::new(&regional_config(sdk_config, region)),
        }
    }
}

#[async_trait]
impl ConfigServiceApi for ConfigServiceClient {
    async fn describe_config_rules(&self) -> Result<Vec<serde_json::Value>> {
        let response = self
            .client
            .describe_config_rules()
            .send()
            .await
            .context("DescribeConfigRules failed")?;
        Ok(response.config_rules().iter().map(config_rule_to_json).collect())
    }
}

fn config_rule_to_json(rule: &configservice::types::ConfigRule) -> serde_json::Value {
    let mut json = serde_json::Map::new();

    if let Some(config_rule_name) = &rule.config_rule_name {
        json.insert(
            "ConfigRuleName".to_string(),
            serde_json::Value::String(config_rule_name.clone()),
        );
    }

    if let Some(config_rule_arn) = &rule.config_rule_arn {
        json.insert(
            "ConfigRuleArn".to_string(),
            serde_json::Value::String(config_rule_arn.clone()),
        );
    }

    if let Some(config_rule_id) = &rule.config_rule_id {
        json.insert(
            "ConfigRuleId".to_string(),
            serde_json::Value::String(config_rule_id.clone()),
        );
    }

    if let Some(description) = &rule.description {
        json.insert(
            "Description".to_string(),
            serde_json::Value::String(description.clone()),
        );
    }

    if let Some(config_rule_state) = &rule.config_rule_state {
        json.insert(
            "ConfigRuleState".to_string(),
            serde_json::Value::String(config_rule_state.as_str().to_string()),
        );
    }

    if let Some(created_by) = &rule.created_by {
        json.insert("CreatedBy".to_string(), serde_json::Value::String(created_by.clone()));
    }

    if let Some(input_parameters) = &rule.input_parameters {
        json.insert(
            "InputParameters".to_string(),
            serde_json::Value::String(input_parameters.clone()),
        );
    }

    if let Some(frequency) = &rule.maximum_execution_frequency {
        json.insert(
            "MaximumExecutionFrequency".to_string(),
            serde_json::Value::String(frequency.as_str().to_string()),
        );
    }

    if let Some(source) = &rule.source {
        let mut source_json = serde_json::Map::new();

        source_json.insert(
            "Owner".to_string(),
            serde_json::Value::String(source.owner.as_str().to_string()),
        );

        if let Some(source_identifier) = &source.source_identifier {
            source_json.insert(
                "SourceIdentifier".to_string(),
                serde_json::Value::String(source_identifier.clone()),
            );
        }

        if let Some(source_details) = &source.source_details {
            let details_json: Vec<serde_json::Value> = source_details
                .iter()
                .map(|detail| {
                    let mut detail_json = serde_json::Map::new();
                    if let Some(event_source) = &detail.event_source {
                        detail_json.insert(
                            "EventSource".to_string(),
                            serde_json::Value::String(event_source.as_str().to_string()),
                        );
                    }
                    if let Some(message_type) = &detail.message_type {
                        detail_json.insert(
                            "MessageType".to_string(),
                            serde_json::Value::String(message_type.as_str().to_string()),
                        );
                    }
                    serde_json::Value::Object(detail_json)
                })
                .collect();
            source_json.insert("SourceDetails".to_string(), serde_json::Value::Array(details_json));
        }

        json.insert("Source".to_string(), serde_json::Value::Object(source_json));
    }

    serde_json::Value::Object(json)
}

fn query_rules(api: Arc<dyn ConfigServiceApi>) -> BoxFuture<'static, Result<Vec<serde_json::Value>>> {
    async move { api.describe_config_rules().await }.boxed()
}

pub static CONFIG: ServiceSpec<dyn ConfigServiceApi> = ServiceSpec {
    name: "config",
    timeout: Duration::from_secs(3),
    resources: &[ResourceSpec {
        name: "rule",
        query: query_rules,
    }],
};

pub fn engine(
    sdk_config: &SdkConfig,
    regions: &[String],
    settings: &EngineSettings,
) -> ServiceEngine<dyn ConfigServiceApi> {
    let sdk_config = sdk_config.clone();
    let factory: ClientFactory<dyn ConfigServiceApi> = Arc::new(move |region: &str| {
        Arc::new(ConfigServiceClient::new(&sdk_config, region)) as Arc<dyn ConfigServiceApi>
    });
    ServiceEngine::new(&CONFIG, regions, settings, factory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::query::ResourceQuery;
    use serde_json::json;

    struct MockConfig {
        rules: usize,
    }

    #[async_trait]
    impl ConfigServiceApi for MockConfig {
        async fn describe_config_rules(&self) -> Result<Vec<serde_json::Value>> {
            Ok((0..self.rules)
                .map(|i| json!({ "ConfigRuleName": format!("rule-{}", i) }))
                .collect())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rules_from_every_region() {
        let regions = vec![
            "us-east-1".to_string(),
            "eu-west-2".to_string(),
            "ca-central-1".to_string(),
        ];
        let factory: ClientFactory<dyn ConfigServiceApi> = Arc::new(|region: &str| {
            let rules = if region == "eu-west-2" { 0 } else { 2 };
            Arc::new(MockConfig { rules }) as Arc<dyn ConfigServiceApi>
        });
        let engine = ServiceEngine::new(&CONFIG, &regions, &EngineSettings::default(), factory);

        assert_eq!(engine.service(), "config");
        assert!(engine.validate("rule"));
        assert!(!engine.validate("recorder"));

        let list = engine.query("rule").await.unwrap();
        assert_eq!(list.len(), 4);
    }
}
