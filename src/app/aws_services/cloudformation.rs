use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_cloudformation as cfn;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;

use super::{datetime_to_json, regional_config, strings_to_json, tags_to_json};
use crate::app::query::{ClientFactory, EngineSettings, ResourceSpec, ServiceEngine, ServiceSpec};

#[async_trait]
pub trait CloudFormationApi: Send + Sync {
    async fn describe_stacks(&self) -> Result<Vec<serde_json::Value>>;

    /// Names of the stack sets in the region
    async fn list_stack_sets(&self) -> Result<Vec<String>>;

    async fn describe_stack_set(&self, stack_set_name: &str) -> Result<serde_json::Value>;
}

pub struct CloudFormationClient {
    client: cfn::Client,
}

impl CloudFormationClient {
    pub fn new(sdk_config: &SdkConfig, region: &str) -> Self {
        Self {
            client: cfn::Client::new(&regional_config(sdk_config, region)),
        }
    }
}

#[async_trait]
impl CloudFormationApi for CloudFormationClient {
    async fn describe_stacks(&self) -> Result<Vec<serde_json::Value>> {
        let response = self
            .client
            .describe_stacks()
            .send()
            .await
            .context("DescribeStacks failed")?;
        Ok(response.stacks().iter().map(stack_to_json).collect())
    }

    async fn list_stack_sets(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .list_stack_sets()
            .send()
            .await
            .context("ListStackSets failed")?;
        Ok(response
            .summaries()
            .iter()
            .filter_map(|summary| summary.stack_set_name.clone())
            .collect())
    }

    async fn describe_stack_set(&self, stack_set_name: &str) -> Result<serde_json::Value> {
        let response = self
            .client
            .describe_stack_set()
            .stack_set_name(stack_set_name)
            .send()
            .await
            .with_context(|| format!("DescribeStackSet failed for {}", stack_set_name))?;

        let stack_set = response
            .stack_set()
            .with_context(|| format!("no stack set returned for {}", stack_set_name))?;
        Ok(stack_set_to_json(stack_set))
    }
}

fn stack_to_json(stack: &cfn::types::Stack) -> serde_json::Value {
    let mut stack_map = serde_json::Map::new();

    if let Some(stack_id) = &stack.stack_id {
        stack_map.insert("StackId".to_string(), serde_json::Value::String(stack_id.clone()));
    }

    if let Some(stack_name) = &stack.stack_name {
        stack_map.insert(
            "StackName".to_string(),
            serde_json::Value::String(stack_name.clone()),
        );
    }

    if let Some(description) = &stack.description {
        stack_map.insert(
            "Description".to_string(),
            serde_json::Value::String(description.clone()),
        );
    }

    if let Some(creation_time) = &stack.creation_time {
        stack_map.insert("CreationTime".to_string(), datetime_to_json(creation_time));
    }

    if let Some(last_updated_time) = &stack.last_updated_time {
        stack_map.insert("LastUpdatedTime".to_string(), datetime_to_json(last_updated_time));
    }

    if let Some(stack_status) = &stack.stack_status {
        stack_map.insert(
            "StackStatus".to_string(),
            serde_json::Value::String(stack_status.as_str().to_string()),
        );
    }

    if let Some(stack_status_reason) = &stack.stack_status_reason {
        stack_map.insert(
            "StackStatusReason".to_string(),
            serde_json::Value::String(stack_status_reason.clone()),
        );
    }

    if let Some(disable_rollback) = stack.disable_rollback {
        stack_map.insert("DisableRollback".to_string(), serde_json::Value::Bool(disable_rollback));
    }

    if let Some(capabilities) = &stack.capabilities {
        stack_map.insert(
            "Capabilities".to_string(),
            strings_to_json(capabilities.iter().map(|c| c.as_str())),
        );
    }

    if let Some(parameters) = &stack.parameters {
        let parameters_json: Vec<serde_json::Value> = parameters
            .iter()
            .map(|parameter| {
                let mut parameter_json = serde_json::Map::new();
                if let Some(key) = &parameter.parameter_key {
                    parameter_json.insert(
                        "ParameterKey".to_string(),
                        serde_json::Value::String(key.clone()),
                    );
                }
                if let Some(value) = &parameter.parameter_value {
                    parameter_json.insert(
                        "ParameterValue".to_string(),
                        serde_json::Value::String(value.clone()),
                    );
                }
                serde_json::Value::Object(parameter_json)
            })
            .collect();
        stack_map.insert("Parameters".to_string(), serde_json::Value::Array(parameters_json));
    }

    if let Some(outputs) = &stack.outputs {
        let outputs_json: Vec<serde_json::Value> = outputs
            .iter()
            .map(|output| {
                let mut output_json = serde_json::Map::new();
                if let Some(key) = &output.output_key {
                    output_json.insert("OutputKey".to_string(), serde_json::Value::String(key.clone()));
                }
                if let Some(value) = &output.output_value {
                    output_json.insert(
                        "OutputValue".to_string(),
                        serde_json::Value::String(value.clone()),
                    );
                }
                if let Some(export_name) = &output.export_name {
                    output_json.insert(
                        "ExportName".to_string(),
                        serde_json::Value::String(export_name.clone()),
                    );
                }
                serde_json::Value::Object(output_json)
            })
            .collect();
        stack_map.insert("Outputs".to_string(), serde_json::Value::Array(outputs_json));
    }

    if let Some(tags) = &stack.tags {
        stack_map.insert(
            "Tags".to_string(),
            tags_to_json(tags.iter().map(|t| (Some(t.key()), Some(t.value())))),
        );
    }

    serde_json::Value::Object(stack_map)
}

fn stack_set_to_json(stack_set: &cfn::types::StackSet) -> serde_json::Value {
    let mut json = serde_json::Map::new();

    if let Some(name) = &stack_set.stack_set_name {
        json.insert("StackSetName".to_string(), serde_json::Value::String(name.clone()));
    }

    if let Some(id) = &stack_set.stack_set_id {
        json.insert("StackSetId".to_string(), serde_json::Value::String(id.clone()));
    }

    if let Some(arn) = &stack_set.stack_set_arn {
        json.insert("StackSetARN".to_string(), serde_json::Value::String(arn.clone()));
    }

    if let Some(description) = &stack_set.description {
        json.insert(
            "Description".to_string(),
            serde_json::Value::String(description.clone()),
        );
    }

    if let Some(status) = &stack_set.status {
        json.insert(
            "Status".to_string(),
            serde_json::Value::String(status.as_str().to_string()),
        );
    }

    if let Some(permission_model) = &stack_set.permission_model {
        json.insert(
            "PermissionModel".to_string(),
            serde_json::Value::String(permission_model.as_str().to_string()),
        );
    }

    if let Some(administration_role_arn) = &stack_set.administration_role_arn {
        json.insert(
            "AdministrationRoleARN".to_string(),
            serde_json::Value::String(administration_role_arn.clone()),
        );
    }

    if let Some(execution_role_name) = &stack_set.execution_role_name {
        json.insert(
            "ExecutionRoleName".to_string(),
            serde_json::Value::String(execution_role_name.clone()),
        );
    }

    if let Some(capabilities) = &stack_set.capabilities {
        json.insert(
            "Capabilities".to_string(),
            strings_to_json(capabilities.iter().map(|c| c.as_str())),
        );
    }

    if let Some(tags) = &stack_set.tags {
        json.insert(
            "Tags".to_string(),
            tags_to_json(tags.iter().map(|t| (Some(t.key()), Some(t.value())))),
        );
    }

    serde_json::Value::Object(json)
}

fn query_stacks(api: Arc<dyn CloudFormationApi>) -> BoxFuture<'static, Result<Vec<serde_json::Value>>> {
    async move { api.describe_stacks().await }.boxed()
}

fn query_stack_sets(
    api: Arc<dyn CloudFormationApi>,
) -> BoxFuture<'static, Result<Vec<serde_json::Value>>> {
    async move {
        let mut records = Vec::new();
        for stack_set_name in api.list_stack_sets().await? {
            records.push(api.describe_stack_set(&stack_set_name).await?);
        }
        Ok(records)
    }
    .boxed()
}

pub static CLOUDFORMATION: ServiceSpec<dyn CloudFormationApi> = ServiceSpec {
    name: "cloudformation",
    timeout: Duration::from_secs(10),
    resources: &[
        ResourceSpec {
            name: "stack",
            query: query_stacks,
        },
        ResourceSpec {
            name: "stack-set",
            query: query_stack_sets,
        },
    ],
};

pub fn engine(
    sdk_config: &SdkConfig,
    regions: &[String],
    settings: &EngineSettings,
) -> ServiceEngine<dyn CloudFormationApi> {
    let sdk_config = sdk_config.clone();
    let factory: ClientFactory<dyn CloudFormationApi> = Arc::new(move |region: &str| {
        Arc::new(CloudFormationClient::new(&sdk_config, region)) as Arc<dyn CloudFormationApi>
    });
    ServiceEngine::new(&CLOUDFORMATION, regions, settings, factory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::query::{FailurePolicy, QueryError, ResourceQuery};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockCloudFormation {
        stack_sets: Vec<String>,
        failing_stack_set: Option<String>,
        described: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CloudFormationApi for MockCloudFormation {
        async fn describe_stacks(&self) -> Result<Vec<serde_json::Value>> {
            Ok(vec![json!({ "StackName": "network" })])
        }

        async fn list_stack_sets(&self) -> Result<Vec<String>> {
            Ok(self.stack_sets.clone())
        }

        async fn describe_stack_set(&self, stack_set_name: &str) -> Result<serde_json::Value> {
            self.described.lock().unwrap().push(stack_set_name.to_string());
            if self.failing_stack_set.as_deref() == Some(stack_set_name) {
                anyhow::bail!("StackSetNotFoundException: StackSet {} not found", stack_set_name);
            }
            Ok(json!({ "StackSetName": stack_set_name, "Status": "ACTIVE" }))
        }
    }

    #[test]
    fn test_spec_shape() {
        assert_eq!(CLOUDFORMATION.timeout, Duration::from_secs(10));
        assert_eq!(CLOUDFORMATION.resource_names(), vec!["stack", "stack-set"]);
    }

    #[tokio::test]
    async fn test_stack_sets_list_then_describe() {
        let mock = Arc::new(MockCloudFormation {
            stack_sets: vec!["baseline".to_string(), "guardrails".to_string()],
            ..Default::default()
        });

        let records = query_stack_sets(mock.clone()).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(
            *mock.described.lock().unwrap(),
            vec!["baseline".to_string(), "guardrails".to_string()]
        );
        assert_eq!(records[1]["StackSetName"], json!("guardrails"));
    }

    #[tokio::test]
    async fn test_stack_set_describe_failure_drops_region() {
        let mock = Arc::new(MockCloudFormation {
            stack_sets: vec![
                "baseline".to_string(),
                "guardrails".to_string(),
                "logging".to_string(),
            ],
            failing_stack_set: Some("guardrails".to_string()),
            ..Default::default()
        });

        let err = query_stack_sets(mock.clone()).await.unwrap_err();

        assert!(err.to_string().contains("StackSetNotFoundException"));
        assert_eq!(
            *mock.described.lock().unwrap(),
            vec!["baseline".to_string(), "guardrails".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_stack_set_region_fails_fast() {
        let regions = vec!["us-east-1".to_string(), "eu-west-1".to_string()];
        let factory: ClientFactory<dyn CloudFormationApi> = Arc::new(|region: &str| {
            Arc::new(MockCloudFormation {
                stack_sets: vec!["baseline".to_string()],
                failing_stack_set: (region == "us-east-1").then(|| "baseline".to_string()),
                ..Default::default()
            }) as Arc<dyn CloudFormationApi>
        });
        let engine = ServiceEngine::new(&CLOUDFORMATION, &regions, &EngineSettings::default(), factory);

        match engine.query("stack-set").await.unwrap_err() {
            QueryError::RegionFailed { region, .. } => assert_eq!(region, "us-east-1"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_stack_set_region_waits_for_deadline() {
        let regions = vec!["us-east-1".to_string(), "eu-west-1".to_string()];
        let factory: ClientFactory<dyn CloudFormationApi> = Arc::new(|region: &str| {
            Arc::new(MockCloudFormation {
                stack_sets: vec!["baseline".to_string()],
                failing_stack_set: (region == "eu-west-1").then(|| "baseline".to_string()),
                ..Default::default()
            }) as Arc<dyn CloudFormationApi>
        });
        let settings = EngineSettings {
            failure_policy: FailurePolicy::WaitForDeadline,
            ..Default::default()
        };
        let engine = ServiceEngine::new(&CLOUDFORMATION, &regions, &settings, factory);

        let err = engine.query("stack-set").await.unwrap_err();
        assert!(matches!(err, QueryError::DeadlineExceeded { pending: 1, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stack_query_through_engine() {
        let regions = vec!["us-east-1".to_string(), "eu-west-1".to_string()];
        let factory: ClientFactory<dyn CloudFormationApi> = Arc::new(|_: &str| {
            Arc::new(MockCloudFormation::default()) as Arc<dyn CloudFormationApi>
        });
        let engine = ServiceEngine::new(&CLOUDFORMATION, &regions, &EngineSettings::default(), factory);

        assert!(engine.validate("stack-set"));
        assert!(!engine.validate("template"));

        let list = engine.query("stack").await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.resource, "stack");
    }
}
