use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ecs as ecs;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;

use super::{datetime_to_json, regional_config, strings_to_json, tags_to_json};
use crate::app::query::{ClientFactory, EngineSettings, ResourceSpec, ServiceEngine, ServiceSpec};

/// ECS operations used by the cluster, service and task-definition queries
#[async_trait]
pub trait EcsApi: Send + Sync {
    async fn list_clusters(&self) -> Result<Vec<String>>;

    /// Describe one cluster including tags, statistics, settings,
    /// configurations and attachments
    async fn describe_cluster(&self, cluster_arn: &str) -> Result<Vec<serde_json::Value>>;

    async fn list_services(&self, cluster_arn: &str) -> Result<Vec<String>>;

    async fn describe_service(
        &self,
        cluster_arn: &str,
        service_arn: &str,
    ) -> Result<Vec<serde_json::Value>>;

    async fn list_task_definitions(&self) -> Result<Vec<String>>;

    async fn describe_task_definition(&self, task_definition_arn: &str) -> Result<serde_json::Value>;
}

pub struct EcsClient {
    client: ecs::Client,
}

impl EcsClient {
    pub fn new(sdk_config: &SdkConfig, region: &str) -> Self {
        Self {
            client: ecs::Client::new(&regional_config(sdk_config, region)),
        }
    }
}

#[async_trait]
impl EcsApi for EcsClient {
    async fn list_clusters(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .list_clusters()
            .send()
            .await
            .context("ListClusters failed")?;
        Ok(response.cluster_arns().to_vec())
    }

    async fn describe_cluster(&self, cluster_arn: &str) -> Result<Vec<serde_json::Value>> {
        let response = self
            .client
            .describe_clusters()
            .clusters(cluster_arn)
            .include(ecs::types::ClusterField::Tags)
            .include(ecs::types::ClusterField::Statistics)
            .include(ecs::types::ClusterField::Settings)
            .include(ecs::types::ClusterField::Configurations)
            .include(ecs::types::ClusterField::Attachments)
            .send()
            .await
            .with_context(|| format!("DescribeClusters failed for {}", cluster_arn))?;

        Ok(response.clusters().iter().map(cluster_to_json).collect())
    }

    async fn list_services(&self, cluster_arn: &str) -> Result<Vec<String>> {
        let response = self
            .client
            .list_services()
            .cluster(cluster_arn)
            .send()
            .await
            .with_context(|| format!("ListServices failed for {}", cluster_arn))?;
        Ok(response.service_arns().to_vec())
    }

    async fn describe_service(
        &self,
        cluster_arn: &str,
        service_arn: &str,
    ) -> Result<Vec<serde_json::Value>> {
        let response = self
            .client
            .describe_services()
            .cluster(cluster_arn)
            .services(service_arn)
            .send()
            .await
            .with_context(|| format!("DescribeServices failed for {}", service_arn))?;

        Ok(response.services().iter().map(service_to_json).collect())
    }

    async fn list_task_definitions(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .list_task_definitions()
            .send()
            .await
            .context("ListTaskDefinitions failed")?;
        Ok(response.task_definition_arns().to_vec())
    }

    async fn describe_task_definition(&self, task_definition_arn: &str) -> Result<serde_json::Value> {
        let response = self
            .client
            .describe_task_definition()
            .task_definition(task_definition_arn)
            .include(ecs::types::TaskDefinitionField::Tags)
            .send()
            .await
            .with_context(|| format!("DescribeTaskDefinition failed for {}", task_definition_arn))?;

        let task_definition = response
            .task_definition()
            .with_context(|| format!("no task definition returned for {}", task_definition_arn))?;

        let mut json = task_definition_to_json(task_definition);
        if let serde_json::Value::Object(map) = &mut json {
            map.insert(
                "Tags".to_string(),
                tags_to_json(response.tags().iter().map(|t| (t.key(), t.value()))),
            );
        }
        Ok(json)
    }
}

fn cluster_to_json(cluster: &ecs::types::Cluster) -> serde_json::Value {
    let mut json = serde_json::Map::new();

    if let Some(cluster_arn) = &cluster.cluster_arn {
        json.insert(
            "ClusterArn".to_string(),
            serde_json::Value::String(cluster_arn.clone()),
        );
    }

    if let Some(cluster_name) = &cluster.cluster_name {
        json.insert(
            "ClusterName".to_string(),
            serde_json::Value::String(cluster_name.clone()),
        );
    }

    if let Some(status) = &cluster.status {
        json.insert(
            "Status".to_string(),
            serde_json::Value::String(status.clone()),
        );
    }

    json.insert(
        "RegisteredContainerInstancesCount".to_string(),
        serde_json::Value::Number(cluster.registered_container_instances_count.into()),
    );
    json.insert(
        "RunningTasksCount".to_string(),
        serde_json::Value::Number(cluster.running_tasks_count.into()),
    );
    json.insert(
        "PendingTasksCount".to_string(),
        serde_json::Value::Number(cluster.pending_tasks_count.into()),
    );
    json.insert(
        "ActiveServicesCount".to_string(),
        serde_json::Value::Number(cluster.active_services_count.into()),
    );

    if let Some(statistics) = &cluster.statistics {
        let stats_json: Vec<serde_json::Value> = statistics
            .iter()
            .map(|stat| {
                let mut stat_json = serde_json::Map::new();
                if let Some(name) = &stat.name {
                    stat_json.insert("Name".to_string(), serde_json::Value::String(name.clone()));
                }
                if let Some(value) = &stat.value {
                    stat_json.insert("Value".to_string(), serde_json::Value::String(value.clone()));
                }
                serde_json::Value::Object(stat_json)
            })
            .collect();
        json.insert("Statistics".to_string(), serde_json::Value::Array(stats_json));
    }

    if let Some(settings) = &cluster.settings {
        let settings_json: Vec<serde_json::Value> = settings
            .iter()
            .map(|setting| {
                let mut setting_json = serde_json::Map::new();
                if let Some(name) = &setting.name {
                    setting_json.insert(
                        "Name".to_string(),
                        serde_json::Value::String(name.as_str().to_string()),
                    );
                }
                if let Some(value) = &setting.value {
                    setting_json.insert("Value".to_string(), serde_json::Value::String(value.clone()));
                }
                serde_json::Value::Object(setting_json)
            })
            .collect();
        json.insert("Settings".to_string(), serde_json::Value::Array(settings_json));
    }

    if let Some(capacity_providers) = &cluster.capacity_providers {
        json.insert(
            "CapacityProviders".to_string(),
            strings_to_json(capacity_providers.iter().map(String::as_str)),
        );
    }

    if let Some(attachments_status) = &cluster.attachments_status {
        json.insert(
            "AttachmentsStatus".to_string(),
            serde_json::Value::String(attachments_status.clone()),
        );
    }

    if let Some(tags) = &cluster.tags {
        json.insert(
            "Tags".to_string(),
            tags_to_json(tags.iter().map(|t| (t.key(), t.value()))),
        );
    }

    serde_json::Value::Object(json)
}

fn service_to_json(service: &ecs::types::Service) -> serde_json::Value {
    let mut json = serde_json::Map::new();

    if let Some(service_arn) = &service.service_arn {
        json.insert(
            "ServiceArn".to_string(),
            serde_json::Value::String(service_arn.clone()),
        );
    }

    if let Some(service_name) = &service.service_name {
        json.insert(
            "ServiceName".to_string(),
            serde_json::Value::String(service_name.clone()),
        );
    }

    if let Some(cluster_arn) = &service.cluster_arn {
        json.insert(
            "ClusterArn".to_string(),
            serde_json::Value::String(cluster_arn.clone()),
        );
    }

    if let Some(task_definition) = &service.task_definition {
        json.insert(
            "TaskDefinition".to_string(),
            serde_json::Value::String(task_definition.clone()),
        );
    }

    if let Some(status) = &service.status {
        json.insert("Status".to_string(), serde_json::Value::String(status.clone()));
    }

    json.insert(
        "DesiredCount".to_string(),
        serde_json::Value::Number(service.desired_count.into()),
    );
    json.insert(
        "RunningCount".to_string(),
        serde_json::Value::Number(service.running_count.into()),
    );
    json.insert(
        "PendingCount".to_string(),
        serde_json::Value::Number(service.pending_count.into()),
    );

    if let Some(launch_type) = &service.launch_type {
        json.insert(
            "LaunchType".to_string(),
            serde_json::Value::String(launch_type.as_str().to_string()),
        );
    }

    if let Some(platform_version) = &service.platform_version {
        json.insert(
            "PlatformVersion".to_string(),
            serde_json::Value::String(platform_version.clone()),
        );
    }

    if let Some(created_at) = &service.created_at {
        json.insert("CreatedAt".to_string(), datetime_to_json(created_at));
    }

    serde_json::Value::Object(json)
}

fn task_definition_to_json(task_definition: &ecs::types::TaskDefinition) -> serde_json::Value {
    let mut json = serde_json::Map::new();

    if let Some(task_definition_arn) = &task_definition.task_definition_arn {
        json.insert(
            "TaskDefinitionArn".to_string(),
            serde_json::Value::String(task_definition_arn.clone()),
        );
    }

    if let Some(family) = &task_definition.family {
        json.insert("Family".to_string(), serde_json::Value::String(family.clone()));
    }

    json.insert(
        "Revision".to_string(),
        serde_json::Value::Number(task_definition.revision.into()),
    );

    if let Some(status) = &task_definition.status {
        json.insert(
            "Status".to_string(),
            serde_json::Value::String(status.as_str().to_string()),
        );
    }

    if let Some(cpu) = &task_definition.cpu {
        json.insert("Cpu".to_string(), serde_json::Value::String(cpu.clone()));
    }

    if let Some(memory) = &task_definition.memory {
        json.insert("Memory".to_string(), serde_json::Value::String(memory.clone()));
    }

    if let Some(network_mode) = &task_definition.network_mode {
        json.insert(
            "NetworkMode".to_string(),
            serde_json::Value::String(network_mode.as_str().to_string()),
        );
    }

    if let Some(requires_compatibilities) = &task_definition.requires_compatibilities {
        json.insert(
            "RequiresCompatibilities".to_string(),
            strings_to_json(requires_compatibilities.iter().map(|c| c.as_str())),
        );
    }

    if let Some(container_definitions) = &task_definition.container_definitions {
        let containers: Vec<serde_json::Value> = container_definitions
            .iter()
            .map(|container| {
                let mut container_json = serde_json::Map::new();
                if let Some(name) = &container.name {
                    container_json.insert("Name".to_string(), serde_json::Value::String(name.clone()));
                }
                if let Some(image) = &container.image {
                    container_json.insert("Image".to_string(), serde_json::Value::String(image.clone()));
                }
                if let Some(memory) = container.memory {
                    container_json.insert("Memory".to_string(), serde_json::Value::Number(memory.into()));
                }
                container_json.insert(
                    "Cpu".to_string(),
                    serde_json::Value::Number(container.cpu.into()),
                );
                if let Some(essential) = container.essential {
                    container_json.insert("Essential".to_string(), serde_json::Value::Bool(essential));
                }
                serde_json::Value::Object(container_json)
            })
            .collect();
        json.insert(
            "ContainerDefinitions".to_string(),
            serde_json::Value::Array(containers),
        );
    }

    if let Some(execution_role_arn) = &task_definition.execution_role_arn {
        json.insert(
            "ExecutionRoleArn".to_string(),
            serde_json::Value::String(execution_role_arn.clone()),
        );
    }

    if let Some(task_role_arn) = &task_definition.task_role_arn {
        json.insert(
            "TaskRoleArn".to_string(),
            serde_json::Value::String(task_role_arn.clone()),
        );
    }

    if let Some(registered_at) = &task_definition.registered_at {
        json.insert("RegisteredAt".to_string(), datetime_to_json(registered_at));
    }

    serde_json::Value::Object(json)
}

fn query_clusters(api: Arc<dyn EcsApi>) -> BoxFuture<'static, Result<Vec<serde_json::Value>>> {
    async move {
        let mut records = Vec::new();
        for cluster_arn in api.list_clusters().await? {
            records.extend(api.describe_cluster(&cluster_arn).await?);
        }
        Ok(records)
    }
    .boxed()
}

fn query_services(api: Arc<dyn EcsApi>) -> BoxFuture<'static, Result<Vec<serde_json::Value>>> {
    async move {
        let mut records = Vec::new();
        for cluster_arn in api.list_clusters().await? {
            for service_arn in api.list_services(&cluster_arn).await? {
                records.extend(api.describe_service(&cluster_arn, &service_arn).await?);
            }
        }
        Ok(records)
    }
    .boxed()
}

fn query_task_definitions(
    api: Arc<dyn EcsApi>,
) -> BoxFuture<'static, Result<Vec<serde_json::Value>>> {
    async move {
        let mut records = Vec::new();
        for task_definition_arn in api.list_task_definitions().await? {
            records.push(api.describe_task_definition(&task_definition_arn).await?);
        }
        Ok(records)
    }
    .boxed()
}

pub static ECS: ServiceSpec<dyn EcsApi> = ServiceSpec {
    name: "ecs",
    timeout: Duration::from_secs(3),
    resources: &[
        ResourceSpec {
            name: "cluster",
            query: query_clusters,
        },
        ResourceSpec {
            name: "service",
            query: query_services,
        },
        ResourceSpec {
            name: "task-definition",
            query: query_task_definitions,
        },
    ],
};

pub fn engine(
    sdk_config: &SdkConfig,
    regions: &[String],
    settings: &EngineSettings,
) -> ServiceEngine<dyn EcsApi> {
    let sdk_config = sdk_config.clone();
    let factory: ClientFactory<dyn EcsApi> =
        Arc::new(move |region: &str| Arc::new(EcsClient::new(&sdk_config, region)) as Arc<dyn EcsApi>);
    ServiceEngine::new(&ECS, regions, settings, factory)
}
