use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_lambda as lambda;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;

use super::{regional_config, strings_to_json};
use crate::app::query::{ClientFactory, EngineSettings, ResourceSpec, ServiceEngine, ServiceSpec};

#[async_trait]
pub trait LambdaApi: Send + Sync {
    async fn list_functions(&self) -> Result<Vec<serde_json::Value>>;
}

pub struct LambdaClient {
    client: lambda::Client,
}

impl LambdaClient {
    pub fn new(sdk_config: &SdkConfig, region: &str) -> Self {
        Self {
            client: lambda::Client::new(&regional_config(sdk_config, region)),
        }
    }
}

#[async_trait]
impl LambdaApi for LambdaClient {
    async fn list_functions(&self) -> Result<Vec<serde_json::Value>> {
        let response = self
            .client
            .list_functions()
            .send()
            .await
            .context("ListFunctions failed")?;
        Ok(response.functions().iter().map(function_to_json).collect())
    }
}

fn function_to_json(function: &lambda::types::FunctionConfiguration) -> serde_json::Value {
    let mut json = serde_json::Map::new();

    if let Some(function_name) = &function.function_name {
        json.insert(
            "FunctionName".to_string(),
            serde_json::Value::String(function_name.clone()),
        );
    }

    if let Some(function_arn) = &function.function_arn {
        json.insert(
            "FunctionArn".to_string(),
            serde_json::Value::String(function_arn.clone()),
        );
    }

    if let Some(runtime) = &function.runtime {
        json.insert(
            "Runtime".to_string(),
            serde_json::Value::String(runtime.as_str().to_string()),
        );
    }

    if let Some(role) = &function.role {
        json.insert("Role".to_string(), serde_json::Value::String(role.clone()));
    }

    if let Some(handler) = &function.handler {
        json.insert("Handler".to_string(), serde_json::Value::String(handler.clone()));
    }

    json.insert(
        "CodeSize".to_string(),
        serde_json::Value::Number(function.code_size.into()),
    );

    if let Some(description) = &function.description {
        json.insert(
            "Description".to_string(),
            serde_json::Value::String(description.clone()),
        );
    }

    if let Some(timeout) = function.timeout {
        json.insert("Timeout".to_string(), serde_json::Value::Number(timeout.into()));
    }

    if let Some(memory_size) = function.memory_size {
        json.insert("MemorySize".to_string(), serde_json::Value::Number(memory_size.into()));
    }

    // Lambda reports this as an ISO 8601 string already
    if let Some(last_modified) = &function.last_modified {
        json.insert(
            "LastModified".to_string(),
            serde_json::Value::String(last_modified.clone()),
        );
    }

    if let Some(version) = &function.version {
        json.insert("Version".to_string(), serde_json::Value::String(version.clone()));
    }

    if let Some(package_type) = &function.package_type {
        json.insert(
            "PackageType".to_string(),
            serde_json::Value::String(package_type.as_str().to_string()),
        );
    }

    if let Some(architectures) = &function.architectures {
        json.insert(
            "Architectures".to_string(),
            strings_to_json(architectures.iter().map(|a| a.as_str())),
        );
    }

    if let Some(state) = &function.state {
        json.insert(
            "State".to_string(),
            serde_json::Value::String(state.as_str().to_string()),
        );
    }

    serde_json::Value::Object(json)
}

fn query_functions(api: Arc<dyn LambdaApi>) -> BoxFuture<'static, Result<Vec<serde_json::Value>>> {
    async move { api.list_functions().await }.boxed()
}

pub static LAMBDA: ServiceSpec<dyn LambdaApi> = ServiceSpec {
    name: "lambda",
    timeout: Duration::from_secs(3),
    resources: &[ResourceSpec {
        name: "function",
        query: query_functions,
    }],
};

pub fn engine(
    sdk_config: &SdkConfig,
    regions: &[String],
    settings: &EngineSettings,
) -> ServiceEngine<dyn LambdaApi> {
    let sdk_config = sdk_config.clone();
    let factory: ClientFactory<dyn LambdaApi> = Arc::new(move |region: &str| {
        Arc::new(LambdaClient::new(&sdk_config, region)) as Arc<dyn LambdaApi>
    });
    ServiceEngine::new(&LAMBDA, regions, settings, factory)
}
