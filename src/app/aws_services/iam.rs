//! IAM is account-wide: the engine is always built against `us-east-1`
//! whatever region list the caller supplies (see `global_services`).

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_iam as iam;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;

use super::{datetime_to_json, regional_config, tags_to_json};
use crate::app::query::{ClientFactory, EngineSettings, ResourceSpec, ServiceEngine, ServiceSpec};

#[async_trait]
pub trait IamApi: Send + Sync {
    async fn list_groups(&self) -> Result<Vec<serde_json::Value>>;

    /// Customer managed policies only
    async fn list_local_policies(&self) -> Result<Vec<serde_json::Value>>;

    async fn list_roles(&self) -> Result<Vec<serde_json::Value>>;

    async fn list_users(&self) -> Result<Vec<serde_json::Value>>;
}

pub struct IamClient {
    client: iam::Client,
}

impl IamClient {
    pub fn new(sdk_config: &SdkConfig, region: &str) -> Self {
        Self {
            client: iam::Client::new(&regional_config(sdk_config, region)),
        }
    }
}

#[async_trait]
impl IamApi for IamClient {
    async fn list_groups(&self) -> Result<Vec<serde_json::Value>> {
        let response = self
            .client
            .list_groups()
            .send()
            .await
            .context("ListGroups failed")?;
        Ok(response.groups().iter().map(group_to_json).collect())
    }

    async fn list_local_policies(&self) -> Result<Vec<serde_json::Value>> {
        let response = self
            .client
            .list_policies()
            .scope(iam::types::PolicyScopeType::Local)
            .send()
            .await
            .context("ListPolicies failed")?;
        Ok(response.policies().iter().map(policy_to_json).collect())
    }

    async fn list_roles(&self) -> Result<Vec<serde_json::Value>> {
        let response = self
            .client
            .list_roles()
            .send()
            .await
            .context("ListRoles failed")?;
        Ok(response.roles().iter().map(role_to_json).collect())
    }

    async fn list_users(&self) -> Result<Vec<serde_json::Value>> {
        let response = self
            .client
            .list_users()
            .send()
            .await
            .context("ListUsers failed")?;
        Ok(response.users().iter().map(user_to_json).collect())
    }
}

fn group_to_json(group: &iam::types::Group) -> serde_json::Value {
    let mut json = serde_json::Map::new();

    json.insert(
        "GroupName".to_string(),
        serde_json::Value::String(group.group_name.clone()),
    );
    json.insert(
        "GroupId".to_string(),
        serde_json::Value::String(group.group_id.clone()),
    );
    json.insert("Arn".to_string(), serde_json::Value::String(group.arn.clone()));
    json.insert("Path".to_string(), serde_json::Value::String(group.path.clone()));
    json.insert("CreateDate".to_string(), datetime_to_json(&group.create_date));

    serde_json::Value::Object(json)
}

fn role_to_json(role: &iam::types::Role) -> serde_json::Value {
    let mut json = serde_json::Map::new();

    json.insert(
        "RoleName".to_string(),
        serde_json::Value::String(role.role_name.clone()),
    );
    json.insert(
        "RoleId".to_string(),
        serde_json::Value::String(role.role_id.clone()),
    );
    json.insert("Arn".to_string(), serde_json::Value::String(role.arn.clone()));
    json.insert("Path".to_string(), serde_json::Value::String(role.path.clone()));
    json.insert("CreateDate".to_string(), datetime_to_json(&role.create_date));

    if let Some(description) = &role.description {
        json.insert(
            "Description".to_string(),
            serde_json::Value::String(description.clone()),
        );
    }

    if let Some(max_session_duration) = role.max_session_duration {
        json.insert(
            "MaxSessionDuration".to_string(),
            serde_json::Value::Number(max_session_duration.into()),
        );
    }

    // URL-encoded JSON as returned by ListRoles
    if let Some(assume_role_policy) = &role.assume_role_policy_document {
        json.insert(
            "AssumeRolePolicyDocument".to_string(),
            serde_json::Value::String(assume_role_policy.clone()),
        );
    }

    if let Some(tags) = &role.tags {
        json.insert(
            "Tags".to_string(),
            tags_to_json(tags.iter().map(|t| (Some(t.key()), Some(t.value())))),
        );
    }

    serde_json::Value::Object(json)
}

fn user_to_json(user: &iam::types::User) -> serde_json::Value {
    let mut json = serde_json::Map::new();

    json.insert(
        "UserName".to_string(),
        serde_json::Value::String(user.user_name.clone()),
    );
    json.insert(
        "UserId".to_string(),
        serde_json::Value::String(user.user_id.clone()),
    );
    json.insert("Arn".to_string(), serde_json::Value::String(user.arn.clone()));
    json.insert("Path".to_string(), serde_json::Value::String(user.path.clone()));
    json.insert("CreateDate".to_string(), datetime_to_json(&user.create_date));

    if let Some(password_last_used) = &user.password_last_used {
        json.insert(
            "PasswordLastUsed".to_string(),
            datetime_to_json(password_last_used),
        );
    }

    if let Some(tags) = &user.tags {
        json.insert(
            "Tags".to_string(),
            tags_to_json(tags.iter().map(|t| (Some(t.key()), Some(t.value())))),
        );
    }

    serde_json::Value::Object(json)
}

fn policy_to_json(policy: &iam::types::Policy) -> serde_json::Value {
    let mut json = serde_json::Map::new();

    if let Some(name) = &policy.policy_name {
        json.insert("PolicyName".to_string(), serde_json::Value::String(name.clone()));
    }

    if let Some(id) = &policy.policy_id {
        json.insert("PolicyId".to_string(), serde_json::Value::String(id.clone()));
    }

    if let Some(arn) = &policy.arn {
        json.insert("Arn".to_string(), serde_json::Value::String(arn.clone()));
    }

    if let Some(path) = &policy.path {
        json.insert("Path".to_string(), serde_json::Value::String(path.clone()));
    }

    if let Some(default_version_id) = &policy.default_version_id {
        json.insert(
            "DefaultVersionId".to_string(),
            serde_json::Value::String(default_version_id.clone()),
        );
    }

    if let Some(attachment_count) = policy.attachment_count {
        json.insert(
            "AttachmentCount".to_string(),
            serde_json::Value::Number(attachment_count.into()),
        );
    }

    json.insert(
        "IsAttachable".to_string(),
        serde_json::Value::Bool(policy.is_attachable),
    );

    if let Some(create_date) = &policy.create_date {
        json.insert("CreateDate".to_string(), datetime_to_json(create_date));
    }

    if let Some(update_date) = &policy.update_date {
        json.insert("UpdateDate".to_string(), datetime_to_json(update_date));
    }

    serde_json::Value::Object(json)
}

fn query_groups(api: Arc<dyn IamApi>) -> BoxFuture<'static, Result<Vec<serde_json::Value>>> {
    async move { api.list_groups().await }.boxed()
}

fn query_policies(api: Arc<dyn IamApi>) -> BoxFuture<'static, Result<Vec<serde_json::Value>>> {
    async move { api.list_local_policies().await }.boxed()
}

fn query_roles(api: Arc<dyn IamApi>) -> BoxFuture<'static, Result<Vec<serde_json::Value>>> {
    async move { api.list_roles().await }.boxed()
}

fn query_users(api: Arc<dyn IamApi>) -> BoxFuture<'static, Result<Vec<serde_json::Value>>> {
    async move { api.list_users().await }.boxed()
}

pub static IAM: ServiceSpec<dyn IamApi> = ServiceSpec {
    name: "iam",
    timeout: Duration::from_secs(3),
    resources: &[
        ResourceSpec {
            name: "group",
            query: query_groups,
        },
        ResourceSpec {
            name: "policy",
            query: query_policies,
        },
        ResourceSpec {
            name: "role",
            query: query_roles,
        },
        ResourceSpec {
            name: "user",
            query: query_users,
        },
    ],
};

pub fn engine(
    sdk_config: &SdkConfig,
    regions: &[String],
    settings: &EngineSettings,
) -> ServiceEngine<dyn IamApi> {
    let sdk_config = sdk_config.clone();
    let factory: ClientFactory<dyn IamApi> =
        Arc::new(move |region: &str| Arc::new(IamClient::new(&sdk_config, region)) as Arc<dyn IamApi>);
    ServiceEngine::new(&IAM, regions, settings, factory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::query::ResourceQuery;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Mutex;

    struct MockIam {
        region: String,
    }

    #[async_trait]
    impl IamApi for MockIam {
        async fn list_groups(&self) -> Result<Vec<serde_json::Value>> {
            Ok(vec![json!({ "GroupName": "admins", "QueriedFrom": self.region })])
        }

        async fn list_local_policies(&self) -> Result<Vec<serde_json::Value>> {
            Ok(Vec::new())
        }

        async fn list_roles(&self) -> Result<Vec<serde_json::Value>> {
            Ok(vec![
                json!({ "RoleName": "deployer", "QueriedFrom": self.region }),
                json!({ "RoleName": "reader", "QueriedFrom": self.region }),
            ])
        }

        async fn list_users(&self) -> Result<Vec<serde_json::Value>> {
            Ok(Vec::new())
        }
    }

    fn recording_engine(regions: &[&str]) -> (ServiceEngine<dyn IamApi>, Arc<Mutex<Vec<String>>>) {
        let requested = Arc::new(Mutex::new(Vec::new()));
        let seen = requested.clone();
        let factory: ClientFactory<dyn IamApi> = Arc::new(move |region: &str| {
            seen.lock().unwrap().push(region.to_string());
            Arc::new(MockIam {
                region: region.to_string(),
            }) as Arc<dyn IamApi>
        });
        let regions: Vec<String> = regions.iter().map(|r| r.to_string()).collect();
        (
            ServiceEngine::new(&IAM, &regions, &EngineSettings::default(), factory),
            requested,
        )
    }

    #[test]
    fn test_validate_resources() {
        let (engine, _) = recording_engine(&["us-east-1"]);
        for resource in ["group", "policy", "role", "user"] {
            assert!(engine.validate(resource));
        }
        assert!(!engine.validate("bucket"));
        assert!(!engine.validate("roles"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_queries_us_east_1_only() {
        let (engine, requested) = recording_engine(&["eu-west-1"]);

        assert_eq!(engine.regions(), ["us-east-1".to_string()]);

        let list = engine.query("role").await.unwrap();

        assert_eq!(list.len(), 2);
        assert!(list.results.iter().all(|r| r["QueriedFrom"] == "us-east-1"));
        assert_eq!(*requested.lock().unwrap(), vec!["us-east-1".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_regions_collapse_to_one_query() {
        let all: Vec<&str> = crate::app::regions::ALL_REGIONS.to_vec();
        let (engine, requested) = recording_engine(&all);

        let list = engine.query("group").await.unwrap();

        assert_eq!(list.len(), 1);
        assert_eq!(requested.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_role_conversion() {
        let role = iam::types::Role::builder()
            .role_name("deployer")
            .role_id("AROAEXAMPLE")
            .arn("arn:aws:iam::123456789012:role/deployer")
            .path("/")
            .create_date(aws_smithy_types::DateTime::from_secs(1_700_000_000))
            .build()
            .unwrap();

        let json = role_to_json(&role);

        assert_eq!(json["RoleName"], json!("deployer"));
        assert_eq!(json["CreateDate"], json!("2023-11-14T22:13:20Z"));
        assert!(json.get("Tags").is_none());
    }
}
