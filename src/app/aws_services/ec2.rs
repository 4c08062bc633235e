use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ec2 as ec2;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;

use super::{datetime_to_json, regional_config, tags_to_json};
use crate::app::query::{ClientFactory, EngineSettings, ResourceSpec, ServiceEngine, ServiceSpec};

#[async_trait]
pub trait Ec2Api: Send + Sync {
    /// Instances of every reservation, flattened
    async fn describe_instances(&self) -> Result<Vec<serde_json::Value>>;

    async fn describe_security_groups(&self) -> Result<Vec<serde_json::Value>>;

    async fn describe_vpcs(&self) -> Result<Vec<serde_json::Value>>;
}

pub struct Ec2Client {
    client: ec2::Client,
}

impl Ec2Client {
    pub fn new(sdk_config: &SdkConfig, region: &str) -> Self {
        Self {
            client: ec2::Client::new(&regional_config(sdk_config, region)),
        }
    }
}

#[async_trait]
impl Ec2Api for Ec2Client {
    async fn describe_instances(&self) -> Result<Vec<serde_json::Value>> {
        let response = self
            .client
            .describe_instances()
            .send()
            .await
            .context("DescribeInstances failed")?;

        let mut instances = Vec::new();
        for reservation in response.reservations() {
            for instance in reservation.instances() {
                instances.push(instance_to_json(instance));
            }
        }
        Ok(instances)
    }

    async fn describe_security_groups(&self) -> Result<Vec<serde_json::Value>> {
        let response = self
            .client
            .describe_security_groups()
            .send()
            .await
            .context("DescribeSecurityGroups failed")?;

        Ok(response
            .security_groups()
            .iter()
            .map(security_group_to_json)
            .collect())
    }

    async fn describe_vpcs(&self) -> Result<Vec<serde_json::Value>> {
        let response = self
            .client
            .describe_vpcs()
            .send()
            .await
            .context("DescribeVpcs failed")?;

        Ok(response.vpcs().iter().map(vpc_to_json).collect())
    }
}

fn instance_to_json(instance: &ec2::types::Instance) -> serde_json::Value {
    let mut json = serde_json::Map::new();

    if let Some(id) = &instance.instance_id {
        json.insert("InstanceId".to_string(), serde_json::Value::String(id.clone()));
    }

    if let Some(state) = &instance.state {
        if let Some(name) = &state.name {
            let mut state_json = serde_json::Map::new();
            state_json.insert(
                "Name".to_string(),
                serde_json::Value::String(name.as_str().to_string()),
            );
            if let Some(code) = state.code {
                state_json.insert("Code".to_string(), serde_json::Value::Number(code.into()));
            }
            json.insert("State".to_string(), serde_json::Value::Object(state_json));
        }
    }

    if let Some(instance_type) = &instance.instance_type {
        json.insert(
            "InstanceType".to_string(),
            serde_json::Value::String(instance_type.as_str().to_string()),
        );
    }

    if let Some(image_id) = &instance.image_id {
        json.insert("ImageId".to_string(), serde_json::Value::String(image_id.clone()));
    }

    if let Some(vpc_id) = &instance.vpc_id {
        json.insert("VpcId".to_string(), serde_json::Value::String(vpc_id.clone()));
    }

    if let Some(subnet_id) = &instance.subnet_id {
        json.insert("SubnetId".to_string(), serde_json::Value::String(subnet_id.clone()));
    }

    if let Some(private_ip) = &instance.private_ip_address {
        json.insert(
            "PrivateIpAddress".to_string(),
            serde_json::Value::String(private_ip.clone()),
        );
    }

    if let Some(public_ip) = &instance.public_ip_address {
        json.insert(
            "PublicIpAddress".to_string(),
            serde_json::Value::String(public_ip.clone()),
        );
    }

    if let Some(launch_time) = &instance.launch_time {
        json.insert("LaunchTime".to_string(), datetime_to_json(launch_time));
    }

    if let Some(security_groups) = &instance.security_groups {
        let security_groups_json: Vec<serde_json::Value> = security_groups
            .iter()
            .map(|sg| {
                let mut sg_json = serde_json::Map::new();
                if let Some(id) = &sg.group_id {
                    sg_json.insert("GroupId".to_string(), serde_json::Value::String(id.clone()));
                }
                if let Some(name) = &sg.group_name {
                    sg_json.insert("GroupName".to_string(), serde_json::Value::String(name.clone()));
                }
                serde_json::Value::Object(sg_json)
            })
            .collect();
        json.insert(
            "SecurityGroups".to_string(),
            serde_json::Value::Array(security_groups_json),
        );
    }

    if let Some(tags) = &instance.tags {
        json.insert(
            "Tags".to_string(),
            tags_to_json(tags.iter().map(|t| (t.key(), t.value()))),
        );
    }

    serde_json::Value::Object(json)
}

fn ip_permissions_to_json(permissions: &[ec2::types::IpPermission]) -> serde_json::Value {
    let rules: Vec<serde_json::Value> = permissions
        .iter()
        .map(|rule| {
            let mut rule_json = serde_json::Map::new();
            if let Some(protocol) = &rule.ip_protocol {
                rule_json.insert(
                    "IpProtocol".to_string(),
                    serde_json::Value::String(protocol.clone()),
                );
            }
            if let Some(from_port) = rule.from_port {
                rule_json.insert("FromPort".to_string(), serde_json::Value::Number(from_port.into()));
            }
            if let Some(to_port) = rule.to_port {
                rule_json.insert("ToPort".to_string(), serde_json::Value::Number(to_port.into()));
            }
            if let Some(ip_ranges) = &rule.ip_ranges {
                let ranges: Vec<serde_json::Value> = ip_ranges
                    .iter()
                    .map(|range| {
                        let mut range_json = serde_json::Map::new();
                        if let Some(cidr) = &range.cidr_ip {
                            range_json.insert("CidrIp".to_string(), serde_json::Value::String(cidr.clone()));
                        }
                        if let Some(description) = &range.description {
                            range_json.insert(
                                "Description".to_string(),
                                serde_json::Value::String(description.clone()),
                            );
                        }
                        serde_json::Value::Object(range_json)
                    })
                    .collect();
                rule_json.insert("IpRanges".to_string(), serde_json::Value::Array(ranges));
            }
            if let Some(group_pairs) = &rule.user_id_group_pairs {
                let pairs: Vec<serde_json::Value> = group_pairs
                    .iter()
                    .filter_map(|pair| pair.group_id.clone())
                    .map(|group_id| {
                        let mut pair_json = serde_json::Map::new();
                        pair_json.insert("GroupId".to_string(), serde_json::Value::String(group_id));
                        serde_json::Value::Object(pair_json)
                    })
                    .collect();
                rule_json.insert("UserIdGroupPairs".to_string(), serde_json::Value::Array(pairs));
            }
            serde_json::Value::Object(rule_json)
        })
        .collect();
    serde_json::Value::Array(rules)
}

fn security_group_to_json(group: &ec2::types::SecurityGroup) -> serde_json::Value {
    let mut json = serde_json::Map::new();

    if let Some(id) = &group.group_id {
        json.insert("GroupId".to_string(), serde_json::Value::String(id.clone()));
    }

    if let Some(name) = &group.group_name {
        json.insert("GroupName".to_string(), serde_json::Value::String(name.clone()));
    }

    if let Some(description) = &group.description {
        json.insert(
            "Description".to_string(),
            serde_json::Value::String(description.clone()),
        );
    }

    if let Some(vpc_id) = &group.vpc_id {
        json.insert("VpcId".to_string(), serde_json::Value::String(vpc_id.clone()));
    }

    if let Some(owner_id) = &group.owner_id {
        json.insert("OwnerId".to_string(), serde_json::Value::String(owner_id.clone()));
    }

    if let Some(ip_permissions) = &group.ip_permissions {
        json.insert("IpPermissions".to_string(), ip_permissions_to_json(ip_permissions));
    }

    if let Some(ip_permissions_egress) = &group.ip_permissions_egress {
        json.insert(
            "IpPermissionsEgress".to_string(),
            ip_permissions_to_json(ip_permissions_egress),
        );
    }

    if let Some(tags) = &group.tags {
        json.insert(
            "Tags".to_string(),
            tags_to_json(tags.iter().map(|t| (t.key(), t.value()))),
        );
    }

    serde_json::Value::Object(json)
}

fn vpc_to_json(vpc: &ec2::types::Vpc) -> serde_json::Value {
    let mut json = serde_json::Map::new();

    if let Some(id) = &vpc.vpc_id {
        json.insert("VpcId".to_string(), serde_json::Value::String(id.clone()));
    }

    if let Some(cidr) = &vpc.cidr_block {
        json.insert("CidrBlock".to_string(), serde_json::Value::String(cidr.clone()));
    }

    if let Some(state) = &vpc.state {
        json.insert(
            "State".to_string(),
            serde_json::Value::String(state.as_str().to_string()),
        );
    }

    if let Some(is_default) = vpc.is_default {
        json.insert("IsDefault".to_string(), serde_json::Value::Bool(is_default));
    }

    if let Some(dhcp_options_id) = &vpc.dhcp_options_id {
        json.insert(
            "DhcpOptionsId".to_string(),
            serde_json::Value::String(dhcp_options_id.clone()),
        );
    }

    if let Some(cidr_block_associations) = &vpc.cidr_block_association_set {
        let cidr_blocks: Vec<serde_json::Value> = cidr_block_associations
            .iter()
            .map(|cb| {
                let mut cb_json = serde_json::Map::new();
                if let Some(cidr) = &cb.cidr_block {
                    cb_json.insert("CidrBlock".to_string(), serde_json::Value::String(cidr.clone()));
                }
                if let Some(state_name) = cb.cidr_block_state.as_ref().and_then(|s| s.state.as_ref()) {
                    cb_json.insert(
                        "State".to_string(),
                        serde_json::Value::String(state_name.as_str().to_string()),
                    );
                }
                serde_json::Value::Object(cb_json)
            })
            .collect();
        json.insert(
            "CidrBlockAssociationSet".to_string(),
            serde_json::Value::Array(cidr_blocks),
        );
    }

    if let Some(tags) = &vpc.tags {
        json.insert(
            "Tags".to_string(),
            tags_to_json(tags.iter().map(|t| (t.key(), t.value()))),
        );
    }

    serde_json::Value::Object(json)
}

fn query_instances(api: Arc<dyn Ec2Api>) -> BoxFuture<'static, Result<Vec<serde_json::Value>>> {
    async move { api.describe_instances().await }.boxed()
}

fn query_security_groups(api: Arc<dyn Ec2Api>) -> BoxFuture<'static, Result<Vec<serde_json::Value>>> {
    async move { api.describe_security_groups().await }.boxed()
}

fn query_vpcs(api: Arc<dyn Ec2Api>) -> BoxFuture<'static, Result<Vec<serde_json::Value>>> {
    async move { api.describe_vpcs().await }.boxed()
}

pub static EC2: ServiceSpec<dyn Ec2Api> = ServiceSpec {
    name: "ec2",
    timeout: Duration::from_secs(3),
    resources: &[
        ResourceSpec {
            name: "instance",
            query: query_instances,
        },
        ResourceSpec {
            name: "security-group",
            query: query_security_groups,
        },
        ResourceSpec {
            name: "vpc",
            query: query_vpcs,
        },
    ],
};

pub fn engine(
    sdk_config: &SdkConfig,
    regions: &[String],
    settings: &EngineSettings,
) -> ServiceEngine<dyn Ec2Api> {
    let sdk_config = sdk_config.clone();
    let factory: ClientFactory<dyn Ec2Api> =
        Arc::new(move |region: &str| Arc::new(Ec2Client::new(&sdk_config, region)) as Arc<dyn Ec2Api>);
    ServiceEngine::new(&EC2, regions, settings, factory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::query::ResourceQuery;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct MockEc2 {
        region: String,
    }

    #[async_trait]
    impl Ec2Api for MockEc2 {
        async fn describe_instances(&self) -> Result<Vec<serde_json::Value>> {
            Ok(vec![
                json!({ "InstanceId": format!("i-{}-a", self.region) }),
                json!({ "InstanceId": format!("i-{}-b", self.region) }),
            ])
        }

        async fn describe_security_groups(&self) -> Result<Vec<serde_json::Value>> {
            Ok(vec![json!({ "GroupId": "sg-1" })])
        }

        async fn describe_vpcs(&self) -> Result<Vec<serde_json::Value>> {
            Ok(Vec::new())
        }
    }

    fn mock_engine(regions: &[&str]) -> ServiceEngine<dyn Ec2Api> {
        let regions: Vec<String> = regions.iter().map(|r| r.to_string()).collect();
        let factory: ClientFactory<dyn Ec2Api> = Arc::new(|region: &str| {
            Arc::new(MockEc2 {
                region: region.to_string(),
            }) as Arc<dyn Ec2Api>
        });
        ServiceEngine::new(&EC2, &regions, &EngineSettings::default(), factory)
    }

    #[test]
    fn test_validate_resources() {
        let engine = mock_engine(&["us-east-1"]);
        for resource in ["instance", "security-group", "vpc"] {
            assert!(engine.validate(resource));
        }
        for resource in ["cluster", "subnet", "Instance"] {
            assert!(!engine.validate(resource));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_instances_sum_across_regions() {
        let engine = mock_engine(&["us-east-1", "us-west-2", "eu-north-1"]);

        let list = engine.query("instance").await.unwrap();

        assert_eq!(list.service, "ec2");
        assert_eq!(list.resource, "instance");
        assert_eq!(list.len(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_regions_contribute_nothing() {
        let engine = mock_engine(&["us-east-1", "us-west-2"]);
        let list = engine.query("vpc").await.unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_security_group_conversion() {
        let group = ec2::types::SecurityGroup::builder()
            .group_id("sg-0123")
            .group_name("web")
            .vpc_id("vpc-1")
            .ip_permissions(
                ec2::types::IpPermission::builder()
                    .ip_protocol("tcp")
                    .from_port(443)
                    .to_port(443)
                    .ip_ranges(ec2::types::IpRange::builder().cidr_ip("0.0.0.0/0").build())
                    .build(),
            )
            .build();

        let json = security_group_to_json(&group);

        assert_eq!(json["GroupId"], json!("sg-0123"));
        assert_eq!(
            json["IpPermissions"],
            json!([{
                "IpProtocol": "tcp",
                "FromPort": 443,
                "ToPort": 443,
                "IpRanges": [{"CidrIp": "0.0.0.0/0"}]
            }])
        );
    }
}
