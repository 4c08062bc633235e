#[cfg(test)]
mod client_facade_tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use aws_config::{BehaviorVersion, SdkConfig};
    use aws_types::region::Region;
    use awsresq::app::client::{AwsresqClient, ServiceRegistry};
    use awsresq::app::config::ClientConfig;
    use awsresq::app::query::{QueryError, ResourceQuery, ResultList};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sdk_config() -> SdkConfig {
        SdkConfig::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-west-2"))
            .build()
    }

    /// Supported (service, resource) pairs
    const MATRIX: &[(&str, &[&str])] = &[
        ("ecs", &["cluster", "service", "task-definition"]),
        ("ec2", &["instance", "security-group", "vpc"]),
        ("iam", &["group", "policy", "role", "user"]),
        ("s3", &["bucket"]),
        ("cloudformation", &["stack", "stack-set"]),
        ("lambda", &["function"]),
        ("cloudwatch", &["metric"]),
        ("config", &["rule"]),
        ("efs", &["file-system"]),
        ("route53", &["hosted-zone"]),
        ("logs", &["log-group"]),
        ("ecr", &["repository"]),
    ];

    #[test]
    fn test_supported_matrix() {
        let registry = ServiceRegistry::new();
        let actual: Vec<(&str, Vec<&str>)> = registry
            .entries()
            .iter()
            .map(|e| (e.name, e.resources.clone()))
            .collect();
        let expected: Vec<(&str, Vec<&str>)> =
            MATRIX.iter().map(|(s, r)| (*s, r.to_vec())).collect();

        assert_eq!(actual, expected);
    }

    #[test]
    fn test_every_pair_validates() {
        for (service, resources) in MATRIX {
            let client =
                AwsresqClient::new(&ClientConfig::new(*service, "us-east-1"), &sdk_config())
                    .unwrap();
            assert_eq!(client.service(), *service);
            assert_eq!(client.supported_resources(), resources.to_vec());
            for resource in *resources {
                assert!(client.validate(resource), "{service} {resource}");
            }
            // Resource names of every other service
            for (other, foreign) in MATRIX.iter().filter(|(other, _)| other != service) {
                for resource in foreign.iter().filter(|r| !resources.contains(*r)) {
                    assert!(
                        !client.validate(resource),
                        "{service} accepted {other} resource {resource}"
                    );
                }
            }
            assert!(!client.validate(""), "{service} accepted an empty resource");
            assert!(!client.validate("Cluster"), "{service} accepted a capitalised resource");
        }
    }

    #[test]
    fn test_unknown_service_fails_construction() {
        for service in ["dynamodb", "", "ECS"] {
            let err = AwsresqClient::new(&ClientConfig::new(service, ""), &sdk_config()).unwrap_err();
            assert_eq!(err.to_string(), format!("service not supported: {service}"));
        }
    }

    #[test]
    fn test_all_regions_by_default() {
        let client = AwsresqClient::new(&ClientConfig::new("ec2", ""), &sdk_config()).unwrap();
        assert_eq!(client.regions().len(), 17);
    }

    struct CannedEngine;

    #[async_trait]
    impl ResourceQuery for CannedEngine {
        fn service(&self) -> &'static str {
            "s3"
        }

        fn regions(&self) -> &[String] {
            &[]
        }

        fn timeout(&self) -> Duration {
            Duration::from_secs(3)
        }

        fn supported_resources(&self) -> Vec<&'static str> {
            vec!["bucket"]
        }

        fn validate(&self, resource: &str) -> bool {
            resource == "bucket"
        }

        async fn query(&self, resource: &str) -> Result<ResultList, QueryError> {
            let mut list = ResultList::new("s3", resource);
            list.append(vec![json!({ "Name": "logs" }), json!({ "Name": "assets" })]);
            Ok(list)
        }
    }

    #[tokio::test]
    async fn test_search_output_shape() {
        let client = AwsresqClient::with_engine(Box::new(CannedEngine));
        let text = client.search("s3", "bucket").await.unwrap();

        let expected = "{\n  \"service\": \"s3\",\n  \"resource\": \"bucket\",\n  \"results\": [\n    {\n      \"Name\": \"logs\"\n    },\n    {\n      \"Name\": \"assets\"\n    }\n  ]\n}";
        assert_eq!(text, expected);
    }

    #[tokio::test]
    async fn test_search_for_other_service_rejected() {
        let client = AwsresqClient::with_engine(Box::new(CannedEngine));
        let err = client.search("ecs", "bucket").await.unwrap_err();
        assert!(matches!(err, QueryError::ServiceMismatch { .. }));
    }
}
