use std::collections::HashMap;

/// Region global services are queried from
pub const GLOBAL_QUERY_REGION: &str = "us-east-1";

/// Registry of AWS services whose API is not regional
///
/// An engine for a global service ignores the caller's region set and fans
/// out to exactly one region, so the same data is not fetched N times.
pub struct GlobalServiceRegistry {
    global_services: HashMap<&'static str, &'static str>,
}

impl Default for GlobalServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl GlobalServiceRegistry {
    pub fn new() -> Self {
        let mut registry = HashMap::new();

        // IAM - users, roles, groups and policies are account-wide
        registry.insert("iam", GLOBAL_QUERY_REGION);

        // Route53 and S3 are intentionally absent: their engines keep the
        // caller's region list, matching the command's established output.

        Self {
            global_services: registry,
        }
    }

    /// Check if a service is global
    pub fn is_global(&self, service: &str) -> bool {
        self.global_services.contains_key(service)
    }

    /// Region to query for a global service, `None` for regional services
    pub fn query_region(&self, service: &str) -> Option<&'static str> {
        self.global_services.get(service).copied()
    }
}

/// Convenience function to check if a service is global
pub fn is_global_service(service: &str) -> bool {
    GlobalServiceRegistry::new().is_global(service)
}

/// Replace `regions` with the single global query region when `service` is global.
pub fn effective_regions(service: &str, regions: &[String]) -> Vec<String> {
    match GlobalServiceRegistry::new().query_region(service) {
        Some(region) => vec![region.to_string()],
        None => regions.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_service_detection() {
        let registry = GlobalServiceRegistry::new();

        assert!(registry.is_global("iam"));

        assert!(!registry.is_global("ec2"));
        assert!(!registry.is_global("s3"));
        assert!(!registry.is_global("route53"));
        assert!(!registry.is_global("logs"));
    }

    #[test]
    fn test_convenience_function() {
        assert!(is_global_service("iam"));
        assert!(!is_global_service("lambda"));
    }

    #[test]
    fn test_query_region() {
        let registry = GlobalServiceRegistry::new();
        assert_eq!(registry.query_region("iam"), Some("us-east-1"));
        assert_eq!(registry.query_region("ecs"), None);
    }

    #[test]
    fn test_effective_regions_override() {
        let regions = vec!["eu-west-1".to_string(), "ap-south-1".to_string()];

        assert_eq!(effective_regions("iam", &regions), vec!["us-east-1"]);
        assert_eq!(effective_regions("ecs", &regions), regions);
    }
}
