//! Caller-facing facade over one service engine.
//!
//! [`AwsresqClient`] binds a service name to its engine, resolves the region
//! specifier once, and renders results as JSON text. The set of services is
//! fixed at compile time in [`ServiceRegistry`].

use aws_config::SdkConfig;

use super::aws_services::{
    cloudformation, cloudwatch, configservice, ec2, ecr, ecs, efs, iam, lambda, logs, route53, s3,
};
use super::config::ClientConfig;
use super::query::{EngineSettings, QueryError, ResourceQuery, ResultList, ServiceSpec};
use super::regions::resolve_regions;

type EngineConstructor = fn(&SdkConfig, &[String], &EngineSettings) -> Box<dyn ResourceQuery>;

/// One queryable service
pub struct ServiceEntry {
    pub name: &'static str,
    pub resources: Vec<&'static str>,
    build: EngineConstructor,
}

impl ServiceEntry {
    fn new<A: ?Sized + 'static>(spec: &'static ServiceSpec<A>, build: EngineConstructor) -> Self {
        Self {
            name: spec.name,
            resources: spec.resource_names(),
            build,
        }
    }
}

/// Service name to engine constructor
pub struct ServiceRegistry {
    entries: Vec<ServiceEntry>,
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceRegistry {
    pub fn new() -> Self {
        let entries = vec![
            ServiceEntry::new(&ecs::ECS, |c, r, s| Box::new(ecs::engine(c, r, s))),
            ServiceEntry::new(&ec2::EC2, |c, r, s| Box::new(ec2::engine(c, r, s))),
            ServiceEntry::new(&iam::IAM, |c, r, s| Box::new(iam::engine(c, r, s))),
            ServiceEntry::new(&s3::S3, |c, r, s| Box::new(s3::engine(c, r, s))),
            ServiceEntry::new(&cloudformation::CLOUDFORMATION, |c, r, s| {
                Box::new(cloudformation::engine(c, r, s))
            }),
            ServiceEntry::new(&lambda::LAMBDA, |c, r, s| Box::new(lambda::engine(c, r, s))),
            ServiceEntry::new(&cloudwatch::CLOUDWATCH, |c, r, s| {
                Box::new(cloudwatch::engine(c, r, s))
            }),
            ServiceEntry::new(&configservice::CONFIG, |c, r, s| {
                Box::new(configservice::engine(c, r, s))
            }),
            ServiceEntry::new(&efs::EFS, |c, r, s| Box::new(efs::engine(c, r, s))),
            ServiceEntry::new(&route53::ROUTE53, |c, r, s| Box::new(route53::engine(c, r, s))),
            ServiceEntry::new(&logs::LOGS, |c, r, s| Box::new(logs::engine(c, r, s))),
            ServiceEntry::new(&ecr::ECR, |c, r, s| Box::new(ecr::engine(c, r, s))),
        ];
        Self { entries }
    }

    pub fn get(&self, service: &str) -> Option<&ServiceEntry> {
        self.entries.iter().find(|e| e.name == service)
    }

    pub fn entries(&self) -> &[ServiceEntry] {
        &self.entries
    }

    pub fn service_names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.name).collect()
    }
}

/// Facade bound to one service
pub struct AwsresqClient {
    service: String,
    engine: Box<dyn ResourceQuery>,
}

impl std::fmt::Debug for AwsresqClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsresqClient")
            .field("service", &self.service)
            .field("regions", &self.engine.regions())
            .finish()
    }
}

impl AwsresqClient {
    /// Build the engine for `config.service`.
    ///
    /// No AWS call is made here; region clients are created on first query.
    pub fn new(config: &ClientConfig, sdk_config: &SdkConfig) -> Result<Self, QueryError> {
        Self::with_registry(&ServiceRegistry::new(), config, sdk_config)
    }

    pub fn with_registry(
        registry: &ServiceRegistry,
        config: &ClientConfig,
        sdk_config: &SdkConfig,
    ) -> Result<Self, QueryError> {
        let entry = registry.get(&config.service).ok_or_else(|| {
            trace_error!(
                "service not supported: {} (supported: {})",
                config.service,
                registry.service_names().join(", ")
            );
            QueryError::UnsupportedService {
                service: config.service.clone(),
            }
        })?;

        let regions = resolve_regions(&config.region_spec);
        trace_debug!(
            "{} client over {} region(s), policy {}",
            entry.name,
            regions.len(),
            config.engine.failure_policy
        );

        Ok(Self {
            service: entry.name.to_string(),
            engine: (entry.build)(sdk_config, &regions, &config.engine),
        })
    }

    /// Wrap an existing engine
    pub fn with_engine(engine: Box<dyn ResourceQuery>) -> Self {
        Self {
            service: engine.service().to_string(),
            engine,
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Regions the engine fans out to, after global-service collapsing
    pub fn regions(&self) -> &[String] {
        self.engine.regions()
    }

    pub fn validate(&self, resource: &str) -> bool {
        self.engine.validate(resource)
    }

    pub fn supported_resources(&self) -> Vec<&'static str> {
        self.engine.supported_resources()
    }

    pub async fn query(&self, resource: &str) -> Result<ResultList, QueryError> {
        self.engine.query(resource).await
    }

    /// Query and render as pretty-printed JSON.
    ///
    /// `service` must name the service this client was built for.
    pub async fn search(&self, service: &str, resource: &str) -> Result<String, QueryError> {
        if service != self.service {
            return Err(QueryError::ServiceMismatch {
                expected: self.service.clone(),
                requested: service.to_string(),
            });
        }

        let list = self.query(resource).await?;
        trace_info!(
            "{} {}: {} record(s) from {} region(s)",
            service,
            resource,
            list.len(),
            self.regions().len()
        );
        list.to_pretty_json()
    }
}
