//! Region fan-out query engine.
//!
//! One [`ServiceEngine`] exists per AWS service. A query binds the requested
//! resource name to a per-region query function from the service's static
//! [`ServiceSpec`], spawns one task per region, and collects exactly one
//! report per region before a fixed deadline. Any missing report fails the
//! whole call; partial results are never returned.

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use super::client_cache::{ClientFactory, RegionClientCache};
use super::error::QueryError;
use super::result::ResultList;
use crate::app::global_services::{effective_regions, is_global_service};
use crate::app::sdk_errors::categorize_error;

/// Per-region query bound to one `(service, resource)` pair
pub type RegionQuery<A> = fn(Arc<A>) -> BoxFuture<'static, anyhow::Result<Vec<serde_json::Value>>>;

/// One entry of a service's resource table
pub struct ResourceSpec<A: ?Sized + 'static> {
    pub name: &'static str,
    pub query: RegionQuery<A>,
}

/// Static description of a service: its name, deadline and resource table
pub struct ServiceSpec<A: ?Sized + 'static> {
    pub name: &'static str,
    pub timeout: Duration,
    pub resources: &'static [ResourceSpec<A>],
}

impl<A: ?Sized + 'static> ServiceSpec<A> {
    pub fn resource(&self, name: &str) -> Option<&ResourceSpec<A>> {
        self.resources.iter().find(|r| r.name == name)
    }

    /// Resource names in declaration order
    pub fn resource_names(&self) -> Vec<&'static str> {
        self.resources.iter().map(|r| r.name).collect()
    }
}

/// What the collector does when a region's AWS call fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Return the first region error immediately and cancel the other regions.
    #[default]
    FailFast,
    /// Log the region error and report nothing; the call then fails at the
    /// shared deadline with [`QueryError::DeadlineExceeded`].
    WaitForDeadline,
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::FailFast => write!(f, "fail-fast"),
            FailurePolicy::WaitForDeadline => write!(f, "wait-for-deadline"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineSettings {
    /// Replaces the service's fixed deadline when set
    pub timeout_override: Option<Duration>,
    pub failure_policy: FailurePolicy,
}

/// Object-safe view of an engine, used by the client facade.
#[async_trait]
pub trait ResourceQuery: Send + Sync {
    fn service(&self) -> &'static str;

    /// Regions this engine fans out to, after any global-service override
    fn regions(&self) -> &[String];

    fn timeout(&self) -> Duration;

    fn supported_resources(&self) -> Vec<&'static str>;

    fn validate(&self, resource: &str) -> bool;

    async fn query(&self, resource: &str) -> Result<ResultList, QueryError>;
}

enum RegionReport {
    Completed {
        region: String,
        records: Vec<serde_json::Value>,
    },
    Failed {
        region: String,
        error: anyhow::Error,
    },
}

pub struct ServiceEngine<A: ?Sized + Send + Sync + 'static> {
    spec: &'static ServiceSpec<A>,
    regions: Vec<String>,
    timeout: Duration,
    failure_policy: FailurePolicy,
    clients: RegionClientCache<A>,
}

impl<A: ?Sized + Send + Sync + 'static> ServiceEngine<A> {
    pub fn new(
        spec: &'static ServiceSpec<A>,
        regions: &[String],
        settings: &EngineSettings,
        factory: ClientFactory<A>,
    ) -> Self {
        let regions = effective_regions(spec.name, regions);
        if is_global_service(spec.name) {
            trace_debug!(
                "{} is a global service, querying {} only",
                spec.name,
                regions.join(",")
            );
        }

        Self {
            spec,
            timeout: settings.timeout_override.unwrap_or(spec.timeout),
            failure_policy: settings.failure_policy,
            clients: RegionClientCache::new(regions.len(), factory),
            regions,
        }
    }

    /// Per-region client cache, exposed so callers can pre-seed clients
    pub fn clients(&self) -> &RegionClientCache<A> {
        &self.clients
    }

    fn deadline_error(&self, resource: &str, pending: usize) -> QueryError {
        QueryError::DeadlineExceeded {
            service: self.spec.name.to_string(),
            resource: resource.to_string(),
            timeout: self.timeout,
            pending,
        }
    }

    async fn fan_out(&self, bound: &ResourceSpec<A>) -> Result<ResultList, QueryError> {
        let service = self.spec.name;
        let resource = bound.name;
        let expected = self.regions.len();

        trace_info!(
            "querying {}/{} across {} region(s), deadline {:?}",
            service,
            resource,
            expected,
            self.timeout
        );

        // Each task sends at most once, so sends never wait on capacity.
        let (tx, mut rx) = mpsc::channel::<RegionReport>(expected.max(1));
        let token = CancellationToken::new();
        let _cancel_on_return = token.clone().drop_guard();

        for region in &self.regions {
            let span = tracing::info_span!("region_query", service, resource, region = %region);
            let clients = self.clients.clone();
            let tx = tx.clone();
            let token = token.clone();
            let region = region.clone();
            let query = bound.query;
            let policy = self.failure_policy;

            tokio::spawn(
                async move {
                    let api = clients.get_or_create(&region);
                    let outcome = tokio::select! {
                        _ = token.cancelled() => {
                            trace_debug!("{}/{} in {} cancelled", service, resource, region);
                            return;
                        }
                        outcome = query(api) => outcome,
                    };

                    match outcome {
                        Ok(records) => {
                            trace_debug!(
                                "{}/{} in {} returned {} record(s)",
                                service,
                                resource,
                                region,
                                records.len()
                            );
                            let _ = tx.send(RegionReport::Completed { region, records }).await;
                        }
                        Err(error) => {
                            let category = categorize_error(&error);
                            trace_error!(
                                "{}/{} query failed in region {} [{}]: {:#}",
                                service,
                                resource,
                                region,
                                category.log_tag(),
                                error
                            );
                            if policy == FailurePolicy::FailFast {
                                let _ = tx.send(RegionReport::Failed { region, error }).await;
                            }
                        }
                    }
                }
                .instrument(span),
            );
        }

        // `tx` stays alive until the collector returns: a region that
        // reports nothing is only ever accounted for by the deadline.
        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);

        let mut aggregate = ResultList::new(service, resource);
        let mut received = 0;

        while received < expected {
            let pending = expected - received;

            tokio::select! {
                _ = &mut deadline => {
                    trace_warn!(
                        "{}/{} deadline of {:?} reached with {} of {} region(s) reported",
                        service,
                        resource,
                        self.timeout,
                        received,
                        expected
                    );
                    return Err(self.deadline_error(resource, pending));
                }
                report = rx.recv() => match report {
                    Some(RegionReport::Completed { region, records }) => {
                        trace_trace!("collected {} record(s) from {}", records.len(), region);
                        received += 1;
                        aggregate.append(records);
                    }
                    Some(RegionReport::Failed { region, error }) => {
                        return Err(QueryError::RegionFailed {
                            service: service.to_string(),
                            resource: resource.to_string(),
                            region,
                            source: error,
                        });
                    }
                    None => {
                        (&mut deadline).await;
                        return Err(self.deadline_error(resource, pending));
                    }
                },
            }
        }

        drop(tx);
        trace_info!(
            "{}/{} finished with {} record(s)",
            service,
            resource,
            aggregate.len()
        );
        Ok(aggregate)
    }
}

#[async_trait]
impl<A: ?Sized + Send + Sync + 'static> ResourceQuery for ServiceEngine<A> {
    fn service(&self) -> &'static str {
        self.spec.name
    }

    fn regions(&self) -> &[String] {
        &self.regions
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn supported_resources(&self) -> Vec<&'static str> {
        self.spec.resource_names()
    }

    fn validate(&self, resource: &str) -> bool {
        self.spec.resource(resource).is_some()
    }

    async fn query(&self, resource: &str) -> Result<ResultList, QueryError> {
        match self.spec.resource(resource) {
            Some(bound) => self.fan_out(bound).await,
            None => {
                trace_error!(
                    "resource '{}' not supported in {} service",
                    resource,
                    self.spec.name
                );
                Err(QueryError::UnsupportedResource {
                    service: self.spec.name.to_string(),
                    resource: resource.to_string(),
                })
            }
        }
    }
}
