use serde::{Deserialize, Serialize};

use super::error::QueryError;

/// Aggregated output of one `(service, resource)` query
///
/// `results` holds opaque AWS records in arrival order. Records from
/// different regions interleave in whatever order the region tasks finish.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultList {
    pub service: String,
    pub resource: String,
    #[serde(default)]
    pub results: Vec<serde_json::Value>,
}

impl ResultList {
    pub fn new(service: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            resource: resource.into(),
            results: Vec::new(),
        }
    }

    /// Append one region's partial result; an empty partial contributes nothing.
    pub fn append(&mut self, records: Vec<serde_json::Value>) {
        self.results.extend(records);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Render as JSON with 2-space indentation
    pub fn to_pretty_json(&self) -> Result<String, QueryError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
