use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AnalysisError, AnalysisKind, AreaOfInterest, DataSource, FetchError, GeoBounds, SourceEndpoints};

/// Data returned by a fetch
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SatelliteData {
    pub source: DataSource,
    pub endpoint: String,
    pub fetched_at: DateTime<Utc>,
    /// Provider-specific scene records
    #[serde(default)]
    pub scenes: Vec<serde_json::Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: AnalysisKind,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub bounds: GeoBounds,
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub findings: Vec<Finding>,
}

/// Capability a panel uses for fetch/analysis work.
///
/// Calls are dispatched off the UI thread and may be cancelled at any await
/// point when the owning panel closes.
#[async_trait]
pub trait DomainService: Send + Sync {
    async fn fetch(&self, source: DataSource) -> Result<SatelliteData, FetchError>;

    async fn analyze(&self, area: AreaOfInterest) -> Result<AnalysisReport, AnalysisError>;
}

/// Stub service: validates and logs requests, contacts nothing
#[derive(Clone, Debug, Default)]
pub struct LoggingDomainService {
    endpoints: SourceEndpoints,
}

impl LoggingDomainService {
    pub fn new(endpoints: SourceEndpoints) -> Self {
        Self { endpoints }
    }

    pub fn endpoints(&self) -> &SourceEndpoints {
        &self.endpoints
    }
}

#[async_trait]
impl DomainService for LoggingDomainService {
    async fn fetch(&self, source: DataSource) -> Result<SatelliteData, FetchError> {
        let endpoint = self
            .endpoints
            .get(source)
            .ok_or(FetchError::UnsupportedSource(source))?;
        log::info!("[LoggingDomainService] Fetching satellite data from: {} ({})", source, endpoint);

        Ok(SatelliteData {
            source,
            endpoint: endpoint.to_string(),
            fetched_at: Utc::now(),
            scenes: Vec::new(),
        })
    }

    async fn analyze(&self, area: AreaOfInterest) -> Result<AnalysisReport, AnalysisError> {
        area.validate()?;
        log::info!(
            "[LoggingDomainService] Performing geospatial analysis {:?} for {:?}",
            area.analyses,
            area.bounds
        );

        Ok(AnalysisReport {
            bounds: area.bounds,
            generated_at: Utc::now(),
            findings: Vec::new(),
        })
    }
}
