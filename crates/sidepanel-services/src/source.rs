use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// External satellite data sources a panel may fetch from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataSource {
    #[serde(rename = "sentinel-2")]
    Sentinel2,
    #[serde(rename = "landsat-8")]
    Landsat8,
    GoogleEarthEngine,
    Modis,
}

impl DataSource {
    pub const ALL: [DataSource; 4] = [
        DataSource::Sentinel2,
        DataSource::Landsat8,
        DataSource::GoogleEarthEngine,
        DataSource::Modis,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DataSource::Sentinel2 => "sentinel-2",
            DataSource::Landsat8 => "landsat-8",
            DataSource::GoogleEarthEngine => "google-earth-engine",
            DataSource::Modis => "modis",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataSource::ALL
            .into_iter()
            .find(|source| source.as_str() == s)
            .ok_or_else(|| format!("Unknown data source: {}", s))
    }
}

/// Endpoint per data source
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceEndpoints(BTreeMap<DataSource, String>);

impl SourceEndpoints {
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn get(&self, source: DataSource) -> Option<&str> {
        self.0.get(&source).map(String::as_str)
    }

    pub fn set(&mut self, source: DataSource, endpoint: impl Into<String>) {
        self.0.insert(source, endpoint.into());
    }

    pub fn remove(&mut self, source: DataSource) -> Option<String> {
        self.0.remove(&source)
    }
}

impl Default for SourceEndpoints {
    fn default() -> Self {
        let mut endpoints = Self::empty();
        endpoints.set(DataSource::Sentinel2, "https://services.sentinel-hub.com/api/v1");
        endpoints.set(DataSource::Landsat8, "https://landsatlook.usgs.gov/stac-server");
        endpoints.set(DataSource::GoogleEarthEngine, "https://earthengine.googleapis.com/v1");
        endpoints.set(DataSource::Modis, "https://modis.gsfc.nasa.gov/data");
        endpoints
    }
}
