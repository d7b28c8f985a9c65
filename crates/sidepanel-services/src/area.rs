use serde::{Deserialize, Serialize};

use crate::AnalysisError;

/// Geographic bounding box in decimal degrees
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl GeoBounds {
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        let values = [self.north, self.south, self.east, self.west];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(AnalysisError::InvalidArea(
                "bounds must be finite numbers".to_string(),
            ));
        }
        for (label, lat) in [("north", self.north), ("south", self.south)] {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(AnalysisError::InvalidArea(format!(
                    "{} latitude {} is outside [-90, 90]",
                    label, lat
                )));
            }
        }
        for (label, lon) in [("east", self.east), ("west", self.west)] {
            if !(-180.0..=180.0).contains(&lon) {
                return Err(AnalysisError::InvalidArea(format!(
                    "{} longitude {} is outside [-180, 180]",
                    label, lon
                )));
            }
        }
        if self.north <= self.south {
            return Err(AnalysisError::InvalidArea(format!(
                "north {} must be greater than south {}",
                self.north, self.south
            )));
        }
        if self.east == self.west {
            return Err(AnalysisError::InvalidArea(
                "east and west longitudes are equal".to_string(),
            ));
        }
        Ok(())
    }
}

/// Geospatial computations an analysis can run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisKind {
    /// Vegetation health, (NIR - Red) / (NIR + Red)
    Ndvi,
    ChangeDetection,
    Infrastructure,
    WaterBodies,
    UrbanExpansion,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AreaOfInterest {
    pub bounds: GeoBounds,
    #[serde(default)]
    pub analyses: Vec<AnalysisKind>,
}

impl AreaOfInterest {
    pub fn new(bounds: GeoBounds) -> Self {
        Self {
            bounds,
            analyses: Vec::new(),
        }
    }

    pub fn with_analysis(mut self, kind: AnalysisKind) -> Self {
        if !self.analyses.contains(&kind) {
            self.analyses.push(kind);
        }
        self
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        self.bounds.validate()?;
        if self.analyses.is_empty() {
            return Err(AnalysisError::Unsupported(
                "no analysis requested for area".to_string(),
            ));
        }
        Ok(())
    }
}
