//! Domain services a panel can dispatch work to.
//!
//! The host only depends on the [`DomainService`] capability; real satellite
//! providers plug in behind it. [`LoggingDomainService`] is the built-in stub
//! that records what would have been requested and does no network I/O.

mod area;
mod error;
mod service;
mod source;

pub use area::{AnalysisKind, AreaOfInterest, GeoBounds};
pub use error::{AnalysisError, FetchError};
pub use service::{AnalysisReport, DomainService, Finding, LoggingDomainService, SatelliteData};
pub use source::{DataSource, SourceEndpoints};
