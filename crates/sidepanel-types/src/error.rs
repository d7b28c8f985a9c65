use thiserror::Error;

use crate::PanelId;

/// Errors raised by panel registration and view creation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PanelError {
    /// The registry already holds an entry for this id in the window scope.
    #[error("panel '{0}' is already registered in this window")]
    DuplicateId(PanelId),
    /// The host window or its registry is gone.
    #[error("host window is unavailable")]
    UnavailableHost,
    #[error("panel '{0}' is not registered")]
    UnknownPanel(PanelId),
    #[error("invalid resource locator: {0}")]
    InvalidResource(String),
    #[error("invalid panel spec: {0}")]
    InvalidSpec(String),
    /// The factory could not produce a view; the panel must not appear.
    #[error("failed to create view for panel '{id}': {reason}")]
    ViewCreation { id: PanelId, reason: String },
    /// The panel has no domain service bound to it.
    #[error("panel '{0}' has no domain service")]
    ServiceUnavailable(PanelId),
}
