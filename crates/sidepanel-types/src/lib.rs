//! Shared data types for the side panel host.

mod error;
mod locator;
mod panel;

pub use error::PanelError;
pub use locator::{RESOURCE_SCHEME, ResourceLocator};
pub use panel::{ContentContext, DEFAULT_ICON_SIZE, PanelIcon, PanelId, PanelSpec};
