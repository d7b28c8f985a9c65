//! Side panel host.
//!
//! A [`HostWindow`] owns a [`PanelRegistry`]; one [`PanelCoordinator`] per
//! configured panel registers a descriptor there, builds views on demand and
//! forwards domain requests to a [`sidepanel_services::DomainService`].
//! Everything under [`panels`] is single-threaded and stays on the UI thread.

pub mod assets;
pub mod core;
pub mod panels;

pub use assets::{Assets, get_default_config};
pub use crate::core::config::{Config, PanelConfig};
pub use crate::core::event_bus::{PanelBusContainer, PanelEvent};
pub use crate::core::prefs::{PrefRegistry, register_browser_prefs};
pub use panels::{
    DomainBinding, HostWindow, PanelCoordinator, PanelDescriptor, PanelObserver, PanelRegistry,
    PanelView,
};
