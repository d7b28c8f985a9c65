//! Event Bus System
//!
//! The generic bus lives in `sidepanel-event-bus`; this module holds the
//! panel-specific event type and its container.

pub mod panel_bus;

pub use panel_bus::{PanelBusContainer, PanelEvent};
pub use sidepanel_event_bus::{EventBusStats, SubscriptionId};
