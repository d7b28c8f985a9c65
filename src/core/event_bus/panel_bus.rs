//! Panel Event Bus
//!
//! Per-window bus carrying panel lifecycle events and the results of domain
//! requests. It is thread-safe so background tasks can publish into it.

use sidepanel_event_bus::{EventBusContainer, EventBusStats, SubscriptionId};
use sidepanel_services::{AnalysisError, AnalysisReport, DataSource, FetchError, SatelliteData};
use sidepanel_types::PanelId;

use crate::panels::{RequestId, ViewId};

#[derive(Clone, Debug)]
pub enum PanelEvent {
    /// A descriptor was added to the window registry
    Registered { panel_id: PanelId },
    /// A descriptor was removed, either explicitly or by window teardown
    Unregistered { panel_id: PanelId },
    Opened { panel_id: PanelId, view_id: ViewId },
    Closed { panel_id: PanelId },
    FetchCompleted {
        panel_id: PanelId,
        request_id: RequestId,
        source: DataSource,
        result: Result<SatelliteData, FetchError>,
    },
    AnalysisCompleted {
        panel_id: PanelId,
        request_id: RequestId,
        result: Result<AnalysisReport, AnalysisError>,
    },
}

impl PanelEvent {
    /// Panel the event belongs to
    pub fn panel_id(&self) -> &PanelId {
        match self {
            PanelEvent::Registered { panel_id }
            | PanelEvent::Unregistered { panel_id }
            | PanelEvent::Opened { panel_id, .. }
            | PanelEvent::Closed { panel_id }
            | PanelEvent::FetchCompleted { panel_id, .. }
            | PanelEvent::AnalysisCompleted { panel_id, .. } => panel_id,
        }
    }
}

/// Specialized container for panel events
#[derive(Clone)]
pub struct PanelBusContainer {
    inner: EventBusContainer<PanelEvent>,
}

impl PanelBusContainer {
    /// Bus with no subscribers
    pub fn new() -> Self {
        Self {
            inner: EventBusContainer::new(),
        }
    }

    /// Subscribe to all panel events
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&PanelEvent) + Send + Sync + 'static,
    {
        self.inner.subscribe(move |event| {
            callback(event);
            true
        })
    }

    /// Subscribe to events of one panel only
    pub fn subscribe_panel<F>(&self, panel_id: PanelId, callback: F) -> SubscriptionId
    where
        F: Fn(&PanelEvent) + Send + Sync + 'static,
    {
        self.inner.subscribe_with_filter(
            move |event| {
                callback(event);
                true
            },
            move |event| event.panel_id() == &panel_id,
        )
    }

    /// Subscribe to a single event (one-shot)
    pub fn subscribe_once<F>(&self, callback: F) -> SubscriptionId
    where
        F: FnOnce(&PanelEvent) + Send + Sync + 'static,
    {
        self.inner.subscribe_once(callback)
    }

    /// Remove a subscription; `false` if it was already gone
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.unsubscribe(id)
    }

    /// Deliver `event` to every matching subscriber
    pub fn publish(&self, event: PanelEvent) {
        log::trace!("[PanelBus] Publishing event for panel: {}", event.panel_id());
        self.inner.publish(event);
    }

    /// Number of active subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscriber_count()
    }

    /// Delivery counters since creation
    pub fn stats(&self) -> EventBusStats {
        self.inner.stats()
    }

    /// Drop every subscription
    pub fn clear(&self) {
        self.inner.clear();
    }
}

impl Default for PanelBusContainer {
    fn default() -> Self {
        Self::new()
    }
}
