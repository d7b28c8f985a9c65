//! Per-window panel registry.
//!
//! The registry owns every registered [`PanelDescriptor`] of one host window,
//! builds views through their factories when a panel opens, and notifies
//! observers when it closes.
//!
//! It is confined to the UI thread: `PanelRegistry` is neither `Send` nor
//! `Sync`, and all mutation goes through `register`/`unregister`/`teardown`.

use std::cell::{Cell, RefCell};

use sidepanel_types::{PanelError, PanelIcon, PanelId};

use super::descriptor::{PanelDescriptor, RegistrationToken};
use super::view::PanelView;
use crate::core::event_bus::{PanelBusContainer, PanelEvent};

struct RegistryEntry {
    descriptor: PanelDescriptor,
    open: bool,
}

/// Read-only snapshot of a registered panel
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PanelEntryInfo {
    pub id: PanelId,
    pub title: String,
    pub icon: PanelIcon,
    pub is_open: bool,
}

/// Sole owner of the descriptors registered with one host window
pub struct PanelRegistry {
    entries: RefCell<Vec<RegistryEntry>>,
    torn_down: Cell<bool>,
    bus: PanelBusContainer,
}

impl PanelRegistry {
    /// Empty registry publishing lifecycle events on `bus`
    pub fn new(bus: PanelBusContainer) -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
            torn_down: Cell::new(false),
            bus,
        }
    }

    /// Take ownership of `descriptor`.
    ///
    /// Fails with [`PanelError::DuplicateId`] when the id is already present
    /// and with [`PanelError::UnavailableHost`] after teardown.
    pub fn register(&self, descriptor: PanelDescriptor) -> Result<(), PanelError> {
        if self.torn_down.get() {
            return Err(PanelError::UnavailableHost);
        }
        let panel_id = descriptor.id().clone();
        {
            let mut entries = self.entries.borrow_mut();
            if entries.iter().any(|entry| entry.descriptor.id() == &panel_id) {
                log::warn!("[PanelRegistry] Rejecting duplicate panel id: {}", panel_id);
                return Err(PanelError::DuplicateId(panel_id));
            }
            entries.push(RegistryEntry {
                descriptor,
                open: false,
            });
        }

        log::debug!("[PanelRegistry] Registered panel: {}", panel_id);
        self.bus.publish(PanelEvent::Registered { panel_id });
        Ok(())
    }

    /// Remove the entry for `id`. Returns `false` when nothing was registered.
    pub fn unregister(&self, id: &PanelId) -> bool {
        self.remove_where(id, |_| true)
    }

    /// Remove the entry for `id` only if it is the descriptor identified by
    /// `token`. A later registration under the same id is left in place.
    pub fn unregister_if(&self, id: &PanelId, token: RegistrationToken) -> bool {
        self.remove_where(id, |descriptor| descriptor.token() == token)
    }

    fn remove_where<P>(&self, id: &PanelId, predicate: P) -> bool
    where
        P: Fn(&PanelDescriptor) -> bool,
    {
        let removed = {
            let mut entries = self.entries.borrow_mut();
            let index = entries.iter().position(|entry| {
                entry.descriptor.id() == id && predicate(&entry.descriptor)
            });
            index.map(|index| entries.remove(index))
        };

        match removed {
            Some(entry) => {
                // Observer references go away together with the descriptor.
                drop(entry);
                log::debug!("[PanelRegistry] Unregistered panel: {}", id);
                self.bus
                    .publish(PanelEvent::Unregistered { panel_id: id.clone() });
                true
            }
            None => false,
        }
    }

    /// Snapshot of the entry registered under `id`
    pub fn get(&self, id: &PanelId) -> Option<PanelEntryInfo> {
        self.entries
            .borrow()
            .iter()
            .find(|entry| entry.descriptor.id() == id)
            .map(|entry| PanelEntryInfo {
                id: entry.descriptor.id().clone(),
                title: entry.descriptor.title().to_string(),
                icon: entry.descriptor.icon().clone(),
                is_open: entry.open,
            })
    }

    /// Whether any descriptor is registered under `id`
    pub fn contains(&self, id: &PanelId) -> bool {
        self.entries
            .borrow()
            .iter()
            .any(|entry| entry.descriptor.id() == id)
    }

    /// Whether the descriptor identified by `token` is still registered under `id`
    pub fn contains_registration(&self, id: &PanelId, token: RegistrationToken) -> bool {
        self.entries
            .borrow()
            .iter()
            .any(|entry| entry.descriptor.id() == id && entry.descriptor.token() == token)
    }

    /// Whether `id` is registered and currently open
    pub fn is_open(&self, id: &PanelId) -> bool {
        self.get(id).map(|info| info.is_open).unwrap_or(false)
    }

    /// Registered ids in registration order
    pub fn ids(&self) -> Vec<PanelId> {
        self.entries
            .borrow()
            .iter()
            .map(|entry| entry.descriptor.id().clone())
            .collect()
    }

    /// Number of registered panels
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether no panel is registered
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Number of live observers attached to `id`
    pub fn observer_count(&self, id: &PanelId) -> usize {
        self.entries
            .borrow()
            .iter()
            .find(|entry| entry.descriptor.id() == id)
            .map(|entry| entry.descriptor.observer_count())
            .unwrap_or(0)
    }

    /// Build a fresh view for `id` and mark the panel open.
    ///
    /// Opening an already open panel builds a replacement view. When the
    /// factory fails the panel stays closed and the error is returned.
    pub fn open(&self, id: &PanelId) -> Result<PanelView, PanelError> {
        if self.torn_down.get() {
            return Err(PanelError::UnavailableHost);
        }
        let factory = self
            .entries
            .borrow()
            .iter()
            .find(|entry| entry.descriptor.id() == id)
            .map(|entry| entry.descriptor.factory())
            .ok_or_else(|| PanelError::UnknownPanel(id.clone()))?;

        // No borrow is held while the factory runs.
        let view = factory().map_err(|err| {
            log::warn!("[PanelRegistry] Panel {} failed to open: {}", id, err);
            err
        })?;

        {
            let mut entries = self.entries.borrow_mut();
            let entry = entries
                .iter_mut()
                .find(|entry| entry.descriptor.id() == id)
                .ok_or_else(|| PanelError::UnknownPanel(id.clone()))?;
            entry.open = true;
        }

        log::info!("[PanelRegistry] Opened panel {} with view {}", id, view.id());
        self.bus.publish(PanelEvent::Opened {
            panel_id: id.clone(),
            view_id: view.id(),
        });
        Ok(view)
    }

    /// Mark `id` closed and notify its live observers.
    ///
    /// Observers are notified on every call, including repeated closes.
    pub fn close(&self, id: &PanelId) -> Result<(), PanelError> {
        if self.torn_down.get() {
            return Err(PanelError::UnavailableHost);
        }
        let observers = {
            let mut entries = self.entries.borrow_mut();
            let entry = entries
                .iter_mut()
                .find(|entry| entry.descriptor.id() == id)
                .ok_or_else(|| PanelError::UnknownPanel(id.clone()))?;
            entry.open = false;
            entry.descriptor.live_observers()
        };

        log::info!("[PanelRegistry] Closed panel {}", id);
        self.bus.publish(PanelEvent::Closed {
            panel_id: id.clone(),
        });
        for observer in observers {
            observer.on_panel_closed();
        }
        Ok(())
    }

    /// Unregister every entry and release every observer reference.
    ///
    /// Called when the host window goes away. Observers are not notified, and
    /// later `register`/`open`/`close` calls fail with `UnavailableHost`.
    pub fn teardown(&self) {
        if self.torn_down.replace(true) {
            return;
        }
        let entries = std::mem::take(&mut *self.entries.borrow_mut());
        let count = entries.len();
        for mut entry in entries {
            entry.descriptor.clear_observers();
            let panel_id = entry.descriptor.id().clone();
            drop(entry);
            self.bus.publish(PanelEvent::Unregistered { panel_id });
        }
        log::info!("[PanelRegistry] Torn down, released {} panel(s)", count);
    }

    /// Whether [`teardown`](Self::teardown) has run
    pub fn is_torn_down(&self) -> bool {
        self.torn_down.get()
    }
}

impl Drop for PanelRegistry {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panels::descriptor::PanelObserver;
    use sidepanel_types::{ContentContext, PanelSpec};
    use std::rc::{Rc, Weak};
    use std::sync::{Arc, Mutex};

    struct CountingObserver {
        closed: Cell<usize>,
    }

    impl CountingObserver {
        fn new() -> Rc<Self> {
            Rc::new(Self {
                closed: Cell::new(0),
            })
        }
    }

    impl PanelObserver for CountingObserver {
        fn on_panel_closed(&self) {
            self.closed.set(self.closed.get() + 1);
        }
    }

    fn descriptor(spec: &PanelSpec) -> PanelDescriptor {
        PanelDescriptor::from_spec(spec, || Ok(PanelView::new(ContentContext::default())))
    }

    fn observed(spec: &PanelSpec, observer: &Rc<CountingObserver>) -> PanelDescriptor {
        let mut descriptor = descriptor(spec);
        let weak: Weak<dyn PanelObserver> = Rc::downgrade(observer) as Weak<dyn PanelObserver>;
        descriptor.add_observer(weak);
        descriptor
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = PanelRegistry::new(PanelBusContainer::new());
        registry.register(descriptor(&PanelSpec::geointel())).unwrap();

        let info = registry.get(&PanelId::from("geointel")).unwrap();
        assert_eq!(info.title, "GeoIntel (Satellite Intelligence)");
        assert!(!info.is_open);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_register_rejected() {
        let registry = PanelRegistry::new(PanelBusContainer::new());
        registry.register(descriptor(&PanelSpec::geointel())).unwrap();

        let result = registry.register(descriptor(&PanelSpec::geointel()));

        assert_eq!(
            result,
            Err(PanelError::DuplicateId(PanelId::from("geointel")))
        );
        assert_eq!(registry.ids(), vec![PanelId::from("geointel")]);
    }

    #[test]
    fn test_unregister_absent_is_noop() {
        let registry = PanelRegistry::new(PanelBusContainer::new());
        assert!(!registry.unregister(&PanelId::from("geointel")));

        registry.register(descriptor(&PanelSpec::geointel())).unwrap();
        assert!(registry.unregister(&PanelId::from("geointel")));
        assert!(registry.is_empty());

        // Id is free again
        registry.register(descriptor(&PanelSpec::geointel())).unwrap();
    }

    #[test]
    fn test_unregister_if_only_removes_matching_registration() {
        let registry = PanelRegistry::new(PanelBusContainer::new());
        let id = PanelId::from("geointel");
        let stale = descriptor(&PanelSpec::geointel());
        let stale_token = stale.token();
        registry.register(stale).unwrap();
        registry.unregister(&id);

        let current = descriptor(&PanelSpec::geointel());
        let current_token = current.token();
        registry.register(current).unwrap();

        assert!(!registry.contains_registration(&id, stale_token));
        assert!(registry.contains_registration(&id, current_token));
        assert!(!registry.unregister_if(&id, stale_token));
        assert!(registry.contains(&id));

        assert!(registry.unregister_if(&id, current_token));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_open_unknown_panel() {
        let registry = PanelRegistry::new(PanelBusContainer::new());
        let result = registry.open(&PanelId::from("missing"));
        assert!(matches!(result, Err(PanelError::UnknownPanel(_))));
    }

    #[test]
    fn test_failed_factory_keeps_panel_closed() {
        let registry = PanelRegistry::new(PanelBusContainer::new());
        let spec = PanelSpec::geointel();
        let id = spec.id.clone();
        let factory_id = id.clone();
        registry
            .register(PanelDescriptor::from_spec(&spec, move || {
                Err(PanelError::ViewCreation {
                    id: factory_id.clone(),
                    reason: "no renderer".to_string(),
                })
            }))
            .unwrap();

        assert!(matches!(
            registry.open(&id),
            Err(PanelError::ViewCreation { .. })
        ));
        assert!(!registry.is_open(&id));
    }

    #[test]
    fn test_close_notifies_observers_every_time() {
        let registry = PanelRegistry::new(PanelBusContainer::new());
        let observer = CountingObserver::new();
        let spec = PanelSpec::geointel();
        registry.register(observed(&spec, &observer)).unwrap();

        let view = registry.open(&spec.id).unwrap();
        assert!(registry.is_open(&spec.id));
        drop(view);

        registry.close(&spec.id).unwrap();
        registry.close(&spec.id).unwrap();

        assert!(!registry.is_open(&spec.id));
        assert_eq!(observer.closed.get(), 2);
    }

    #[test]
    fn test_dropped_observer_is_tolerated() {
        let registry = PanelRegistry::new(PanelBusContainer::new());
        let observer = CountingObserver::new();
        let spec = PanelSpec::geointel();
        registry.register(observed(&spec, &observer)).unwrap();

        drop(observer);

        assert!(registry.close(&spec.id).is_ok());
        assert_eq!(registry.observer_count(&spec.id), 0);
    }

    #[test]
    fn test_teardown_releases_everything_without_notifying() {
        let bus = PanelBusContainer::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = events.clone();
        bus.subscribe(move |event| {
            events_clone.lock().unwrap().push(format!("{:?}", event));
        });

        let registry = PanelRegistry::new(bus);
        let observer = CountingObserver::new();
        registry.register(observed(&PanelSpec::geointel(), &observer)).unwrap();
        registry.register(descriptor(&PanelSpec::kenya_news())).unwrap();

        registry.teardown();
        registry.teardown();

        assert!(registry.is_empty());
        assert!(registry.is_torn_down());
        assert_eq!(observer.closed.get(), 0);
        assert_eq!(Rc::weak_count(&observer), 0);
        assert_eq!(
            registry.close(&PanelId::from("geointel")),
            Err(PanelError::UnavailableHost)
        );
        assert_eq!(
            registry.register(descriptor(&PanelSpec::geointel())),
            Err(PanelError::UnavailableHost)
        );

        let events = events.lock().unwrap();
        let unregistered = events
            .iter()
            .filter(|e| e.starts_with("Unregistered"))
            .count();
        assert_eq!(unregistered, 2);
    }

    #[test]
    fn test_lifecycle_events_published() {
        let bus = PanelBusContainer::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = events.clone();
        bus.subscribe(move |event| {
            let name = match event {
                PanelEvent::Registered { .. } => "registered",
                PanelEvent::Unregistered { .. } => "unregistered",
                PanelEvent::Opened { .. } => "opened",
                PanelEvent::Closed { .. } => "closed",
                _ => "other",
            };
            events_clone.lock().unwrap().push(name);
        });

        let registry = PanelRegistry::new(bus);
        let id = PanelId::from("geointel");
        registry.register(descriptor(&PanelSpec::geointel())).unwrap();
        let _view = registry.open(&id).unwrap();
        registry.close(&id).unwrap();
        registry.unregister(&id);

        assert_eq!(
            *events.lock().unwrap(),
            vec!["registered", "opened", "closed", "unregistered"]
        );
    }
}
