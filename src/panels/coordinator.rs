//! Generic panel coordinator.
//!
//! One coordinator exists per panel type per window. It turns a static
//! [`PanelSpec`] into a registered descriptor, builds the panel's view on
//! demand, and reacts to the panel closing by cancelling its in-flight domain
//! work.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use sidepanel_services::{AreaOfInterest, DataSource, DomainService};
use sidepanel_types::{PanelError, PanelId, PanelSpec, ResourceLocator};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use uuid::Uuid;

use super::descriptor::{PanelDescriptor, PanelObserver, RegistrationToken};
use super::registry::PanelRegistry;
use super::view::PanelView;
use super::window::HostWindow;
use crate::core::event_bus::PanelEvent;

/// Identifies one dispatched domain request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Domain service plus the runtime its calls are spawned on
#[derive(Clone)]
pub struct DomainBinding {
    service: Arc<dyn DomainService>,
    runtime: Handle,
}

impl DomainBinding {
    /// Spawn `service` calls on `runtime`
    pub fn new(service: Arc<dyn DomainService>, runtime: Handle) -> Self {
        Self { service, runtime }
    }

    /// Bind to the runtime of the calling context, if there is one
    pub fn current(service: Arc<dyn DomainService>) -> Option<Self> {
        Handle::try_current()
            .ok()
            .map(|runtime| Self::new(service, runtime))
    }
}

struct Registration {
    registry: Weak<PanelRegistry>,
    id: PanelId,
    token: RegistrationToken,
}

impl Registration {
    /// Remove this coordinator's own descriptor, leaving any later
    /// registration under the same id untouched
    fn release(&self) -> bool {
        self.registry
            .upgrade()
            .map(|registry| registry.unregister_if(&self.id, self.token))
            .unwrap_or(false)
    }
}

/// Connects one panel type to one host window's registry
pub struct PanelCoordinator {
    window: Weak<HostWindow>,
    spec: PanelSpec,
    locator: ResourceLocator,
    registration: RefCell<Option<Registration>>,
    domain: Option<DomainBinding>,
    cancel: RefCell<CancellationToken>,
    tracker: TaskTracker,
    views_created: Cell<usize>,
}

impl PanelCoordinator {
    /// Start building a coordinator for `spec`
    pub fn builder(spec: PanelSpec) -> PanelCoordinatorBuilder {
        PanelCoordinatorBuilder::new(spec)
    }

    /// The static panel description this coordinator was built from
    pub fn spec(&self) -> &PanelSpec {
        &self.spec
    }

    /// Panel id, shared by every window's coordinator for this panel type
    pub fn id(&self) -> &PanelId {
        &self.spec.id
    }

    /// Locator every view of this panel navigates to
    pub fn resource_locator(&self) -> &ResourceLocator {
        &self.locator
    }

    /// Number of views built by [`create_view`](Self::create_view) so far
    pub fn views_created(&self) -> usize {
        self.views_created.get()
    }

    /// Whether domain requests can be dispatched from this panel
    pub fn has_domain_service(&self) -> bool {
        self.domain.is_some()
    }

    /// Whether this coordinator's own descriptor is currently held by a live
    /// registry. Another descriptor registered under the same id does not count.
    pub fn is_registered(&self) -> bool {
        self.registration
            .borrow()
            .as_ref()
            .and_then(|registration| {
                registration.registry.upgrade().map(|registry| {
                    registry.contains_registration(&registration.id, registration.token)
                })
            })
            .unwrap_or(false)
    }

    /// Build the descriptor and hand it to the host window's registry.
    ///
    /// Calling this again before [`unregister_from_host`](Self::unregister_from_host)
    /// fails with [`PanelError::DuplicateId`].
    pub fn register_with_host(self: &Rc<Self>) -> Result<(), PanelError> {
        let window = self.window.upgrade().ok_or(PanelError::UnavailableHost)?;
        let registry = window.registry().ok_or(PanelError::UnavailableHost)?;

        if self.is_registered() {
            log::warn!(
                "[PanelCoordinator] Panel {} is already registered with this window",
                self.spec.id
            );
            return Err(PanelError::DuplicateId(self.spec.id.clone()));
        }

        let this = Rc::downgrade(self);
        let mut descriptor = PanelDescriptor::from_spec(&self.spec, move || {
            this.upgrade()
                .ok_or(PanelError::UnavailableHost)?
                .create_view()
        });
        let observer: Weak<dyn PanelObserver> = Rc::downgrade(self) as Weak<dyn PanelObserver>;
        descriptor.add_observer(observer);
        let token = descriptor.token();

        registry.register(descriptor)?;
        *self.registration.borrow_mut() = Some(Registration {
            registry: Rc::downgrade(&registry),
            id: self.spec.id.clone(),
            token,
        });

        log::info!(
            "[PanelCoordinator] Registered panel {} ({}) at {}",
            self.spec.id,
            self.spec.title,
            self.locator
        );
        Ok(())
    }

    /// Remove the descriptor from the registry and cancel pending work.
    /// No-op when not registered.
    pub fn unregister_from_host(&self) {
        let Some(registration) = self.registration.borrow_mut().take() else {
            return;
        };
        self.cancel_pending();
        if registration.release() {
            log::info!("[PanelCoordinator] Unregistered panel {}", registration.id);
        } else {
            log::debug!(
                "[PanelCoordinator] Panel {} was no longer registered by this coordinator",
                registration.id
            );
        }
    }

    /// View factory: a brand-new view bound to the window's content context,
    /// already navigating to this panel's locator.
    pub fn create_view(&self) -> Result<PanelView, PanelError> {
        let window = self.window.upgrade().ok_or(PanelError::UnavailableHost)?;
        if window.is_destroyed() {
            return Err(PanelError::UnavailableHost);
        }

        let mut view = PanelView::new(window.content_context().clone());
        view.load_url(self.locator.clone());
        self.views_created.set(self.views_created.get() + 1);

        log::debug!(
            "[PanelCoordinator] Created view {} for panel {}",
            view.id(),
            self.spec.id
        );
        Ok(view)
    }

    /// Cancel every outstanding domain request. Returns how many were in flight.
    pub fn cancel_pending(&self) -> usize {
        let pending = self.tracker.len();
        let previous = self.cancel.replace(CancellationToken::new());
        previous.cancel();
        if pending > 0 {
            log::debug!(
                "[PanelCoordinator] Cancelled {} pending request(s) for panel {}",
                pending,
                self.spec.id
            );
        }
        pending
    }

    /// Domain requests spawned and not yet finished or cancelled
    pub fn pending_requests(&self) -> usize {
        self.tracker.len()
    }

    /// Fetch from `source` in the background. The outcome arrives on the
    /// window's panel bus as [`PanelEvent::FetchCompleted`].
    pub fn request_fetch(&self, source: DataSource) -> Result<RequestId, PanelError> {
        log::info!(
            "[PanelCoordinator] Panel {} requesting data from {}",
            self.spec.id,
            source
        );
        self.dispatch(move |service, panel_id, request_id| async move {
            let result = service.fetch(source).await;
            PanelEvent::FetchCompleted {
                panel_id,
                request_id,
                source,
                result,
            }
        })
    }

    /// Analyse `area` in the background. The outcome arrives on the window's
    /// panel bus as [`PanelEvent::AnalysisCompleted`].
    pub fn request_analysis(&self, area: AreaOfInterest) -> Result<RequestId, PanelError> {
        log::info!(
            "[PanelCoordinator] Panel {} requesting analysis {:?}",
            self.spec.id,
            area.analyses
        );
        self.dispatch(move |service, panel_id, request_id| async move {
            let result = service.analyze(area).await;
            PanelEvent::AnalysisCompleted {
                panel_id,
                request_id,
                result,
            }
        })
    }

    fn dispatch<F, Fut>(&self, work: F) -> Result<RequestId, PanelError>
    where
        F: FnOnce(Arc<dyn DomainService>, PanelId, RequestId) -> Fut,
        Fut: Future<Output = PanelEvent> + Send + 'static,
    {
        let domain = self
            .domain
            .as_ref()
            .ok_or_else(|| PanelError::ServiceUnavailable(self.spec.id.clone()))?;
        let window = self.window.upgrade().ok_or(PanelError::UnavailableHost)?;
        if window.is_destroyed() {
            return Err(PanelError::UnavailableHost);
        }

        let bus = window.panel_bus().clone();
        let token = self.cancel.borrow().child_token();
        let request_id = RequestId::new();
        let panel_id = self.spec.id.clone();
        let future = work(domain.service.clone(), panel_id.clone(), request_id);

        self.tracker.spawn_on(
            async move {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        log::debug!(
                            "[PanelCoordinator] Request {} for panel {} cancelled",
                            request_id,
                            panel_id
                        );
                    }
                    event = future => bus.publish(event),
                }
            },
            &domain.runtime,
        );
        Ok(request_id)
    }
}

impl PanelObserver for PanelCoordinator {
    fn on_panel_closed(&self) {
        let cancelled = self.cancel_pending();
        log::info!(
            "[PanelCoordinator] {} panel closed ({} request(s) cancelled)",
            self.spec.title,
            cancelled
        );
    }
}

impl Drop for PanelCoordinator {
    fn drop(&mut self) {
        self.cancel.get_mut().cancel();
        if let Some(registration) = self.registration.get_mut().take() {
            registration.release();
        }
    }
}

/// Builds a [`PanelCoordinator`] from a [`PanelSpec`]
pub struct PanelCoordinatorBuilder {
    spec: PanelSpec,
    domain: Option<DomainBinding>,
}

impl PanelCoordinatorBuilder {
    /// Builder without a domain service
    pub fn new(spec: PanelSpec) -> Self {
        Self { spec, domain: None }
    }

    /// Route this panel's domain requests through `binding`
    pub fn domain_service(mut self, binding: DomainBinding) -> Self {
        self.domain = Some(binding);
        self
    }

    /// Validate the spec and create the coordinator for `window`
    pub fn build(self, window: &Rc<HostWindow>) -> Result<Rc<PanelCoordinator>, PanelError> {
        self.spec.validate()?;
        let locator = self.spec.resource_locator()?;

        Ok(Rc::new(PanelCoordinator {
            window: Rc::downgrade(window),
            spec: self.spec,
            locator,
            registration: RefCell::new(None),
            domain: self.domain,
            cancel: RefCell::new(CancellationToken::new()),
            tracker: TaskTracker::new(),
            views_created: Cell::new(0),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sidepanel_services::{
        AnalysisError, AnalysisKind, AnalysisReport, FetchError, GeoBounds, LoggingDomainService,
        SatelliteData,
    };
    use sidepanel_types::ContentContext;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Never finishes; lets tests observe cancellation.
    struct StalledService;

    #[async_trait]
    impl DomainService for StalledService {
        async fn fetch(&self, _source: DataSource) -> Result<SatelliteData, FetchError> {
            std::future::pending().await
        }

        async fn analyze(&self, _area: AreaOfInterest) -> Result<AnalysisReport, AnalysisError> {
            std::future::pending().await
        }
    }

    fn window() -> Rc<HostWindow> {
        HostWindow::new(ContentContext::new("test-profile"))
    }

    fn geointel(window: &Rc<HostWindow>) -> Rc<PanelCoordinator> {
        PanelCoordinator::builder(PanelSpec::geointel())
            .build(window)
            .unwrap()
    }

    fn recorded_events(window: &Rc<HostWindow>) -> Arc<Mutex<Vec<PanelEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = events.clone();
        window.panel_bus().subscribe(move |event| {
            events_clone.lock().unwrap().push(event.clone());
        });
        events
    }

    async fn wait_idle(coordinator: &PanelCoordinator) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while coordinator.pending_requests() > 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("requests did not settle");
    }

    #[test]
    fn test_register_places_descriptor_in_registry() {
        let window = window();
        let coordinator = geointel(&window);

        coordinator.register_with_host().unwrap();

        let registry = window.registry().unwrap();
        let info = registry.get(&PanelId::from("geointel")).unwrap();
        assert_eq!(info.title, "GeoIntel (Satellite Intelligence)");
        assert_eq!(registry.observer_count(&PanelId::from("geointel")), 1);
        assert!(coordinator.is_registered());
    }

    #[test]
    fn test_register_twice_is_duplicate() {
        let window = window();
        let coordinator = geointel(&window);
        coordinator.register_with_host().unwrap();

        let result = coordinator.register_with_host();

        assert_eq!(
            result,
            Err(PanelError::DuplicateId(PanelId::from("geointel")))
        );
        assert_eq!(window.registry().unwrap().len(), 1);
    }

    #[test]
    fn test_second_coordinator_with_same_id_is_duplicate() {
        let window = window();
        let first = geointel(&window);
        let second = geointel(&window);
        first.register_with_host().unwrap();

        let result = second.register_with_host();

        assert!(matches!(result, Err(PanelError::DuplicateId(_))));
        assert!(!second.is_registered());
        assert!(first.is_registered());
    }

    #[test]
    fn test_unregister_then_register_again() {
        let window = window();
        let coordinator = geointel(&window);
        coordinator.register_with_host().unwrap();

        coordinator.unregister_from_host();
        coordinator.unregister_from_host();
        assert!(!coordinator.is_registered());
        assert!(window.registry().unwrap().is_empty());

        coordinator.register_with_host().unwrap();
        assert!(coordinator.is_registered());
    }

    #[test]
    fn test_stale_coordinator_leaves_newer_registration_alone() {
        let window = window();
        let registry = window.registry().unwrap();
        let id = PanelId::from("geointel");
        let stale = geointel(&window);
        stale.register_with_host().unwrap();

        // Host removes the entry behind the coordinator's back
        assert!(registry.unregister(&id));
        let current = geointel(&window);
        current.register_with_host().unwrap();

        assert!(!stale.is_registered());
        assert!(current.is_registered());
        assert_eq!(
            stale.register_with_host(),
            Err(PanelError::DuplicateId(id.clone()))
        );

        stale.unregister_from_host();
        assert!(registry.contains(&id));
        assert!(current.is_registered());

        drop(stale);
        assert!(registry.contains(&id));
        assert!(current.is_registered());
        assert_eq!(registry.observer_count(&id), 1);
    }

    #[test]
    fn test_register_without_window_is_unavailable_host() {
        let window = window();
        let coordinator = geointel(&window);
        drop(window);

        assert_eq!(
            coordinator.register_with_host(),
            Err(PanelError::UnavailableHost)
        );
        assert!(matches!(
            coordinator.create_view(),
            Err(PanelError::UnavailableHost)
        ));
    }

    #[test]
    fn test_register_after_destroy_is_unavailable_host() {
        let window = window();
        let coordinator = geointel(&window);
        window.destroy();

        assert_eq!(
            coordinator.register_with_host(),
            Err(PanelError::UnavailableHost)
        );
    }

    #[test]
    fn test_create_view_returns_fresh_views_loading_locator() {
        let window = window();
        let coordinator = geointel(&window);

        let mut seen = HashSet::new();
        for _ in 0..3 {
            let view = coordinator.create_view().unwrap();
            assert_eq!(view.url().unwrap().to_string(), "panel://geointel");
            assert_eq!(view.context().profile, "test-profile");
            assert!(seen.insert(view.id()));
        }
        assert_eq!(coordinator.views_created(), 3);
    }

    #[test]
    fn test_on_panel_closed_is_idempotent() {
        let window = window();
        let coordinator = geointel(&window);

        // Never opened, never registered
        coordinator.on_panel_closed();
        coordinator.on_panel_closed();

        coordinator.register_with_host().unwrap();
        for _ in 0..5 {
            coordinator.on_panel_closed();
        }
        assert!(coordinator.is_registered());
    }

    #[test]
    fn test_dropping_coordinator_unregisters() {
        let window = window();
        let coordinator = geointel(&window);
        coordinator.register_with_host().unwrap();

        drop(coordinator);

        assert!(window.registry().unwrap().is_empty());
    }

    #[test]
    fn test_builder_rejects_invalid_spec() {
        let window = window();
        let mut spec = PanelSpec::geointel();
        spec.resource_name = "not valid".to_string();

        let result = PanelCoordinator::builder(spec).build(&window);

        assert!(matches!(result, Err(PanelError::InvalidResource(_))));
    }

    #[test]
    fn test_request_without_service() {
        let window = window();
        let coordinator = geointel(&window);

        let result = coordinator.request_fetch(DataSource::Sentinel2);

        assert_eq!(
            result,
            Err(PanelError::ServiceUnavailable(PanelId::from("geointel")))
        );
    }

    #[tokio::test]
    async fn test_fetch_result_published_on_bus() {
        let window = window();
        let events = recorded_events(&window);
        let binding = DomainBinding::current(Arc::new(LoggingDomainService::default())).unwrap();
        let coordinator = PanelCoordinator::builder(PanelSpec::geointel())
            .domain_service(binding)
            .build(&window)
            .unwrap();

        let request_id = coordinator.request_fetch(DataSource::Landsat8).unwrap();
        wait_idle(&coordinator).await;

        let events = events.lock().unwrap();
        let completed = events
            .iter()
            .find_map(|event| match event {
                PanelEvent::FetchCompleted {
                    request_id: id,
                    source,
                    result,
                    ..
                } if *id == request_id => Some((*source, result.clone())),
                _ => None,
            })
            .expect("fetch result missing");
        assert_eq!(completed.0, DataSource::Landsat8);
        assert!(completed.1.is_ok());
    }

    #[tokio::test]
    async fn test_analysis_error_reaches_presentation() {
        let window = window();
        let events = recorded_events(&window);
        let binding = DomainBinding::current(Arc::new(LoggingDomainService::default())).unwrap();
        let coordinator = PanelCoordinator::builder(PanelSpec::geointel())
            .domain_service(binding)
            .build(&window)
            .unwrap();
        let bad_area = AreaOfInterest::new(GeoBounds::new(-1.0, 1.0, 37.0, 36.0))
            .with_analysis(AnalysisKind::Ndvi);

        coordinator.request_analysis(bad_area).unwrap();
        wait_idle(&coordinator).await;

        let events = events.lock().unwrap();
        assert!(events.iter().any(|event| matches!(
            event,
            PanelEvent::AnalysisCompleted {
                result: Err(AnalysisError::InvalidArea(_)),
                ..
            }
        )));
    }

    #[tokio::test]
    async fn test_close_cancels_in_flight_requests() {
        let window = window();
        let events = recorded_events(&window);
        let binding = DomainBinding::current(Arc::new(StalledService)).unwrap();
        let coordinator = PanelCoordinator::builder(PanelSpec::geointel())
            .domain_service(binding)
            .build(&window)
            .unwrap();
        coordinator.register_with_host().unwrap();

        coordinator.request_fetch(DataSource::Sentinel2).unwrap();
        coordinator
            .request_analysis(
                AreaOfInterest::new(GeoBounds::new(1.0, -1.0, 37.0, 36.0))
                    .with_analysis(AnalysisKind::ChangeDetection),
            )
            .unwrap();
        assert_eq!(coordinator.pending_requests(), 2);

        window
            .registry()
            .unwrap()
            .close(&PanelId::from("geointel"))
            .unwrap();
        wait_idle(&coordinator).await;

        let events = events.lock().unwrap();
        assert!(!events.iter().any(|event| matches!(
            event,
            PanelEvent::FetchCompleted { .. } | PanelEvent::AnalysisCompleted { .. }
        )));
    }

    #[tokio::test]
    async fn test_requests_work_again_after_close() {
        let window = window();
        let events = recorded_events(&window);
        let binding = DomainBinding::current(Arc::new(LoggingDomainService::default())).unwrap();
        let coordinator = PanelCoordinator::builder(PanelSpec::geointel())
            .domain_service(binding)
            .build(&window)
            .unwrap();

        coordinator.on_panel_closed();
        coordinator.request_fetch(DataSource::Modis).unwrap();
        wait_idle(&coordinator).await;

        let events = events.lock().unwrap();
        assert!(events
            .iter()
            .any(|event| matches!(event, PanelEvent::FetchCompleted { .. })));
    }
}
