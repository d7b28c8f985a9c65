//! Host windows and the panels installed into them.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use sidepanel_types::{ContentContext, PanelError, PanelId};
use uuid::Uuid;

use super::coordinator::{DomainBinding, PanelCoordinator};
use super::registry::PanelRegistry;
use crate::core::config::PanelConfig;
use crate::core::event_bus::PanelBusContainer;

/// Unique id of one host window
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WindowId(Uuid);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of [`HostWindow::install_panels`]
#[derive(Default)]
pub struct InstalledPanels {
    /// Coordinators now registered with the window, in config order
    pub coordinators: Vec<Rc<PanelCoordinator>>,
    /// Panels that could not be installed, with the reason
    pub failed: Vec<(PanelId, PanelError)>,
}

impl InstalledPanels {
    /// Number of panels installed
    pub fn len(&self) -> usize {
        self.coordinators.len()
    }

    /// Whether no panel was installed
    pub fn is_empty(&self) -> bool {
        self.coordinators.is_empty()
    }
}

/// A browser window hosting a side panel area.
///
/// Owns the window's [`PanelRegistry`] and the coordinators installed through
/// [`HostWindow::install_panels`]. Coordinators only keep a weak reference
/// back to the window.
pub struct HostWindow {
    id: WindowId,
    context: ContentContext,
    bus: PanelBusContainer,
    registry: RefCell<Option<Rc<PanelRegistry>>>,
    coordinators: RefCell<Vec<Rc<PanelCoordinator>>>,
}

impl HostWindow {
    /// Open a window rendering panels in `context`, with an empty registry
    pub fn new(context: ContentContext) -> Rc<Self> {
        let bus = PanelBusContainer::new();
        let window = Rc::new(Self {
            id: WindowId(Uuid::new_v4()),
            context,
            registry: RefCell::new(Some(Rc::new(PanelRegistry::new(bus.clone())))),
            bus,
            coordinators: RefCell::new(Vec::new()),
        });
        log::debug!(
            "[HostWindow] Created window {} for profile {}",
            window.id,
            window.context.profile
        );
        window
    }

    /// Id of this window
    pub fn id(&self) -> WindowId {
        self.id
    }

    /// Browsing profile every panel view in this window renders in
    pub fn content_context(&self) -> &ContentContext {
        &self.context
    }

    /// Bus carrying this window's panel lifecycle events and domain results
    pub fn panel_bus(&self) -> &PanelBusContainer {
        &self.bus
    }

    /// The window's registry, or `None` once the window is destroyed
    pub fn registry(&self) -> Option<Rc<PanelRegistry>> {
        self.registry.borrow().clone()
    }

    /// Whether [`destroy`](Self::destroy) has run
    pub fn is_destroyed(&self) -> bool {
        self.registry.borrow().is_none()
    }

    /// Create and register one coordinator per enabled panel entry.
    ///
    /// A panel that fails to build or register does not stop the others; its
    /// id and error are returned in [`InstalledPanels::failed`].
    pub fn install_panels(
        self: &Rc<Self>,
        panels: &[PanelConfig],
        domain: Option<&DomainBinding>,
    ) -> InstalledPanels {
        let mut installed = InstalledPanels::default();
        for panel in panels.iter().filter(|panel| panel.enabled) {
            let mut builder = PanelCoordinator::builder(panel.spec.clone());
            if panel.domain_service {
                match domain {
                    Some(binding) => builder = builder.domain_service(binding.clone()),
                    None => log::warn!(
                        "[HostWindow] Panel {} wants a domain service but none is available",
                        panel.spec.id
                    ),
                }
            }

            let registered = builder.build(self).and_then(|coordinator| {
                coordinator.register_with_host()?;
                Ok(coordinator)
            });
            match registered {
                Ok(coordinator) => {
                    self.coordinators.borrow_mut().push(coordinator.clone());
                    installed.coordinators.push(coordinator);
                }
                Err(e) => {
                    log::error!("[HostWindow] Failed to install panel {}: {}", panel.spec.id, e);
                    installed.failed.push((panel.spec.id.clone(), e));
                }
            }
        }
        log::info!(
            "[HostWindow] Installed {} of {} panel(s) in window {}",
            installed.coordinators.len(),
            panels.len(),
            self.id
        );
        installed
    }

    /// Coordinator installed for `id`, if any
    pub fn coordinator(&self, id: &PanelId) -> Option<Rc<PanelCoordinator>> {
        self.coordinators
            .borrow()
            .iter()
            .find(|coordinator| coordinator.id() == id)
            .cloned()
    }

    /// Tear down the registry and release owned coordinators. Idempotent.
    pub fn destroy(&self) {
        let Some(registry) = self.registry.borrow_mut().take() else {
            return;
        };
        registry.teardown();

        let coordinators = std::mem::take(&mut *self.coordinators.borrow_mut());
        for coordinator in &coordinators {
            coordinator.cancel_pending();
        }
        drop(coordinators);

        log::info!("[HostWindow] Destroyed window {}", self.id);
    }
}

impl Drop for HostWindow {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sidepanel_types::PanelSpec;

    fn panel(spec: PanelSpec) -> PanelConfig {
        PanelConfig {
            spec,
            domain_service: false,
            enabled: true,
        }
    }

    #[test]
    fn test_install_panels_registers_each_spec() {
        let window = HostWindow::new(ContentContext::default());

        let installed = window.install_panels(
            &[panel(PanelSpec::geointel()), panel(PanelSpec::kenya_news())],
            None,
        );

        assert_eq!(installed.len(), 2);
        let registry = window.registry().unwrap();
        assert_eq!(
            registry.ids(),
            vec![PanelId::from("geointel"), PanelId::from("kenya-news")]
        );
        assert!(window.coordinator(&PanelId::from("kenya-news")).is_some());
    }

    #[test]
    fn test_install_skips_duplicates_and_disabled() {
        let window = HostWindow::new(ContentContext::default());
        let mut disabled = panel(PanelSpec::kenya_news());
        disabled.enabled = false;

        let installed = window.install_panels(
            &[
                panel(PanelSpec::geointel()),
                panel(PanelSpec::geointel()),
                disabled,
            ],
            None,
        );

        assert_eq!(installed.len(), 1);
        assert_eq!(window.registry().unwrap().len(), 1);
        assert_eq!(
            installed.failed,
            vec![(
                PanelId::from("geointel"),
                PanelError::DuplicateId(PanelId::from("geointel"))
            )]
        );
    }

    #[test]
    fn test_install_reports_invalid_panels() {
        let window = HostWindow::new(ContentContext::default());
        let mut broken = PanelSpec::kenya_news();
        broken.resource_name = "Kenya News".to_string();

        let installed =
            window.install_panels(&[panel(broken), panel(PanelSpec::geointel())], None);

        assert_eq!(installed.len(), 1);
        assert_eq!(installed.failed.len(), 1);
        let (id, error) = &installed.failed[0];
        assert_eq!(id.as_str(), "kenya-news");
        assert!(matches!(error, PanelError::InvalidResource(_)));
        assert!(window.coordinator(&PanelId::from("kenya-news")).is_none());
    }

    #[test]
    fn test_destroy_clears_registry_and_stops_notifications() {
        let window = HostWindow::new(ContentContext::default());
        let installed = window.install_panels(&[panel(PanelSpec::geointel())], None);
        let coordinator = installed.coordinators[0].clone();
        let registry = window.registry().unwrap();

        window.destroy();
        window.destroy();

        assert!(window.is_destroyed());
        assert!(window.registry().is_none());
        assert!(registry.is_empty());
        assert!(!coordinator.is_registered());
        assert_eq!(
            registry.close(&PanelId::from("geointel")),
            Err(PanelError::UnavailableHost)
        );
        assert!(matches!(
            coordinator.create_view(),
            Err(PanelError::UnavailableHost)
        ));
    }
}
