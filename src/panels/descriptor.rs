//! Panel descriptors and the observer capability registered with them.

use std::fmt;
use std::rc::{Rc, Weak};

use sidepanel_types::{PanelError, PanelIcon, PanelId, PanelSpec};
use uuid::Uuid;

use super::view::PanelView;

/// Callback that builds a fresh view each time the panel opens
pub type PanelViewFactory = Rc<dyn Fn() -> Result<PanelView, PanelError>>;

/// Identifies one descriptor instance, independent of its panel id.
///
/// Two descriptors built for the same id carry different tokens, so a holder
/// can tell its own registration apart from a later one under that id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RegistrationToken(Uuid);

impl RegistrationToken {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RegistrationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Receives panel lifecycle notifications from the registry.
///
/// Implementations must tolerate repeated calls and must not assume a view
/// from an earlier open still exists.
pub trait PanelObserver {
    fn on_panel_closed(&self);
}

/// Identity, presentation and view factory of one registered panel.
///
/// Moved into the registry by [`PanelRegistry::register`](super::PanelRegistry::register);
/// the registry is its sole owner from then on.
pub struct PanelDescriptor {
    id: PanelId,
    token: RegistrationToken,
    title: String,
    icon: PanelIcon,
    factory: PanelViewFactory,
    observers: Vec<Weak<dyn PanelObserver>>,
}

impl PanelDescriptor {
    /// Descriptor with no observers and a fresh [`RegistrationToken`]
    pub fn new<F>(id: PanelId, title: impl Into<String>, icon: PanelIcon, factory: F) -> Self
    where
        F: Fn() -> Result<PanelView, PanelError> + 'static,
    {
        Self {
            id,
            token: RegistrationToken::new(),
            title: title.into(),
            icon,
            factory: Rc::new(factory),
            observers: Vec::new(),
        }
    }

    /// Descriptor carrying the id, title and icon of `spec`
    pub fn from_spec<F>(spec: &PanelSpec, factory: F) -> Self
    where
        F: Fn() -> Result<PanelView, PanelError> + 'static,
    {
        Self::new(spec.id.clone(), spec.title.clone(), spec.icon.clone(), factory)
    }

    /// Observers are held weakly; one that is dropped is skipped and pruned
    pub fn add_observer(&mut self, observer: Weak<dyn PanelObserver>) {
        self.observers.push(observer);
    }

    /// Registry key
    pub fn id(&self) -> &PanelId {
        &self.id
    }

    /// Token of this descriptor instance
    pub fn token(&self) -> RegistrationToken {
        self.token
    }

    /// Title shown in the panel header
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Icon shown in the panel picker
    pub fn icon(&self) -> &PanelIcon {
        &self.icon
    }

    /// Observers that are still alive
    pub fn observer_count(&self) -> usize {
        self.observers
            .iter()
            .filter(|observer| observer.strong_count() > 0)
            .count()
    }

    pub(crate) fn factory(&self) -> PanelViewFactory {
        self.factory.clone()
    }

    /// Upgrade live observers, dropping the dead ones
    pub(crate) fn live_observers(&mut self) -> Vec<Rc<dyn PanelObserver>> {
        let mut live = Vec::with_capacity(self.observers.len());
        self.observers.retain(|observer| match observer.upgrade() {
            Some(observer) => {
                live.push(observer);
                true
            }
            None => false,
        });
        live
    }

    pub(crate) fn clear_observers(&mut self) {
        self.observers.clear();
    }
}

impl fmt::Debug for PanelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanelDescriptor")
            .field("id", &self.id)
            .field("token", &self.token)
            .field("title", &self.title)
            .field("icon", &self.icon)
            .field("observers", &self.observers.len())
            .finish()
    }
}
