// Panel-related modules

pub mod coordinator;
pub mod descriptor;
pub mod registry;
pub mod view;
pub mod window;

// Re-export panel types
pub use coordinator::{DomainBinding, PanelCoordinator, PanelCoordinatorBuilder, RequestId};
pub use descriptor::{PanelDescriptor, PanelObserver, PanelViewFactory, RegistrationToken};
pub use registry::{PanelEntryInfo, PanelRegistry};
pub use view::{LoadState, PanelView, ViewId};
pub use window::{HostWindow, InstalledPanels, WindowId};
