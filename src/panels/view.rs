//! Views hosted inside an open side panel.

use std::fmt;

use chrono::{DateTime, Utc};
use sidepanel_types::{ContentContext, ResourceLocator};
use uuid::Uuid;

/// Unique id of one view instance
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ViewId(Uuid);

impl ViewId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Navigation state of a view
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    /// Navigation was started; completion is reported by the content layer
    Loading,
}

/// Content-hosting view shown inside a side panel.
///
/// A new view is built every time a panel opens and is dropped when the panel
/// closes or its window goes away. Views are never reused.
#[derive(Debug)]
pub struct PanelView {
    id: ViewId,
    context: ContentContext,
    url: Option<ResourceLocator>,
    state: LoadState,
    created_at: DateTime<Utc>,
}

impl PanelView {
    /// Blank view rendering in `context`
    pub fn new(context: ContentContext) -> Self {
        Self {
            id: ViewId::new(),
            context,
            url: None,
            state: LoadState::Idle,
            created_at: Utc::now(),
        }
    }

    /// Start navigating to `url`. Returns immediately.
    pub fn load_url(&mut self, url: ResourceLocator) {
        log::debug!("[PanelView] {} navigating to {}", self.id, url);
        self.url = Some(url);
        self.state = LoadState::Loading;
    }

    /// Id of this view instance
    pub fn id(&self) -> ViewId {
        self.id
    }

    /// Browsing profile the view renders in
    pub fn context(&self) -> &ContentContext {
        &self.context
    }

    /// Last locator passed to [`load_url`](Self::load_url)
    pub fn url(&self) -> Option<&ResourceLocator> {
        self.url.as_ref()
    }

    /// Current navigation state
    pub fn load_state(&self) -> LoadState {
        self.state
    }

    /// When the view was built
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Drop for PanelView {
    fn drop(&mut self) {
        log::trace!("[PanelView] {} destroyed", self.id);
    }
}
