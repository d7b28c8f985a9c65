use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{PanelError, ResourceLocator};

pub const DEFAULT_ICON_SIZE: u16 = 16;

/// Stable identifier of a panel type, unique within one window
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PanelId(String);

impl PanelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PanelId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Vector icon reference shown in the side panel header
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelIcon {
    pub name: String,
    #[serde(default = "default_icon_size")]
    pub size: u16,
}

fn default_icon_size() -> u16 {
    DEFAULT_ICON_SIZE
}

impl PanelIcon {
    pub fn vector(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: DEFAULT_ICON_SIZE,
        }
    }
}

/// Static description of one panel type.
///
/// One generic coordinator is instantiated per panel type; these are usually
/// read from the `panels` section of the config file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelSpec {
    pub id: PanelId,
    pub title: String,
    pub icon: PanelIcon,
    /// Name used in the `panel://<resource_name>` locator
    pub resource_name: String,
}

impl PanelSpec {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        icon: PanelIcon,
        resource_name: impl Into<String>,
    ) -> Self {
        Self {
            id: PanelId::new(id),
            title: title.into(),
            icon,
            resource_name: resource_name.into(),
        }
    }

    pub fn geointel() -> Self {
        Self::new(
            "geointel",
            "GeoIntel (Satellite Intelligence)",
            PanelIcon::vector("satellite"),
            "geointel",
        )
    }

    pub fn kenya_news() -> Self {
        Self::new(
            "kenya-news",
            "Kenya News",
            PanelIcon::vector("news"),
            "kenya-news",
        )
    }

    pub fn resource_locator(&self) -> Result<ResourceLocator, PanelError> {
        ResourceLocator::for_panel(&self.resource_name)
    }

    pub fn validate(&self) -> Result<(), PanelError> {
        if self.id.as_str().trim().is_empty() {
            return Err(PanelError::InvalidSpec("panel id is empty".to_string()));
        }
        if self.title.trim().is_empty() {
            return Err(PanelError::InvalidSpec(format!(
                "panel '{}' has an empty title",
                self.id
            )));
        }
        if self.icon.size == 0 {
            return Err(PanelError::InvalidSpec(format!(
                "panel '{}' has a zero-sized icon",
                self.id
            )));
        }
        self.resource_locator()?;
        Ok(())
    }
}

/// Browsing context (profile/session) a host window renders content in
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentContext {
    pub profile: String,
}

impl ContentContext {
    pub fn new(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
        }
    }
}

impl Default for ContentContext {
    fn default() -> Self {
        Self::new("Default")
    }
}
