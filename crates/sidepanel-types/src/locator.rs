use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::PanelError;

pub const RESOURCE_SCHEME: &str = "panel";

/// Fixed internal address a panel view navigates to: `panel://<panel-name>`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResourceLocator {
    name: String,
}

impl ResourceLocator {
    pub fn for_panel(name: &str) -> Result<Self, PanelError> {
        validate_name(name)?;
        Ok(Self {
            name: name.to_string(),
        })
    }

    /// Parse a full locator such as `panel://geointel`
    pub fn parse(s: &str) -> Result<Self, PanelError> {
        let name = s
            .strip_prefix(RESOURCE_SCHEME)
            .and_then(|rest| rest.strip_prefix("://"))
            .ok_or_else(|| PanelError::InvalidResource(format!("expected {RESOURCE_SCHEME}:// scheme in '{s}'")))?;
        Self::for_panel(name)
    }

    pub fn panel_name(&self) -> &str {
        &self.name
    }
}

fn validate_name(name: &str) -> Result<(), PanelError> {
    if name.is_empty() {
        return Err(PanelError::InvalidResource("empty panel name".to_string()));
    }
    if name.starts_with('-') || name.ends_with('-') {
        return Err(PanelError::InvalidResource(format!(
            "panel name '{name}' must not start or end with '-'"
        )));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
    {
        return Err(PanelError::InvalidResource(format!(
            "panel name '{name}' contains invalid character '{bad}'"
        )));
    }
    Ok(())
}

impl fmt::Display for ResourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", RESOURCE_SCHEME, self.name)
    }
}

impl FromStr for ResourceLocator {
    type Err = PanelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ResourceLocator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResourceLocator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
