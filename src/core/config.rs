use std::collections::HashSet;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use sidepanel_services::SourceEndpoints;
use sidepanel_types::{ContentContext, PanelSpec};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Browsing profile the host window renders panel content in
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default = "default_panels")]
    pub panels: Vec<PanelConfig>,
    /// Endpoint per satellite data source
    #[serde(default)]
    pub endpoints: SourceEndpoints,
}

fn default_profile() -> String {
    ContentContext::default().profile
}

fn default_panels() -> Vec<PanelConfig> {
    vec![
        PanelConfig {
            spec: PanelSpec::geointel(),
            domain_service: true,
            enabled: true,
        },
        PanelConfig {
            spec: PanelSpec::kenya_news(),
            domain_service: false,
            enabled: true,
        },
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            panels: default_panels(),
            endpoints: SourceEndpoints::default(),
        }
    }
}

impl Config {
    pub fn content_context(&self) -> ContentContext {
        ContentContext::new(self.profile.clone())
    }

    /// Reject configs whose panel list cannot be installed as a whole
    pub fn validate(&self) -> Result<()> {
        if self.profile.trim().is_empty() {
            bail!("profile must not be empty");
        }
        let mut seen = HashSet::new();
        for panel in &self.panels {
            panel.spec.validate()?;
            if !seen.insert(panel.spec.id.clone()) {
                bail!("panel '{}' is configured more than once", panel.spec.id);
            }
        }
        Ok(())
    }
}

/// One configured side panel
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PanelConfig {
    #[serde(flatten)]
    pub spec: PanelSpec,
    /// Bind the shared domain service to this panel
    #[serde(default)]
    pub domain_service: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}
