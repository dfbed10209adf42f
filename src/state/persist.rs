use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::knowledge::{FilterSpec, Locale};

use super::viewport::{ContrastMode, DEFAULT_RENDER_NODE_CAP, LayoutMode};

/// The slice of session state that survives a restart. Selection, focus,
/// highlight, expansion, zoom and pan are not part of it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersistedSettings {
    pub filters: FilterSpec,
    pub layout: LayoutMode,
    pub physics_enabled: bool,
    pub render_node_cap: usize,
    pub locale: Locale,
    pub contrast: ContrastMode,
}

impl Default for PersistedSettings {
    fn default() -> Self {
        Self {
            filters: FilterSpec::default(),
            layout: LayoutMode::Force,
            physics_enabled: true,
            render_node_cap: DEFAULT_RENDER_NODE_CAP,
            locale: Locale::En,
            contrast: ContrastMode::Standard,
        }
    }
}

impl PersistedSettings {
    /// `Ok(None)` when the file does not exist yet.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => {
                return Err(error)
                    .with_context(|| format!("failed to read settings {}", path.display()));
            }
        };

        let settings = serde_json::from_str::<Self>(&raw)
            .with_context(|| format!("failed to parse settings {}", path.display()))?;
        Ok(Some(settings))
    }

    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(Some(settings)) => {
                info!(path = %path.display(), "settings loaded");
                settings
            }
            Ok(None) => Self::default(),
            Err(error) => {
                warn!(error = %format!("{error:#}"), "using default settings");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let encoded = serde_json::to_string_pretty(self).context("failed to encode settings")?;
        fs::write(path, encoded)
            .with_context(|| format!("failed to write settings {}", path.display()))?;
        info!(path = %path.display(), "settings saved");
        Ok(())
    }
}
