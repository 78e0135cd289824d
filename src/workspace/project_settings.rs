use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Location of the settings document inside a project directory.
pub const SETTINGS_RELATIVE_PATH: &str = "config/.settings";

/// On-disk settings stored inside a project at `config/.settings`.
/// The `id` scopes dispatched commands to this project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSettings {
    pub id: String,
    #[serde(default)]
    pub project_name: Option<String>,
}

impl ProjectSettings {
    pub fn path_for(project_dir: &Path) -> PathBuf {
        project_dir.join(SETTINGS_RELATIVE_PATH)
    }

    /// Whether the directory carries project settings at all. This is the
    /// test that makes a directory a project during workspace scans.
    pub fn exists(project_dir: &Path) -> bool {
        Self::path_for(project_dir).is_file()
    }

    pub fn read(project_dir: &Path) -> Result<Self> {
        let path = Self::path_for(project_dir);
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("reading project settings {}", path.display()))?;
        serde_json::from_str(&raw).context("parsing project settings JSON")
    }
}
