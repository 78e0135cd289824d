use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Base URL the desktop app listens on by default.
pub const DEFAULT_BASE_URL: &str = "http://localhost:56248";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

/// Bridge configuration read from a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root URL of the desktop app server.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Workspace directories scanned for projects.
    #[serde(default)]
    pub mm_workspace: Vec<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            mm_workspace: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self> {
        let raw = fs::read_to_string(path).with_context(|| format!("reading config file {path}"))?;
        serde_json::from_str(&raw).context("parsing config JSON")
    }
}
