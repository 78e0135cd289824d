use anyhow::Result;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

use crate::config::Config;
use crate::workspace::project_settings::ProjectSettings;

/// A project directory discovered under a configured workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    pub name: String,
    pub path: PathBuf,
    pub workspace: PathBuf,
}

/// Scan the configured workspaces for project directories.
///
/// A child directory counts as a project when its settings document exists.
/// Dot-prefixed entries are ignored, unreadable workspaces are skipped with a
/// warning, and results are ordered by workspace then name.
pub fn project_list(config: &Config) -> Result<Vec<Project>> {
    let mut projects = Vec::new();

    for workspace in &config.mm_workspace {
        let entries = match fs::read_dir(workspace) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(
                    workspace = %workspace.display(),
                    error = %err,
                    "skipping unreadable workspace"
                );
                continue;
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| !name.starts_with('.'))
            .collect();
        names.sort();

        for name in names {
            let path = workspace.join(&name);
            if ProjectSettings::exists(&path) {
                projects.push(Project {
                    name,
                    path,
                    workspace: workspace.clone(),
                });
            }
        }
    }

    Ok(projects)
}
