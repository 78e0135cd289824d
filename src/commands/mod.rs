use crate::transport::Command;

/// Open the desktop app home UI for the current project.
/// Executes asynchronously on the server; the dispatcher polls it to
/// completion.
pub fn open_ui() -> Command {
    Command::new("open-ui", true).arg("ui", true)
}

/// Open the desktop app global settings editor. Synchronous, and valid
/// without a project scope.
pub fn open_global_settings() -> Command {
    Command::new("open-settings", false)
        .arg("ui", true)
        .allow_without_project()
}
