pub mod project_list;
pub mod project_settings;

pub use project_list::{project_list, Project};
pub use project_settings::ProjectSettings;
