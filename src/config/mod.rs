pub mod paths;
pub mod profile;
pub mod settings;

pub use paths::AppPaths;
pub use profile::resolve_profile;
pub use settings::Settings;

use crate::error::AppResult;

pub fn load_settings(paths: &AppPaths, profile: &str) -> AppResult<Settings> {
    settings::load(paths.settings_file(profile))
}

/// Reads the profile's settings fresh from disk, applies `change`, and writes
/// them back.
pub fn update_settings(
    paths: &AppPaths,
    profile: &str,
    change: impl FnOnce(&mut Settings),
) -> AppResult<Settings> {
    let file = paths.settings_file(profile);
    let mut current = settings::load(file.clone())?;
    change(&mut current);
    settings::save(file, &current)?;
    tracing::debug!(profile, "profile settings updated");
    Ok(current)
}
