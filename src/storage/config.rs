use std::path::{Path, PathBuf};

use anyhow::Context;

use music_dl_core::fs_paths::{AppPaths, DesktopPaths};
use music_dl_core::models::settings::AppSettings;

const STORE_FILE: &str = "settings.json";

/// `--config` wins; otherwise `settings.json` in the config directory.
pub fn settings_path(override_path: Option<&Path>) -> PathBuf {
    match override_path {
        Some(path) => path.to_path_buf(),
        None => DesktopPaths.config_dir().join(STORE_FILE),
    }
}

/// Missing or unreadable settings fall back to defaults.
pub fn load_settings(path: &Path) -> AppSettings {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("could not read {}: {}", path.display(), e);
            }
            return AppSettings::default();
        }
    };

    match serde_json::from_str::<AppSettings>(&raw) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!("ignoring invalid settings in {}: {}", path.display(), e);
            AppSettings::default()
        }
    }
}

pub fn save_settings(path: &Path, settings: &AppSettings) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("could not create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, json).with_context(|| format!("could not write {}", path.display()))?;
    Ok(())
}

/// Loads whatever is at `path`, applies the given overrides and writes the
/// result back, so the file always lists every setting.
pub fn init_settings(
    path: &Path,
    output_dir: Option<&Path>,
    quality: Option<&str>,
) -> anyhow::Result<AppSettings> {
    let mut settings = load_settings(path);
    if let Some(dir) = output_dir {
        settings.download.output_dir = dir.to_path_buf();
    }
    if let Some(q) = quality {
        settings.download.quality = q.to_string();
    }
    save_settings(path, &settings)?;
    Ok(settings)
}
