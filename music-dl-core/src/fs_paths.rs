use std::path::{Path, PathBuf};

pub trait AppPaths: Send + Sync {
    fn config_dir(&self) -> PathBuf;
    fn bin_dir(&self) -> Option<PathBuf>;
}

pub struct DesktopPaths;

impl AppPaths for DesktopPaths {
    fn config_dir(&self) -> PathBuf {
        if let Ok(dir) = std::env::var("MUSIC_DL_CONFIG_DIR") {
            return PathBuf::from(dir);
        }
        dirs::config_dir()
            .map(|d| d.join("music-dl"))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn bin_dir(&self) -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("music-dl").join("bin"))
    }
}

fn exe_name(name: &str) -> String {
    if cfg!(target_os = "windows") {
        format!("{}.exe", name)
    } else {
        name.to_string()
    }
}

/// Picks the yt-dlp executable once: explicit override, then a project-local
/// `venv/bin/yt-dlp` under `cwd`, then the bare command name.
pub fn resolve_ytdlp(override_path: Option<&Path>, cwd: &Path) -> PathBuf {
    if let Some(path) = override_path {
        return path.to_path_buf();
    }

    let venv_dir = if cfg!(target_os = "windows") { "Scripts" } else { "bin" };
    let local = cwd.join("venv").join(venv_dir).join(exe_name("yt-dlp"));
    if local.exists() {
        return local;
    }

    PathBuf::from(exe_name("yt-dlp"))
}

pub fn resolve_ffmpeg(override_path: Option<&Path>) -> PathBuf {
    override_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(exe_name("ffmpeg")))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn ytdlp_override_wins() {
        let dir = tempfile::tempdir().unwrap();
        let chosen = resolve_ytdlp(Some(Path::new("/opt/bin/yt-dlp")), dir.path());
        assert_eq!(chosen, PathBuf::from("/opt/bin/yt-dlp"));
    }

    #[test]
    fn ytdlp_prefers_local_venv() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("venv").join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        std::fs::write(bin.join("yt-dlp"), b"#!/bin/sh\n").unwrap();

        assert_eq!(resolve_ytdlp(None, dir.path()), bin.join("yt-dlp"));
    }

    #[test]
    fn ytdlp_falls_back_to_bare_name() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(resolve_ytdlp(None, dir.path()), PathBuf::from("yt-dlp"));
    }

    #[test]
    fn ffmpeg_defaults_to_bare_name() {
        assert_eq!(resolve_ffmpeg(None), PathBuf::from("ffmpeg"));
        assert_eq!(
            resolve_ffmpeg(Some(Path::new("/usr/local/bin/ffmpeg"))),
            PathBuf::from("/usr/local/bin/ffmpeg")
        );
    }
}
