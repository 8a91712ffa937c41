use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub download: DownloadSettings,
    #[serde(default)]
    pub tools: ToolSettings,
    #[serde(default)]
    pub spotify: SpotifySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadSettings {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_quality")]
    pub quality: String,
    #[serde(default = "default_rate_limit_delay_ms")]
    pub rate_limit_delay_ms: u64,
    /// Base directories for the global leftover sweep. Empty means the
    /// process working directory.
    #[serde(default)]
    pub global_sweep_dirs: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolSettings {
    #[serde(default)]
    pub ytdlp: Option<PathBuf>,
    #[serde(default)]
    pub ffmpeg: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpotifySettings {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
}

fn default_schema_version() -> u32 {
    1
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./downloads")
}

fn default_quality() -> String {
    "0".into()
}

fn default_rate_limit_delay_ms() -> u64 {
    500
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            quality: default_quality(),
            rate_limit_delay_ms: default_rate_limit_delay_ms(),
            global_sweep_dirs: Vec::new(),
        }
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            download: DownloadSettings::default(),
            tools: ToolSettings::default(),
            spotify: SpotifySettings::default(),
        }
    }
}
