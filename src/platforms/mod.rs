use std::fmt;
use std::path::PathBuf;

use music_dl_core::core::filename::sanitize_filename;
use music_dl_core::models::media::AudioJob;

pub mod spotify;
pub mod youtube;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Spotify,
    YouTube,
}

impl Platform {
    pub fn from_url(url: &str) -> Option<Self> {
        let parsed = url::Url::parse(url).ok()?;
        let host = parsed.host_str()?.to_lowercase();
        let host = host.strip_prefix("www.").unwrap_or(&host);

        match host {
            "open.spotify.com" | "spotify.com" | "play.spotify.com" => Some(Platform::Spotify),
            "youtube.com" | "m.youtube.com" | "music.youtube.com" | "youtu.be" => {
                Some(Platform::YouTube)
            }
            _ => None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Spotify => write!(f, "spotify"),
            Platform::YouTube => write!(f, "youtube"),
        }
    }
}

/// Where and how finished mp3 files are written.
#[derive(Debug, Clone)]
pub struct AudioOptions {
    pub output_dir: PathBuf,
    pub quality: String,
    pub cookies: Option<PathBuf>,
}

impl AudioOptions {
    /// Output path for a display name: sanitized, with an `.mp3` extension.
    pub fn output_path(&self, name: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}.mp3", sanitize_filename(name)))
    }

    pub fn job(&self, source_url: &str, name: &str) -> AudioJob {
        AudioJob {
            source_url: source_url.to_string(),
            output_path: self.output_path(name),
            quality: self.quality.clone(),
            cookies: self.cookies.clone(),
        }
    }
}
