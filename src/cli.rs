use std::path::PathBuf;

use clap::Parser;

const EXAMPLES: &str = "\
Examples:
  $ music-dl \"coldplay yellow\"
  $ music-dl <spotify_track_url>
  $ music-dl <youtube_video_url>
  $ music-dl <youtube_playlist_url> --output ./music
  $ music-dl \"adele hello\" --search
  $ music-dl <spotify_playlist_url> --list
  $ music-dl <yt_age_restricted_video_url> --cookies ./cookies.txt
  $ music-dl \"imagine dragons\" --quality 2
  $ music-dl <youtube_video_url> --video --resolution 720p
  $ music-dl --init-config --output ~/Music

Supported URLs:
  Spotify: track, playlist, album
  YouTube: video, playlist, shorts";

/// Download music from Spotify and YouTube
#[derive(Parser, Debug, Clone)]
#[command(name = "music-dl", author, version, about, long_about = None, after_help = EXAMPLES)]
pub struct Cli {
    /// Spotify/YouTube URL or a search query
    #[arg(value_name = "URL_OR_QUERY")]
    pub input: Option<String>,

    /// Output directory [default: ./downloads]
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Audio quality, 0 (best) to 9 [default: 0]
    #[arg(short, long)]
    pub quality: Option<String>,

    /// Treat the input as a YouTube search query
    #[arg(short, long)]
    pub search: bool,

    /// List the tracks without downloading
    #[arg(short, long)]
    pub list: bool,

    /// Show debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Cookies file passed to yt-dlp (for age-restricted videos)
    #[arg(short, long, value_name = "FILE")]
    pub cookies: Option<PathBuf>,

    /// Download the video as mp4 instead of extracting audio
    #[arg(long)]
    pub video: bool,

    /// Video resolution, e.g. 720p or 1080p
    #[arg(short, long, value_name = "LABEL", requires = "video")]
    pub resolution: Option<String>,

    /// Settings file to use instead of the default location
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write the settings file (keeping existing values, applying -o/-q) and exit
    #[arg(long)]
    pub init_config: bool,
}
