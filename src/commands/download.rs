use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;

use music_dl_core::core::collection::download_collection;
use music_dl_core::models::settings::AppSettings;

use crate::cli::Cli;
use crate::core::events::{print_results, ConsoleReporter};
use crate::core::url_parser::{looks_like_collection, looks_like_query, ParsedContentType};
use crate::platforms::spotify::{self, api, CollectionKind, SpotifyDownloader};
use crate::platforms::youtube::YouTubeDownloader;
use crate::platforms::AudioOptions;
use crate::AppContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    SpotifyCollection,
    YouTubeCollection,
    Search,
    SpotifyTrack,
    YouTubeVideo,
    YouTubeAudio,
}

impl Route {
    pub fn is_collection(&self) -> bool {
        matches!(self, Route::SpotifyCollection | Route::YouTubeCollection)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Route::SpotifyCollection => "Spotify playlist/album",
            Route::YouTubeCollection => "YouTube playlist",
            Route::Search => "search",
            Route::SpotifyTrack => "Spotify track",
            Route::YouTubeVideo => "YouTube video",
            Route::YouTubeAudio => "YouTube audio",
        }
    }
}

fn is_spotify(input: &str) -> bool {
    input.contains("spotify.com")
}

/// Collections are checked first, then search mode, then the single kinds.
pub fn route(input: &str, force_search: bool, video: bool) -> Route {
    if looks_like_collection(input) {
        if is_spotify(input) {
            Route::SpotifyCollection
        } else {
            Route::YouTubeCollection
        }
    } else if force_search || looks_like_query(input) {
        Route::Search
    } else if is_spotify(input) {
        Route::SpotifyTrack
    } else if video {
        Route::YouTubeVideo
    } else {
        Route::YouTubeAudio
    }
}

/// `--video` only has a meaning for a single YouTube URL; every other route
/// produces mp3s.
pub fn ensure_video_applies(route: Route, video: bool) -> anyhow::Result<()> {
    if video && route != Route::YouTubeVideo {
        anyhow::bail!(
            "--video only works with a single YouTube video URL (got a {} input)",
            route.label()
        );
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub input: String,
    pub search: bool,
    pub video: bool,
    pub resolution: Option<String>,
    pub audio: AudioOptions,
    pub delay: Duration,
}

fn absolutize(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

impl DownloadRequest {
    /// CLI flags win over settings.
    pub fn from_cli(cli: &Cli, input: &str, settings: &AppSettings, cwd: &Path) -> Self {
        let output_dir = cli
            .output
            .clone()
            .unwrap_or_else(|| settings.download.output_dir.clone());

        Self {
            input: input.to_string(),
            search: cli.search,
            video: cli.video,
            resolution: cli.resolution.clone(),
            audio: AudioOptions {
                output_dir: absolutize(&output_dir, cwd),
                quality: cli
                    .quality
                    .clone()
                    .unwrap_or_else(|| settings.download.quality.clone()),
                cookies: cli.cookies.clone(),
            },
            delay: Duration::from_millis(settings.download.rate_limit_delay_ms),
        }
    }
}

fn spotify_downloader<'a>(
    ctx: &AppContext,
    youtube: &'a YouTubeDownloader,
) -> anyhow::Result<SpotifyDownloader<'a>> {
    let credentials = api::Credentials::from_env_or_settings(&ctx.settings.spotify)?;
    Ok(SpotifyDownloader::new(
        api::SpotifyClient::new(ctx.http.clone(), credentials),
        youtube,
    ))
}

/// Runs one download command and prints the results summary.
///
/// Single downloads fail as a whole. Collection downloads only fail when the
/// listing itself fails; item failures are reported and skipped.
pub async fn execute(ctx: &AppContext, request: &DownloadRequest) -> anyhow::Result<Vec<PathBuf>> {
    let reporter = ConsoleReporter::new();
    let youtube = YouTubeDownloader::new(ctx.transcoder.clone(), request.audio.clone());
    let input = request.input.as_str();
    let route = route(input, request.search, request.video);
    tracing::debug!("routing {:?} as {:?}", input, route);
    ensure_video_applies(route, request.video)?;

    tokio::fs::create_dir_all(&request.audio.output_dir)
        .await
        .with_context(|| format!("could not create {}", request.audio.output_dir.display()))?;

    let files = match route {
        Route::SpotifyCollection => {
            let spotify = spotify_downloader(ctx, &youtube)?;
            match spotify::classify(input)? {
                (ParsedContentType::Playlist, id) => {
                    let source = spotify.collection(CollectionKind::Playlist, &id);
                    download_collection(&source, request.delay, &reporter).await?
                }
                (ParsedContentType::Album, id) => {
                    let source = spotify.collection(CollectionKind::Album, &id);
                    download_collection(&source, request.delay, &reporter).await?
                }
                (_, id) => vec![spotify.download_track(&id, &reporter).await?],
            }
        }
        Route::YouTubeCollection => {
            let source = youtube.collection(input);
            download_collection(&source, request.delay, &reporter).await?
        }
        Route::Search => vec![youtube.search_and_download(input, &reporter).await?],
        Route::SpotifyTrack => {
            let spotify = spotify_downloader(ctx, &youtube)?;
            let (_, id) = spotify::classify(input)?;
            vec![spotify.download_track(&id, &reporter).await?]
        }
        Route::YouTubeVideo => vec![
            youtube
                .download_video(input, request.resolution.as_deref(), &reporter)
                .await?,
        ],
        Route::YouTubeAudio => vec![youtube.download(input, &reporter).await?],
    };

    let source = if route.is_collection() { "Collection" } else { "Single file" };
    print_results(&files, source);
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn routes_collections_first() {
        assert_eq!(
            route("https://open.spotify.com/playlist/abc", true, false),
            Route::SpotifyCollection
        );
        assert_eq!(
            route("https://open.spotify.com/album/abc", false, false),
            Route::SpotifyCollection
        );
        assert_eq!(
            route("https://www.youtube.com/watch?v=a&list=PL1", false, true),
            Route::YouTubeCollection
        );
    }

    #[test]
    fn routes_single_inputs() {
        assert_eq!(route("coldplay yellow", false, false), Route::Search);
        assert_eq!(route("https://youtu.be/abc", true, false), Route::Search);
        assert_eq!(route("https://open.spotify.com/track/abc", false, false), Route::SpotifyTrack);
        assert_eq!(route("https://youtu.be/abc", false, false), Route::YouTubeAudio);
        assert_eq!(route("https://youtu.be/abc", false, true), Route::YouTubeVideo);
    }

    #[test]
    fn video_flag_is_rejected_off_youtube_singles() {
        assert!(ensure_video_applies(Route::YouTubeVideo, true).is_ok());
        assert!(ensure_video_applies(Route::SpotifyTrack, false).is_ok());
        for route in [
            Route::SpotifyCollection,
            Route::YouTubeCollection,
            Route::Search,
            Route::SpotifyTrack,
        ] {
            let err = ensure_video_applies(route, true).unwrap_err();
            assert!(err.to_string().contains("--video only works"), "{}", err);
        }
    }

    #[tokio::test]
    async fn video_search_fails_before_touching_disk() {
        let root = tempfile::tempdir().unwrap();
        let ctx = AppContext::new(AppSettings::default(), root.path().to_path_buf()).unwrap();
        let cli = Cli::try_parse_from(["music-dl", "adele hello", "--video", "-o", "music"]).unwrap();
        let request = DownloadRequest::from_cli(&cli, "adele hello", &ctx.settings, &ctx.cwd);

        let err = execute(&ctx, &request).await.unwrap_err();

        assert!(err.to_string().contains("search"), "{}", err);
        assert!(!root.path().join("music").exists());
    }

    #[test]
    fn request_prefers_cli_over_settings() {
        let mut settings = AppSettings::default();
        settings.download.quality = "5".into();
        settings.download.output_dir = PathBuf::from("/srv/music");
        settings.download.rate_limit_delay_ms = 250;

        let cli = Cli::try_parse_from(["music-dl", "x", "-q", "3"]).unwrap();
        let req = DownloadRequest::from_cli(&cli, "x", &settings, Path::new("/home/me"));
        assert_eq!(req.audio.quality, "3");
        assert_eq!(req.audio.output_dir, PathBuf::from("/srv/music"));
        assert_eq!(req.delay, Duration::from_millis(250));

        let cli = Cli::try_parse_from(["music-dl", "x", "-o", "out"]).unwrap();
        let req = DownloadRequest::from_cli(&cli, "x", &settings, Path::new("/home/me"));
        assert_eq!(req.audio.quality, "5");
        assert_eq!(req.audio.output_dir, PathBuf::from("/home/me/out"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn youtube_url_downloads_single_mp3() {
        use std::os::unix::fs::PermissionsExt;

        let root = tempfile::tempdir().unwrap();
        let write_tool = |name: &str, body: &str| {
            let path = root.path().join(name);
            std::fs::write(&path, body).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        };

        let mut settings = AppSettings::default();
        settings.tools.ytdlp = Some(write_tool(
            "yt-dlp",
            r#"#!/bin/sh
case " $* " in
  *" --dump-json "*) echo '{"title": "Hello", "artist": "Adele"}'; exit 0 ;;
esac
prev=""
for arg in "$@"; do
  if [ "$prev" = "--paths" ]; then ws="${arg#ALL:}"; fi
  prev="$arg"
done
head -c 32 /dev/zero > "$ws/temp_id.m4a"
"#,
        ));
        settings.tools.ffmpeg = Some(write_tool(
            "ffmpeg",
            "#!/bin/sh\nfor last in \"$@\"; do :; done\ncp \"$3\" \"$last\"\n",
        ));
        settings.download.global_sweep_dirs = vec![root.path().join("sweep")];

        let ctx = AppContext::new(settings, root.path().to_path_buf()).unwrap();
        let cli = Cli::try_parse_from(["music-dl", "https://youtu.be/abc", "-o", "music"]).unwrap();
        let request = DownloadRequest::from_cli(&cli, "https://youtu.be/abc", &ctx.settings, &ctx.cwd);

        let files = execute(&ctx, &request).await.unwrap();

        assert_eq!(files, vec![root.path().join("music").join("Adele - Hello.mp3")]);
        assert!(files[0].exists());
    }
}
