use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use music_dl_core::core::collection::CollectionSource;
use music_dl_core::core::events::DownloadObserver;
use music_dl_core::core::filename::sanitize_filename;
use music_dl_core::core::progress::ProgressFn;
use music_dl_core::core::transcode::Transcoder;
use music_dl_core::error::CoreError;
use music_dl_core::models::media::{CollectionItem, TrackMeta, VideoJob};

use crate::core::ytdlp;
use crate::platforms::AudioOptions;

pub struct YouTubeDownloader {
    transcoder: Arc<Transcoder>,
    options: AudioOptions,
}

impl YouTubeDownloader {
    pub fn new(transcoder: Arc<Transcoder>, options: AudioOptions) -> Self {
        Self {
            transcoder,
            options,
        }
    }

    fn ytdlp(&self) -> &Path {
        &self.transcoder.config().ytdlp
    }

    fn cookies(&self) -> Option<&Path> {
        self.options.cookies.as_deref()
    }

    /// Display name for a video, read from yt-dlp metadata.
    pub async fn video_name(&self, url: &str) -> anyhow::Result<String> {
        let meta = ytdlp::fetch_metadata(self.ytdlp(), url, self.cookies()).await?;
        Ok(meta.display_name())
    }

    pub async fn search(&self, query: &str) -> anyhow::Result<Option<String>> {
        ytdlp::search_first(self.ytdlp(), query).await
    }

    /// Downloads `url` as mp3 named after `name`.
    pub async fn download_named(
        &self,
        url: &str,
        name: &str,
        on_progress: Option<&ProgressFn<'_>>,
    ) -> anyhow::Result<PathBuf> {
        let job = self.options.job(url, name);
        Ok(self.transcoder.download_audio(&job, on_progress).await?)
    }

    /// Single video to mp3. The file name comes from the video metadata.
    pub async fn download(
        &self,
        url: &str,
        observer: &dyn DownloadObserver,
    ) -> anyhow::Result<PathBuf> {
        let name = self.video_name(url).await?;
        observer.on_single_start(&TrackMeta::new("", sanitize_filename(&name)));
        self.download_named(url, &name, Some(&|p| observer.on_progress(p)))
            .await
    }

    pub async fn search_and_download(
        &self,
        query: &str,
        observer: &dyn DownloadObserver,
    ) -> anyhow::Result<PathBuf> {
        let url = self.search(query).await?.ok_or_else(|| CoreError::NoMatchFound {
            query: query.to_string(),
        })?;
        tracing::info!("search '{}' matched {}", query, url);
        self.download(&url, observer).await
    }

    /// Merged mp4 download, optionally pinned to a resolution label like `720p`.
    pub async fn download_video(
        &self,
        url: &str,
        resolution: Option<&str>,
        observer: &dyn DownloadObserver,
    ) -> anyhow::Result<PathBuf> {
        let name = sanitize_filename(&self.video_name(url).await?);
        observer.on_single_start(&TrackMeta::new("", name.clone()));

        let job = VideoJob {
            source_url: url.to_string(),
            output_path: self.options.output_dir.join(format!("{}.mp4", name)),
            resolution: resolution.map(str::to_string),
            cookies: self.options.cookies.clone(),
        };
        Ok(self
            .transcoder
            .download_video(&job, Some(&|p| observer.on_progress(p)))
            .await?)
    }

    pub fn collection(&self, url: &str) -> YouTubeCollection<'_> {
        YouTubeCollection {
            downloader: self,
            url: url.to_string(),
        }
    }
}

/// A YouTube playlist, listed flat and downloaded entry by entry.
pub struct YouTubeCollection<'a> {
    downloader: &'a YouTubeDownloader,
    url: String,
}

#[async_trait]
impl CollectionSource for YouTubeCollection<'_> {
    async fn list_items(&self) -> anyhow::Result<Vec<CollectionItem>> {
        ytdlp::list_collection(self.downloader.ytdlp(), &self.url, self.downloader.cookies()).await
    }

    async fn resolve_item(&self, item: &CollectionItem) -> anyhow::Result<Option<String>> {
        Ok(item
            .id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(ytdlp::watch_url))
    }

    async fn fetch_item(
        &self,
        _item: &CollectionItem,
        url: &str,
        on_progress: &ProgressFn<'_>,
    ) -> anyhow::Result<PathBuf> {
        let name = self.downloader.video_name(url).await?;
        self.downloader
            .download_named(url, &name, Some(on_progress))
            .await
    }
}
