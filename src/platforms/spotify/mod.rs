use std::path::PathBuf;

use anyhow::{anyhow, Context};
use async_trait::async_trait;

use music_dl_core::core::collection::CollectionSource;
use music_dl_core::core::events::DownloadObserver;
use music_dl_core::core::progress::ProgressFn;
use music_dl_core::error::CoreError;
use music_dl_core::models::media::CollectionItem;

use crate::core::url_parser::{parse_url, ParsedContentType};
use crate::platforms::youtube::YouTubeDownloader;
use crate::platforms::Platform;

pub mod api;

use api::SpotifyClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Playlist,
    Album,
}

/// Parses a Spotify URL into its content type and id, rejecting anything
/// that is not a track, playlist or album link.
pub fn classify(url: &str) -> anyhow::Result<(ParsedContentType, String)> {
    let parsed = parse_url(url)
        .filter(|p| p.platform == Platform::Spotify)
        .ok_or_else(|| anyhow!("not a Spotify URL: {}", url))?;

    match (parsed.content_type, parsed.content_id) {
        (kind @ (ParsedContentType::Track | ParsedContentType::Playlist | ParsedContentType::Album), Some(id)) => {
            Ok((kind, id))
        }
        _ => Err(anyhow!("unsupported Spotify URL: {}", url)),
    }
}

pub fn search_query(title: &str, artist: &str) -> String {
    format!("{} {}", title, artist)
}

/// Spotify supplies the metadata, YouTube supplies the audio.
pub struct SpotifyDownloader<'a> {
    api: SpotifyClient,
    youtube: &'a YouTubeDownloader,
}

impl<'a> SpotifyDownloader<'a> {
    pub fn new(api: SpotifyClient, youtube: &'a YouTubeDownloader) -> Self {
        Self { api, youtube }
    }

    pub async fn download_track(
        &self,
        track_id: &str,
        observer: &dyn DownloadObserver,
    ) -> anyhow::Result<PathBuf> {
        let meta = self
            .api
            .track(track_id)
            .await
            .with_context(|| format!("could not read Spotify track {}", track_id))?;
        observer.on_single_start(&meta);

        let query = search_query(&meta.title, &meta.artist);
        let url = self
            .youtube
            .search(&query)
            .await?
            .ok_or(CoreError::NoMatchFound { query })?;

        self.youtube
            .download_named(&url, &meta.display_name(), Some(&|p| observer.on_progress(p)))
            .await
    }

    pub async fn list(&self, kind: CollectionKind, id: &str) -> anyhow::Result<Vec<CollectionItem>> {
        match kind {
            CollectionKind::Playlist => self.api.playlist_tracks(id).await,
            CollectionKind::Album => self.api.album_tracks(id).await,
        }
    }

    pub fn collection(&self, kind: CollectionKind, id: &str) -> SpotifyCollection<'_, 'a> {
        SpotifyCollection {
            downloader: self,
            kind,
            id: id.to_string(),
        }
    }
}

pub struct SpotifyCollection<'d, 'a> {
    downloader: &'d SpotifyDownloader<'a>,
    kind: CollectionKind,
    id: String,
}

#[async_trait]
impl CollectionSource for SpotifyCollection<'_, '_> {
    async fn list_items(&self) -> anyhow::Result<Vec<CollectionItem>> {
        self.downloader.list(self.kind, &self.id).await
    }

    async fn resolve_item(&self, item: &CollectionItem) -> anyhow::Result<Option<String>> {
        self.downloader
            .youtube
            .search(&search_query(&item.title, &item.artist))
            .await
    }

    async fn fetch_item(
        &self,
        item: &CollectionItem,
        url: &str,
        on_progress: &ProgressFn<'_>,
    ) -> anyhow::Result<PathBuf> {
        self.downloader
            .youtube
            .download_named(url, &item.meta().display_name(), Some(on_progress))
            .await
    }
}
