use anyhow::{anyhow, bail, Context};
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::Mutex;

use music_dl_core::models::media::{CollectionItem, TrackMeta};
use music_dl_core::models::settings::SpotifySettings;

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const API_BASE: &str = "https://api.spotify.com/v1";
const SEARCH_LIMIT: u32 = 10;

pub const CLIENT_ID_ENV: &str = "SPOTIFY_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "SPOTIFY_CLIENT_SECRET";

#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    pub fn from_env_or_settings(settings: &SpotifySettings) -> anyhow::Result<Self> {
        Self::resolve(
            std::env::var(CLIENT_ID_ENV).ok(),
            std::env::var(CLIENT_SECRET_ENV).ok(),
            settings,
        )
    }

    /// Environment values win over settings; each half is resolved on its own.
    pub fn resolve(
        env_id: Option<String>,
        env_secret: Option<String>,
        settings: &SpotifySettings,
    ) -> anyhow::Result<Self> {
        let pick = |env: Option<String>, stored: &str| {
            env.filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| stored.trim().to_string())
        };

        let client_id = pick(env_id, &settings.client_id);
        let client_secret = pick(env_secret, &settings.client_secret);

        if client_id.is_empty() || client_secret.is_empty() {
            bail!(
                "Spotify credentials missing: set {} and {} or add them to the settings file",
                CLIENT_ID_ENV,
                CLIENT_SECRET_ENV
            );
        }

        Ok(Self {
            client_id,
            client_secret,
        })
    }

    pub fn basic_auth(&self) -> String {
        let raw = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", base64::engine::general_purpose::STANDARD.encode(raw))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Artist {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Track {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<Artist>,
}

impl Track {
    pub fn artist_names(&self) -> String {
        join_artists(&self.artists)
    }
}

impl From<Track> for CollectionItem {
    fn from(track: Track) -> Self {
        let artist = track.artist_names();
        CollectionItem {
            id: track.id,
            title: track.name,
            artist,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PlaylistEntry {
    track: Option<Track>,
}

#[derive(Debug, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Album {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalUrls {
    #[serde(default)]
    pub spotify: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchTrack {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<Artist>,
    pub album: Album,
    #[serde(default)]
    pub external_urls: ExternalUrls,
    pub duration_ms: u64,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: Page<SearchTrack>,
}

pub fn join_artists(artists: &[Artist]) -> String {
    artists
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn playlist_items(page: Page<PlaylistEntry>) -> (Vec<CollectionItem>, Option<String>) {
    let items = page
        .items
        .into_iter()
        .filter_map(|entry| entry.track)
        .map(CollectionItem::from)
        .collect();
    (items, page.next)
}

fn album_items(page: Page<Track>) -> (Vec<CollectionItem>, Option<String>) {
    (page.items.into_iter().map(CollectionItem::from).collect(), page.next)
}

/// Client-credentials access to the Spotify Web API. The token is fetched
/// lazily and reused for the lifetime of the client.
pub struct SpotifyClient {
    client: reqwest::Client,
    credentials: Credentials,
    token: Mutex<Option<String>>,
}

impl SpotifyClient {
    pub fn new(client: reqwest::Client, credentials: Credentials) -> Self {
        Self {
            client,
            credentials,
            token: Mutex::new(None),
        }
    }

    pub async fn access_token(&self) -> anyhow::Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }

        let response = self
            .client
            .post(TOKEN_URL)
            .header(reqwest::header::AUTHORIZATION, self.credentials.basic_auth())
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body("grant_type=client_credentials")
            .send()
            .await
            .context("Spotify token request failed")?;

        if !response.status().is_success() {
            return Err(anyhow!("Spotify token endpoint returned HTTP {}", response.status()));
        }

        let body: TokenResponse = response.json().await.context("invalid Spotify token response")?;
        tracing::debug!("obtained Spotify access token");
        *cached = Some(body.access_token.clone());
        Ok(body.access_token)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> anyhow::Result<T> {
        let token = self.access_token().await?;
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .with_context(|| format!("request to {} failed", url))?;

        if !response.status().is_success() {
            return Err(anyhow!("Spotify API returned HTTP {} for {}", response.status(), url));
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("unexpected response from {}", url))
    }

    pub async fn track(&self, track_id: &str) -> anyhow::Result<TrackMeta> {
        let track: Track = self
            .get_json(&format!("{}/tracks/{}", API_BASE, track_id))
            .await?;
        let artist = track.artist_names();
        Ok(TrackMeta::new(artist, track.name))
    }

    pub async fn playlist_tracks(&self, playlist_id: &str) -> anyhow::Result<Vec<CollectionItem>> {
        let mut next = Some(format!("{}/playlists/{}/tracks", API_BASE, playlist_id));
        let mut tracks = Vec::new();

        while let Some(url) = next {
            let page: Page<PlaylistEntry> = self.get_json(&url).await?;
            let (items, more) = playlist_items(page);
            tracks.extend(items);
            next = more;
        }

        Ok(tracks)
    }

    pub async fn album_tracks(&self, album_id: &str) -> anyhow::Result<Vec<CollectionItem>> {
        let mut next = Some(format!("{}/albums/{}/tracks", API_BASE, album_id));
        let mut tracks = Vec::new();

        while let Some(url) = next {
            let page: Page<Track> = self.get_json(&url).await?;
            let (items, more) = album_items(page);
            tracks.extend(items);
            next = more;
        }

        Ok(tracks)
    }

    pub async fn search(&self, query: &str) -> anyhow::Result<Vec<SearchTrack>> {
        let url = format!(
            "{}/search?q={}&type=track&limit={}",
            API_BASE,
            urlencoding::encode(query),
            SEARCH_LIMIT
        );
        let response: SearchResponse = self
            .get_json(&url)
            .await
            .context("An error occurred while searching Spotify")?;
        Ok(response.tracks.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(id: &str, secret: &str) -> SpotifySettings {
        SpotifySettings {
            client_id: id.into(),
            client_secret: secret.into(),
        }
    }

    #[test]
    fn env_credentials_win() {
        let creds = Credentials::resolve(
            Some("env-id".into()),
            None,
            &settings("file-id", "file-secret"),
        )
        .unwrap();
        assert_eq!(creds.client_id, "env-id");
        assert_eq!(creds.client_secret, "file-secret");
    }

    #[test]
    fn missing_credentials_fail_early() {
        let err = Credentials::resolve(None, Some("  ".into()), &settings("id", "")).unwrap_err();
        assert!(err.to_string().contains("SPOTIFY_CLIENT_SECRET"));
    }

    #[test]
    fn basic_auth_is_base64() {
        let creds = Credentials {
            client_id: "id".into(),
            client_secret: "secret".into(),
        };
        assert_eq!(creds.basic_auth(), "Basic aWQ6c2VjcmV0");
    }

    #[test]
    fn playlist_page_skips_null_tracks() {
        let json = r#"{
            "items": [
                {"track": {"id": "t1", "name": "Yellow", "artists": [{"name": "Coldplay"}]}},
                {"track": null},
                {"track": {"id": null, "name": "Local", "artists": []}}
            ],
            "next": "https://api.spotify.com/v1/playlists/p/tracks?offset=100"
        }"#;
        let page: Page<PlaylistEntry> = serde_json::from_str(json).unwrap();
        let (items, next) = playlist_items(page);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].key(), "t1");
        assert_eq!(items[0].artist, "Coldplay");
        assert_eq!(items[1].key(), "Local");
        assert!(next.unwrap().contains("offset=100"));
    }

    #[test]
    fn album_page_joins_artists() {
        let json = r#"{
            "items": [
                {"id": "a1", "name": "Under Pressure", "artists": [{"name": "Queen"}, {"name": "David Bowie"}]}
            ],
            "next": null
        }"#;
        let page: Page<Track> = serde_json::from_str(json).unwrap();
        let (items, next) = album_items(page);

        assert_eq!(items[0].meta().display_name(), "Queen, David Bowie - Under Pressure");
        assert!(next.is_none());
    }

    #[test]
    fn search_response_parses() {
        let json = r#"{"tracks": {"items": [{
            "id": "s1", "name": "Hello", "artists": [{"name": "Adele"}],
            "album": {"name": "25"},
            "external_urls": {"spotify": "https://open.spotify.com/track/s1"},
            "duration_ms": 295000
        }], "next": null}}"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        let hit = &response.tracks.items[0];

        assert_eq!(join_artists(&hit.artists), "Adele");
        assert_eq!(hit.album.name, "25");
        assert_eq!(hit.external_urls.spotify, "https://open.spotify.com/track/s1");
    }
}
