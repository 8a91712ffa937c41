use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use music_dl_core::core::process;
use music_dl_core::error::CoreError;
use music_dl_core::models::media::{CollectionItem, TrackMeta};

const UNKNOWN_ARTIST: &str = "Unknown Artist";
const UNKNOWN_TITLE: &str = "Unknown Title";

static ARTIST_SUFFIXES: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r" - Topic$").unwrap(),
        Regex::new(r" Official$").unwrap(),
        Regex::new(r"VEVO$").unwrap(),
    ]
});

static TITLE_MARKERS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)\(Official (Video|Music Video|Audio)\)").unwrap(),
        Regex::new(r"(?i)\[Official (Video|Audio)\]").unwrap(),
        Regex::new(r"(?i)\((Audio|Lyrics|Visualizer)\)").unwrap(),
    ]
});

pub fn watch_url(id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", id)
}

fn with_cookies(cookies: Option<&Path>, rest: &[&str]) -> Vec<String> {
    let mut args = Vec::with_capacity(rest.len() + 2);
    if let Some(path) = cookies {
        args.push("--cookies".to_string());
        args.push(path.to_string_lossy().to_string());
    }
    args.extend(rest.iter().map(|s| s.to_string()));
    args
}

pub fn clean_artist(artist: &str) -> String {
    let mut out = artist.to_string();
    for re in ARTIST_SUFFIXES.iter() {
        out = re.replace(&out, "").to_string();
    }
    out.trim().to_string()
}

/// Drops a leading `<artist> - ` and the usual upload markers from a title.
pub fn clean_title(title: &str, artist: &str) -> String {
    let mut out = title.to_string();

    if !artist.is_empty() {
        if let Ok(prefix) = Regex::new(&format!(r"(?i)^{}\s*-\s*", regex::escape(artist))) {
            out = prefix.replace(&out, "").to_string();
        }
    }

    for re in TITLE_MARKERS.iter() {
        out = re.replace_all(&out, "").to_string();
    }
    out.trim().to_string()
}

pub fn parse_metadata(json: &serde_json::Value) -> TrackMeta {
    let non_empty = |key: &str| {
        json.get(key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    };

    let artist = clean_artist(
        non_empty("artist")
            .or_else(|| non_empty("uploader"))
            .unwrap_or(UNKNOWN_ARTIST),
    );
    let title = clean_title(non_empty("title").unwrap_or(UNKNOWN_TITLE), &artist);

    TrackMeta::new(artist, title)
}

/// Reads display metadata for a single video without downloading it.
pub async fn fetch_metadata(
    ytdlp: &Path,
    url: &str,
    cookies: Option<&Path>,
) -> Result<TrackMeta, CoreError> {
    let args = with_cookies(cookies, &["--dump-json", "--no-warnings", "--no-playlist", url]);
    let stdout = process::capture(ytdlp, &args)
        .await
        .map_err(|e| CoreError::MetadataFetchFailure(e.to_string()))?;

    let first = stdout.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let json: serde_json::Value = serde_json::from_str(first)
        .map_err(|e| CoreError::MetadataFetchFailure(format!("invalid JSON from yt-dlp: {}", e)))?;

    Ok(parse_metadata(&json))
}

fn entry_url(json: &serde_json::Value) -> Option<String> {
    let id = json.get("id").and_then(|v| v.as_str()).filter(|s| !s.is_empty())?;
    Some(
        json.get("url")
            .or_else(|| json.get("webpage_url"))
            .and_then(|v| v.as_str())
            .filter(|s| s.starts_with("http"))
            .map(|s| s.to_string())
            .unwrap_or_else(|| watch_url(id)),
    )
}

pub fn parse_search_output(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|l| serde_json::from_str::<serde_json::Value>(l).ok())
        .find_map(|json| entry_url(&json))
}

/// First YouTube hit for `query`, or `None` when the search comes back empty.
pub async fn search_first(ytdlp: &Path, query: &str) -> anyhow::Result<Option<String>> {
    let search_query = format!("ytsearch1:{}", query);
    let args = with_cookies(
        None,
        &["--flat-playlist", "--dump-json", "--no-warnings", &search_query],
    );
    let stdout = process::capture(ytdlp, &args).await?;
    Ok(parse_search_output(&stdout))
}

pub fn parse_listing(stdout: &str) -> Vec<CollectionItem> {
    let mut items = Vec::new();

    for line in stdout.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let json: serde_json::Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!("skipping unparsable listing line: {}", e);
                continue;
            }
        };

        let id = json
            .get("id")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        if id.is_empty() {
            continue;
        }

        let title = json
            .get("title")
            .and_then(|v| v.as_str())
            .unwrap_or(UNKNOWN_TITLE)
            .to_string();
        let artist = json
            .get("uploader")
            .or_else(|| json.get("channel"))
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        items.push(CollectionItem {
            id: Some(id),
            title,
            artist,
        });
    }

    items
}

pub async fn list_collection(
    ytdlp: &Path,
    url: &str,
    cookies: Option<&Path>,
) -> anyhow::Result<Vec<CollectionItem>> {
    let args = with_cookies(cookies, &["--flat-playlist", "--dump-json", "--no-warnings", url]);
    let stdout = process::capture(ytdlp, &args).await?;
    Ok(parse_listing(&stdout))
}
