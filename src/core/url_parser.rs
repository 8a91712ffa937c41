use std::sync::LazyLock;

use regex::Regex;

use crate::platforms::Platform;

static SPOTIFY_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(track|playlist|album)/([a-zA-Z0-9]+)").unwrap());

#[derive(Debug, Clone)]
pub struct ParsedUrl {
    pub platform: Platform,
    pub url: String,
    pub content_id: Option<String>,
    pub content_type: ParsedContentType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedContentType {
    Track,
    Album,
    Playlist,
    Video,
    Short,
    Unknown,
}

impl ParsedContentType {
    pub fn is_collection(&self) -> bool {
        matches!(self, ParsedContentType::Album | ParsedContentType::Playlist)
    }
}

pub fn parse_url(url_str: &str) -> Option<ParsedUrl> {
    let platform = Platform::from_url(url_str)?;
    let parsed = url::Url::parse(url_str).ok()?;
    let segments: Vec<&str> = parsed
        .path()
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    let (content_id, content_type) = match platform {
        Platform::Spotify => parse_spotify(url_str),
        Platform::YouTube => parse_youtube(&parsed, &segments),
    };

    Some(ParsedUrl {
        platform,
        url: url_str.to_string(),
        content_id,
        content_type,
    })
}

/// Playlist and album segments win over a track segment in the same URL.
fn parse_spotify(url: &str) -> (Option<String>, ParsedContentType) {
    let mut track = None;
    for caps in SPOTIFY_ID_RE.captures_iter(url) {
        let id = caps[2].to_string();
        match &caps[1] {
            "playlist" => return (Some(id), ParsedContentType::Playlist),
            "album" => return (Some(id), ParsedContentType::Album),
            _ => track = track.or(Some(id)),
        }
    }

    match track {
        Some(id) => (Some(id), ParsedContentType::Track),
        None => (None, ParsedContentType::Unknown),
    }
}

fn parse_youtube(parsed: &url::Url, segments: &[&str]) -> (Option<String>, ParsedContentType) {
    let list = parsed
        .query_pairs()
        .find(|(k, _)| k == "list")
        .map(|(_, v)| v.to_string());

    if segments.first() == Some(&"playlist") {
        return (list, ParsedContentType::Playlist);
    }

    if let Some(v) = parsed.query_pairs().find(|(k, _)| k == "v").map(|(_, v)| v.to_string()) {
        if list.is_some() {
            return (list, ParsedContentType::Playlist);
        }
        return (Some(v), ParsedContentType::Video);
    }

    if parsed.host_str().is_some_and(|h| h.contains("youtu.be")) {
        return (segments.first().map(|s| s.to_string()), ParsedContentType::Video);
    }

    if segments.first() == Some(&"shorts") {
        return (segments.get(1).map(|s| s.to_string()), ParsedContentType::Short);
    }

    (None, ParsedContentType::Unknown)
}

/// Loose check used by the dispatcher: anything that mentions a playlist or
/// album, or carries a `list=` parameter, is handled as a collection.
pub fn looks_like_collection(input: &str) -> bool {
    input.contains("playlist") || input.contains("album") || input.contains("list=")
}

/// Input that is neither a URL nor a bare domain is treated as a search query.
pub fn looks_like_query(input: &str) -> bool {
    !input.contains("http") && !input.contains("www")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spotify_track() {
        let parsed = parse_url("https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC?si=abc").unwrap();
        assert_eq!(parsed.platform, Platform::Spotify);
        assert_eq!(parsed.content_type, ParsedContentType::Track);
        assert_eq!(parsed.content_id.as_deref(), Some("4uLU6hMCjMI75M1A2tKUQC"));
    }

    #[test]
    fn spotify_playlist_and_album() {
        let playlist = parse_url("https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M").unwrap();
        assert_eq!(playlist.content_type, ParsedContentType::Playlist);
        assert_eq!(playlist.content_id.as_deref(), Some("37i9dQZF1DXcBWIGoYBM5M"));

        let album = parse_url("https://open.spotify.com/album/1DFixLWuPkv3KT3TnV35m3").unwrap();
        assert_eq!(album.content_type, ParsedContentType::Album);
        assert!(album.content_type.is_collection());
    }

    #[test]
    fn spotify_intl_prefix() {
        let parsed = parse_url("https://open.spotify.com/intl-id/track/abc123").unwrap();
        assert_eq!(parsed.content_type, ParsedContentType::Track);
        assert_eq!(parsed.content_id.as_deref(), Some("abc123"));
    }

    #[test]
    fn youtube_variants() {
        let video = parse_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap();
        assert_eq!(video.content_type, ParsedContentType::Video);
        assert_eq!(video.content_id.as_deref(), Some("dQw4w9WgXcQ"));

        let short = parse_url("https://youtube.com/shorts/abc123").unwrap();
        assert_eq!(short.content_type, ParsedContentType::Short);

        let short_link = parse_url("https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert_eq!(short_link.content_id.as_deref(), Some("dQw4w9WgXcQ"));

        let list = parse_url("https://www.youtube.com/playlist?list=PL123").unwrap();
        assert_eq!(list.content_type, ParsedContentType::Playlist);
        assert_eq!(list.content_id.as_deref(), Some("PL123"));

        let in_list = parse_url("https://www.youtube.com/watch?v=abc&list=PL9").unwrap();
        assert_eq!(in_list.content_type, ParsedContentType::Playlist);
    }

    #[test]
    fn unsupported_hosts_are_none() {
        assert!(parse_url("https://soundcloud.com/artist/track").is_none());
        assert!(parse_url("not a url").is_none());
    }

    #[test]
    fn dispatch_heuristics() {
        assert!(looks_like_collection("https://www.youtube.com/watch?v=a&list=PL1"));
        assert!(looks_like_collection("https://open.spotify.com/album/x"));
        assert!(!looks_like_collection("https://open.spotify.com/track/x"));
        assert!(looks_like_query("coldplay yellow"));
        assert!(!looks_like_query("www.youtube.com/watch?v=a"));
        assert!(!looks_like_query("https://youtu.be/a"));
    }
}
