use anyhow::Context;

use music_dl_core::models::media::CollectionItem;

use crate::core::url_parser::{looks_like_query, ParsedContentType};
use crate::platforms::spotify::{self, api};
use crate::AppContext;

pub fn format_items(items: &[CollectionItem]) -> Vec<String> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {} - {}", i + 1, item.artist, item.title))
        .collect()
}

pub fn format_duration(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{}:{:02}", secs / 60, secs % 60)
}

pub fn format_search_hits(hits: &[api::SearchTrack]) -> Vec<String> {
    hits.iter()
        .enumerate()
        .map(|(i, hit)| {
            format!(
                "{}. {} - {} [{}] ({})",
                i + 1,
                api::join_artists(&hit.artists),
                hit.name,
                hit.album.name,
                format_duration(hit.duration_ms)
            )
        })
        .collect()
}

/// Prints tracks without downloading: a Spotify playlist or album, or the
/// top Spotify search hits for a plain query.
pub async fn execute(ctx: &AppContext, input: &str) -> anyhow::Result<()> {
    let is_spotify_url = input.contains("spotify.com");
    if !is_spotify_url && !looks_like_query(input) {
        println!("List mode only supports Spotify playlists, albums and search queries");
        return Ok(());
    }

    let credentials = api::Credentials::from_env_or_settings(&ctx.settings.spotify)?;
    let client = api::SpotifyClient::new(ctx.http.clone(), credentials);

    if !is_spotify_url {
        let hits = client.search(input).await?;
        println!("\nSpotify search results for \"{}\":", input);
        for line in format_search_hits(&hits) {
            println!("{}", line);
        }
        return Ok(());
    }

    let (header, items) = match spotify::classify(input)? {
        (ParsedContentType::Playlist, id) => (
            "Spotify Playlist",
            client.playlist_tracks(&id).await.context("Error fetching list")?,
        ),
        (ParsedContentType::Album, id) => (
            "Spotify Album",
            client.album_tracks(&id).await.context("Error fetching list")?,
        ),
        _ => {
            println!("List mode only supports Spotify playlists, albums and search queries");
            return Ok(());
        }
    };

    println!("\n{} ({} tracks):", header, items.len());
    for line in format_items(&items) {
        println!("{}", line);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn items_are_numbered_from_one() {
        let items = vec![
            CollectionItem {
                id: Some("1".into()),
                title: "Yellow".into(),
                artist: "Coldplay".into(),
            },
            CollectionItem {
                id: None,
                title: "Hello".into(),
                artist: "Adele".into(),
            },
        ];
        assert_eq!(
            format_items(&items),
            vec!["1. Coldplay - Yellow", "2. Adele - Hello"]
        );
    }

    #[test]
    fn durations_are_minutes_and_seconds() {
        assert_eq!(format_duration(295_000), "4:55");
        assert_eq!(format_duration(61_999), "1:01");
        assert_eq!(format_duration(0), "0:00");
    }

    #[test]
    fn search_hits_show_album_and_length() {
        let hits: Vec<api::SearchTrack> = serde_json::from_str(
            r#"[{"id": "s1", "name": "Hello", "artists": [{"name": "Adele"}],
                 "album": {"name": "25"}, "duration_ms": 295000}]"#,
        )
        .unwrap();
        assert_eq!(format_search_hits(&hits), vec!["1. Adele - Hello [25] (4:55)"]);
    }
}
