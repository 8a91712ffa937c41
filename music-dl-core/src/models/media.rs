use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TrackMeta {
    pub title: String,
    pub artist: String,
}

impl TrackMeta {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
        }
    }

    pub fn display_name(&self) -> String {
        if self.artist.is_empty() {
            self.title.clone()
        } else {
            format!("{} - {}", self.artist, self.title)
        }
    }
}

/// One entry of a playlist or album listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectionItem {
    pub id: Option<String>,
    pub title: String,
    pub artist: String,
}

impl CollectionItem {
    /// Identity used for progress bookkeeping: the id, or the title when the
    /// source gave none.
    pub fn key(&self) -> &str {
        match self.id.as_deref() {
            Some(id) if !id.is_empty() => id,
            _ => &self.title,
        }
    }

    pub fn meta(&self) -> TrackMeta {
        TrackMeta::new(self.artist.clone(), self.title.clone())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ItemStatus {
    Pending,
    Downloading,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioJob {
    pub source_url: String,
    pub output_path: PathBuf,
    pub quality: String,
    pub cookies: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoJob {
    pub source_url: String,
    pub output_path: PathBuf,
    pub resolution: Option<String>,
    pub cookies: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: Option<&str>, title: &str) -> CollectionItem {
        CollectionItem {
            id: id.map(str::to_string),
            title: title.to_string(),
            artist: "Artist".to_string(),
        }
    }

    #[test]
    fn key_prefers_id() {
        assert_eq!(item(Some("4uLU6hMCjMI75M1A2tKUQC"), "Song").key(), "4uLU6hMCjMI75M1A2tKUQC");
    }

    #[test]
    fn key_falls_back_to_title() {
        assert_eq!(item(None, "Song").key(), "Song");
        assert_eq!(item(Some(""), "Song").key(), "Song");
    }

    #[test]
    fn display_name_joins_artist_and_title() {
        assert_eq!(TrackMeta::new("Adele", "Hello").display_name(), "Adele - Hello");
        assert_eq!(TrackMeta::new("", "Hello").display_name(), "Hello");
    }
}
