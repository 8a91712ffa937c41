use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use music_dl_core::core::events::DownloadObserver;
use music_dl_core::core::progress::Checkpoints;
use music_dl_core::models::media::{CollectionItem, ItemStatus, TrackMeta};

const SINGLE_NAME_WIDTH: usize = 50;
const TRACK_NAME_WIDTH: usize = 40;

fn truncate(name: &str, width: usize) -> String {
    name.chars().take(width).collect::<String>().trim().to_string()
}

#[derive(Default)]
struct ReporterState {
    single_name: String,
    single: Checkpoints,
    /// 1-based index and label of the item being downloaded. Collection
    /// items run one at a time.
    current: Option<(usize, String)>,
    track_status: HashMap<usize, ItemStatus>,
}

impl ReporterState {
    fn count(&self, status: ItemStatus) -> usize {
        self.track_status.values().filter(|s| **s == status).count()
    }
}

/// Prints checkpoint lines to the terminal. Single downloads are coarsened
/// here; collection items arrive already coarsened.
#[derive(Default)]
pub struct ConsoleReporter {
    state: Mutex<ReporterState>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn set_status(&self, status: ItemStatus) {
        if let Ok(mut state) = self.state.lock() {
            if let Some(index) = state.current.as_ref().map(|(i, _)| *i) {
                state.track_status.insert(index, status);
            }
        }
    }

    fn track_label(&self, item: &CollectionItem) -> String {
        self.state
            .lock()
            .ok()
            .and_then(|s| s.current.as_ref().map(|(_, label)| label.clone()))
            .unwrap_or_else(|| truncate(&item.title, TRACK_NAME_WIDTH))
    }
}

impl DownloadObserver for ConsoleReporter {
    fn on_single_start(&self, meta: &TrackMeta) {
        let name = truncate(&meta.display_name(), SINGLE_NAME_WIDTH);
        println!("Downloading: {}", name);
        if let Ok(mut state) = self.state.lock() {
            state.single_name = name;
            state.single = Checkpoints::new();
        }
    }

    fn on_progress(&self, percent: f64) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        if let Some(checkpoint) = state.single.advance(percent) {
            println!("  {:>3}% | {}", checkpoint, state.single_name);
        }
    }

    fn on_collection_start(&self, items: &[CollectionItem]) {
        println!("\nStarting download for {} tracks...", items.len());
    }

    fn on_track_start(&self, item: &CollectionItem, index: usize, total: usize) {
        let title = if item.title.is_empty() { "Unknown" } else { item.title.as_str() };
        let label = format!("[{}/{}] {}", index, total, truncate(title, TRACK_NAME_WIDTH));
        println!("{}", label);
        if let Ok(mut state) = self.state.lock() {
            state.current = Some((index, label));
            state.track_status.insert(index, ItemStatus::Downloading);
        }
    }

    fn on_track_progress(&self, item: &CollectionItem, percent: f64) {
        println!("  {:>3}% | {}", percent, self.track_label(item));
        if percent >= 100.0 {
            self.set_status(ItemStatus::Completed);
        }
    }

    fn on_track_error(&self, item: &CollectionItem, error: &anyhow::Error) {
        eprintln!("[ERROR] Failed to download {}: {:#}", item.title, error);
        self.set_status(ItemStatus::Failed);
    }

    fn on_collection_progress(&self, done: usize, total: usize) {
        println!("TOTAL PROGRESS {}/{}", done, total);
        if done == total {
            if let Ok(state) = self.state.lock() {
                println!(
                    "Finished: {} completed, {} failed",
                    state.count(ItemStatus::Completed),
                    state.count(ItemStatus::Failed)
                );
            }
        }
    }
}

fn location(path: &Path) -> String {
    path.parent()
        .map(|p| p.display().to_string())
        .unwrap_or_default()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Summary block shown after a download command finishes.
pub fn format_results(files: &[PathBuf], source: &str) -> String {
    let rule = "=".repeat(50);
    let mut lines = vec![String::new(), rule.clone()];

    match files {
        [] => lines.push(format!("No files were downloaded from {}.", source)),
        [single] => {
            lines.push(format!("{} download completed:", source));
            lines.push(format!("   {}", file_name(single)));
            lines.push(format!("   Location: {}", location(single)));
        }
        many => {
            lines.push(format!("Downloaded {} files from {}:", many.len(), source));
            for (i, file) in many.iter().enumerate() {
                lines.push(format!("   {}. {}", i + 1, file_name(file)));
            }
            lines.push(format!("   Location: {}", location(&many[0])));
        }
    }

    lines.push(rule);
    lines.join("\n")
}

pub fn print_results(files: &[PathBuf], source: &str) {
    println!("{}", format_results(files, source));
}
