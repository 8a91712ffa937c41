use crate::models::media::{CollectionItem, TrackMeta};

/// Hooks fired while jobs run. Every method defaults to a no-op so callers
/// only implement what they display.
///
/// Hooks are invoked synchronously on the job's task, in progress order.
pub trait DownloadObserver: Send + Sync {
    fn on_progress(&self, _percent: f64) {}

    fn on_single_start(&self, _meta: &TrackMeta) {}

    fn on_collection_start(&self, _items: &[CollectionItem]) {}

    fn on_track_start(&self, _item: &CollectionItem, _index: usize, _total: usize) {}

    fn on_track_progress(&self, _item: &CollectionItem, _percent: f64) {}

    fn on_track_error(&self, _item: &CollectionItem, _error: &anyhow::Error) {}

    /// Total-collection progress: `done` items have finished or failed.
    fn on_collection_progress(&self, _done: usize, _total: usize) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl DownloadObserver for NoopObserver {}
