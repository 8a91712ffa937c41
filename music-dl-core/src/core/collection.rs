use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::core::events::DownloadObserver;
use crate::core::progress::{Checkpoints, ProgressFn};
use crate::error::CoreError;
use crate::models::media::CollectionItem;

/// A playlist or album whose items are downloaded one after another.
#[async_trait]
pub trait CollectionSource: Send + Sync {
    async fn list_items(&self) -> anyhow::Result<Vec<CollectionItem>>;

    /// Finds a downloadable URL for `item`, or `None` when nothing matches.
    async fn resolve_item(&self, item: &CollectionItem) -> anyhow::Result<Option<String>>;

    async fn fetch_item(
        &self,
        item: &CollectionItem,
        url: &str,
        on_progress: &ProgressFn<'_>,
    ) -> anyhow::Result<PathBuf>;
}

async fn download_item(
    source: &dyn CollectionSource,
    item: &CollectionItem,
    observer: &dyn DownloadObserver,
    checkpoints: &Mutex<Checkpoints>,
) -> anyhow::Result<PathBuf> {
    let url = source
        .resolve_item(item)
        .await?
        .ok_or_else(|| CoreError::NoMatchFound {
            query: item.meta().display_name(),
        })?;

    let relay = |pct: f64| {
        let reached = checkpoints.lock().ok().and_then(|mut c| c.advance(pct));
        if let Some(checkpoint) = reached {
            observer.on_track_progress(item, f64::from(checkpoint));
        }
    };

    source.fetch_item(item, &url, &relay).await
}

/// Downloads every item of `source` in listing order.
///
/// Only a failure to list the collection is returned as an error. A missing
/// match or a failed download is reported through `on_track_error` and the
/// next item still runs. The returned paths are the successful downloads,
/// in order.
pub async fn download_collection(
    source: &dyn CollectionSource,
    delay: Duration,
    observer: &dyn DownloadObserver,
) -> anyhow::Result<Vec<PathBuf>> {
    let items = source.list_items().await?;
    let total = items.len();
    observer.on_collection_start(&items);
    tracing::info!("collection has {} items", total);

    let mut paths = Vec::with_capacity(total);
    let mut done = 0;

    for (i, item) in items.iter().enumerate() {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        observer.on_track_start(item, i + 1, total);

        let checkpoints = Mutex::new(Checkpoints::new());
        match download_item(source, item, observer, &checkpoints).await {
            Ok(path) => {
                let forced = checkpoints.lock().ok().and_then(|mut c| c.complete());
                if let Some(checkpoint) = forced {
                    observer.on_track_progress(item, f64::from(checkpoint));
                }
                tracing::debug!("[{}/{}] {} -> {}", i + 1, total, item.key(), path.display());
                paths.push(path);
            }
            Err(e) => {
                tracing::warn!("[{}/{}] {} failed: {:#}", i + 1, total, item.key(), e);
                observer.on_track_error(item, &e);
            }
        }

        done += 1;
        observer.on_collection_progress(done, total);
    }

    Ok(paths)
}
