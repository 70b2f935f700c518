//! Paginated snapshot retrieval with a single retry on throttling.

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{SyncError, SyncResult};
use crate::model::{normalize_name, Named, Page};

/// Wait applied when a throttled provider does not say how long to back off.
pub const DEFAULT_MIN_BACKOFF: Duration = Duration::from_secs(1);

/// Follows continuation tokens until a provider listing is exhausted.
#[derive(Debug, Clone)]
pub struct PagedFetcher {
    min_backoff: Duration,
}

impl Default for PagedFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_BACKOFF)
    }
}

impl PagedFetcher {
    #[must_use]
    pub fn new(min_backoff: Duration) -> Self {
        Self { min_backoff }
    }

    /// Fetches every page and concatenates the items in provider order.
    ///
    /// `fetch_page` receives the continuation token of the previous page
    /// (`None` first). A throttled page is retried once after the requested
    /// backoff; any second failure, and any non-throttling failure, is
    /// returned as [`SyncError::Fetch`].
    pub async fn fetch_all<T, F, Fut>(&self, operation: &str, mut fetch_page: F) -> SyncResult<Vec<T>>
    where
        F: FnMut(Option<String>) -> Fut,
        Fut: Future<Output = SyncResult<Page<T>>>,
    {
        let mut items = Vec::new();
        let mut token: Option<String> = None;
        let mut pages = 0u32;

        loop {
            let page = self
                .fetch_page_with_retry(operation, &mut fetch_page, token.clone())
                .await?;
            pages += 1;
            debug!(
                operation = operation,
                page = pages,
                items = page.items.len(),
                "Fetched page"
            );
            items.extend(page.items);

            match page.next_token {
                Some(next) if token.as_deref() == Some(next.as_str()) => {
                    return Err(SyncError::Fetch {
                        operation: operation.to_string(),
                        message: format!("continuation token '{next}' did not advance"),
                    });
                }
                Some(next) => token = Some(next),
                None => break,
            }
        }

        debug!(operation = operation, pages, total = items.len(), "Listing exhausted");
        Ok(items)
    }

    /// Like [`fetch_all`](Self::fetch_all), keeping the first entry of each
    /// normalized name.
    pub async fn fetch_snapshot<T, F, Fut>(&self, operation: &str, fetch_page: F) -> SyncResult<Vec<T>>
    where
        T: Named,
        F: FnMut(Option<String>) -> Fut,
        Fut: Future<Output = SyncResult<Page<T>>>,
    {
        let items = self.fetch_all(operation, fetch_page).await?;
        Ok(dedup_by_name(items))
    }

    async fn fetch_page_with_retry<T, F, Fut>(
        &self,
        operation: &str,
        fetch_page: &mut F,
        token: Option<String>,
    ) -> SyncResult<Page<T>>
    where
        F: FnMut(Option<String>) -> Fut,
        Fut: Future<Output = SyncResult<Page<T>>>,
    {
        match fetch_page(token.clone()).await {
            Ok(page) => Ok(page),
            Err(e) if e.is_throttled() => {
                let delay = e.retry_after().unwrap_or(self.min_backoff);
                warn!(
                    operation = operation,
                    delay_secs = delay.as_secs_f64(),
                    "Throttled, retrying page once"
                );
                tokio::time::sleep(delay).await;

                fetch_page(token)
                    .await
                    .map_err(|e| escalate(operation, e))
            }
            Err(e) => Err(escalate(operation, e)),
        }
    }
}

/// Converts a page failure into the fatal fetch error.
fn escalate(operation: &str, error: SyncError) -> SyncError {
    match error {
        SyncError::Fetch { .. } => error,
        SyncError::Throttled { .. } => SyncError::Fetch {
            operation: operation.to_string(),
            message: "still throttled after retry".to_string(),
        },
        other => SyncError::Fetch {
            operation: operation.to_string(),
            message: other.to_string(),
        },
    }
}

/// Drops entries whose normalized name was already seen.
pub fn dedup_by_name<T: Named>(items: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(normalize_name(item.name())))
        .collect()
}
