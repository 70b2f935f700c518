mod config;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use xavyo_connector_github::GitHubClient;
use xavyo_connector_identitystore::IdentityStoreClient;
use xavyo_directory_sync::{PagedFetcher, SyncEngine};

use crate::config::AppConfig;

#[tokio::main]
async fn main() {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,xavyo_directory_sync=debug")),
        )
        .init();

    // Load configuration
    let config = AppConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        std::process::exit(1);
    });

    tracing::info!(
        dry_run = config.sync.dry_run,
        organisation = %config.github.organisation,
        identity_store_id = %config.identity_store.identity_store_id,
        "starting directory sync"
    );

    let fetcher = PagedFetcher::new(config.sync.throttle_min_backoff);
    let source = GitHubClient::new(config.github)
        .unwrap_or_else(|e| {
            eprintln!("GitHub client error: {e}");
            std::process::exit(1);
        })
        .with_fetcher(fetcher);
    let target = IdentityStoreClient::new(config.identity_store).await;

    let engine = SyncEngine::new(Arc::new(source), Arc::new(target), config.sync);

    match engine.run().await {
        Ok(summary) => {
            tracing::info!(
                dry_run = summary.dry_run,
                groups_created = summary.groups.created,
                groups_deleted = summary.groups.deleted,
                users_created = summary.users.created,
                users_deleted = summary.users.deleted,
                memberships_created = summary.memberships.created,
                memberships_deleted = summary.memberships.deleted,
                failed = summary.failed(),
                "directory sync complete"
            );
            if summary.failed() > 0 {
                tracing::warn!(
                    failed = summary.failed(),
                    "some changes failed and will be retried on the next run"
                );
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "directory sync aborted");
            std::process::exit(1);
        }
    }
}
