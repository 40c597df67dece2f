//! Collaborators that supply conversation listings and message sequences.

pub mod cache;
pub mod fs;

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use futures::stream::{self, StreamExt};

use crate::chat::{Manifest, Message};
use crate::constants::MANIFEST_FETCH_CONCURRENCY;
use crate::error::SourceError;

pub use cache::CachedParser;
pub use fs::FsSource;

/// Yields refreshed conversation listings, one manifest per category.
pub trait SourcePoller: Send + Sync + 'static {
    fn categories(&self) -> impl Future<Output = Result<Vec<String>, SourceError>> + Send;

    fn fetch_manifest(
        &self,
        category: &str,
    ) -> impl Future<Output = Result<Manifest, SourceError>> + Send;
}

/// Yields the full message sequence of a conversation, oldest first.
pub trait Parser: Send + Sync + 'static {
    fn messages(
        &self,
        conversation_id: &str,
    ) -> impl Future<Output = Result<Arc<[Message]>, SourceError>> + Send;

    /// Drop any cached copy of `conversation_id`
    fn invalidate(&self, _conversation_id: &str) -> impl Future<Output = ()> + Send {
        async {}
    }
}

/// Fetch the manifests of `categories` concurrently, in the given order.
pub async fn fetch_manifests<S: SourcePoller + ?Sized>(
    source: &S,
    categories: &[String],
) -> Vec<(String, Result<Manifest, SourceError>)> {
    stream::iter(categories.to_vec())
        .map(move |category| async move {
            let result = source.fetch_manifest(&category).await;
            (category, result)
        })
        .buffered(MANIFEST_FETCH_CONCURRENCY)
        .collect()
        .await
}

/// Fetch every category's manifest, skipping categories that fail.
pub async fn fetch_all<S: SourcePoller>(source: &S) -> Result<Vec<Manifest>, SourceError> {
    let categories = source.categories().await?;
    Ok(fetch_listed(source, &categories).await)
}

/// Like `fetch_all`, plus an empty manifest for every category in `known` that is no
/// longer listed, so reconciliation drops its conversations.
pub async fn relist_all<'a, S: SourcePoller>(
    source: &S,
    known: impl IntoIterator<Item = &'a str>,
) -> Result<Vec<Manifest>, SourceError> {
    let categories = source.categories().await?;
    let mut manifests = fetch_listed(source, &categories).await;
    manifests.extend(vanished_manifests(known, &categories));
    Ok(manifests)
}

/// Empty manifests for the categories of `known` missing from `listed`
pub fn vanished_manifests<'a>(
    known: impl IntoIterator<Item = &'a str>,
    listed: &[String],
) -> Vec<Manifest> {
    let listed: HashSet<&str> = listed.iter().map(String::as_str).collect();
    let mut vanished: Vec<Manifest> = Vec::new();
    for category in known {
        if listed.contains(category) || vanished.iter().any(|m| m.category == category) {
            continue;
        }
        tracing::debug!("Category '{}' disappeared", category);
        vanished.push(Manifest {
            category: category.to_string(),
            conversations: Vec::new(),
            change_token: String::new(),
        });
    }
    vanished
}

async fn fetch_listed<S: SourcePoller + ?Sized>(source: &S, categories: &[String]) -> Vec<Manifest> {
    let mut manifests = Vec::with_capacity(categories.len());
    for (category, result) in fetch_manifests(source, categories).await {
        match result {
            Ok(manifest) => manifests.push(manifest),
            Err(e) => tracing::warn!("Skipping category '{}': {}", category, e),
        }
    }
    manifests
}
