//! Conversation source backed by a directory tree.
//!
//! ```text
//! <root>/<category>/index.json    listing of the category's conversations
//! <root>/<category>/<slug>.json   messages of one conversation
//! ```
//!
//! The raw text of `index.json` doubles as the category's change token.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::chat::{ConversationSummary, Manifest, Message, Platform};
use crate::error::SourceError;

use super::{Parser, SourcePoller};

const INDEX_FILE: &str = "index.json";

/// One entry of `index.json`
#[derive(Debug, Deserialize)]
struct IndexEntry {
    slug: String,
    name: String,
    #[serde(default)]
    platform: Option<Platform>,
    #[serde(default)]
    message_count: usize,
    #[serde(default)]
    last_message_time: Option<NaiveDateTime>,
    #[serde(default)]
    preview: String,
}

#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<category>:<slug>`
    pub fn conversation_id(category: &str, slug: &str) -> String {
        format!("{}:{}", category, slug)
    }

    fn split_id(id: &str) -> Result<(&str, &str), SourceError> {
        let (category, slug) = id
            .split_once(':')
            .ok_or_else(|| SourceError::InvalidId(id.to_string()))?;
        if !is_safe_segment(category) || !is_safe_segment(slug) {
            return Err(SourceError::InvalidId(id.to_string()));
        }
        Ok((category, slug))
    }

    fn category_dir(&self, category: &str) -> Result<PathBuf, SourceError> {
        if !is_safe_segment(category) {
            return Err(SourceError::UnknownCategory(category.to_string()));
        }
        Ok(self.root.join(category))
    }
}

/// A single path component that stays inside its parent
fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\', ':', '\0'])
}

async fn read(path: &Path) -> Result<String, SourceError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })
}

impl SourcePoller for FsSource {
    async fn categories(&self) -> Result<Vec<String>, SourceError> {
        let io_err = |source: io::Error| SourceError::Io {
            path: self.root.clone(),
            source,
        };
        let mut entries = tokio::fs::read_dir(&self.root).await.map_err(io_err)?;

        let mut categories = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if is_safe_segment(&name)
                && tokio::fs::try_exists(entry.path().join(INDEX_FILE))
                    .await
                    .unwrap_or(false)
            {
                categories.push(name);
            }
        }
        categories.sort();
        Ok(categories)
    }

    async fn fetch_manifest(&self, category: &str) -> Result<Manifest, SourceError> {
        let path = self.category_dir(category)?.join(INDEX_FILE);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SourceError::UnknownCategory(category.to_string()));
            }
            Err(source) => return Err(SourceError::Io { path, source }),
        };
        let entries: Vec<IndexEntry> =
            serde_json::from_str(&raw).map_err(|source| SourceError::Malformed {
                path: path.clone(),
                source,
            })?;

        let mut conversations = Vec::with_capacity(entries.len());
        for entry in entries {
            if !is_safe_segment(&entry.slug) {
                tracing::warn!("Ignoring entry with invalid slug '{}' in {}", entry.slug, path.display());
                continue;
            }
            conversations.push(ConversationSummary {
                id: Self::conversation_id(category, &entry.slug),
                name: entry.name,
                platform: entry
                    .platform
                    .unwrap_or_else(|| Platform::from_category(category)),
                category: category.to_string(),
                message_count: entry.message_count,
                last_message_time: entry.last_message_time,
                preview: entry.preview,
            });
        }

        Ok(Manifest {
            category: category.to_string(),
            conversations,
            change_token: raw,
        })
    }
}

impl Parser for FsSource {
    async fn messages(&self, conversation_id: &str) -> Result<Arc<[Message]>, SourceError> {
        let (category, slug) = Self::split_id(conversation_id)?;
        let path = self.category_dir(category)?.join(format!("{}.json", slug));
        let raw = read(&path).await?;
        let mut messages: Vec<Message> =
            serde_json::from_str(&raw).map_err(|source| SourceError::Malformed {
                path: path.clone(),
                source,
            })?;
        // Stable: messages sharing a timestamp keep their export order
        messages.sort_by_key(|m| m.timestamp);
        tracing::debug!("Parsed {} messages from {}", messages.len(), path.display());
        Ok(Arc::from(messages))
    }
}
