//! In-memory cache of parsed message sequences.

use std::sync::Arc;

use crate::chat::Message;
use crate::error::SourceError;

use super::Parser;

pub type SequenceCache = moka::future::Cache<String, Arc<[Message]>>;

/// Wraps a parser so re-opening a conversation doesn't re-read it.
///
/// Entries are invalidated by reconciliation when a conversation is updated or
/// removed, so a cached sequence is never newer than the manifest that listed it.
pub struct CachedParser<P> {
    inner: P,
    cache: SequenceCache,
}

impl<P: Parser> CachedParser<P> {
    pub fn new(inner: P, capacity: u64) -> Self {
        Self {
            inner,
            cache: moka::future::Cache::builder()
                .max_capacity(capacity)
                .build(),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P: Parser> Parser for CachedParser<P> {
    async fn messages(&self, conversation_id: &str) -> Result<Arc<[Message]>, SourceError> {
        if let Some(messages) = self.cache.get(conversation_id).await {
            return Ok(messages);
        }
        let messages = self.inner.messages(conversation_id).await?;
        self.cache
            .insert(conversation_id.to_string(), Arc::clone(&messages))
            .await;
        Ok(messages)
    }

    async fn invalidate(&self, conversation_id: &str) {
        self.cache.invalidate(conversation_id).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::types::fixtures::messages;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingParser {
        calls: AtomicUsize,
    }

    impl Parser for CountingParser {
        async fn messages(&self, conversation_id: &str) -> Result<Arc<[Message]>, SourceError> {
            if conversation_id == "bad" {
                return Err(SourceError::InvalidId(conversation_id.to_string()));
            }
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::from(messages(n + 1)))
        }
    }

    #[tokio::test]
    async fn test_second_read_is_cached() {
        let parser = CachedParser::new(CountingParser::default(), 8);
        assert_eq!(parser.messages("a").await.unwrap().len(), 1);
        assert_eq!(parser.messages("a").await.unwrap().len(), 1);
        assert_eq!(parser.inner().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_rereads() {
        let parser = CachedParser::new(CountingParser::default(), 8);
        parser.messages("a").await.unwrap();
        parser.invalidate("a").await;
        assert_eq!(parser.messages("a").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let parser = CachedParser::new(CountingParser::default(), 8);
        assert!(parser.messages("bad").await.is_err());
        assert!(parser.messages("bad").await.is_err());
        assert_eq!(parser.inner().calls.load(Ordering::SeqCst), 0);
    }
}
