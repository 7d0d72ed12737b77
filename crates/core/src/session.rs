use crate::client::{fetch_all, FetchReport, PageFetch};
use crate::corpus::Corpus;
use crate::datasets::Dataset;
use crate::embedding::{Embedder, EmbeddingIndex};
use crate::error::SearchError;
use crate::ranking::{rank, RankedMatch};
use crate::soql::SoqlQuery;
use std::collections::HashMap;
use tracing::debug;

pub const DEFAULT_FETCH_CACHE_CAPACITY: usize = 32;

/// Bounded cache of pagination walks, keyed by the full semantic content
/// of the request (resource plus rendered first-page parameters).
#[derive(Debug)]
pub struct FetchCache {
    entries: HashMap<String, FetchReport>,
    capacity: usize,
}

impl FetchCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn key(resource: &str, query: &SoqlQuery) -> String {
        let params = query
            .params(0)
            .into_iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("&");

        format!("{resource}?{params}")
    }

    pub fn get(&self, key: &str) -> Option<&FetchReport> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: String, report: FetchReport) {
        if self.entries.len() >= self.capacity {
            self.entries.clear();
        }
        self.entries.insert(key, report);
    }

    /// Explicit invalidation on a new user action.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A corpus together with the completeness of the walk that produced it.
#[derive(Debug)]
pub struct LoadOutcome<R> {
    pub corpus: Corpus<R>,
    /// False when transport failures truncated the fetch; the corpus holds
    /// whatever arrived before the failure.
    pub complete: bool,
}

/// Per-user-session pipeline state: transport, embedding memo, fetch memo.
///
/// Owned by the presentation layer, one instance per session; nothing here
/// is shared across sessions.
pub struct SearchSession<F, E> {
    api: F,
    index: EmbeddingIndex<E>,
    fetch_cache: FetchCache,
}

impl<F, E> SearchSession<F, E>
where
    F: PageFetch + Send + Sync,
    E: Embedder,
{
    pub fn new(api: F, embedder: E) -> Self {
        Self {
            api,
            index: EmbeddingIndex::new(embedder),
            fetch_cache: FetchCache::new(DEFAULT_FETCH_CACHE_CAPACITY),
        }
    }

    /// Invalidate fetched data at the start of a new user action. Embedding
    /// memoization survives: vectors depend only on their text.
    pub fn begin_action(&mut self) {
        self.fetch_cache.clear();
    }

    /// Fetch, sanitize, and type one dataset. Repeating the same query
    /// within an action is served from the cache; partial walks are not
    /// cached, so a retry after a transient failure refetches.
    pub async fn load<R: Dataset>(&mut self, query: &SoqlQuery) -> LoadOutcome<R> {
        let key = FetchCache::key(R::RESOURCE, query);

        let report = match self.fetch_cache.get(&key) {
            Some(hit) => {
                debug!(resource = R::RESOURCE, "fetch cache hit");
                hit.clone()
            }
            None => {
                let report = fetch_all(&self.api, R::RESOURCE, query).await;
                if report.complete {
                    self.fetch_cache.insert(key, report.clone());
                }
                report
            }
        };

        LoadOutcome {
            corpus: Corpus::from_raw(report.records),
            complete: report.complete,
        }
    }

    /// Encode the corpus text column and the query, then rank. An empty
    /// corpus short-circuits to an empty ranking.
    pub fn rank_corpus<R: Dataset>(
        &mut self,
        corpus: &Corpus<R>,
        query_text: &str,
        top_k: usize,
    ) -> Result<Vec<RankedMatch>, SearchError> {
        if corpus.is_empty() {
            return Ok(Vec::new());
        }

        let corpus_vectors = self.index.encode(&corpus.texts());
        let query_vector = self.index.encode_one(query_text);

        rank(&query_vector, &corpus_vectors, top_k)
    }

    pub fn embeddings(&mut self) -> &mut EmbeddingIndex<E> {
        &mut self.index
    }
}
