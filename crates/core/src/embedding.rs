use crate::text::fold_ascii;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 384;

/// Opaque text-to-vector capability. Implementations must be deterministic:
/// encoding the same text twice yields the same vector, which is what makes
/// memoization by exact input safe.
pub trait Embedder {
    fn dimensions(&self) -> usize;
    fn embed(&self, text: &str) -> Vec<f32>;
}

/// Local feature-hashing embedder over accent-folded, lowercased word
/// unigrams and bigrams, L2-normalized. A stand-in with the same contract
/// as a remote sentence-similarity model.
#[derive(Debug, Clone, Copy)]
pub struct HashedNgramEmbedder {
    pub dimensions: usize,
}

impl Default for HashedNgramEmbedder {
    fn default() -> Self {
        Self {
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        }
    }
}

impl Embedder for HashedNgramEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0f32; self.dimensions.max(1)];
        let folded = fold_ascii(text).to_lowercase();
        let words: Vec<&str> = folded.split_whitespace().collect();

        if words.is_empty() {
            return vector;
        }

        for word in &words {
            bump(&mut vector, word);
        }
        for pair in words.windows(2) {
            bump(&mut vector, &format!("{} {}", pair[0], pair[1]));
        }

        let magnitude = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut vector {
                *value /= magnitude;
            }
        }

        vector
    }
}

fn bump(vector: &mut [f32], token: &str) {
    let mut hasher = DefaultHasher::new();
    token.hash(&mut hasher);
    let bucket = (hasher.finish() % vector.len() as u64) as usize;
    vector[bucket] += 1.0;
}

pub const DEFAULT_CACHE_CAPACITY: usize = 4096;

/// Memoizing wrapper around an embedder, keyed by exact input text.
///
/// The cache is bounded: when full it is emptied wholesale before the next
/// insert. Within a session the same corpus is usually re-encoded across
/// consecutive queries, which is the case this exists for.
pub struct EmbeddingIndex<E> {
    embedder: E,
    cache: HashMap<String, Vec<f32>>,
    capacity: usize,
}

impl<E: Embedder> EmbeddingIndex<E> {
    pub fn new(embedder: E) -> Self {
        Self::with_capacity(embedder, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(embedder: E, capacity: usize) -> Self {
        Self {
            embedder,
            cache: HashMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.embedder.dimensions()
    }

    /// Encode a batch, in order. An empty batch never touches the embedder.
    pub fn encode(&mut self, texts: &[String]) -> Vec<Vec<f32>> {
        texts.iter().map(|text| self.encode_one(text)).collect()
    }

    pub fn encode_one(&mut self, text: &str) -> Vec<f32> {
        if let Some(hit) = self.cache.get(text) {
            return hit.clone();
        }

        let vector = self.embedder.embed(text);

        if self.cache.len() >= self.capacity {
            self.cache.clear();
        }
        self.cache.insert(text.to_string(), vector.clone());

        vector
    }

    pub fn invalidate(&mut self) {
        self.cache.clear();
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn embedder_is_deterministic() {
        let embedder = HashedNgramEmbedder::default();
        let first = embedder.embed("Mantenimiento de la red vial terciaria");
        let second = embedder.embed("Mantenimiento de la red vial terciaria");
        assert_eq!(first, second);
    }

    #[test]
    fn embedder_outputs_configured_length() {
        let embedder = HashedNgramEmbedder { dimensions: 64 };
        assert_eq!(embedder.embed("interventoría").len(), 64);
    }

    #[test]
    fn accented_and_folded_spellings_embed_identically() {
        let embedder = HashedNgramEmbedder::default();
        assert_eq!(embedder.embed("educación rural"), embedder.embed("educacion rural"));
    }

    struct CountingEmbedder {
        calls: Cell<usize>,
    }

    impl Embedder for CountingEmbedder {
        fn dimensions(&self) -> usize {
            4
        }

        fn embed(&self, text: &str) -> Vec<f32> {
            self.calls.set(self.calls.get() + 1);
            vec![text.len() as f32, 0.0, 0.0, 0.0]
        }
    }

    #[test]
    fn repeated_text_is_embedded_once() {
        let mut index = EmbeddingIndex::new(CountingEmbedder {
            calls: Cell::new(0),
        });

        let texts = vec!["obra civil".to_string(), "obra civil".to_string()];
        let vectors = index.encode(&texts);
        index.encode_one("obra civil");

        assert_eq!(vectors[0], vectors[1]);
        assert_eq!(index.cached(), 1);

        assert_eq!(index.embedder.calls.get(), 1);
    }

    #[test]
    fn empty_batch_returns_empty_without_model_calls() {
        let mut index = EmbeddingIndex::new(CountingEmbedder {
            calls: Cell::new(0),
        });

        assert!(index.encode(&[]).is_empty());
        assert_eq!(index.embedder.calls.get(), 0);
    }

    #[test]
    fn full_cache_is_emptied_before_inserting() {
        let mut index = EmbeddingIndex::with_capacity(HashedNgramEmbedder { dimensions: 8 }, 2);

        index.encode_one("uno");
        index.encode_one("dos");
        assert_eq!(index.cached(), 2);

        index.encode_one("tres");
        assert_eq!(index.cached(), 1);
    }
}
