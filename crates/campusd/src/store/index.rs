//! Document index with embedding-based similarity search.
//!
//! Passages are stored with their embedding as a little-endian f32
//! BLOB; search embeds the query and ranks by cosine similarity with a
//! full scan. The corpus is a few thousand passages at most, so a scan
//! beats carrying a vector-index dependency.

use super::{Db, DocumentIndex, StoreError};
use crate::llm::TextGenerator;
use anyhow::Result;
use async_trait::async_trait;
use campus_common::Passage;
use std::sync::Arc;
use tracing::info;

pub struct SqliteDocumentIndex {
    db: Db,
    embedder: Arc<dyn TextGenerator>,
}

impl SqliteDocumentIndex {
    pub fn new(db: Db, embedder: Arc<dyn TextGenerator>) -> Self {
        Self { db, embedder }
    }

    /// Embed and store one passage. Used by provisioning and tests;
    /// bulk ingestion lives outside the daemon.
    pub async fn upsert_passage(&self, source: &str, content: &str) -> Result<()> {
        let embedding = self.embedder.embed(content).await?;
        let blob = encode_embedding(&embedding);

        let conn = self.db.lock().unwrap();
        conn.execute(
            "INSERT INTO passages (source, content, embedding) VALUES (?1, ?2, ?3)",
            rusqlite::params![source, content, blob],
        )?;
        Ok(())
    }

    pub fn passage_count(&self) -> Result<usize, StoreError> {
        let conn = self.db.lock().unwrap();
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM passages", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[async_trait]
impl DocumentIndex for SqliteDocumentIndex {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<Passage>, StoreError> {
        let query_embedding = match self.embedder.embed(query).await {
            Ok(e) => e,
            Err(e) => {
                // Degrade to an empty result set; the answerer copes
                info!("Query embedding failed, returning no passages: {:#}", e);
                return Ok(vec![]);
            }
        };

        let rows = {
            let conn = self.db.lock().unwrap();
            let mut stmt =
                conn.prepare("SELECT source, content, embedding FROM passages")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Vec<u8>>(2)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        let mut scored: Vec<Passage> = rows
            .into_iter()
            .map(|(source, text, blob)| {
                let embedding = decode_embedding(&blob);
                let score = cosine_similarity(&query_embedding, &embedding);
                Passage {
                    source,
                    text,
                    score,
                }
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        Ok(scored)
    }
}

fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn decode_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::super::open_in_memory;
    use super::*;
    use crate::llm::GenerateOutcome;
    use std::sync::Mutex;

    /// Embedder that maps known phrases to fixed unit vectors.
    struct KeyedEmbedder {
        fail: Mutex<bool>,
    }

    impl KeyedEmbedder {
        fn new() -> Self {
            Self {
                fail: Mutex::new(false),
            }
        }

        fn set_failing(&self) {
            *self.fail.lock().unwrap() = true;
        }
    }

    #[async_trait]
    impl TextGenerator for KeyedEmbedder {
        async fn generate(&self, _prompt: &str) -> GenerateOutcome {
            GenerateOutcome::failure("not a generator")
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if *self.fail.lock().unwrap() {
                anyhow::bail!("embedder offline");
            }
            // Orthogonal axes per topic keyword
            if text.contains("tuition") {
                Ok(vec![1.0, 0.0, 0.0])
            } else if text.contains("dormitory") {
                Ok(vec![0.0, 1.0, 0.0])
            } else {
                Ok(vec![0.577, 0.577, 0.577])
            }
        }
    }

    #[tokio::test]
    async fn test_search_ranks_by_similarity() {
        let embedder = Arc::new(KeyedEmbedder::new());
        let index = SqliteDocumentIndex::new(open_in_memory().unwrap(), embedder);

        index
            .upsert_passage("fees.pdf", "tuition is due in September")
            .await
            .unwrap();
        index
            .upsert_passage("housing.pdf", "dormitory applications open in June")
            .await
            .unwrap();

        let hits = index.search("how much is tuition", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].source, "fees.pdf");
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn test_search_truncates_to_k() {
        let embedder = Arc::new(KeyedEmbedder::new());
        let index = SqliteDocumentIndex::new(open_in_memory().unwrap(), embedder);

        for i in 0..5 {
            index
                .upsert_passage("doc.pdf", &format!("tuition note {}", i))
                .await
                .unwrap();
        }

        let hits = index.search("tuition", 3).await.unwrap();
        assert_eq!(hits.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_index_returns_empty() {
        let embedder = Arc::new(KeyedEmbedder::new());
        let index = SqliteDocumentIndex::new(open_in_memory().unwrap(), embedder);
        assert!(index.search("anything", 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_embed_failure_degrades_to_empty() {
        let embedder = Arc::new(KeyedEmbedder::new());
        let index =
            SqliteDocumentIndex::new(open_in_memory().unwrap(), embedder.clone());

        index
            .upsert_passage("fees.pdf", "tuition is due in September")
            .await
            .unwrap();
        embedder.set_failing();

        let hits = index.search("tuition", 3).await.unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_embedding_codec_round_trip() {
        let original = vec![0.25f32, -1.5, 3.0];
        assert_eq!(decode_embedding(&encode_embedding(&original)), original);
    }

    #[test]
    fn test_cosine_edge_cases() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
    }
}
