use async_trait::async_trait;
use redis::{AsyncCommands, Client};
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SequenceError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("sequence store lock poisoned")]
    Poisoned,
}

/// Authoritative per-prefix numbering. Unlike a scan over existing records,
/// the counter cannot hand the same number to two concurrent callers.
#[async_trait]
pub trait SequenceGenerator: Send + Sync {
    /// Advance the counter for `prefix` and return the new value.
    async fn next(&self, prefix: &str) -> Result<u64, SequenceError>;

    /// Seed the counter to `floor` if it has never been set. Allocation then
    /// continues from `floor + 1`, past any codes minted before the counter
    /// existed. A counter that already exists is left untouched.
    async fn initialize(&self, prefix: &str, floor: u64) -> Result<(), SequenceError>;
}

pub struct RedisSequenceGenerator {
    client: Client,
}

impl RedisSequenceGenerator {
    pub fn new(redis_url: &str) -> Result<Self, SequenceError> {
        Ok(RedisSequenceGenerator {
            client: Client::open(redis_url)?,
        })
    }

    fn key(prefix: &str) -> String {
        format!("seq:{prefix}")
    }
}

#[async_trait]
impl SequenceGenerator for RedisSequenceGenerator {
    async fn next(&self, prefix: &str) -> Result<u64, SequenceError> {
        // INCR is atomic, so concurrent allocators for the same prefix can
        // never observe the same value. Counter gaps after a failed record
        // create are accepted; the numbering only has to move forward.
        let mut conn = self.client.get_async_connection().await?;
        let next: u64 = conn.incr(Self::key(prefix), 1).await?;
        Ok(next)
    }

    async fn initialize(&self, prefix: &str, floor: u64) -> Result<(), SequenceError> {
        let mut conn = self.client.get_async_connection().await?;
        let _: bool = conn.set_nx(Self::key(prefix), floor).await?;
        Ok(())
    }
}

pub struct InMemorySequenceGenerator {
    counters: Mutex<HashMap<String, u64>>,
}

impl InMemorySequenceGenerator {
    pub fn new() -> Self {
        InMemorySequenceGenerator {
            counters: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl SequenceGenerator for InMemorySequenceGenerator {
    async fn next(&self, prefix: &str) -> Result<u64, SequenceError> {
        let mut counters = self.counters.lock().map_err(|_| SequenceError::Poisoned)?;
        let counter = counters.entry(prefix.to_string()).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }

    async fn initialize(&self, prefix: &str, floor: u64) -> Result<(), SequenceError> {
        let mut counters = self.counters.lock().map_err(|_| SequenceError::Poisoned)?;
        counters.entry(prefix.to_string()).or_insert(floor);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_generator_produces_consecutive_numbers() {
        let generator = InMemorySequenceGenerator::new();

        for expected in 1..=10 {
            assert_eq!(generator.next("SM").await.unwrap(), expected);
        }
    }

    #[tokio::test]
    async fn test_prefixes_count_independently() {
        let generator = InMemorySequenceGenerator::new();

        assert_eq!(generator.next("SM").await.unwrap(), 1);
        assert_eq!(generator.next("APPU").await.unwrap(), 1);
        assert_eq!(generator.next("SM").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_initialize_floors_a_fresh_counter() {
        let generator = InMemorySequenceGenerator::new();

        generator.initialize("SM", 7).await.unwrap();
        assert_eq!(generator.next("SM").await.unwrap(), 8);
    }

    #[tokio::test]
    async fn test_initialize_never_rewinds_an_existing_counter() {
        let generator = InMemorySequenceGenerator::new();

        generator.next("SM").await.unwrap();
        generator.next("SM").await.unwrap();
        generator.initialize("SM", 0).await.unwrap();
        assert_eq!(generator.next("SM").await.unwrap(), 3);
    }

    // Needs a live server at redis://127.0.0.1/; run with
    // `cargo test -- --ignored`.
    #[tokio::test]
    #[ignore]
    async fn test_redis_counter_increments() {
        let generator = RedisSequenceGenerator::new("redis://127.0.0.1/").unwrap();

        let first = generator.next("TEST_SEQ").await.unwrap();
        let second = generator.next("TEST_SEQ").await.unwrap();
        assert_eq!(second, first + 1);

        let mut conn = generator.client.get_async_connection().await.unwrap();
        let _: () = redis::cmd("DEL")
            .arg(RedisSequenceGenerator::key("TEST_SEQ"))
            .query_async(&mut conn)
            .await
            .unwrap();
    }
}
