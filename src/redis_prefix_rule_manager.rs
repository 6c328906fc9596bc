use async_trait::async_trait;
use redis::{AsyncCommands, Client};

use crate::prefix_rule::PrefixRule;
use crate::prefix_rule_manager::{PrefixRuleManager, RuleStoreError};
use crate::record::RecordKind;

/// Rule storage for deployments: one JSON value per kind under
/// `prefix_rule:{kind}`.
#[derive(Clone)]
pub struct RedisPrefixRuleManager {
    client: Client,
}

impl RedisPrefixRuleManager {
    pub fn new(redis_url: &str) -> Result<Self, RuleStoreError> {
        let client = Client::open(redis_url)?;
        Ok(RedisPrefixRuleManager { client })
    }

    fn key(kind: RecordKind) -> String {
        format!("prefix_rule:{kind}")
    }
}

#[async_trait]
impl PrefixRuleManager for RedisPrefixRuleManager {
    async fn register(&self, kind: RecordKind, rule: PrefixRule) -> Result<(), RuleStoreError> {
        let mut conn = self.client.get_async_connection().await?;
        let value = serde_json::to_string(&rule)?;
        let _: () = conn.set(Self::key(kind), value).await?;
        Ok(())
    }

    async fn get(&self, kind: RecordKind) -> Result<Option<PrefixRule>, RuleStoreError> {
        let mut conn = self.client.get_async_connection().await?;
        let raw: Option<String> = conn.get(Self::key(kind)).await?;
        raw.map(|value| serde_json::from_str(&value))
            .transpose()
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // These talk to a live server at redis://127.0.0.1/ and are ignored by
    // default; run with `cargo test -- --ignored` when one is available.

    #[tokio::test]
    #[ignore]
    async fn test_register_and_get_rule() {
        let manager = RedisPrefixRuleManager::new("redis://127.0.0.1/").unwrap();
        let rule = PrefixRule::new("SM", 4).unwrap();

        manager
            .register(RecordKind::Salesman, rule.clone())
            .await
            .unwrap();
        let retrieved = manager.get(RecordKind::Salesman).await.unwrap();
        assert_eq!(retrieved, Some(rule));

        let mut conn = manager.client.get_async_connection().await.unwrap();
        let _: () = redis::cmd("DEL")
            .arg(RedisPrefixRuleManager::key(RecordKind::Salesman))
            .query_async(&mut conn)
            .await
            .unwrap();
    }

    #[tokio::test]
    #[ignore]
    async fn test_get_missing_rule_is_none() {
        let manager = RedisPrefixRuleManager::new("redis://127.0.0.1/").unwrap();
        let retrieved = manager.get(RecordKind::Product).await.unwrap();
        assert!(retrieved.is_none());
    }
}
