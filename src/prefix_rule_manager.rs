use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;

use crate::prefix_rule::PrefixRule;
use crate::record::RecordKind;

#[derive(Debug, Error)]
pub enum RuleStoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("stored rule is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("rule store lock poisoned")]
    Poisoned,
}

#[async_trait]
pub trait PrefixRuleManager: Send + Sync {
    async fn register(&self, kind: RecordKind, rule: PrefixRule) -> Result<(), RuleStoreError>;
    async fn get(&self, kind: RecordKind) -> Result<Option<PrefixRule>, RuleStoreError>;
}

pub struct InMemoryPrefixRuleManager {
    rules: RwLock<HashMap<RecordKind, PrefixRule>>,
}

impl InMemoryPrefixRuleManager {
    pub fn new() -> Self {
        InMemoryPrefixRuleManager {
            rules: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl PrefixRuleManager for InMemoryPrefixRuleManager {
    async fn register(&self, kind: RecordKind, rule: PrefixRule) -> Result<(), RuleStoreError> {
        let mut rules = self.rules.write().map_err(|_| RuleStoreError::Poisoned)?;
        rules.insert(kind, rule);
        Ok(())
    }

    async fn get(&self, kind: RecordKind) -> Result<Option<PrefixRule>, RuleStoreError> {
        let rules = self.rules.read().map_err(|_| RuleStoreError::Poisoned)?;
        Ok(rules.get(&kind).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_and_get_rule() {
        let manager = InMemoryPrefixRuleManager::new();
        let rule = PrefixRule::new("SM", 4).unwrap();

        manager
            .register(RecordKind::Salesman, rule.clone())
            .await
            .unwrap();

        let retrieved = manager.get(RecordKind::Salesman).await.unwrap();
        assert_eq!(retrieved, Some(rule));
    }

    #[tokio::test]
    async fn test_get_unregistered_kind_is_none() {
        let manager = InMemoryPrefixRuleManager::new();
        assert_eq!(manager.get(RecordKind::Product).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_register_replaces_existing_rule() {
        let manager = InMemoryPrefixRuleManager::new();
        manager
            .register(RecordKind::Customer, PrefixRule::new("APPU", 4).unwrap())
            .await
            .unwrap();
        manager
            .register(RecordKind::Customer, PrefixRule::new("ORDA", 4).unwrap())
            .await
            .unwrap();

        let retrieved = manager.get(RecordKind::Customer).await.unwrap().unwrap();
        assert_eq!(retrieved.prefix, "ORDA");
    }
}
