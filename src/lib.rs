pub mod allocator;
pub mod cache;
pub mod metrics;
pub mod prefix_rule;
pub mod prefix_rule_manager;
pub mod record;
pub mod record_store;
pub mod redis_prefix_rule_manager;
pub mod sequence_generator;

pub use allocator::{format_code, max_suffix, SequentialCodeAllocator, DEFAULT_WIDTH};
pub use cache::{CacheStatus, Clock, SystemClock, TtlCache};
pub use prefix_rule::{PrefixRule, PrefixRuleError};
pub use prefix_rule_manager::{InMemoryPrefixRuleManager, PrefixRuleManager, RuleStoreError};
pub use record::{AccountStatus, Customer, Product, Record, RecordKind, Salesman, UnknownKind};
pub use record_store::{InMemoryRecordStore, RecordStore, RecordStoreError};
pub use redis_prefix_rule_manager::RedisPrefixRuleManager;
pub use sequence_generator::{
    InMemorySequenceGenerator, RedisSequenceGenerator, SequenceError, SequenceGenerator,
};
