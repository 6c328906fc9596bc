use std::sync::Arc;

use actix_web::{error, web, App, HttpResponse, HttpServer, Responder, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

use code_allocator::allocator::{self, SequentialCodeAllocator, DEFAULT_WIDTH};
use code_allocator::cache::{CacheStatus, TtlCache};
use code_allocator::metrics;
use code_allocator::prefix_rule::PrefixRule;
use code_allocator::prefix_rule_manager::PrefixRuleManager;
use code_allocator::record::{Record, RecordKind};
use code_allocator::record_store::{InMemoryRecordStore, RecordStore, RecordStoreError};
use code_allocator::redis_prefix_rule_manager::RedisPrefixRuleManager;
use code_allocator::sequence_generator::{RedisSequenceGenerator, SequenceGenerator};

type Rules = web::Data<Arc<dyn PrefixRuleManager>>;
type Sequences = web::Data<Arc<dyn SequenceGenerator>>;
type Records = web::Data<Arc<dyn RecordStore>>;
type RuleCache = web::Data<TtlCache<RecordKind, PrefixRule>>;

const RULE_CACHE_TTL_MINUTES: i64 = 60;

#[derive(Debug, Deserialize)]
struct RegisterRulePayload {
    prefix: String,
    width: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CodeResponse {
    code: String,
}

fn parse_kind(raw: &str) -> Result<RecordKind> {
    raw.parse::<RecordKind>().map_err(error::ErrorBadRequest)
}

async fn lookup_rule(kind: RecordKind, rules: &Rules, cache: &RuleCache) -> Result<PrefixRule> {
    let manager = rules.get_ref().clone();
    let (rule, status) = cache
        .get_or_fetch(kind, || async move {
            match manager.get(kind).await {
                Ok(Some(rule)) => Ok(rule),
                Ok(None) => Err(error::ErrorNotFound(format!(
                    "no prefix rule registered for {kind}"
                ))),
                Err(e) => Err(error::ErrorInternalServerError(e)),
            }
        })
        .await?;

    let outcome = match status {
        CacheStatus::Hit => "hit",
        CacheStatus::Miss => "miss",
    };
    metrics::RULE_CACHE_LOOKUPS.with_label_values(&[outcome]).inc();
    Ok(rule)
}

async fn register_prefix_rule(
    kind: web::Path<String>,
    payload: web::Json<RegisterRulePayload>,
    rules: Rules,
    sequences: Sequences,
    records: Records,
    cache: RuleCache,
) -> Result<impl Responder> {
    let kind = parse_kind(&kind)?;
    let payload = payload.into_inner();
    let rule = PrefixRule::new(payload.prefix, payload.width.unwrap_or(DEFAULT_WIDTH))
        .map_err(error::ErrorBadRequest)?;

    rules
        .register(kind, rule.clone())
        .await
        .map_err(error::ErrorInternalServerError)?;

    // Seed the counter so counter allocation continues past codes that
    // predate the rule instead of restarting at 1.
    let snapshot = records
        .list(kind)
        .await
        .map_err(error::ErrorInternalServerError)?;
    let floor = allocator::max_suffix(&rule.prefix, snapshot.iter(), |r| r.code());
    sequences
        .initialize(&rule.prefix, floor)
        .await
        .map_err(error::ErrorInternalServerError)?;

    cache.insert(kind, rule.clone());
    info!(%kind, prefix = %rule.prefix, floor, "prefix rule registered");
    Ok(HttpResponse::Ok().json(rule))
}

// Scan-based preview: derived from the current snapshot, never consumes a
// number. Two callers previewing concurrently will see the same code; the
// counter path below is the one that hands out each number exactly once.
async fn preview_code(
    kind: web::Path<String>,
    rules: Rules,
    records: Records,
    cache: RuleCache,
) -> Result<impl Responder> {
    let kind = parse_kind(&kind)?;
    let rule = lookup_rule(kind, &rules, &cache).await?;

    let snapshot = records
        .list(kind)
        .await
        .map_err(error::ErrorInternalServerError)?;
    let code = SequentialCodeAllocator::with_width(rule.width).next_code(
        &rule.prefix,
        snapshot.iter(),
        |r| r.code(),
    );

    metrics::ALLOCATIONS
        .with_label_values(&[kind.as_str(), "preview"])
        .inc();
    Ok(web::Json(CodeResponse { code }))
}

async fn allocate_code(
    kind: web::Path<String>,
    rules: Rules,
    sequences: Sequences,
    cache: RuleCache,
) -> Result<impl Responder> {
    let kind = parse_kind(&kind)?;
    let rule = lookup_rule(kind, &rules, &cache).await?;

    let sequence = sequences
        .next(&rule.prefix)
        .await
        .map_err(error::ErrorInternalServerError)?;
    let code = allocator::format_code(&rule.prefix, sequence, rule.width);

    metrics::ALLOCATIONS
        .with_label_values(&[kind.as_str(), "counter"])
        .inc();
    info!(%kind, %code, "code allocated");
    Ok(web::Json(CodeResponse { code }))
}

async fn list_records(kind: web::Path<String>, records: Records) -> Result<impl Responder> {
    let kind = parse_kind(&kind)?;
    let snapshot = records
        .list(kind)
        .await
        .map_err(error::ErrorInternalServerError)?;
    Ok(web::Json(snapshot))
}

async fn insert_record(
    kind: web::Path<String>,
    payload: web::Json<serde_json::Value>,
    records: Records,
) -> Result<impl Responder> {
    let kind = parse_kind(&kind)?;
    let record =
        Record::from_kind_value(kind, payload.into_inner()).map_err(error::ErrorBadRequest)?;

    match records.insert(record).await {
        Ok(()) => Ok(HttpResponse::Created().finish()),
        Err(err @ RecordStoreError::DuplicateCode { .. }) => Err(error::ErrorConflict(err)),
        Err(err) => Err(error::ErrorInternalServerError(err)),
    }
}

async fn metrics_endpoint() -> Result<impl Responder> {
    let body = metrics::render().map_err(error::ErrorInternalServerError)?;
    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(body))
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/prefix-rules/{kind}", web::put().to(register_prefix_rule))
        .route("/api/codes/{kind}/next", web::get().to(preview_code))
        .route("/api/codes/{kind}", web::post().to(allocate_code))
        .route("/api/records/{kind}", web::get().to(list_records))
        .route("/api/records/{kind}", web::post().to(insert_record))
        .route("/metrics", web::get().to(metrics_endpoint));
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    metrics::register_process_collector();

    let redis_url =
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379/".to_string());
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let rules: Arc<dyn PrefixRuleManager> = Arc::new(
        RedisPrefixRuleManager::new(&redis_url)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?,
    );
    let sequences: Arc<dyn SequenceGenerator> = Arc::new(
        RedisSequenceGenerator::new(&redis_url)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?,
    );
    // Record collections belong to the order-management backend; until that
    // feed is wired in, the service runs against an in-process store.
    let records: Arc<dyn RecordStore> = Arc::new(InMemoryRecordStore::new());

    let rules_data: Rules = web::Data::new(rules);
    let sequences_data: Sequences = web::Data::new(sequences);
    let records_data: Records = web::Data::new(records);
    let cache: RuleCache = web::Data::new(TtlCache::with_system_clock(Duration::minutes(
        RULE_CACHE_TTL_MINUTES,
    )));

    info!(%bind_addr, "code allocator listening");
    HttpServer::new(move || {
        App::new()
            .app_data(rules_data.clone())
            .app_data(sequences_data.clone())
            .app_data(records_data.clone())
            .app_data(cache.clone())
            .configure(routes)
    })
    .bind(bind_addr)?
    .run()
    .await
}
