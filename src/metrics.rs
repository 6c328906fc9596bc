use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

pub static ALLOCATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "code_allocations_total",
            "Codes handed out, by record kind and allocation path",
        ),
        &["kind", "path"],
    )
    .expect("allocation counter");
    REGISTRY
        .register(Box::new(counter.clone()))
        .expect("register allocation counter");
    counter
});

pub static RULE_CACHE_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "prefix_rule_cache_lookups_total",
            "Prefix rule cache lookups, by outcome",
        ),
        &["outcome"],
    )
    .expect("cache lookup counter");
    REGISTRY
        .register(Box::new(counter.clone()))
        .expect("register cache lookup counter");
    counter
});

pub fn register_process_collector() {
    // Registration can only fail on double-registration, which a restarting
    // worker may legitimately attempt.
    let _ = REGISTRY.register(Box::new(
        prometheus::process_collector::ProcessCollector::for_self(),
    ));
}

pub fn render() -> Result<String, prometheus::Error> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_appear_in_rendered_output() {
        ALLOCATIONS.with_label_values(&["salesman", "preview"]).inc();
        RULE_CACHE_LOOKUPS.with_label_values(&["miss"]).inc();

        let output = render().unwrap();
        assert!(output.contains("code_allocations_total"));
        assert!(output.contains("prefix_rule_cache_lookups_total"));
    }
}
