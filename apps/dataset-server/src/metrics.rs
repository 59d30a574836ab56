use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

pub static DATA_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    let c = IntCounterVec::new(
        Opts::new(
            "dataset_data_requests_total",
            "dataset page requests by outcome",
        ),
        &["result"],
    )
    .expect("valid metric");
    REGISTRY.register(Box::new(c.clone())).ok();
    c
});

pub static ROWS_SERVED: Lazy<IntCounter> = Lazy::new(|| {
    let c = IntCounter::with_opts(Opts::new(
        "dataset_rows_served_total",
        "rows returned across all page requests",
    ))
    .expect("valid metric");
    REGISTRY.register(Box::new(c.clone())).ok();
    c
});

pub static SEED_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    let c = IntCounterVec::new(
        Opts::new("dataset_seed_runs_total", "init_db calls by outcome"),
        &["result"],
    )
    .expect("valid metric");
    REGISTRY.register(Box::new(c.clone())).ok();
    c
});

pub fn gather() -> Vec<u8> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!(error = %err, "metrics encode error");
    }
    buffer
}
