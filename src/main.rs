//! Lazy TTL Cache soak run
//!
//! Hammers one shared cache from concurrent tasks with short TTLs and prints
//! a JSON report of what the lazy sweep reclaimed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lazy_ttl_cache::{CacheConfig, CacheStats, SoakConfig, TtlCache};

/// Final output of a soak run.
#[derive(Debug, Serialize)]
struct SoakReport {
    generated_at: String,
    refresh_on_read: bool,
    workload: SoakConfig,
    callback_evictions: u64,
    hit_rate: f64,
    stats: CacheStats,
}

/// Entry point for the soak run.
///
/// # Sequence
/// 1. Initialize tracing subscriber
/// 2. Load cache and workload configuration from the environment
/// 3. Spawn worker tasks sharing one cache
/// 4. Wait for all workers and print the report
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lazy_ttl_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cache_config = CacheConfig::from_env().context("loading cache configuration")?;
    let workload = SoakConfig::from_env().context("loading soak workload")?;
    info!(
        "Configuration loaded: refresh_on_read={}, workers={}, keys={}, ops_per_worker={}, ttl={}ms",
        cache_config.refresh_on_read,
        workload.workers,
        workload.keys,
        workload.ops_per_worker,
        workload.ttl_ms
    );

    let cache: Arc<TtlCache<String, u64>> = Arc::new(TtlCache::with_config(cache_config));
    let evictions = Arc::new(AtomicU64::new(0));
    {
        let evictions = Arc::clone(&evictions);
        cache.on_evicted(move |key, _value| {
            evictions.fetch_add(1, Ordering::Relaxed);
            debug!(%key, "entry expired");
        });
    }

    let mut handles = Vec::with_capacity(workload.workers);
    for worker in 0..workload.workers {
        let cache = Arc::clone(&cache);
        let workload = workload.clone();
        handles.push(tokio::spawn(async move { run_worker(worker, &cache, &workload).await }));
    }

    for (worker, handle) in handles.into_iter().enumerate() {
        handle
            .await
            .with_context(|| format!("worker {worker} did not finish"))?;
    }

    // One last read sweeps whatever expired after the final operations
    tokio::time::sleep(workload.ttl()).await;
    cache.get("");

    let stats = cache.stats();
    let report = SoakReport {
        generated_at: chrono::Utc::now().to_rfc3339(),
        refresh_on_read: cache.refresh_on_read(),
        workload,
        callback_evictions: evictions.load(Ordering::Relaxed),
        hit_rate: stats.hit_rate(),
        stats,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("serializing soak report")?
    );

    info!("Soak run complete");
    Ok(())
}

/// Alternates writes and reads over a worker-specific walk of the key space.
async fn run_worker(worker: usize, cache: &TtlCache<String, u64>, workload: &SoakConfig) {
    let mut cursor = worker as u64;
    for op in 0..workload.ops_per_worker {
        // Cheap LCG step so workers touch keys in different orders
        cursor = cursor
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let key = format!("key-{}", (cursor >> 33) as usize % workload.keys);

        if op % 3 == 0 {
            cache.put(key, cursor, workload.ttl());
        } else {
            cache.get(&key);
        }

        tokio::time::sleep(workload.op_interval()).await;
    }
    debug!(worker, "worker finished");
}
