use std::sync::atomic::{AtomicU64, Ordering};

use salvo::prelude::*;

use crate::web::app_state;

static VISITOR_COUNT_READS: AtomicU64 = AtomicU64::new(0);
static VISITOR_COUNT_INCREMENTS: AtomicU64 = AtomicU64::new(0);
static VISITOR_COUNT_FAILURES: AtomicU64 = AtomicU64::new(0);
static STORAGE_UNAVAILABLE: AtomicU64 = AtomicU64::new(0);
static QUOTES_SERVED: AtomicU64 = AtomicU64::new(0);
static QUOTE_FAILURES: AtomicU64 = AtomicU64::new(0);
static LAST_COUNT: AtomicU64 = AtomicU64::new(0);

pub struct Metrics;

impl Metrics {
    pub fn visitor_count_read(count: i64) {
        VISITOR_COUNT_READS.fetch_add(1, Ordering::Relaxed);
        Self::observe_count(count);
    }

    pub fn visitor_count_incremented(count: i64) {
        VISITOR_COUNT_INCREMENTS.fetch_add(1, Ordering::Relaxed);
        Self::observe_count(count);
    }

    pub fn visitor_count_failed(storage_unavailable: bool) {
        VISITOR_COUNT_FAILURES.fetch_add(1, Ordering::Relaxed);
        if storage_unavailable {
            STORAGE_UNAVAILABLE.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn quote_served() {
        QUOTES_SERVED.fetch_add(1, Ordering::Relaxed);
    }

    pub fn quote_failed() {
        QUOTE_FAILURES.fetch_add(1, Ordering::Relaxed);
    }

    // Requests finish out of order; keep the highest value seen.
    fn observe_count(count: i64) {
        LAST_COUNT.fetch_max(count.max(0) as u64, Ordering::Relaxed);
    }
}

pub fn format_prometheus(uptime_seconds: u64) -> String {
    let reads = VISITOR_COUNT_READS.load(Ordering::Relaxed);
    let increments = VISITOR_COUNT_INCREMENTS.load(Ordering::Relaxed);
    let failures = VISITOR_COUNT_FAILURES.load(Ordering::Relaxed);
    let unavailable = STORAGE_UNAVAILABLE.load(Ordering::Relaxed);
    let quotes_served = QUOTES_SERVED.load(Ordering::Relaxed);
    let quote_failures = QUOTE_FAILURES.load(Ordering::Relaxed);
    let last_count = LAST_COUNT.load(Ordering::Relaxed);

    format!(
        r#"# HELP visitor_counter_uptime_seconds Number of seconds the service has been running
# TYPE visitor_counter_uptime_seconds gauge
visitor_counter_uptime_seconds {}

# HELP visitor_count_reads_total Successful visitor count reads
# TYPE visitor_count_reads_total counter
visitor_count_reads_total {}

# HELP visitor_count_increments_total Successful visitor count increments
# TYPE visitor_count_increments_total counter
visitor_count_increments_total {}

# HELP visitor_count_failures_total Visitor count requests that failed
# TYPE visitor_count_failures_total counter
visitor_count_failures_total {}

# HELP storage_unavailable_total Visitor count failures caused by an unreachable store
# TYPE storage_unavailable_total counter
storage_unavailable_total {}

# HELP visitor_count_last_seen Highest visitor count returned by this process
# TYPE visitor_count_last_seen gauge
visitor_count_last_seen {}

# HELP quotes_served_total Quotes relayed from the upstream API
# TYPE quotes_served_total counter
quotes_served_total {}

# HELP quote_failures_total Quote requests that failed upstream
# TYPE quote_failures_total counter
quote_failures_total {}
"#,
        uptime_seconds,
        reads,
        increments,
        failures,
        unavailable,
        last_count,
        quotes_served,
        quote_failures,
    )
}

#[handler]
pub async fn metrics_endpoint(depot: &mut Depot, res: &mut Response) {
    let uptime_seconds = match app_state(depot) {
        Ok(state) => state.started_at.elapsed().as_secs(),
        Err(err) => {
            err.render(res);
            return;
        }
    };

    res.render(Text::Plain(format_prometheus(uptime_seconds)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_increment_counters() {
        let reads = VISITOR_COUNT_READS.load(Ordering::Relaxed);
        let unavailable = STORAGE_UNAVAILABLE.load(Ordering::Relaxed);

        Metrics::visitor_count_read(7);
        Metrics::visitor_count_failed(true);

        assert!(VISITOR_COUNT_READS.load(Ordering::Relaxed) > reads);
        assert!(STORAGE_UNAVAILABLE.load(Ordering::Relaxed) > unavailable);
        assert!(LAST_COUNT.load(Ordering::Relaxed) >= 7);
    }

    #[test]
    fn format_prometheus_includes_all_metrics() {
        let output = format_prometheus(42);
        assert!(output.contains("visitor_counter_uptime_seconds 42"));
        assert!(output.contains("visitor_count_reads_total"));
        assert!(output.contains("visitor_count_increments_total"));
        assert!(output.contains("storage_unavailable_total"));
        assert!(output.contains("quote_failures_total"));
    }
}
