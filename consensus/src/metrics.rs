//! Metrics collection for observability
//!
//! # Metrics
//!
//! - `vote_txs_total{path, code}` - Transactions executed, by path (`append`/`check`) and result code
//! - `vote_commits_total` - Total number of commits
//! - `vote_commit_duration_seconds` - Histogram of commit latencies
//! - `vote_candidates` - Width of the committed tally

use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};
use std::fmt;
use std::sync::Arc;
use voting_ledger::ResultCode;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Transactions by path and result code
    pub txs_total: IntCounterVec,

    /// Total commits
    pub commits_total: IntCounter,

    /// Commit duration histogram
    pub commit_duration: Histogram,

    /// Number of candidates in the committed tally
    pub candidates: IntGauge,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector with its own registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let txs_total = IntCounterVec::new(
            Opts::new("vote_txs_total", "Transactions executed"),
            &["path", "code"],
        )?;
        registry.register(Box::new(txs_total.clone()))?;

        let commits_total = IntCounter::new("vote_commits_total", "Total number of commits")?;
        registry.register(Box::new(commits_total.clone()))?;

        let commit_duration = Histogram::with_opts(
            HistogramOpts::new("vote_commit_duration_seconds", "Histogram of commit latencies")
                .buckets(vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0]),
        )?;
        registry.register(Box::new(commit_duration.clone()))?;

        let candidates = IntGauge::new("vote_candidates", "Width of the committed tally")?;
        registry.register(Box::new(candidates.clone()))?;

        Ok(Self {
            txs_total,
            commits_total,
            commit_duration,
            candidates,
            registry,
        })
    }

    /// Record an executed transaction
    pub fn record_tx(&self, path: &str, code: ResultCode) {
        self.txs_total
            .with_label_values(&[path, &code.as_u32().to_string()])
            .inc();
    }

    /// Record a commit
    pub fn record_commit(&self, duration_seconds: f64) {
        self.commits_total.inc();
        self.commit_duration.observe(duration_seconds);
    }

    /// Update committed tally width
    pub fn set_candidates(&self, n: usize) {
        self.candidates.set(n as i64);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl fmt::Debug for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metrics")
            .field("commits_total", &self.commits_total.get())
            .field("candidates", &self.candidates.get())
            .finish()
    }
}
