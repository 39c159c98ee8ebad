//! Lightweight global metrics for TreeLens.
//!
//! Потокобезопасные атомарные счётчики:
//! - page acquisition (fetch/release/retry)
//! - overflow resolution
//! - dumps (ok/failed)

use std::sync::atomic::{AtomicU64, Ordering};

static PAGES_FETCHED: AtomicU64 = AtomicU64::new(0);
static PAGES_RELEASED: AtomicU64 = AtomicU64::new(0);
static FETCH_RETRIES: AtomicU64 = AtomicU64::new(0);
static OVERFLOW_RESOLVED: AtomicU64 = AtomicU64::new(0);
static OVERFLOW_BYTES: AtomicU64 = AtomicU64::new(0);
static PAGES_DUMPED: AtomicU64 = AtomicU64::new(0);
static DUMP_ERRORS: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub pages_fetched: u64,
    pub pages_released: u64,
    pub fetch_retries: u64,
    pub overflow_resolved: u64,
    pub overflow_bytes: u64,
    pub pages_dumped: u64,
    pub dump_errors: u64,
}

impl MetricsSnapshot {
    /// Захвачено и не возвращено (процессно, по всем источникам).
    pub fn pages_outstanding(&self) -> u64 {
        self.pages_fetched.saturating_sub(self.pages_released)
    }
}

pub fn record_page_fetched() {
    PAGES_FETCHED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_page_released() {
    PAGES_RELEASED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_fetch_retry() {
    FETCH_RETRIES.fetch_add(1, Ordering::Relaxed);
}

pub fn record_overflow_resolved(bytes: usize) {
    OVERFLOW_RESOLVED.fetch_add(1, Ordering::Relaxed);
    OVERFLOW_BYTES.fetch_add(bytes as u64, Ordering::Relaxed);
}

pub fn record_page_dumped() {
    PAGES_DUMPED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_dump_error() {
    DUMP_ERRORS.fetch_add(1, Ordering::Relaxed);
}

pub fn metrics_snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        pages_fetched: PAGES_FETCHED.load(Ordering::Relaxed),
        pages_released: PAGES_RELEASED.load(Ordering::Relaxed),
        fetch_retries: FETCH_RETRIES.load(Ordering::Relaxed),
        overflow_resolved: OVERFLOW_RESOLVED.load(Ordering::Relaxed),
        overflow_bytes: OVERFLOW_BYTES.load(Ordering::Relaxed),
        pages_dumped: PAGES_DUMPED.load(Ordering::Relaxed),
        dump_errors: DUMP_ERRORS.load(Ordering::Relaxed),
    }
}
