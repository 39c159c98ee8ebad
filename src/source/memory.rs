//! source/memory: in-memory источник страниц с fault injection.
//!
//! Ведёт счётчики fetch/release, чтобы проверять отсутствие утечек пинов,
//! и умеет имитировать вытеснение (Retry N раз) и фатальные ошибки по адресу.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::{FetchError, PageSource};
use crate::page::Page;

#[derive(Default)]
struct Faults {
    retry: HashMap<u32, u32>,
    fatal: HashSet<u32>,
}

#[derive(Default)]
pub struct MemPageSource {
    pages: Mutex<HashMap<u32, Vec<u8>>>,
    faults: Mutex<Faults>,
    fetched: AtomicU64,
    released: AtomicU64,
    retries_served: AtomicU64,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl MemPageSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Положить страницу по адресу (размер = длина буфера).
    pub fn insert(&self, addr: u32, bytes: Vec<u8>) {
        lock(&self.pages).insert(addr, bytes);
    }

    pub fn with_page(self, addr: u32, bytes: Vec<u8>) -> Self {
        self.insert(addr, bytes);
        self
    }

    /// Следующие `times` fetch по адресу вернут Retry.
    pub fn inject_retry(&self, addr: u32, times: u32) {
        lock(&self.faults).retry.insert(addr, times);
    }

    /// Любой fetch по адресу вернёт Fatal.
    pub fn inject_fatal(&self, addr: u32) {
        lock(&self.faults).fatal.insert(addr);
    }

    pub fn clear_faults(&self) {
        let mut f = lock(&self.faults);
        f.retry.clear();
        f.fatal.clear();
    }

    /// Успешных fetch.
    pub fn fetches(&self) -> u64 {
        self.fetched.load(Ordering::Relaxed)
    }

    pub fn releases(&self) -> u64 {
        self.released.load(Ordering::Relaxed)
    }

    /// Сколько раз был отдан Retry.
    pub fn retries_served(&self) -> u64 {
        self.retries_served.load(Ordering::Relaxed)
    }

    /// Захвачено и не возвращено.
    pub fn outstanding(&self) -> u64 {
        self.fetches().saturating_sub(self.releases())
    }
}

impl PageSource for MemPageSource {
    fn fetch_page(&self, addr: u32, size: u32, _for_debug: bool) -> Result<Page, FetchError> {
        {
            let mut f = lock(&self.faults);
            if f.fatal.contains(&addr) {
                return Err(FetchError::Fatal(format!("injected failure at addr {}", addr)));
            }
            if let Some(n) = f.retry.get_mut(&addr) {
                if *n > 0 {
                    *n -= 1;
                    self.retries_served.fetch_add(1, Ordering::Relaxed);
                    return Err(FetchError::Retry);
                }
            }
        }
        let pages = lock(&self.pages);
        let bytes = pages
            .get(&addr)
            .ok_or_else(|| FetchError::Fatal(format!("no page at addr {}", addr)))?;
        if bytes.len() != size as usize {
            return Err(FetchError::Fatal(format!(
                "page at addr {} has {} bytes, requested {}",
                addr,
                bytes.len(),
                size
            )));
        }
        self.fetched.fetch_add(1, Ordering::Relaxed);
        Ok(Page::new(addr, size, bytes.clone()))
    }

    fn release_page(&self, _page: Page) {
        self.released.fetch_add(1, Ordering::Relaxed);
    }
}
