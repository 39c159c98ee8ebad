//! source: получение страниц у внешнего buffer pool.
//!
//! - PageSource: контракт коллаборатора (fetch_page/release_page).
//! - PageGuard : RAII, ровно один release на каждый успешный fetch, на любом пути.
//! - memory.rs : MemPageSource (тесты, fault injection, счётчики пинов).
//! - file.rs   : FilePageSource (чтение страниц из файла БД под shared lock).

use std::ops::Deref;

use log::debug;

use crate::error::{DumpError, Result};
use crate::metrics::{record_page_fetched, record_page_released};
use crate::page::Page;

pub mod file;
pub mod memory;

pub use file::FilePageSource;
pub use memory::MemPageSource;

/// Ошибка получения страницы.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Страница вытеснена параллельно; addr/size валидны, можно повторить.
    Retry,
    Fatal(String),
}

pub trait PageSource {
    /// `for_debug` просит согласованное (возможно, ослабленное) чтение.
    fn fetch_page(&self, addr: u32, size: u32, for_debug: bool) -> std::result::Result<Page, FetchError>;

    /// Вернуть страницу; вызывается ровно один раз на успешный fetch.
    fn release_page(&self, page: Page);
}

/// Захваченная страница; release в Drop.
pub struct PageGuard<'s, S: PageSource + ?Sized> {
    source: &'s S,
    page: Option<Page>,
}

impl<'s, S: PageSource + ?Sized> PageGuard<'s, S> {
    pub fn acquire(source: &'s S, addr: u32, size: u32, for_debug: bool) -> Result<Self> {
        match source.fetch_page(addr, size, for_debug) {
            Ok(page) => {
                record_page_fetched();
                debug!("acquired page {}/{}", addr, size);
                Ok(Self {
                    source,
                    page: Some(page),
                })
            }
            Err(FetchError::Retry) => Err(DumpError::RetryableFetch { addr, size }),
            Err(FetchError::Fatal(reason)) => Err(DumpError::Fetch { addr, size, reason }),
        }
    }

    pub fn page(&self) -> &Page {
        self
    }
}

impl<S: PageSource + ?Sized> Deref for PageGuard<'_, S> {
    type Target = Page;

    fn deref(&self) -> &Page {
        // Some до Drop
        match &self.page {
            Some(p) => p,
            None => unreachable!("page guard used after release"),
        }
    }
}

impl<S: PageSource + ?Sized> Drop for PageGuard<'_, S> {
    fn drop(&mut self) {
        if let Some(page) = self.page.take() {
            debug!("released page {}/{}", page.addr, page.size);
            self.source.release_page(page);
            record_page_released();
        }
    }
}
