//! dump: структурный дамп страниц в детерминированный текст.
//!
//! Подмодули:
//! - output.rs: OutputTarget (sink вызывающего / путь / stderr).
//! - render.rs: печать байт, "(none)" для невалидных адресов.
//! - body.rs  : on-disk вид, заголовок + тело по типу страницы.
//! - inmem.rs : in-memory вид, индекс с наложенными цепочками замен.
//!
//! Семантика:
//! - Заголовок и тело разбираются до первой записи в sink: неизвестный тип
//!   страницы или битые items не оставляют вывода.
//! - Overflow-страницы и энтропийные таблицы читаются лениво, во время печати.
//! - Единственное восстановление: повтор fetch при Retry (cfg.fetch_retries раз).
//! - Уже записанный вывод при ошибке не откатывается.

use std::io::Write;

use log::{debug, warn};

use crate::codec::{CodecKind, EntropyTables};
use crate::config::DumpConfig;
use crate::error::Result;
use crate::metrics::{record_dump_error, record_fetch_retry, record_page_dumped};
use crate::overflow::resolve_overflow;
use crate::page::index::build_index;
use crate::page::{header_read, Item, Page, PageType};
use crate::source::{PageGuard, PageSource};

mod body;
mod inmem;
pub mod output;
pub mod render;

pub use output::OutputTarget;
pub use render::AddrDisplay;

use render::Counting;

const DELETED: &[u8] = b"deleted";

/// Итог одного дампа.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpReport {
    pub page_type: PageType,
    /// Строк тела (items, записей, групп, полей индекса).
    pub entries: usize,
    pub overflow_resolved: usize,
    pub bytes_written: u64,
}

#[derive(Debug, Default)]
pub(crate) struct DumpStats {
    pub entries: usize,
    pub overflow_resolved: usize,
}

pub struct Dumper<'s, S: PageSource + ?Sized> {
    source: &'s S,
    cfg: DumpConfig,
    tables: EntropyTables,
}

impl<'s, S: PageSource + ?Sized> Dumper<'s, S> {
    pub fn new(source: &'s S, cfg: DumpConfig, tables: EntropyTables) -> Self {
        Self { source, cfg, tables }
    }

    pub fn config(&self) -> &DumpConfig {
        &self.cfg
    }

    pub fn source(&self) -> &'s S {
        self.source
    }

    /// Захватить страницу с повтором при Retry.
    pub fn fetch(&self, addr: u32, size: u32) -> Result<PageGuard<'s, S>> {
        let mut attempt = 0u32;
        loop {
            match PageGuard::acquire(self.source, addr, size, true) {
                Ok(g) => return Ok(g),
                Err(e) if e.is_retryable() && attempt < self.cfg.fetch_retries => {
                    attempt += 1;
                    record_fetch_retry();
                    warn!(
                        "page {}/{} evicted during fetch, retry {}/{}",
                        addr, size, attempt, self.cfg.fetch_retries
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Захватить страницу по addr/size, сдампить, вернуть.
    pub fn dump_by_address(&self, addr: u32, size: u32, target: OutputTarget<'_>) -> Result<DumpReport> {
        let guard = match self.fetch(addr, size) {
            Ok(g) => g,
            Err(e) => {
                record_dump_error();
                return Err(e);
            }
        };
        self.dump_page(&guard, target)
    }

    /// On-disk вид уже захваченной страницы.
    pub fn dump_page(&self, page: &Page, target: OutputTarget<'_>) -> Result<DumpReport> {
        track(self.dump_page_inner(page, target))
    }

    /// In-memory вид: индекс с наложенными заменами. Если индекс не построен,
    /// строится временно из байт страницы (без замен).
    pub fn dump_in_memory(&self, page: &Page, target: OutputTarget<'_>) -> Result<DumpReport> {
        track(self.dump_in_memory_inner(page, target))
    }

    pub fn render_page(&self, page: &Page) -> Result<String> {
        let mut buf = Vec::new();
        self.dump_page(page, OutputTarget::ExistingSink(&mut buf))?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    pub fn render_in_memory(&self, page: &Page) -> Result<String> {
        let mut buf = Vec::new();
        self.dump_in_memory(page, OutputTarget::ExistingSink(&mut buf))?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Построить in-memory индекс страницы (заменяет существующий).
    pub fn load_index(&self, page: &mut Page) -> Result<()> {
        let (hdr, body_off) = header_read(&page.bytes)?;
        let idx = build_index(
            &page.bytes,
            &hdr,
            body_off,
            &self.cfg.fixed_layout(),
            self.tables.key.is_some(),
        )?;
        debug!("built {} index entries for page {}", idx.len(), page.addr);
        page.index = Some(idx);
        Ok(())
    }

    fn dump_page_inner(&self, page: &Page, target: OutputTarget<'_>) -> Result<DumpReport> {
        let (hdr, body_off) = header_read(&page.bytes)?;
        let decoded = self.decode_body(page, &hdr, body_off)?;
        debug!("dump page {} as {}", page.addr, hdr.page_type().name());

        let mut sink = target.open()?;
        let mut stats = DumpStats::default();
        let written = {
            let mut out = Counting::new(&mut sink);
            self.write_page_header(&mut out, page, &hdr, decoded.first_free)?;
            self.write_body(&mut out, &decoded, &mut stats)?;
            out.write_all(b"}\n")?;
            out.written()
        };
        sink.finish()?;
        Ok(DumpReport {
            page_type: hdr.page_type(),
            entries: stats.entries,
            overflow_resolved: stats.overflow_resolved,
            bytes_written: written,
        })
    }

    fn dump_in_memory_inner(&self, page: &Page, target: OutputTarget<'_>) -> Result<DumpReport> {
        let (hdr, body_off) = header_read(&page.bytes)?;
        let built;
        let index = match &page.index {
            Some(i) => i,
            None => {
                built = build_index(
                    &page.bytes,
                    &hdr,
                    body_off,
                    &self.cfg.fixed_layout(),
                    self.tables.key.is_some(),
                )?;
                &built
            }
        };

        let mut sink = target.open()?;
        let mut stats = DumpStats::default();
        let written = {
            let mut out = Counting::new(&mut sink);
            self.write_range_line(&mut out, page)?;
            self.write_index(&mut out, index, &mut stats)?;
            out.write_all(b"}\n")?;
            out.written()
        };
        sink.finish()?;
        Ok(DumpReport {
            page_type: hdr.page_type(),
            entries: stats.entries,
            overflow_resolved: stats.overflow_resolved,
            bytes_written: written,
        })
    }

    /// `addr: <start>-<end> {`
    fn write_range_line<W: Write + ?Sized>(&self, out: &mut W, page: &Page) -> Result<()> {
        if page.addr == crate::page::ADDR_INVALID {
            writeln!(out, "addr: {} {{", AddrDisplay(page.addr))?;
        } else {
            let end = page.addr as u64 + self.cfg.size_to_units(page.size) as u64 - 1;
            writeln!(out, "addr: {}-{} {{", page.addr, end)?;
        }
        Ok(())
    }

    /// Данные item'а: overflow читается, затем энтропийное декодирование.
    fn item_data<'b>(
        &self,
        item: &'b Item,
        hold: &'b mut Vec<u8>,
        scratch: &'b mut Vec<u8>,
        stats: &mut DumpStats,
    ) -> Result<&'b [u8]> {
        let (kind, src): (CodecKind, &'b [u8]) = match item {
            Item::Key(b) => (CodecKind::Key, b.as_slice()),
            Item::Data(b) | Item::Duplicate(b) => (CodecKind::Data, b.as_slice()),
            Item::Deleted => return Ok(DELETED),
            Item::KeyOverflow(r) | Item::DataOverflow(r) | Item::DuplicateOverflow(r) => {
                let rec = resolve_overflow(self.source, &self.cfg, r)?;
                stats.overflow_resolved += 1;
                *hold = rec.bytes;
                // key-overflow декодируется таблицей ключей, остальные: таблицей данных
                let kind = if matches!(item, Item::KeyOverflow(_)) {
                    CodecKind::Key
                } else {
                    CodecKind::Data
                };
                (kind, hold.as_slice())
            }
            Item::OffPage(_) => return Ok(&[]),
        };
        self.tables.decode(kind, src, scratch)
    }
}

fn track(r: Result<DumpReport>) -> Result<DumpReport> {
    match &r {
        Ok(_) => record_page_dumped(),
        Err(_) => record_dump_error(),
    }
    r
}
