//! page/build: сборка синтетических страниц (тесты, demo-команда CLI).
//!
//! Счётчики заголовка ведутся автоматически:
//! - entries: число items / off-page записей / слотов / групп;
//! - records: по листовым данным (или сумма repeat), можно переопределить.

use crate::error::{DumpError, Result};
use crate::page::common::{round_to_alloc, PAGE_HDR_SIZE};
use crate::page::desc::Descriptor;
use crate::page::fixed::{encode_unit, FixedLayout};
use crate::page::header::{header_write, Lsn, PageBody, PageCounts, PageHeader, PageType};
use crate::page::item::{Item, OffPageRef};

pub struct PageBuilder {
    page_type: PageType,
    lsn: Lsn,
    level: u8,
    entries: u32,
    records: u64,
    records_override: Option<u64>,
    body: Vec<u8>,
    layout: Option<FixedLayout>,
}

impl PageBuilder {
    pub fn new(page_type: PageType) -> Self {
        let level = match page_type {
            PageType::RowInternal | PageType::DupInternal | PageType::ColInternal => 2,
            _ => 1,
        };
        Self {
            page_type,
            lsn: Lsn::default(),
            level,
            entries: 0,
            records: 0,
            records_override: None,
            body: Vec::new(),
            layout: None,
        }
    }

    pub fn level(mut self, level: u8) -> Self {
        self.level = level;
        self
    }

    pub fn lsn(mut self, file: u32, offset: u32) -> Self {
        self.lsn = Lsn { file, offset };
        self
    }

    pub fn records(mut self, records: u64) -> Self {
        self.records_override = Some(records);
        self
    }

    /// Раскладка для column-fixed страниц.
    pub fn fixed_layout(mut self, layout: FixedLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn item(mut self, item: Item) -> Result<Self> {
        item.encode_into(&mut self.body)?;
        self.entries += 1;
        match &item {
            Item::Data(_)
            | Item::DataOverflow(_)
            | Item::Duplicate(_)
            | Item::DuplicateOverflow(_)
            | Item::Deleted => self.records += 1,
            Item::OffPage(o) => self.records += o.records,
            Item::Key(_) | Item::KeyOverflow(_) => {}
        }
        Ok(self)
    }

    pub fn items<I: IntoIterator<Item = Item>>(mut self, items: I) -> Result<Self> {
        for it in items {
            self = self.item(it)?;
        }
        Ok(self)
    }

    /// Off-page запись column-internal страницы (без tag word).
    pub fn off_page(mut self, o: OffPageRef) -> Self {
        let start = self.body.len();
        self.body.resize(start + crate::page::common::OFF_REF_LEN, 0);
        o.encode(&mut self.body[start..]);
        self.entries += 1;
        self.records += o.records;
        self
    }

    /// Слот plain column-fixed страницы.
    pub fn fixed_slot(mut self, value: &[u8], deleted: bool) -> Result<Self> {
        let layout = self.fixed_layout_or_err(false)?;
        encode_unit(&mut self.body, &layout, 1, value, deleted)?;
        self.entries += 1;
        self.records += 1;
        Ok(self)
    }

    /// Группа run-length column-fixed страницы.
    pub fn repeat_group(mut self, count: u16, value: &[u8], deleted: bool) -> Result<Self> {
        let layout = self.fixed_layout_or_err(true)?;
        encode_unit(&mut self.body, &layout, count, value, deleted)?;
        self.entries += 1;
        self.records += count as u64;
        Ok(self)
    }

    fn fixed_layout_or_err(&self, repeat: bool) -> Result<FixedLayout> {
        match self.layout {
            Some(l) if l.repeat_comp == repeat => Ok(l),
            _ => Err(DumpError::format(format!(
                "page builder: fixed layout with repeat_comp={} required",
                repeat
            ))),
        }
    }

    pub fn descriptor(mut self, d: &Descriptor) -> Self {
        self.body.extend_from_slice(&d.encode());
        self
    }

    /// Сырые байты тела (overflow payload или намеренно битые данные).
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(bytes);
        self
    }

    pub fn header(&self) -> PageHeader {
        let counts = PageCounts {
            level: self.level,
            entries: self.entries,
            records: self.records_override.unwrap_or(self.records),
        };
        let body = match self.page_type {
            PageType::Overflow => PageBody::Overflow { data_len: self.body.len() as u32 },
            t => PageBody::new(t, counts),
        };
        PageHeader { lsn: self.lsn, checksum: 0, body }
    }

    /// Минимальный размер страницы, округлённый до единицы аллокации.
    pub fn min_size(&self, allocation_size: u32) -> u32 {
        round_to_alloc((PAGE_HDR_SIZE + self.body.len()) as u64, allocation_size) as u32
    }

    /// Собрать страницу ровно `size` байт.
    pub fn finish(self, size: u32) -> Result<Vec<u8>> {
        let need = PAGE_HDR_SIZE + self.body.len();
        if need > size as usize {
            return Err(DumpError::format(format!(
                "page builder: body needs {} bytes, page size is {}",
                need, size
            )));
        }
        let mut page = vec![0u8; size as usize];
        header_write(&mut page, &self.header())?;
        page[PAGE_HDR_SIZE..need].copy_from_slice(&self.body);
        Ok(page)
    }
}
