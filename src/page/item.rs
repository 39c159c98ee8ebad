//! page/item: tagged items на row/duplicate/column-variable страницах.
//!
//! Формат item'а: [tag u32 LE = type << 24 | len][payload len байт][pad до 4].
//! - overflow-варианты: payload = OverflowRef [addr u32][size u32], len == 8;
//! - OffPage: payload = [addr u32][size u32][records u64], len == 16;
//! - Deleted: len == 0.
//!
//! Итератор ленивый: overflow-страницы не читаются, ссылка лишь декодируется.

use byteorder::{ByteOrder, LittleEndian};
use log::debug;
use serde::Serialize;

use crate::error::{DumpError, Result};
use crate::page::common::{
    item_align, ITEM_DATA, ITEM_DATA_OVFL, ITEM_DEL, ITEM_DUP, ITEM_DUP_OVFL, ITEM_HDR_LEN,
    ITEM_KEY, ITEM_KEY_OVFL, ITEM_LEN_MASK, ITEM_OFF, ITEM_TYPE_SHIFT, OFF_REF_LEN, OVFL_REF_LEN,
};
use crate::page::header::PageType;

/// Ссылка на overflow-страницу: адрес и длина данных (байт).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OverflowRef {
    pub addr: u32,
    pub size: u32,
}

/// Ссылка на дочернюю страницу.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OffPageRef {
    pub addr: u32,
    pub size: u32,
    pub records: u64,
}

impl OverflowRef {
    pub fn decode(b: &[u8]) -> Self {
        OverflowRef {
            addr: LittleEndian::read_u32(&b[0..4]),
            size: LittleEndian::read_u32(&b[4..8]),
        }
    }

    pub fn encode(&self, out: &mut [u8]) {
        LittleEndian::write_u32(&mut out[0..4], self.addr);
        LittleEndian::write_u32(&mut out[4..8], self.size);
    }
}

impl OffPageRef {
    pub fn decode(b: &[u8]) -> Self {
        OffPageRef {
            addr: LittleEndian::read_u32(&b[0..4]),
            size: LittleEndian::read_u32(&b[4..8]),
            records: LittleEndian::read_u64(&b[8..16]),
        }
    }

    pub fn encode(&self, out: &mut [u8]) {
        LittleEndian::write_u32(&mut out[0..4], self.addr);
        LittleEndian::write_u32(&mut out[4..8], self.size);
        LittleEndian::write_u64(&mut out[8..16], self.records);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemType {
    Key,
    KeyOverflow,
    Data,
    DataOverflow,
    Duplicate,
    DuplicateOverflow,
    Deleted,
    OffPage,
}

impl ItemType {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            ITEM_KEY => Some(ItemType::Key),
            ITEM_KEY_OVFL => Some(ItemType::KeyOverflow),
            ITEM_DATA => Some(ItemType::Data),
            ITEM_DATA_OVFL => Some(ItemType::DataOverflow),
            ITEM_DUP => Some(ItemType::Duplicate),
            ITEM_DUP_OVFL => Some(ItemType::DuplicateOverflow),
            ITEM_DEL => Some(ItemType::Deleted),
            ITEM_OFF => Some(ItemType::OffPage),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            ItemType::Key => ITEM_KEY,
            ItemType::KeyOverflow => ITEM_KEY_OVFL,
            ItemType::Data => ITEM_DATA,
            ItemType::DataOverflow => ITEM_DATA_OVFL,
            ItemType::Duplicate => ITEM_DUP,
            ItemType::DuplicateOverflow => ITEM_DUP_OVFL,
            ItemType::Deleted => ITEM_DEL,
            ItemType::OffPage => ITEM_OFF,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ItemType::Key => "key",
            ItemType::KeyOverflow => "key-overflow",
            ItemType::Data => "data",
            ItemType::DataOverflow => "data-overflow",
            ItemType::Duplicate => "duplicate",
            ItemType::DuplicateOverflow => "duplicate-overflow",
            ItemType::Deleted => "deleted",
            ItemType::OffPage => "offpage",
        }
    }
}

/// Декодированный item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Key(Vec<u8>),
    Data(Vec<u8>),
    Duplicate(Vec<u8>),
    Deleted,
    KeyOverflow(OverflowRef),
    DataOverflow(OverflowRef),
    DuplicateOverflow(OverflowRef),
    OffPage(OffPageRef),
}

impl Item {
    pub fn item_type(&self) -> ItemType {
        match self {
            Item::Key(_) => ItemType::Key,
            Item::Data(_) => ItemType::Data,
            Item::Duplicate(_) => ItemType::Duplicate,
            Item::Deleted => ItemType::Deleted,
            Item::KeyOverflow(_) => ItemType::KeyOverflow,
            Item::DataOverflow(_) => ItemType::DataOverflow,
            Item::DuplicateOverflow(_) => ItemType::DuplicateOverflow,
            Item::OffPage(_) => ItemType::OffPage,
        }
    }

    /// Длина payload так, как она записана в tag word.
    pub fn len(&self) -> usize {
        match self {
            Item::Key(b) | Item::Data(b) | Item::Duplicate(b) => b.len(),
            Item::Deleted => 0,
            Item::KeyOverflow(_) | Item::DataOverflow(_) | Item::DuplicateOverflow(_) => {
                OVFL_REF_LEN
            }
            Item::OffPage(_) => OFF_REF_LEN,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn overflow_ref(&self) -> Option<&OverflowRef> {
        match self {
            Item::KeyOverflow(r) | Item::DataOverflow(r) | Item::DuplicateOverflow(r) => Some(r),
            _ => None,
        }
    }

    pub fn is_key(&self) -> bool {
        matches!(self, Item::Key(_) | Item::KeyOverflow(_))
    }

    /// Полная длина на странице (tag + payload + выравнивание).
    pub fn encoded_len(&self) -> usize {
        ITEM_HDR_LEN + item_align(self.len())
    }

    /// Записать item в конец буфера.
    pub fn encode_into(&self, out: &mut Vec<u8>) -> Result<()> {
        let len = self.len();
        if len as u32 > ITEM_LEN_MASK {
            return Err(DumpError::format(format!("item payload too long: {}", len)));
        }
        let start = out.len();
        out.resize(start + self.encoded_len(), 0);
        let tag = ((self.item_type().code() as u32) << ITEM_TYPE_SHIFT) | len as u32;
        LittleEndian::write_u32(&mut out[start..start + ITEM_HDR_LEN], tag);
        let p = start + ITEM_HDR_LEN;
        match self {
            Item::Key(b) | Item::Data(b) | Item::Duplicate(b) => {
                out[p..p + b.len()].copy_from_slice(b)
            }
            Item::Deleted => {}
            Item::KeyOverflow(r) | Item::DataOverflow(r) | Item::DuplicateOverflow(r) => {
                r.encode(&mut out[p..p + OVFL_REF_LEN])
            }
            Item::OffPage(o) => o.encode(&mut out[p..p + OFF_REF_LEN]),
        }
        Ok(())
    }
}

/// Ленивый forward-only обход items.
/// Останавливается после `entries` items или ровно на конце страницы.
pub struct ItemIter<'a> {
    page: &'a [u8],
    page_type: PageType,
    off: usize,
    remaining: u32,
    failed: bool,
}

impl<'a> ItemIter<'a> {
    pub fn new(page: &'a [u8], page_type: PageType, body_off: usize, entries: u32) -> Self {
        Self {
            page,
            page_type,
            off: body_off,
            remaining: entries,
            failed: false,
        }
    }

    /// Смещение первого байта после последнего прочитанного item'а.
    pub fn offset(&self) -> usize {
        self.off
    }

    fn decode_next(&mut self) -> Result<Item> {
        let ps = self.page.len();
        let off = self.off;
        if off + ITEM_HDR_LEN > ps {
            return Err(DumpError::format(format!(
                "item header at offset {} crosses page end {}",
                off, ps
            )));
        }
        let tag = LittleEndian::read_u32(&self.page[off..off + ITEM_HDR_LEN]);
        let code = (tag >> ITEM_TYPE_SHIFT) as u8;
        let len = (tag & ITEM_LEN_MASK) as usize;
        let it = ItemType::from_code(code).ok_or_else(|| {
            DumpError::format(format!("unknown item type {} at offset {}", code, off))
        })?;

        let p = off + ITEM_HDR_LEN;
        let end = p
            .checked_add(item_align(len))
            .filter(|&e| e <= ps && p + len <= ps)
            .ok_or_else(|| {
                DumpError::format(format!(
                    "item {} at offset {} (len {}) crosses page end {}",
                    it.name(),
                    off,
                    len,
                    ps
                ))
            })?;
        self.check_placement(it, off)?;

        let payload = &self.page[p..p + len];
        let item = match it {
            ItemType::Key => Item::Key(payload.to_vec()),
            ItemType::Data => Item::Data(payload.to_vec()),
            ItemType::Duplicate => Item::Duplicate(payload.to_vec()),
            ItemType::Deleted => {
                expect_len(it, len, 0, off)?;
                Item::Deleted
            }
            ItemType::KeyOverflow => {
                expect_len(it, len, OVFL_REF_LEN, off)?;
                Item::KeyOverflow(OverflowRef::decode(payload))
            }
            ItemType::DataOverflow => {
                expect_len(it, len, OVFL_REF_LEN, off)?;
                Item::DataOverflow(OverflowRef::decode(payload))
            }
            ItemType::DuplicateOverflow => {
                expect_len(it, len, OVFL_REF_LEN, off)?;
                Item::DuplicateOverflow(OverflowRef::decode(payload))
            }
            ItemType::OffPage => {
                expect_len(it, len, OFF_REF_LEN, off)?;
                Item::OffPage(OffPageRef::decode(payload))
            }
        };
        self.off = end;
        Ok(item)
    }

    fn check_placement(&self, it: ItemType, off: usize) -> Result<()> {
        let bad = match it {
            ItemType::OffPage => self.page_type.is_leaf(),
            ItemType::Key | ItemType::KeyOverflow => {
                matches!(self.page_type, PageType::ColVar | PageType::DupLeaf)
            }
            _ => false,
        };
        if bad {
            return Err(DumpError::format(format!(
                "item {} not allowed on {} page (offset {})",
                it.name(),
                self.page_type.name(),
                off
            )));
        }
        Ok(())
    }
}

fn expect_len(it: ItemType, got: usize, want: usize, off: usize) -> Result<()> {
    if got != want {
        return Err(DumpError::format(format!(
            "item {} at offset {} has len {}, expected {}",
            it.name(),
            off,
            got,
            want
        )));
    }
    Ok(())
}

impl<'a> Iterator for ItemIter<'a> {
    type Item = Result<Item>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.remaining == 0 {
            return None;
        }
        if self.off == self.page.len() {
            debug!(
                "item iteration reached page end with {} entries left",
                self.remaining
            );
            self.remaining = 0;
            return None;
        }
        self.remaining -= 1;
        match self.decode_next() {
            Ok(item) => Some(Ok(item)),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
