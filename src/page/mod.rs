//! page: on-disk страницы B-дерева (заголовок, items, fixed-записи, descriptor).
//!
//! Разделение по подмодулям:
//! - common.rs: константы layout’а/offset’ы, коды типов.
//! - header.rs: 32-байтовый заголовок (PageType, PageBody, header_read/write).
//! - item.rs  : tagged items и ленивый итератор.
//! - fixed.rs : column-fixed (plain / run-length).
//! - desc.rs  : description record страницы 0.
//! - index.rs : in-memory индекс (row/column) с цепочками замен.
//! - build.rs : сборка синтетических страниц.

pub mod common;
pub mod header;
pub mod item;
pub mod fixed;
pub mod desc;
pub mod index;
pub mod build;

pub use common::{ADDR_INVALID, DEFAULT_ALLOCATION_SIZE, PAGE_HDR_SIZE};
pub use desc::Descriptor;
pub use fixed::{FixedLayout, FixedRecords, FixedSlot, RepeatGroup};
pub use header::{header_read, header_write, Lsn, PageBody, PageCounts, PageHeader, PageType};
pub use index::{ColumnData, ColumnIndexEntry, PageIndex, RowIndexEntry, RowKey};
pub use item::{Item, ItemIter, ItemType, OffPageRef, OverflowRef};
pub use build::PageBuilder;

/// Страница, выданная источником страниц: адрес (в единицах аллокации),
/// размер в байтах, сами байты и, опционально, построенный in-memory индекс.
#[derive(Debug, Clone)]
pub struct Page {
    pub addr: u32,
    pub size: u32,
    pub bytes: Vec<u8>,
    pub index: Option<PageIndex>,
}

impl Page {
    pub fn new(addr: u32, size: u32, bytes: Vec<u8>) -> Self {
        Self {
            addr,
            size,
            bytes,
            index: None,
        }
    }

    pub fn header(&self) -> crate::error::Result<PageHeader> {
        header_read(&self.bytes).map(|(h, _)| h)
    }
}
