//! page/index: in-memory массивы индексов (row/column) поверх байт страницы.
//!
//! Индекс строится из базовых items один раз; цепочки замен навешиваются
//! снаружи (write path) и здесь только хранятся.

use crate::error::{DumpError, Result};
use crate::page::fixed::{decode_fixed, FixedLayout, FixedRecords};
use crate::page::header::{PageHeader, PageType};
use crate::page::item::{Item, ItemIter, OffPageRef};
use crate::update::UpdateChain;

/// Ключ row-записи: декодированный item или маркер "требует обработки"
/// (overflow-ключ или ключ под энтропийным сжатием).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowKey {
    Item(Item),
    NeedsProcessing(Item),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowIndexEntry {
    pub key: RowKey,
    pub data: Item,
    pub update: Option<UpdateChain>,
}

/// Данные column-записи.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnData {
    Item(Item),
    Fixed { value: Vec<u8>, deleted: bool },
    Repeat { count: u16, value: Vec<u8>, deleted: bool },
    OffPage(OffPageRef),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnIndexEntry {
    pub data: ColumnData,
    pub update: Option<UpdateChain>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageIndex {
    Row(Vec<RowIndexEntry>),
    Column(Vec<ColumnIndexEntry>),
    /// Descriptor/overflow: индексировать нечего.
    Empty,
}

impl PageIndex {
    pub fn len(&self) -> usize {
        match self {
            PageIndex::Row(v) => v.len(),
            PageIndex::Column(v) => v.len(),
            PageIndex::Empty => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Навесить цепочку замен на слот индекса.
    pub fn attach_update(&mut self, slot: usize, chain: UpdateChain) -> Result<()> {
        let target = match self {
            PageIndex::Row(v) => v.get_mut(slot).map(|e| &mut e.update),
            PageIndex::Column(v) => v.get_mut(slot).map(|e| &mut e.update),
            PageIndex::Empty => None,
        };
        match target {
            Some(u) => {
                *u = Some(chain);
                Ok(())
            }
            None => Err(DumpError::format(format!(
                "no index slot {} (index has {} entries)",
                slot,
                self.len()
            ))),
        }
    }
}

/// Построить индекс страницы.
/// `keys_compressed`: сконфигурирован ли декодер ключей (тогда ключи помечаются).
pub fn build_index(
    page: &[u8],
    hdr: &PageHeader,
    body_off: usize,
    layout: &FixedLayout,
    keys_compressed: bool,
) -> Result<PageIndex> {
    let Some(counts) = hdr.body.counts() else {
        return Ok(PageIndex::Empty);
    };
    let t = hdr.page_type();
    match t {
        PageType::Descriptor | PageType::Overflow => Ok(PageIndex::Empty),
        PageType::RowInternal | PageType::RowLeaf | PageType::DupInternal => {
            let mut out = Vec::new();
            let mut pending: Option<Item> = None;
            for item in ItemIter::new(page, t, body_off, counts.entries) {
                let item = item?;
                match pending.take() {
                    None => {
                        if !item.is_key() {
                            return Err(DumpError::format(format!(
                                "{} item where a key was expected on {} page",
                                item.item_type().name(),
                                t.name()
                            )));
                        }
                        pending = Some(item);
                    }
                    Some(key) => {
                        if item.is_key() {
                            return Err(DumpError::format(format!(
                                "key without data item on {} page",
                                t.name()
                            )));
                        }
                        out.push(RowIndexEntry {
                            key: classify_key(key, keys_compressed),
                            data: item,
                            update: None,
                        });
                    }
                }
            }
            if pending.is_some() {
                return Err(DumpError::format(format!(
                    "trailing key without data item on {} page",
                    t.name()
                )));
            }
            Ok(PageIndex::Row(out))
        }
        PageType::DupLeaf => {
            // Элементы duplicate-листа сами являются и ключом, и данными.
            let mut out = Vec::new();
            for item in ItemIter::new(page, t, body_off, counts.entries) {
                let item = item?;
                let key = match &item {
                    Item::Duplicate(_) if !keys_compressed => RowKey::Item(item.clone()),
                    _ => RowKey::NeedsProcessing(item.clone()),
                };
                out.push(RowIndexEntry { key, data: item, update: None });
            }
            Ok(PageIndex::Row(out))
        }
        PageType::ColVar => {
            let out = ItemIter::new(page, t, body_off, counts.entries)
                .map(|r| {
                    r.map(|item| ColumnIndexEntry {
                        data: ColumnData::Item(item),
                        update: None,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(PageIndex::Column(out))
        }
        PageType::ColInternal => {
            let out = off_page_array(page, body_off, counts.entries)?
                .into_iter()
                .map(|o| ColumnIndexEntry {
                    data: ColumnData::OffPage(o),
                    update: None,
                })
                .collect();
            Ok(PageIndex::Column(out))
        }
        PageType::ColFixed => {
            let out = match decode_fixed(page, body_off, &counts, layout)? {
                FixedRecords::Plain(slots) => slots
                    .into_iter()
                    .map(|s| ColumnIndexEntry {
                        data: ColumnData::Fixed { value: s.value, deleted: s.deleted },
                        update: None,
                    })
                    .collect(),
                FixedRecords::Repeat(groups) => groups
                    .into_iter()
                    .map(|g| ColumnIndexEntry {
                        data: ColumnData::Repeat { count: g.count, value: g.value, deleted: g.deleted },
                        update: None,
                    })
                    .collect(),
            };
            Ok(PageIndex::Column(out))
        }
    }
}

fn classify_key(key: Item, keys_compressed: bool) -> RowKey {
    match key {
        Item::Key(_) if !keys_compressed => RowKey::Item(key),
        other => RowKey::NeedsProcessing(other),
    }
}

/// Плотный массив off-page записей column-internal страницы.
pub fn off_page_array(page: &[u8], body_off: usize, entries: u32) -> Result<Vec<OffPageRef>> {
    use crate::page::common::OFF_REF_LEN;
    let end = (entries as usize)
        .checked_mul(OFF_REF_LEN)
        .and_then(|n| n.checked_add(body_off))
        .filter(|&e| e <= page.len())
        .ok_or_else(|| {
            DumpError::format(format!(
                "column-internal page with {} entries crosses page end {}",
                entries,
                page.len()
            ))
        })?;
    Ok(page[body_off..end]
        .chunks_exact(OFF_REF_LEN)
        .map(OffPageRef::decode)
        .collect())
}
