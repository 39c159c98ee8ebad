//! dump/inmem: in-memory вид, ключ и текущее значение с учётом замен.

use std::io::Write;

use crate::error::Result;
use crate::page::{ColumnData, ColumnIndexEntry, Item, PageIndex, RowIndexEntry, RowKey};
use crate::source::PageSource;
use crate::update::{current_value, CurrentValue, UpdateChain, UpdateSlot};

use super::body::{write_fixed_value, write_off_page};
use super::render::write_bytes;
use super::{DumpStats, Dumper};

impl<'s, S: PageSource + ?Sized> Dumper<'s, S> {
    pub(crate) fn write_index<W: Write + ?Sized>(
        &self,
        out: &mut W,
        index: &PageIndex,
        stats: &mut DumpStats,
    ) -> Result<()> {
        let mut hold = Vec::new();
        let mut scratch = Vec::new();
        match index {
            PageIndex::Empty => {}
            PageIndex::Row(entries) => {
                for e in entries {
                    self.write_row_entry(out, e, &mut hold, &mut scratch, stats)?;
                    stats.entries += 1;
                }
            }
            PageIndex::Column(entries) => {
                for e in entries {
                    self.write_column_entry(out, e, &mut hold, &mut scratch, stats)?;
                    stats.entries += 1;
                }
            }
        }
        Ok(())
    }

    fn write_row_entry<W: Write + ?Sized>(
        &self,
        out: &mut W,
        e: &RowIndexEntry,
        hold: &mut Vec<u8>,
        scratch: &mut Vec<u8>,
        stats: &mut DumpStats,
    ) -> Result<()> {
        match &e.key {
            RowKey::Item(k) => {
                let key = self.item_data(k, hold, scratch, stats)?;
                write!(out, "\tkey: {} {{", key.len())?;
                write_bytes(out, key)?;
                out.write_all(b"}\n")?;
            }
            RowKey::NeedsProcessing(_) => out.write_all(b"\tkey {requires processing}\n")?,
        }
        self.write_current(out, e.update.as_ref(), &e.data, hold, scratch, stats)
    }

    fn write_column_entry<W: Write + ?Sized>(
        &self,
        out: &mut W,
        e: &ColumnIndexEntry,
        hold: &mut Vec<u8>,
        scratch: &mut Vec<u8>,
        stats: &mut DumpStats,
    ) -> Result<()> {
        if let Some(chain) = self.history(e.update.as_ref()) {
            return write_history(out, chain);
        }
        match &e.data {
            ColumnData::Item(item) => self.write_current(out, e.update.as_ref(), item, hold, scratch, stats),
            ColumnData::OffPage(o) => write_off_page(out, o),
            ColumnData::Fixed { value, deleted } => {
                let base = fixed_base(value, *deleted);
                match current_value(e.update.as_ref(), &base) {
                    CurrentValue::Base(_) => {
                        out.write_all(b"\tdata {")?;
                        write_fixed_value(out, value, *deleted)?;
                        out.write_all(b"}\n")?;
                        Ok(())
                    }
                    other => write_overlay(out, other),
                }
            }
            ColumnData::Repeat { count, value, deleted } => {
                let base = fixed_base(value, *deleted);
                match current_value(e.update.as_ref(), &base) {
                    CurrentValue::Base(_) => {
                        write!(out, "\trepeat {} {{", count)?;
                        write_fixed_value(out, value, *deleted)?;
                        out.write_all(b"}\n")?;
                        Ok(())
                    }
                    other => write_overlay(out, other),
                }
            }
        }
    }

    fn write_current<W: Write + ?Sized>(
        &self,
        out: &mut W,
        chain: Option<&UpdateChain>,
        base: &Item,
        hold: &mut Vec<u8>,
        scratch: &mut Vec<u8>,
        stats: &mut DumpStats,
    ) -> Result<()> {
        if let Some(chain) = self.history(chain) {
            return write_history(out, chain);
        }
        match current_value(chain, base) {
            CurrentValue::Base(Item::OffPage(o)) => write_off_page(out, o),
            CurrentValue::Base(item) => {
                let data = self.item_data(item, hold, scratch, stats)?;
                out.write_all(b"\tdata {")?;
                write_bytes(out, data)?;
                out.write_all(b"}\n")?;
                Ok(())
            }
            other => write_overlay(out, other),
        }
    }

    /// Цепочка для печати целиком: режим истории включён и в ней есть записи.
    fn history<'c>(&self, chain: Option<&'c UpdateChain>) -> Option<&'c UpdateChain> {
        if !self.cfg.repl_history {
            return None;
        }
        chain.filter(|c| c.latest().is_some())
    }
}

fn fixed_base(value: &[u8], deleted: bool) -> Item {
    if deleted {
        Item::Deleted
    } else {
        Item::Data(value.to_vec())
    }
}

/// Все непустые слоты head → tail, по строке `repl:` на слот.
fn write_history<W: Write + ?Sized>(out: &mut W, chain: &UpdateChain) -> Result<()> {
    for slot in chain.slots() {
        match slot {
            UpdateSlot::Empty => {}
            UpdateSlot::Tombstone => write_overlay(out, CurrentValue::Deleted)?,
            UpdateSlot::Value(v) => write_overlay(out, CurrentValue::Updated(v))?,
        }
    }
    Ok(())
}

/// Строка замены: `repl: <len> {..}` или `repl: {deleted}`.
fn write_overlay<W: Write + ?Sized>(out: &mut W, v: CurrentValue<'_>) -> Result<()> {
    match v {
        CurrentValue::Updated(bytes) => {
            write!(out, "\trepl: {} {{", bytes.len())?;
            write_bytes(out, bytes)?;
            out.write_all(b"}\n")?;
        }
        CurrentValue::Deleted => out.write_all(b"\trepl: {deleted}\n")?,
        CurrentValue::Base(_) => {}
    }
    Ok(())
}
