//! dump/body: on-disk вид страницы.
//!
//! decode_body разбирает тело целиком (без overflow и декомпрессии) и
//! вычисляет first-free; печать идёт только после успешного разбора.

use std::io::Write;

use crate::error::{DumpError, Result};
use crate::page::common::DESC_LEN;
use crate::page::fixed::{decode_fixed, fixed_body_end};
use crate::page::index::off_page_array;
use crate::page::{Descriptor, FixedRecords, Item, ItemIter, OffPageRef, Page, PageBody, PageHeader, PageType};
use crate::source::PageSource;

use super::render::{write_bytes, AddrDisplay};
use super::{DumpStats, Dumper};

pub(crate) enum Body {
    Descriptor(Descriptor),
    Items(Vec<Item>),
    OffPages(Vec<OffPageRef>),
    Fixed(FixedRecords),
    Overflow,
}

pub(crate) struct DecodedBody {
    pub body: Body,
    /// Смещение первого свободного байта.
    pub first_free: usize,
}

impl<'s, S: PageSource + ?Sized> Dumper<'s, S> {
    pub(crate) fn decode_body(&self, page: &Page, hdr: &PageHeader, body_off: usize) -> Result<DecodedBody> {
        let bytes = &page.bytes;
        let t = hdr.page_type();
        let counts = match hdr.body {
            PageBody::Overflow { data_len } => {
                return Ok(DecodedBody {
                    body: Body::Overflow,
                    first_free: body_off + data_len as usize,
                })
            }
            other => other.counts().ok_or_else(|| DumpError::format("page without counts"))?,
        };

        match t {
            PageType::Descriptor => {
                let d = Descriptor::read(&bytes[body_off..])?;
                Ok(DecodedBody {
                    body: Body::Descriptor(d),
                    first_free: body_off + DESC_LEN,
                })
            }
            PageType::ColInternal => {
                let refs = off_page_array(bytes, body_off, counts.entries)?;
                let first_free = body_off + refs.len() * crate::page::common::OFF_REF_LEN;
                Ok(DecodedBody {
                    body: Body::OffPages(refs),
                    first_free,
                })
            }
            PageType::ColFixed => {
                let layout = self.cfg.fixed_layout();
                let recs = decode_fixed(bytes, body_off, &counts, &layout)?;
                Ok(DecodedBody {
                    body: Body::Fixed(recs),
                    first_free: fixed_body_end(body_off, &counts, &layout)?,
                })
            }
            _ => {
                let mut iter = ItemIter::new(bytes, t, body_off, counts.entries);
                let items = iter.by_ref().collect::<Result<Vec<_>>>()?;
                Ok(DecodedBody {
                    body: Body::Items(items),
                    first_free: iter.offset(),
                })
            }
        }
    }

    pub(crate) fn write_page_header<W: Write + ?Sized>(
        &self,
        out: &mut W,
        page: &Page,
        hdr: &PageHeader,
        first_free: usize,
    ) -> Result<()> {
        self.write_range_line(out, page)?;
        writeln!(
            out,
            "\taddr {}, size {}, lsn {}/{}",
            AddrDisplay(page.addr),
            page.size,
            hdr.lsn.file,
            hdr.lsn.offset
        )?;
        let name = hdr.page_type().name();
        match hdr.body {
            PageBody::Overflow { data_len } => writeln!(out, "\t{}: bytes {}", name, data_len)?,
            other => {
                if let Some(c) = other.counts() {
                    writeln!(
                        out,
                        "\t{}: level {}, entries {}, records {}",
                        name, c.level, c.entries, c.records
                    )?;
                }
                writeln!(
                    out,
                    "\tfirst-free {:#x}, space avail {}",
                    first_free,
                    (page.size as usize).saturating_sub(first_free)
                )?;
            }
        }
        writeln!(out)?;
        Ok(())
    }

    pub(crate) fn write_body<W: Write + ?Sized>(
        &self,
        out: &mut W,
        decoded: &DecodedBody,
        stats: &mut DumpStats,
    ) -> Result<()> {
        match &decoded.body {
            Body::Overflow => {}
            Body::Descriptor(d) => write_descriptor(out, d)?,
            Body::OffPages(refs) => {
                for r in refs {
                    write_off_page(out, r)?;
                    stats.entries += 1;
                }
            }
            Body::Fixed(FixedRecords::Plain(slots)) => {
                for s in slots {
                    out.write_all(b"\t{")?;
                    write_fixed_value(out, &s.value, s.deleted)?;
                    out.write_all(b"}\n")?;
                    stats.entries += 1;
                }
            }
            Body::Fixed(FixedRecords::Repeat(groups)) => {
                for g in groups {
                    write!(out, "\trepeat {} {{", g.count)?;
                    write_fixed_value(out, &g.value, g.deleted)?;
                    out.write_all(b"}\n")?;
                    stats.entries += 1;
                }
            }
            Body::Items(items) => {
                let mut hold = Vec::new();
                let mut scratch = Vec::new();
                for item in items {
                    self.write_item(out, item, &mut hold, &mut scratch, stats)?;
                    stats.entries += 1;
                }
            }
        }
        Ok(())
    }

    fn write_item<W: Write + ?Sized>(
        &self,
        out: &mut W,
        item: &Item,
        hold: &mut Vec<u8>,
        scratch: &mut Vec<u8>,
        stats: &mut DumpStats,
    ) -> Result<()> {
        if let Item::OffPage(o) = item {
            writeln!(
                out,
                "\ttype {}, len {}, addr {}, size {}, records {}",
                item.item_type().name(),
                item.len(),
                AddrDisplay(o.addr),
                o.size,
                o.records
            )?;
            return Ok(());
        }
        // данные разрешаются до печати строки item'а
        let data = self.item_data(item, hold, scratch, stats)?;
        write!(out, "\ttype {}, len {}", item.item_type().name(), item.len())?;
        if let Some(r) = item.overflow_ref() {
            write!(out, ", addr {}, size {}", AddrDisplay(r.addr), r.size)?;
        }
        out.write_all(b"\n\t{")?;
        write_bytes(out, data)?;
        out.write_all(b"}\n")?;
        Ok(())
    }
}

pub(crate) fn write_off_page<W: Write + ?Sized>(out: &mut W, r: &OffPageRef) -> Result<()> {
    writeln!(
        out,
        "\toffpage, addr {}, size {}, records {}",
        AddrDisplay(r.addr),
        r.size,
        r.records
    )?;
    Ok(())
}

pub(crate) fn write_fixed_value<W: Write + ?Sized>(out: &mut W, value: &[u8], deleted: bool) -> Result<()> {
    if deleted {
        out.write_all(super::DELETED)?;
    } else {
        write_bytes(out, value)?;
    }
    Ok(())
}

fn write_descriptor<W: Write + ?Sized>(out: &mut W, d: &Descriptor) -> Result<()> {
    writeln!(out, "\tdescription record: {{")?;
    writeln!(out, "\t\tmagic: {}, major: {}, minor: {}", d.magic, d.major, d.minor)?;
    writeln!(out, "\t\tinternal page min/max size: {}/{}", d.intl_min, d.intl_max)?;
    writeln!(out, "\t\tleaf page min/max size: {}/{}", d.leaf_min, d.leaf_max)?;
    writeln!(out, "\t\tbase record: {}, fixed_len: {}", d.base_recno, d.fixed_len)?;
    write_desc_addr(out, "root", d.root_addr, d.root_size)?;
    write_desc_addr(out, "free", d.free_addr, d.free_size)?;
    writeln!(out, "\t}}")?;
    Ok(())
}

fn write_desc_addr<W: Write + ?Sized>(out: &mut W, what: &str, addr: u32, size: u32) -> Result<()> {
    if addr == crate::page::ADDR_INVALID {
        writeln!(out, "\t\t{} addr {}", what, AddrDisplay(addr))?;
    } else {
        writeln!(out, "\t\t{} addr {}, size {}", what, addr, size)?;
    }
    Ok(())
}
