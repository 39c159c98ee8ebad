//! page/fixed: column-fixed страницы, плотный массив слотов или run-length группы.
//!
//! Plain:      `records` слотов по [flag u8][value fixed_len].
//! Run-length: `entries` групп по [repeat u16][flag u8][value fixed_len],
//!             сумма repeat обязана совпасть с header.records.
//! Флаг FIX_DELETE_FLAG (0x80) помечает удалённую запись.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{DumpError, Result};
use crate::page::common::{FIX_DELETE_FLAG, FIX_REPEAT_COUNT_LEN};
use crate::page::header::PageCounts;

/// Параметры раскладки (из настроек БД, не из страницы).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedLayout {
    pub fixed_len: usize,
    pub repeat_comp: bool,
}

impl FixedLayout {
    /// Ширина одного слота/группы на странице.
    pub fn unit_len(&self) -> usize {
        let slot = 1 + self.fixed_len;
        if self.repeat_comp {
            FIX_REPEAT_COUNT_LEN + slot
        } else {
            slot
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedSlot {
    pub value: Vec<u8>,
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeatGroup {
    pub count: u16,
    pub value: Vec<u8>,
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixedRecords {
    Plain(Vec<FixedSlot>),
    Repeat(Vec<RepeatGroup>),
}

impl FixedRecords {
    /// Число строк структурного дампа (слоты или группы).
    pub fn units(&self) -> usize {
        match self {
            FixedRecords::Plain(s) => s.len(),
            FixedRecords::Repeat(g) => g.len(),
        }
    }

    /// Логическое число записей.
    pub fn record_count(&self) -> u64 {
        match self {
            FixedRecords::Plain(s) => s.len() as u64,
            FixedRecords::Repeat(g) => g.iter().map(|g| g.count as u64).sum(),
        }
    }

    /// Развёрнутый per-record вид.
    pub fn expanded(&self) -> Vec<FixedSlot> {
        match self {
            FixedRecords::Plain(s) => s.clone(),
            FixedRecords::Repeat(g) => expand(g),
        }
    }
}

/// Смещение конца тела fixed-страницы (без чтения значений).
pub fn fixed_body_end(body_off: usize, counts: &PageCounts, layout: &FixedLayout) -> Result<usize> {
    let n = if layout.repeat_comp {
        counts.entries as u64
    } else {
        counts.records
    };
    (n as usize)
        .checked_mul(layout.unit_len())
        .and_then(|b| b.checked_add(body_off))
        .ok_or_else(|| DumpError::format("column-fixed body length overflows"))
}

/// Декодировать тело column-fixed страницы.
pub fn decode_fixed(
    page: &[u8],
    body_off: usize,
    counts: &PageCounts,
    layout: &FixedLayout,
) -> Result<FixedRecords> {
    if layout.fixed_len == 0 {
        return Err(DumpError::format("column-fixed page with fixed_len 0"));
    }
    let end = fixed_body_end(body_off, counts, layout)?;
    if end > page.len() {
        return Err(DumpError::format(format!(
            "column-fixed body ends at {} past page end {}",
            end,
            page.len()
        )));
    }
    let unit = layout.unit_len();
    let body = &page[body_off..end];

    if !layout.repeat_comp {
        let slots = body
            .chunks_exact(unit)
            .map(|s| FixedSlot {
                deleted: s[0] & FIX_DELETE_FLAG != 0,
                value: s[1..].to_vec(),
            })
            .collect();
        return Ok(FixedRecords::Plain(slots));
    }

    let mut groups = Vec::with_capacity(counts.entries as usize);
    let mut total = 0u64;
    for (i, g) in body.chunks_exact(unit).enumerate() {
        let count = LittleEndian::read_u16(&g[..FIX_REPEAT_COUNT_LEN]);
        if count == 0 {
            return Err(DumpError::format(format!("repeat group {} has zero count", i)));
        }
        total += count as u64;
        groups.push(RepeatGroup {
            count,
            deleted: g[FIX_REPEAT_COUNT_LEN] & FIX_DELETE_FLAG != 0,
            value: g[FIX_REPEAT_COUNT_LEN + 1..].to_vec(),
        });
    }
    if total != counts.records {
        return Err(DumpError::format(format!(
            "repeat counts sum to {}, header declares {} records",
            total, counts.records
        )));
    }
    Ok(FixedRecords::Repeat(groups))
}

/// Развернуть группы в записи: ровно sum(count) штук.
pub fn expand(groups: &[RepeatGroup]) -> Vec<FixedSlot> {
    let total: usize = groups.iter().map(|g| g.count as usize).sum();
    let mut out = Vec::with_capacity(total);
    for g in groups {
        for _ in 0..g.count {
            out.push(FixedSlot {
                value: g.value.clone(),
                deleted: g.deleted,
            });
        }
    }
    out
}

/// Сгруппировать соседние равные записи (обратная операция к expand).
pub fn regroup(slots: &[FixedSlot]) -> Vec<RepeatGroup> {
    let mut out: Vec<RepeatGroup> = Vec::new();
    for s in slots {
        match out.last_mut() {
            Some(g) if g.value == s.value && g.deleted == s.deleted && g.count < u16::MAX => {
                g.count += 1;
            }
            _ => out.push(RepeatGroup {
                count: 1,
                value: s.value.clone(),
                deleted: s.deleted,
            }),
        }
    }
    out
}

/// Записать слот/группу в конец буфера (для построения страниц).
pub fn encode_unit(out: &mut Vec<u8>, layout: &FixedLayout, count: u16, value: &[u8], deleted: bool) -> Result<()> {
    if value.len() != layout.fixed_len {
        return Err(DumpError::format(format!(
            "fixed value has {} bytes, layout expects {}",
            value.len(),
            layout.fixed_len
        )));
    }
    if layout.repeat_comp {
        let mut c = [0u8; FIX_REPEAT_COUNT_LEN];
        LittleEndian::write_u16(&mut c, count);
        out.extend_from_slice(&c);
    }
    out.push(if deleted { FIX_DELETE_FLAG } else { 0 });
    out.extend_from_slice(value);
    Ok(())
}
