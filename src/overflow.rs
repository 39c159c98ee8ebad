//! overflow: чтение overflow-записи по ссылке из item'а.
//!
//! - Страница захватывается через PageGuard и возвращается на любом пути (успех/ошибка).
//! - Размер страницы выводится из длины данных: round_up(hdr + size, allocation_size).
//! - Payload возвращается как сырые байты; глубина разрешения = 1
//!   (overflow-данные никогда не интерпретируются как ещё одна ссылка).
//! - Guard на размер: ref.size > max_value_bytes даёт ошибку формата.

use log::debug;

use crate::config::DumpConfig;
use crate::error::{DumpError, Result};
use crate::metrics::record_overflow_resolved;
use crate::page::{header_read, OverflowRef, PageBody};
use crate::source::{PageGuard, PageSource};

/// Данные overflow-страницы.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverflowRecord {
    pub size: u32,
    pub bytes: Vec<u8>,
}

pub fn resolve_overflow<S: PageSource + ?Sized>(
    source: &S,
    cfg: &DumpConfig,
    r: &OverflowRef,
) -> Result<OverflowRecord> {
    if r.size as usize > cfg.max_value_bytes {
        return Err(DumpError::format(format!(
            "overflow ref {}/{} exceeds max_value_bytes {}",
            r.addr, r.size, cfg.max_value_bytes
        )));
    }
    let page_size = u32::try_from(cfg.overflow_page_size(r.size)).map_err(|_| {
        DumpError::format(format!("overflow ref {}/{} page size overflows", r.addr, r.size))
    })?;
    debug!("resolve overflow addr={} len={} page_size={}", r.addr, r.size, page_size);

    let guard = PageGuard::acquire(source, r.addr, page_size, true)?;
    let bytes = &guard.bytes;
    let (hdr, body_off) = header_read(bytes)?;
    let data_len = match hdr.body {
        PageBody::Overflow { data_len } => data_len,
        other => {
            return Err(DumpError::format(format!(
                "overflow ref {} points at a {} page",
                r.addr,
                other.page_type().name()
            )))
        }
    };
    if data_len < r.size {
        return Err(DumpError::format(format!(
            "overflow page {} holds {} bytes, ref expects {}",
            r.addr, data_len, r.size
        )));
    }
    let end = body_off + r.size as usize;
    if end > bytes.len() {
        return Err(DumpError::format(format!(
            "overflow page {} data ends at {} past page end {}",
            r.addr,
            end,
            bytes.len()
        )));
    }
    let out = OverflowRecord {
        size: r.size,
        bytes: bytes[body_off..end].to_vec(),
    };
    record_overflow_resolved(out.bytes.len());
    Ok(out)
}
