//! page/header: фиксированный 32-байтовый заголовок страницы (read/write).
//!
//! Union "entries или data_len" из формата представлен явно: `PageBody` несёт
//! только поля, осмысленные для данного типа страницы.

use byteorder::{ByteOrder, LittleEndian};
use serde::Serialize;

use crate::error::{DumpError, Result};
use crate::page::common::{
    OFF_CHECKSUM, OFF_ENTRIES, OFF_LEVEL, OFF_LSN_FILE, OFF_LSN_OFFSET, OFF_RECORDS, OFF_TYPE,
    PAGE_HDR_SIZE, PAGE_TYPE_COL_FIX, PAGE_TYPE_COL_INT, PAGE_TYPE_COL_VAR, PAGE_TYPE_DESCRIPTOR,
    PAGE_TYPE_DUP_INT, PAGE_TYPE_DUP_LEAF, PAGE_TYPE_OVERFLOW, PAGE_TYPE_ROW_INT,
    PAGE_TYPE_ROW_LEAF,
};

/// Тип страницы (закрытый набор).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageType {
    Descriptor,
    ColFixed,
    ColInternal,
    ColVar,
    DupInternal,
    DupLeaf,
    Overflow,
    RowInternal,
    RowLeaf,
}

impl PageType {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            PAGE_TYPE_DESCRIPTOR => Some(PageType::Descriptor),
            PAGE_TYPE_COL_FIX => Some(PageType::ColFixed),
            PAGE_TYPE_COL_INT => Some(PageType::ColInternal),
            PAGE_TYPE_COL_VAR => Some(PageType::ColVar),
            PAGE_TYPE_DUP_INT => Some(PageType::DupInternal),
            PAGE_TYPE_DUP_LEAF => Some(PageType::DupLeaf),
            PAGE_TYPE_OVERFLOW => Some(PageType::Overflow),
            PAGE_TYPE_ROW_INT => Some(PageType::RowInternal),
            PAGE_TYPE_ROW_LEAF => Some(PageType::RowLeaf),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            PageType::Descriptor => PAGE_TYPE_DESCRIPTOR,
            PageType::ColFixed => PAGE_TYPE_COL_FIX,
            PageType::ColInternal => PAGE_TYPE_COL_INT,
            PageType::ColVar => PAGE_TYPE_COL_VAR,
            PageType::DupInternal => PAGE_TYPE_DUP_INT,
            PageType::DupLeaf => PAGE_TYPE_DUP_LEAF,
            PageType::Overflow => PAGE_TYPE_OVERFLOW,
            PageType::RowInternal => PAGE_TYPE_ROW_INT,
            PageType::RowLeaf => PAGE_TYPE_ROW_LEAF,
        }
    }

    /// Имя типа в текстовом отчёте.
    pub fn name(self) -> &'static str {
        match self {
            PageType::Descriptor => "descriptor",
            PageType::ColFixed => "column-fixed",
            PageType::ColInternal => "column-internal",
            PageType::ColVar => "column-variable",
            PageType::DupInternal => "duplicate-internal",
            PageType::DupLeaf => "duplicate-leaf",
            PageType::Overflow => "overflow",
            PageType::RowInternal => "row-internal",
            PageType::RowLeaf => "row-leaf",
        }
    }

    /// Листовые страницы не могут содержать off-page ссылки.
    pub fn is_leaf(self) -> bool {
        matches!(self, PageType::RowLeaf | PageType::DupLeaf | PageType::ColVar | PageType::ColFixed)
    }

    /// Страницы из последовательности tagged items.
    pub fn has_items(self) -> bool {
        matches!(
            self,
            PageType::RowInternal
                | PageType::RowLeaf
                | PageType::DupInternal
                | PageType::DupLeaf
                | PageType::ColVar
        )
    }
}

/// LSN: пара 32-битных счётчиков.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Lsn {
    pub file: u32,
    pub offset: u32,
}

/// Счётчики страницы с items/записями.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PageCounts {
    pub level: u8,
    pub entries: u32,
    pub records: u64,
}

/// Тело заголовка: одна ветка на тип страницы.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PageBody {
    Descriptor(PageCounts),
    ColFixed(PageCounts),
    ColInternal(PageCounts),
    ColVar(PageCounts),
    DupInternal(PageCounts),
    DupLeaf(PageCounts),
    Overflow { data_len: u32 },
    RowInternal(PageCounts),
    RowLeaf(PageCounts),
}

impl PageBody {
    pub fn page_type(&self) -> PageType {
        match self {
            PageBody::Descriptor(_) => PageType::Descriptor,
            PageBody::ColFixed(_) => PageType::ColFixed,
            PageBody::ColInternal(_) => PageType::ColInternal,
            PageBody::ColVar(_) => PageType::ColVar,
            PageBody::DupInternal(_) => PageType::DupInternal,
            PageBody::DupLeaf(_) => PageType::DupLeaf,
            PageBody::Overflow { .. } => PageType::Overflow,
            PageBody::RowInternal(_) => PageType::RowInternal,
            PageBody::RowLeaf(_) => PageType::RowLeaf,
        }
    }

    /// Счётчики (None для overflow-страниц).
    pub fn counts(&self) -> Option<PageCounts> {
        match *self {
            PageBody::Descriptor(c)
            | PageBody::ColFixed(c)
            | PageBody::ColInternal(c)
            | PageBody::ColVar(c)
            | PageBody::DupInternal(c)
            | PageBody::DupLeaf(c)
            | PageBody::RowInternal(c)
            | PageBody::RowLeaf(c) => Some(c),
            PageBody::Overflow { .. } => None,
        }
    }

    /// Собрать тело по типу; для Overflow `entries` трактуется как data_len.
    pub fn new(page_type: PageType, counts: PageCounts) -> Self {
        match page_type {
            PageType::Descriptor => PageBody::Descriptor(counts),
            PageType::ColFixed => PageBody::ColFixed(counts),
            PageType::ColInternal => PageBody::ColInternal(counts),
            PageType::ColVar => PageBody::ColVar(counts),
            PageType::DupInternal => PageBody::DupInternal(counts),
            PageType::DupLeaf => PageBody::DupLeaf(counts),
            PageType::Overflow => PageBody::Overflow { data_len: counts.entries },
            PageType::RowInternal => PageBody::RowInternal(counts),
            PageType::RowLeaf => PageBody::RowLeaf(counts),
        }
    }
}

/// Разобранный заголовок страницы.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageHeader {
    pub lsn: Lsn,
    pub checksum: u32,
    #[serde(flatten)]
    pub body: PageBody,
}

impl PageHeader {
    pub fn page_type(&self) -> PageType {
        self.body.page_type()
    }
}

/// Прочитать заголовок. Возвращает заголовок и смещение начала тела.
/// Неизвестный тип страницы: фатальная ошибка формата.
pub fn header_read(page: &[u8]) -> Result<(PageHeader, usize)> {
    if page.len() < PAGE_HDR_SIZE {
        return Err(DumpError::format(format!(
            "page buffer too small for header ({} < {})",
            page.len(),
            PAGE_HDR_SIZE
        )));
    }
    let code = page[OFF_TYPE];
    let page_type = PageType::from_code(code)
        .ok_or_else(|| DumpError::format(format!("unknown page type {}", code)))?;

    let counts = PageCounts {
        level: page[OFF_LEVEL],
        entries: LittleEndian::read_u32(&page[OFF_ENTRIES..OFF_ENTRIES + 4]),
        records: LittleEndian::read_u64(&page[OFF_RECORDS..OFF_RECORDS + 8]),
    };

    let hdr = PageHeader {
        lsn: Lsn {
            file: LittleEndian::read_u32(&page[OFF_LSN_FILE..OFF_LSN_FILE + 4]),
            offset: LittleEndian::read_u32(&page[OFF_LSN_OFFSET..OFF_LSN_OFFSET + 4]),
        },
        checksum: LittleEndian::read_u32(&page[OFF_CHECKSUM..OFF_CHECKSUM + 4]),
        body: PageBody::new(page_type, counts),
    };
    Ok((hdr, PAGE_HDR_SIZE))
}

/// Записать заголовок (без пересчёта checksum).
pub fn header_write(page: &mut [u8], h: &PageHeader) -> Result<()> {
    if page.len() < PAGE_HDR_SIZE {
        return Err(DumpError::format("page buffer too small for header"));
    }
    for b in &mut page[..PAGE_HDR_SIZE] {
        *b = 0;
    }
    LittleEndian::write_u32(&mut page[OFF_LSN_FILE..OFF_LSN_FILE + 4], h.lsn.file);
    LittleEndian::write_u32(&mut page[OFF_LSN_OFFSET..OFF_LSN_OFFSET + 4], h.lsn.offset);
    LittleEndian::write_u32(&mut page[OFF_CHECKSUM..OFF_CHECKSUM + 4], h.checksum);
    page[OFF_TYPE] = h.page_type().code();

    match h.body.counts() {
        Some(c) => {
            LittleEndian::write_u32(&mut page[OFF_ENTRIES..OFF_ENTRIES + 4], c.entries);
            page[OFF_LEVEL] = c.level;
            LittleEndian::write_u64(&mut page[OFF_RECORDS..OFF_RECORDS + 8], c.records);
        }
        None => {
            if let PageBody::Overflow { data_len } = h.body {
                LittleEndian::write_u32(&mut page[OFF_ENTRIES..OFF_ENTRIES + 4], data_len);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_roundtrip_row_leaf() {
        let mut buf = vec![0u8; 64];
        let h = PageHeader {
            lsn: Lsn { file: 3, offset: 77 },
            checksum: 0,
            body: PageBody::RowLeaf(PageCounts { level: 1, entries: 4, records: 2 }),
        };
        header_write(&mut buf, &h).unwrap();
        let (got, body_off) = header_read(&buf).unwrap();
        assert_eq!(got, h);
        assert_eq!(body_off, PAGE_HDR_SIZE);
    }

    #[test]
    fn overflow_reinterprets_entries_as_length() {
        let mut buf = vec![0u8; PAGE_HDR_SIZE];
        buf[OFF_TYPE] = PAGE_TYPE_OVERFLOW;
        LittleEndian::write_u32(&mut buf[OFF_ENTRIES..OFF_ENTRIES + 4], 1234);
        let (h, _) = header_read(&buf).unwrap();
        assert_eq!(h.body, PageBody::Overflow { data_len: 1234 });
        assert!(h.body.counts().is_none());
    }

    #[test]
    fn unknown_type_is_illegal_format() {
        for code in [0u8, 10, 0x7f, 0xff] {
            let mut buf = vec![0u8; PAGE_HDR_SIZE];
            buf[OFF_TYPE] = code;
            let err = header_read(&buf).unwrap_err();
            assert!(matches!(err, DumpError::IllegalFormat(_)), "code {code}: {err}");
        }
    }

    #[test]
    fn short_buffer_rejected() {
        assert!(matches!(header_read(&[0u8; 8]), Err(DumpError::IllegalFormat(_))));
    }

    #[test]
    fn type_codes_are_closed() {
        for code in 0..=255u8 {
            if let Some(t) = PageType::from_code(code) {
                assert_eq!(t.code(), code);
            }
        }
    }
}
