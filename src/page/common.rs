//! page/common: общие константы/offset’ы страниц B-дерева (заголовок, items, descriptor, fixed).

// ---------- Заголовок страницы (32 байта) ----------

/// Размер заголовка любой страницы.
pub const PAGE_HDR_SIZE: usize = 32;

/// lsn[0] (u32): номер файла журнала.
pub const OFF_LSN_FILE: usize = 0;
/// lsn[1] (u32): смещение в файле журнала.
pub const OFF_LSN_OFFSET: usize = 4;
/// checksum (u32): переносится как есть, здесь не проверяется.
pub const OFF_CHECKSUM: usize = 8;
/// entries (u32) или data_len (u32) для overflow-страниц.
pub const OFF_ENTRIES: usize = 12;
/// type (u8).
pub const OFF_TYPE: usize = 16;
/// level (u8).
pub const OFF_LEVEL: usize = 17;
/// records (u64).
pub const OFF_RECORDS: usize = 20;

// ---------- Коды типов страниц ----------
pub const PAGE_TYPE_DESCRIPTOR: u8 = 1;
pub const PAGE_TYPE_COL_FIX: u8 = 2;
pub const PAGE_TYPE_COL_INT: u8 = 3;
pub const PAGE_TYPE_COL_VAR: u8 = 4;
pub const PAGE_TYPE_DUP_INT: u8 = 5;
pub const PAGE_TYPE_DUP_LEAF: u8 = 6;
pub const PAGE_TYPE_OVERFLOW: u8 = 7;
pub const PAGE_TYPE_ROW_INT: u8 = 8;
pub const PAGE_TYPE_ROW_LEAF: u8 = 9;

// ---------- Items ----------

/// Tag word: [type u8 << 24 | len u24] (LE u32).
pub const ITEM_HDR_LEN: usize = 4;
/// Items выровнены по 4 байтам.
pub const ITEM_ALIGN: usize = 4;
pub const ITEM_TYPE_SHIFT: u32 = 24;
pub const ITEM_LEN_MASK: u32 = 0x00FF_FFFF;

pub const ITEM_KEY: u8 = 1;
pub const ITEM_KEY_OVFL: u8 = 2;
pub const ITEM_DATA: u8 = 3;
pub const ITEM_DATA_OVFL: u8 = 4;
pub const ITEM_DUP: u8 = 5;
pub const ITEM_DUP_OVFL: u8 = 6;
pub const ITEM_DEL: u8 = 7;
pub const ITEM_OFF: u8 = 8;

/// Payload overflow-ссылки: [addr u32][size u32].
pub const OVFL_REF_LEN: usize = 8;
/// Payload off-page ссылки: [addr u32][size u32][records u64].
pub const OFF_REF_LEN: usize = 16;

/// Зарезервированный "невалидный" адрес.
pub const ADDR_INVALID: u32 = u32::MAX;

/// Размер единицы аллокации по умолчанию (адреса считаются в этих единицах).
pub const DEFAULT_ALLOCATION_SIZE: u32 = 512;

// ---------- Column-fixed ----------

/// Флаг удалённой записи (первый байт слота/группы).
pub const FIX_DELETE_FLAG: u8 = 0x80;
/// Длина repeat-счётчика в run-length группе.
pub const FIX_REPEAT_COUNT_LEN: usize = 2;

// ---------- Descriptor (page 0) ----------

pub const DESC_MAGIC: u32 = 120_897;
pub const DESC_MAJOR: u16 = 0;
pub const DESC_MINOR: u16 = 1;
/// Длина description record (тело страницы 0).
pub const DESC_LEN: usize = 56;
/// Флаг descriptor: run-length сжатие fixed-записей.
pub const DESC_FLAG_REPEAT_COMP: u32 = 0x1;

pub const DESC_OFF_MAGIC: usize = 0;
pub const DESC_OFF_MAJOR: usize = 4;
pub const DESC_OFF_MINOR: usize = 6;
pub const DESC_OFF_INTL_MIN: usize = 8;
pub const DESC_OFF_INTL_MAX: usize = 12;
pub const DESC_OFF_LEAF_MIN: usize = 16;
pub const DESC_OFF_LEAF_MAX: usize = 20;
pub const DESC_OFF_BASE_RECNO: usize = 24;
pub const DESC_OFF_ROOT_ADDR: usize = 32;
pub const DESC_OFF_ROOT_SIZE: usize = 36;
pub const DESC_OFF_FREE_ADDR: usize = 40;
pub const DESC_OFF_FREE_SIZE: usize = 44;
pub const DESC_OFF_FIXED_LEN: usize = 48;
pub const DESC_OFF_FLAGS: usize = 52;

/// Выравнивание длины payload item'а.
#[inline]
pub fn item_align(len: usize) -> usize {
    (len + ITEM_ALIGN - 1) & !(ITEM_ALIGN - 1)
}

/// Округлить байтовый размер вверх до единицы аллокации.
#[inline]
pub fn round_to_alloc(bytes: u64, allocation_size: u32) -> u64 {
    let a = allocation_size.max(1) as u64;
    bytes.div_ceil(a) * a
}
