//! codec: энтропийное декодирование ключей/данных.
//!
//! - EntropyDecoder: контракт внешнего декодера (таблица + scratch-буфер вызывающего).
//! - EntropyTables : отдельные таблицы для ключей и данных; None означает identity.
//! - ZstdDecoder   : потоковая zstd-декомпрессия с лимитом на размер результата.

use std::io::{Cursor, Read};
use std::sync::Arc;

use anyhow::anyhow;

use crate::error::{DumpError, Result};

/// Какой таблицей декодировать.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecKind {
    Key,
    Data,
}

impl CodecKind {
    pub fn name(self) -> &'static str {
        match self {
            CodecKind::Key => "key",
            CodecKind::Data => "data",
        }
    }
}

pub trait EntropyDecoder: Send + Sync {
    /// Декодировать `src` в `scratch` (буфер очищается декодером).
    fn decode(&self, src: &[u8], scratch: &mut Vec<u8>) -> anyhow::Result<()>;
}

#[derive(Clone, Default)]
pub struct EntropyTables {
    pub key: Option<Arc<dyn EntropyDecoder>>,
    pub data: Option<Arc<dyn EntropyDecoder>>,
}

impl std::fmt::Debug for EntropyTables {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntropyTables")
            .field("key", &self.key.is_some())
            .field("data", &self.data.is_some())
            .finish()
    }
}

impl EntropyTables {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_key(mut self, d: Arc<dyn EntropyDecoder>) -> Self {
        self.key = Some(d);
        self
    }

    pub fn with_data(mut self, d: Arc<dyn EntropyDecoder>) -> Self {
        self.data = Some(d);
        self
    }

    pub fn table(&self, kind: CodecKind) -> Option<&Arc<dyn EntropyDecoder>> {
        match kind {
            CodecKind::Key => self.key.as_ref(),
            CodecKind::Data => self.data.as_ref(),
        }
    }

    /// Декодировать байты; без таблицы возвращает вход как есть.
    pub fn decode<'b>(&self, kind: CodecKind, src: &'b [u8], scratch: &'b mut Vec<u8>) -> Result<&'b [u8]> {
        match self.table(kind) {
            None => Ok(src),
            Some(t) => {
                t.decode(src, scratch).map_err(|e| DumpError::Compression {
                    kind: kind.name(),
                    reason: format!("{:#}", e),
                })?;
                Ok(scratch.as_slice())
            }
        }
    }
}

/// zstd-декодер; результат ограничен `max_bytes`.
#[derive(Debug, Clone)]
pub struct ZstdDecoder {
    max_bytes: usize,
}

impl ZstdDecoder {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }
}

impl EntropyDecoder for ZstdDecoder {
    fn decode(&self, src: &[u8], scratch: &mut Vec<u8>) -> anyhow::Result<()> {
        scratch.clear();
        let mut decoder = zstd::stream::read::Decoder::new(Cursor::new(src))
            .map_err(|e| anyhow!("zstd decoder init: {}", e))?;

        const TMP_BUF: usize = 16 * 1024;
        let mut tmp = [0u8; TMP_BUF];
        loop {
            let n = decoder
                .read(&mut tmp)
                .map_err(|e| anyhow!("zstd decode read: {}", e))?;
            if n == 0 {
                break;
            }
            if scratch.len() + n > self.max_bytes {
                return Err(anyhow!(
                    "decoded data exceeds max_value_bytes {}",
                    self.max_bytes
                ));
            }
            scratch.extend_from_slice(&tmp[..n]);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_without_table() {
        let t = EntropyTables::none();
        let mut scratch = Vec::new();
        assert_eq!(t.decode(CodecKind::Key, b"abc", &mut scratch).unwrap(), b"abc");
    }

    #[test]
    fn zstd_roundtrip_and_limit() {
        let raw = b"hello hello hello hello".to_vec();
        let packed = zstd::encode_all(&raw[..], 3).unwrap();
        let t = EntropyTables::none().with_data(Arc::new(ZstdDecoder::new(1024)));
        let mut scratch = Vec::new();
        assert_eq!(t.decode(CodecKind::Data, &packed, &mut scratch).unwrap(), &raw[..]);
        // ключи без таблицы идут как есть
        assert_eq!(t.decode(CodecKind::Key, b"k", &mut scratch).unwrap(), b"k");

        let tight = EntropyTables::none().with_data(Arc::new(ZstdDecoder::new(4)));
        let err = tight.decode(CodecKind::Data, &packed, &mut scratch).unwrap_err();
        assert!(matches!(err, DumpError::Compression { kind: "data", .. }));
    }

    #[test]
    fn garbage_is_compression_error() {
        let t = EntropyTables::none().with_key(Arc::new(ZstdDecoder::new(1024)));
        let mut scratch = Vec::new();
        assert!(matches!(
            t.decode(CodecKind::Key, b"not zstd at all", &mut scratch),
            Err(DumpError::Compression { kind: "key", .. })
        ));
    }
}
