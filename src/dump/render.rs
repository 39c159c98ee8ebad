//! dump/render: низкоуровневое форматирование (байты, адреса, счётчик вывода).

use std::fmt;
use std::io::{self, Write};

use crate::page::ADDR_INVALID;

/// Адрес; ADDR_INVALID печатается как "(none)".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddrDisplay(pub u32);

impl fmt::Display for AddrDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == ADDR_INVALID {
            f.write_str("(none)")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Печатаемые ASCII как есть, остальное: `\xx`.
pub fn write_bytes<W: Write + ?Sized>(out: &mut W, bytes: &[u8]) -> io::Result<()> {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut buf = Vec::with_capacity(bytes.len());
    for &b in bytes {
        if (0x20..=0x7e).contains(&b) {
            buf.push(b);
        } else {
            buf.extend_from_slice(&[b'\\', HEX[(b >> 4) as usize], HEX[(b & 0x0f) as usize]]);
        }
    }
    out.write_all(&buf)
}

/// Writer, считающий байты.
pub(crate) struct Counting<'a, W: Write + ?Sized> {
    inner: &'a mut W,
    written: u64,
}

impl<'a, W: Write + ?Sized> Counting<'a, W> {
    pub(crate) fn new(inner: &'a mut W) -> Self {
        Self { inner, written: 0 }
    }

    pub(crate) fn written(&self) -> u64 {
        self.written
    }
}

impl<W: Write + ?Sized> Write for Counting<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
