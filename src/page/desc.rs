//! page/desc: description record страницы 0.

use byteorder::{ByteOrder, LittleEndian};
use serde::Serialize;

use crate::error::{DumpError, Result};
use crate::page::common::{
    ADDR_INVALID, DESC_FLAG_REPEAT_COMP, DESC_LEN, DESC_MAGIC, DESC_MAJOR, DESC_MINOR,
    DESC_OFF_BASE_RECNO, DESC_OFF_FIXED_LEN, DESC_OFF_FLAGS, DESC_OFF_FREE_ADDR,
    DESC_OFF_FREE_SIZE, DESC_OFF_INTL_MAX, DESC_OFF_INTL_MIN, DESC_OFF_LEAF_MAX,
    DESC_OFF_LEAF_MIN, DESC_OFF_MAGIC, DESC_OFF_MAJOR, DESC_OFF_MINOR, DESC_OFF_ROOT_ADDR,
    DESC_OFF_ROOT_SIZE,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Descriptor {
    pub magic: u32,
    pub major: u16,
    pub minor: u16,
    pub intl_min: u32,
    pub intl_max: u32,
    pub leaf_min: u32,
    pub leaf_max: u32,
    pub base_recno: u64,
    pub fixed_len: u8,
    pub root_addr: u32,
    pub root_size: u32,
    pub free_addr: u32,
    pub free_size: u32,
    pub flags: u32,
}

impl Default for Descriptor {
    fn default() -> Self {
        Self {
            magic: DESC_MAGIC,
            major: DESC_MAJOR,
            minor: DESC_MINOR,
            intl_min: 512,
            intl_max: 2048,
            leaf_min: 512,
            leaf_max: 4096,
            base_recno: 1,
            fixed_len: 0,
            root_addr: ADDR_INVALID,
            root_size: 0,
            free_addr: ADDR_INVALID,
            free_size: 0,
            flags: 0,
        }
    }
}

impl Descriptor {
    pub fn repeat_comp(&self) -> bool {
        self.flags & DESC_FLAG_REPEAT_COMP != 0
    }

    /// Прочитать description record из тела страницы.
    pub fn read(body: &[u8]) -> Result<Self> {
        if body.len() < DESC_LEN {
            return Err(DumpError::format(format!(
                "descriptor record truncated ({} < {})",
                body.len(),
                DESC_LEN
            )));
        }
        let u32_at = |o: usize| LittleEndian::read_u32(&body[o..o + 4]);
        let u16_at = |o: usize| LittleEndian::read_u16(&body[o..o + 2]);
        Ok(Self {
            magic: u32_at(DESC_OFF_MAGIC),
            major: u16_at(DESC_OFF_MAJOR),
            minor: u16_at(DESC_OFF_MINOR),
            intl_min: u32_at(DESC_OFF_INTL_MIN),
            intl_max: u32_at(DESC_OFF_INTL_MAX),
            leaf_min: u32_at(DESC_OFF_LEAF_MIN),
            leaf_max: u32_at(DESC_OFF_LEAF_MAX),
            base_recno: LittleEndian::read_u64(&body[DESC_OFF_BASE_RECNO..DESC_OFF_BASE_RECNO + 8]),
            fixed_len: body[DESC_OFF_FIXED_LEN],
            root_addr: u32_at(DESC_OFF_ROOT_ADDR),
            root_size: u32_at(DESC_OFF_ROOT_SIZE),
            free_addr: u32_at(DESC_OFF_FREE_ADDR),
            free_size: u32_at(DESC_OFF_FREE_SIZE),
            flags: u32_at(DESC_OFF_FLAGS),
        })
    }

    /// Закодировать record (DESC_LEN байт).
    pub fn encode(&self) -> Vec<u8> {
        let mut b = vec![0u8; DESC_LEN];
        LittleEndian::write_u32(&mut b[DESC_OFF_MAGIC..], self.magic);
        LittleEndian::write_u16(&mut b[DESC_OFF_MAJOR..], self.major);
        LittleEndian::write_u16(&mut b[DESC_OFF_MINOR..], self.minor);
        LittleEndian::write_u32(&mut b[DESC_OFF_INTL_MIN..], self.intl_min);
        LittleEndian::write_u32(&mut b[DESC_OFF_INTL_MAX..], self.intl_max);
        LittleEndian::write_u32(&mut b[DESC_OFF_LEAF_MIN..], self.leaf_min);
        LittleEndian::write_u32(&mut b[DESC_OFF_LEAF_MAX..], self.leaf_max);
        LittleEndian::write_u64(&mut b[DESC_OFF_BASE_RECNO..], self.base_recno);
        LittleEndian::write_u32(&mut b[DESC_OFF_ROOT_ADDR..], self.root_addr);
        LittleEndian::write_u32(&mut b[DESC_OFF_ROOT_SIZE..], self.root_size);
        LittleEndian::write_u32(&mut b[DESC_OFF_FREE_ADDR..], self.free_addr);
        LittleEndian::write_u32(&mut b[DESC_OFF_FREE_SIZE..], self.free_size);
        b[DESC_OFF_FIXED_LEN] = self.fixed_len;
        LittleEndian::write_u32(&mut b[DESC_OFF_FLAGS..], self.flags);
        b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_roundtrip() {
        let d = Descriptor {
            fixed_len: 4,
            root_addr: 2,
            root_size: 1024,
            flags: DESC_FLAG_REPEAT_COMP,
            ..Default::default()
        };
        let got = Descriptor::read(&d.encode()).unwrap();
        assert_eq!(got, d);
        assert!(got.repeat_comp());
    }

    #[test]
    fn truncated_record_rejected() {
        assert!(Descriptor::read(&[0u8; 10]).is_err());
    }
}
