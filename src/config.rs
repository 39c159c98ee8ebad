//! Centralized configuration for TreeLens dumps.
//!
//! Goals:
//! - Single place to collect per-database settings the decoder needs but the page
//!   itself does not carry (allocation unit, fixed record width, run-length mode).
//! - DumpConfig::from_env() reads TL_* env vars; fluent setters override them.
//! - A Dumper takes the config at construction and only reads it afterwards.
//!
//! Env:
//! - TL_ALLOC_SIZE      (default 512)
//! - TL_FIXED_LEN       (default 0)
//! - TL_REPEAT_COMP     (default false; "1|true|on|yes" => true)
//! - TL_FETCH_RETRIES   (default 1)
//! - TL_MAX_VALUE_BYTES (default 1 GiB)
//! - TL_REPL_HISTORY   (default false; in-memory вид печатает все замены)

use std::fmt;

use crate::page::common::{round_to_alloc, DEFAULT_ALLOCATION_SIZE, PAGE_HDR_SIZE};
use crate::page::{Descriptor, FixedLayout};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DumpConfig {
    /// Единица аллокации (байт); адреса страниц считаются в этих единицах.
    pub allocation_size: u32,

    /// Ширина значения column-fixed записи (байт).
    pub fixed_len: u8,

    /// Run-length сжатие column-fixed страниц.
    pub repeat_comp: bool,

    /// Сколько раз повторить fetch, вернувший Retry.
    pub fetch_retries: u32,

    /// Верхняя граница размера overflow-значения и результата декомпрессии.
    pub max_value_bytes: usize,

    /// In-memory вид: печатать всю цепочку замен (каждый непустой слот,
    /// от свежих к старым), а не только текущее значение.
    pub repl_history: bool,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            allocation_size: DEFAULT_ALLOCATION_SIZE,
            fixed_len: 0,
            repeat_comp: false,
            fetch_retries: 1,
            max_value_bytes: 1usize << 30,
            repl_history: false,
        }
    }
}

fn env_bool(name: &str) -> Option<bool> {
    std::env::var(name).ok().map(|v| {
        let s = v.trim().to_ascii_lowercase();
        s == "1" || s == "true" || s == "on" || s == "yes"
    })
}

fn env_num<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse::<T>().ok())
}

impl DumpConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(n) = env_num::<u32>("TL_ALLOC_SIZE") {
            if n > 0 {
                cfg.allocation_size = n;
            }
        }
        if let Some(n) = env_num::<u8>("TL_FIXED_LEN") {
            cfg.fixed_len = n;
        }
        if let Some(b) = env_bool("TL_REPEAT_COMP") {
            cfg.repeat_comp = b;
        }
        if let Some(n) = env_num::<u32>("TL_FETCH_RETRIES") {
            cfg.fetch_retries = n;
        }
        if let Some(n) = env_num::<usize>("TL_MAX_VALUE_BYTES") {
            cfg.max_value_bytes = n;
        }
        if let Some(b) = env_bool("TL_REPL_HISTORY") {
            cfg.repl_history = b;
        }
        cfg
    }

    pub fn with_allocation_size(mut self, bytes: u32) -> Self {
        self.allocation_size = bytes.max(1);
        self
    }

    pub fn with_fixed_len(mut self, len: u8) -> Self {
        self.fixed_len = len;
        self
    }

    pub fn with_repeat_comp(mut self, on: bool) -> Self {
        self.repeat_comp = on;
        self
    }

    pub fn with_fetch_retries(mut self, n: u32) -> Self {
        self.fetch_retries = n;
        self
    }

    pub fn with_max_value_bytes(mut self, n: usize) -> Self {
        self.max_value_bytes = n;
        self
    }

    pub fn with_repl_history(mut self, on: bool) -> Self {
        self.repl_history = on;
        self
    }

    /// Подхватить fixed_len и run-length режим из descriptor'а страницы 0.
    pub fn with_descriptor(mut self, d: &Descriptor) -> Self {
        self.fixed_len = d.fixed_len;
        self.repeat_comp = d.repeat_comp();
        self
    }

    pub fn fixed_layout(&self) -> FixedLayout {
        FixedLayout {
            fixed_len: self.fixed_len as usize,
            repeat_comp: self.repeat_comp,
        }
    }

    /// Сколько единиц аллокации занимает страница `size` байт.
    pub fn size_to_units(&self, size: u32) -> u32 {
        (size / self.allocation_size.max(1)).max(1)
    }

    /// Размер overflow-страницы (байт) для данных длины `data_len`.
    pub fn overflow_page_size(&self, data_len: u32) -> u64 {
        round_to_alloc(PAGE_HDR_SIZE as u64 + data_len as u64, self.allocation_size)
    }
}

impl fmt::Display for DumpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DumpConfig {{ \
             allocation_size: {}, \
             fixed_len: {}, \
             repeat_comp: {}, \
             fetch_retries: {}, \
             max_value_bytes: {}, \
             repl_history: {} \
             }}",
            self.allocation_size,
            self.fixed_len,
            self.repeat_comp,
            self.fetch_retries,
            self.max_value_bytes,
            self.repl_history,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::common::DESC_FLAG_REPEAT_COMP;

    #[test]
    fn descriptor_seeds_fixed_settings() {
        let d = Descriptor {
            fixed_len: 4,
            flags: DESC_FLAG_REPEAT_COMP,
            ..Default::default()
        };
        let cfg = DumpConfig::default().with_descriptor(&d);
        assert_eq!(cfg.fixed_layout(), FixedLayout { fixed_len: 4, repeat_comp: true });
    }

    #[test]
    fn overflow_page_size_rounds_up() {
        let cfg = DumpConfig::default();
        assert_eq!(cfg.overflow_page_size(1), 512);
        assert_eq!(cfg.overflow_page_size(480), 512);
        assert_eq!(cfg.overflow_page_size(481), 1024);
        assert_eq!(cfg.size_to_units(4096), 8);
    }

    #[test]
    fn display_lists_fields() {
        let s = DumpConfig::default().with_repeat_comp(true).to_string();
        assert!(s.contains("repeat_comp: true"));
        assert!(s.contains("allocation_size: 512"));
    }
}
