//! source/file: страницы из файла БД.
//!
//! - Адрес страницы в единицах аллокации: offset = addr * allocation_size.
//! - Файл открывается только на чтение под shared lock (fs2); lock снимается в Drop.
//! - Чтение за конец файла даёт Fatal (не Retry: файл не вытесняется).

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use anyhow::{Context, Result};
use fs2::FileExt;
use log::debug;

use super::{FetchError, PageSource};
use crate::page::Page;

pub struct FilePageSource {
    file: Mutex<File>,
    path: PathBuf,
    allocation_size: u32,
    file_len: u64,
    outstanding: AtomicU64,
}

impl FilePageSource {
    pub fn open(path: &Path, allocation_size: u32) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .open(path)
            .with_context(|| format!("open database file {}", path.display()))?;
        file.lock_shared()
            .with_context(|| format!("lock_shared {}", path.display()))?;
        let file_len = file
            .metadata()
            .with_context(|| format!("stat {}", path.display()))?
            .len();
        debug!(
            "opened {} ({} bytes, allocation size {})",
            path.display(),
            file_len,
            allocation_size
        );
        Ok(Self {
            file: Mutex::new(file),
            path: path.to_path_buf(),
            allocation_size: allocation_size.max(1),
            file_len,
            outstanding: AtomicU64::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_len(&self) -> u64 {
        self.file_len
    }

    /// Захвачено и не возвращено.
    pub fn outstanding(&self) -> u64 {
        self.outstanding.load(Ordering::Relaxed)
    }
}

impl PageSource for FilePageSource {
    fn fetch_page(&self, addr: u32, size: u32, _for_debug: bool) -> Result<Page, FetchError> {
        let off = addr as u64 * self.allocation_size as u64;
        let end = off + size as u64;
        if end > self.file_len {
            return Err(FetchError::Fatal(format!(
                "page {}/{} ends at byte {} past end of {} ({} bytes)",
                addr,
                size,
                end,
                self.path.display(),
                self.file_len
            )));
        }
        let mut buf = vec![0u8; size as usize];
        {
            let mut f = self.file.lock().unwrap_or_else(|e| e.into_inner());
            f.seek(SeekFrom::Start(off))
                .and_then(|_| f.read_exact(&mut buf))
                .map_err(|e| FetchError::Fatal(format!("read {}/{}: {}", addr, size, e)))?;
        }
        self.outstanding.fetch_add(1, Ordering::Relaxed);
        Ok(Page::new(addr, size, buf))
    }

    fn release_page(&self, _page: Page) {
        self.outstanding.fetch_sub(1, Ordering::Relaxed);
    }
}

impl Drop for FilePageSource {
    fn drop(&mut self) {
        // ошибка unlock в Drop не репортится
        if let Ok(f) = self.file.get_mut() {
            let _ = FileExt::unlock(f);
        }
    }
}
