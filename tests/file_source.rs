use anyhow::Result;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use TreeLens::codec::EntropyTables;
use TreeLens::config::DumpConfig;
use TreeLens::dump::{Dumper, OutputTarget};
use TreeLens::error::DumpError;
use TreeLens::page::{header_read, Descriptor, Item, OverflowRef, PageBuilder, PageType};
use TreeLens::source::{FilePageSource, PageGuard};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("tltest-file-{prefix}-{pid}-{t}-{id}"))
}

/// descriptor (0), row-leaf (1), overflow (2..3).
fn write_db(path: &PathBuf) -> Result<Vec<u8>> {
    let big: Vec<u8> = (0..700u32).map(|i| b'a' + (i % 26) as u8).collect();
    let d = Descriptor { root_addr: 1, root_size: 512, fixed_len: 4, ..Default::default() };
    let mut f = fs::File::create(path)?;
    f.write_all(&PageBuilder::new(PageType::Descriptor).descriptor(&d).finish(512)?)?;
    f.write_all(
        &PageBuilder::new(PageType::RowLeaf)
            .items([
                Item::Key(b"big".to_vec()),
                Item::DataOverflow(OverflowRef { addr: 2, size: big.len() as u32 }),
            ])?
            .finish(512)?,
    )?;
    f.write_all(&PageBuilder::new(PageType::Overflow).raw(&big).finish(1024)?)?;
    f.sync_all()?;
    Ok(big)
}

#[test]
fn dump_from_database_file() -> Result<()> {
    let root = unique_root("db");
    fs::create_dir_all(&root)?;
    let path = root.join("data.db");
    let big = write_db(&path)?;

    let src = FilePageSource::open(&path, 512)?;
    assert_eq!(src.file_len(), 2048);

    // descriptor со страницы 0 подхватывает fixed_len
    let desc = {
        let g = PageGuard::acquire(&src, 0, 512, true)?;
        let (hdr, off) = header_read(&g.bytes)?;
        assert_eq!(hdr.page_type(), PageType::Descriptor);
        Descriptor::read(&g.bytes[off..])?
    };
    let cfg = DumpConfig::default().with_descriptor(&desc);
    assert_eq!(cfg.fixed_len, 4);

    let d = Dumper::new(&src, cfg, EntropyTables::none());
    let mut out = Vec::new();
    let report = d.dump_by_address(1, 512, OutputTarget::ExistingSink(&mut out))?;
    assert_eq!(report.page_type, PageType::RowLeaf);
    assert_eq!(report.overflow_resolved, 1);
    let text = String::from_utf8(out)?;
    assert!(text.contains(&format!(
        "\ttype data-overflow, len 8, addr 2, size 700\n\t{{{}}}\n",
        String::from_utf8_lossy(&big)
    )));
    assert_eq!(src.outstanding(), 0);

    drop(d);
    drop(src);
    fs::remove_dir_all(&root)?;
    Ok(())
}

#[test]
fn read_past_end_is_fatal() -> Result<()> {
    let root = unique_root("eof");
    fs::create_dir_all(&root)?;
    let path = root.join("data.db");
    write_db(&path)?;

    let src = FilePageSource::open(&path, 512)?;
    let d = Dumper::new(&src, DumpConfig::default(), EntropyTables::none());
    let mut out = Vec::new();
    let err = d.dump_by_address(3, 1024, OutputTarget::ExistingSink(&mut out)).unwrap_err();
    assert!(matches!(err, DumpError::Fetch { addr: 3, size: 1024, .. }));
    assert!(!err.is_retryable());
    assert!(out.is_empty());

    drop(d);
    drop(src);
    fs::remove_dir_all(&root)?;
    Ok(())
}
