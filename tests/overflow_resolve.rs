use anyhow::Result;

use TreeLens::codec::EntropyTables;
use TreeLens::config::DumpConfig;
use TreeLens::dump::Dumper;
use TreeLens::error::DumpError;
use TreeLens::overflow::resolve_overflow;
use TreeLens::page::{Item, OverflowRef, Page, PageBuilder, PageType, PAGE_HDR_SIZE};
use TreeLens::source::MemPageSource;

fn pattern(n: usize) -> Vec<u8> {
    (0..n).map(|i| (i * 7 % 251) as u8).collect()
}

/// Разрешённые байты совпадают с телом overflow-страницы.
#[test]
fn resolved_bytes_match_raw_page() -> Result<()> {
    let cfg = DumpConfig::default();
    let data = pattern(1500);
    let size = cfg.overflow_page_size(data.len() as u32) as u32;
    assert_eq!(size, 1536);

    let raw = PageBuilder::new(PageType::Overflow).raw(&data).finish(size)?;
    let src = MemPageSource::new().with_page(4, raw.clone());

    let rec = resolve_overflow(&src, &cfg, &OverflowRef { addr: 4, size: 1500 })?;
    assert_eq!(rec.size, 1500);
    assert_eq!(rec.bytes, &raw[PAGE_HDR_SIZE..PAGE_HDR_SIZE + 1500]);
    assert_eq!(rec.bytes, data);
    assert_eq!(src.outstanding(), 0);
    Ok(())
}

/// Payload, похожий на overflow-ссылку, печатается как есть (глубина 1).
#[test]
fn overflow_payload_is_never_followed() -> Result<()> {
    let mut fake = Vec::new();
    Item::DataOverflow(OverflowRef { addr: 9, size: 4 }).encode_into(&mut fake)?;
    let src = MemPageSource::new();
    src.insert(2, PageBuilder::new(PageType::Overflow).raw(&fake).finish(512)?);
    let leaf = PageBuilder::new(PageType::RowLeaf)
        .items([
            Item::Key(b"k".to_vec()),
            Item::DataOverflow(OverflowRef { addr: 2, size: fake.len() as u32 }),
        ])?
        .finish(512)?;

    let d = Dumper::new(&src, DumpConfig::default(), EntropyTables::none());
    let out = d.render_page(&Page::new(1, 512, leaf))?;
    // tag 0x04000008 LE + addr 9 + size 4, сырыми байтами
    assert!(out.contains("\t{\\08\\00\\00\\04\\09\\00\\00\\00\\04\\00\\00\\00}\n"));
    assert_eq!(src.fetches(), 1);
    assert_eq!(src.outstanding(), 0);
    Ok(())
}

#[test]
fn short_overflow_page_is_illegal() -> Result<()> {
    let cfg = DumpConfig::default();
    let src = MemPageSource::new();
    src.insert(3, PageBuilder::new(PageType::Overflow).raw(b"abc").finish(512)?);
    let err = resolve_overflow(&src, &cfg, &OverflowRef { addr: 3, size: 10 }).unwrap_err();
    assert!(matches!(err, DumpError::IllegalFormat(_)));
    assert_eq!(src.outstanding(), 0);
    Ok(())
}

#[test]
fn oversized_ref_is_rejected_without_fetch() -> Result<()> {
    let cfg = DumpConfig::default().with_max_value_bytes(64);
    let src = MemPageSource::new();
    let err = resolve_overflow(&src, &cfg, &OverflowRef { addr: 3, size: 65 }).unwrap_err();
    assert!(matches!(err, DumpError::IllegalFormat(_)));
    assert_eq!(src.fetches(), 0);
    Ok(())
}

#[test]
fn duplicate_overflow_resolves_too() -> Result<()> {
    let src = MemPageSource::new();
    src.insert(2, PageBuilder::new(PageType::Overflow).raw(b"dup-value").finish(512)?);
    let leaf = PageBuilder::new(PageType::DupLeaf)
        .items([
            Item::Duplicate(b"d".to_vec()),
            Item::DuplicateOverflow(OverflowRef { addr: 2, size: 9 }),
        ])?
        .finish(512)?;
    let d = Dumper::new(&src, DumpConfig::default(), EntropyTables::none());
    let mut out = Vec::new();
    let page = Page::new(1, 512, leaf);
    let report = d.dump_page(&page, TreeLens::dump::OutputTarget::ExistingSink(&mut out))?;
    assert_eq!(report.overflow_resolved, 1);
    assert_eq!(report.entries, 2);
    assert!(String::from_utf8_lossy(&out)
        .contains("\ttype duplicate-overflow, len 8, addr 2, size 9\n\t{dup-value}\n"));
    Ok(())
}
