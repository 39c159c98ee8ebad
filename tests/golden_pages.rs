use anyhow::Result;

use TreeLens::codec::EntropyTables;
use TreeLens::config::DumpConfig;
use TreeLens::dump::{Dumper, OutputTarget};
use TreeLens::error::DumpError;
use TreeLens::page::{
    Descriptor, FixedLayout, Item, OffPageRef, OverflowRef, Page, PageBuilder, PageType,
    ADDR_INVALID,
};
use TreeLens::source::MemPageSource;

fn dump(src: &MemPageSource, cfg: DumpConfig, page: &Page) -> Result<String> {
    let d = Dumper::new(src, cfg, EntropyTables::none());
    Ok(d.render_page(page)?)
}

fn page(addr: u32, b: PageBuilder, size: u32) -> Result<Page> {
    Ok(Page::new(addr, size, b.finish(size)?))
}

#[test]
fn row_leaf_golden() -> Result<()> {
    let src = MemPageSource::new();
    let b = PageBuilder::new(PageType::RowLeaf).lsn(1, 64).items([
        Item::Key(b"alpha".to_vec()),
        Item::Data(b"one".to_vec()),
        Item::Key(b"k2".to_vec()),
        Item::Deleted,
    ])?;
    let p = page(3, b, 512)?;
    let got = dump(&src, DumpConfig::default(), &p)?;
    let want = "addr: 3-3 {\n\
                \taddr 3, size 512, lsn 1/64\n\
                \trow-leaf: level 1, entries 4, records 2\n\
                \tfirst-free 0x40, space avail 448\n\
                \n\
                \ttype key, len 5\n\
                \t{alpha}\n\
                \ttype data, len 3\n\
                \t{one}\n\
                \ttype key, len 2\n\
                \t{k2}\n\
                \ttype deleted, len 0\n\
                \t{deleted}\n\
                }\n";
    assert_eq!(got, want);
    Ok(())
}

#[test]
fn row_internal_offpage_golden() -> Result<()> {
    let src = MemPageSource::new();
    let b = PageBuilder::new(PageType::RowInternal).items([
        Item::Key(b"m".to_vec()),
        Item::OffPage(OffPageRef { addr: 5, size: 512, records: 10 }),
    ])?;
    let p = page(4, b, 512)?;
    let got = dump(&src, DumpConfig::default(), &p)?;
    let want = "addr: 4-4 {\n\
                \taddr 4, size 512, lsn 0/0\n\
                \trow-internal: level 2, entries 2, records 10\n\
                \tfirst-free 0x3c, space avail 452\n\
                \n\
                \ttype key, len 1\n\
                \t{m}\n\
                \ttype offpage, len 16, addr 5, size 512, records 10\n\
                }\n";
    assert_eq!(got, want);
    Ok(())
}

#[test]
fn column_internal_golden() -> Result<()> {
    let src = MemPageSource::new();
    let b = PageBuilder::new(PageType::ColInternal)
        .off_page(OffPageRef { addr: 7, size: 1024, records: 3 })
        .off_page(OffPageRef { addr: ADDR_INVALID, size: 0, records: 0 });
    let p = page(6, b, 1024)?;
    let got = dump(&src, DumpConfig::default(), &p)?;
    let want = "addr: 6-7 {\n\
                \taddr 6, size 1024, lsn 0/0\n\
                \tcolumn-internal: level 2, entries 2, records 3\n\
                \tfirst-free 0x40, space avail 960\n\
                \n\
                \toffpage, addr 7, size 1024, records 3\n\
                \toffpage, addr (none), size 0, records 0\n\
                }\n";
    assert_eq!(got, want);
    Ok(())
}

#[test]
fn column_fixed_plain_golden() -> Result<()> {
    let src = MemPageSource::new();
    let layout = FixedLayout { fixed_len: 2, repeat_comp: false };
    let b = PageBuilder::new(PageType::ColFixed)
        .fixed_layout(layout)
        .fixed_slot(b"ab", false)?
        .fixed_slot(b"cd", true)?;
    let p = page(8, b, 512)?;
    let got = dump(&src, DumpConfig::default().with_fixed_len(2), &p)?;
    let want = "addr: 8-8 {\n\
                \taddr 8, size 512, lsn 0/0\n\
                \tcolumn-fixed: level 1, entries 2, records 2\n\
                \tfirst-free 0x26, space avail 474\n\
                \n\
                \t{ab}\n\
                \t{deleted}\n\
                }\n";
    assert_eq!(got, want);
    Ok(())
}

#[test]
fn column_fixed_run_length_golden() -> Result<()> {
    let src = MemPageSource::new();
    let layout = FixedLayout { fixed_len: 4, repeat_comp: true };
    let b = PageBuilder::new(PageType::ColFixed)
        .fixed_layout(layout)
        .repeat_group(3, b"aaaa", false)?
        .repeat_group(2, b"bbbb", true)?;
    let p = page(9, b, 512)?;
    let cfg = DumpConfig::default().with_fixed_len(4).with_repeat_comp(true);
    let got = dump(&src, cfg, &p)?;
    let want = "addr: 9-9 {\n\
                \taddr 9, size 512, lsn 0/0\n\
                \tcolumn-fixed: level 1, entries 2, records 5\n\
                \tfirst-free 0x2e, space avail 466\n\
                \n\
                \trepeat 3 {aaaa}\n\
                \trepeat 2 {deleted}\n\
                }\n";
    assert_eq!(got, want);
    Ok(())
}

#[test]
fn descriptor_golden() -> Result<()> {
    let src = MemPageSource::new();
    let d = Descriptor {
        root_addr: 1,
        root_size: 512,
        ..Default::default()
    };
    let p = page(0, PageBuilder::new(PageType::Descriptor).descriptor(&d), 512)?;
    let got = dump(&src, DumpConfig::default(), &p)?;
    let want = "addr: 0-0 {\n\
                \taddr 0, size 512, lsn 0/0\n\
                \tdescriptor: level 1, entries 0, records 0\n\
                \tfirst-free 0x58, space avail 424\n\
                \n\
                \tdescription record: {\n\
                \t\tmagic: 120897, major: 0, minor: 1\n\
                \t\tinternal page min/max size: 512/2048\n\
                \t\tleaf page min/max size: 512/4096\n\
                \t\tbase record: 1, fixed_len: 0\n\
                \t\troot addr 1, size 512\n\
                \t\tfree addr (none)\n\
                \t}\n\
                }\n";
    assert_eq!(got, want);
    Ok(())
}

#[test]
fn overflow_page_prints_header_only() -> Result<()> {
    let src = MemPageSource::new();
    let b = PageBuilder::new(PageType::Overflow).lsn(2, 8).raw(&[b'z'; 600]);
    let p = page(2, b, 1024)?;
    let got = dump(&src, DumpConfig::default(), &p)?;
    assert_eq!(
        got,
        "addr: 2-3 {\n\taddr 2, size 1024, lsn 2/8\n\toverflow: bytes 600\n\n}\n"
    );
    Ok(())
}

#[test]
fn column_variable_and_duplicate_leaf() -> Result<()> {
    let src = MemPageSource::new();
    let b = PageBuilder::new(PageType::ColVar).items([
        Item::Data(b"x\x01".to_vec()),
        Item::Deleted,
    ])?;
    let got = dump(&src, DumpConfig::default(), &page(10, b, 512)?)?;
    assert!(got.contains("\tcolumn-variable: level 1, entries 2, records 2\n"));
    assert!(got.contains("\ttype data, len 2\n\t{x\\01}\n"));
    assert!(got.contains("\ttype deleted, len 0\n\t{deleted}\n"));

    let b = PageBuilder::new(PageType::DupLeaf).items([
        Item::Duplicate(b"d1".to_vec()),
        Item::Duplicate(b"d2".to_vec()),
    ])?;
    let got = dump(&src, DumpConfig::default(), &page(11, b, 512)?)?;
    assert!(got.contains("\tduplicate-leaf: level 1, entries 2, records 2\n"));
    assert!(got.contains("\ttype duplicate, len 2\n\t{d1}\n\ttype duplicate, len 2\n\t{d2}\n"));
    Ok(())
}

#[test]
fn overflow_item_line_carries_ref() -> Result<()> {
    let src = MemPageSource::new();
    let ovfl = PageBuilder::new(PageType::Overflow).raw(b"spilled value");
    src.insert(2, ovfl.finish(512)?);

    let b = PageBuilder::new(PageType::RowLeaf).items([
        Item::Key(b"k".to_vec()),
        Item::DataOverflow(OverflowRef { addr: 2, size: 13 }),
    ])?;
    let got = dump(&src, DumpConfig::default(), &page(1, b, 512)?)?;
    assert!(got.contains("\ttype data-overflow, len 8, addr 2, size 13\n\t{spilled value}\n"));
    assert_eq!(src.outstanding(), 0);
    Ok(())
}

#[test]
fn dump_is_deterministic() -> Result<()> {
    let src = MemPageSource::new();
    let b = PageBuilder::new(PageType::RowLeaf).items([
        Item::Key(b"a".to_vec()),
        Item::Data(vec![0, 1, 2, 0xff]),
    ])?;
    let p = page(1, b, 512)?;
    let d = Dumper::new(&src, DumpConfig::default(), EntropyTables::none());
    let first = d.render_page(&p)?;
    for _ in 0..5 {
        assert_eq!(d.render_page(&p)?, first);
    }
    assert!(first.contains("{\\00\\01\\02\\ff}"));
    Ok(())
}

#[test]
fn unknown_page_type_writes_nothing() -> Result<()> {
    let src = MemPageSource::new();
    let mut bytes = PageBuilder::new(PageType::RowLeaf).finish(512)?;
    bytes[16] = 42;
    let p = Page::new(1, 512, bytes);

    let d = Dumper::new(&src, DumpConfig::default(), EntropyTables::none());
    let mut out = Vec::new();
    let err = d.dump_page(&p, OutputTarget::ExistingSink(&mut out)).unwrap_err();
    assert!(matches!(err, DumpError::IllegalFormat(_)));
    assert!(out.is_empty(), "no output on bad header");
    Ok(())
}

#[test]
fn corrupt_item_aborts_before_output() -> Result<()> {
    let src = MemPageSource::new();
    // entries=2, второй item объявляет длину за концом страницы
    let mut raw = Vec::new();
    Item::Key(b"k".to_vec()).encode_into(&mut raw)?;
    raw.extend_from_slice(&((3u32 << 24) | 4000).to_le_bytes());
    let mut bytes = PageBuilder::new(PageType::RowLeaf).raw(&raw).finish(512)?;
    bytes[12] = 2;
    let p = Page::new(1, 512, bytes);

    let d = Dumper::new(&src, DumpConfig::default(), EntropyTables::none());
    let mut out = Vec::new();
    let err = d.dump_page(&p, OutputTarget::ExistingSink(&mut out)).unwrap_err();
    assert!(matches!(err, DumpError::IllegalFormat(_)));
    assert!(out.is_empty());
    Ok(())
}
