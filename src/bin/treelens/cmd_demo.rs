use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use TreeLens::page::{
    Descriptor, Item, OverflowRef, PageBuilder, PageType, DEFAULT_ALLOCATION_SIZE,
};

/// Демо-файл: descriptor (0), row-leaf (1), overflow (2..3).
pub fn exec(out: PathBuf) -> Result<()> {
    let alloc = DEFAULT_ALLOCATION_SIZE;
    let big: Vec<u8> = (0..600u32).map(|i| b'a' + (i % 26) as u8).collect();

    let leaf = PageBuilder::new(PageType::RowLeaf)
        .lsn(1, 64)
        .items([
            Item::Key(b"alpha".to_vec()),
            Item::Data(b"one".to_vec()),
            Item::Key(b"beta".to_vec()),
            Item::DataOverflow(OverflowRef { addr: 2, size: big.len() as u32 }),
            Item::Key(b"gamma".to_vec()),
            Item::Deleted,
        ])?;
    let leaf_size = leaf.min_size(alloc);

    let desc = Descriptor {
        root_addr: 1,
        root_size: leaf_size,
        ..Default::default()
    };
    let desc_page = PageBuilder::new(PageType::Descriptor).descriptor(&desc);
    let desc_size = desc_page.min_size(alloc);

    let ovfl = PageBuilder::new(PageType::Overflow).lsn(1, 128).raw(&big);
    let ovfl_size = ovfl.min_size(alloc);

    let mut f = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&out)
        .with_context(|| format!("create {}", out.display()))?;
    f.write_all(&desc_page.finish(desc_size)?)?;
    f.write_all(&leaf.finish(leaf_size)?)?;
    f.write_all(&ovfl.finish(ovfl_size)?)?;
    f.sync_all()?;

    println!("wrote {} (allocation size {})", out.display(), alloc);
    println!("  descriptor: addr 0, size {}", desc_size);
    println!("  row-leaf:   addr 1, size {}", leaf_size);
    println!("  overflow:   addr 2, size {}", ovfl_size);
    println!("try: treelens page --file {} --addr 1 --size {}", out.display(), leaf_size);
    Ok(())
}
