use anyhow::Result;
use std::path::PathBuf;

use TreeLens::page::{header_read, PageBody};
use TreeLens::source::{FilePageSource, PageGuard};

use crate::util::base_config;

pub fn exec(file: PathBuf, addr: u32, size: u32, alloc_size: Option<u32>, json: bool) -> Result<()> {
    let cfg = base_config(alloc_size);
    let src = FilePageSource::open(&file, cfg.allocation_size)?;
    let g = PageGuard::acquire(&src, addr, size, true)?;
    let (hdr, _) = header_read(&g.bytes)?;

    if json {
        let obj = serde_json::json!({
            "addr": addr,
            "size": size,
            "header": hdr,
        });
        println!("{}", serde_json::to_string_pretty(&obj)?);
        return Ok(());
    }

    println!("addr:     {}", addr);
    println!("size:     {}", size);
    println!("type:     {}", hdr.page_type().name());
    println!("lsn:      {}/{}", hdr.lsn.file, hdr.lsn.offset);
    println!("checksum: {:#010x}", hdr.checksum);
    match hdr.body {
        PageBody::Overflow { data_len } => println!("bytes:    {}", data_len),
        other => {
            if let Some(c) = other.counts() {
                println!("level:    {}", c.level);
                println!("entries:  {}", c.entries);
                println!("records:  {}", c.records);
            }
        }
    }
    Ok(())
}
