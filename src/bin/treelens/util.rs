use anyhow::Result;
use log::debug;
use std::path::Path;
use std::sync::Arc;

use TreeLens::codec::{EntropyTables, ZstdDecoder};
use TreeLens::config::DumpConfig;
use TreeLens::dump::OutputTarget;
use TreeLens::metrics::metrics_snapshot;
use TreeLens::page::{header_read, Descriptor, PageType};
use TreeLens::source::{FilePageSource, PageGuard};

use crate::cli::DumpArgs;

/// Конфиг из env + `--alloc-size`.
pub fn base_config(alloc_size: Option<u32>) -> DumpConfig {
    let cfg = DumpConfig::from_env();
    match alloc_size {
        Some(n) => cfg.with_allocation_size(n),
        None => cfg,
    }
}

/// Прочитать descriptor со страницы 0, если она им является.
pub fn read_descriptor(src: &FilePageSource, cfg: &DumpConfig) -> Result<Option<Descriptor>> {
    let g = PageGuard::acquire(src, 0, cfg.allocation_size, true)?;
    let (hdr, body_off) = header_read(&g.bytes)?;
    if hdr.page_type() != PageType::Descriptor {
        return Ok(None);
    }
    Ok(Some(Descriptor::read(&g.bytes[body_off..])?))
}

/// Источник, конфиг (descriptor + флаги CLI) и таблицы декодеров.
pub fn open_for_dump(args: &DumpArgs) -> Result<(FilePageSource, DumpConfig, EntropyTables)> {
    let mut cfg = base_config(args.alloc_size);
    let src = FilePageSource::open(&args.file, cfg.allocation_size)?;

    match read_descriptor(&src, &cfg) {
        Ok(Some(d)) => cfg = cfg.with_descriptor(&d),
        Ok(None) => debug!("page 0 of {} is not a descriptor", args.file.display()),
        Err(e) => debug!("no descriptor in {}: {:#}", args.file.display(), e),
    }
    if let Some(n) = args.fixed_len {
        cfg = cfg.with_fixed_len(n);
    }
    if args.repeat_comp {
        cfg = cfg.with_repeat_comp(true);
    }
    if args.repl_history {
        cfg = cfg.with_repl_history(true);
    }
    if let Some(n) = args.retries {
        cfg = cfg.with_fetch_retries(n);
    }

    let mut tables = EntropyTables::none();
    if args.zstd_keys {
        tables = tables.with_key(Arc::new(ZstdDecoder::new(cfg.max_value_bytes)));
    }
    if args.zstd_data {
        tables = tables.with_data(Arc::new(ZstdDecoder::new(cfg.max_value_bytes)));
    }
    debug!("{}", cfg);
    Ok((src, cfg, tables))
}

pub fn target(out: Option<&Path>) -> OutputTarget<'static> {
    OutputTarget::resolve(None, out.map(Path::to_path_buf))
}

pub fn print_stats() {
    let m = metrics_snapshot();
    println!("pages_fetched:     {}", m.pages_fetched);
    println!("pages_released:    {}", m.pages_released);
    println!("fetch_retries:     {}", m.fetch_retries);
    println!("overflow_resolved: {} ({} B)", m.overflow_resolved, m.overflow_bytes);
    println!("pages_dumped:      {}", m.pages_dumped);
    println!("dump_errors:       {}", m.dump_errors);
}
