use anyhow::{anyhow, Result};
use std::path::PathBuf;

use TreeLens::codec::EntropyTables;
use TreeLens::dump::{Dumper, OutputTarget};
use TreeLens::source::FilePageSource;

use crate::util::{base_config, read_descriptor};

pub fn exec(file: PathBuf, alloc_size: Option<u32>) -> Result<()> {
    let cfg = base_config(alloc_size);
    let src = FilePageSource::open(&file, cfg.allocation_size)?;
    if read_descriptor(&src, &cfg)?.is_none() {
        return Err(anyhow!("page 0 of {} is not a descriptor page", file.display()));
    }
    let size = cfg.allocation_size;
    let dumper = Dumper::new(&src, cfg, EntropyTables::none());
    dumper.dump_by_address(0, size, OutputTarget::Default)?;
    Ok(())
}
