use anyhow::Result;

use TreeLens::dump::Dumper;

use crate::cli::DumpArgs;
use crate::util::{open_for_dump, print_stats, target};

pub fn exec(args: DumpArgs) -> Result<()> {
    let (src, cfg, tables) = open_for_dump(&args)?;
    let dumper = Dumper::new(&src, cfg, tables);
    let report = dumper.dump_by_address(args.addr, args.size, target(args.out.as_deref()))?;

    if args.stats {
        println!(
            "dumped {} page: {} entries, {} overflow, {} bytes",
            report.page_type.name(),
            report.entries,
            report.overflow_resolved,
            report.bytes_written
        );
        print_stats();
    }
    Ok(())
}
