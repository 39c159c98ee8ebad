use anyhow::Result;

use TreeLens::dump::Dumper;

use crate::cli::DumpArgs;
use crate::util::{open_for_dump, print_stats, target};

/// In-memory вид: индекс строится из байт страницы, цепочек замен нет.
pub fn exec(args: DumpArgs) -> Result<()> {
    let (src, cfg, tables) = open_for_dump(&args)?;
    let dumper = Dumper::new(&src, cfg, tables);

    let mut page = {
        let g = dumper.fetch(args.addr, args.size)?;
        g.page().clone()
    };
    dumper.load_index(&mut page)?;
    let report = dumper.dump_in_memory(&page, target(args.out.as_deref()))?;

    if args.stats {
        println!(
            "dumped {} index: {} entries, {} overflow, {} bytes",
            report.page_type.name(),
            report.entries,
            report.overflow_resolved,
            report.bytes_written
        );
        print_stats();
    }
    Ok(())
}
