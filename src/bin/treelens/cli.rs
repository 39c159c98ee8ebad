use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Структурные дампы страниц B-дерева
#[derive(Parser, Debug)]
#[command(name = "treelens", version, about = "TreeLens page inspector")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
}

/// Общие опции дампа страницы.
#[derive(Args, Debug, Clone)]
pub struct DumpArgs {
    /// Database file
    #[arg(long)]
    pub file: PathBuf,
    /// Page address (allocation units)
    #[arg(long)]
    pub addr: u32,
    /// Page size (bytes)
    #[arg(long)]
    pub size: u32,
    /// Write the report into a file instead of stderr
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// Allocation unit size (bytes); TL_ALLOC_SIZE otherwise
    #[arg(long)]
    pub alloc_size: Option<u32>,
    /// Fetch retries on eviction
    #[arg(long)]
    pub retries: Option<u32>,
    /// Column-fixed pages are run-length encoded (overrides page 0)
    #[arg(long)]
    pub repeat_comp: bool,
    /// Column-fixed value width (overrides page 0)
    #[arg(long)]
    pub fixed_len: Option<u8>,
    /// Keys are zstd-compressed
    #[arg(long)]
    pub zstd_keys: bool,
    /// Data items are zstd-compressed
    #[arg(long)]
    pub zstd_data: bool,
    /// In-memory view: print every update slot, not only the current value
    #[arg(long)]
    pub repl_history: bool,
    /// Print metrics counters after the dump
    #[arg(long)]
    pub stats: bool,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Dump the on-disk image of a page
    Page {
        #[command(flatten)]
        args: DumpArgs,
    },
    /// Dump the in-memory index view of a page (built from its bytes)
    Inmem {
        #[command(flatten)]
        args: DumpArgs,
    },
    /// Dump the descriptor page (page 0)
    Desc {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        alloc_size: Option<u32>,
    },
    /// Print the page header only. --json prints one JSON object.
    Header {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        addr: u32,
        #[arg(long)]
        size: u32,
        #[arg(long)]
        alloc_size: Option<u32>,
        #[arg(long)]
        json: bool,
    },
    /// Write a small synthetic database (descriptor, row leaf, overflow page)
    Demo {
        #[arg(long)]
        out: PathBuf,
    },
}
