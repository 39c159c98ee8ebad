use anyhow::Result;
use clap::Parser;
use env_logger::{Builder, Env};

mod cli;
mod util;
mod cmd_page;
mod cmd_inmem;
mod cmd_desc;
mod cmd_header;
mod cmd_demo;

fn init_logger() {
    // Уровень из RUST_LOG, иначе warn (stderr занят дампами).
    // Пример: RUST_LOG=debug treelens page ...
    Builder::from_env(Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    init_logger();

    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = cli::Cli::parse();
    match cli.cmd {
        cli::Cmd::Page { args } =>
            cmd_page::exec(args),

        cli::Cmd::Inmem { args } =>
            cmd_inmem::exec(args),

        cli::Cmd::Desc { file, alloc_size } =>
            cmd_desc::exec(file, alloc_size),

        cli::Cmd::Header { file, addr, size, alloc_size, json } =>
            cmd_header::exec(file, addr, size, alloc_size, json),

        cli::Cmd::Demo { out } =>
            cmd_demo::exec(out),
    }
}
