#![allow(non_snake_case)]

// Базовые модули
pub mod error;
pub mod config;
pub mod metrics;

// Страницы: заголовок, items, fixed, descriptor, индекс
pub mod page;     // src/page/{mod,common,header,item,fixed,desc,index,build}.rs

// Источники страниц (buffer pool контракт, память, файл)
pub mod source;   // src/source/{mod,memory,file}.rs

pub mod overflow;
pub mod update;
pub mod codec;

// Структурный дамп
pub mod dump;     // src/dump/{mod,output,render,body,inmem}.rs

// Удобные реэкспорты
pub use codec::{CodecKind, EntropyDecoder, EntropyTables, ZstdDecoder};
pub use config::DumpConfig;
pub use dump::{DumpReport, Dumper, OutputTarget};
pub use error::{DumpError, Result};
pub use overflow::{resolve_overflow, OverflowRecord};
pub use page::{Page, PageBuilder, PageHeader, PageType};
pub use source::{FetchError, FilePageSource, MemPageSource, PageGuard, PageSource};
pub use update::{current_value, CurrentValue, UpdateChain, UpdateSlot};
