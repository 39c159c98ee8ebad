//! error: типизированные ошибки разбора и дампа страниц.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DumpError>;

#[derive(Error, Debug)]
pub enum DumpError {
    /// Тип страницы/item'а вне закрытого набора или выход за границы страницы.
    #[error("illegal page format: {0}")]
    IllegalFormat(String),

    /// Страница была вытеснена между выбором addr/size и чтением; addr/size валидны.
    #[error("page {addr}/{size} was evicted during fetch, retry")]
    RetryableFetch { addr: u32, size: u32 },

    #[error("page fetch {addr}/{size} failed: {reason}")]
    Fetch { addr: u32, size: u32, reason: String },

    #[error("open output {}: {source}", path.display())]
    OpenOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("output: {0}")]
    Io(#[from] std::io::Error),

    #[error("{kind} entropy decode failed: {reason}")]
    Compression { kind: &'static str, reason: String },
}

impl DumpError {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        DumpError::IllegalFormat(msg.into())
    }

    /// true, если ошибку можно повторить тем же addr/size.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DumpError::RetryableFetch { .. })
    }
}
