//! dump/output: куда писать отчёт.
//!
//! Порядок: уже открытый sink > путь (открываем и закрываем сами) > stderr.
//! Разрешается один раз в начале вызова dump.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use crate::error::{DumpError, Result};

pub enum OutputTarget<'w> {
    /// Sink вызывающего; не закрывается, только flush.
    ExistingSink(&'w mut dyn Write),
    /// Файл открывается на запись (truncate) и закрывается по завершении.
    Path(PathBuf),
    /// stderr.
    Default,
}

impl<'w> OutputTarget<'w> {
    pub fn path(p: impl Into<PathBuf>) -> Self {
        OutputTarget::Path(p.into())
    }

    /// out > path > default.
    pub fn resolve(sink: Option<&'w mut dyn Write>, path: Option<PathBuf>) -> Self {
        match (sink, path) {
            (Some(s), _) => OutputTarget::ExistingSink(s),
            (None, Some(p)) => OutputTarget::Path(p),
            (None, None) => OutputTarget::Default,
        }
    }

    pub(crate) fn open(self) -> Result<Sink<'w>> {
        match self {
            OutputTarget::ExistingSink(w) => Ok(Sink::Borrowed(w)),
            OutputTarget::Path(path) => {
                let f = File::create(&path).map_err(|source| DumpError::OpenOutput {
                    path: path.clone(),
                    source,
                })?;
                Ok(Sink::File(BufWriter::new(f)))
            }
            OutputTarget::Default => Ok(Sink::Stderr(io::stderr())),
        }
    }
}

/// Открытый sink.
pub(crate) enum Sink<'w> {
    Borrowed(&'w mut dyn Write),
    File(BufWriter<File>),
    Stderr(io::Stderr),
}

impl Sink<'_> {
    /// Flush; файл закрывается при drop.
    pub(crate) fn finish(mut self) -> Result<()> {
        self.flush()?;
        if let Sink::File(w) = self {
            let f = w.into_inner().map_err(|e| DumpError::Io(e.into_error()))?;
            f.sync_all()?;
        }
        Ok(())
    }
}

impl Write for Sink<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Sink::Borrowed(w) => w.write(buf),
            Sink::File(w) => w.write(buf),
            Sink::Stderr(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Sink::Borrowed(w) => w.flush(),
            Sink::File(w) => w.flush(),
            Sink::Stderr(w) => w.flush(),
        }
    }
}
