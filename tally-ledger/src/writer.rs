use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::{LedgerError, LedgerResult, LedgerRow, FORMAT_VERSION_HEADER, LEDGER_COLUMNS};

/// Streams ledger rows into the semicolon-delimited import format.
pub struct LedgerWriter<W: Write> {
    inner: csv::Writer<W>,
    rows: usize,
}

impl LedgerWriter<BufWriter<File>> {
    /// Create (or truncate) `path`, creating parent directories as needed.
    pub fn create(path: impl AsRef<Path>) -> LedgerResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Self::new(BufWriter::new(File::create(path)?))
    }
}

impl<W: Write> LedgerWriter<W> {
    /// Write the version line and column header to `writer`.
    pub fn new(mut writer: W) -> LedgerResult<Self> {
        writeln!(writer, "{FORMAT_VERSION_HEADER}")?;
        let mut inner = WriterBuilder::new()
            .delimiter(b';')
            .has_headers(false)
            .quote_style(QuoteStyle::Never)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(writer);
        inner.write_record(LEDGER_COLUMNS)?;
        Ok(Self { inner, rows: 0 })
    }

    pub fn write_row(&mut self, row: &LedgerRow) -> LedgerResult<()> {
        self.inner.write_record(row.fields())?;
        self.rows += 1;
        Ok(())
    }

    pub fn write_rows<'a>(
        &mut self,
        rows: impl IntoIterator<Item = &'a LedgerRow>,
    ) -> LedgerResult<()> {
        for row in rows {
            self.write_row(row)?;
        }
        Ok(())
    }

    /// Rows written so far, excluding headers.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(self) -> LedgerResult<W> {
        let mut writer = self
            .inner
            .into_inner()
            .map_err(|err| LedgerError::Storage(err.error().to_string()))?;
        writer.flush()?;
        Ok(writer)
    }
}
