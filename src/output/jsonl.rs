//! JSONL writer
//!
//! Appends verse records as newline-delimited JSON. serde_json leaves
//! non-ASCII text unescaped, so Arabic script lands in the file as-is.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::VerseRecord;

use super::{OutputError, RecordWriter};

/// Buffered JSONL file writer.
///
/// [`JsonlWriter::close`] is the clean teardown path: it flushes and syncs
/// to disk. Dropping without closing flushes as a backstop but cannot
/// report failures.
#[derive(Debug)]
pub struct JsonlWriter {
    writer: Option<BufWriter<File>>,
    path: PathBuf,
    records_written: u64,
}

impl JsonlWriter {
    /// Open the output file.
    ///
    /// With `append` set the file keeps its existing lines and new records
    /// land at the end; otherwise it is truncated. Parent directories are
    /// created as needed.
    pub fn open(path: impl AsRef<Path>, append: bool) -> Result<Self, OutputError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = if append {
            OpenOptions::new().create(true).append(true).open(&path)?
        } else {
            File::create(&path)?
        };

        debug!(path = %path.display(), append, "Opened output file");
        Ok(Self {
            writer: Some(BufWriter::new(file)),
            path,
            records_written: 0,
        })
    }

    /// Path of the output file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records written through this writer (excludes pre-existing lines).
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Flush, sync to disk, and consume the writer.
    pub fn close(mut self) -> Result<(), OutputError> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            writer.get_ref().sync_all()?;
            debug!(
                path = %self.path.display(),
                records = self.records_written,
                "Closed output file"
            );
        }
        Ok(())
    }

    fn writer(&mut self) -> &mut BufWriter<File> {
        // close() consumes self, so the writer is always present here
        self.writer.as_mut().expect("writer already closed")
    }
}

impl RecordWriter for JsonlWriter {
    fn write_record(&mut self, record: &VerseRecord) -> Result<(), OutputError> {
        let writer = self.writer();
        serde_json::to_writer(&mut *writer, record)?;
        writer.write_all(b"\n")?;
        self.records_written += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), OutputError> {
        self.writer().flush()?;
        Ok(())
    }
}

impl Drop for JsonlWriter {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush() {
                warn!(path = %self.path.display(), error = %e, "Flush on drop failed");
            }
        }
    }
}
