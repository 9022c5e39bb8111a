//! Per-page CSV checkpoints
//!
//! After each completed page every record collected so far is written to
//! `checkpoint_page{N}.csv`. The file is staged in a temp file next to it
//! and renamed into place, so a reader never sees a half-written checkpoint.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{ScrapeError, ScrapeResult};
use crate::record::ExtractedRecord;

/// UTF-8 byte order mark; spreadsheet tools need it to read CJK text
const BOM: &[u8] = b"\xEF\xBB\xBF";

#[must_use]
pub fn checkpoint_path(dir: &Path, page: u32) -> PathBuf {
    dir.join(format!("checkpoint_page{page}.csv"))
}

/// Write all `records` as CSV with `columns` as the header row.
///
/// Columns a record lacks are written empty, as are `None` values. CSV has
/// no null, so a checkpoint does not keep `None` apart from `Some("")`; the
/// in-memory `RunReport` records are the lossless copy.
pub fn write_checkpoint(
    dir: &Path,
    page: u32,
    columns: &[String],
    records: &[ExtractedRecord],
) -> ScrapeResult<PathBuf> {
    let path = checkpoint_path(dir, page);
    let fail = |message: String| ScrapeError::Checkpoint {
        path: path.clone(),
        message,
    };

    std::fs::create_dir_all(dir).map_err(|e| fail(e.to_string()))?;
    let mut staged = tempfile::NamedTempFile::new_in(dir).map_err(|e| fail(e.to_string()))?;
    staged.write_all(BOM).map_err(|e| fail(e.to_string()))?;

    {
        let mut writer = csv::WriterBuilder::new().from_writer(staged.as_file_mut());
        writer.write_record(columns).map_err(|e| fail(e.to_string()))?;
        for record in records {
            let row = columns.iter().map(|c| record.get(c).unwrap_or(""));
            writer.write_record(row).map_err(|e| fail(e.to_string()))?;
        }
        writer.flush().map_err(|e| fail(e.to_string()))?;
    }

    staged
        .persist(&path)
        .map_err(|e| fail(e.error.to_string()))?;
    Ok(path)
}
