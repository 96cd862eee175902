//! Source table reading and the in-place identifier rewrite.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use addonsync_shared::{AddonRecord, Result, SourceRow, SyncError, columns};
use tracing::{info, instrument, warn};

use crate::write_atomic;

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Lazy row iterator over a CSV file with a header row.
///
/// The whole file is buffered in memory by [`TableReader::open`]; only the
/// row parsing is lazy, one row per iterator step. Catalog tables are small
/// enough that streaming from disk is not needed.
pub struct TableReader {
    path: PathBuf,
    headers: Arc<[String]>,
    records: csv::StringRecordsIntoIter<Cursor<Vec<u8>>>,
    rows_read: usize,
}

impl TableReader {
    /// Open `path` and parse its header row.
    pub async fn open(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| SyncError::read(path, e))?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(Cursor::new(bytes));

        let headers: Arc<[String]> = reader
            .headers()
            .map_err(|e| SyncError::read(path, e))?
            .iter()
            .map(String::from)
            .collect();

        Ok(Self {
            path: path.to_path_buf(),
            headers,
            records: reader.into_records(),
            rows_read: 0,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of rows yielded so far.
    pub fn rows_read(&self) -> usize {
        self.rows_read
    }
}

impl Iterator for TableReader {
    type Item = Result<SourceRow>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.records.next()? {
            Ok(record) => {
                self.rows_read += 1;
                let values = record.iter().map(String::from).collect();
                Some(Ok(SourceRow::new(Arc::clone(&self.headers), values)))
            }
            Err(e) => Some(Err(SyncError::read(&self.path, e))),
        }
    }
}

/// Read every row of the table at `path`, logging the row count.
pub async fn read_rows(path: &Path) -> Result<Vec<SourceRow>> {
    let reader = TableReader::open(path).await?;
    let rows = reader.collect::<Result<Vec<_>>>()?;
    info!(path = %path.display(), rows = rows.len(), "read source table");
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Rewriter
// ---------------------------------------------------------------------------

/// Outcome of [`rewrite_ids`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteSummary {
    /// Data rows written (header excluded).
    pub rows: usize,
    /// Rows whose `Curseforge ID` cell was set from a resolved id.
    pub substituted: usize,
    /// Rows with no enriched record of the same name.
    pub unmatched: usize,
}

/// Re-read the table at `path` from disk and write resolved ids back into
/// its `Curseforge ID` column, replacing the file.
///
/// Rows are matched to `records` by name (first record wins on duplicates).
/// Rows without a match, or whose record has no id, are written unchanged.
#[instrument(skip_all, fields(path = %path.display()))]
pub async fn rewrite_ids(path: &Path, records: &[AddonRecord]) -> Result<RewriteSummary> {
    let reader = TableReader::open(path).await?;
    let headers = reader.headers().to_vec();

    let id_idx = headers.iter().position(|h| h == columns::CURSEFORGE_ID);
    if id_idx.is_none() {
        warn!(
            column = columns::CURSEFORGE_ID,
            "column missing from source table, ids are not written back"
        );
    }

    let mut by_name: HashMap<&str, &AddonRecord> = HashMap::with_capacity(records.len());
    for record in records {
        by_name.entry(record.name.as_str()).or_insert(record);
    }

    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    if !headers.is_empty() {
        writer
            .write_record(&headers)
            .map_err(|e| SyncError::write(path, e))?;
    }

    let mut summary = RewriteSummary::default();
    for row in reader {
        let row = row?;
        let mut values = row.values().to_vec();
        summary.rows += 1;

        let name = row.get(columns::NAME).unwrap_or_default();
        match by_name.get(name) {
            None => summary.unmatched += 1,
            Some(record) => {
                if let (Some(idx), Some(id)) = (id_idx, record.curseforge_id.as_ref()) {
                    if values.len() <= idx {
                        values.resize(idx + 1, String::new());
                    }
                    values[idx] = id.to_string();
                    summary.substituted += 1;
                }
            }
        }

        writer
            .write_record(&values)
            .map_err(|e| SyncError::write(path, e))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| SyncError::write(path, e.error()))?;
    write_atomic(path, &bytes).await?;

    if summary.unmatched > 0 {
        warn!(
            unmatched = summary.unmatched,
            "source rows have no enriched counterpart; the table may have changed since it was read"
        );
    }
    info!(
        rows = summary.rows,
        substituted = summary.substituted,
        "rewrote source table"
    );

    Ok(summary)
}
