use crate::errors::OutputError;
use crate::row_emitter::OutputRow;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

/// Writes the header followed by every row. The header is written even without rows.
pub fn write_rows<W: Write>(writer: W, rows: &[OutputRow]) -> Result<(), OutputError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    writer.write_record(OutputRow::COLUMNS)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Writes into a temporary file next to `path` and renames it over `path` once complete,
/// so a failed run never leaves a half-written file behind.
#[tracing::instrument(skip(rows), fields(rows = rows.len()), level = "info")]
pub fn write_csv_atomically(path: &Path, rows: &[OutputRow]) -> Result<(), OutputError> {
    let directory = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let io_error = |source| OutputError::Io {
        path: directory.to_path_buf(),
        source,
    };

    fs::create_dir_all(directory).map_err(io_error)?;
    let mut file = NamedTempFile::new_in(directory).map_err(io_error)?;
    write_rows(file.as_file_mut(), rows)?;
    file.as_file().sync_all().map_err(io_error)?;
    file.persist(path).map_err(|err| OutputError::Persist {
        path: path.to_path_buf(),
        source: err.error,
    })?;

    info!(path = %path.display(), "Wrote timetable rows");
    Ok(())
}
