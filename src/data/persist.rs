//! Reading and writing the primary PPP file and the deleted-records archive.
//!
//! The primary file is always rewritten whole. The archive is appended to on delete and
//! rewritten whole on restore. Both are written in the caller's active [`Schema`]; each file's
//! layout is detected from its own header when read.
//!
//! No locking is done: two processes writing the same files race and the last writer wins.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::data::record::{normalize_key, Record};
use crate::data::schema::{csv_writer, detect_schema, ColumnMap, Schema};
use crate::data::store::RecordStore;

/// Rank used for ordering unranked (0) records, so they sort after every real rank.
const UNRANKED_SORT_RANK: i64 = 1_000_000_000_000;

#[derive(Debug)]
pub enum PersistError {
    Io { path: PathBuf, source: io::Error },
    Csv { path: PathBuf, source: csv::Error },
}

impl PersistError {
    fn io(path: &Path) -> impl FnOnce(io::Error) -> PersistError + '_ {
        move |source| PersistError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn csv(path: &Path) -> impl FnOnce(csv::Error) -> PersistError + '_ {
        move |source| PersistError::Csv {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "failed to access '{}': {source}", path.display()),
            Self::Csv { path, source } => {
                write!(f, "malformed CSV in '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for PersistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
        }
    }
}

/// Read every data row of a PPP CSV file, detecting its layout from the header.
fn read_records(path: &Path) -> Result<(Schema, Vec<Record>), PersistError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(PersistError::csv(path))?;
    let headers = reader.headers().map_err(PersistError::csv(path))?.clone();
    let schema = detect_schema(headers.iter());
    let columns = ColumnMap::resolve(schema, &headers);

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(PersistError::csv(path))?;
        records.push(columns.read_record(&row));
    }
    Ok((schema, records))
}

fn ensure_parent_dir(path: &Path) -> Result<(), PersistError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(PersistError::io(path))
        }
        _ => Ok(()),
    }
}

/// Write a header plus `records` to `path`, replacing any existing content.
fn write_file<'a, I>(path: &Path, schema: Schema, records: I) -> Result<usize, PersistError>
where
    I: IntoIterator<Item = &'a Record>,
{
    ensure_parent_dir(path)?;
    let file = File::create(path).map_err(PersistError::io(path))?;
    let mut writer = csv_writer(file);
    schema
        .write_header(&mut writer)
        .map_err(PersistError::csv(path))?;
    let mut written = 0usize;
    for record in records {
        schema
            .write_row(&mut writer, record)
            .map_err(PersistError::csv(path))?;
        written += 1;
    }
    writer.flush().map_err(PersistError::io(path))?;
    Ok(written)
}

/// Load the primary data file. A missing file is not an error: the store starts empty under
/// the simple layout.
pub fn load_store(path: &Path) -> Result<(RecordStore, Schema), PersistError> {
    if !path.exists() {
        warn!(path = %path.display(), "data file not found, starting with an empty store");
        return Ok((RecordStore::new(), Schema::default()));
    }

    let (schema, records) = read_records(path)?;
    let mut store = RecordStore::new();
    for (row, record) in records.into_iter().enumerate() {
        if store.insert(record).is_none() {
            debug!(path = %path.display(), row = row + 1, "skipping row with no name or slug");
        }
    }
    info!(path = %path.display(), %schema, records = store.len(), "loaded PPP data");
    Ok((store, schema))
}

fn sort_rank(record: &Record) -> i64 {
    if record.rank == 0 {
        UNRANKED_SORT_RANK
    } else {
        record.rank
    }
}

/// Identity used to deduplicate rows on save: normalized name, or slug when the name is empty.
fn save_key(record: &Record) -> String {
    let by_name = normalize_key(&record.name);
    if by_name.is_empty() {
        normalize_key(&record.slug)
    } else {
        by_name
    }
}

fn save_order(a: &Record, b: &Record) -> Ordering {
    sort_rank(a)
        .cmp(&sort_rank(b))
        .then_with(|| normalize_key(&a.name).cmp(&normalize_key(&b.name)))
}

/// Rewrite the primary file: one row per distinct record (by normalized name, or slug when the
/// name is empty), ordered by rank with unranked last, then by name.
///
/// When several live records share a name, the one the index resolves that name to is written,
/// so an update that dropped or changed the slug wins over the record it replaced. If no record
/// owns the key, the first seen wins.
pub fn save_store(store: &RecordStore, schema: Schema, path: &Path) -> Result<usize, PersistError> {
    let mut seen = HashSet::new();
    let mut unique: Vec<&Record> = Vec::new();
    for record in store.records() {
        let key = save_key(record);
        if key.is_empty() || seen.contains(&key) {
            continue;
        }
        let chosen = store
            .owner_of(&key)
            .filter(|owner| save_key(owner) == key)
            .unwrap_or(record);
        seen.insert(key);
        unique.push(chosen);
    }
    unique.sort_by(|a, b| save_order(a, b));

    let written = write_file(path, schema, unique)?;
    debug!(path = %path.display(), %schema, rows = written, "saved PPP data");
    Ok(written)
}

/// Append one record to the archive, writing the header first when the file is new.
pub fn append_deleted(record: &Record, schema: Schema, path: &Path) -> Result<(), PersistError> {
    let is_new = !path.exists();
    ensure_parent_dir(path)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(PersistError::io(path))?;
    let mut writer = csv_writer(file);
    if is_new {
        schema
            .write_header(&mut writer)
            .map_err(PersistError::csv(path))?;
    }
    schema
        .write_row(&mut writer, record)
        .map_err(PersistError::csv(path))?;
    writer.flush().map_err(PersistError::io(path))?;
    Ok(())
}

/// Archived records in file order. Layout comes from the archive's own header.
pub fn load_deleted(path: &Path) -> Result<Vec<Record>, PersistError> {
    if !path.exists() {
        debug!(path = %path.display(), "no deleted-records archive");
        return Ok(Vec::new());
    }
    let (schema, records) = read_records(path)?;
    debug!(path = %path.display(), %schema, records = records.len(), "loaded deleted-records archive");
    Ok(records)
}

/// Replace the archive contents with `records`, in the active layout. When the archive was
/// written under the other layout, fields that layout lacks are lost here.
pub fn rewrite_deleted(records: &[Record], schema: Schema, path: &Path) -> Result<(), PersistError> {
    let written = write_file(path, schema, records)?;
    debug!(path = %path.display(), %schema, rows = written, "rewrote deleted-records archive");
    Ok(())
}
