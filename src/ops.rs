//! Query and mutation operations over the loaded store. Every mutation persists the primary
//! file before returning; delete and restore also maintain the deleted-records archive.

use std::cmp::Ordering;
use std::fmt;
use std::path::Path;

use tracing::info;

use crate::config::ManagerConfig;
use crate::data::persist::{
    append_deleted, load_deleted, load_store, rewrite_deleted, save_store, PersistError,
};
use crate::data::record::Record;
use crate::data::schema::Schema;
use crate::data::store::RecordStore;

#[derive(Debug)]
pub enum OpError {
    NotFound(String),
    MissingName,
    Persist(PersistError),
}

impl fmt::Display for OpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(query) => write!(f, "country not found: '{query}'"),
            Self::MissingName => write!(f, "a country name is required"),
            Self::Persist(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for OpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Persist(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PersistError> for OpError {
    fn from(err: PersistError) -> Self {
        Self::Persist(err)
    }
}

/// Outcome of comparing two records by PPP.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub first: Record,
    pub second: Record,
    /// Ordering of `first.ppp` relative to `second.ppp`.
    pub ordering: Ordering,
}

impl Comparison {
    pub fn verdict(&self) -> String {
        match self.ordering {
            Ordering::Greater => format!("{} has higher PPP.", self.first.name),
            Ordering::Less => format!("{} has higher PPP.", self.second.name),
            Ordering::Equal => "Both have equal PPP.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombinedTotal {
    pub total: f64,
    pub found: Vec<Record>,
    /// Queries that matched nothing, exactly as given.
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// Names put back into the store, in archive order.
    pub restored: Vec<String>,
    /// Archived records left in place because a live record already has their name or slug.
    pub kept: usize,
}

impl RestoreReport {
    /// True when the archive had nothing in it.
    pub fn archive_was_empty(&self) -> bool {
        self.restored.is_empty() && self.kept == 0
    }
}

/// Split a comma-separated list of names or slugs, dropping blanks.
pub fn split_queries(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|query| !query.is_empty())
        .map(str::to_string)
        .collect()
}

/// The loaded store together with the layout it was read under and where it lives on disk.
#[derive(Debug)]
pub struct Manager {
    store: RecordStore,
    schema: Schema,
    config: ManagerConfig,
}

impl Manager {
    /// Load the primary file named by `config`. The detected layout is used for every later save.
    pub fn open(config: ManagerConfig) -> Result<Self, PersistError> {
        let (store, schema) = load_store(&config.data_path)?;
        Ok(Manager {
            store,
            schema,
            config,
        })
    }

    pub fn schema(&self) -> Schema {
        self.schema
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn data_path(&self) -> &Path {
        &self.config.data_path
    }

    pub fn deleted_path(&self) -> &Path {
        &self.config.deleted_path
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn find(&self, query: &str) -> Option<&Record> {
        self.store.find(query)
    }

    fn require(&self, query: &str) -> Result<&Record, OpError> {
        self.find(query)
            .ok_or_else(|| OpError::NotFound(query.to_string()))
    }

    fn persist(&self) -> Result<(), PersistError> {
        save_store(&self.store, self.schema, &self.config.data_path).map(|_| ())
    }

    /// Index `record` under its name and slug, replacing whatever held those keys, then save.
    /// Under the simple layout slug, date and region are cleared first, since that layout
    /// cannot store them.
    pub fn add_or_update(&mut self, mut record: Record) -> Result<(), OpError> {
        if record.name.trim().is_empty() {
            return Err(OpError::MissingName);
        }
        if !self.schema.is_extended() {
            record.slug.clear();
            record.date.clear();
            record.region.clear();
        }
        let name = record.name.clone();
        self.store.insert(record);
        self.persist()?;
        info!(name = %name, "record saved");
        Ok(())
    }

    /// Archive the matching record, remove it under all of its keys, then save.
    /// The store is left untouched when the archive cannot be written.
    pub fn delete(&mut self, query: &str) -> Result<Record, OpError> {
        let not_found = || OpError::NotFound(query.to_string());
        let id = self.store.find_id(query).ok_or_else(not_found)?;
        let archived = self.store.get(id).ok_or_else(not_found)?;
        append_deleted(archived, self.schema, &self.config.deleted_path)?;
        let record = self.store.remove(id).ok_or_else(not_found)?;
        self.persist()?;
        info!(name = %record.name, archive = %self.config.deleted_path.display(), "record deleted");
        Ok(record)
    }

    /// Move every archived record without a live name/slug conflict back into the store.
    /// Conflicting records stay archived. An empty archive leaves both files untouched.
    pub fn restore_all(&mut self) -> Result<RestoreReport, OpError> {
        let archived = load_deleted(&self.config.deleted_path)?;
        if archived.is_empty() {
            return Ok(RestoreReport::default());
        }

        let mut restored = Vec::new();
        let mut keep = Vec::new();
        for record in archived {
            if self.store.conflicts_with(&record) {
                keep.push(record);
                continue;
            }
            let name = record.name.clone();
            if self.store.insert(record).is_some() {
                restored.push(name);
            }
        }

        self.persist()?;
        rewrite_deleted(&keep, self.schema, &self.config.deleted_path)?;
        info!(restored = restored.len(), kept = keep.len(), "archive merged back");
        Ok(RestoreReport {
            restored,
            kept: keep.len(),
        })
    }

    pub fn compare(&self, first: &str, second: &str) -> Result<Comparison, OpError> {
        let a = self.require(first)?;
        let b = self.require(second)?;
        Ok(Comparison {
            first: a.clone(),
            second: b.clone(),
            ordering: a.ppp.partial_cmp(&b.ppp).unwrap_or(Ordering::Equal),
        })
    }

    /// Sum PPP over every query that resolves; misses are collected, never fatal.
    pub fn combined_total<S: AsRef<str>>(&self, queries: &[S]) -> CombinedTotal {
        let mut combined = CombinedTotal::default();
        for query in queries {
            let query = query.as_ref();
            match self.find(query) {
                Some(record) => {
                    combined.total += record.ppp;
                    combined.found.push(record.clone());
                }
                None => combined.missing.push(query.to_string()),
            }
        }
        combined
    }
}
