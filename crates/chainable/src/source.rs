//! Date sources: where an owner's timestamps come from.
//!
//! The chain engine never reads records itself. A `DateSource` resolves an
//! owner, an association name and a column name into raw timestamps, and
//! the service turns those into calendar days. Association and column names
//! are passed through untouched.
//!
//! Two sources ship with the crate:
//! - `MemorySource` keeps records in memory (tests, embedding, caching).
//! - `JsonlSource` reads one JSONL file per association.

use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use crate::error::{ChainError, Result};
use crate::timestamp::RawTimestamp;

/// Field that names the owning entity in a JSONL record
pub const OWNER_FIELD: &str = "owner";

/// One related record: column name to timestamp value
pub type Record = BTreeMap<String, RawTimestamp>;

/// Resolves the timestamps of an owner's related records.
///
/// Implementations must fail on records they cannot read rather than skip
/// them; a silently dropped record can hide or shorten a chain.
pub trait DateSource {
    fn fetch(&self, owner: &str, association: &str, column: &str) -> Result<Vec<RawTimestamp>>;
}

impl<S: DateSource + ?Sized> DateSource for &S {
    fn fetch(&self, owner: &str, association: &str, column: &str) -> Result<Vec<RawTimestamp>> {
        (**self).fetch(owner, association, column)
    }
}

impl<S: DateSource + ?Sized> DateSource for Box<S> {
    fn fetch(&self, owner: &str, association: &str, column: &str) -> Result<Vec<RawTimestamp>> {
        (**self).fetch(owner, association, column)
    }
}

fn column_of(record: &Record, association: &str, column: &str) -> Result<RawTimestamp> {
    record
        .get(column)
        .cloned()
        .ok_or_else(|| ChainError::MissingColumn {
            association: association.to_string(),
            column: column.to_string(),
        })
}

/// In-memory records grouped by owner and association
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    associations: BTreeSet<String>,
    records: HashMap<(String, String), Vec<Record>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an association that may have no records yet
    pub fn register_association(&mut self, association: &str) {
        self.associations.insert(association.to_string());
    }

    /// Add a record for `owner` under `association`
    pub fn insert(&mut self, owner: &str, association: &str, record: Record) {
        self.register_association(association);
        self.records
            .entry((owner.to_string(), association.to_string()))
            .or_default()
            .push(record);
    }

    /// Add a record holding a single timestamp column
    pub fn insert_timestamp(
        &mut self,
        owner: &str,
        association: &str,
        column: &str,
        value: impl Into<RawTimestamp>,
    ) {
        let mut record = Record::new();
        record.insert(column.to_string(), value.into());
        self.insert(owner, association, record);
    }

    pub fn record_count(&self, owner: &str, association: &str) -> usize {
        self.records
            .get(&(owner.to_string(), association.to_string()))
            .map_or(0, Vec::len)
    }
}

impl DateSource for MemorySource {
    fn fetch(&self, owner: &str, association: &str, column: &str) -> Result<Vec<RawTimestamp>> {
        if !self.associations.contains(association) {
            return Err(ChainError::UnknownAssociation(association.to_string()));
        }

        let Some(records) = self.records.get(&(owner.to_string(), association.to_string())) else {
            return Ok(Vec::new());
        };

        records
            .iter()
            .map(|record| column_of(record, association, column))
            .collect()
    }
}

#[derive(Serialize)]
struct JsonlRecord<'a> {
    owner: &'a str,
    #[serde(flatten)]
    columns: &'a Record,
}

/// Records stored as JSONL, one `<association>.jsonl` file per association.
///
/// Each line is a JSON object with an `owner` string and any number of
/// timestamp columns. Strings are read as RFC 3339 or `YYYY-MM-DD`,
/// integers as Unix seconds.
#[derive(Debug, Clone)]
pub struct JsonlSource {
    dir: PathBuf,
}

impl JsonlSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File backing `association`
    pub fn path_for(&self, association: &str) -> Result<PathBuf> {
        let valid = !association.is_empty()
            && association
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(ChainError::UnknownAssociation(association.to_string()));
        }
        Ok(self.dir.join(format!("{}.jsonl", association)))
    }

    /// Append a record for `owner` under `association`
    pub fn append(&self, owner: &str, association: &str, record: &Record) -> Result<()> {
        if record.contains_key(OWNER_FIELD) {
            return Err(ChainError::Source(format!(
                "column name {} is reserved",
                OWNER_FIELD
            )));
        }

        let path = self.path_for(association)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;

        let line = serde_json::to_string(&JsonlRecord {
            owner,
            columns: record,
        })?;
        writeln!(file, "{}", line)?;
        file.sync_all()?;

        Ok(())
    }
}

impl DateSource for JsonlSource {
    fn fetch(&self, owner: &str, association: &str, column: &str) -> Result<Vec<RawTimestamp>> {
        let path = self.path_for(association)?;
        if !path.exists() {
            return Err(ChainError::UnknownAssociation(association.to_string()));
        }

        let reader = BufReader::new(File::open(&path)?);
        let mut values = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let malformed = |reason: String| ChainError::MalformedRecord {
                association: association.to_string(),
                line: index + 1,
                reason,
            };

            let object: serde_json::Map<String, Value> =
                serde_json::from_str(&line).map_err(|e| malformed(e.to_string()))?;

            let record_owner = object
                .get(OWNER_FIELD)
                .and_then(Value::as_str)
                .ok_or_else(|| malformed(format!("missing string field {}", OWNER_FIELD)))?;
            if record_owner != owner {
                continue;
            }

            let value = object.get(column).ok_or_else(|| ChainError::MissingColumn {
                association: association.to_string(),
                column: column.to_string(),
            })?;

            values.push(raw_from_json(value, column)?);
        }

        tracing::debug!(
            owner,
            association,
            column,
            records = values.len(),
            path = %path.display(),
            "read jsonl timestamps"
        );
        Ok(values)
    }
}

fn raw_from_json(value: &Value, column: &str) -> Result<RawTimestamp> {
    match value {
        Value::String(text) => Ok(RawTimestamp::Text(text.clone())),
        Value::Number(n) => n.as_i64().map(RawTimestamp::Epoch).ok_or_else(|| {
            ChainError::MalformedTimestamp {
                column: column.to_string(),
                value: n.to_string(),
            }
        }),
        other => Err(ChainError::MalformedTimestamp {
            column: column.to_string(),
            value: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_unknown_association() {
        let source = MemorySource::new();
        assert!(matches!(
            source.fetch("alice", "posts", "created_at"),
            Err(ChainError::UnknownAssociation(_))
        ));
    }

    #[test]
    fn test_memory_owner_without_records() {
        let mut source = MemorySource::new();
        source.register_association("posts");
        assert!(source.fetch("alice", "posts", "created_at").unwrap().is_empty());
    }

    #[test]
    fn test_memory_missing_column() {
        let mut source = MemorySource::new();
        source.insert_timestamp("alice", "posts", "created_at", "2024-03-10");
        assert!(matches!(
            source.fetch("alice", "posts", "updated_at"),
            Err(ChainError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_memory_owners_are_isolated() {
        let mut source = MemorySource::new();
        source.insert_timestamp("alice", "posts", "created_at", "2024-03-10");
        source.insert_timestamp("bob", "posts", "created_at", "2024-03-09");
        source.insert_timestamp("bob", "posts", "created_at", "2024-03-08");

        assert_eq!(source.fetch("alice", "posts", "created_at").unwrap().len(), 1);
        assert_eq!(source.record_count("bob", "posts"), 2);
    }

    #[test]
    fn test_jsonl_rejects_path_like_association() {
        let source = JsonlSource::new("/tmp/chainable");
        assert!(source.path_for("../etc/passwd").is_err());
        assert!(source.path_for("").is_err());
        assert!(source.path_for("daily_posts").is_ok());
    }

    #[test]
    fn test_raw_from_json() {
        assert_eq!(
            raw_from_json(&Value::from(1_710_072_000i64), "created_at").unwrap(),
            RawTimestamp::Epoch(1_710_072_000)
        );
        assert!(raw_from_json(&Value::Null, "created_at").is_err());
        assert!(raw_from_json(&Value::from(1.5), "created_at").is_err());
    }
}
