use std::{path::Path, time::Duration};

use log::{debug, warn};
use rusqlite::{
    params_from_iter,
    types::{ToSqlOutput, Value as SqlValue, ValueRef},
    Connection, ToSql,
};
use serde_json::Value as JsonValue;

use crate::{
    store::{deadline, expired},
    Error, Predicate, Record, RecordStore, Value,
};

// Number of SQLite virtual machine instructions between deadline checks.
const PROGRESS_CHECK_INTERVAL: i32 = 1000;

// SQLite takes the busy timeout in milliseconds as a C int.
const MAX_BUSY_TIMEOUT: Duration = Duration::from_millis(i32::MAX as u64);

/// A collection of JSON documents kept in a single SQLite table.
///
/// It is analogous to a collection in a document database: each row holds
/// one record serialized as JSON, and queries are answered with
/// `json_extract`.
#[derive(Debug)]
pub struct Collection {
    conn: Connection,
    name: String,
}

impl Collection {
    /// Open (creating if necessary) the named collection in the SQLite
    /// database at the given path.
    pub fn open<P: AsRef<Path>>(path: P, name: &str) -> Result<Self, Error> {
        let path = path.as_ref();
        debug!("Opening collection {} in {}", name, path.display());
        Self::init(Connection::open(path)?, name)
    }

    /// Open the named collection in a fresh in-memory database.
    pub fn open_in_memory(name: &str) -> Result<Self, Error> {
        Self::init(Connection::open_in_memory()?, name)
    }

    fn init(conn: Connection, name: &str) -> Result<Self, Error> {
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(Error::InvalidCollectionName(name.to_string()));
        }
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS \"{}\" (id INTEGER PRIMARY KEY AUTOINCREMENT, doc TEXT NOT NULL)",
                name
            ),
            [],
        )?;
        Ok(Self {
            conn,
            name: name.to_string(),
        })
    }

    /// The name of the underlying table.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total number of records in the collection.
    pub fn count(&self) -> Result<u64, Error> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM \"{}\"", self.name),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn find_docs(&self, predicate: &Predicate) -> Result<Vec<String>, Error> {
        let mut clauses = Vec::new();
        let mut params = Vec::new();
        for (field, value) in predicate.iter() {
            params.push(Value::String(format!("$.\"{}\"", field)));
            let path = params.len();
            // json_extract reports JSON booleans as 0/1, so types are checked
            // separately to keep `true` and `1` apart.
            let clause = match value {
                Value::Null => format!("json_extract(doc, ?{}) IS NULL", path),
                Value::Bool(b) => format!("json_type(doc, ?{}) = '{}'", path, b),
                Value::Signed(_) | Value::Unsigned(_) | Value::Float(_) => {
                    params.push(value.clone());
                    format!(
                        "json_type(doc, ?{0}) IN ('integer', 'real') AND json_extract(doc, ?{0}) = ?{1}",
                        path,
                        params.len()
                    )
                }
                _ => {
                    params.push(value.clone());
                    format!("json_extract(doc, ?{}) = ?{}", path, params.len())
                }
            };
            clauses.push(clause);
        }
        let sql = format!(
            "SELECT doc FROM \"{}\"{}{} ORDER BY id",
            self.name,
            if clauses.is_empty() { "" } else { " WHERE " },
            clauses.join(" AND ")
        );
        debug!("Executing: {}", sql);
        let mut stmt = self.conn.prepare(&sql)?;
        let docs = stmt
            .query_map(params_from_iter(params.iter()), |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<String>, rusqlite::Error>>()?;
        Ok(docs)
    }
}

impl RecordStore for Collection {
    fn find(&self, predicate: &Predicate, timeout: Duration) -> Result<Vec<Record>, Error> {
        let deadline = deadline(timeout);
        self.conn.busy_timeout(timeout.min(MAX_BUSY_TIMEOUT))?;
        self.conn
            .progress_handler(PROGRESS_CHECK_INTERVAL, Some(move || expired(deadline)));
        let result = self.find_docs(predicate);
        self.conn.progress_handler(0, None::<fn() -> bool>);

        let mut records = Vec::new();
        for (i, doc) in result?.into_iter().enumerate() {
            match serde_json::from_str::<JsonValue>(&doc).map(Value::from) {
                Ok(Value::Map(record)) => records.push(record),
                Ok(other) => warn!(
                    "Skipping document {} in {}: expected an object, got a {}",
                    i,
                    self.name,
                    other.kind()
                ),
                Err(e) => warn!("Skipping unparseable document {} in {}: {}", i, self.name, e),
            }
        }
        Ok(records)
    }

    fn insert(&mut self, records: Vec<Record>) -> Result<usize, Error> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!("INSERT INTO \"{}\" (doc) VALUES (?1)", self.name))?;
            for record in &records {
                stmt.execute(rusqlite::params![serde_json::to_string(record)?])?;
            }
        }
        tx.commit()?;
        debug!("Inserted {} records into {}", records.len(), self.name);
        Ok(records.len())
    }
}

/// Binds a value the way `json_extract` reports the same JSON value.
impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::Bool(b) => ToSqlOutput::Owned(SqlValue::Integer(*b as i64)),
            Value::Signed(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            Value::Unsigned(u) => match i64::try_from(*u) {
                Ok(i) => ToSqlOutput::Owned(SqlValue::Integer(i)),
                Err(_) => ToSqlOutput::Owned(SqlValue::Real(*u as f64)),
            },
            Value::Float(f) => ToSqlOutput::Owned(SqlValue::Real(*f)),
            Value::String(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Array(_) | Value::Map(_) => ToSqlOutput::Owned(SqlValue::Text(
                JsonValue::from(self.clone()).to_string(),
            )),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{into_records, MemoryStore};
    use serde_json::json;

    fn collection() -> Collection {
        let mut collection = Collection::open_in_memory("animals").unwrap();
        collection
            .insert(
                into_records(Value::from(json!([
                    {"rescueType": "Water Rescue", "breed": "Labrador", "age": 2, "fixed": true},
                    {"rescueType": "Mountain or Wilderness Rescue", "breed": "Husky", "age": 5},
                    {"rescueType": "Water Rescue", "breed": "Newfoundland", "location_lat": 30.5},
                ])))
                .unwrap(),
            )
            .unwrap();
        collection
    }

    fn breeds(records: &[Record]) -> Vec<&str> {
        records
            .iter()
            .map(|r| r.get("breed").and_then(Value::as_str).unwrap())
            .collect()
    }

    #[test]
    fn empty_predicate_returns_everything_in_insertion_order() {
        let c = collection();
        assert_eq!(c.count().unwrap(), 3);
        let found = c.find(&Predicate::all(), Duration::from_secs(5)).unwrap();
        assert_eq!(breeds(&found), vec!["Labrador", "Husky", "Newfoundland"]);
    }

    #[test]
    fn equality_on_strings_numbers_and_bools() {
        let c = collection();
        let timeout = Duration::from_secs(5);
        let found = c
            .find(&Predicate::all().with("rescueType", "Water Rescue"), timeout)
            .unwrap();
        assert_eq!(breeds(&found), vec!["Labrador", "Newfoundland"]);

        let found = c.find(&Predicate::all().with("age", 5_i64), timeout).unwrap();
        assert_eq!(breeds(&found), vec!["Husky"]);

        let found = c.find(&Predicate::all().with("fixed", true), timeout).unwrap();
        assert_eq!(breeds(&found), vec!["Labrador"]);

        let found = c
            .find(&Predicate::all().with("location_lat", Value::Null), timeout)
            .unwrap();
        assert_eq!(breeds(&found), vec!["Labrador", "Husky"]);
    }

    #[test]
    fn booleans_and_numbers_match_like_memory_store() {
        let docs = into_records(Value::from(json!([
            {"breed": "Labrador", "fixed": true},
            {"breed": "Husky", "fixed": 1},
            {"breed": "Beagle", "fixed": 1.0},
            {"breed": "Poodle", "fixed": false},
            {"breed": "Boxer", "fixed": "1"},
        ])))
        .unwrap();
        let mut sqlite = Collection::open_in_memory("animals").unwrap();
        sqlite.insert(docs.clone()).unwrap();
        let memory = MemoryStore::new(docs);

        let timeout = Duration::from_secs(5);
        let cases = vec![
            (Predicate::all().with("fixed", true), vec!["Labrador"]),
            (Predicate::all().with("fixed", false), vec!["Poodle"]),
            (Predicate::all().with("fixed", 1_i64), vec!["Husky", "Beagle"]),
            (Predicate::all().with("fixed", 0_i64), vec![]),
            (Predicate::all().with("fixed", "1"), vec!["Boxer"]),
        ];
        for (predicate, expected) in cases {
            let from_sqlite = sqlite.find(&predicate, timeout).unwrap();
            let from_memory = memory.find(&predicate, timeout).unwrap();
            assert_eq!(breeds(&from_sqlite), expected, "{}", predicate);
            assert_eq!(breeds(&from_memory), expected, "{}", predicate);
        }
    }

    #[test]
    fn oversized_timeout_is_clamped() {
        let c = collection();
        let found = c
            .find(&Predicate::all(), Duration::from_millis(3_000_000_000))
            .unwrap();
        assert_eq!(found.len(), 3);
        let found = c.find(&Predicate::all(), Duration::MAX).unwrap();
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn round_trips_document_values() {
        let c = collection();
        let found = c
            .find(&Predicate::all().with("breed", "Newfoundland"), Duration::from_secs(5))
            .unwrap();
        assert_eq!(found[0].get("location_lat"), Some(&Value::Float(30.5)));
    }

    #[test]
    fn expired_deadline_interrupts_query() {
        let mut c = Collection::open_in_memory("animals").unwrap();
        let records = (0..5000)
            .map(|i| {
                into_records(Value::from(json!({"breed": "Mixed", "n": i})))
                    .unwrap()
                    .remove(0)
            })
            .collect();
        c.insert(records).unwrap();
        let result = c.find(&Predicate::all().with("breed", "Mixed"), Duration::ZERO);
        assert!(matches!(result, Err(Error::BackendUnavailable(_))));
        // The handler is cleared again, so later queries are unaffected.
        let found = c
            .find(&Predicate::all().with("n", 42_i64), Duration::from_secs(5))
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn collection_names_are_checked() {
        assert!(matches!(
            Collection::open_in_memory("animals; DROP TABLE x"),
            Err(Error::InvalidCollectionName(_))
        ));
    }
}
