//! Durable vector index backed by SQLite and sqlite-vec.
//!
//! Entries live in a plain `contexts` table (typed columns plus the full
//! metadata as JSON); embeddings live in a `vec0` virtual table keyed by
//! the same id. Both are written inside one transaction.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OpenFlags, OptionalExtension, params, params_from_iter};
use serde_json::Value;
use tracing::{debug, info};
use zerocopy::IntoBytes;

use crate::error::{Result, StoreError};
use crate::filter::MetadataFilter;
use crate::index::VectorIndex;
use crate::types::{ContextEntry, ContextMetadata, ScoredContext, StoredContext};
use crate::vector::{
    create_vector_table, delete_embedding, drop_vector_table, init_vector_extension,
    store_embedding,
};

// ─────────────────────────────────────────────────────────────────────────────
// Schema
// ─────────────────────────────────────────────────────────────────────────────

/// Current schema version.
const SCHEMA_VERSION: i32 = 1;

const CONTEXTS_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS contexts (
        id TEXT PRIMARY KEY,
        session_id TEXT NOT NULL,
        role TEXT NOT NULL,
        message_type TEXT NOT NULL,
        timestamp TEXT NOT NULL,
        content TEXT NOT NULL,
        metadata TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_contexts_session_timestamp
        ON contexts(session_id, timestamp);

    CREATE INDEX IF NOT EXISTS idx_contexts_session_type
        ON contexts(session_id, message_type);
"#;

const META_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
"#;

const META_PROVIDER: &str = "embedding.provider";
const META_DIMENSIONS: &str = "embedding.dimensions";

fn get_meta(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM meta WHERE key = ?1", params![key], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(value)
}

fn set_meta(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO meta (key, value) VALUES (?1, ?2)",
        params![key, value],
    )?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Vector Index
// ─────────────────────────────────────────────────────────────────────────────

/// Vector index stored in a single SQLite file (WAL mode).
pub struct SqliteVectorIndex {
    conn: Mutex<Connection>,
    dims: usize,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for SqliteVectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteVectorIndex")
            .field("dims", &self.dims)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteVectorIndex {
    /// Open or create an index at `path` holding `dims`-dimensional vectors
    /// produced by the embedding provider named `provider`.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` or `ProviderMismatch` if the file was
    /// created for a different embedding space.
    pub fn open(path: impl AsRef<Path>, provider: &str, dims: usize) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        init_vector_extension();
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_FULL_MUTEX,
        )?;

        let index = Self::initialize(conn, provider, dims, Some(path.to_path_buf()))?;
        info!("Context store opened at {:?} ({}, {} dims)", path, provider, dims);
        Ok(index)
    }

    /// Create a transient in-memory SQLite index.
    pub fn open_in_memory(provider: &str, dims: usize) -> Result<Self> {
        init_vector_extension();
        let conn = Connection::open_in_memory()?;
        let index = Self::initialize(conn, provider, dims, None)?;
        info!("In-memory context store created ({}, {} dims)", provider, dims);
        Ok(index)
    }

    /// Path of the database file, if on disk.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn initialize(
        conn: Connection,
        provider: &str,
        dims: usize,
        path: Option<PathBuf>,
    ) -> Result<Self> {
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!("journal_mode = {}", mode);
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        conn.execute_batch(META_SCHEMA)?;
        conn.execute_batch(CONTEXTS_SCHEMA)?;

        match get_meta(&conn, META_DIMENSIONS)? {
            Some(value) => {
                let expected: usize = value.parse().map_err(|_| {
                    StoreError::Unavailable(format!("corrupt dimensions marker '{}'", value))
                })?;
                if expected != dims {
                    return Err(StoreError::DimensionMismatch {
                        expected,
                        actual: dims,
                    });
                }
            }
            None => set_meta(&conn, META_DIMENSIONS, &dims.to_string())?,
        }

        match get_meta(&conn, META_PROVIDER)? {
            Some(expected) if expected != provider => {
                return Err(StoreError::ProviderMismatch {
                    expected,
                    actual: provider.to_string(),
                });
            }
            Some(_) => {}
            None => set_meta(&conn, META_PROVIDER, provider)?,
        }

        create_vector_table(&conn, dims)?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;

        Ok(Self {
            conn: Mutex::new(conn),
            dims,
            path,
        })
    }

    /// Embedding provider the stored vectors were computed with.
    pub fn provider(&self) -> Result<Option<String>> {
        let conn = self.conn.lock();
        get_meta(&conn, META_PROVIDER)
    }

    /// Run `f` inside a transaction; rolled back if `f` fails.
    pub fn with_transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }

    fn check_dims(&self, actual: usize) -> Result<()> {
        if actual != self.dims {
            return Err(StoreError::DimensionMismatch {
                expected: self.dims,
                actual,
            });
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Filter Translation
// ─────────────────────────────────────────────────────────────────────────────

/// Render `filter` as a SQL predicate over alias `c`, numbering parameters
/// from `first_param`.
fn where_clause(filter: &MetadataFilter, first_param: usize) -> Result<(String, Vec<SqlValue>)> {
    filter.validate()?;

    let mut clauses = Vec::new();
    let mut values = Vec::new();

    for (key, value) in filter.conditions() {
        let column = match key {
            "session_id" => "c.session_id".to_string(),
            "type" => "c.message_type".to_string(),
            "role" => "c.role".to_string(),
            other => format!("json_extract(c.metadata, '$.{}')", other),
        };

        let bound = match value {
            Value::Null => {
                clauses.push(format!("{} IS NULL", column));
                continue;
            }
            Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => SqlValue::Integer(i),
                None => SqlValue::Real(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => SqlValue::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => {
                return Err(StoreError::Query(format!(
                    "filter value for '{}' must be a scalar",
                    key
                )));
            }
        };

        clauses.push(format!("{} = ?{}", column, first_param + values.len()));
        values.push(bound);
    }

    let sql = if clauses.is_empty() {
        "1 = 1".to_string()
    } else {
        clauses.join(" AND ")
    };
    Ok((sql, values))
}

fn row_to_stored(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, String, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

fn decode_stored((id, content, metadata): (String, String, String)) -> Result<StoredContext> {
    let metadata: ContextMetadata = serde_json::from_str(&metadata)?;
    Ok(StoredContext {
        id,
        content,
        metadata,
    })
}

fn limit_param(limit: Option<usize>) -> SqlValue {
    SqlValue::Integer(limit.map(|l| l.min(i64::MAX as usize) as i64).unwrap_or(-1))
}

// ─────────────────────────────────────────────────────────────────────────────
// VectorIndex
// ─────────────────────────────────────────────────────────────────────────────

impl VectorIndex for SqliteVectorIndex {
    fn name(&self) -> &str {
        "sqlite-vec"
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn insert(&self, entry: &ContextEntry) -> Result<()> {
        self.check_dims(entry.embedding.len())?;
        let metadata = serde_json::to_string(&entry.metadata)?;

        self.with_transaction(|conn| {
            conn.execute(
                r#"
                INSERT OR REPLACE INTO contexts
                    (id, session_id, role, message_type, timestamp, content, metadata)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    entry.id,
                    entry.metadata.session_id,
                    entry.metadata.role,
                    entry.metadata.message_type.as_str(),
                    entry.metadata.timestamp,
                    entry.content,
                    metadata,
                ],
            )?;
            store_embedding(conn, &entry.id, &entry.embedding)
        })?;

        debug!("Stored context {} in session {}", entry.id, entry.session_id());
        Ok(())
    }

    fn get(&self, filter: &MetadataFilter, limit: Option<usize>) -> Result<Vec<StoredContext>> {
        let (clause, mut values) = where_clause(filter, 1)?;
        let sql = format!(
            "SELECT c.id, c.content, c.metadata FROM contexts c WHERE {} LIMIT ?{}",
            clause,
            values.len() + 1
        );
        values.push(limit_param(limit));

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values), row_to_stored)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter().map(decode_stored).collect()
    }

    fn nearest_neighbors(
        &self,
        query: &[f32],
        filter: &MetadataFilter,
        k: usize,
    ) -> Result<Vec<ScoredContext>> {
        self.check_dims(query.len())?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let (clause, filter_values) = where_clause(filter, 2)?;
        let sql = format!(
            r#"
            SELECT c.id, c.content, c.metadata, vec_distance_l2(e.embedding, ?1) AS distance
            FROM contexts c
            JOIN context_embeddings e ON e.context_id = c.id
            WHERE {}
            ORDER BY distance ASC, c.id ASC
            LIMIT ?{}
            "#,
            clause,
            filter_values.len() + 2
        );

        let mut values = Vec::with_capacity(filter_values.len() + 2);
        values.push(SqlValue::Blob(query.as_bytes().to_vec()));
        values.extend(filter_values);
        values.push(limit_param(Some(k)));

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values), |row| {
                Ok((row_to_stored(row)?, row.get::<_, f64>(3)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(raw, distance)| {
                Ok(ScoredContext {
                    context: decode_stored(raw)?,
                    distance: distance as f32,
                })
            })
            .collect()
    }

    fn delete(&self, filter: &MetadataFilter) -> Result<usize> {
        let (clause, values) = where_clause(filter, 1)?;
        let sql = format!("SELECT c.id FROM contexts c WHERE {}", clause);

        let deleted = self.with_transaction(|conn| {
            let ids = {
                let mut stmt = conn.prepare(&sql)?;
                stmt.query_map(params_from_iter(values), |row| row.get::<_, String>(0))?
                    .collect::<rusqlite::Result<Vec<_>>>()?
            };

            for id in &ids {
                delete_embedding(conn, id)?;
                conn.execute("DELETE FROM contexts WHERE id = ?1", params![id])?;
            }
            Ok(ids.len())
        })?;

        debug!("Deleted {} contexts", deleted);
        Ok(deleted)
    }

    fn count(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM contexts", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn drop_all(&self) -> Result<()> {
        let dims = self.dims;
        self.with_transaction(|conn| {
            conn.execute_batch("DROP TABLE IF EXISTS contexts")?;
            drop_vector_table(conn)?;
            conn.execute_batch(CONTEXTS_SCHEMA)?;
            create_vector_table(conn, dims)
        })?;

        info!("Context collection dropped and recreated");
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
