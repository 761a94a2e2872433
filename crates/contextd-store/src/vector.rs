//! sqlite-vec helpers for the embeddings table.

use std::sync::Once;

use rusqlite::{Connection, params};
use tracing::{debug, info};
use zerocopy::IntoBytes;

use crate::error::Result;

static VEC_INIT: Once = Once::new();

/// Register sqlite-vec for every connection opened afterwards.
///
/// Registration is process-wide and only happens once.
pub fn init_vector_extension() {
    VEC_INIT.call_once(|| {
        use rusqlite::ffi::sqlite3_auto_extension;
        use sqlite_vec::sqlite3_vec_init;

        // SAFETY: sqlite3_vec_init has the signature sqlite expects of an
        // extension entry point.
        unsafe {
            #[allow(clippy::missing_transmute_annotations)]
            sqlite3_auto_extension(Some(std::mem::transmute(sqlite3_vec_init as *const ())));
        }
    });
}

/// Version string of the loaded sqlite-vec extension.
pub fn check_vector_extension(conn: &Connection) -> Result<String> {
    let version: String = conn.query_row("SELECT vec_version()", [], |row| row.get(0))?;
    Ok(version)
}

/// Create the vec0 table holding one embedding per context id.
pub fn create_vector_table(conn: &Connection, dims: usize) -> Result<()> {
    let sql = format!(
        r#"
        CREATE VIRTUAL TABLE IF NOT EXISTS context_embeddings USING vec0(
            context_id TEXT PRIMARY KEY,
            embedding float[{dims}]
        )
        "#
    );
    conn.execute_batch(&sql)?;
    debug!("Ensured context_embeddings table with {} dimensions", dims);
    Ok(())
}

/// Drop the embeddings table.
pub fn drop_vector_table(conn: &Connection) -> Result<()> {
    conn.execute_batch("DROP TABLE IF EXISTS context_embeddings")?;
    info!("Dropped context_embeddings table");
    Ok(())
}

/// Store an embedding, replacing any existing one for the id.
pub fn store_embedding(conn: &Connection, context_id: &str, embedding: &[f32]) -> Result<()> {
    // vec0 has no INSERT OR REPLACE
    delete_embedding(conn, context_id)?;
    conn.execute(
        "INSERT INTO context_embeddings (context_id, embedding) VALUES (?1, ?2)",
        params![context_id, embedding.as_bytes()],
    )?;
    Ok(())
}

/// Delete the embedding for an id. Returns whether one existed.
pub fn delete_embedding(conn: &Connection, context_id: &str) -> Result<bool> {
    let rows = conn.execute(
        "DELETE FROM context_embeddings WHERE context_id = ?1",
        params![context_id],
    )?;
    Ok(rows > 0)
}

/// Number of stored embeddings.
pub fn count_embeddings(conn: &Connection) -> Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM context_embeddings", [], |row| {
        row.get(0)
    })?;
    Ok(count as usize)
}
