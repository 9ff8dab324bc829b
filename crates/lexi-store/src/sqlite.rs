//! SQLite-based chunk store.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tracing::{debug, info};
use ulid::Ulid;

use lexi_core::{Chunk, ChunkStore, LexiError, Result, SourceStats};

use crate::schema::{SCHEMA, SCHEMA_VERSION};

/// SQLite-based chunk store.
///
/// Uses a blocking Mutex around a single connection; every operation is
/// short and the rebuild job is single-writer.
pub struct SqliteStore {
    /// Connection wrapped in blocking Mutex.
    conn: Arc<Mutex<Connection>>,

    /// Database location, `:memory:` for in-memory stores.
    path: PathBuf,
}

impl SqliteStore {
    /// Discard any database at `path` and create an empty one.
    ///
    /// The WAL and shared-memory side files are removed too, so nothing of
    /// a previous index survives.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        Self::discard(path)?;
        Self::open(path)
    }

    /// Remove the database at `path` together with its side files.
    pub fn discard(path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        for file in [
            path.to_path_buf(),
            side_file(path, "-wal"),
            side_file(path, "-shm"),
        ] {
            if file.exists() {
                std::fs::remove_file(&file)?;
                debug!("Removed {:?}", file);
            }
        }

        Ok(())
    }

    /// Move a closed, checkpointed database from `staged` over `target`.
    ///
    /// Stale side files of `target` are removed first so they are never
    /// paired with the new database; the rename itself is atomic on one
    /// filesystem.
    pub fn replace(staged: impl AsRef<Path>, target: impl AsRef<Path>) -> Result<()> {
        let (staged, target) = (staged.as_ref(), target.as_ref());

        for suffix in ["-wal", "-shm"] {
            let stale = side_file(target, suffix);
            if stale.exists() {
                std::fs::remove_file(&stale)?;
            }
        }
        std::fs::rename(staged, target)?;

        for suffix in ["-wal", "-shm"] {
            let leftover = side_file(staged, suffix);
            if leftover.exists() {
                std::fs::remove_file(&leftover)?;
            }
        }

        info!("Replaced chunk store {:?}", target);
        Ok(())
    }

    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| LexiError::database(format!("Failed to open database: {}", e)))?;

        Self::init(conn, path)
    }

    /// Open an in-memory database (for testing).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            LexiError::database(format!("Failed to open in-memory database: {}", e))
        })?;

        Self::init(conn, Path::new(":memory:"))
    }

    fn init(conn: Connection, path: &Path) -> Result<Self> {
        Self::configure_connection(&conn)?;

        conn.execute_batch(SCHEMA)
            .map_err(|e| LexiError::database(format!("Failed to initialize schema: {}", e)))?;
        conn.execute(
            "INSERT OR IGNORE INTO store_meta (key, value) VALUES ('schema_version', ?1)",
            params![SCHEMA_VERSION.to_string()],
        )
        .map_err(|e| LexiError::database(e.to_string()))?;

        info!("Chunk store opened at {:?}", path);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: path.to_path_buf(),
        })
    }

    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 30000;
            PRAGMA temp_store = MEMORY;
            "#,
        )
        .map_err(|e| LexiError::database(format!("Failed to configure connection: {}", e)))?;

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored embedding of the chunk at `ordinal`, decoded from its BLOB.
    pub fn embedding(&self, ordinal: u64) -> Result<Option<Vec<f32>>> {
        self.with_conn(|conn| {
            let bytes: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT embedding FROM chunks WHERE ordinal = ?1",
                    params![ordinal as i64],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| LexiError::database(e.to_string()))?;

            Ok(bytes.map(|b| Self::bytes_to_vec(&b)))
        })
    }

    /// Execute a blocking operation on the connection.
    fn with_conn<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Connection) -> Result<R>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| LexiError::database(e.to_string()))?;
        f(&conn)
    }

    fn vec_to_bytes(v: &[f32]) -> Vec<u8> {
        v.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn bytes_to_vec(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect()
    }
}

#[async_trait]
impl ChunkStore for SqliteStore {
    async fn upsert(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<()> {
        if chunks.len() != embeddings.len() {
            return Err(LexiError::invalid_argument(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }

        self.with_conn(|conn| {
            let tx = conn
                .unchecked_transaction()
                .map_err(|e| LexiError::database(e.to_string()))?;

            let next: i64 = tx
                .query_row("SELECT COALESCE(MAX(ordinal) + 1, 0) FROM chunks", [], |row| {
                    row.get(0)
                })
                .map_err(|e| LexiError::database(e.to_string()))?;

            {
                let mut stmt = tx
                    .prepare(
                        r#"
                        INSERT INTO chunks (id, ordinal, content, source, section, kind,
                                            metadata, content_hash, embedding)
                        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                        "#,
                    )
                    .map_err(|e| LexiError::database(e.to_string()))?;

                for (offset, (chunk, embedding)) in chunks.iter().zip(embeddings).enumerate() {
                    let metadata = serde_json::to_string(&chunk.metadata)?;
                    stmt.execute(params![
                        Ulid::new().to_string(),
                        next + offset as i64,
                        chunk.content,
                        chunk.source_file,
                        chunk.context_path,
                        chunk.kind().unwrap_or_default(),
                        metadata,
                        chunk.content_hash(),
                        Self::vec_to_bytes(embedding),
                    ])
                    .map_err(|e| LexiError::database(format!("Failed to insert chunk: {}", e)))?;
                }
            }

            tx.commit()
                .map_err(|e| LexiError::database(e.to_string()))?;

            debug!("Inserted {} chunks", chunks.len());
            Ok(())
        })
    }

    async fn persist(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
                .map_err(|e| LexiError::database(format!("Failed to checkpoint: {}", e)))?;
            debug!("Checkpointed {:?}", self.path);
            Ok(())
        })
    }

    async fn count(&self) -> Result<u64> {
        self.with_conn(|conn| {
            conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))
                .map_err(|e| LexiError::database(e.to_string()))
        })
    }

    async fn source_stats(&self) -> Result<Vec<SourceStats>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    r#"
                    SELECT source, kind, COUNT(*) FROM chunks
                    GROUP BY source, kind
                    ORDER BY source, kind
                    "#,
                )
                .map_err(|e| LexiError::database(e.to_string()))?;

            let rows = stmt
                .query_map([], |row| {
                    Ok(SourceStats {
                        source: row.get(0)?,
                        kind: row.get(1)?,
                        chunks: row.get(2)?,
                    })
                })
                .map_err(|e| LexiError::database(e.to_string()))?;

            rows.collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| LexiError::database(e.to_string()))
        })
    }

    async fn sections(&self, source: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT section FROM chunks WHERE source = ?1 ORDER BY ordinal")
                .map_err(|e| LexiError::database(e.to_string()))?;

            let rows = stmt
                .query_map(params![source], |row| row.get(0))
                .map_err(|e| LexiError::database(e.to_string()))?;

            rows.collect::<std::result::Result<Vec<String>, _>>()
                .map_err(|e| LexiError::database(e.to_string()))
        })
    }
}

fn side_file(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexi_core::Metadata;

    fn chunk(source: &str, section: &str, kind: &str, body: &str) -> Chunk {
        let mut metadata = Metadata::new();
        metadata.insert("source".to_string(), source.to_string());
        metadata.insert("section".to_string(), section.to_string());
        metadata.insert("kind".to_string(), kind.to_string());
        Chunk {
            content: format!("[{}]\n{}", section, body),
            source_file: source.to_string(),
            context_path: section.to_string(),
            metadata,
        }
    }

    fn sample() -> Vec<Chunk> {
        vec![
            chunk("data/quyche.txt", "CHƯƠNG I > Điều 1. A", "regulatory", "a"),
            chunk("data/quyche.txt", "CHƯƠNG I > Điều 2. B", "regulatory", "b"),
            chunk("data/so_tay.md", "Thư viện", "handbook", "c"),
        ]
    }

    fn embeddings(n: usize) -> Vec<Vec<f32>> {
        (0..n).map(|i| vec![i as f32, 0.5, -1.25]).collect()
    }

    #[tokio::test]
    async fn test_open_memory() {
        let store = SqliteStore::open_memory().unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store.source_stats().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_and_stats() {
        let store = SqliteStore::open_memory().unwrap();
        store.upsert(&sample(), &embeddings(3)).await.unwrap();
        store.persist().await.unwrap();

        assert_eq!(store.count().await.unwrap(), 3);
        assert_eq!(
            store.source_stats().await.unwrap(),
            vec![
                SourceStats {
                    source: "data/quyche.txt".to_string(),
                    kind: "regulatory".to_string(),
                    chunks: 2,
                },
                SourceStats {
                    source: "data/so_tay.md".to_string(),
                    kind: "handbook".to_string(),
                    chunks: 1,
                },
            ]
        );
        assert_eq!(
            store.sections("data/quyche.txt").await.unwrap(),
            vec!["CHƯƠNG I > Điều 1. A", "CHƯƠNG I > Điều 2. B"]
        );
    }

    #[tokio::test]
    async fn test_embedding_blob_layout() {
        let store = SqliteStore::open_memory().unwrap();
        store.upsert(&sample(), &embeddings(3)).await.unwrap();

        assert_eq!(store.embedding(2).unwrap(), Some(vec![2.0, 0.5, -1.25]));
        assert_eq!(store.embedding(3).unwrap(), None);
        assert_eq!(
            SqliteStore::vec_to_bytes(&[1.0]),
            1.0f32.to_le_bytes().to_vec()
        );
    }

    #[tokio::test]
    async fn test_upsert_appends_in_order() {
        let store = SqliteStore::open_memory().unwrap();
        let chunks = sample();
        store.upsert(&chunks[..1], &embeddings(1)).await.unwrap();
        store.upsert(&chunks[1..2], &embeddings(1)).await.unwrap();

        assert_eq!(
            store.sections("data/quyche.txt").await.unwrap(),
            vec!["CHƯƠNG I > Điều 1. A", "CHƯƠNG I > Điều 2. B"]
        );
    }

    #[tokio::test]
    async fn test_mismatched_embeddings_rejected() {
        let store = SqliteStore::open_memory().unwrap();
        let err = store.upsert(&sample(), &embeddings(2)).await.unwrap_err();

        assert_eq!(err.error_code(), "INVALID_ARGUMENT");
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_discards_previous_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index").join("chunks.db");

        {
            let store = SqliteStore::create(&path).unwrap();
            store.upsert(&sample(), &embeddings(3)).await.unwrap();
            store.persist().await.unwrap();
        }

        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(reopened.count().await.unwrap(), 3);
        drop(reopened);

        let fresh = SqliteStore::create(&path).unwrap();
        assert_eq!(fresh.count().await.unwrap(), 0);
        assert_eq!(fresh.path(), path.as_path());
    }

    #[tokio::test]
    async fn test_replace_moves_staged_store() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("chunks.db");
        let staged = dir.path().join("chunks.db.tmp");

        {
            let old = SqliteStore::create(&target).unwrap();
            old.upsert(&sample()[..1], &embeddings(1)).await.unwrap();
            old.persist().await.unwrap();
        }
        {
            let new = SqliteStore::create(&staged).unwrap();
            new.upsert(&sample(), &embeddings(3)).await.unwrap();
            new.persist().await.unwrap();
        }

        SqliteStore::replace(&staged, &target).unwrap();

        assert!(!staged.exists());
        let store = SqliteStore::open(&target).unwrap();
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[test]
    fn test_discard_missing_store() {
        let dir = tempfile::tempdir().unwrap();
        SqliteStore::discard(dir.path().join("absent.db")).unwrap();
    }

    #[test]
    fn test_side_file_names() {
        assert_eq!(
            side_file(Path::new("/tmp/chunks.db"), "-wal"),
            PathBuf::from("/tmp/chunks.db-wal")
        );
    }
}
