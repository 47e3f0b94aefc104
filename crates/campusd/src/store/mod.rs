//! SQLite-backed stores: chat history, student records, document index.
//!
//! One database file, one connection behind a mutex. The pipeline only
//! sees the trait seams so tests can swap in fakes.

pub mod index;
pub mod students;
pub mod turns;

use anyhow::{Context, Result};
use async_trait::async_trait;
use campus_common::{ConversationTurn, CreditSummary, Passage, SemesterCredits, StudentProfile};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

pub use index::SqliteDocumentIndex;
pub use students::SqliteStudentStore;
pub use turns::SqliteTurnStore;

/// Storage errors surfaced to the pipeline. The pipeline folds these
/// into trace notes; they never cross the orchestrator boundary.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Chat turn persistence. History comes back most-recent-last.
pub trait TurnStore: Send + Sync {
    fn persist_turn(
        &self,
        session_id: &str,
        user_text: &str,
        bot_text: &str,
    ) -> Result<(), StoreError>;

    fn recent_turns(
        &self,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, StoreError>;
}

/// Structured student-records lookups. `Ok(None)` is the expected
/// "no such student" outcome, not an error.
pub trait StudentStore: Send + Sync {
    fn profile(&self, student_id: &str) -> Result<Option<StudentProfile>, StoreError>;

    fn total_credits(&self, student_id: &str) -> Result<Option<CreditSummary>, StoreError>;

    fn semester_credits(
        &self,
        student_id: &str,
        term: &str,
        year: &str,
    ) -> Result<Option<SemesterCredits>, StoreError>;
}

/// Similarity search over the document index. May return empty.
#[async_trait]
pub trait DocumentIndex: Send + Sync {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<Passage>, StoreError>;
}

/// Shared connection handle.
pub type Db = Arc<Mutex<Connection>>;

/// Open (or create) the database and apply the schema.
pub fn open_database(path: &Path) -> Result<Db> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating database directory {}", parent.display()))?;
    }

    let conn = Connection::open(path)
        .with_context(|| format!("opening database {}", path.display()))?;
    apply_schema(&conn)?;
    info!("Database ready at {}", path.display());
    Ok(Arc::new(Mutex::new(conn)))
}

/// In-memory database for tests.
pub fn open_in_memory() -> Result<Db> {
    let conn = Connection::open_in_memory().context("opening in-memory database")?;
    apply_schema(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

fn apply_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS chat_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id TEXT NOT NULL,
            user_message TEXT NOT NULL,
            bot_response TEXT NOT NULL,
            timestamp TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_chat_session
            ON chat_history(session_id, timestamp);

        CREATE TABLE IF NOT EXISTS students (
            student_id TEXT PRIMARY KEY,
            full_name TEXT NOT NULL,
            class_code TEXT NOT NULL,
            details_json TEXT NOT NULL DEFAULT '{}'
        );

        CREATE TABLE IF NOT EXISTS course_credits (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            class_code TEXT NOT NULL,
            course_code TEXT NOT NULL,
            credits INTEGER NOT NULL,
            term TEXT NOT NULL,
            year TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_credits_class
            ON course_credits(class_code);

        CREATE TABLE IF NOT EXISTS passages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            source TEXT NOT NULL,
            content TEXT NOT NULL,
            embedding BLOB NOT NULL
        );
        "#,
    )
    .context("applying database schema")?;
    Ok(())
}
