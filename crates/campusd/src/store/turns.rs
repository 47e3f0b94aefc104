//! Chat history persistence.

use super::{Db, StoreError, TurnStore};
use campus_common::ConversationTurn;
use chrono::{DateTime, Utc};

pub struct SqliteTurnStore {
    db: Db,
}

impl SqliteTurnStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

impl TurnStore for SqliteTurnStore {
    fn persist_turn(
        &self,
        session_id: &str,
        user_text: &str,
        bot_text: &str,
    ) -> Result<(), StoreError> {
        let conn = self.db.lock().unwrap();
        conn.execute(
            "INSERT INTO chat_history (session_id, user_message, bot_response, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![session_id, user_text, bot_text, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn recent_turns(
        &self,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, StoreError> {
        let conn = self.db.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT user_message, bot_response, timestamp FROM chat_history
             WHERE session_id = ?1
             ORDER BY timestamp DESC, id DESC
             LIMIT ?2",
        )?;

        let mut turns = stmt
            .query_map(rusqlite::params![session_id, limit as i64], |row| {
                let user_text: String = row.get(0)?;
                let bot_text: String = row.get(1)?;
                let raw_ts: String = row.get(2)?;
                Ok((user_text, bot_text, raw_ts))
            })?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|(user_text, bot_text, raw_ts)| {
                let timestamp = DateTime::parse_from_rfc3339(&raw_ts)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| StoreError::Corrupt(format!("bad timestamp '{}': {}", raw_ts, e)))?;
                Ok(ConversationTurn {
                    user_text,
                    bot_text,
                    timestamp,
                })
            })
            .collect::<Result<Vec<ConversationTurn>, StoreError>>()?;

        // Query is newest-first for the LIMIT; callers get oldest-first
        // with the most recent turn last.
        turns.reverse();
        Ok(turns)
    }
}

#[cfg(test)]
mod tests {
    use super::super::open_in_memory;
    use super::*;

    #[test]
    fn test_persist_then_fetch() {
        let store = SqliteTurnStore::new(open_in_memory().unwrap());

        store.persist_turn("s1", "hello", "hi there").unwrap();
        let turns = store.recent_turns("s1", 10).unwrap();

        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].user_text, "hello");
        assert_eq!(turns[0].bot_text, "hi there");
    }

    #[test]
    fn test_most_recent_last() {
        let store = SqliteTurnStore::new(open_in_memory().unwrap());

        store.persist_turn("s1", "first", "r1").unwrap();
        store.persist_turn("s1", "second", "r2").unwrap();
        store.persist_turn("s1", "third", "r3").unwrap();

        let turns = store.recent_turns("s1", 2).unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].user_text, "second");
        assert_eq!(turns[1].user_text, "third");
    }

    #[test]
    fn test_sessions_are_isolated() {
        let store = SqliteTurnStore::new(open_in_memory().unwrap());

        store.persist_turn("s1", "mine", "r").unwrap();
        store.persist_turn("s2", "yours", "r").unwrap();

        let turns = store.recent_turns("s1", 10).unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].user_text, "mine");
    }

    #[test]
    fn test_empty_history() {
        let store = SqliteTurnStore::new(open_in_memory().unwrap());
        assert!(store.recent_turns("nobody", 10).unwrap().is_empty());
    }
}
