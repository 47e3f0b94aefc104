//! Chat history persistence against a real database file.

use campusd::store::turns::SqliteTurnStore;
use campusd::store::{open_database, TurnStore};

#[test]
fn persisted_turn_is_most_recent_in_fetch() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_database(&dir.path().join("campus.db")).unwrap();
    let store = SqliteTurnStore::new(db);

    store
        .persist_turn("session-a", "học phí bao nhiêu", "15 triệu mỗi kỳ")
        .unwrap();
    store
        .persist_turn("session-a", "còn ký túc xá", "600 nghìn mỗi tháng")
        .unwrap();

    let turns = store.recent_turns("session-a", 1).unwrap();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].user_text, "còn ký túc xá");
    assert_eq!(turns[0].bot_text, "600 nghìn mỗi tháng");
}

#[test]
fn reopening_database_keeps_history() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("campus.db");

    {
        let store = SqliteTurnStore::new(open_database(&path).unwrap());
        store.persist_turn("session-b", "q", "a").unwrap();
    }

    let store = SqliteTurnStore::new(open_database(&path).unwrap());
    let turns = store.recent_turns("session-b", 10).unwrap();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].user_text, "q");
}
