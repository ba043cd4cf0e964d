//! Settings survive a restart through the on-disk SQLite store.

use focustimer_core::storage::export;
use focustimer_core::{Config, Database, FocusTimer, NullSink, PersistenceStore, Phase};

fn reopen(path: &std::path::Path) -> FocusTimer {
    FocusTimer::open(Database::open_at(path).unwrap(), NullSink, &Config::default())
}

#[test]
fn durations_task_and_session_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("focustimer.db");

    let mut timer = reopen(&path);
    timer.set_duration(Phase::Work, 45);
    timer.set_duration(Phase::LongBreak, 200);
    assert!(timer.set_task("  review pull requests "));
    timer.start();
    timer.skip();
    timer.start();
    timer.skip();
    timer.shutdown();
    drop(timer);

    let timer = reopen(&path);
    assert_eq!(timer.engine().durations().minutes(Phase::Work), 45);
    assert_eq!(timer.engine().durations().minutes(Phase::LongBreak), 60);
    assert_eq!(timer.task(), Some("review pull requests"));
    assert_eq!(timer.engine().session_number(), 2);
    assert_eq!(timer.engine().phase(), Phase::Work);
    assert_eq!(timer.engine().remaining_secs(), 45 * 60);
    assert!(!timer.is_running());
}

#[test]
fn clearing_the_task_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("focustimer.db");

    let mut timer = reopen(&path);
    timer.set_task("inbox zero");
    assert!(timer.clear_task());
    drop(timer);

    assert_eq!(reopen(&path).task(), None);
}

#[test]
fn corrupt_values_read_as_absent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("focustimer.db");

    let db = Database::open_at(&path).unwrap();
    db.kv_set("focustimer.durations", "{not json").unwrap();
    db.kv_set("focustimer.session", "42").unwrap();
    drop(db);

    let timer = reopen(&path);
    assert_eq!(timer.engine().remaining_secs(), 1500);
    assert_eq!(timer.engine().session_number(), 1);

    // The bad rows were dropped on read.
    let db = Database::open_at(&path).unwrap();
    assert!(db.kv_get("focustimer.durations").unwrap().is_none());
}

#[test]
fn legacy_off_minute_durations_are_normalized() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("focustimer.db");

    let db = Database::open_at(&path).unwrap();
    db.kv_set(
        "focustimer.durations",
        r#"{"work": 1530, "short-break": 5000, "long-break": 900}"#,
    )
    .unwrap();
    drop(db);

    let timer = reopen(&path);
    let durations = timer.engine().durations();
    assert_eq!(durations.get(Phase::Work), 26 * 60);
    assert_eq!(durations.get(Phase::ShortBreak), 30 * 60);
    assert_eq!(durations.get(Phase::LongBreak), 15 * 60);
}

#[test]
fn clear_all_leaves_foreign_keys_alone() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("focustimer.db");

    let mut db = Database::open_at(&path).unwrap();
    db.kv_set("other.app", "keep me").unwrap();
    db.save_current_task("stretch").unwrap();
    assert!(db.last_save_ms().unwrap().is_some());

    let dump = export(&mut db).unwrap();
    assert_eq!(dump.current_task.as_deref(), Some("stretch"));

    db.clear_all().unwrap();
    assert!(db.load_current_task().unwrap().is_none());
    assert!(db.last_save_ms().unwrap().is_none());
    assert_eq!(db.kv_get("other.app").unwrap().as_deref(), Some("keep me"));
}
