//! Menu tests: target selection, the single failure handler, journals and
//! the session-level exits.

mod common;

use common::{mutations, operator, parks_cloud, settings, start, transcript};
use tablerescue::selector::select_target;
use tablerescue::{
    Journal, ManualClock, OpKind, Poller, RescueError, RestoreChoice, Session, SessionEnd, Timeout,
    naming, run_menu,
};
use tempfile::TempDir;

// Menu positions (1-based) as shown to the operator
const PITR_RESTORE: &str = "1";
const MANUAL_RESTORE_NATIVE: &str = "4";
const DELETE_TABLE: &str = "6";
const QUIT: &str = "9";

#[test]
fn test_declined_protection_offers_cleanup_and_returns_to_menu() {
    let cloud = parks_cloud(true);
    let clock = ManualClock::new(start());
    let journal_dir = TempDir::new().unwrap();
    let journal = Journal::new(journal_dir.path());
    let mut gateway = operator(&[
        DELETE_TABLE,
        // only mytable is offered; sessions is reserved
        "1",
        // keep deletion protection
        "n",
        // cleanup offer
        "y",
        QUIT,
    ]);

    let end = {
        let mut session = Session::new(
            &cloud,
            &cloud,
            &mut gateway,
            &clock,
            Poller::new(Timeout::Unbounded),
            settings(),
        );
        run_menu(&mut session, Some(&journal)).unwrap()
    };

    assert_eq!(end, SessionEnd::Quit);
    assert_eq!(cloud.call_count("DeleteTable"), 0);
    assert_eq!(cloud.call_count("UpdateTable"), 0);
    assert!(cloud.table("mytable").unwrap().deletion_protection);

    let out = transcript(gateway);
    assert!(out.contains("Failed step: Delete original table"));
    assert!(out.contains("Remove the temporary tables and backups"));
    assert!(out.contains("Nothing to clean up."));

    let files: Vec<_> = std::fs::read_dir(journal_dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(files.len(), 1);
    let ctx = Journal::load(&files[0]).unwrap();
    assert_eq!(ctx.workflow(), Some("delete-table"));
    assert_eq!(ctx.table(), Some("mytable"));
    assert!(ctx.get(OpKind::DeleteOriginal).unwrap().is_failed());
}

#[test]
fn test_pitr_declined_delete_cleans_up_transients() {
    let cloud = parks_cloud(true);
    let clock = ManualClock::new(start());
    let mut gateway = operator(&[
        PITR_RESTORE,
        "1",
        "2024-03-15T12:00:00",
        // keep deletion protection on mytable
        "n",
        // cleanup offer
        "y",
        QUIT,
    ]);

    let end = {
        let mut session = Session::new(
            &cloud,
            &cloud,
            &mut gateway,
            &clock,
            Poller::new(Timeout::Unbounded),
            settings(),
        );
        run_menu(&mut session, None).unwrap()
    };

    assert_eq!(end, SessionEnd::Quit);
    let duplicate = naming::duplicate_name("mytable", start());
    let calls = mutations(&cloud);
    assert!(calls.contains(&format!("DeleteTable:{}", duplicate)));
    assert!(!calls.contains(&"DeleteTable:mytable".to_string()));
    assert!(cloud.table(&duplicate).is_none());
    assert!(cloud.backups().is_empty());
    assert!(cloud.table("mytable").unwrap().deletion_protection);
}

#[test]
fn test_existing_name_rejected_for_manual_restore() {
    let cloud = parks_cloud(false);
    let clock = ManualClock::new(start());
    let mut gateway = operator(&[MANUAL_RESTORE_NATIVE, "mytable", "menu", QUIT]);

    let end = {
        let mut session = Session::new(
            &cloud,
            &cloud,
            &mut gateway,
            &clock,
            Poller::new(Timeout::Unbounded),
            settings(),
        );
        run_menu(&mut session, None).unwrap()
    };

    assert_eq!(end, SessionEnd::Quit);
    assert!(cloud.calls().is_empty());
    assert!(transcript(gateway).contains("Table mytable already exists"));
}

#[test]
fn test_exit_aborts_the_session() {
    let cloud = parks_cloud(false);
    let clock = ManualClock::new(start());
    let mut gateway = operator(&[PITR_RESTORE, "1", "exit"]);

    let mut session = Session::new(
        &cloud,
        &cloud,
        &mut gateway,
        &clock,
        Poller::new(Timeout::Unbounded),
        settings(),
    );
    assert_eq!(run_menu(&mut session, None).unwrap(), SessionEnd::Aborted);
}

#[test]
fn test_end_of_input_aborts_the_session() {
    let cloud = parks_cloud(false);
    let clock = ManualClock::new(start());
    let mut gateway = operator(&[]);

    let mut session = Session::new(
        &cloud,
        &cloud,
        &mut gateway,
        &clock,
        Poller::new(Timeout::Unbounded),
        settings(),
    );
    assert_eq!(run_menu(&mut session, None).unwrap(), SessionEnd::Aborted);
}

#[test]
fn test_reserved_table_is_never_offered() {
    let cloud = tablerescue::InMemoryCloud::new();
    cloud.put_table(common::table(common::RESERVED, false, false));
    let clock = ManualClock::new(start());
    let mut gateway = operator(&[]);

    let mut session = Session::new(
        &cloud,
        &cloud,
        &mut gateway,
        &clock,
        Poller::new(Timeout::Unbounded),
        settings(),
    );
    let err = select_target(&mut session, RestoreChoice::DeleteTable).unwrap_err();
    assert!(matches!(err, RescueError::Validation(_)));
}

#[test]
fn test_new_table_name_must_be_valid() {
    let cloud = parks_cloud(false);
    let clock = ManualClock::new(start());
    let mut gateway = operator(&["ab", "my table", "mytable-restored"]);

    let picked = {
        let mut session = Session::new(
            &cloud,
            &cloud,
            &mut gateway,
            &clock,
            Poller::new(Timeout::Unbounded),
            settings(),
        );
        select_target(&mut session, RestoreChoice::ManualRestoreVault).unwrap()
    };

    assert_eq!(picked, "mytable-restored");
    let out = transcript(gateway);
    assert!(out.contains("3 to 255 characters"));
    assert!(out.contains("found ' '"));
}

#[test]
fn test_new_table_name_must_not_look_temporary() {
    let cloud = parks_cloud(false);
    let clock = ManualClock::new(start());
    let mut gateway = operator(&["mytable--dupe-20240601090000", "mytable-restored"]);

    let picked = {
        let mut session = Session::new(
            &cloud,
            &cloud,
            &mut gateway,
            &clock,
            Poller::new(Timeout::Unbounded),
            settings(),
        );
        select_target(&mut session, RestoreChoice::ManualRestoreNative).unwrap()
    };

    assert_eq!(picked, "mytable-restored");
    assert!(transcript(gateway).contains("reserved for temporary resources"));
}
