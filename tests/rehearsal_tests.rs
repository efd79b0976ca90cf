//! The shipped rehearsal fixture and sample configuration load, pass the
//! pre-flight checks and support a full scripted session.

mod common;

use std::path::PathBuf;

use common::{operator, start};
use tablerescue::preflight::verify_services;
use tablerescue::{
    Clock, InMemoryCloud, ManualClock, Poller, RescueConfig, Session, SessionEnd, Timeout, naming,
    run_menu,
};

fn demo(file: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("demos")
        .join(file)
}

#[test]
fn test_sample_config_is_valid() {
    let config = RescueConfig::load_from_file(demo("tablerescue.json")).unwrap();
    config.validate().unwrap();
    assert_eq!(config.timeout().unwrap(), Timeout::Seconds(900));
    assert_eq!(config.reserved_table.as_deref(), Some("sessions"));
}

#[test]
fn test_fixture_passes_preflight() {
    let config = RescueConfig::load_from_file(demo("tablerescue.json")).unwrap();
    let cloud = InMemoryCloud::load_fixture(&demo("rehearsal.json")).unwrap();

    let result = verify_services(
        &cloud,
        &cloud,
        &config.vault_name,
        config.reserved_table.as_deref(),
    );
    assert!(result.is_ok());
    assert_eq!(result.table_count, 3);
    assert_eq!(result.recovery_point_count, 3);
    assert!(result.warnings.is_empty());
}

#[test]
fn test_rehearsed_vault_restore() {
    let config = RescueConfig::load_from_file(demo("tablerescue.json")).unwrap();
    let clock = ManualClock::new(start());
    let cloud = InMemoryCloud::load_fixture(&demo("rehearsal.json"))
        .unwrap()
        .with_clock(clock.clone());
    let mut gateway = operator(&[
        // vault restore of parks from the newest (warm) point
        "2", "1", "1",
        // disable protection, then delete
        "y", "parks", "y", "parks",
        // keep the safety backup
        "n",
        // quit
        "9",
    ]);

    let end = {
        let mut session = Session::new(
            &cloud,
            &cloud,
            &mut gateway,
            &clock,
            Poller::new(config.timeout().unwrap()),
            config.recovery_settings(),
        );
        run_menu(&mut session, None).unwrap()
    };

    assert_eq!(end, SessionEnd::Quit);
    assert_eq!(cloud.call_count("StartRestoreJob"), 1);
    assert_eq!(cloud.call_count("CreateBackup"), 1);
    assert!(cloud.table("parks").is_some());
    // the seeded manual backup plus the safety backup
    let backups = cloud.backups();
    assert_eq!(backups.len(), 2);
    assert!(backups.iter().any(|b| b.name == "parks--manual-20240520120000"));
    let safety = backups
        .iter()
        .find(|b| b.name.starts_with(&format!("parks{}", naming::ORIG_SUFFIX)))
        .unwrap();
    // stamped on the rehearsal clock, not the wall clock
    let stamped = safety.created_at.unwrap();
    assert!(stamped >= start() && stamped <= clock.now());
    assert!(clock.total_slept() > std::time::Duration::ZERO);
}
