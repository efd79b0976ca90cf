//! Shared fixtures for the integration tests: a scripted operator, a fixed
//! start time and a small simulated cloud.

#![allow(dead_code)]

use std::io::Cursor;

use chrono::{DateTime, TimeZone, Utc};
use tablerescue::{
    ConsoleGateway, InMemoryCloud, PitrState, RecoverySettings, TableDescriptor, TableStatus,
};

pub type ScriptedGateway = ConsoleGateway<Cursor<Vec<u8>>, Vec<u8>>;

pub const VAULT: &str = "parks-vault";
pub const ROLE: &str = "arn:aws:iam::123456789012:role/parks-restore";
pub const RESERVED: &str = "sessions";

/// Operator answering `answers`, one per line. End of script aborts.
pub fn operator(answers: &[&str]) -> ScriptedGateway {
    let mut script = answers.join("\n");
    if !answers.is_empty() {
        script.push('\n');
    }
    ConsoleGateway::new(Cursor::new(script.into_bytes()), Vec::new())
}

pub fn transcript(gateway: ScriptedGateway) -> String {
    String::from_utf8(gateway.into_output()).unwrap()
}

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
}

pub fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
}

pub fn settings() -> RecoverySettings {
    RecoverySettings {
        vault_name: VAULT.to_string(),
        restore_role_arn: ROLE.to_string(),
        reserved_table: Some(RESERVED.to_string()),
    }
}

pub fn table(name: &str, protected: bool, pitr: bool) -> TableDescriptor {
    TableDescriptor {
        name: name.to_string(),
        status: TableStatus::Active,
        deletion_protection: protected,
        pitr: if pitr {
            PitrState {
                enabled: true,
                earliest: Some(at(2024, 1, 1, 0, 0, 0)),
                latest: Some(at(2024, 6, 1, 0, 0, 0)),
            }
        } else {
            PitrState::default()
        },
    }
}

/// `mytable` (PITR on) next to the reserved `sessions` table, with an empty vault.
pub fn parks_cloud(protected: bool) -> InMemoryCloud {
    let cloud = InMemoryCloud::new();
    cloud.put_table(table("mytable", protected, true));
    cloud.put_table(table(RESERVED, true, false));
    cloud.put_vault(VAULT);
    cloud
}

/// Mutating calls in order, as `Action:target`
pub fn mutations(cloud: &InMemoryCloud) -> Vec<String> {
    cloud
        .calls()
        .iter()
        .map(|call| format!("{}:{}", call.action, call.target))
        .collect()
}
