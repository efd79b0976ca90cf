//! Table and backup naming rules.
//!
//! Names follow the table store's rules: 3 to 255 characters drawn from
//! `[A-Za-z0-9_.-]`. Transient resources get a synthetic suffix plus a
//! second-resolution timestamp so they never collide with real tables.

use chrono::{DateTime, Utc};

/// Suffix of point-in-time duplicates
pub const DUPE_SUFFIX: &str = "--dupe-";
/// Suffix of safety backups of the original table
pub const ORIG_SUFFIX: &str = "--orig-";
/// Suffix of operator-requested backups
pub const MANUAL_SUFFIX: &str = "--manual-";

pub const MIN_NAME_LEN: usize = 3;
pub const MAX_NAME_LEN: usize = 255;

/// Check a table or backup name against the store's naming rules.
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.len() < MIN_NAME_LEN || name.len() > MAX_NAME_LEN {
        return Err(format!(
            "Name must be {} to {} characters long (got {})",
            MIN_NAME_LEN,
            MAX_NAME_LEN,
            name.len()
        ));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')))
    {
        return Err(format!(
            "Name may only contain letters, digits, '_', '.' and '-' (found '{}')",
            bad
        ));
    }
    Ok(())
}

fn stamp(at: DateTime<Utc>) -> String {
    at.format("%Y%m%d%H%M%S").to_string()
}

/// Keep `base + suffix` within the length limit.
fn synthetic(table: &str, suffix: &str, at: DateTime<Utc>) -> String {
    let tail = format!("{}{}", suffix, stamp(at));
    let room = MAX_NAME_LEN.saturating_sub(tail.len());
    let base: String = table.chars().take(room).collect();
    format!("{}{}", base, tail)
}

pub fn duplicate_name(table: &str, at: DateTime<Utc>) -> String {
    synthetic(table, DUPE_SUFFIX, at)
}

pub fn original_backup_name(table: &str, at: DateTime<Utc>) -> String {
    synthetic(table, ORIG_SUFFIX, at)
}

pub fn manual_backup_name(table: &str, at: DateTime<Utc>) -> String {
    synthetic(table, MANUAL_SUFFIX, at)
}

/// True for names this tool generates for transient resources.
pub fn is_synthetic(name: &str) -> bool {
    [DUPE_SUFFIX, ORIG_SUFFIX, MANUAL_SUFFIX]
        .iter()
        .any(|suffix| name.contains(suffix))
}
