//! Property-based tests for naming rules, timeouts and prompt parsing.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use tablerescue::gateway::parse_date_time;
use tablerescue::naming::{
    self, DUPE_SUFFIX, MANUAL_SUFFIX, MAX_NAME_LEN, ORIG_SUFFIX, is_synthetic, validate_name,
};
use tablerescue::{StorageTier, Timeout};

/// Strategy for any valid table name
fn table_name() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_.-]{3,255}"
}

fn timestamp() -> impl Strategy<Value = chrono::DateTime<Utc>> {
    (0i64..4_102_444_800).prop_map(|secs| Utc.timestamp_opt(secs, 0).unwrap())
}

// =============================================================================
// Naming
// =============================================================================

proptest! {
    /// Every synthetic name is itself a valid, recognizable table name
    #[test]
    fn synthetic_names_are_valid(table in table_name(), at in timestamp()) {
        for name in [
            naming::duplicate_name(&table, at),
            naming::original_backup_name(&table, at),
            naming::manual_backup_name(&table, at),
        ] {
            prop_assert!(validate_name(&name).is_ok(), "{}", name);
            prop_assert!(name.len() <= MAX_NAME_LEN);
            prop_assert!(is_synthetic(&name));
        }
    }

    /// Short names are kept whole in front of the suffix
    #[test]
    fn synthetic_names_keep_short_tables(table in "[a-z]{3,40}", at in timestamp()) {
        let stamp = at.format("%Y%m%d%H%M%S").to_string();
        prop_assert_eq!(
            naming::duplicate_name(&table, at),
            format!("{}{}{}", table, DUPE_SUFFIX, stamp)
        );
        prop_assert_eq!(
            naming::original_backup_name(&table, at),
            format!("{}{}{}", table, ORIG_SUFFIX, stamp)
        );
        prop_assert_eq!(
            naming::manual_backup_name(&table, at),
            format!("{}{}{}", table, MANUAL_SUFFIX, stamp)
        );
    }

    /// Any character outside the allowed set is rejected
    #[test]
    fn names_with_foreign_chars_rejected(
        head in "[a-z]{2,10}",
        bad in "[ /:@#$%*?\"']",
        tail in "[a-z]{0,10}",
    ) {
        let name = format!("{}{}{}", head, bad, tail);
        prop_assert!(validate_name(&name).is_err());
    }

    #[test]
    fn names_outside_length_bounds_rejected(short in "[a-z]{0,2}", long in "[a-z]{256,300}") {
        prop_assert!(validate_name(&short).is_err());
        prop_assert!(validate_name(&long).is_err());
    }
}

// =============================================================================
// Timeouts
// =============================================================================

proptest! {
    /// Anything below -1 is never accepted
    #[test]
    fn timeout_rejects_below_minus_one(seconds in i64::MIN..-1) {
        prop_assert!(Timeout::from_seconds(seconds).is_err());
    }

    /// Config value, display form and CLI parsing agree
    #[test]
    fn timeout_seconds_and_text_agree(seconds in -1i64..1_000_000) {
        let timeout = Timeout::from_seconds(seconds).unwrap();
        prop_assert_eq!(timeout.as_seconds(), seconds);
        prop_assert_eq!(timeout.to_string().parse::<Timeout>(), Ok(timeout));
        prop_assert_eq!(seconds.to_string().parse::<Timeout>(), Ok(timeout));
    }
}

// =============================================================================
// Prompt input
// =============================================================================

proptest! {
    /// Both accepted layouts, with or without a trailing Z, mean the same instant
    #[test]
    fn date_time_layouts_agree(at in timestamp()) {
        let iso = at.format("%Y-%m-%dT%H:%M:%S").to_string();
        let spaced = at.format("%Y-%m-%d %H:%M:%S").to_string();
        prop_assert_eq!(parse_date_time(&iso), Some(at));
        prop_assert_eq!(parse_date_time(&spaced), Some(at));
        prop_assert_eq!(parse_date_time(&format!("{}Z", iso)), Some(at));
    }

    /// A point is cold exactly when its cold transition is not in the future
    #[test]
    fn storage_tier_follows_transition(now in timestamp(), offset in -100_000i64..100_000) {
        let transition = now + chrono::Duration::seconds(offset);
        let expected = if offset <= 0 { StorageTier::Cold } else { StorageTier::Warm };
        prop_assert_eq!(StorageTier::at(Some(transition), now), expected);
    }
}
