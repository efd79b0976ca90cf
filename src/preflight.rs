//! Pre-flight checks against the live services
//!
//! Before the menu is shown this module verifies:
//! - The table store answers (tables can be listed)
//! - The backup vault answers and the configured vault exists
//! - The reserved system table exists, if one is configured (warning only)
//!
//! If a required check fails, the program prints a report and exits before
//! any workflow can start.

use tracing::{debug, info, warn};

use crate::services::{BackupVault, TableStore};

/// Result of service verification
#[derive(Debug, Default)]
pub struct PreflightResult {
    /// Table store error, if listing tables failed
    pub table_store_error: Option<String>,
    /// Backup vault error, if listing recovery points failed
    pub vault_error: Option<String>,
    pub table_count: usize,
    pub recovery_point_count: usize,
    /// Non-fatal findings
    pub warnings: Vec<String>,
}

impl PreflightResult {
    /// Returns true if all required checks passed
    pub fn is_ok(&self) -> bool {
        self.table_store_error.is_none() && self.vault_error.is_none()
    }
}

/// Perform all checks and return the result
pub fn verify_services(
    store: &dyn TableStore,
    vault: &dyn BackupVault,
    vault_name: &str,
    reserved_table: Option<&str>,
) -> PreflightResult {
    let mut result = PreflightResult::default();

    match store.list_tables() {
        Ok(tables) => {
            result.table_count = tables.len();
            if let Some(reserved) = reserved_table {
                if !tables.iter().any(|t| t == reserved) {
                    result
                        .warnings
                        .push(format!("reserved table {} was not found", reserved));
                }
            }
        }
        Err(err) => result.table_store_error = Some(err.to_string()),
    }

    match vault.list_recovery_points(vault_name, None) {
        Ok(points) => result.recovery_point_count = points.len(),
        Err(err) => result.vault_error = Some(err.to_string()),
    }

    result
}

/// Print the failure report to stderr and exit with code 1
pub fn print_error_and_exit(result: &PreflightResult) -> ! {
    eprintln!();
    eprintln!("╔══════════════════════════════════════════════════════════════════╗");
    eprintln!("║              tablerescue - Pre-flight Check Failed              ║");
    eprintln!("╚══════════════════════════════════════════════════════════════════╝");
    eprintln!();

    if let Some(err) = &result.table_store_error {
        eprintln!("❌ ERROR: Table store is not reachable");
        eprintln!("   {}", err);
        eprintln!();
        eprintln!("   Solution: check the region and the credentials in your environment.");
        eprintln!();
    }

    if let Some(err) = &result.vault_error {
        eprintln!("❌ ERROR: Backup vault is not reachable");
        eprintln!("   {}", err);
        eprintln!();
        eprintln!("   Solution: check `vault_name` in the config file and the vault permissions.");
        eprintln!();
    }

    eprintln!("╔══════════════════════════════════════════════════════════════════╗");
    eprintln!("║  Fix the above issues and try again.                             ║");
    eprintln!("╚══════════════════════════════════════════════════════════════════╝");
    eprintln!();

    std::process::exit(1);
}

/// Verify the services and exit if a required check fails
pub fn run_preflight_checks(
    store: &dyn TableStore,
    vault: &dyn BackupVault,
    vault_name: &str,
    reserved_table: Option<&str>,
) -> PreflightResult {
    debug!("Running pre-flight checks...");

    let result = verify_services(store, vault, vault_name, reserved_table);
    if !result.is_ok() {
        print_error_and_exit(&result);
    }
    for warning in &result.warnings {
        warn!("{}", warning);
    }

    info!(
        tables = result.table_count,
        recovery_points = result.recovery_point_count,
        "Pre-flight checks passed"
    );
    result
}
