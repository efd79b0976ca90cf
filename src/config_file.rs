//! Configuration file handling for tablerescue.
//!
//! One JSON file describes where the backups live and how long polls may run
//! before the operator is asked whether to keep waiting. Command-line flags
//! override individual values after loading.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::executor::RecoverySettings;
use crate::naming;
use crate::poller::Timeout;

/// Recovery configuration that can be saved/loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RescueConfig {
    /// Cloud region; falls back to the environment's default when absent
    #[serde(default)]
    pub region: Option<String>,

    /// Backup vault holding the recovery points
    pub vault_name: String,

    /// Role the vault assumes to run restore jobs
    pub restore_role_arn: String,

    /// Poll window in seconds, -1 for unbounded
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: i64,

    /// System table that is never offered as a target
    #[serde(default)]
    pub reserved_table: Option<String>,

    /// Where run journals are written; no journal when absent
    #[serde(default)]
    pub journal_dir: Option<PathBuf>,
}

fn default_timeout_seconds() -> i64 {
    -1
}

impl RescueConfig {
    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize configuration to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse configuration JSON")?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.vault_name.trim().is_empty() {
            anyhow::bail!("Vault name must be specified");
        }

        if self.restore_role_arn.trim().is_empty() {
            anyhow::bail!("Restore role ARN must be specified");
        }
        if !is_role_arn(&self.restore_role_arn) {
            anyhow::bail!(
                "Restore role ARN must look like arn:<partition>:iam::<account>:role/<name>, got '{}'",
                self.restore_role_arn
            );
        }

        Timeout::from_seconds(self.timeout_seconds).map_err(|e| anyhow::anyhow!(e))?;

        if let Some(reserved) = &self.reserved_table {
            naming::validate_name(reserved)
                .map_err(|e| anyhow::anyhow!("Reserved table '{}' is invalid: {}", reserved, e))?;
        }

        if let Some(region) = &self.region {
            if region.trim().is_empty() {
                anyhow::bail!("Region must not be empty when specified");
            }
        }

        Ok(())
    }

    pub fn timeout(&self) -> Result<Timeout> {
        Timeout::from_seconds(self.timeout_seconds).map_err(|e| anyhow::anyhow!(e))
    }

    pub fn recovery_settings(&self) -> RecoverySettings {
        RecoverySettings {
            vault_name: self.vault_name.clone(),
            restore_role_arn: self.restore_role_arn.clone(),
            reserved_table: self.reserved_table.clone(),
        }
    }
}

/// `arn:<partition>:iam::<account>:role/<name>`
fn is_role_arn(arn: &str) -> bool {
    let parts: Vec<&str> = arn.splitn(6, ':').collect();
    match parts.as_slice() {
        ["arn", partition, "iam", "", account, resource] => {
            !partition.is_empty()
                && !account.is_empty()
                && account.chars().all(|c| c.is_ascii_digit())
                && resource
                    .strip_prefix("role/")
                    .is_some_and(|name| !name.is_empty())
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_config() -> RescueConfig {
        RescueConfig {
            region: Some("us-west-2".to_string()),
            vault_name: "parks-vault".to_string(),
            restore_role_arn: "arn:aws:iam::123456789012:role/parks-restore".to_string(),
            timeout_seconds: 600,
            reserved_table: Some("sessions".to_string()),
            journal_dir: None,
        }
    }

    #[test]
    fn test_minimal_json_uses_defaults() {
        let json = r#"{
            "vault_name": "parks-vault",
            "restore_role_arn": "arn:aws:iam::123456789012:role/parks-restore"
        }"#;
        let config: RescueConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.timeout_seconds, -1);
        assert_eq!(config.timeout().unwrap(), Timeout::Unbounded);
        assert!(config.region.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_roundtrip_save_load() {
        let config = create_test_config();
        let temp_file = NamedTempFile::new().unwrap();

        config.save_to_file(temp_file.path()).unwrap();
        let loaded = RescueConfig::load_from_file(temp_file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = RescueConfig::load_from_file(Path::new("/nonexistent/path"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_json() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"{ invalid json }").unwrap();
        temp_file.flush().unwrap();

        let result = RescueConfig::load_from_file(temp_file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_valid_config() {
        assert!(create_test_config().validate().is_ok());
    }

    #[test]
    fn test_validation_empty_vault() {
        let mut config = create_test_config();
        config.vault_name = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_role_arn_shape() {
        let mut config = create_test_config();
        for bad in [
            "parks-restore",
            "arn:aws:iam::123456789012:user/someone",
            "arn:aws:iam::acct:role/x",
            "arn:aws:s3::123456789012:role/x",
            "arn:aws:iam::123456789012:role/",
        ] {
            config.restore_role_arn = bad.to_string();
            assert!(config.validate().is_err(), "{} should be rejected", bad);
        }
        config.restore_role_arn = "arn:aws-us-gov:iam::123456789012:role/ops/restore".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_timeout_floor() {
        let mut config = create_test_config();
        config.timeout_seconds = -2;
        assert!(config.validate().is_err());
        config.timeout_seconds = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_reserved_table_name() {
        let mut config = create_test_config();
        config.reserved_table = Some("no spaces allowed".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_recovery_settings() {
        let settings = create_test_config().recovery_settings();
        assert_eq!(settings.vault_name, "parks-vault");
        assert_eq!(settings.reserved_table.as_deref(), Some("sessions"));
    }
}
