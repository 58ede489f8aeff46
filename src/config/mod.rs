use crate::domain::model::{MissingMajorPolicy, RosterLayout};
use crate::utils::error::{Result, VoteCheckError};
use crate::utils::pacing::Pacer;
use crate::utils::validation::Validate;
use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_DIRECTORY_BASE_URL: &str = "https://directory.uci.edu/people";
pub const DEFAULT_SHEETS_API_BASE_URL: &str = "https://sheets.googleapis.com/v4";
pub const DEFAULT_DRIVE_API_BASE_URL: &str = "https://www.googleapis.com/drive/v3";
pub const DEFAULT_DELAY_MS: u64 = 1000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Run configuration, built once at startup and passed down explicitly.
#[derive(Debug, Clone)]
pub struct VoteCheckConfig {
    pub election_form: String,
    pub election_sheet: String,
    pub service_account_file: String,
    pub directory_base_url: String,
    pub sheets_api_base_url: String,
    pub drive_api_base_url: String,
    pub delay_ms: u64,
    /// Per-request timeout for the directory and Google clients.
    pub timeout_secs: u64,
    pub missing_major: MissingMajorPolicy,
    pub layout: RosterLayout,
    pub verbose: bool,
}

impl VoteCheckConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars().collect())
    }

    /// 從變數表建立配置（方便測試，不碰真正的環境變數）
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        let required = |name: &str| {
            vars.get(name)
                .filter(|v| !v.trim().is_empty())
                .cloned()
                .ok_or_else(|| VoteCheckError::MissingConfigError {
                    field: name.to_string(),
                })
        };
        let optional = |name: &str, default: &str| {
            vars.get(name)
                .filter(|v| !v.trim().is_empty())
                .cloned()
                .unwrap_or_else(|| default.to_string())
        };

        let delay_raw = optional("VOTE_CHECK_DELAY_MS", &DEFAULT_DELAY_MS.to_string());
        let delay_ms: u64 = delay_raw
            .trim()
            .parse()
            .map_err(|_| VoteCheckError::InvalidConfigValueError {
                field: "VOTE_CHECK_DELAY_MS".to_string(),
                value: delay_raw.clone(),
                reason: "Expected a whole number of milliseconds".to_string(),
            })?;

        let timeout_raw = optional("VOTE_CHECK_TIMEOUT_SECS", &DEFAULT_TIMEOUT_SECS.to_string());
        let timeout_secs: u64 = timeout_raw
            .trim()
            .parse()
            .map_err(|_| VoteCheckError::InvalidConfigValueError {
                field: "VOTE_CHECK_TIMEOUT_SECS".to_string(),
                value: timeout_raw.clone(),
                reason: "Expected a whole number of seconds".to_string(),
            })?;

        let missing_major: MissingMajorPolicy =
            optional("VOTE_CHECK_MISSING_MAJOR", "fatal").parse()?;

        let verbose = matches!(
            optional("VOTE_CHECK_VERBOSE", "false").trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes"
        );

        Ok(Self {
            election_form: required("ELECTION_FORM")?,
            election_sheet: required("ELECTION_SHEET")?,
            service_account_file: required("SERVICE_ACCOUNT_FILE")?,
            directory_base_url: optional("DIRECTORY_BASE_URL", DEFAULT_DIRECTORY_BASE_URL),
            sheets_api_base_url: optional("SHEETS_API_BASE_URL", DEFAULT_SHEETS_API_BASE_URL),
            drive_api_base_url: optional("DRIVE_API_BASE_URL", DEFAULT_DRIVE_API_BASE_URL),
            delay_ms,
            timeout_secs,
            missing_major,
            layout: RosterLayout::default(),
            verbose,
        })
    }

    pub fn pacer(&self) -> Pacer {
        Pacer::new(Duration::from_millis(self.delay_ms))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Validate for VoteCheckConfig {
    fn validate(&self) -> Result<()> {
        use crate::utils::validation::*;

        validate_non_empty_string("ELECTION_FORM", &self.election_form)?;
        validate_non_empty_string("ELECTION_SHEET", &self.election_sheet)?;
        validate_existing_file("SERVICE_ACCOUNT_FILE", &self.service_account_file)?;

        validate_url("DIRECTORY_BASE_URL", &self.directory_base_url)?;
        validate_url("SHEETS_API_BASE_URL", &self.sheets_api_base_url)?;
        validate_url("DRIVE_API_BASE_URL", &self.drive_api_base_url)?;

        // Google 的配額以分鐘計，超過一分鐘的間隔沒有意義
        validate_range("VOTE_CHECK_DELAY_MS", self.delay_ms, 0, 60_000)?;
        validate_range("VOTE_CHECK_TIMEOUT_SECS", self.timeout_secs, 1, 300)?;

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }
}
