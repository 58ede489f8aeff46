use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoteCheckError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Google API returned {status}: {message}")]
    SheetsApiError { status: u16, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Token signing failed: {0}")]
    TokenError(#[from] jsonwebtoken::errors::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Spreadsheet not found: {name}")]
    SpreadsheetNotFound { name: String },

    #[error("Worksheet not found: {title}")]
    WorksheetNotFound { title: String },

    #[error("Invalid A1 range: {range}")]
    InvalidRange { range: String },

    #[error("Directory profile for {net_id} has no Major field")]
    MissingMajorField { net_id: String },
}

impl VoteCheckError {
    /// 給操作人員的處理建議
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::ApiError(_) => "Check network connectivity and retry the run",
            Self::SheetsApiError { status: 401 | 403, .. } => {
                "Share the spreadsheet with the service account email and enable the Sheets and Drive APIs"
            }
            Self::SheetsApiError { status: 429, .. } => {
                "Raise VOTE_CHECK_DELAY_MS to slow down requests"
            }
            Self::SheetsApiError { .. } => "Retry the run; earlier highlights are kept",
            Self::IoError(_) => "Check that SERVICE_ACCOUNT_FILE points to a readable file",
            Self::SerializationError(_) => "Check that the service account file is valid JSON",
            Self::TokenError(_) => "Regenerate the service account key; the private key could not be used",
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => {
                "Set ELECTION_FORM, ELECTION_SHEET and SERVICE_ACCOUNT_FILE in the environment or .env"
            }
            Self::SpreadsheetNotFound { .. } => {
                "Check ELECTION_FORM and that the spreadsheet is shared with the service account"
            }
            Self::WorksheetNotFound { .. } => "Check ELECTION_SHEET against the worksheet tab names",
            Self::InvalidRange { .. } => "Check the roster column layout",
            Self::MissingMajorField { .. } => {
                "Set VOTE_CHECK_MISSING_MAJOR=ineligible to flag such rows instead of aborting"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, VoteCheckError>;
