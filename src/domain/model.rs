use crate::utils::error::{Result, VoteCheckError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// ICS majors allowed to vote.
///
/// "SW Engr" contains a space and can never equal a single extracted word.
/// It is kept so the list matches the election rules as written.
pub const VALID_MAJORS: [&str; 9] = [
    "CmptSci", "CSGames", "SW Engr", "IN4MATX", "DataSci", "CSE", "BIM", "SW", "GameDes",
];

/// UCI net ID, the part of a UCI email before the `@`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NetId(String);

impl NetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// `"alice@uci.edu\n"` -> `alice`
    pub fn from_email(cell: &str) -> Self {
        let trimmed = cell.trim_end_matches(['\n', '\r']);
        let local = trimmed.split('@').next().unwrap_or(trimmed);
        Self(local.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MajorCode(String);

impl MajorCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 大小寫敏感，完全比對
    pub fn is_eligible(&self) -> bool {
        VALID_MAJORS.contains(&self.0.as_str())
    }
}

impl fmt::Display for MajorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MajorLookup {
    /// Directory answered with something other than 200.
    NotListed,
    Found(MajorCode),
    /// Profile text had no usable "Major" line.
    MissingMajorField,
}

/// What to do when a listed student's profile has no major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingMajorPolicy {
    /// Abort the run.
    #[default]
    Fatal,
    /// Count the student as not eligible and keep going.
    Ineligible,
}

impl FromStr for MissingMajorPolicy {
    type Err = VoteCheckError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fatal" => Ok(Self::Fatal),
            "ineligible" => Ok(Self::Ineligible),
            other => Err(VoteCheckError::InvalidConfigValueError {
                field: "VOTE_CHECK_MISSING_MAJOR".to_string(),
                value: other.to_string(),
                reason: "Expected 'fatal' or 'ineligible'".to_string(),
            }),
        }
    }
}

impl MajorLookup {
    pub fn eligibility(&self, net_id: &NetId, policy: MissingMajorPolicy) -> Result<bool> {
        match self {
            Self::NotListed => Ok(false),
            Self::Found(major) => Ok(major.is_eligible()),
            Self::MissingMajorField => match policy {
                MissingMajorPolicy::Ineligible => Ok(false),
                MissingMajorPolicy::Fatal => Err(VoteCheckError::MissingMajorField {
                    net_id: net_id.to_string(),
                }),
            },
        }
    }
}

/// Channel intensities in `[0.0, 1.0]`, as the Sheets API expects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RgbColor {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

impl RgbColor {
    /// Light red used to flag ineligible voters.
    pub const INVALID: RgbColor = RgbColor {
        red: 1.0,
        green: 0.5,
        blue: 0.5,
    };
}

/// Where the roster lives in the response sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterLayout {
    /// First data row; row 1 holds the form headers.
    pub start_row: u32,
    pub email_col: u32,
    pub first_col: String,
    pub last_col: String,
}

impl RosterLayout {
    /// Sheet row of the roster entry at `position`; `None` past `u32::MAX`.
    pub fn row_for(&self, position: usize) -> Option<u32> {
        u32::try_from(position)
            .ok()
            .and_then(|offset| self.start_row.checked_add(offset))
    }
}

impl Default for RosterLayout {
    fn default() -> Self {
        Self {
            start_row: 2,
            email_col: 2,
            first_col: "A".to_string(),
            last_col: "K".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub collected: usize,
    pub eligible: usize,
    pub flagged: usize,
}
