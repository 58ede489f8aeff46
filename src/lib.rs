pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::directory::UciDirectory;
pub use adapters::sheets::{GoogleSheets, SheetsWorksheet, Spreadsheet};
pub use config::VoteCheckConfig;
pub use core::engine::VoteCheckEngine;
pub use utils::error::{Result, VoteCheckError};
