pub mod engine;

pub use crate::domain::model::{MajorLookup, NetId, RunSummary};
pub use crate::domain::ports::{Directory, Worksheet};
pub use crate::utils::error::Result;
