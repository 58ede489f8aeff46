pub mod a1;
pub mod error;
pub mod logger;
pub mod pacing;
pub mod validation;
