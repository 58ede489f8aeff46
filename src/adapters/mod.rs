// Adapters layer: concrete implementations for the external services (Google, UCI directory).

pub mod auth;
pub mod directory;
pub mod sheets;
