//! Error types, gathered in one place.
//!
//! Failures stay module-local - the stores return their own typed errors so
//! UI surfaces can render inline feedback - but everything is re-exported
//! here for callers that want a single import path.

pub use crate::api::ApiError;
pub use crate::config::ConfigError;
pub use crate::session::SessionError;
pub use crate::storage::StorageError;
