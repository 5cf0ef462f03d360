//! Token secrets, the credential triple, and header formatting.

pub mod credential;
pub mod format;
pub mod secret;
