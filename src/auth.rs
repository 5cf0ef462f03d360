//! Credential models and the bearer token formatter.

pub mod token;

pub use token::{credential::*, format::*, secret::*};
