//! Provider identifiers, redacted secrets, and cached token records.

pub mod id;
pub mod secret;
pub mod token;

pub use id::*;
pub use secret::*;
pub use token::*;
