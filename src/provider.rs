//! Provider-facing configuration (data) and credential strategies (behavior).
//!
//! `config` exposes [`ProviderConfig`], the static per-provider settings (token endpoint, grant
//! strategy, credential fields, TTL defaults, refresh timing) together with its builder and the
//! environment loader. `markers` and `quirks` hold the per-provider wire-format differences as
//! data. `strategy` defines [`CredentialStrategy`], the pure request-building and
//! response-parsing hook behind each grant variant.

pub mod config;
pub mod env;
pub mod markers;
pub mod quirks;
pub mod strategy;

pub use config::*;
pub use markers::*;
pub use quirks::*;
pub use strategy::*;
