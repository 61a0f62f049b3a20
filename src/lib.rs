//! Token lifecycle broker for partner APIs: cache bearer tokens per provider, refresh them before
//! they go stale, and retry an upstream call exactly once when its response says the token was
//! rejected.
//!
//! Each upstream provider gets a [`flows::Broker`] that owns its [`cache::TokenCache`], its
//! [`provider::CredentialStrategy`], and its [`classify::InvalidityClassifier`]. The
//! [`registry::ProviderRegistry`] keys brokers by provider name and arms one
//! [`schedule::RefreshScheduler`] task per provider that declares a proactive refresh interval.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod cache;
pub mod classify;
pub mod clock;
pub mod error;
pub mod flows;
pub mod http;
pub mod obs;
pub mod provider;
pub mod registry;
pub mod schedule;

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use oauth2::{self, HttpRequest, HttpResponse};
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
