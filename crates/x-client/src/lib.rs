//! Authenticated access to the X (Twitter) v2 API
//!
//! Every social API call goes through `RequestExecutor::execute`, which binds
//! the call to the current credential pair and owns the one retry policy in
//! the system: on a 401, renew once, replace the pair, retry once.
//!
//! Request lifecycle:
//! 1. `CredentialStore::current()` → `ClientFactory::build()` → `ClientHandle`
//! 2. The operation runs against the handle
//! 3. 401 → `Renewer::renew()` → `CredentialStore::replace()` → rebuild → retry
//! 4. A second 401 is `PersistentAuthFailure`; a failed renewal is `AuthRenewal`
//! 5. Anything else propagates untouched

pub mod api;
pub mod client;
pub mod error;
pub mod executor;
pub mod model;
pub mod status;

pub use api::{DEFAULT_MAX_RESULTS, XApi};
pub use client::{ClientFactory, ClientHandle, DEFAULT_API_BASE_URL};
pub use error::{Error, Result};
pub use executor::RequestExecutor;
pub use model::{BookmarkRecord, PostAck, PublicMetrics, User};
pub use status::classify_status;
