//! Stateful services built on the ports.

mod login_throttle;
mod post_cache;
mod second_factor;

use std::future::Future;
use std::time::Duration;

use crate::error::RepoError;

pub use login_throttle::{AdminCredentials, LoginThrottle};
pub use post_cache::PostCache;
pub use second_factor::SecondFactor;

/// Default bound on a single storage call.
pub const DEFAULT_STORAGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Run a storage call, giving up after `limit`.
async fn within<T, F>(limit: Duration, call: F) -> Result<T, RepoError>
where
    F: Future<Output = Result<T, RepoError>>,
{
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| RepoError::Timeout(limit))?
}
