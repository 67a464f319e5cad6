//! Blocking bridge for the async sqlx drivers.
//!
//! Report execution is synchronous. Each sqlx-backed connection owns a
//! current-thread tokio runtime and blocks on every call.

use tokio::runtime::{Builder, Runtime};

use super::{DriverError, DriverResult};

pub(super) fn current_thread() -> DriverResult<Runtime> {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(DriverError::Runtime)
}
