#![allow(
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

use std::time::{SystemTime, UNIX_EPOCH};

// module reexports
pub use anyhow;
pub use base64;
pub use colored;
pub use parking_lot;
pub use reqwest;
pub use serde_json;
pub use time;
pub use uuid;
// our reexports
pub use logger::*;
pub mod logger;

pub type SyncMutex<T> = parking_lot::Mutex<T>;
pub type SyncRwLock<T> = parking_lot::RwLock<T>;

/// Builds the `User-Agent` header value used for outgoing web requests, e.g. `masquerade-server/1.0.0`.
pub fn user_agent(crate_name: &str, version: &str) -> String {
    format!("{crate_name}/{version}")
}

/// Seconds since the unix epoch, 0 if the clock is set before 1970.
pub fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
}
