//! Process environment isolation around script execution.
//!
//! Entering an [`EnvScope`] snapshots every environment variable of the host
//! process and clears them. Dropping the scope restores the snapshot exactly,
//! whether execution succeeded, failed, timed out or unwound from a panic.
//! Only one scope can be alive at a time.
//!
//! `std::env::set_var` and `remove_var` race with any other thread reading
//! the environment (they become `unsafe` in edition 2024). The scope only
//! serializes against other scopes, so hosts should drive it from a
//! `current_thread` runtime and avoid reading the environment from other
//! threads while a snippet runs. The `jsguard` binary does both.

use std::ffi::OsString;

use tokio::sync::{Mutex, MutexGuard};

static ENV_LOCK: Mutex<()> = Mutex::const_new(());

/// RAII guard holding the host environment aside.
#[must_use = "the environment is restored as soon as the scope is dropped"]
pub struct EnvScope {
    saved: Vec<(OsString, OsString)>,
    // Released after `Drop::drop` has restored the environment.
    _lock: MutexGuard<'static, ()>,
}

impl EnvScope {
    /// Wait for any other scope to end, then clear the environment.
    pub async fn enter() -> Self {
        let lock = ENV_LOCK.lock().await;
        let saved: Vec<(OsString, OsString)> = std::env::vars_os().collect();
        for (key, _) in &saved {
            std::env::remove_var(key);
        }
        tracing::debug!(cleared = saved.len(), "environment cleared");
        Self { saved, _lock: lock }
    }

    /// Number of variables held aside.
    pub fn saved_len(&self) -> usize {
        self.saved.len()
    }
}

impl Drop for EnvScope {
    fn drop(&mut self) {
        // Anything set while the scope was active goes away.
        let leaked: Vec<OsString> = std::env::vars_os().map(|(key, _)| key).collect();
        for key in leaked {
            std::env::remove_var(key);
        }
        for (key, value) in self.saved.drain(..) {
            std::env::set_var(key, value);
        }
        tracing::debug!("environment restored");
    }
}
