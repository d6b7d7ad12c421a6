//! Bounded status polling
//!
//! Long-running server-side operations are observed by re-fetching the
//! owning object's `status` field at a fixed short interval until it
//! reaches a terminal value or the deadline passes. A timeout fails the
//! wait only; it says nothing about the remote operation, and no
//! in-flight request is cancelled. Transport errors during polling
//! propagate immediately; the loop never retries on error.

use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::error::{Error, Result};
use crate::resource::object::{HasStatus, Obj};

/// Delay between status re-fetches.
pub(crate) const WAIT_INTERVAL: Duration = Duration::from_millis(200);

impl<E: HasStatus> Obj<E> {
    /// Re-fetch until `status` is one of `terminal`, returning that
    /// status. `None` waits without bound; otherwise the wait fails
    /// with [`Error::WaitTimeout`] once `timeout` has elapsed.
    pub async fn wait_for_status(
        &mut self,
        terminal: &[&str],
        timeout: Option<Duration>,
    ) -> Result<String> {
        let started = Instant::now();
        loop {
            let record = self.reread().await?;
            if let Some(status) = record.status() {
                if terminal.contains(&status) {
                    return Ok(status.to_string());
                }
            }
            if let Some(limit) = timeout {
                if started.elapsed() >= limit {
                    return Err(Error::WaitTimeout {
                        entity: E::KIND,
                        timeout: limit,
                    });
                }
            }
            sleep(WAIT_INTERVAL).await;
        }
    }
}
