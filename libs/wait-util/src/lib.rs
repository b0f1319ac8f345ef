// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Poll an async predicate until it yields a value or a deadline passes.
//!
//! Infrastructure state converges eventually: an instance goes from
//! `MIGRATING` to `ACTIVE`, a guest network comes back after a move. The
//! [`wait_for`] helper re-evaluates a predicate on a fixed interval and
//! reports either the value it produced, a hard error the predicate raised,
//! or a timeout naming what was being waited for.
//!
//! ```ignore
//! let server = wait_for(
//!     WaitConfig::new(Duration::from_secs(120)),
//!     "instance to become ACTIVE",
//!     || async {
//!         let server = client.get_server(&id).await?;
//!         Ok::<_, NovaError>(server.is_active().then_some(server))
//!     },
//! )
//! .await?;
//! ```

use std::fmt;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{Instant, sleep};

/// Default delay between predicate evaluations.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Bounds for a [`wait_for`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    /// Give up once this much time has passed since the first evaluation
    pub timeout: Duration,
    /// Delay between evaluations
    pub interval: Duration,
}

impl WaitConfig {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            interval: DEFAULT_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Why a wait did not produce a value
#[derive(Debug, Error)]
pub enum WaitError<E> {
    #[error("timed out after {elapsed:?} (limit {timeout:?}) waiting for {waiting_for}")]
    Timeout {
        waiting_for: String,
        elapsed: Duration,
        timeout: Duration,
    },

    /// The predicate failed hard; waiting longer would not help.
    #[error("{0}")]
    Aborted(E),
}

impl<E> WaitError<E> {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Evaluate `predicate` until it returns `Ok(Some(_))`.
///
/// `Ok(None)` means "not yet" and schedules another attempt after
/// `config.interval`. `Err(_)` stops immediately with
/// [`WaitError::Aborted`]. The predicate always runs at least once, and the
/// final sleep is clamped so the call never overshoots the deadline by more
/// than one evaluation.
pub async fn wait_for<T, E, F, Fut>(
    config: WaitConfig,
    waiting_for: impl fmt::Display,
    mut predicate: F,
) -> Result<T, WaitError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let start = Instant::now();
    let deadline = start + config.timeout;
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        match predicate().await {
            Ok(Some(value)) => {
                tracing::debug!(
                    %waiting_for,
                    attempt,
                    elapsed = ?start.elapsed(),
                    "wait condition met"
                );
                return Ok(value);
            }
            Ok(None) => {}
            Err(e) => return Err(WaitError::Aborted(e)),
        }

        let now = Instant::now();
        if now >= deadline {
            let elapsed = now - start;
            tracing::warn!(%waiting_for, attempt, ?elapsed, "wait timed out");
            return Err(WaitError::Timeout {
                waiting_for: waiting_for.to_string(),
                elapsed,
                timeout: config.timeout,
            });
        }

        tracing::debug!(%waiting_for, attempt, "condition not met yet");
        sleep(config.interval.min(deadline - now)).await;
    }
}
