// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Reconnect backoff policy.
//!
//! `delay(attempt) = min(base * 2^attempt, cap)`, where `attempt` is zero for
//! the first failure after a successful open.

use std::time::Duration;

use crate::error::{Error, Result};

/// Exponential backoff with an upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    base: Duration,
    cap: Duration,
}

impl BackoffPolicy {
    /// Delay before the first reconnect attempt.
    pub const DEFAULT_BASE: Duration = Duration::from_secs(1);
    /// Upper bound on any single delay.
    pub const DEFAULT_CAP: Duration = Duration::from_secs(30);

    /// Creates a policy, rejecting a zero base or a cap below the base.
    pub fn new(base: Duration, cap: Duration) -> Result<Self> {
        if base.is_zero() {
            return Err(Error::InvalidBackoff("base must be non-zero".to_string()));
        }
        if cap < base {
            return Err(Error::InvalidBackoff(format!(
                "cap ({}ms) is below base ({}ms)",
                cap.as_millis(),
                base.as_millis()
            )));
        }
        Ok(BackoffPolicy { base, cap })
    }

    pub fn base(&self) -> Duration {
        self.base
    }

    pub fn cap(&self) -> Duration {
        self.cap
    }

    /// Returns the wait before the retry that follows failure number `attempt`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let Some(factor) = 1u32.checked_shl(attempt) else {
            return self.cap;
        };
        self.base
            .checked_mul(factor)
            .map_or(self.cap, |delay| delay.min(self.cap))
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        BackoffPolicy {
            base: Self::DEFAULT_BASE,
            cap: Self::DEFAULT_CAP,
        }
    }
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
