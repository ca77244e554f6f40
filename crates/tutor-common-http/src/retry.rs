// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Retry with exponential backoff for request setup.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
	pub max_attempts: u32,
	pub base_delay: Duration,
	pub max_delay: Duration,
	pub backoff_factor: f64,
	pub jitter: bool,
}

impl Default for RetryConfig {
	fn default() -> Self {
		Self {
			max_attempts: 3,
			base_delay: Duration::from_millis(500),
			max_delay: Duration::from_secs(30),
			backoff_factor: 2.0,
			jitter: true,
		}
	}
}

impl RetryConfig {
	/// A single attempt, no retries.
	pub fn none() -> Self {
		Self {
			max_attempts: 1,
			..Self::default()
		}
	}

	fn delay_for(&self, retry: u32) -> Duration {
		let exponential = self.base_delay.as_secs_f64() * self.backoff_factor.powi(retry as i32);
		let max = self.max_delay.as_secs_f64();
		let capped = exponential.min(max);
		let delay = if self.jitter {
			(capped * (0.5 + fastrand::f64())).min(max)
		} else {
			capped
		};
		Duration::from_secs_f64(delay)
	}

	/// Delay before retry number `retry`, preferring the server's hint.
	fn next_delay<E: RetryableError>(&self, err: &E, retry: u32) -> Duration {
		match err.retry_after() {
			Some(hint) => hint.min(self.max_delay),
			None => self.delay_for(retry),
		}
	}
}

pub trait RetryableError {
	fn is_retryable(&self) -> bool;

	/// How long the server asked the caller to wait, if it said.
	fn retry_after(&self) -> Option<Duration> {
		None
	}
}

/// Runs `f` until it succeeds, fails with a non-retryable error, or
/// `max_attempts` is exhausted.
pub async fn retry<F, Fut, T, E>(cfg: &RetryConfig, mut f: F) -> Result<T, E>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T, E>>,
	E: RetryableError + std::fmt::Debug,
{
	let max_attempts = cfg.max_attempts.max(1);
	let mut attempt = 0;

	loop {
		attempt += 1;
		let err = match f().await {
			Ok(value) => return Ok(value),
			Err(err) => err,
		};

		if !err.is_retryable() || attempt >= max_attempts {
			warn!(
					error = ?err,
					attempt,
					max_attempts,
					retryable = err.is_retryable(),
					"giving up on request"
			);
			return Err(err);
		}

		let delay = cfg.next_delay(&err, attempt - 1);
		warn!(
				error = ?err,
				attempt,
				max_attempts,
				delay_ms = delay.as_millis(),
				"retrying after error"
		);
		tokio::time::sleep(delay).await;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicU32, Ordering};
	use std::sync::Arc;

	#[derive(Debug)]
	struct MockError {
		retryable: bool,
	}

	impl RetryableError for MockError {
		fn is_retryable(&self) -> bool {
			self.retryable
		}
	}

	#[derive(Debug)]
	struct Throttled(Option<Duration>);

	impl RetryableError for Throttled {
		fn is_retryable(&self) -> bool {
			true
		}

		fn retry_after(&self) -> Option<Duration> {
			self.0
		}
	}

	fn fast(max_attempts: u32) -> RetryConfig {
		RetryConfig {
			max_attempts,
			base_delay: Duration::from_millis(1),
			max_delay: Duration::from_millis(5),
			backoff_factor: 2.0,
			jitter: false,
		}
	}

	async fn run(cfg: &RetryConfig, fail_times: u32, retryable: bool) -> (Result<u32, MockError>, u32) {
		let attempts = Arc::new(AtomicU32::new(0));
		let counter = Arc::clone(&attempts);
		let result = retry(cfg, || {
			let counter = Arc::clone(&counter);
			async move {
				let n = counter.fetch_add(1, Ordering::SeqCst);
				if n < fail_times {
					Err(MockError { retryable })
				} else {
					Ok(n)
				}
			}
		})
		.await;
		(result, attempts.load(Ordering::SeqCst))
	}

	#[tokio::test]
	async fn non_retryable_error_fails_immediately() {
		let (result, attempts) = run(&fast(5), 10, false).await;
		assert!(result.is_err());
		assert_eq!(attempts, 1);
	}

	#[tokio::test]
	async fn retryable_error_stops_at_max_attempts() {
		let (result, attempts) = run(&fast(3), 10, true).await;
		assert!(result.is_err());
		assert_eq!(attempts, 3);
	}

	#[tokio::test]
	async fn succeeds_after_transient_failures() {
		let (result, attempts) = run(&fast(5), 2, true).await;
		assert_eq!(result.unwrap(), 2);
		assert_eq!(attempts, 3);
	}

	#[tokio::test]
	async fn zero_attempts_still_tries_once() {
		let (result, attempts) = run(&fast(0), 0, true).await;
		assert!(result.is_ok());
		assert_eq!(attempts, 1);
	}

	#[test]
	fn delay_grows_then_caps() {
		let cfg = RetryConfig {
			max_attempts: 10,
			base_delay: Duration::from_millis(100),
			max_delay: Duration::from_millis(400),
			backoff_factor: 2.0,
			jitter: false,
		};
		assert_eq!(cfg.delay_for(0), Duration::from_millis(100));
		assert_eq!(cfg.delay_for(1), Duration::from_millis(200));
		assert_eq!(cfg.delay_for(2), Duration::from_millis(400));
		assert_eq!(cfg.delay_for(5), Duration::from_millis(400));
	}

	#[test]
	fn jitter_stays_within_bounds() {
		let cfg = RetryConfig {
			jitter: true,
			..fast(3)
		};
		for _ in 0..50 {
			let delay = cfg.delay_for(10);
			assert!(delay <= cfg.max_delay);
			assert!(delay >= Duration::from_micros(2500));
		}
	}

	#[test]
	fn server_hint_overrides_backoff_up_to_max_delay() {
		let cfg = RetryConfig {
			max_attempts: 3,
			base_delay: Duration::from_millis(100),
			max_delay: Duration::from_secs(10),
			backoff_factor: 2.0,
			jitter: false,
		};
		assert_eq!(
			cfg.next_delay(&Throttled(Some(Duration::from_secs(3))), 0),
			Duration::from_secs(3)
		);
		assert_eq!(
			cfg.next_delay(&Throttled(Some(Duration::from_secs(60))), 0),
			Duration::from_secs(10)
		);
		assert_eq!(cfg.next_delay(&Throttled(None), 1), Duration::from_millis(200));
	}
}
