// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Ctrl-C handling for in-flight requests.

use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Drives `fut` to completion, cancelling `cancel` on the first Ctrl-C.
///
/// The future is expected to observe the token and wind down on its own, so
/// partial results survive an interrupt.
pub async fn run_interruptible<F: Future>(fut: F, cancel: &CancellationToken) -> F::Output {
	tokio::pin!(fut);
	let mut listening = true;
	loop {
		tokio::select! {
			biased;
			output = &mut fut => return output,
			signal = tokio::signal::ctrl_c(), if listening => {
				listening = false;
				match signal {
					Ok(()) => {
						debug!("interrupt received, cancelling request");
						cancel.cancel();
					}
					Err(e) => warn!(error = %e, "unable to listen for Ctrl-C"),
				}
			}
		}
	}
}
