// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use thiserror::Error;

/// Result type alias for tutor operations.
pub type TutorResult<T> = Result<T, TutorError>;

/// Top-level error type for tutor requests.
#[derive(Error, Debug)]
pub enum TutorError {
	#[error("LLM error: {0}")]
	Llm(#[from] LlmError),

	#[error("No suitable model available (vendor '{vendor}', family '{family}')")]
	NoModelAvailable { vendor: String, family: String },
}

/// Errors that can occur during LLM interactions.
#[derive(Clone, Error, Debug)]
pub enum LlmError {
	#[error("HTTP error: {0}")]
	Http(String),

	#[error("API error: {0}")]
	Api(String),

	#[error("Request timed out")]
	Timeout,

	#[error("Invalid response: {0}")]
	InvalidResponse(String),

	#[error("Rate limited: retry after {retry_after_secs:?} seconds")]
	RateLimited { retry_after_secs: Option<u64> },
}
