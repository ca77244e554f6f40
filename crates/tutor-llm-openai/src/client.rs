// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP client for OpenAI-compatible chat completion endpoints.

use crate::stream::OpenAIStream;
use crate::types::{OpenAIConfig, OpenAIError, OpenAIRequest};
use async_trait::async_trait;
use futures::Stream;
use reqwest::Client;
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, error, info, instrument, trace};
use tutor_common_core::{LlmClient, LlmError, LlmEvent, LlmRequest, LlmStream};
use tutor_common_http::{retry, RetryConfig, RetryableError};

#[derive(Debug)]
struct RequestError(LlmError);

impl RetryableError for RequestError {
	fn is_retryable(&self) -> bool {
		matches!(
			&self.0,
			LlmError::Http(_) | LlmError::Timeout | LlmError::RateLimited { .. }
		)
	}

	fn retry_after(&self) -> Option<Duration> {
		match &self.0 {
			LlmError::RateLimited {
				retry_after_secs: Some(secs),
			} => Some(Duration::from_secs(*secs)),
			_ => None,
		}
	}
}

impl From<reqwest::Error> for RequestError {
	fn from(e: reqwest::Error) -> Self {
		if e.is_timeout() {
			RequestError(LlmError::Timeout)
		} else {
			RequestError(LlmError::Http(e.to_string()))
		}
	}
}

pub struct OpenAIClient {
	config: OpenAIConfig,
	http_client: Client,
	retry_config: RetryConfig,
}

impl OpenAIClient {
	pub fn new(config: OpenAIConfig) -> Result<Self, LlmError> {
		let http_client = tutor_common_http::builder()
			.connect_timeout(Duration::from_secs(30))
			.timeout(Duration::from_secs(300))
			.build()
			.map_err(|e| LlmError::Http(e.to_string()))?;

		info!(
				model = %config.model,
				base_url = %config.base_url,
				"initialized OpenAI client"
		);

		Ok(Self {
			config,
			http_client,
			retry_config: RetryConfig::default(),
		})
	}

	pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
		self.retry_config = retry_config;
		self
	}

	pub fn config(&self) -> &OpenAIConfig {
		&self.config
	}

	fn build_request(&self, request: &LlmRequest) -> reqwest::RequestBuilder {
		let body = OpenAIRequest::from_llm_request(request);
		let url = self.config.completions_url();

		let mut builder = self
			.http_client
			.post(&url)
			.header("Content-Type", "application/json")
			.bearer_auth(&self.config.api_key);

		if let Some(org) = &self.config.organization {
			builder = builder.header("OpenAI-Organization", org);
		}

		trace!(
				url = %url,
				model = %request.model,
				message_count = request.messages.len(),
				"building request"
		);

		builder.json(&body)
	}

	/// Sends the request, retrying transient failures, and returns the
	/// successful response.
	async fn send(&self, request: &LlmRequest) -> Result<reqwest::Response, LlmError> {
		retry(&self.retry_config, || async {
			let response = self.build_request(request).send().await?;
			if !response.status().is_success() {
				return Err(RequestError(handle_error_response(response).await));
			}
			Ok(response)
		})
		.await
		.map_err(|e| e.0)
	}
}

async fn handle_error_response(response: reqwest::Response) -> LlmError {
	let status = response.status();
	debug!(status = %status, "received error response");

	match status.as_u16() {
		401 | 403 => return LlmError::Api("authentication failed".to_string()),
		429 => {
			let retry_after = response
				.headers()
				.get("retry-after")
				.and_then(|v| v.to_str().ok())
				.and_then(|v| v.parse().ok());
			return LlmError::RateLimited {
				retry_after_secs: retry_after,
			};
		}
		_ => {}
	}

	let server_error = status.is_server_error();
	match response.json::<OpenAIError>().await {
		Ok(body) => {
			error!(
					error_type = ?body.error.error_type,
					code = ?body.error.code,
					message = %body.error.message,
					"API error"
			);
			if server_error {
				LlmError::Http(body.error.message)
			} else {
				LlmError::Api(body.error.message)
			}
		}
		Err(e) => {
			error!(status = %status, parse_error = %e, "failed to parse error response");
			if server_error {
				LlmError::Http(format!("HTTP {status}"))
			} else {
				LlmError::Api(format!("HTTP {status}"))
			}
		}
	}
}

#[async_trait]
impl LlmClient for OpenAIClient {
	#[instrument(skip(self, request), fields(model = %request.model))]
	async fn complete_streaming(&self, request: LlmRequest) -> Result<LlmStream, LlmError> {
		debug!(message_count = request.messages.len(), "starting streaming request");

		let response = self.send(&request).await?;
		info!("streaming response initiated");

		let events = OpenAIStream::new(response.bytes_stream());
		let boxed: Pin<Box<dyn Stream<Item = LlmEvent> + Send>> = Box::pin(events);
		Ok(LlmStream::new(boxed))
	}
}
