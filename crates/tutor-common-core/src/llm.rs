// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! LLM abstraction types for request/response handling and streaming.

use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::Stream;
use pin_project_lite::pin_project;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::LlmError;
use crate::message::Message;

/// Request to send to an LLM for completion.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LlmRequest {
	pub model: String,
	pub messages: Vec<Message>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub max_tokens: Option<u32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub temperature: Option<f32>,
}

impl LlmRequest {
	pub fn new(model: impl Into<String>) -> Self {
		Self {
			model: model.into(),
			messages: Vec::new(),
			max_tokens: None,
			temperature: None,
		}
	}

	pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
		self.messages = messages;
		self
	}

	pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
		self.max_tokens = Some(max_tokens);
		self
	}

	pub fn with_temperature(mut self, temperature: f32) -> Self {
		self.temperature = Some(temperature);
		self
	}
}

/// Streaming events emitted by an LLM during completion.
#[derive(Clone, Debug)]
pub enum LlmEvent {
	/// Incremental text content from the assistant.
	TextDelta { content: String },
	/// The completion has finished successfully.
	Completed(LlmResponse),
	/// An error occurred during streaming.
	Error(LlmError),
}

/// Response from an LLM completion request.
#[derive(Clone, Debug)]
pub struct LlmResponse {
	pub message: Message,
	pub usage: Option<Usage>,
	pub finish_reason: Option<String>,
}

/// Token usage statistics from an LLM request.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Usage {
	pub input_tokens: u32,
	pub output_tokens: u32,
}

pin_project! {
		/// A stream of LLM events during completion.
		///
		/// Wraps an async stream of [`LlmEvent`] items, providing both
		/// direct async iteration via [`next`] and [`Stream`] trait implementation.
		pub struct LlmStream {
				#[pin]
				inner: Pin<Box<dyn Stream<Item = LlmEvent> + Send>>,
		}
}

impl LlmStream {
	/// Creates a new LLM stream from a boxed stream.
	pub fn new(inner: Pin<Box<dyn Stream<Item = LlmEvent> + Send>>) -> Self {
		Self { inner }
	}

	/// Returns the next event from the stream, or `None` if the stream is
	/// exhausted.
	#[instrument(skip(self), level = "trace")]
	pub async fn next(&mut self) -> Option<LlmEvent> {
		use futures::StreamExt;
		self.inner.next().await
	}
}

impl Stream for LlmStream {
	type Item = LlmEvent;

	fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
		self.project().inner.poll_next(cx)
	}
}

/// Trait for LLM client implementations.
#[async_trait]
pub trait LlmClient: Send + Sync {
	/// Sends a completion request and returns a stream of events.
	async fn complete_streaming(&self, request: LlmRequest) -> Result<LlmStream, LlmError>;
}
