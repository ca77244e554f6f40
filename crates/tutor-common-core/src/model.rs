// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Model selection and cancellable fragment streams.
//!
//! A [`ModelCatalog`] answers "which chat model serves this vendor/family
//! pair?" with zero or one [`ChatModel`]. Callers must branch on absence; the
//! request helpers turn it into [`TutorError::NoModelAvailable`].

use std::fmt;
use std::sync::Arc;

use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace};

use crate::error::{LlmError, TutorError};
use crate::llm::{LlmClient, LlmEvent, LlmRequest, LlmStream};
use crate::message::Message;

/// Vendor/family descriptor used to pick a chat model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSelector {
	pub vendor: String,
	pub family: String,
}

impl ModelSelector {
	pub fn new(vendor: impl Into<String>, family: impl Into<String>) -> Self {
		Self {
			vendor: vendor.into(),
			family: family.into(),
		}
	}

	/// Case-insensitive match on both vendor and family.
	pub fn matches(&self, vendor: &str, family: &str) -> bool {
		self.vendor.eq_ignore_ascii_case(vendor) && self.family.eq_ignore_ascii_case(family)
	}

	/// Error describing a failed selection with this selector.
	pub fn unavailable(&self) -> TutorError {
		TutorError::NoModelAvailable {
			vendor: self.vendor.clone(),
			family: self.family.clone(),
		}
	}
}

impl fmt::Display for ModelSelector {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}", self.vendor, self.family)
	}
}

/// Handle to a chat-capable model.
#[derive(Clone)]
pub struct ChatModel {
	vendor: String,
	family: String,
	name: String,
	client: Arc<dyn LlmClient>,
	max_tokens: Option<u32>,
	temperature: Option<f32>,
}

impl fmt::Debug for ChatModel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ChatModel")
			.field("vendor", &self.vendor)
			.field("family", &self.family)
			.field("name", &self.name)
			.field("max_tokens", &self.max_tokens)
			.field("temperature", &self.temperature)
			.finish_non_exhaustive()
	}
}

impl ChatModel {
	pub fn new(
		vendor: impl Into<String>,
		family: impl Into<String>,
		name: impl Into<String>,
		client: Arc<dyn LlmClient>,
	) -> Self {
		Self {
			vendor: vendor.into(),
			family: family.into(),
			name: name.into(),
			client,
			max_tokens: None,
			temperature: None,
		}
	}

	pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
		self.max_tokens = Some(max_tokens);
		self
	}

	pub fn with_temperature(mut self, temperature: f32) -> Self {
		self.temperature = Some(temperature);
		self
	}

	pub fn vendor(&self) -> &str {
		&self.vendor
	}

	pub fn family(&self) -> &str {
		&self.family
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Starts a streamed completion and returns its text fragments.
	///
	/// The returned stream ends early once `cancel` fires.
	#[instrument(skip(self, messages, cancel), fields(model = %self.name, message_count = messages.len()))]
	pub async fn send_request(
		&self,
		messages: Vec<Message>,
		cancel: CancellationToken,
	) -> Result<FragmentStream, LlmError> {
		let mut request = LlmRequest::new(self.name.clone()).with_messages(messages);
		if let Some(max_tokens) = self.max_tokens {
			request = request.with_max_tokens(max_tokens);
		}
		if let Some(temperature) = self.temperature {
			request = request.with_temperature(temperature);
		}

		let stream = self.client.complete_streaming(request).await?;
		debug!("streaming response started");
		Ok(FragmentStream::new(stream, cancel))
	}
}

/// Source of chat models keyed by vendor/family.
pub trait ModelCatalog: Send + Sync {
	/// Returns the first model matching `selector`, if any.
	fn select(&self, selector: &ModelSelector) -> Option<ChatModel>;

	/// Like [`ModelCatalog::select`] but reports absence as an error.
	fn require(&self, selector: &ModelSelector) -> Result<ChatModel, TutorError> {
		self.select(selector).ok_or_else(|| selector.unavailable())
	}
}

/// In-process catalog of registered models.
#[derive(Clone, Debug, Default)]
pub struct ModelRegistry {
	models: Vec<ChatModel>,
}

impl ModelRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&mut self, model: ChatModel) {
		debug!(
				vendor = %model.vendor,
				family = %model.family,
				model = %model.name,
				"registering chat model"
		);
		self.models.push(model);
	}

	pub fn len(&self) -> usize {
		self.models.len()
	}

	pub fn is_empty(&self) -> bool {
		self.models.is_empty()
	}
}

impl ModelCatalog for ModelRegistry {
	fn select(&self, selector: &ModelSelector) -> Option<ChatModel> {
		let found = self
			.models
			.iter()
			.find(|m| selector.matches(&m.vendor, &m.family))
			.cloned();
		trace!(selector = %selector, found = found.is_some(), "model selection");
		found
	}
}

/// Text fragments of one streamed response.
///
/// Yields only text deltas; completion ends the stream, a provider error is
/// yielded once and then ends it, and cancellation ends it silently.
pub struct FragmentStream {
	inner: LlmStream,
	cancel: CancellationToken,
	done: bool,
}

impl FragmentStream {
	pub fn new(inner: LlmStream, cancel: CancellationToken) -> Self {
		Self {
			inner,
			cancel,
			done: false,
		}
	}

	pub fn is_cancelled(&self) -> bool {
		self.cancel.is_cancelled()
	}

	/// Returns the next non-empty fragment, or `None` once the response is
	/// over.
	pub async fn next_fragment(&mut self) -> Option<Result<String, LlmError>> {
		while !self.done {
			let event = tokio::select! {
				biased;
				_ = self.cancel.cancelled() => {
					debug!("fragment stream cancelled");
					self.done = true;
					return None;
				}
				event = self.inner.next() => event,
			};

			match event {
				Some(LlmEvent::TextDelta { content }) => {
					if content.is_empty() {
						continue;
					}
					return Some(Ok(content));
				}
				Some(LlmEvent::Completed(response)) => {
					trace!(
							finish_reason = ?response.finish_reason,
							output_tokens = response.usage.as_ref().map(|u| u.output_tokens).unwrap_or(0),
							"response completed"
					);
					self.done = true;
				}
				Some(LlmEvent::Error(e)) => {
					self.done = true;
					return Some(Err(e));
				}
				None => self.done = true,
			}
		}
		None
	}

	/// Adapts this into a [`Stream`] of fragments.
	pub fn into_stream(self) -> impl Stream<Item = Result<String, LlmError>> + Send {
		futures::stream::unfold(self, |mut fragments| async move {
			fragments
				.next_fragment()
				.await
				.map(|item| (item, fragments))
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::ScriptedLlmClient;
	use futures::StreamExt;

	fn model(vendor: &str, family: &str, client: ScriptedLlmClient) -> ChatModel {
		ChatModel::new(vendor, family, format!("{family}-latest"), Arc::new(client))
	}

	#[test]
	fn selector_matches_case_insensitively() {
		let selector = ModelSelector::new("OpenAI", "GPT-4o");
		assert!(selector.matches("openai", "gpt-4o"));
		assert!(!selector.matches("openai", "gpt-4"));
	}

	#[test]
	fn registry_selects_first_match() {
		let mut registry = ModelRegistry::new();
		registry.register(model("openai", "gpt-4o", ScriptedLlmClient::new(["a"])));
		registry.register(model("openai", "gpt-4o", ScriptedLlmClient::new(["b"])));

		let found = registry
			.select(&ModelSelector::new("openai", "gpt-4o"))
			.expect("model should be found");
		assert_eq!(found.name(), "gpt-4o-latest");
		assert_eq!(registry.len(), 2);
	}

	#[test]
	fn require_reports_missing_model() {
		let registry = ModelRegistry::new();
		let err = registry
			.require(&ModelSelector::new("copilot", "gpt-4o"))
			.unwrap_err();
		assert!(matches!(
			err,
			TutorError::NoModelAvailable { vendor, family } if vendor == "copilot" && family == "gpt-4o"
		));
	}

	#[tokio::test]
	async fn fragments_skip_empty_deltas_and_end_on_completion() {
		let chat = model("openai", "gpt-4o", ScriptedLlmClient::new(["He", "", "llo"]));
		let fragments = chat
			.send_request(vec![Message::user("hi")], CancellationToken::new())
			.await
			.unwrap();

		let collected: Vec<String> = fragments
			.into_stream()
			.map(|f| f.unwrap())
			.collect()
			.await;
		assert_eq!(collected, vec!["He".to_string(), "llo".to_string()]);
	}

	#[tokio::test]
	async fn cancelled_stream_yields_nothing() {
		let chat = model("openai", "gpt-4o", ScriptedLlmClient::new(["a", "b"]));
		let cancel = CancellationToken::new();
		let mut fragments = chat
			.send_request(vec![Message::user("hi")], cancel.clone())
			.await
			.unwrap();

		cancel.cancel();
		assert!(fragments.is_cancelled());
		assert!(fragments.next_fragment().await.is_none());
	}

	#[tokio::test]
	async fn stream_error_is_yielded_once() {
		let client = ScriptedLlmClient::new(["partial"]).failing_with(LlmError::Api("boom".to_string()));
		let chat = model("openai", "gpt-4o", client);
		let mut fragments = chat
			.send_request(vec![Message::user("hi")], CancellationToken::new())
			.await
			.unwrap();

		assert_eq!(fragments.next_fragment().await.unwrap().unwrap(), "partial");
		assert!(matches!(
			fragments.next_fragment().await,
			Some(Err(LlmError::Api(msg))) if msg == "boom"
		));
		assert!(fragments.next_fragment().await.is_none());
	}
}
