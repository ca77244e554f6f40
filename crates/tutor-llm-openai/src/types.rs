// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wire types for the chat completions API.

use serde::{Deserialize, Serialize};
use std::fmt;
use tutor_common_core::{LlmRequest, Message, Usage};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Configuration for the OpenAI client.
#[derive(Clone)]
pub struct OpenAIConfig {
	pub api_key: String,
	pub base_url: String,
	pub model: String,
	pub organization: Option<String>,
}

impl fmt::Debug for OpenAIConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("OpenAIConfig")
			.field("api_key", &"[REDACTED]")
			.field("base_url", &self.base_url)
			.field("model", &self.model)
			.field("organization", &self.organization)
			.finish()
	}
}

impl OpenAIConfig {
	pub fn new(api_key: impl Into<String>) -> Self {
		Self {
			api_key: api_key.into(),
			base_url: DEFAULT_BASE_URL.to_string(),
			model: DEFAULT_MODEL.to_string(),
			organization: None,
		}
	}

	pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
		self.base_url = base_url.into().trim_end_matches('/').to_string();
		self
	}

	pub fn with_model(mut self, model: impl Into<String>) -> Self {
		self.model = model.into();
		self
	}

	pub fn with_organization(mut self, org: impl Into<String>) -> Self {
		self.organization = Some(org.into());
		self
	}

	pub fn completions_url(&self) -> String {
		format!("{}/chat/completions", self.base_url)
	}
}

/// Chat completion request body.
#[derive(Debug, Clone, Serialize)]
pub struct OpenAIRequest {
	pub model: String,
	pub messages: Vec<OpenAIMessage>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub max_tokens: Option<u32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub temperature: Option<f32>,
	pub stream: bool,
}

impl OpenAIRequest {
	/// Builds a streaming request body.
	pub fn from_llm_request(request: &LlmRequest) -> Self {
		Self {
			model: request.model.clone(),
			messages: request.messages.iter().map(OpenAIMessage::from).collect(),
			max_tokens: request.max_tokens,
			temperature: request.temperature,
			stream: true,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIMessage {
	pub role: String,
	#[serde(default)]
	pub content: Option<String>,
}

impl From<&Message> for OpenAIMessage {
	fn from(message: &Message) -> Self {
		Self {
			role: message.role.as_str().to_string(),
			content: Some(message.content.clone()),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIUsage {
	pub prompt_tokens: u32,
	pub completion_tokens: u32,
	#[serde(default)]
	pub total_tokens: u32,
}

impl From<OpenAIUsage> for Usage {
	fn from(usage: OpenAIUsage) -> Self {
		Usage {
			input_tokens: usage.prompt_tokens,
			output_tokens: usage.completion_tokens,
		}
	}
}

/// One server-sent event payload of a streaming response.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIStreamChunk {
	#[serde(default)]
	pub id: String,
	#[serde(default)]
	pub model: String,
	#[serde(default)]
	pub choices: Vec<OpenAIStreamChoice>,
	#[serde(default)]
	pub usage: Option<OpenAIUsage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIStreamChoice {
	#[serde(default)]
	pub index: u32,
	#[serde(default)]
	pub delta: OpenAIDelta,
	pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct OpenAIDelta {
	#[serde(default)]
	pub role: Option<String>,
	#[serde(default)]
	pub content: Option<String>,
}

/// Error body returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIError {
	pub error: OpenAIErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIErrorDetail {
	pub message: String,
	#[serde(rename = "type")]
	pub error_type: Option<String>,
	pub code: Option<String>,
}
