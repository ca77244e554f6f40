// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Scripted LLM client for tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::LlmError;
use crate::llm::{LlmClient, LlmEvent, LlmRequest, LlmResponse, LlmStream};
use crate::message::Message;

/// Replays a fixed list of text fragments for every request and records the
/// requests it received.
#[derive(Clone, Debug, Default)]
pub struct ScriptedLlmClient {
	fragments: Vec<String>,
	stream_error: Option<LlmError>,
	requests: Arc<Mutex<Vec<LlmRequest>>>,
}

impl ScriptedLlmClient {
	pub fn new<I, S>(fragments: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			fragments: fragments.into_iter().map(Into::into).collect(),
			stream_error: None,
			requests: Arc::new(Mutex::new(Vec::new())),
		}
	}

	/// Ends the stream with `error` instead of a completion event.
	pub fn failing_with(mut self, error: LlmError) -> Self {
		self.stream_error = Some(error);
		self
	}

	/// Requests received so far.
	pub fn requests(&self) -> Vec<LlmRequest> {
		self.requests.lock().expect("request log poisoned").clone()
	}

	fn record(&self, request: LlmRequest) {
		self.requests.lock().expect("request log poisoned").push(request);
	}

	fn response(&self) -> LlmResponse {
		LlmResponse {
			message: Message::assistant(self.fragments.concat()),
			usage: None,
			finish_reason: Some("stop".to_string()),
		}
	}
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
	async fn complete_streaming(&self, request: LlmRequest) -> Result<LlmStream, LlmError> {
		self.record(request);
		let mut events: Vec<LlmEvent> = self
			.fragments
			.iter()
			.map(|f| LlmEvent::TextDelta { content: f.clone() })
			.collect();
		events.push(match &self.stream_error {
			Some(e) => LlmEvent::Error(e.clone()),
			None => LlmEvent::Completed(self.response()),
		});
		Ok(LlmStream::new(Box::pin(futures::stream::iter(events))))
	}
}
