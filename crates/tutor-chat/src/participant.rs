// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! The tutor chat participant.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};
use tutor_common_core::{ModelCatalog, ModelSelector, TutorResult};

use crate::history::{build_chat_messages, ChatTurn, ResponseTurn};

/// Instruction sent ahead of every tutoring conversation.
pub const TUTOR_PROMPT: &str = "You are a helpful tutor. Your job is to teach the user with fun, simple exercises that they can complete right in the chat. Your exercises should start simple and get more complex as the user progresses. Move one concept at a time, and do not move on to the next concept until the user provides the correct answer. Give hints in your exercises to help the student learn. If the user is stuck, you can provide the answer and explain why it is the answer.";

/// Slash command that starts a lesson.
pub const TEACH_COMMAND: &str = "teach";

/// A single user request to the participant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatRequest {
	pub prompt: String,
	pub command: Option<String>,
}

impl ChatRequest {
	pub fn new(prompt: impl Into<String>) -> Self {
		Self {
			prompt: prompt.into(),
			command: None,
		}
	}

	/// Splits a leading `/command` off the input.
	pub fn parse(input: &str) -> Self {
		let input = input.trim();
		match input.strip_prefix('/') {
			Some(rest) if !rest.is_empty() && !rest.starts_with(char::is_whitespace) => {
				let (command, prompt) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
				Self {
					prompt: prompt.trim().to_string(),
					command: Some(command.to_string()),
				}
			}
			_ => Self::new(input),
		}
	}
}

/// Host surface that shows the streamed reply.
pub trait ResponseSink {
	fn markdown(&mut self, fragment: &str);
}

impl ResponseSink for String {
	fn markdown(&mut self, fragment: &str) {
		self.push_str(fragment);
	}
}

/// Answers chat requests with a streamed tutoring reply.
pub struct TutorParticipant {
	catalog: Arc<dyn ModelCatalog>,
	selector: ModelSelector,
	instruction: String,
}

impl TutorParticipant {
	pub fn new(catalog: Arc<dyn ModelCatalog>, selector: ModelSelector) -> Self {
		Self {
			catalog,
			selector,
			instruction: TUTOR_PROMPT.to_string(),
		}
	}

	pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
		self.instruction = instruction.into();
		self
	}

	/// Streams the reply to `request` into `sink` and returns it as a turn.
	///
	/// Only prior response turns from `history` are sent to the model.
	#[instrument(skip_all, fields(selector = %self.selector, history_len = history.len()))]
	pub async fn handle(
		&self,
		request: &ChatRequest,
		history: &[ChatTurn],
		sink: &mut dyn ResponseSink,
		cancel: CancellationToken,
	) -> TutorResult<ResponseTurn> {
		match request.command.as_deref() {
			Some(TEACH_COMMAND) => info!("starting lesson"),
			Some(other) => debug!(command = other, "unknown command, treating as plain prompt"),
			None => {}
		}

		let model = self.catalog.require(&self.selector)?;
		let messages = build_chat_messages(&self.instruction, history, &request.prompt);
		let mut fragments = model.send_request(messages, cancel).await?;

		let mut reply = String::new();
		while let Some(fragment) = fragments.next_fragment().await {
			let fragment = fragment?;
			sink.markdown(&fragment);
			reply.push_str(&fragment);
		}

		debug!(reply_len = reply.len(), "reply streamed");
		Ok(ResponseTurn::markdown(reply))
	}
}
