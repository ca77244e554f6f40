// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Conversation turns and their replay into model messages.

use serde::{Deserialize, Serialize};
use tutor_common_core::Message;

/// One piece of a rendered response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResponsePart {
	Markdown { value: String },
	Reference { uri: String },
	Progress { message: String },
}

impl ResponsePart {
	pub fn markdown(value: impl Into<String>) -> Self {
		Self::Markdown {
			value: value.into(),
		}
	}

	/// Text the user saw for this part; non-text parts show none.
	pub fn displayed_text(&self) -> Option<&str> {
		match self {
			ResponsePart::Markdown { value } => Some(value),
			ResponsePart::Reference { .. } | ResponsePart::Progress { .. } => None,
		}
	}
}

/// A prompt the user sent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestTurn {
	pub prompt: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub command: Option<String>,
}

/// A reply the model produced.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseTurn {
	pub parts: Vec<ResponsePart>,
}

impl ResponseTurn {
	pub fn markdown(value: impl Into<String>) -> Self {
		Self {
			parts: vec![ResponsePart::markdown(value)],
		}
	}

	/// Displayed text parts concatenated in order.
	pub fn text(&self) -> String {
		self.parts.iter().filter_map(ResponsePart::displayed_text).collect()
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "turn", rename_all = "snake_case")]
pub enum ChatTurn {
	Request(RequestTurn),
	Response(ResponseTurn),
}

/// Replays model-authored turns as assistant messages, oldest first.
pub fn replay_history(history: &[ChatTurn]) -> Vec<Message> {
	history
		.iter()
		.filter_map(|turn| match turn {
			ChatTurn::Response(response) => Some(Message::assistant(response.text())),
			ChatTurn::Request(_) => None,
		})
		.collect()
}

/// Instruction, replayed history, then the current prompt.
pub fn build_chat_messages(instruction: &str, history: &[ChatTurn], prompt: &str) -> Vec<Message> {
	let mut messages = Vec::with_capacity(history.len() + 2);
	messages.push(Message::system(instruction));
	messages.extend(replay_history(history));
	messages.push(Message::user(prompt));
	messages
}

/// Ordered turns of one conversation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatHistory {
	turns: Vec<ChatTurn>,
}

impl ChatHistory {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push_request(&mut self, prompt: impl Into<String>, command: Option<String>) {
		self.turns.push(ChatTurn::Request(RequestTurn {
			prompt: prompt.into(),
			command,
		}));
	}

	pub fn push_response(&mut self, response: ResponseTurn) {
		self.turns.push(ChatTurn::Response(response));
	}

	pub fn turns(&self) -> &[ChatTurn] {
		&self.turns
	}

	pub fn len(&self) -> usize {
		self.turns.len()
	}

	pub fn is_empty(&self) -> bool {
		self.turns.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tutor_common_core::Role;

	fn sample_history() -> ChatHistory {
		let mut history = ChatHistory::new();
		history.push_request("teach me loops", Some("teach".to_string()));
		history.push_response(ResponseTurn {
			parts: vec![
				ResponsePart::markdown("Exercise 1: "),
				ResponsePart::Reference {
					uri: "https://docs.python.org".to_string(),
				},
				ResponsePart::markdown("print 1 to 3."),
			],
		});
		history.push_request("for i in range(1, 4): print(i)", None);
		history.push_response(ResponseTurn::markdown("Correct!"));
		history
	}

	#[test]
	fn response_text_joins_markdown_parts_only() {
		let history = sample_history();
		let ChatTurn::Response(first) = &history.turns()[1] else {
			panic!("expected response turn");
		};
		assert_eq!(first.text(), "Exercise 1: print 1 to 3.");
	}

	#[test]
	fn replay_keeps_only_responses_in_order() {
		let messages = replay_history(sample_history().turns());
		assert_eq!(
			messages,
			vec![
				Message::assistant("Exercise 1: print 1 to 3."),
				Message::assistant("Correct!"),
			]
		);
	}

	#[test]
	fn chat_messages_wrap_history_with_instruction_and_prompt() {
		let messages = build_chat_messages("be a tutor", sample_history().turns(), "next please");
		let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
		assert_eq!(
			roles,
			vec![Role::System, Role::Assistant, Role::Assistant, Role::User]
		);
		assert_eq!(messages[0].content, "be a tutor");
		assert_eq!(messages[3].content, "next please");
	}

	#[test]
	fn empty_history_yields_instruction_and_prompt() {
		let messages = build_chat_messages("be a tutor", &[], "hello");
		assert_eq!(messages, vec![Message::system("be a tutor"), Message::user("hello")]);
	}

	#[test]
	fn turns_serialize_with_tags() {
		let json = serde_json::to_value(ChatTurn::Response(ResponseTurn::markdown("hi")))
			.expect("turn serializes");
		assert_eq!(json["turn"], "response");
		assert_eq!(json["parts"][0]["kind"], "markdown");
		assert_eq!(json["parts"][0]["value"], "hi");
	}
}
