// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Conversational tutor participant.

mod history;
mod participant;

pub use history::{
	build_chat_messages, replay_history, ChatHistory, ChatTurn, RequestTurn, ResponsePart,
	ResponseTurn,
};
pub use participant::{ChatRequest, ResponseSink, TutorParticipant, TEACH_COMMAND, TUTOR_PROMPT};
