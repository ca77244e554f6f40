// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use tutor_common_core::Message;

use crate::code::CodeView;

/// Instruction that asks the model for back-to-back annotation objects.
pub const ANNOTATION_PROMPT: &str = r#"You are a code tutor who helps students learn how to write better code. Your job is to evaluate a block of code that the user gives you. Annotate any lines that could be improved with a brief suggestion and the reason why you are making that suggestion. Only make suggestions when the issue is severe enough to affect the readability and maintainability of the code. Be friendly with your suggestions and remember that these are students, so they need gentle guidance. Format each suggestion as a single JSON object. Do not wrap your response in triple backticks. Here is an example of what your response should look like:

{ "line": 1, "suggestion": "I think you should use a for loop instead of a while loop. A for loop is more concise and easier to read." }{ "line": 12, "suggestion": "I think you should use a for loop instead of a while loop. A for loop is more concise and easier to read." }
"#;

/// Messages for one annotation request over `view`.
pub fn build_annotation_messages(view: &CodeView) -> Vec<Message> {
	vec![
		Message::user(ANNOTATION_PROMPT),
		Message::user(format!(
			"The user is working in {}. The next message contains the code.",
			view.language_id()
		)),
		Message::user(view.numbered()),
	]
}
