// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Server-sent event parser for streaming chat completions.

use crate::types::{OpenAIError, OpenAIStreamChunk};
use futures::Stream;
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::{debug, trace, warn};
use tutor_common_core::{LlmError, LlmEvent, LlmResponse, Message, Usage};

pin_project! {
		/// Turns a byte stream of SSE lines into [`LlmEvent`]s.
		///
		/// Content deltas are emitted as they arrive and accumulated into the
		/// final `Completed` event sent on `[DONE]` or end of input.
		pub struct OpenAIStream<S> {
				#[pin]
				inner: S,
				buffer: String,
				pending_utf8: Vec<u8>,
				content: String,
				finished: bool,
				usage: Option<Usage>,
				finish_reason: Option<String>,
		}
}

impl<S> OpenAIStream<S> {
	pub fn new(inner: S) -> Self {
		Self {
			inner,
			buffer: String::new(),
			pending_utf8: Vec::new(),
			content: String::new(),
			finished: false,
			usage: None,
			finish_reason: None,
		}
	}
}

impl<S, E> Stream for OpenAIStream<S>
where
	S: Stream<Item = Result<bytes::Bytes, E>>,
	E: std::fmt::Display,
{
	type Item = LlmEvent;

	fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
		let mut this = self.project();

		if *this.finished {
			return Poll::Ready(None);
		}

		loop {
			if let Some(event) = next_event(
				this.buffer,
				this.content,
				this.finished,
				this.usage,
				this.finish_reason,
			) {
				return Poll::Ready(Some(event));
			}

			match this.inner.as_mut().poll_next(cx) {
				Poll::Ready(Some(Ok(bytes))) => {
					trace!(bytes_len = bytes.len(), "received SSE chunk");
					this.pending_utf8.extend_from_slice(&bytes);
					match decode_utf8_prefix(this.pending_utf8) {
						Ok(text) => this.buffer.push_str(&text),
						Err(e) => {
							warn!(error = %e, "invalid UTF-8 in stream");
							*this.finished = true;
							return Poll::Ready(Some(LlmEvent::Error(LlmError::InvalidResponse(
								format!("invalid UTF-8: {e}"),
							))));
						}
					}
				}
				Poll::Ready(Some(Err(e))) => {
					*this.finished = true;
					return Poll::Ready(Some(LlmEvent::Error(LlmError::Http(e.to_string()))));
				}
				Poll::Ready(None) => {
					*this.finished = true;
					if this.content.is_empty() {
						return Poll::Ready(None);
					}
					debug!("stream ended without [DONE]");
					let response = final_response(this.content, this.usage, this.finish_reason);
					return Poll::Ready(Some(LlmEvent::Completed(response)));
				}
				Poll::Pending => return Poll::Pending,
			}
		}
	}
}

/// Drains the longest valid UTF-8 prefix of `pending`, leaving a split
/// multi-byte sequence behind for the next chunk.
fn decode_utf8_prefix(pending: &mut Vec<u8>) -> Result<String, std::str::Utf8Error> {
	match std::str::from_utf8(pending) {
		Ok(s) => {
			let text = s.to_string();
			pending.clear();
			Ok(text)
		}
		Err(e) if e.error_len().is_none() => {
			let valid = e.valid_up_to();
			let text = String::from_utf8_lossy(&pending[..valid]).into_owned();
			pending.drain(..valid);
			Ok(text)
		}
		Err(e) => Err(e),
	}
}

fn next_event(
	buffer: &mut String,
	content: &mut String,
	finished: &mut bool,
	usage: &mut Option<Usage>,
	finish_reason: &mut Option<String>,
) -> Option<LlmEvent> {
	while let Some(line_end) = buffer.find('\n') {
		let line = buffer[..line_end].trim_end_matches('\r').to_string();
		buffer.drain(..=line_end);

		if line.is_empty() || line.starts_with(':') {
			continue;
		}

		let Some(data) = line.strip_prefix("data:") else {
			continue;
		};
		let data = data.trim();

		if data == "[DONE]" {
			debug!("received [DONE] marker");
			*finished = true;
			return Some(LlmEvent::Completed(final_response(content, usage, finish_reason)));
		}

		match serde_json::from_str::<OpenAIStreamChunk>(data) {
			Ok(chunk) => {
				if let Some(u) = chunk.usage {
					*usage = Some(u.into());
				}

				let mut delta = String::new();
				for choice in chunk.choices {
					if let Some(fr) = choice.finish_reason {
						trace!(finish_reason = %fr, "finish reason received");
						*finish_reason = Some(fr);
					}
					if let Some(text) = choice.delta.content {
						delta.push_str(&text);
					}
				}

				if !delta.is_empty() {
					content.push_str(&delta);
					return Some(LlmEvent::TextDelta { content: delta });
				}
			}
			Err(e) => {
				if let Ok(error_response) = serde_json::from_str::<OpenAIError>(data) {
					warn!(
							error_type = ?error_response.error.error_type,
							message = %error_response.error.message,
							"API error in stream"
					);
					*finished = true;
					return Some(LlmEvent::Error(LlmError::Api(error_response.error.message)));
				}

				warn!(error = %e, data = data, "failed to parse stream chunk");
			}
		}
	}

	None
}

fn final_response(
	content: &str,
	usage: &Option<Usage>,
	finish_reason: &Option<String>,
) -> LlmResponse {
	LlmResponse {
		message: Message::assistant(content.to_string()),
		usage: usage.clone(),
		finish_reason: finish_reason.clone(),
	}
}
