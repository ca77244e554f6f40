// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Decorations and the session that owns them.

use thiserror::Error;
use tracing::{debug, trace};

use crate::code::CodeView;
use crate::record::AnnotationRecord;

/// Characters of the suggestion shown inline before the ellipsis.
pub const DEFAULT_PREVIEW_CHARS: usize = 25;

/// Decorations one session may hold before further records are refused.
pub const DEFAULT_MAX_DECORATIONS: usize = 200;

/// A trailing inline annotation with hover text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decoration {
	/// 1-based line.
	pub line: u32,
	/// Character column at the end of the line.
	pub column: usize,
	pub trailing_text: String,
	pub hover: String,
}

impl Decoration {
	pub fn from_record(record: &AnnotationRecord, line_text: &str, preview_chars: usize) -> Self {
		let preview: String = record.suggestion.chars().take(preview_chars).collect();
		Self {
			line: record.line,
			column: line_text.chars().count(),
			trailing_text: format!(" {preview}..."),
			hover: record.suggestion.clone(),
		}
	}
}

#[derive(Debug, Error)]
pub enum DecorationError {
	#[error("line {line} is outside the document ({line_count} lines)")]
	LineOutOfRange { line: u32, line_count: usize },

	#[error("decoration limit of {limit} reached")]
	LimitReached { limit: usize },

	#[error("host rejected decoration: {0}")]
	Host(String),
}

/// Host surface that renders decorations.
pub trait Decorator {
	/// Disposable resource for one rendered decoration.
	type Handle;

	fn decorate(&mut self, decoration: &Decoration) -> Result<Self::Handle, DecorationError>;

	fn dispose(&mut self, handle: Self::Handle);
}

/// Decorations created by one annotation pass.
///
/// Handles are bounded by `max_decorations` and disposed together by
/// [`AnnotationSession::clear`] or when the session is dropped.
pub struct AnnotationSession<D: Decorator> {
	decorator: D,
	handles: Vec<D::Handle>,
	max_decorations: usize,
	preview_chars: usize,
}

impl<D: Decorator> AnnotationSession<D> {
	pub fn new(decorator: D) -> Self {
		Self {
			decorator,
			handles: Vec::new(),
			max_decorations: DEFAULT_MAX_DECORATIONS,
			preview_chars: DEFAULT_PREVIEW_CHARS,
		}
	}

	pub fn with_max_decorations(mut self, max_decorations: usize) -> Self {
		self.max_decorations = max_decorations;
		self
	}

	pub fn with_preview_chars(mut self, preview_chars: usize) -> Self {
		self.preview_chars = preview_chars;
		self
	}

	pub fn len(&self) -> usize {
		self.handles.len()
	}

	pub fn is_empty(&self) -> bool {
		self.handles.is_empty()
	}

	pub fn decorator(&self) -> &D {
		&self.decorator
	}

	/// Renders `record` at the end of its line in `view`.
	pub fn apply(&mut self, view: &CodeView, record: &AnnotationRecord) -> Result<(), DecorationError> {
		if self.handles.len() >= self.max_decorations {
			return Err(DecorationError::LimitReached {
				limit: self.max_decorations,
			});
		}

		let line_text = view
			.line(record.line)
			.ok_or(DecorationError::LineOutOfRange {
				line: record.line,
				line_count: view.line_count(),
			})?;

		let decoration = Decoration::from_record(record, line_text, self.preview_chars);
		let handle = self.decorator.decorate(&decoration)?;
		self.handles.push(handle);
		trace!(line = record.line, total = self.handles.len(), "decoration applied");
		Ok(())
	}

	/// Disposes every decoration created so far.
	pub fn clear(&mut self) {
		if self.handles.is_empty() {
			return;
		}
		debug!(count = self.handles.len(), "clearing decorations");
		for handle in self.handles.drain(..) {
			self.decorator.dispose(handle);
		}
	}
}

impl<D: Decorator> Drop for AnnotationSession<D> {
	fn drop(&mut self) {
		self.clear();
	}
}
