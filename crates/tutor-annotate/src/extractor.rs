// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Incremental extraction of annotation records from a fragment stream.
//!
//! Fragments are appended to a buffer owned by one extractor. A parse is only
//! ever attempted right after a `}` arrives; how the candidate text is chosen
//! depends on the [`TriggerMode`]:
//!
//! - [`TriggerMode::Depth`] tracks brace depth outside string literals and
//!   parses each top-level object as soon as it closes. Several records can
//!   come out of one fragment, and prose between objects is discarded. An
//!   object only opens at a `{` whose next non-whitespace character is `"`
//!   or `}`, so a stray brace in prose does not swallow the rest of the
//!   stream.
//! - [`TriggerMode::ClosingBrace`] parses the whole buffer whenever the latest
//!   fragment contains `}` and keeps accumulating on failure. Kept for
//!   compatibility with the legacy extraction behaviour.
//!
//! In both modes the buffer is consumed on any syntactically valid parse;
//! whether a record is emitted is decided separately by [`validate_shape`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::record::{parse_attempt, validate_shape, AnnotationRecord, ShapePolicy};

/// When to attempt a parse.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TriggerMode {
	/// Parse each top-level object when its brace depth returns to zero.
	#[default]
	Depth,
	/// Parse the whole buffer whenever the latest fragment contains `}`.
	ClosingBrace,
}

impl fmt::Display for TriggerMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TriggerMode::Depth => write!(f, "depth"),
			TriggerMode::ClosingBrace => write!(f, "closing-brace"),
		}
	}
}

impl FromStr for TriggerMode {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"depth" => Ok(TriggerMode::Depth),
			"closing-brace" | "closing_brace" => Ok(TriggerMode::ClosingBrace),
			_ => Err(format!(
				"unknown trigger mode '{s}', expected 'depth' or 'closing-brace'"
			)),
		}
	}
}

/// Extractor settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractorConfig {
	pub trigger: TriggerMode,
	pub shape_policy: ShapePolicy,
	/// Discard the buffer once it grows past this many bytes without a
	/// successful parse. `None` means unbounded.
	pub max_buffer_bytes: Option<usize>,
}

impl ExtractorConfig {
	/// Closing-brace trigger with the legacy shape policy.
	pub fn legacy() -> Self {
		Self {
			trigger: TriggerMode::ClosingBrace,
			shape_policy: ShapePolicy::Legacy,
			max_buffer_bytes: None,
		}
	}

	pub fn with_trigger(mut self, trigger: TriggerMode) -> Self {
		self.trigger = trigger;
		self
	}

	pub fn with_shape_policy(mut self, shape_policy: ShapePolicy) -> Self {
		self.shape_policy = shape_policy;
		self
	}

	pub fn with_max_buffer_bytes(mut self, max_buffer_bytes: usize) -> Self {
		self.max_buffer_bytes = Some(max_buffer_bytes);
		self
	}
}

/// Counters describing one extraction run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExtractorStats {
	pub fragments: usize,
	pub parse_attempts: usize,
	pub parsed: usize,
	pub emitted: usize,
	pub rejected: usize,
	pub discarded_bytes: usize,
}

#[derive(Debug, Default)]
struct DepthScanner {
	depth: usize,
	in_string: bool,
	escaped: bool,
	object_start: usize,
	/// A `{` seen outside any object, waiting on its next significant char.
	pending_open: Option<usize>,
	scanned: usize,
}

impl DepthScanner {
	/// Advances over `ch` at byte `pos`. Returns the start of the object that
	/// `ch` closes, if any.
	fn step(&mut self, pos: usize, ch: char) -> Option<usize> {
		if self.depth == 0 {
			match self.pending_open {
				Some(_) if ch.is_whitespace() => return None,
				Some(start) if ch == '"' || ch == '}' => {
					self.pending_open = None;
					self.depth = 1;
					self.object_start = start;
				}
				_ => {
					self.pending_open = (ch == '{').then_some(pos);
					return None;
				}
			}
		}

		if self.in_string {
			if self.escaped {
				self.escaped = false;
			} else if ch == '\\' {
				self.escaped = true;
			} else if ch == '"' {
				self.in_string = false;
			}
			return None;
		}

		match ch {
			'"' => self.in_string = true,
			'{' => self.depth += 1,
			'}' => {
				self.depth -= 1;
				if self.depth == 0 {
					return Some(self.object_start);
				}
			}
			_ => {}
		}
		None
	}

	fn rebase(&mut self, consumed: usize) {
		self.scanned -= consumed;
		if self.depth > 0 {
			self.object_start -= consumed;
		}
		if let Some(start) = self.pending_open.as_mut() {
			*start -= consumed;
		}
	}
}

/// Pulls [`AnnotationRecord`]s out of a streamed response.
///
/// One instance serves one response stream; it is not meant to be shared.
#[derive(Debug, Default)]
pub struct AnnotationExtractor {
	config: ExtractorConfig,
	buffer: String,
	scanner: DepthScanner,
	stats: ExtractorStats,
}

impl AnnotationExtractor {
	pub fn new(config: ExtractorConfig) -> Self {
		Self {
			config,
			..Default::default()
		}
	}

	pub fn config(&self) -> &ExtractorConfig {
		&self.config
	}

	/// Text received but not yet consumed by a successful parse.
	pub fn buffered(&self) -> &str {
		&self.buffer
	}

	pub fn stats(&self) -> ExtractorStats {
		self.stats
	}

	/// Feeds one fragment and returns the records it completed.
	pub fn push(&mut self, fragment: &str) -> Vec<AnnotationRecord> {
		self.stats.fragments += 1;
		self.buffer.push_str(fragment);

		let records = match self.config.trigger {
			TriggerMode::ClosingBrace => self.push_closing_brace(fragment),
			TriggerMode::Depth => self.scan_depth(),
		};

		self.enforce_cap();
		records
	}

	/// Ends extraction, returning any trailing text that never parsed.
	pub fn finish(self) -> Option<String> {
		let trailing = self.buffer.trim();
		if trailing.is_empty() {
			return None;
		}
		debug!(
			trailing_bytes = trailing.len(),
			emitted = self.stats.emitted,
			"dropping unparsed trailing text"
		);
		Some(trailing.to_string())
	}

	fn push_closing_brace(&mut self, fragment: &str) -> Vec<AnnotationRecord> {
		if !fragment.contains('}') {
			return Vec::new();
		}

		self.stats.parse_attempts += 1;
		match parse_attempt(&self.buffer) {
			Some(value) => {
				self.buffer.clear();
				self.accept(value).into_iter().collect()
			}
			None => {
				trace!(buffered = self.buffer.len(), "buffer not yet parseable");
				Vec::new()
			}
		}
	}

	fn scan_depth(&mut self) -> Vec<AnnotationRecord> {
		let from = self.scanner.scanned;
		let mut closed = Vec::new();
		for (offset, ch) in self.buffer[from..].char_indices() {
			let pos = from + offset;
			if let Some(start) = self.scanner.step(pos, ch) {
				closed.push((start, pos + ch.len_utf8()));
			}
		}
		self.scanner.scanned = self.buffer.len();

		let mut records = Vec::new();
		let mut consumed = 0;
		for (start, end) in closed {
			self.stats.parse_attempts += 1;
			self.stats.discarded_bytes += start - consumed;
			match parse_attempt(&self.buffer[start..end]) {
				Some(value) => records.extend(self.accept(value)),
				None => {
					debug!(bytes = end - start, "discarding malformed object");
					self.stats.discarded_bytes += end - start;
				}
			}
			consumed = end;
		}

		if self.scanner.depth == 0 {
			// Nothing open: whatever is left is prose, up to a brace that may
			// still start an object.
			let keep_from = self.scanner.pending_open.unwrap_or(self.buffer.len());
			self.stats.discarded_bytes += keep_from - consumed;
			consumed = keep_from;
		}

		if consumed > 0 {
			self.buffer.drain(..consumed);
			self.scanner.rebase(consumed);
		}
		records
	}

	fn accept(&mut self, value: Value) -> Option<AnnotationRecord> {
		self.stats.parsed += 1;
		match validate_shape(&value, self.config.shape_policy) {
			Some(record) => {
				self.stats.emitted += 1;
				trace!(line = record.line, "extracted annotation");
				Some(record)
			}
			None => {
				self.stats.rejected += 1;
				debug!(value = %value, "parsed value is not an annotation, skipping");
				None
			}
		}
	}

	fn enforce_cap(&mut self) {
		let Some(max) = self.config.max_buffer_bytes else {
			return;
		};
		if self.buffer.len() <= max {
			return;
		}
		warn!(
			buffered = self.buffer.len(),
			max_buffer_bytes = max,
			"annotation buffer exceeded limit, discarding"
		);
		self.stats.discarded_bytes += self.buffer.len();
		self.buffer.clear();
		self.scanner = DepthScanner::default();
	}
}
