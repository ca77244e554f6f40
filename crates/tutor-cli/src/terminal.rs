// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Terminal renderings of the host surfaces.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::Write;

use tracing::warn;
use tutor_annotate::{CodeView, Decoration, DecorationError, Decorator};
use tutor_chat::ResponseSink;

/// Prints each decoration as it arrives and keeps the live ones for a final
/// annotated listing.
pub struct TerminalDecorator<W: Write> {
	out: W,
	next_id: usize,
	live: BTreeMap<usize, Decoration>,
}

impl<W: Write> TerminalDecorator<W> {
	pub fn new(out: W) -> Self {
		Self {
			out,
			next_id: 0,
			live: BTreeMap::new(),
		}
	}

	pub fn live(&self) -> impl Iterator<Item = &Decoration> {
		self.live.values()
	}

	/// Visible lines of `view` with their trailing annotations, followed by
	/// the full text of every suggestion.
	pub fn render_listing(&self, view: &CodeView) -> String {
		let mut by_line: BTreeMap<u32, Vec<&Decoration>> = BTreeMap::new();
		for decoration in self.live.values() {
			by_line.entry(decoration.line).or_default().push(decoration);
		}

		let range = view.visible_range();
		let width = range.end.to_string().len();
		let mut listing = String::new();
		for index in range {
			let number = index as u32 + 1;
			let text = view.line(number).unwrap_or_default();
			let _ = write!(listing, "{number:>width$} | {text}");
			for decoration in by_line.get(&number).into_iter().flatten() {
				listing.push_str(&decoration.trailing_text);
			}
			listing.push('\n');
		}

		if !by_line.is_empty() {
			listing.push_str("\nSuggestions:\n");
			for (line, decorations) in &by_line {
				for decoration in decorations {
					let _ = writeln!(listing, "  line {line}: {}", decoration.hover);
				}
			}
		}
		listing
	}
}

impl<W: Write> Decorator for TerminalDecorator<W> {
	type Handle = usize;

	fn decorate(&mut self, decoration: &Decoration) -> Result<usize, DecorationError> {
		writeln!(
			self.out,
			"+ line {}:{}{}",
			decoration.line, decoration.column, decoration.trailing_text
		)
		.map_err(|e| DecorationError::Host(e.to_string()))?;

		let id = self.next_id;
		self.next_id += 1;
		self.live.insert(id, decoration.clone());
		Ok(id)
	}

	fn dispose(&mut self, handle: usize) {
		self.live.remove(&handle);
	}
}

/// Streams markdown fragments straight to a writer.
pub struct WriterSink<W: Write> {
	out: W,
}

impl<W: Write> WriterSink<W> {
	pub fn new(out: W) -> Self {
		Self { out }
	}

	pub fn writer(&mut self) -> &mut W {
		&mut self.out
	}

	pub fn into_inner(self) -> W {
		self.out
	}
}

impl<W: Write> ResponseSink for WriterSink<W> {
	fn markdown(&mut self, fragment: &str) {
		if let Err(e) = self.out.write_all(fragment.as_bytes()).and_then(|_| self.out.flush()) {
			warn!(error = %e, "failed to write response fragment");
		}
	}
}
