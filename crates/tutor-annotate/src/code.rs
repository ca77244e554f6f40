// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Source code as seen by the annotator.

use std::ops::Range;
use std::path::Path;

/// A document plus the range of lines the user is looking at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeView {
	language_id: String,
	lines: Vec<String>,
	visible: Range<usize>,
}

impl CodeView {
	/// Creates a view with every line visible.
	pub fn new(language_id: impl Into<String>, source: &str) -> Self {
		let lines: Vec<String> = source.lines().map(str::to_string).collect();
		let visible = 0..lines.len();
		Self {
			language_id: language_id.into(),
			lines,
			visible,
		}
	}

	/// Restricts the visible lines to `range` (0-based, end exclusive),
	/// clamped to the document.
	pub fn with_visible_range(mut self, range: Range<usize>) -> Self {
		let end = range.end.min(self.lines.len());
		let start = range.start.min(end);
		self.visible = start..end;
		self
	}

	pub fn language_id(&self) -> &str {
		&self.language_id
	}

	pub fn line_count(&self) -> usize {
		self.lines.len()
	}

	pub fn visible_range(&self) -> Range<usize> {
		self.visible.clone()
	}

	/// Text of a 1-based line anywhere in the document.
	pub fn line(&self, line: u32) -> Option<&str> {
		let index = (line as usize).checked_sub(1)?;
		self.lines.get(index).map(String::as_str)
	}

	/// Visible lines prefixed with their 1-based numbers, one per row.
	pub fn numbered(&self) -> String {
		self.lines[self.visible.clone()]
			.iter()
			.zip(self.visible.clone())
			.map(|(text, index)| format!("{}: {} \n", index + 1, text))
			.collect()
	}
}

/// Maps a file extension to an editor language identifier.
pub fn language_id_for_path(path: &Path) -> &'static str {
	let ext = path
		.extension()
		.and_then(|e| e.to_str())
		.map(str::to_lowercase)
		.unwrap_or_default();

	match ext.as_str() {
		"rs" => "rust",
		"py" => "python",
		"js" | "mjs" | "cjs" => "javascript",
		"jsx" => "javascriptreact",
		"ts" | "mts" | "cts" => "typescript",
		"tsx" => "typescriptreact",
		"go" => "go",
		"java" => "java",
		"kt" | "kts" => "kotlin",
		"c" | "h" => "c",
		"cc" | "cpp" | "cxx" | "hpp" | "hh" => "cpp",
		"cs" => "csharp",
		"rb" => "ruby",
		"php" => "php",
		"swift" => "swift",
		"sh" | "bash" => "shellscript",
		"html" | "htm" => "html",
		"css" => "css",
		"json" => "json",
		"toml" => "toml",
		"yaml" | "yml" => "yaml",
		"md" => "markdown",
		"sql" => "sql",
		_ => "plaintext",
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const SOURCE: &str = "fn main() {\n    let x = 1;\n    println!(\"{x}\");\n}\n";

	#[test]
	fn numbered_prefixes_each_visible_line() {
		let view = CodeView::new("rust", SOURCE);
		assert_eq!(
			view.numbered(),
			"1: fn main() { \n2:     let x = 1; \n3:     println!(\"{x}\"); \n4: } \n"
		);
	}

	#[test]
	fn numbered_respects_visible_range() {
		let view = CodeView::new("rust", SOURCE).with_visible_range(1..3);
		assert_eq!(
			view.numbered(),
			"2:     let x = 1; \n3:     println!(\"{x}\"); \n"
		);
	}

	#[test]
	fn visible_range_is_clamped() {
		let view = CodeView::new("rust", SOURCE).with_visible_range(3..99);
		assert_eq!(view.visible_range(), 3..4);
		let empty = CodeView::new("rust", SOURCE).with_visible_range(10..20);
		assert_eq!(empty.numbered(), "");
	}

	#[test]
	fn line_lookup_is_one_based() {
		let view = CodeView::new("rust", SOURCE);
		assert_eq!(view.line(1), Some("fn main() {"));
		assert_eq!(view.line(4), Some("}"));
		assert_eq!(view.line(0), None);
		assert_eq!(view.line(5), None);
	}

	#[test]
	fn language_ids_follow_extensions() {
		assert_eq!(language_id_for_path(Path::new("src/lib.rs")), "rust");
		assert_eq!(language_id_for_path(Path::new("app.TSX")), "typescriptreact");
		assert_eq!(language_id_for_path(Path::new("Makefile")), "plaintext");
	}
}
