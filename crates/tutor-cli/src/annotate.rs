// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `tutor annotate`: stream suggestions onto a source file.

use std::io::Write;
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tutor_annotate::{language_id_for_path, AnnotationReport, AnnotationSession, Annotator, CodeView};
use tutor_cli_config::TutorConfig;
use tutor_common_core::ModelCatalog;

use crate::interrupt::run_interruptible;
use crate::models;
use crate::terminal::TerminalDecorator;

pub struct AnnotateOptions<'a> {
	pub file: &'a Path,
	pub language: Option<String>,
	/// 1-based first visible line.
	pub start: Option<usize>,
	/// 1-based last visible line, inclusive.
	pub end: Option<usize>,
}

/// Converts inclusive 1-based line bounds to a 0-based half-open range.
pub fn visible_range(start: Option<usize>, end: Option<usize>, line_count: usize) -> Result<Range<usize>> {
	let start = start.unwrap_or(1);
	let end = end.unwrap_or(line_count);
	if start == 0 {
		bail!("--start is 1-based");
	}
	if end < start {
		bail!("--end ({end}) is before --start ({start})");
	}
	Ok(start - 1..end)
}

pub async fn run(config: &TutorConfig, catalog: Arc<dyn ModelCatalog>, options: AnnotateOptions<'_>) -> Result<()> {
	let source = std::fs::read_to_string(options.file)
		.with_context(|| format!("failed to read {}", options.file.display()))?;
	let language = options
		.language
		.unwrap_or_else(|| language_id_for_path(options.file).to_string());

	let view = CodeView::new(language, &source);
	let range = visible_range(options.start, options.end, view.line_count())?;
	let view = view.with_visible_range(range);

	let annotator = Annotator::new(catalog, models::selector(config))
		.with_extractor_config(config.annotation.extractor_config());

	let stdout = std::io::stdout();
	let (report, listing) = annotate_view(config, &annotator, &view, stdout.lock()).await?;

	let mut out = stdout.lock();
	writeln!(out)?;
	write!(out, "{listing}")?;
	writeln!(out, "\n{}", summary(&report))?;
	Ok(())
}

/// Runs one pass over `view`, printing decorations to `out` as they land.
/// Returns the report and the final annotated listing.
pub async fn annotate_view<W: Write>(
	config: &TutorConfig,
	annotator: &Annotator,
	view: &CodeView,
	out: W,
) -> Result<(AnnotationReport, String)> {
	let mut session = AnnotationSession::new(TerminalDecorator::new(out))
		.with_max_decorations(config.annotation.max_decorations)
		.with_preview_chars(config.annotation.preview_chars);

	let cancel = CancellationToken::new();
	let report = run_interruptible(annotator.annotate(view, &mut session, cancel.clone()), &cancel)
		.await
		.context("annotation failed")?;

	info!(applied = report.applied, cancelled = report.cancelled, "annotation complete");
	let listing = session.decorator().render_listing(view);
	Ok((report, listing))
}

fn summary(report: &AnnotationReport) -> String {
	let mut line = format!(
		"{} suggestion(s) applied, {} skipped",
		report.applied, report.skipped
	);
	if report.extraction.rejected > 0 {
		line.push_str(&format!(", {} malformed", report.extraction.rejected));
	}
	if report.cancelled {
		line.push_str(" (interrupted)");
	}
	line
}
