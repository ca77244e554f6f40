// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! One annotation pass: prompt the model, extract records, decorate lines.

use std::pin::pin;
use std::sync::Arc;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use tutor_common_core::{ModelCatalog, ModelSelector, TutorResult};

use crate::code::CodeView;
use crate::decoration::{AnnotationSession, Decorator};
use crate::extractor::{ExtractorConfig, ExtractorStats};
use crate::prompt::build_annotation_messages;
use crate::stream::AnnotationStream;

/// Outcome of one annotation pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnnotationReport {
	pub applied: usize,
	pub skipped: usize,
	pub extraction: ExtractorStats,
	pub trailing_bytes: usize,
	pub cancelled: bool,
}

/// Runs annotation passes against models from a catalog.
pub struct Annotator {
	catalog: Arc<dyn ModelCatalog>,
	selector: ModelSelector,
	extractor: ExtractorConfig,
}

impl Annotator {
	pub fn new(catalog: Arc<dyn ModelCatalog>, selector: ModelSelector) -> Self {
		Self {
			catalog,
			selector,
			extractor: ExtractorConfig::default(),
		}
	}

	pub fn with_extractor_config(mut self, extractor: ExtractorConfig) -> Self {
		self.extractor = extractor;
		self
	}

	pub fn selector(&self) -> &ModelSelector {
		&self.selector
	}

	/// Clears `session`, streams suggestions for the visible part of `view`
	/// and applies each one as it completes.
	///
	/// Records that cannot be decorated are skipped. Fails with
	/// `NoModelAvailable` when the catalog has no matching model.
	#[instrument(skip_all, fields(selector = %self.selector, language = view.language_id()))]
	pub async fn annotate<D: Decorator>(
		&self,
		view: &CodeView,
		session: &mut AnnotationSession<D>,
		cancel: CancellationToken,
	) -> TutorResult<AnnotationReport> {
		session.clear();

		let model = self.catalog.require(&self.selector)?;
		let messages = build_annotation_messages(view);
		let fragments = model.send_request(messages, cancel.clone()).await?;
		let mut records = pin!(AnnotationStream::new(
			fragments.into_stream(),
			self.extractor.clone()
		));
		let mut report = AnnotationReport::default();

		while let Some(record) = records.next().await {
			let record = record?;
			match session.apply(view, &record) {
				Ok(()) => report.applied += 1,
				Err(e) => {
					warn!(line = record.line, error = %e, "skipping annotation");
					report.skipped += 1;
				}
			}
		}

		report.cancelled = cancel.is_cancelled();
		report.extraction = records.stats();
		report.trailing_bytes = records.trailing_bytes();

		if report.cancelled {
			debug!(applied = report.applied, "annotation pass cancelled");
		}
		info!(
			applied = report.applied,
			skipped = report.skipped,
			rejected = report.extraction.rejected,
			trailing_bytes = report.trailing_bytes,
			"annotation pass finished"
		);
		Ok(report)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::decoration::tests::RecordingDecorator;
	use crate::decoration::{Decoration, DecorationError};
	use crate::record::ShapePolicy;
	use crate::TriggerMode;
	use tutor_common_core::testing::ScriptedLlmClient;
	use tutor_common_core::{ChatModel, LlmError, ModelRegistry, Role, TutorError};

	const SOURCE: &str = "i = 0\nwhile i < 3:\n    print(i)\n    i += 1\n";

	fn annotator(client: ScriptedLlmClient) -> Annotator {
		let mut registry = ModelRegistry::new();
		registry.register(ChatModel::new("openai", "gpt-4o", "gpt-4o", Arc::new(client)));
		Annotator::new(Arc::new(registry), ModelSelector::new("openai", "gpt-4o"))
	}

	#[tokio::test]
	async fn applies_streamed_records_to_session() {
		let client = ScriptedLlmClient::new([
			"{ \"line\": 2, \"suggestion\": \"Use a for loop ",
			"with range(3).\" }{ \"line\"",
			": 4, \"suggestion\": \"Not needed with a for loop.\" }",
		]);
		let annotator = annotator(client.clone());
		let view = CodeView::new("python", SOURCE);
		let mut session = AnnotationSession::new(RecordingDecorator::default());

		let report = annotator
			.annotate(&view, &mut session, CancellationToken::new())
			.await
			.unwrap();

		assert_eq!(report.applied, 2);
		assert_eq!(report.skipped, 0);
		assert!(!report.cancelled);
		let lines: Vec<u32> = session.decorator().live.values().map(|d| d.line).collect();
		assert_eq!(lines, vec![2, 4]);

		let requests = client.requests();
		assert_eq!(requests.len(), 1);
		assert_eq!(requests[0].messages.len(), 3);
		assert!(requests[0].messages.iter().all(|m| m.role == Role::User));
		assert!(requests[0].messages[2].content.starts_with("1: i = 0 \n"));
	}

	#[tokio::test]
	async fn missing_model_is_reported() {
		let annotator = Annotator::new(
			Arc::new(ModelRegistry::new()),
			ModelSelector::new("copilot", "gpt-4o"),
		);
		let view = CodeView::new("python", SOURCE);
		let mut session = AnnotationSession::new(RecordingDecorator::default());

		let err = annotator
			.annotate(&view, &mut session, CancellationToken::new())
			.await
			.unwrap_err();
		assert!(matches!(err, TutorError::NoModelAvailable { .. }));
	}

	#[tokio::test]
	async fn new_pass_clears_previous_decorations() {
		let client = ScriptedLlmClient::new(["{\"line\": 1, \"suggestion\": \"a\"}"]);
		let annotator = annotator(client);
		let view = CodeView::new("python", SOURCE);
		let mut session = AnnotationSession::new(RecordingDecorator::default());

		annotator
			.annotate(&view, &mut session, CancellationToken::new())
			.await
			.unwrap();
		annotator
			.annotate(&view, &mut session, CancellationToken::new())
			.await
			.unwrap();

		assert_eq!(session.len(), 1);
		assert_eq!(session.decorator().disposed, 1);
	}

	#[tokio::test]
	async fn legacy_records_outside_document_are_skipped() {
		let client = ScriptedLlmClient::new([
			"{\"foo\": \"bar\"}",
			"{\"line\": 99, \"suggestion\": \"far away\"}",
			"{\"line\": 1, \"suggestion\": \"ok\"}",
		]);
		let annotator = annotator(client).with_extractor_config(
			ExtractorConfig::default()
				.with_trigger(TriggerMode::ClosingBrace)
				.with_shape_policy(ShapePolicy::Legacy),
		);
		let view = CodeView::new("python", SOURCE);
		let mut session = AnnotationSession::new(RecordingDecorator::default());

		let report = annotator
			.annotate(&view, &mut session, CancellationToken::new())
			.await
			.unwrap();

		assert_eq!(report.applied, 1);
		assert_eq!(report.skipped, 2);
		assert_eq!(report.extraction.emitted, 3);
	}

	#[tokio::test]
	async fn trailing_text_is_dropped_silently() {
		let client = ScriptedLlmClient::new(["{\"line\": 1, \"suggestion\": \"a\"}", "{\"line\": 2,"]);
		let annotator = annotator(client);
		let view = CodeView::new("python", SOURCE);
		let mut session = AnnotationSession::new(RecordingDecorator::default());

		let report = annotator
			.annotate(&view, &mut session, CancellationToken::new())
			.await
			.unwrap();

		assert_eq!(report.applied, 1);
		assert_eq!(report.trailing_bytes, "{\"line\": 2,".len());
	}

	#[tokio::test]
	async fn stream_errors_propagate() {
		let client = ScriptedLlmClient::new(["{\"line\": 1, \"suggestion\": \"a\"}"])
			.failing_with(LlmError::Api("overloaded".to_string()));
		let annotator = annotator(client);
		let view = CodeView::new("python", SOURCE);
		let mut session = AnnotationSession::new(RecordingDecorator::default());

		let err = annotator
			.annotate(&view, &mut session, CancellationToken::new())
			.await
			.unwrap_err();
		assert!(matches!(err, TutorError::Llm(LlmError::Api(_))));
		assert_eq!(session.len(), 1);
	}

	/// Cancels the pass as soon as the first decoration lands.
	struct CancelOnFirst {
		inner: RecordingDecorator,
		cancel: CancellationToken,
	}

	impl Decorator for CancelOnFirst {
		type Handle = usize;

		fn decorate(&mut self, decoration: &Decoration) -> Result<usize, DecorationError> {
			let handle = self.inner.decorate(decoration)?;
			self.cancel.cancel();
			Ok(handle)
		}

		fn dispose(&mut self, handle: usize) {
			self.inner.dispose(handle);
		}
	}

	#[tokio::test]
	async fn cancelling_mid_stream_keeps_applied_records() {
		let client = ScriptedLlmClient::new([
			"{\"line\": 1, \"suggestion\": \"a\"}",
			"{\"line\": 2, \"suggestion\": \"b\"}",
			"{\"line\": 3, \"suggestion\": \"c\"}",
		]);
		let annotator = annotator(client);
		let view = CodeView::new("python", SOURCE);
		let cancel = CancellationToken::new();
		let mut session = AnnotationSession::new(CancelOnFirst {
			inner: RecordingDecorator::default(),
			cancel: cancel.clone(),
		});

		let report = annotator.annotate(&view, &mut session, cancel).await.unwrap();

		assert!(report.cancelled);
		assert_eq!(report.applied, 1);
		assert_eq!(report.extraction.fragments, 1);
		assert_eq!(session.len(), 1);
		let lines: Vec<u32> = session.decorator().inner.live.values().map(|d| d.line).collect();
		assert_eq!(lines, vec![1]);
	}

	#[tokio::test]
	async fn cancelled_pass_applies_nothing() {
		let client = ScriptedLlmClient::new(["{\"line\": 1, \"suggestion\": \"a\"}"]);
		let annotator = annotator(client);
		let view = CodeView::new("python", SOURCE);
		let mut session = AnnotationSession::new(RecordingDecorator::default());
		let cancel = CancellationToken::new();
		cancel.cancel();

		let report = annotator.annotate(&view, &mut session, cancel).await.unwrap();
		assert!(report.cancelled);
		assert_eq!(report.applied, 0);
		assert!(session.is_empty());
	}
}
