// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Stream adapter from response fragments to annotation records.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use pin_project_lite::pin_project;
use tracing::trace;

use crate::extractor::{AnnotationExtractor, ExtractorConfig, ExtractorStats};
use crate::record::AnnotationRecord;

pin_project! {
		/// Stream adapter that turns response fragments into annotation records.
		///
		/// Upstream errors are passed through unchanged. Trailing text that never
		/// formed a record is dropped when the upstream ends.
		pub struct AnnotationStream<S> {
				#[pin]
				inner: S,
				extractor: Option<AnnotationExtractor>,
				pending: VecDeque<AnnotationRecord>,
				stats: ExtractorStats,
				trailing_bytes: usize,
		}
}

impl<S> AnnotationStream<S> {
	pub fn new(inner: S, config: ExtractorConfig) -> Self {
		Self {
			inner,
			extractor: Some(AnnotationExtractor::new(config)),
			pending: VecDeque::new(),
			stats: ExtractorStats::default(),
			trailing_bytes: 0,
		}
	}

	/// Extraction counters up to the last fragment consumed.
	pub fn stats(&self) -> ExtractorStats {
		self.stats
	}

	/// Bytes of unparsed text dropped when the upstream ended.
	pub fn trailing_bytes(&self) -> usize {
		self.trailing_bytes
	}
}

impl<S, E> Stream for AnnotationStream<S>
where
	S: Stream<Item = Result<String, E>>,
{
	type Item = Result<AnnotationRecord, E>;

	fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
		let mut this = self.project();

		loop {
			if let Some(record) = this.pending.pop_front() {
				return Poll::Ready(Some(Ok(record)));
			}

			if this.extractor.is_none() {
				return Poll::Ready(None);
			}

			match this.inner.as_mut().poll_next(cx) {
				Poll::Ready(Some(Ok(fragment))) => {
					if let Some(extractor) = this.extractor.as_mut() {
						this.pending.extend(extractor.push(&fragment));
						*this.stats = extractor.stats();
					}
				}
				Poll::Ready(Some(Err(e))) => return Poll::Ready(Some(Err(e))),
				Poll::Ready(None) => {
					if let Some(extractor) = this.extractor.take() {
						*this.stats = extractor.stats();
						*this.trailing_bytes = extractor.finish().map(|t| t.len()).unwrap_or(0);
						trace!(
								emitted = this.stats.emitted,
								trailing_bytes = *this.trailing_bytes,
								"fragment stream ended"
						);
					}
					return Poll::Ready(None);
				}
				Poll::Pending => return Poll::Pending,
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use futures::StreamExt;

	#[tokio::test]
	async fn yields_records_across_fragments() {
		let fragments: Vec<Result<String, std::io::Error>> = vec![
			Ok("{\"line\": 1, \"sugg".to_string()),
			Ok("estion\": \"a\"}{\"line\": 2, \"suggestion\": \"b\"}".to_string()),
			Ok("{\"line\": 3".to_string()),
		];

		let mut stream =
			AnnotationStream::new(futures::stream::iter(fragments), ExtractorConfig::default());
		let mut records = Vec::new();
		while let Some(record) = stream.next().await {
			records.push(record.unwrap());
		}

		assert_eq!(
			records,
			vec![AnnotationRecord::new(1, "a"), AnnotationRecord::new(2, "b")]
		);
		assert_eq!(stream.stats().fragments, 3);
		assert_eq!(stream.stats().emitted, 2);
		assert_eq!(stream.trailing_bytes(), "{\"line\": 3".len());
	}

	#[tokio::test]
	async fn passes_upstream_errors_through() {
		let fragments: Vec<Result<String, String>> = vec![
			Ok("{\"line\": 1, \"suggestion\": \"a\"}".to_string()),
			Err("connection reset".to_string()),
		];

		let mut stream =
			AnnotationStream::new(futures::stream::iter(fragments), ExtractorConfig::default());

		assert_eq!(stream.next().await, Some(Ok(AnnotationRecord::new(1, "a"))));
		assert_eq!(stream.next().await, Some(Err("connection reset".to_string())));
		assert_eq!(stream.next().await, None);
		assert_eq!(stream.next().await, None);
	}
}
