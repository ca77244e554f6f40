// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Inline code annotation for the code tutor.
//!
//! The model is asked to answer with back-to-back JSON objects shaped
//! `{"line": N, "suggestion": "..."}`. This crate provides:
//! - [`AnnotationExtractor`], which pulls complete records out of an
//!   arbitrarily chunked token stream
//! - [`AnnotationSession`], which owns the decorations created for one pass
//! - [`Annotator`], which wires model selection, prompting, extraction and
//!   decoration together

mod annotator;
mod code;
mod decoration;
mod extractor;
mod prompt;
mod record;
mod stream;

pub use annotator::{AnnotationReport, Annotator};
pub use code::{language_id_for_path, CodeView};
pub use decoration::{
	AnnotationSession, Decoration, DecorationError, Decorator, DEFAULT_MAX_DECORATIONS,
	DEFAULT_PREVIEW_CHARS,
};
pub use extractor::{AnnotationExtractor, ExtractorConfig, ExtractorStats, TriggerMode};
pub use prompt::{build_annotation_messages, ANNOTATION_PROMPT};
pub use record::{parse_attempt, validate_shape, AnnotationRecord, ShapePolicy};
pub use stream::AnnotationStream;
