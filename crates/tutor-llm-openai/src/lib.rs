// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! OpenAI-compatible chat completion client.
//!
//! Works against any server that speaks the `/chat/completions` protocol with
//! server-sent events.

mod client;
mod stream;
mod types;

pub use client::OpenAIClient;
pub use stream::OpenAIStream;
pub use types::*;
