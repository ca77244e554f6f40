// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

pub mod error;
pub mod llm;
pub mod message;
pub mod model;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use error::*;
pub use llm::*;
pub use message::*;
pub use model::*;
