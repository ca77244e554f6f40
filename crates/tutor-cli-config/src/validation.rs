// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Checks on the resolved configuration.

use crate::error::ConfigError;
use crate::runtime::TutorConfig;

pub fn validate(config: &TutorConfig) -> Result<(), ConfigError> {
	if config.model.vendor.trim().is_empty() {
		return Err(ConfigError::validation("model.vendor must not be empty"));
	}
	if config.model.family.trim().is_empty() {
		return Err(ConfigError::validation("model.family must not be empty"));
	}

	let base_url = &config.provider.base_url;
	if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
		return Err(ConfigError::invalid_value(
			"provider.base_url",
			format!("'{base_url}' is not an http(s) URL"),
		));
	}

	if config.annotation.max_decorations == 0 {
		return Err(ConfigError::validation(
			"annotation.max_decorations must be at least 1",
		));
	}
	if config.annotation.preview_chars == 0 {
		return Err(ConfigError::validation(
			"annotation.preview_chars must be at least 1",
		));
	}
	if config.annotation.max_buffer_bytes == Some(0) {
		return Err(ConfigError::validation(
			"annotation.max_buffer_bytes must be at least 1 when set",
		));
	}

	Ok(())
}
