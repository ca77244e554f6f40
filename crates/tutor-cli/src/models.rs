// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Builds the model catalog from configuration.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tutor_cli_config::TutorConfig;
use tutor_common_core::{ChatModel, ModelRegistry, ModelSelector};
use tutor_llm_openai::{OpenAIClient, OpenAIConfig};

/// Vendor name the configured HTTP provider registers under.
pub const PROVIDER_VENDOR: &str = "openai";

/// Registers the configured provider under the `openai` vendor and the
/// configured family, if it has credentials.
///
/// Without an API key the registry stays empty and every request fails with
/// `NoModelAvailable`.
pub fn build_registry(config: &TutorConfig) -> Result<ModelRegistry> {
	let mut registry = ModelRegistry::new();

	let Some(api_key) = &config.provider.api_key else {
		warn!("no API key configured; set OPENAI_API_KEY or provider.api_key");
		return Ok(registry);
	};

	let model_name = config
		.provider
		.model
		.clone()
		.unwrap_or_else(|| config.model.family.clone());

	let mut client_config = OpenAIConfig::new(api_key.expose())
		.with_base_url(&config.provider.base_url)
		.with_model(&model_name);
	if let Some(org) = &config.provider.organization {
		client_config = client_config.with_organization(org);
	}

	let client = OpenAIClient::new(client_config).context("failed to create HTTP client")?;
	info!(model = %model_name, base_url = %config.provider.base_url, "provider registered");

	registry.register(ChatModel::new(
		PROVIDER_VENDOR,
		&config.model.family,
		model_name,
		Arc::new(client),
	));
	Ok(registry)
}

pub fn selector(config: &TutorConfig) -> ModelSelector {
	ModelSelector::new(&config.model.vendor, &config.model.family)
}

#[cfg(test)]
mod tests {
	use super::*;
	use tutor_cli_config::SecretString;
	use tutor_common_core::ModelCatalog;

	#[test]
	fn no_api_key_means_no_models() {
		let registry = build_registry(&TutorConfig::default()).unwrap();
		assert!(registry.is_empty());
	}

	#[test]
	fn provider_is_selectable_by_default_selector() {
		let mut config = TutorConfig::default();
		config.provider.api_key = Some(SecretString::new("sk-test"));
		let registry = build_registry(&config).unwrap();

		assert_eq!(registry.len(), 1);
		let model = registry.select(&selector(&config)).unwrap();
		assert_eq!(model.name(), "gpt-4o");
	}

	#[test]
	fn provider_model_overrides_wire_name() {
		let mut config = TutorConfig::default();
		config.provider.api_key = Some(SecretString::new("sk-test"));
		config.provider.model = Some("gpt-4o-2024-08-06".to_string());
		let registry = build_registry(&config).unwrap();

		let model = registry.select(&selector(&config)).unwrap();
		assert_eq!(model.family(), "gpt-4o");
		assert_eq!(model.name(), "gpt-4o-2024-08-06");
	}

	#[test]
	fn other_vendor_does_not_match() {
		let mut config = TutorConfig::default();
		config.provider.api_key = Some(SecretString::new("sk-test"));
		let registry = build_registry(&config).unwrap();

		config.model.vendor = "copilot".to_string();
		assert!(registry.select(&selector(&config)).is_none());
	}
}
