// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Environment variable helpers.
//!
//! Helm charts usually hand the API key to the job through a Kubernetes
//! secret, either as a plain env var or mounted as a file. Both are supported
//! using the `VAR` / `VAR_FILE` convention.

use std::path::PathBuf;
use std::{env, fs};

use bctl_common_secret::Secret;
use thiserror::Error;

/// Env var that overrides the control plane host.
pub const SERVICE_URL_VAR: &str = "SERVICE_URL";

/// Control plane host used when `SERVICE_URL` is unset.
pub const DEFAULT_SERVICE_URL: &str = "https://cloud.bastionzero.com";

#[derive(Debug, Error)]
pub enum SecretEnvError {
	#[error("failed to read secret file at {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("secret file path in {var} is empty")]
	EmptyPath { var: String },
}

/// Load a secret from `{var}_FILE` (preferred) or `{var}`.
///
/// A single trailing newline is stripped from file contents. Returns
/// `Ok(None)` when neither variable is set.
pub fn load_secret_env(var: &str) -> Result<Option<Secret<String>>, SecretEnvError> {
	let file_var = format!("{var}_FILE");

	if let Ok(path_str) = env::var(&file_var) {
		if path_str.is_empty() {
			return Err(SecretEnvError::EmptyPath { var: file_var });
		}

		let path = PathBuf::from(&path_str);
		let content = fs::read_to_string(&path).map_err(|e| SecretEnvError::Io {
			path: path.clone(),
			source: e,
		})?;

		let secret = content.strip_suffix('\n').unwrap_or(&content).to_string();
		return Ok(Some(Secret::new(secret)));
	}

	if let Ok(value) = env::var(var) {
		return Ok(Some(Secret::new(value)));
	}

	Ok(None)
}

/// Like [`load_secret_env`] but errors when the secret is absent.
pub fn require_secret_env(var: &str) -> Result<Secret<String>, RequiredSecretError> {
	load_secret_env(var)
		.map_err(RequiredSecretError::Load)?
		.ok_or_else(|| RequiredSecretError::Missing {
			var: var.to_string(),
			file_var: format!("{var}_FILE"),
		})
}

#[derive(Debug, Error)]
pub enum RequiredSecretError {
	#[error("required secret not found: set either {var} or {file_var}")]
	Missing { var: String, file_var: String },

	#[error(transparent)]
	Load(#[from] SecretEnvError),
}

/// Resolve the control plane host: `SERVICE_URL` if set and non-empty,
/// otherwise [`DEFAULT_SERVICE_URL`]. Trailing slashes are removed.
pub fn service_url() -> String {
	let raw = env::var(SERVICE_URL_VAR)
		.ok()
		.filter(|v| !v.trim().is_empty())
		.unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string());
	raw.trim().trim_end_matches('/').to_string()
}
