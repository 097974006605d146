// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Errors returned by the control plane client.
#[derive(Debug, Error)]
pub enum ApiError {
	#[error("HTTP request failed: {0}")]
	Request(#[from] reqwest::Error),

	#[error("{endpoint} returned HTTP {status}: {body}")]
	Status {
		endpoint: String,
		status: u16,
		body: String,
	},

	/// The control plane answered with an `errorType` envelope.
	#[error("{endpoint} failed with {error_type}: {message}")]
	Application {
		endpoint: String,
		error_type: String,
		message: String,
	},

	#[error("failed to decode response from {endpoint}: {source}")]
	Decode {
		endpoint: String,
		#[source]
		source: serde_json::Error,
	},

	#[error("failed to encode request for {endpoint}: {source}")]
	Encode {
		endpoint: String,
		#[source]
		source: serde_json::Error,
	},

	#[error("invalid service URL: {0}")]
	InvalidUrl(String),
}

impl ApiError {
	/// True for a 404 from the control plane.
	pub fn is_not_found(&self) -> bool {
		matches!(self, ApiError::Status { status: 404, .. })
	}
}
