// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request plumbing shared by the v1 and v2 clients.

use std::fmt;
use std::str::FromStr;

use bctl_common_secret::SecretString;
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::error::{ApiError, ApiResult};

pub const API_KEY_HEADER: &str = "X-API-KEY";

/// Which generation of the control plane API to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiVersion {
	V1,
	#[default]
	V2,
}

impl ApiVersion {
	pub fn path(&self) -> &'static str {
		match self {
			ApiVersion::V1 => "api/v1",
			ApiVersion::V2 => "api/v2",
		}
	}
}

impl fmt::Display for ApiVersion {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ApiVersion::V1 => f.write_str("v1"),
			ApiVersion::V2 => f.write_str("v2"),
		}
	}
}

impl FromStr for ApiVersion {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"v1" | "1" => Ok(ApiVersion::V1),
			"v2" | "2" => Ok(ApiVersion::V2),
			other => Err(format!("unknown API version '{other}', expected v1 or v2")),
		}
	}
}

/// Authenticated JSON client rooted at `{service_url}/api/{version}`.
#[derive(Clone)]
pub struct RestClient {
	http: Client,
	base_url: Url,
	api_key: SecretString,
}

impl fmt::Debug for RestClient {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RestClient")
			.field("base_url", &self.base_url.as_str())
			.field("api_key", &self.api_key)
			.finish()
	}
}

impl RestClient {
	pub fn new(service_url: &str, version: ApiVersion, api_key: SecretString) -> ApiResult<Self> {
		let http = bctl_common_http::new_client()?;
		Self::with_http_client(http, service_url, version, api_key)
	}

	pub fn with_http_client(
		http: Client,
		service_url: &str,
		version: ApiVersion,
		api_key: SecretString,
	) -> ApiResult<Self> {
		let root = format!("{}/{}", service_url.trim_end_matches('/'), version.path());
		let base_url = Url::parse(&root).map_err(|e| ApiError::InvalidUrl(format!("{root}: {e}")))?;
		if base_url.cannot_be_a_base() {
			return Err(ApiError::InvalidUrl(root));
		}

		Ok(Self {
			http,
			base_url,
			api_key,
		})
	}

	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	/// Append path segments to the base URL. Segments are percent-encoded, so
	/// an email address can be passed as-is.
	pub fn url(&self, segments: &[&str]) -> ApiResult<Url> {
		let mut url = self.base_url.clone();
		url.path_segments_mut()
			.map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
			.pop_if_empty()
			.extend(segments);
		Ok(url)
	}

	pub async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> ApiResult<T> {
		let value = self.send(Method::GET, segments, None).await?;
		decode(segments, value)
	}

	pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
		&self,
		segments: &[&str],
		body: &B,
	) -> ApiResult<T> {
		let body = encode(segments, body)?;
		let value = self.send(Method::POST, segments, Some(body)).await?;
		decode(segments, value)
	}

	/// POST whose response body is not needed beyond the envelope check.
	pub async fn post_unit<B: Serialize + ?Sized>(&self, segments: &[&str], body: &B) -> ApiResult<()> {
		let body = encode(segments, body)?;
		self.send(Method::POST, segments, Some(body)).await?;
		Ok(())
	}

	pub async fn patch_unit<B: Serialize + ?Sized>(&self, segments: &[&str], body: &B) -> ApiResult<()> {
		let body = encode(segments, body)?;
		self.send(Method::PATCH, segments, Some(body)).await?;
		Ok(())
	}

	async fn send(&self, method: Method, segments: &[&str], body: Option<Value>) -> ApiResult<Value> {
		let endpoint = segments.join("/");
		let url = self.url(segments)?;
		debug!(method = %method, endpoint = %endpoint, "control plane request");

		let mut request = self
			.http
			.request(method, url)
			.header(API_KEY_HEADER, self.api_key.expose().as_str())
			.header(reqwest::header::CONTENT_TYPE, "application/json");
		if let Some(body) = body {
			request = request.body(body.to_string());
		}

		let response = request.send().await?;
		let status = response.status();
		let text = response.text().await?;

		if !status.is_success() {
			error!(endpoint = %endpoint, status = status.as_u16(), "control plane request failed");
			return Err(ApiError::Status {
				endpoint,
				status: status.as_u16(),
				body: text,
			});
		}

		if text.trim().is_empty() {
			return Ok(Value::Null);
		}

		let value: Value = serde_json::from_str(&text).map_err(|source| ApiError::Decode {
			endpoint: endpoint.clone(),
			source,
		})?;
		check_envelope(&endpoint, value)
	}
}

/// Reject responses shaped like `{"errorType": ..., "errorMsg": ...}`.
///
/// Arrays and objects without `errorType` pass through untouched.
pub fn check_envelope(endpoint: &str, value: Value) -> ApiResult<Value> {
	if let Some(obj) = value.as_object() {
		if let Some(error_type) = obj.get("errorType") {
			let error_type = match error_type {
				Value::String(s) => s.clone(),
				other => other.to_string(),
			};
			let message = obj
				.get("errorMsg")
				.and_then(Value::as_str)
				.unwrap_or_default()
				.to_string();
			error!(endpoint = %endpoint, error_type = %error_type, error = %message, "control plane returned an error");
			return Err(ApiError::Application {
				endpoint: endpoint.to_string(),
				error_type,
				message,
			});
		}
	}
	Ok(value)
}

fn encode<B: Serialize + ?Sized>(segments: &[&str], body: &B) -> ApiResult<Value> {
	serde_json::to_value(body).map_err(|source| ApiError::Encode {
		endpoint: segments.join("/"),
		source,
	})
}

fn decode<T: DeserializeOwned>(segments: &[&str], value: Value) -> ApiResult<T> {
	serde_json::from_value(value).map_err(|source| ApiError::Decode {
		endpoint: segments.join("/"),
		source,
	})
}
