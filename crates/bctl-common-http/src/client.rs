// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// Per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Builder preloaded with the quickstart User-Agent.
pub fn builder() -> ClientBuilder {
	Client::builder().user_agent(user_agent())
}

/// Client with the default request timeout.
pub fn new_client() -> Result<Client, reqwest::Error> {
	new_client_with_timeout(DEFAULT_REQUEST_TIMEOUT)
}

pub fn new_client_with_timeout(timeout: Duration) -> Result<Client, reqwest::Error> {
	builder().timeout(timeout).build()
}

/// `bctl-quickstart/{version}`
pub fn user_agent() -> String {
	format!("bctl-quickstart/{}", env!("CARGO_PKG_VERSION"))
}
