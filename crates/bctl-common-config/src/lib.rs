// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration primitives shared by the quickstart crates.
//!
//! - [`Secret<T>`] re-exported from [`bctl_common_secret`]
//! - [`load_secret_env`] / [`require_secret_env`] for `VAR` / `VAR_FILE` secrets
//! - [`service_url`] for the control plane host override

pub mod env;

pub use bctl_common_secret::{Secret, SecretString, REDACTED};

pub use env::{
	load_secret_env, require_secret_env, service_url, RequiredSecretError, SecretEnvError,
	DEFAULT_SERVICE_URL, SERVICE_URL_VAR,
};
