// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP client construction.
//!
//! Every request the quickstart makes to the control plane goes through a
//! client built here so the User-Agent and timeouts stay consistent.

mod client;

pub use client::{builder, new_client, new_client_with_timeout, user_agent, DEFAULT_REQUEST_TIMEOUT};
