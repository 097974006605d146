// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client for the BastionZero control plane.
//!
//! Two API generations are supported side by side:
//! - [`V1Client`]: `/api/v1`, POST-heavy, policies carry a nested `context` map
//! - [`V2Client`]: `/api/v2`, REST-style, policies carry flat arrays
//!
//! Both authenticate with a static key in the `X-API-KEY` header and share the
//! same response convention: a JSON object with an `errorType` field is a
//! failure even when the HTTP status is 200.

mod error;
mod rest;
pub mod types;
mod v1;
mod v2;

pub use error::{ApiError, ApiResult};
pub use rest::{check_envelope, ApiVersion, RestClient, API_KEY_HEADER};
pub use types::{
	agent_labels, AgentManifestRequestV1, AgentYaml, ClusterGroup, ClusterUser, ClusterV1,
	CreateKubeTargetRequest, Environment, KubeTarget, KubernetesPolicy, PolicyContextV1, PolicyV1,
	SubjectRef, SubjectSummary, UserSummary, STATUS_ONLINE, SUBJECT_TYPE_USER,
};
pub use v1::V1Client;
pub use v2::V2Client;
