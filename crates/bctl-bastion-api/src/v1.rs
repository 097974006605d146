// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use bctl_common_secret::SecretString;
use serde_json::json;
use tracing::instrument;

use crate::error::{ApiError, ApiResult};
use crate::rest::{ApiVersion, RestClient};
use crate::types::{
	agent_labels, AgentManifestRequestV1, AgentYaml, ClusterV1, PolicyV1, UserSummary,
};

/// Client for `/api/v1`.
#[derive(Debug, Clone)]
pub struct V1Client {
	rest: RestClient,
}

impl V1Client {
	pub fn new(service_url: &str, api_key: SecretString) -> ApiResult<Self> {
		Ok(Self {
			rest: RestClient::new(service_url, ApiVersion::V1, api_key)?,
		})
	}

	pub fn from_rest(rest: RestClient) -> Self {
		Self { rest }
	}

	/// `POST kube/get-user`
	#[instrument(skip(self))]
	pub async fn get_user(&self, email: &str) -> ApiResult<UserSummary> {
		self.rest
			.post(&["kube", "get-user"], &json!({ "email": email }))
			.await
	}

	/// `POST Policy/list`
	pub async fn list_policies(&self) -> ApiResult<Vec<PolicyV1>> {
		self.rest.post(&["Policy", "list"], &json!({})).await
	}

	/// `POST Policy/edit`
	#[instrument(skip(self, policy), fields(policy = %policy.name))]
	pub async fn edit_policy(&self, policy: &PolicyV1) -> ApiResult<()> {
		let body = policy.to_edit_body().map_err(|source| ApiError::Encode {
			endpoint: "Policy/edit".to_string(),
			source,
		})?;
		self.rest.post_unit(&["Policy", "edit"], &body).await
	}

	/// `GET kube/list`
	pub async fn list_clusters(&self) -> ApiResult<Vec<ClusterV1>> {
		self.rest.get(&["kube", "list"]).await
	}

	/// `POST kube/get-agent-yaml` with the standard [`agent_labels`].
	#[instrument(skip(self))]
	pub async fn get_agent_yaml(&self, cluster_name: &str, namespace: &str) -> ApiResult<String> {
		let request = AgentManifestRequestV1 {
			cluster_name: cluster_name.to_string(),
			labels: agent_labels(cluster_name),
			namespace: namespace.to_string(),
		};
		let response: AgentYaml = self.rest.post(&["kube", "get-agent-yaml"], &request).await?;
		Ok(response.yaml)
	}
}
