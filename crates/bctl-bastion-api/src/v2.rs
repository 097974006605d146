// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use bctl_common_secret::SecretString;
use tracing::instrument;

use crate::error::ApiResult;
use crate::rest::{ApiVersion, RestClient};
use crate::types::{
	AgentYaml, CreateKubeTargetRequest, Environment, KubeTarget, KubernetesPolicy, SubjectSummary,
	UserSummary,
};

/// Client for `/api/v2`.
#[derive(Debug, Clone)]
pub struct V2Client {
	rest: RestClient,
}

impl V2Client {
	pub fn new(service_url: &str, api_key: SecretString) -> ApiResult<Self> {
		Ok(Self {
			rest: RestClient::new(service_url, ApiVersion::V2, api_key)?,
		})
	}

	pub fn from_rest(rest: RestClient) -> Self {
		Self { rest }
	}

	/// `GET subjects/{email}`
	#[instrument(skip(self))]
	pub async fn get_subject(&self, email: &str) -> ApiResult<SubjectSummary> {
		self.rest.get(&["subjects", email]).await
	}

	/// `GET users/{email}`
	#[instrument(skip(self))]
	pub async fn get_user(&self, email: &str) -> ApiResult<UserSummary> {
		self.rest.get(&["users", email]).await
	}

	/// `GET policies/kubernetes`
	pub async fn list_kubernetes_policies(&self) -> ApiResult<Vec<KubernetesPolicy>> {
		self.rest.get(&["policies", "kubernetes"]).await
	}

	/// `PATCH policies/kubernetes/{id}` with the whole policy as body.
	#[instrument(skip(self, policy), fields(policy = %policy.name, id = %policy.id))]
	pub async fn update_kubernetes_policy(&self, policy: &KubernetesPolicy) -> ApiResult<()> {
		self.rest
			.patch_unit(&["policies", "kubernetes", policy.id.as_str()], policy)
			.await
	}

	/// `GET targets/kube`
	pub async fn list_kube_targets(&self) -> ApiResult<Vec<KubeTarget>> {
		self.rest.get(&["targets", "kube"]).await
	}

	/// `POST targets/kube`, returning the generated agent manifest.
	#[instrument(skip(self, request), fields(target = %request.name))]
	pub async fn create_kube_target(&self, request: &CreateKubeTargetRequest) -> ApiResult<String> {
		let response: AgentYaml = self.rest.post(&["targets", "kube"], request).await?;
		Ok(response.yaml)
	}

	/// `GET environments`
	pub async fn list_environments(&self) -> ApiResult<Vec<Environment>> {
		self.rest.get(&["environments"]).await
	}
}
