// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `/api/v2`: users and groups are flat arrays on the policy.

use async_trait::async_trait;
use bctl_bastion_api::{
	agent_labels, ClusterGroup, ClusterUser, CreateKubeTargetRequest, KubernetesPolicy, SubjectRef,
	V2Client,
};
use tracing::debug;

use super::{AgentRecord, AgentRegistry, ManifestSource, PolicyDocument, PolicySchema};
use crate::error::{QuickstartError, Result};

pub struct V2Schema {
	client: V2Client,
}

impl V2Schema {
	pub fn new(client: V2Client) -> Self {
		Self { client }
	}

	async fn environment_id(&self, name: &str) -> Result<String> {
		self.client
			.list_environments()
			.await?
			.into_iter()
			.find(|e| e.name == name)
			.map(|e| e.id)
			.ok_or_else(|| QuickstartError::EnvironmentNotFound {
				name: name.to_string(),
			})
	}
}

impl PolicyDocument for KubernetesPolicy {
	fn id(&self) -> &str {
		&self.id
	}

	fn name(&self) -> &str {
		&self.name
	}

	fn has_subject(&self, id: &str) -> bool {
		self.subjects.iter().any(|s| s.id == id)
	}

	fn push_subject(&mut self, subject: SubjectRef) {
		self.subjects.push(subject);
	}

	fn has_cluster_user(&self, name: &str) -> bool {
		self.cluster_users.iter().any(|u| u.name == name)
	}

	fn push_cluster_user(&mut self, name: &str) {
		self.cluster_users.push(ClusterUser {
			name: name.to_string(),
		});
	}

	fn has_cluster_group(&self, name: &str) -> bool {
		self.cluster_groups.iter().any(|g| g.name == name)
	}

	fn push_cluster_group(&mut self, name: &str) {
		self.cluster_groups.push(ClusterGroup {
			name: name.to_string(),
		});
	}
}

#[async_trait]
impl PolicySchema for V2Schema {
	type Policy = KubernetesPolicy;

	fn label(&self) -> &'static str {
		"v2"
	}

	async fn list_policies(&self) -> Result<Vec<KubernetesPolicy>> {
		Ok(self.client.list_kubernetes_policies().await?)
	}

	/// Looks the email up as a subject; older control planes only know
	/// `users/{email}`, so a 404 falls back to that endpoint.
	async fn resolve_subject(&self, email: &str) -> Result<SubjectRef> {
		match self.client.get_subject(email).await {
			Ok(subject) => Ok(subject.into()),
			Err(err) if err.is_not_found() => {
				debug!(email = %email, "subject lookup returned 404, trying users endpoint");
				let user = self.client.get_user(email).await?;
				Ok(SubjectRef::user(user.id))
			}
			Err(err) => Err(err.into()),
		}
	}

	async fn write_policy(&self, policy: &KubernetesPolicy) -> Result<()> {
		Ok(self.client.update_kubernetes_policy(policy).await?)
	}
}

#[async_trait]
impl AgentRegistry for V2Schema {
	async fn list_agents(&self) -> Result<Vec<AgentRecord>> {
		Ok(self
			.client
			.list_kube_targets()
			.await?
			.into_iter()
			.map(|t| AgentRecord {
				name: t.name,
				status: t.status,
			})
			.collect())
	}
}

#[async_trait]
impl ManifestSource for V2Schema {
	async fn agent_manifest(
		&self,
		cluster_name: &str,
		namespace: &str,
		environment: Option<&str>,
	) -> Result<String> {
		let environment_id = match environment {
			Some(name) => Some(self.environment_id(name).await?),
			None => None,
		};
		let request = CreateKubeTargetRequest {
			name: cluster_name.to_string(),
			namespace: namespace.to_string(),
			labels: agent_labels(cluster_name),
			environment_id,
		};
		Ok(self.client.create_kube_target(&request).await?)
	}
}
