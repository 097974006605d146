// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `/api/v1`: users and groups live in the policy's `context` map.

use async_trait::async_trait;
use bctl_bastion_api::{ClusterGroup, ClusterUser, PolicyV1, SubjectRef, V1Client};
use tracing::warn;

use super::{AgentRecord, AgentRegistry, ManifestSource, PolicyDocument, PolicySchema};
use crate::error::Result;

pub struct V1Schema {
	client: V1Client,
}

impl V1Schema {
	pub fn new(client: V1Client) -> Self {
		Self { client }
	}
}

impl PolicyDocument for PolicyV1 {
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
		self.context.cluster_users.contains_key(name)
	}

	fn push_cluster_user(&mut self, name: &str) {
		self.context.cluster_users.insert(
			name.to_string(),
			ClusterUser {
				name: name.to_string(),
			},
		);
	}

	fn has_cluster_group(&self, name: &str) -> bool {
		self.context.cluster_groups.contains_key(name)
	}

	fn push_cluster_group(&mut self, name: &str) {
		self.context.cluster_groups.insert(
			name.to_string(),
			ClusterGroup {
				name: name.to_string(),
			},
		);
	}
}

#[async_trait]
impl PolicySchema for V1Schema {
	type Policy = PolicyV1;

	fn label(&self) -> &'static str {
		"v1"
	}

	async fn list_policies(&self) -> Result<Vec<PolicyV1>> {
		Ok(self.client.list_policies().await?)
	}

	async fn resolve_subject(&self, email: &str) -> Result<SubjectRef> {
		let user = self.client.get_user(email).await?;
		Ok(SubjectRef::user(user.id))
	}

	async fn write_policy(&self, policy: &PolicyV1) -> Result<()> {
		Ok(self.client.edit_policy(policy).await?)
	}
}

#[async_trait]
impl AgentRegistry for V1Schema {
	async fn list_agents(&self) -> Result<Vec<AgentRecord>> {
		Ok(self
			.client
			.list_clusters()
			.await?
			.into_iter()
			.map(|c| AgentRecord {
				name: c.cluster_name,
				status: c.status,
			})
			.collect())
	}
}

#[async_trait]
impl ManifestSource for V1Schema {
	async fn agent_manifest(
		&self,
		cluster_name: &str,
		namespace: &str,
		environment: Option<&str>,
	) -> Result<String> {
		if let Some(environment) = environment {
			warn!(environment = %environment, "v1 API has no environments, ignoring");
		}
		Ok(self.client.get_agent_yaml(cluster_name, namespace).await?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn policy() -> PolicyV1 {
		serde_json::from_value(json!({
			"id": "p-1",
			"name": "prod-policy",
			"subjects": [{"id": "u-1", "type": "User"}],
			"context": {
				"clusterUsers": {"alice": {"name": "alice"}},
				"clusterGroups": {}
			},
			"metadata": {}
		}))
		.unwrap()
	}

	#[test]
	fn context_map_membership() {
		let mut p = policy();
		assert!(p.has_cluster_user("alice"));
		assert!(!p.has_cluster_user("bob"));

		p.push_cluster_user("bob");
		assert!(p.has_cluster_user("bob"));
		assert_eq!(p.context.cluster_users["bob"].name, "bob");

		p.push_cluster_group("dev");
		assert!(p.has_cluster_group("dev"));
		assert!(p.has_subject("u-1"));
	}
}
