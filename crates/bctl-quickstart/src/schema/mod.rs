// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Strategy over the two control plane API generations.
//!
//! The reconciler and waiters only see these traits; [`V1Schema`] and
//! [`V2Schema`] map them onto the respective REST surface.

mod v1;
mod v2;

use async_trait::async_trait;
use bctl_bastion_api::{SubjectRef, STATUS_ONLINE};

use crate::error::Result;

pub use v1::V1Schema;
pub use v2::V2Schema;

/// In-memory copy of a policy that can take new members.
pub trait PolicyDocument: Send + Sync {
	fn id(&self) -> &str;
	fn name(&self) -> &str;

	fn has_subject(&self, id: &str) -> bool;
	fn push_subject(&mut self, subject: SubjectRef);

	fn has_cluster_user(&self, name: &str) -> bool;
	fn push_cluster_user(&mut self, name: &str);

	fn has_cluster_group(&self, name: &str) -> bool;
	fn push_cluster_group(&mut self, name: &str);
}

/// Read/write access to kubernetes policies in one API generation.
#[async_trait]
pub trait PolicySchema: Send + Sync {
	type Policy: PolicyDocument;

	/// Short label for logs.
	fn label(&self) -> &'static str;

	async fn list_policies(&self) -> Result<Vec<Self::Policy>>;

	async fn fetch_by_name(&self, name: &str) -> Result<Option<Self::Policy>> {
		Ok(self
			.list_policies()
			.await?
			.into_iter()
			.find(|p| p.name() == name))
	}

	/// Resolve an email to a policy subject.
	async fn resolve_subject(&self, email: &str) -> Result<SubjectRef>;

	/// Serialize and submit the whole policy.
	async fn write_policy(&self, policy: &Self::Policy) -> Result<()>;
}

/// An agent as registered with the control plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentRecord {
	pub name: String,
	pub status: String,
}

impl AgentRecord {
	pub fn is_online(&self) -> bool {
		self.status == STATUS_ONLINE
	}
}

/// Source of agent registration state.
#[async_trait]
pub trait AgentRegistry: Send + Sync {
	async fn list_agents(&self) -> Result<Vec<AgentRecord>>;
}

/// Source of the generated agent manifest.
#[async_trait]
pub trait ManifestSource: Send + Sync {
	/// YAML (possibly multi-document) describing the agent workload.
	async fn agent_manifest(
		&self,
		cluster_name: &str,
		namespace: &str,
		environment: Option<&str>,
	) -> Result<String>;
}
