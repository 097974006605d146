// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Quickstart run configuration.

use std::time::Duration;

use crate::error::{QuickstartError, Result};

/// Upper bound for each readiness wait.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
/// Delay between agent status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Bounds for a polling wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
	pub timeout: Duration,
	pub poll_interval: Duration,
}

impl Default for WaitConfig {
	fn default() -> Self {
		Self {
			timeout: DEFAULT_TIMEOUT,
			poll_interval: DEFAULT_POLL_INTERVAL,
		}
	}
}

/// Identifiers to merge into the cluster's policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyAdditions {
	/// Subject emails, resolved to ids through the control plane.
	pub subjects: Vec<String>,
	pub target_users: Vec<String>,
	pub target_groups: Vec<String>,
}

impl PolicyAdditions {
	pub fn is_empty(&self) -> bool {
		self.subjects.is_empty() && self.target_users.is_empty() && self.target_groups.is_empty()
	}
}

/// Settings for copying the generated manifest's env vars onto the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvSyncConfig {
	pub deployment_name: String,
	/// Control plane environment the agent joins (v2 only).
	pub environment: Option<String>,
	/// `app` label of the agent pod; defaults to `bctl-<cluster>-agent`.
	pub app_label: Option<String>,
	pub pod_timeout: Duration,
}

impl EnvSyncConfig {
	pub fn new(deployment_name: impl Into<String>) -> Self {
		Self {
			deployment_name: deployment_name.into(),
			environment: None,
			app_label: None,
			pod_timeout: DEFAULT_TIMEOUT,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickstartConfig {
	pub cluster_name: String,
	pub additions: PolicyAdditions,
	pub agent_wait: WaitConfig,
	/// Namespace for the deployment patch and job deletion. Falls back to the
	/// K8s client's default namespace.
	pub namespace: Option<String>,
	pub env_sync: Option<EnvSyncConfig>,
	/// Job to delete once everything else succeeded.
	pub job_name: Option<String>,
}

impl QuickstartConfig {
	pub fn new(cluster_name: impl Into<String>) -> Self {
		Self {
			cluster_name: cluster_name.into(),
			additions: PolicyAdditions::default(),
			agent_wait: WaitConfig::default(),
			namespace: None,
			env_sync: None,
			job_name: None,
		}
	}

	/// `app` label carried by the agent pod.
	pub fn app_label(&self) -> String {
		self.env_sync
			.as_ref()
			.and_then(|e| e.app_label.clone())
			.unwrap_or_else(|| format!("bctl-{}-agent", self.cluster_name))
	}

	/// True when any step needs a Kubernetes client.
	pub fn needs_k8s(&self) -> bool {
		self.env_sync.is_some() || self.job_name.is_some()
	}

	pub fn validate(&self) -> Result<()> {
		if self.cluster_name.trim().is_empty() {
			return Err(QuickstartError::MissingConfig {
				field: "cluster name",
			});
		}
		if let Some(env) = &self.env_sync {
			if env.deployment_name.trim().is_empty() {
				return Err(QuickstartError::MissingConfig {
					field: "deployment name",
				});
			}
		}
		if self.agent_wait.timeout.is_zero() {
			return Err(QuickstartError::MissingConfig { field: "timeout" });
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_match_the_chart_job() {
		let cfg = QuickstartConfig::new("prod");
		assert_eq!(cfg.agent_wait.timeout, Duration::from_secs(300));
		assert_eq!(cfg.agent_wait.poll_interval, Duration::from_secs(2));
		assert_eq!(cfg.app_label(), "bctl-prod-agent");
		assert!(!cfg.needs_k8s());
		assert!(cfg.validate().is_ok());
	}

	#[test]
	fn app_label_override_wins() {
		let mut cfg = QuickstartConfig::new("prod");
		let mut env = EnvSyncConfig::new("bctl-agent");
		env.app_label = Some("custom".into());
		cfg.env_sync = Some(env);
		assert_eq!(cfg.app_label(), "custom");
		assert!(cfg.needs_k8s());
	}

	#[test]
	fn validate_rejects_blank_names() {
		assert!(matches!(
			QuickstartConfig::new("  ").validate(),
			Err(QuickstartError::MissingConfig { .. })
		));

		let mut cfg = QuickstartConfig::new("prod");
		cfg.env_sync = Some(EnvSyncConfig::new(""));
		assert!(cfg.validate().is_err());
	}

	#[test]
	fn additions_emptiness() {
		assert!(PolicyAdditions::default().is_empty());
		let additions = PolicyAdditions {
			target_groups: vec!["dev".into()],
			..Default::default()
		};
		assert!(!additions.is_empty());
	}
}
