// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! End-to-end quickstart run.

use std::sync::Arc;

use bctl_k8s::K8sClient;
use tracing::info;

use crate::cleanup::delete_self;
use crate::config::QuickstartConfig;
use crate::env_sync::{fetch_agent_env_vars, sync_env_vars, EnvSyncTarget};
use crate::error::{QuickstartError, Result};
use crate::readiness::wait_for_agent_online;
use crate::reconciler::{PolicyReconciler, ReconcileReport};
use crate::schema::{AgentRegistry, ManifestSource, PolicySchema};

/// What a completed run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
	pub policy: ReconcileReport,
	/// Number of env vars written to the agent, when env sync ran.
	pub env_vars_synced: Option<usize>,
	pub job_deleted: bool,
}

/// Drives the steps in order: agent wait, policy merge, env sync, job
/// deletion. Any error stops the run; completed steps are not rolled back.
pub struct QuickstartRunner<S> {
	reconciler: PolicyReconciler<S>,
	k8s: Option<Arc<dyn K8sClient>>,
	config: QuickstartConfig,
}

impl<S> QuickstartRunner<S>
where
	S: PolicySchema + AgentRegistry + ManifestSource,
{
	pub fn new(schema: S, config: QuickstartConfig) -> Self {
		Self {
			reconciler: PolicyReconciler::new(schema, config.cluster_name.clone()),
			k8s: None,
			config,
		}
	}

	/// Kubernetes access, needed for env sync and job deletion.
	pub fn with_k8s(mut self, k8s: Arc<dyn K8sClient>) -> Self {
		self.k8s = Some(k8s);
		self
	}

	pub fn config(&self) -> &QuickstartConfig {
		&self.config
	}

	fn k8s(&self) -> Result<&dyn K8sClient> {
		self.k8s.as_deref().ok_or(QuickstartError::MissingConfig {
			field: "kubernetes client",
		})
	}

	fn namespace(&self, k8s: &dyn K8sClient) -> String {
		self.config
			.namespace
			.clone()
			.unwrap_or_else(|| k8s.default_namespace().to_string())
	}

	pub async fn run(&self) -> Result<RunSummary> {
		self.config.validate()?;
		if self.config.needs_k8s() {
			self.k8s()?;
		}

		let cluster = self.config.cluster_name.as_str();
		let schema = self.reconciler.schema();
		info!(cluster = %cluster, api = schema.label(), "Starting quickstart....");

		wait_for_agent_online(schema, cluster, &self.config.agent_wait).await?;

		let mut summary = RunSummary {
			policy: self.reconciler.reconcile(&self.config.additions).await?,
			..Default::default()
		};
		info!(cluster = %cluster, "Finished setting up agent: {cluster}!");

		if let Some(env) = &self.config.env_sync {
			let k8s = self.k8s()?;
			let target = EnvSyncTarget {
				deployment_name: env.deployment_name.clone(),
				namespace: self.namespace(k8s),
				app_label: self.config.app_label(),
				pod_timeout: env.pod_timeout,
			};
			let vars =
				fetch_agent_env_vars(schema, cluster, &target.namespace, env.environment.as_deref())
					.await?;
			sync_env_vars(k8s, &target, &vars).await?;
			summary.env_vars_synced = Some(vars.len());
		}

		if let Some(job_name) = &self.config.job_name {
			let k8s = self.k8s()?;
			delete_self(k8s, job_name, &self.namespace(k8s)).await?;
			summary.job_deleted = true;
		}

		info!(cluster = %cluster, "Finishing running kubernetes agent quickstart!");
		Ok(summary)
	}
}
