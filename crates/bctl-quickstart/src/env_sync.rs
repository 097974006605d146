// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Copies the generated manifest's env vars onto the running agent.

use std::collections::BTreeSet;
use std::time::Duration;

use bctl_k8s::{Container, Deployment, EnvVar, K8sClient, K8sError};
use tracing::{debug, info};

use crate::error::{QuickstartError, Result};
use crate::manifest::agent_env_vars;
use crate::readiness::wait_for_pod_running;
use crate::schema::ManifestSource;

/// Where the agent runs in the cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvSyncTarget {
	pub deployment_name: String,
	pub namespace: String,
	pub app_label: String,
	pub pod_timeout: Duration,
}

/// Ask the control plane for the agent manifest and pull out the env list.
pub async fn fetch_agent_env_vars<M: ManifestSource + ?Sized>(
	source: &M,
	cluster_name: &str,
	namespace: &str,
	environment: Option<&str>,
) -> Result<Vec<(String, String)>> {
	let yaml = source
		.agent_manifest(cluster_name, namespace, environment)
		.await?;
	Ok(agent_env_vars(&yaml)?)
}

/// The deployment's containers with the first one's env replaced by exactly
/// `env_vars`. Other containers are returned unchanged.
pub fn with_first_container_env(
	deployment: &Deployment,
	env_vars: &[(String, String)],
) -> Result<Vec<Container>> {
	let mut containers = deployment
		.spec
		.as_ref()
		.and_then(|s| s.template.spec.as_ref())
		.map(|s| s.containers.clone())
		.unwrap_or_default();

	let first = containers
		.first_mut()
		.ok_or_else(|| QuickstartError::NoContainers {
			name: deployment.metadata.name.clone().unwrap_or_default(),
		})?;
	first.env = Some(
		env_vars
			.iter()
			.map(|(name, value)| EnvVar {
				name: name.clone(),
				value: Some(value.clone()),
				..Default::default()
			})
			.collect(),
	);
	Ok(containers)
}

/// Overwrite the agent container's env and wait for the rolled pod.
///
/// When the patch changes the pod template, pods that existed before it are
/// not accepted as the rolled pod.
pub async fn sync_env_vars<K: K8sClient + ?Sized>(
	k8s: &K,
	target: &EnvSyncTarget,
	env_vars: &[(String, String)],
) -> Result<()> {
	let deployment = k8s
		.get_deployment(&target.deployment_name, &target.namespace)
		.await
		.map_err(|e| match e {
			K8sError::DeploymentNotFound { name } => QuickstartError::DeploymentNotFound {
				name,
				namespace: target.namespace.clone(),
			},
			other => other.into(),
		})?;

	let containers = with_first_container_env(&deployment, env_vars)?;
	let current = deployment
		.spec
		.as_ref()
		.and_then(|s| s.template.spec.as_ref())
		.map(|s| s.containers.as_slice())
		.unwrap_or_default();
	let selector = format!("app={}", target.app_label);
	let stale_uids: BTreeSet<String> = if current == containers.as_slice() {
		BTreeSet::new()
	} else {
		k8s.list_pods(&target.namespace, &selector)
			.await?
			.into_iter()
			.filter_map(|pod| pod.metadata.uid)
			.collect()
	};
	debug!(stale = stale_uids.len(), "Pods from before the patch");

	k8s.patch_deployment_containers(&target.deployment_name, &target.namespace, containers)
		.await?;
	info!(
		deployment = %target.deployment_name,
		namespace = %target.namespace,
		vars = env_vars.len(),
		"Updated agent env vars"
	);

	wait_for_pod_running(
		k8s,
		&target.namespace,
		&target.app_label,
		target.pod_timeout,
		&stale_uids,
	)
	.await
}
