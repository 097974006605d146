// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use async_trait::async_trait;

use crate::error::K8sError;
use crate::types::{Container, Deployment, Pod, PodStream};

/// Trait for the K8s operations the quickstart job performs.
///
/// Kept narrow so tests can substitute an in-memory cluster.
#[async_trait]
pub trait K8sClient: Send + Sync {
	/// Namespace used when none is configured: the service account's
	/// namespace in-cluster, or the kubeconfig context's namespace.
	fn default_namespace(&self) -> &str;

	/// Get a deployment by name.
	async fn get_deployment(&self, name: &str, namespace: &str) -> Result<Deployment, K8sError>;

	/// Replace the pod template's container list of a deployment.
	///
	/// Sent as a JSON merge patch, so the list is replaced wholesale rather
	/// than merged by container name.
	async fn patch_deployment_containers(
		&self,
		name: &str,
		namespace: &str,
		containers: Vec<Container>,
	) -> Result<Deployment, K8sError>;

	/// List the pods in a namespace matching the given label selector.
	async fn list_pods(&self, namespace: &str, label_selector: &str) -> Result<Vec<Pod>, K8sError>;

	/// Watch pods in a namespace matching the given label selector.
	///
	/// Existing pods are yielded first, then every subsequent change. Watch
	/// errors are yielded as items and the watch resumes after a backoff.
	async fn watch_pods(&self, namespace: &str, label_selector: &str) -> Result<PodStream, K8sError>;

	/// Delete a job, leaving its pods to the garbage collector.
	async fn delete_job(&self, name: &str, namespace: &str) -> Result<(), K8sError>;
}
